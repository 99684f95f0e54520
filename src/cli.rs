//! CLI argument parsing for the weekly clip pipeline.
//!
//! The CLI is intentionally thin: it wires configuration and backends without
//! embedding policy, so the same core logic can be reused elsewhere.
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Default output root for week directories.
pub const DEFAULT_OUT_ROOT: &str = ".out";
/// Default directory holding the reviewer approval ledger.
pub const DEFAULT_APPROVAL_ROOT: &str = "approval";

/// Root CLI entrypoint for the content pipeline.
#[derive(Parser, Debug)]
#[command(
    name = "ffclips",
    version,
    about = "Weekly fantasy-football clip pipeline",
    after_help = "Commands:\n  plan --week <N>                 Write the deterministic weekly plan\n  run --week <N>                  Generate scripts, gate, render, publish\n  approve init|set                Maintain the reviewer approval ledger\n  upload --file <MP4> --week <N>  Upload a single draft video\n  videos                          List recent uploaded drafts\n\nExamples:\n  ffclips plan --week 5\n  DRY_RUN=true ffclips run --week 5 --kinds start-sit,waiver-wire --render --upload\n  ffclips approve set \"Justin Jefferson__start-sit__5\" --approved true\n  ffclips upload --file out.mp4 --week 5 --kind start-sit",
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct RootArgs {
    #[command(subcommand)]
    pub command: Command,
}

/// Top-level commands.
#[derive(Subcommand, Debug)]
pub enum Command {
    Plan(PlanArgs),
    Run(RunArgs),
    Approve(ApproveArgs),
    Upload(UploadArgs),
    Videos(VideosArgs),
}

/// Plan command inputs.
#[derive(Parser, Debug)]
#[command(about = "Write the deterministic plan for a week")]
pub struct PlanArgs {
    /// NFL week used as the planner seed
    #[arg(long)]
    pub week: i64,

    /// Content kinds, comma separated (defaults to all categories)
    #[arg(long, value_delimiter = ',')]
    pub kinds: Vec<String>,

    /// Number of items to plan (clamped to 10-15)
    #[arg(long, default_value_t = 12)]
    pub count: usize,

    /// Output root for week directories
    #[arg(long, value_name = "DIR", default_value = DEFAULT_OUT_ROOT)]
    pub out: PathBuf,
}

/// Run command inputs for the full pipeline.
#[derive(Parser, Debug)]
#[command(about = "Run the content pipeline for a week")]
pub struct RunArgs {
    /// NFL week to process
    #[arg(long)]
    pub week: i64,

    /// Content kinds, comma separated (defaults to all categories)
    #[arg(long, value_delimiter = ',')]
    pub kinds: Vec<String>,

    /// Number of items to plan (clamped to 10-15)
    #[arg(long, default_value_t = 12)]
    pub count: usize,

    /// Render avatar videos for approved items
    #[arg(long)]
    pub render: bool,

    /// Upload approved items as drafts
    #[arg(long)]
    pub upload: bool,

    /// Output root for week directories
    #[arg(long, value_name = "DIR", default_value = DEFAULT_OUT_ROOT)]
    pub out: PathBuf,

    /// Directory holding the reviewer approval ledger
    #[arg(long, value_name = "DIR", default_value = DEFAULT_APPROVAL_ROOT)]
    pub approval_dir: PathBuf,
}

/// Approval ledger maintenance.
#[derive(Parser, Debug)]
#[command(about = "Maintain the reviewer approval ledger")]
pub struct ApproveArgs {
    #[command(subcommand)]
    pub command: ApproveCommand,
}

#[derive(Subcommand, Debug)]
pub enum ApproveCommand {
    /// Initialize an empty (or sample-seeded) approval ledger
    Init(ApproveInitArgs),
    /// Set the approval decision for one entry id
    Set(ApproveSetArgs),
}

#[derive(Parser, Debug)]
pub struct ApproveInitArgs {
    /// Optional JSON file with sample rows to seed the ledger
    #[arg(long, value_name = "PATH")]
    pub sample_json: Option<PathBuf>,

    /// Directory holding the reviewer approval ledger
    #[arg(long, value_name = "DIR", default_value = DEFAULT_APPROVAL_ROOT)]
    pub dir: PathBuf,
}

#[derive(Parser, Debug)]
pub struct ApproveSetArgs {
    /// Entry id (player__kind__week)
    pub id: String,

    /// Approval decision
    #[arg(long, value_parser = ["true", "false"])]
    pub approved: String,

    /// Reviewer name recorded on the row
    #[arg(long, default_value = "cli")]
    pub reviewer: String,

    /// Optional note recorded on the row
    #[arg(long, default_value = "")]
    pub note: String,

    /// Directory holding the reviewer approval ledger
    #[arg(long, value_name = "DIR", default_value = DEFAULT_APPROVAL_ROOT)]
    pub dir: PathBuf,
}

/// Single-file draft upload.
#[derive(Parser, Debug)]
#[command(about = "Upload one video file as a draft")]
pub struct UploadArgs {
    /// Path to the .mp4 to upload
    #[arg(long, short = 'f')]
    pub file: PathBuf,

    /// NFL week (1-18)
    #[arg(long, short = 'w')]
    pub week: i64,

    /// Content kind slug
    #[arg(long, short = 'k')]
    pub kind: String,

    /// Output root for upload metadata
    #[arg(long, short = 'o', value_name = "DIR", default_value = DEFAULT_OUT_ROOT)]
    pub out: PathBuf,
}

/// List recent uploaded drafts.
#[derive(Parser, Debug)]
#[command(about = "List recent uploaded drafts")]
pub struct VideosArgs {
    /// Pagination cursor
    #[arg(long, default_value_t = 0)]
    pub cursor: u64,

    /// Maximum number of drafts to list
    #[arg(long, default_value_t = 10)]
    pub max_count: u64,
}
