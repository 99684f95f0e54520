//! Command handlers behind the CLI.
//!
//! Each handler loads the run config once, wires backends, and translates
//! item-fatal pipeline errors into a single clear failure via the anyhow
//! context chain.
use anyhow::{anyhow, bail, Context, Result};
use serde_json::json;
use std::fs;
use std::path::Path;

use crate::adapters::{build_backends, build_publish_backend, extract_upload_id};
use crate::approval;
use crate::cli::{
    ApproveArgs, ApproveCommand, PlanArgs, RunArgs, UploadArgs, VideosArgs,
};
use crate::config::RunConfig;
use crate::paths::WeekPaths;
use crate::pipeline::{run_pipeline, PipelineOptions};
use crate::planner;

const DRY_UPLOAD_ID: &str = "dry-upload-123";
const DRY_UPLOAD_STATUS: &str = "uploaded(dry)";

/// Write the deterministic weekly plan to `plan.json`.
pub fn run_plan(args: PlanArgs) -> Result<()> {
    let kinds = non_empty_kinds(&args.kinds);
    let plan = planner::plan_week(args.week, kinds.as_deref(), args.count);
    let paths = WeekPaths::new(&args.out, args.week);
    fs::create_dir_all(paths.root())
        .with_context(|| format!("create {}", paths.root().display()))?;
    let path = paths.plan_path();
    let text = serde_json::to_string_pretty(&plan).context("serialize plan")?;
    fs::write(&path, text).with_context(|| format!("write {}", path.display()))?;
    println!("wrote {} ({} items)", path.display(), plan.len());
    Ok(())
}

/// Run the full pipeline for a week.
pub fn run_run(args: RunArgs) -> Result<()> {
    let config = RunConfig::from_env();
    let backends = build_backends(&config)?;
    let mut options = PipelineOptions::new(args.week, args.out);
    options.kinds = non_empty_kinds(&args.kinds);
    options.count = args.count;
    options.do_render = args.render;
    options.do_upload = args.upload;
    options.approval_root = args.approval_dir;

    run_pipeline(&options, &config, &backends)
        .with_context(|| format!("pipeline failed for week {}", args.week))?;
    println!("week {} processed", args.week);
    Ok(())
}

/// Maintain the reviewer approval ledger.
pub fn run_approve(args: ApproveArgs) -> Result<()> {
    match args.command {
        ApproveCommand::Init(args) => {
            let sample = match &args.sample_json {
                Some(path) => {
                    let bytes = fs::read(path)
                        .with_context(|| format!("read {}", path.display()))?;
                    Some(serde_json::from_slice(&bytes).context("parse sample rows")?)
                }
                None => None,
            };
            approval::init_ledger(&args.dir, sample)?;
            println!("initialized approval ledger in {}", args.dir.display());
        }
        ApproveCommand::Set(args) => {
            let approved = args.approved == "true";
            approval::set_approval(&args.dir, &args.id, approved, &args.reviewer, &args.note)?;
            println!("set approval {} -> {}", args.id, args.approved);
        }
    }
    Ok(())
}

/// Upload one video file as a draft, honoring dry-run.
pub fn run_upload(args: UploadArgs) -> Result<()> {
    if !(1..=18).contains(&args.week) {
        bail!("week must be between 1 and 18");
    }
    if !args.file.is_file() {
        bail!("file not found: {}", args.file.display());
    }

    let config = RunConfig::from_env();
    let filename = args
        .file
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| "draft.mp4".to_string());
    let canonical_path = args
        .out
        .join(format!("week-{}", args.week))
        .join(&args.kind)
        .join("tiktok")
        .join("upload.json");
    let sidecar_path = args
        .file
        .with_file_name(format!("{filename}.upload.json"));

    if config.dry_run {
        let payload = json!({
            "upload_id": DRY_UPLOAD_ID,
            "status": DRY_UPLOAD_STATUS,
            "file": args.file.display().to_string(),
            "week": args.week,
            "kind": args.kind,
            "dry_run": true,
        });
        write_json(&canonical_path, &payload)?;
        write_json(&sidecar_path, &payload)?;
        println!("dry-run upload artifacts -> {}", canonical_path.display());
        return Ok(());
    }

    let backend = build_publish_backend(&config)?;
    let access_token = config
        .tiktok_access_token
        .clone()
        .ok_or_else(|| anyhow!("missing TIKTOK_ACCESS_TOKEN for live upload"))?;
    let open_id = config
        .tiktok_open_id
        .clone()
        .ok_or_else(|| anyhow!("missing TIKTOK_OPEN_ID for live upload"))?;

    let video_bytes = fs::read(&args.file)
        .with_context(|| format!("read {}", args.file.display()))?;

    let init = backend.init_upload(&access_token, &open_id, true)?;
    let upload_id = extract_upload_id(&init)
        .ok_or_else(|| anyhow!("upload init returned no upload_id: {init}"))?;
    let upload = backend.upload_video(&access_token, &open_id, &upload_id, &video_bytes, &filename)?;
    let status = backend.check_upload_status(&access_token, &open_id, &upload_id)?;

    let payload = json!({
        "upload_id": upload_id,
        "init": init,
        "upload": upload,
        "status": status,
        "file": args.file.display().to_string(),
        "week": args.week,
        "kind": args.kind,
    });
    write_json(&canonical_path, &payload)?;
    write_json(&sidecar_path, &payload)?;
    println!("upload artifacts -> {}", canonical_path.display());
    Ok(())
}

/// List recent uploaded drafts.
pub fn run_videos(args: VideosArgs) -> Result<()> {
    let config = RunConfig::from_env();
    let backend = build_publish_backend(&config)?;
    let access_token = config
        .tiktok_access_token
        .clone()
        .unwrap_or_else(|| "dry-access-token".to_string());
    let open_id = config
        .tiktok_open_id
        .clone()
        .unwrap_or_else(|| "dry-open-id".to_string());
    if !backend.dry_run() && (config.tiktok_access_token.is_none() || config.tiktok_open_id.is_none())
    {
        bail!("missing TIKTOK_ACCESS_TOKEN or TIKTOK_OPEN_ID for live listing");
    }
    let listing = backend.list_videos(&access_token, &open_id, args.cursor, args.max_count)?;
    println!("{}", serde_json::to_string_pretty(&listing).context("serialize listing")?);
    Ok(())
}

fn non_empty_kinds(kinds: &[String]) -> Option<Vec<String>> {
    let filtered: Vec<String> = kinds
        .iter()
        .map(|k| k.trim().to_string())
        .filter(|k| !k.is_empty())
        .collect();
    if filtered.is_empty() {
        None
    } else {
        Some(filtered)
    }
}

fn write_json(path: &Path, value: &serde_json::Value) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).with_context(|| format!("create {}", parent.display()))?;
    }
    let text = serde_json::to_string_pretty(value).context("serialize JSON")?;
    fs::write(path, text).with_context(|| format!("write {}", path.display()))?;
    Ok(())
}
