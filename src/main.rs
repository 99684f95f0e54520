use anyhow::Result;
use clap::Parser;

mod adapters;
mod approval;
mod cli;
mod commands;
mod config;
mod events;
mod guardrails;
mod ledger;
mod manifest;
mod packaging;
mod paths;
mod pipeline;
mod planner;
mod templates;
mod util;

use cli::{Command, RootArgs};

fn main() -> Result<()> {
    init_tracing();
    let args = RootArgs::parse();
    match args.command {
        Command::Plan(args) => commands::run_plan(args),
        Command::Run(args) => commands::run_run(args),
        Command::Approve(args) => commands::run_approve(args),
        Command::Upload(args) => commands::run_upload(args),
        Command::Videos(args) => commands::run_videos(args),
    }
}

fn init_tracing() {
    use tracing_subscriber::EnvFilter;
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
