//! The per-week orchestrator: plan, then generate → approve → render →
//! publish for each item, persisting as it goes.
//!
//! Items are processed strictly sequentially. Item-fatal errors (render
//! timeout, publish guards) propagate to the caller; manifest state already
//! written for earlier items stays intact.
use anyhow::{Context, Result};
use serde::Serialize;
use serde_json::{json, Value};
use std::fs;
use std::path::PathBuf;

use crate::adapters::Backends;
use crate::approval::{self, ApprovalLedger};
use crate::config::RunConfig;
use crate::events;
use crate::ledger::UploadLedger;
use crate::manifest::{self, ManifestEntry};
use crate::packaging;
use crate::paths::WeekPaths;
use crate::pipeline::generate::generate_step;
use crate::pipeline::publish::publish_step;
use crate::pipeline::render::{render_step, RenderOptions};
use crate::planner::{self, PlanItem};

/// Everything that shapes one pipeline run besides the environment config.
#[derive(Debug, Clone)]
pub struct PipelineOptions {
    pub week: i64,
    pub kinds: Option<Vec<String>>,
    pub count: usize,
    pub do_render: bool,
    pub do_upload: bool,
    pub out_root: PathBuf,
    /// Directory holding the reviewer approval ledger.
    pub approval_root: PathBuf,
    pub render: RenderOptions,
}

impl PipelineOptions {
    pub fn new(week: i64, out_root: PathBuf) -> Self {
        Self {
            week,
            kinds: None,
            count: 12,
            do_render: false,
            do_upload: false,
            out_root,
            approval_root: PathBuf::from("approval"),
            render: RenderOptions::default(),
        }
    }
}

#[derive(Serialize)]
struct PlanEventPayload<'a> {
    week: i64,
    kinds: Option<&'a [String]>,
    items: &'a [PlanItem],
}

/// Run the full content pipeline for one week.
pub fn run_pipeline(
    options: &PipelineOptions,
    config: &RunConfig,
    backends: &Backends,
) -> Result<()> {
    let plan = planner::plan_week(options.week, options.kinds.as_deref(), options.count);
    events::emit(
        "plan",
        &PlanEventPayload {
            week: options.week,
            kinds: options.kinds.as_deref(),
            items: &plan,
        },
    );

    let paths = WeekPaths::new(&options.out_root, options.week);
    fs::create_dir_all(paths.root())
        .with_context(|| format!("create {}", paths.root().display()))?;

    let manifest_path = paths.manifest_path();
    let mut entries = manifest::read(&manifest_path);

    for item in &plan {
        if item.kind.trim().is_empty() {
            tracing::warn!(player = %item.player, "skipping plan item with empty kind");
            continue;
        }
        run_item(item, options, config, backends, &paths, &mut entries)?;
    }
    Ok(())
}

fn run_item(
    item: &PlanItem,
    options: &PipelineOptions,
    config: &RunConfig,
    backends: &Backends,
    paths: &WeekPaths,
    entries: &mut Vec<ManifestEntry>,
) -> Result<()> {
    let gen = generate_step(item, options.week, paths, backends.script.as_ref())?;
    events::emit("generate", &gen);

    let filename = gen
        .script_path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();
    let new_entry = ManifestEntry::new(&gen.player, options.week, &gen.kind, &filename);
    *entries = manifest::upsert(std::mem::take(entries), new_entry);
    manifest::write_atomic(&paths.manifest_path(), entries)?;
    manifest::write_csv(&paths.manifest_csv_path(), entries)?;

    // The reviewer ledger is reloaded per item so approvals granted while a
    // long run is in flight still take effect.
    let ledger = ApprovalLedger::load(&options.approval_root);
    let decision = ledger.decide(&gen.entry_id, &gen.player, &gen.kind, options.week);
    events::emit("approve", &decision);

    let caption = packaging::build_caption(&gen.script_text, &gen.kind, options.week, config.dry_run);
    let hashtags = packaging::build_hashtags(&gen.kind, options.week);

    if !decision.approved {
        approval::append_skip(paths, &gen.entry_id, decision.row.as_ref())?;
        let meta = packaging::package_metadata(
            Some(&gen.entry_id),
            &gen.kind,
            options.week,
            Some(&gen.player),
            caption,
            hashtags,
            Some(json!({"approved": false})),
        );
        fs::write(paths.meta_path(&gen.entry_id), packaging::to_exportable(&meta))
            .with_context(|| format!("write metadata for {}", gen.entry_id))?;
        tracing::info!(entry_id = %gen.entry_id, "skipped: not approved; audit written");

        if options.do_upload {
            let mut uploads = UploadLedger::read(&paths.uploads_path());
            uploads.record_skip(&gen.entry_id);
            uploads.write(&paths.uploads_path())?;
        }
        return Ok(());
    }

    let approver = decision
        .row
        .as_ref()
        .map(|row| serde_json::to_value(row).unwrap_or(Value::Null))
        .unwrap_or(Value::Null);
    let meta = packaging::package_metadata(
        Some(&gen.entry_id),
        &gen.kind,
        options.week,
        Some(&gen.player),
        caption,
        hashtags,
        Some(json!({"approved": true, "approver": approver})),
    );
    fs::write(paths.meta_path(&gen.entry_id), packaging::to_exportable(&meta))
        .with_context(|| format!("write metadata for {}", gen.entry_id))?;

    if options.do_render {
        let record = render_step(&gen, item, paths, backends.avatar.as_ref(), &options.render)?;
        events::emit("render", &record);
    }

    if options.do_upload {
        let record = publish_step(&gen, paths, backends.publish.as_ref(), config)?;
        events::emit("publish", &record);
    }
    Ok(())
}
