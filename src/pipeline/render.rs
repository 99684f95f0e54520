//! Render step: submit an avatar job and poll it to a terminal state.
//!
//! States: submitted → polling → completed | timed_out. Every poll tick
//! overwrites the status snapshot so a crash mid-poll leaves forensic state;
//! last-write-wins is correct because the external job is monotonic.
use anyhow::{anyhow, bail, Context, Result};
use serde::Serialize;
use serde_json::Value;
use std::fs;
use std::path::PathBuf;
use std::thread;
use std::time::{Duration, Instant};

use crate::adapters::{self, AvatarBackend, RenderRequest};
use crate::paths::{self, WeekPaths};
use crate::pipeline::generate::GenerateRecord;
use crate::planner::PlanItem;

const DEFAULT_AVATAR_ID: &str = "default-avatar-id";

/// Polling knobs. Defaults match the production cadence; tests shrink them.
#[derive(Debug, Clone)]
pub struct RenderOptions {
    /// Pause between poll ticks.
    pub interval: Duration,
    /// Wall-clock budget for the whole poll loop.
    pub budget: Duration,
    /// Attempt to download the finished video when the backend links one.
    pub download: bool,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(5),
            budget: Duration::from_secs(90),
            download: true,
        }
    }
}

/// Outcome of a completed render.
#[derive(Debug, Clone, Serialize)]
pub struct RenderRecord {
    pub entry_id: String,
    pub avatar_dir: PathBuf,
    pub video_path: Option<PathBuf>,
}

/// Submit and drive one render job to completion.
///
/// A timeout is fatal for the item: the error propagates and no video
/// artifact is written.
pub fn render_step(
    gen: &GenerateRecord,
    item: &PlanItem,
    paths: &WeekPaths,
    backend: &dyn AvatarBackend,
    options: &RenderOptions,
) -> Result<RenderRecord> {
    let stem = paths::item_stem(&gen.player, &gen.kind);
    let avatar_dir = paths.avatar_dir(&stem);
    fs::create_dir_all(&avatar_dir)
        .with_context(|| format!("create {}", avatar_dir.display()))?;

    let request = RenderRequest {
        script_text: gen.script_text.clone(),
        avatar_id: extra_str(item, "avatar_id").unwrap_or_else(|| DEFAULT_AVATAR_ID.to_string()),
        voice_id: extra_str(item, "voice_id"),
    };
    let response = backend.submit(&request).context("submit render")?;
    // Persist the submit response before polling starts.
    write_status(paths, &stem, &response)?;

    let video_path = paths.video_path(&stem);
    if backend.dry_run() {
        fs::write(&video_path, b"")
            .with_context(|| format!("write {}", video_path.display()))?;
        return Ok(RenderRecord {
            entry_id: gen.entry_id.clone(),
            avatar_dir,
            video_path: Some(video_path),
        });
    }

    let video_id = job_handle(&response)
        .ok_or_else(|| anyhow!("render response missing video_id: {response}"))?;

    let start = Instant::now();
    loop {
        if start.elapsed() >= options.budget {
            bail!(
                "avatar render timed out after {}s for {}",
                options.budget.as_secs(),
                gen.entry_id
            );
        }
        let status = backend.poll(&video_id).context("poll render")?;
        write_status(paths, &stem, &status)?;
        if is_complete(&status) {
            write_artifact(&status, &video_path, options.download)?;
            return Ok(RenderRecord {
                entry_id: gen.entry_id.clone(),
                avatar_dir,
                video_path: Some(video_path),
            });
        }
        thread::sleep(options.interval);
    }
}

fn write_status(paths: &WeekPaths, stem: &str, status: &Value) -> Result<()> {
    let path = paths.render_status_path(stem);
    let text = serde_json::to_string_pretty(status).context("serialize render status")?;
    fs::write(&path, text).with_context(|| format!("write {}", path.display()))?;
    Ok(())
}

fn job_handle(response: &Value) -> Option<String> {
    response
        .get("video_id")
        .and_then(Value::as_str)
        .or_else(|| response.pointer("/data/video_id").and_then(Value::as_str))
        .filter(|id| !id.is_empty())
        .map(str::to_string)
}

/// Completion: a status string containing "complete" (any case), or progress
/// reaching 100.
fn is_complete(status: &Value) -> bool {
    let by_status = status
        .get("status")
        .and_then(Value::as_str)
        .map(|s| s.to_lowercase().contains("complete"))
        .unwrap_or(false);
    by_status || progress_of(status) == 100
}

fn progress_of(status: &Value) -> i64 {
    match status.get("progress") {
        Some(Value::Number(n)) => n.as_i64().unwrap_or(0),
        Some(Value::String(s)) => s.parse().unwrap_or(0),
        _ => 0,
    }
}

/// Produce the video artifact: download when the backend links content,
/// otherwise a placeholder. The download is best-effort.
fn write_artifact(status: &Value, video_path: &std::path::Path, download: bool) -> Result<()> {
    if download {
        let url = status
            .get("download_url")
            .or_else(|| status.get("video_url"))
            .and_then(Value::as_str);
        if let Some(url) = url {
            match adapters::get_bytes(url) {
                Ok(bytes) => {
                    fs::write(video_path, bytes)
                        .with_context(|| format!("write {}", video_path.display()))?;
                    return Ok(());
                }
                Err(err) => {
                    tracing::warn!(%url, %err, "video download failed; writing placeholder");
                }
            }
        }
    }
    fs::write(video_path, b"").with_context(|| format!("write {}", video_path.display()))?;
    Ok(())
}

fn extra_str(item: &PlanItem, key: &str) -> Option<String> {
    item.extra
        .get(key)
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}
