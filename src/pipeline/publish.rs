//! Publish step: guarded draft upload with ledger-backed idempotency.
//!
//! Live uploads are deliberately hard to trigger by accident: metadata must
//! exist, it must name an explicit publish target, and credentials must be
//! present. Each guard is a hard stop checked before any network call.
use anyhow::{anyhow, bail, Context, Result};
use serde::Serialize;
use serde_json::Value;
use std::fs;

use crate::adapters::{extract_upload_id, PublishBackend};
use crate::config::RunConfig;
use crate::ledger::{UploadLedger, UploadRecord};
use crate::paths::{self, WeekPaths};
use crate::pipeline::generate::GenerateRecord;

const DRY_ACCESS_TOKEN: &str = "dry-access-token";
const DRY_OPEN_ID: &str = "dry-open-id";

/// Outcome of the publish step.
#[derive(Debug, Clone, Serialize)]
pub struct PublishRecord {
    pub entry_id: String,
    pub upload_meta: Option<UploadRecord>,
}

/// Publish one entry as a draft upload.
///
/// Replaying for an already-recorded entry id returns the stored record and
/// performs no upload.
pub fn publish_step(
    gen: &GenerateRecord,
    paths: &WeekPaths,
    backend: &dyn PublishBackend,
    config: &RunConfig,
) -> Result<PublishRecord> {
    let entry_id = gen.entry_id.as_str();

    // Guard 1: packaging metadata must exist in live mode. Dry runs are
    // allowed through as a safety net for local workflows.
    let metadata = read_metadata(paths, entry_id);
    if !config.dry_run {
        let metadata = metadata
            .as_ref()
            .ok_or_else(|| anyhow!("refusing to publish {entry_id}: missing or malformed metadata"))?;

        // Guard 2: an explicit publish target. Default approval must never
        // silently become a live post.
        let target = metadata
            .get("publish_target")
            .and_then(Value::as_str)
            .filter(|t| !t.is_empty());
        if target.is_none() {
            bail!("publishing is blocked for {entry_id}: metadata has no publish_target");
        }
    }

    // Guard 3: idempotency against the persisted ledger.
    let uploads_path = paths.uploads_path();
    let mut ledger = UploadLedger::read(&uploads_path);
    if let Some(existing) = ledger.find(entry_id) {
        tracing::info!(%entry_id, "upload already recorded; skipping");
        return Ok(PublishRecord {
            entry_id: entry_id.to_string(),
            upload_meta: Some(existing.clone()),
        });
    }

    // Guard 4: live credentials.
    let (access_token, open_id) = if config.dry_run {
        (
            config
                .tiktok_access_token
                .clone()
                .unwrap_or_else(|| DRY_ACCESS_TOKEN.to_string()),
            config
                .tiktok_open_id
                .clone()
                .unwrap_or_else(|| DRY_OPEN_ID.to_string()),
        )
    } else {
        (
            config
                .tiktok_access_token
                .clone()
                .ok_or_else(|| anyhow!("missing TIKTOK_ACCESS_TOKEN for live publish"))?,
            config
                .tiktok_open_id
                .clone()
                .ok_or_else(|| anyhow!("missing TIKTOK_OPEN_ID for live publish"))?,
        )
    };

    let (video_bytes, filename) = video_payload(gen, paths)?;

    let init = backend
        .init_upload(&access_token, &open_id, true)
        .context("init upload")?;
    let upload_id = extract_upload_id(&init)
        .ok_or_else(|| anyhow!("upload init returned no upload_id: {init}"))?;
    let upload = backend
        .upload_video(&access_token, &open_id, &upload_id, &video_bytes, &filename)
        .context("upload video")?;
    let status = backend
        .check_upload_status(&access_token, &open_id, &upload_id)
        .context("check upload status")?;

    let record = UploadRecord {
        entry_id: entry_id.to_string(),
        init,
        upload,
        status,
    };
    ledger.uploads.push(record.clone());
    ledger.write(&uploads_path).context("persist upload ledger")?;

    Ok(PublishRecord {
        entry_id: entry_id.to_string(),
        upload_meta: Some(record),
    })
}

fn read_metadata(paths: &WeekPaths, entry_id: &str) -> Option<Value> {
    let path = paths.meta_path(entry_id);
    let bytes = fs::read(&path).ok()?;
    serde_json::from_slice(&bytes).ok()
}

/// Prefer the rendered avatar video; otherwise create and use an empty
/// placeholder so a draft can still carry the caption and metadata.
fn video_payload(gen: &GenerateRecord, paths: &WeekPaths) -> Result<(Vec<u8>, String)> {
    let stem = paths::item_stem(&gen.player, &gen.kind);
    let rendered = paths.video_path(&stem);
    let path = if rendered.is_file() {
        rendered
    } else {
        let placeholder = paths.placeholder_video_path(&stem);
        fs::write(&placeholder, b"")
            .with_context(|| format!("write {}", placeholder.display()))?;
        placeholder
    };
    let bytes = fs::read(&path).with_context(|| format!("read {}", path.display()))?;
    let filename = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| "draft.mp4".to_string());
    Ok((bytes, filename))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::DryPublishBackend;
    use serde_json::json;
    use std::cell::Cell;

    struct CountingBackend {
        uploads: Cell<usize>,
    }

    impl CountingBackend {
        fn new() -> Self {
            Self { uploads: Cell::new(0) }
        }
    }

    impl PublishBackend for CountingBackend {
        fn init_upload(&self, _a: &str, _o: &str, draft: bool) -> Result<Value> {
            Ok(json!({"upload_id": "u-1", "draft": draft}))
        }

        fn upload_video(
            &self,
            _a: &str,
            _o: &str,
            upload_id: &str,
            bytes: &[u8],
            filename: &str,
        ) -> Result<Value> {
            self.uploads.set(self.uploads.get() + 1);
            Ok(json!({"upload_id": upload_id, "size": bytes.len(), "filename": filename}))
        }

        fn check_upload_status(&self, _a: &str, _o: &str, upload_id: &str) -> Result<Value> {
            Ok(json!({"upload_id": upload_id, "status": "processed"}))
        }

        fn list_videos(&self, _a: &str, _o: &str, cursor: u64, _m: u64) -> Result<Value> {
            Ok(json!({"videos": [], "cursor": cursor}))
        }

        fn dry_run(&self) -> bool {
            true
        }
    }

    fn gen_record(paths: &WeekPaths, entry_id: &str) -> GenerateRecord {
        GenerateRecord {
            entry_id: entry_id.to_string(),
            player: "A".to_string(),
            kind: "b".to_string(),
            week: 1,
            script_path: paths.script_path("A__b"),
            script_text: "hi".to_string(),
        }
    }

    fn week_paths(dir: &tempfile::TempDir) -> WeekPaths {
        let paths = WeekPaths::new(dir.path(), 1);
        fs::create_dir_all(paths.root()).expect("create week dir");
        paths
    }

    #[test]
    fn dry_mode_publishes_without_metadata_and_records_ledger() {
        let dir = tempfile::tempdir().expect("tempdir");
        let paths = week_paths(&dir);
        let record = publish_step(
            &gen_record(&paths, "A__b__1"),
            &paths,
            &DryPublishBackend,
            &RunConfig::dry(),
        )
        .expect("publish");
        assert!(record.upload_meta.is_some());
        let ledger = UploadLedger::read(&paths.uploads_path());
        assert_eq!(ledger.uploads.len(), 1);
        assert_eq!(ledger.uploads[0].entry_id, "A__b__1");
    }

    #[test]
    fn live_mode_without_metadata_refuses() {
        let dir = tempfile::tempdir().expect("tempdir");
        let paths = week_paths(&dir);
        let config = RunConfig {
            tiktok_access_token: Some("tok".to_string()),
            tiktok_open_id: Some("open".to_string()),
            ..RunConfig::default()
        };
        let err = publish_step(
            &gen_record(&paths, "A__b__1"),
            &paths,
            &DryPublishBackend,
            &config,
        )
        .expect_err("should refuse");
        assert!(err.to_string().contains("refusing to publish"));
    }

    #[test]
    fn live_mode_without_publish_target_is_blocked_and_writes_no_ledger() {
        let dir = tempfile::tempdir().expect("tempdir");
        let paths = week_paths(&dir);
        fs::write(
            paths.meta_path("A__b__1"),
            serde_json::to_vec(&json!({"id": "A__b__1", "approved": true})).expect("meta"),
        )
        .expect("write meta");
        let config = RunConfig {
            tiktok_access_token: Some("tok".to_string()),
            tiktok_open_id: Some("open".to_string()),
            ..RunConfig::default()
        };
        let err = publish_step(
            &gen_record(&paths, "A__b__1"),
            &paths,
            &DryPublishBackend,
            &config,
        )
        .expect_err("should block");
        assert!(err.to_string().contains("publishing is blocked"));
        assert!(!paths.uploads_path().exists());
    }

    #[test]
    fn live_mode_without_credentials_fails() {
        let dir = tempfile::tempdir().expect("tempdir");
        let paths = week_paths(&dir);
        fs::write(
            paths.meta_path("A__b__1"),
            serde_json::to_vec(&json!({"id": "A__b__1", "publish_target": "tiktok"}))
                .expect("meta"),
        )
        .expect("write meta");
        let err = publish_step(
            &gen_record(&paths, "A__b__1"),
            &paths,
            &DryPublishBackend,
            &RunConfig::default(),
        )
        .expect_err("should fail");
        assert!(err.to_string().contains("TIKTOK_ACCESS_TOKEN"));
    }

    #[test]
    fn replay_returns_existing_record_without_uploading() {
        let dir = tempfile::tempdir().expect("tempdir");
        let paths = week_paths(&dir);
        let backend = CountingBackend::new();
        let gen = gen_record(&paths, "A__b__1");
        let config = RunConfig::dry();

        let first = publish_step(&gen, &paths, &backend, &config).expect("first publish");
        let second = publish_step(&gen, &paths, &backend, &config).expect("second publish");

        assert_eq!(backend.uploads.get(), 1);
        assert_eq!(first.upload_meta, second.upload_meta);
        let ledger = UploadLedger::read(&paths.uploads_path());
        assert_eq!(ledger.uploads.len(), 1);
    }
}
