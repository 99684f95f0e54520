//! Upload ledger: the durable record that makes publishing idempotent.
//!
//! One record per published entry id. Replaying a publish for a recorded id
//! returns the stored record without touching the upload backend. The check is
//! entry-id only; content is not hashed.
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fs::{self, File};
use std::io::Write;
use std::path::Path;

/// The three backend responses captured for one completed upload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UploadRecord {
    pub entry_id: String,
    pub init: Value,
    pub upload: Value,
    pub status: Value,
}

/// Persisted ledger: completed uploads plus entry ids skipped by the gate.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UploadLedger {
    #[serde(default)]
    pub uploads: Vec<UploadRecord>,
    #[serde(default)]
    pub skipped: Vec<String>,
}

impl UploadLedger {
    /// Read the ledger, treating a missing file as empty. Damage is logged
    /// and also reads as empty; the next write rebuilds the file.
    pub fn read(path: &Path) -> Self {
        let bytes = match fs::read(path) {
            Ok(bytes) => bytes,
            Err(_) => return Self::default(),
        };
        match serde_json::from_slice(&bytes) {
            Ok(ledger) => ledger,
            Err(err) => {
                tracing::warn!(path = %path.display(), %err, "unparsable upload ledger treated as empty");
                Self::default()
            }
        }
    }

    /// Find the record for an entry id, if one was ever written.
    pub fn find(&self, entry_id: &str) -> Option<&UploadRecord> {
        self.uploads.iter().find(|rec| rec.entry_id == entry_id)
    }

    /// Record that the gate skipped an entry, without duplicates.
    pub fn record_skip(&mut self, entry_id: &str) {
        if !self.skipped.iter().any(|id| id == entry_id) {
            self.skipped.push(entry_id.to_string());
        }
    }

    /// Persist the ledger durably: the file is fully written and synced
    /// before this returns, so a recorded upload is never replayed.
    pub fn write(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| format!("create {}", parent.display()))?;
        }
        let text = serde_json::to_string_pretty(self).context("serialize upload ledger")?;
        let mut file = File::create(path).with_context(|| format!("write {}", path.display()))?;
        file.write_all(text.as_bytes())
            .with_context(|| format!("write {}", path.display()))?;
        file.sync_all().with_context(|| format!("sync {}", path.display()))?;
        Ok(())
    }
}
