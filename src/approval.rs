//! Approval ledger lookup and the audit trail for blocked items.
//!
//! The ledger is maintained by reviewers (CSV preferred, JSON mirror for
//! tooling) and is read-only from the pipeline's point of view. Blocked items
//! leave one JSON line each in the week's append-only skip log.
use anyhow::{Context, Result};
use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::Path;

use crate::paths::WeekPaths;

/// One reviewer decision row, as stored in the ledger.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ApprovalRow {
    #[serde(default)]
    pub id: String,
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default)]
    pub player: String,
    #[serde(default)]
    pub week: String,
    #[serde(default)]
    pub approved: String,
    #[serde(default)]
    pub reviewer: String,
    #[serde(default)]
    pub note: String,
    #[serde(default)]
    pub updated_at: String,
}

/// Gate decision for one entry.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ApproveRecord {
    pub entry_id: String,
    pub approved: bool,
    /// The ledger row that decided the outcome, when one matched.
    pub row: Option<ApprovalRow>,
}

/// In-memory view of the reviewer ledger.
#[derive(Debug, Clone, Default)]
pub struct ApprovalLedger {
    rows: Vec<ApprovalRow>,
}

impl ApprovalLedger {
    pub fn from_rows(rows: Vec<ApprovalRow>) -> Self {
        Self { rows }
    }

    /// Load the ledger from `<root>/manifest.csv`, falling back to
    /// `<root>/manifest.json`. A missing or damaged ledger reads as empty,
    /// which blocks everything (the safe direction).
    pub fn load(root: &Path) -> Self {
        let csv_path = root.join("manifest.csv");
        if csv_path.is_file() {
            match read_csv_rows(&csv_path) {
                Ok(rows) => return Self { rows },
                Err(err) => {
                    tracing::warn!(path = %csv_path.display(), %err, "unreadable approval ledger treated as empty");
                    return Self::default();
                }
            }
        }
        let json_path = root.join("manifest.json");
        if json_path.is_file() {
            match fs::read(&json_path)
                .context("read approval ledger")
                .and_then(|bytes| {
                    serde_json::from_slice::<Vec<ApprovalRow>>(&bytes)
                        .context("parse approval ledger JSON")
                }) {
                Ok(rows) => return Self { rows },
                Err(err) => {
                    tracing::warn!(path = %json_path.display(), %err, "unreadable approval ledger treated as empty");
                }
            }
        }
        Self::default()
    }

    pub fn rows(&self) -> &[ApprovalRow] {
        &self.rows
    }

    /// Decide approval for an entry.
    ///
    /// First row in ledger order wins: exact `id` match, else the
    /// (player, week-as-string, type) triple. Approved means the row's
    /// `approved` field reads as `1`, `true`, or `yes` (any case).
    pub fn decide(&self, entry_id: &str, player: &str, kind: &str, week: i64) -> ApproveRecord {
        let week_str = week.to_string();
        let matched = self.rows.iter().find(|row| {
            row.id == entry_id
                || (row.player == player && row.week == week_str && row.kind == kind)
        });
        let approved = matched.map(|row| is_approved(&row.approved)).unwrap_or(false);
        ApproveRecord {
            entry_id: entry_id.to_string(),
            approved,
            row: matched.cloned(),
        }
    }
}

fn is_approved(raw: &str) -> bool {
    matches!(raw.trim().to_lowercase().as_str(), "1" | "true" | "yes")
}

fn read_csv_rows(path: &Path) -> Result<Vec<ApprovalRow>> {
    let mut reader = csv::Reader::from_path(path)
        .with_context(|| format!("open {}", path.display()))?;
    let mut rows = Vec::new();
    for row in reader.deserialize() {
        let row: ApprovalRow = row.context("parse approval ledger row")?;
        rows.push(row);
    }
    Ok(rows)
}

/// Rewrite the ledger as CSV plus a JSON mirror for tooling.
pub fn write_ledger(root: &Path, rows: &[ApprovalRow]) -> Result<()> {
    fs::create_dir_all(root).with_context(|| format!("create {}", root.display()))?;
    let csv_path = root.join("manifest.csv");
    let mut writer = csv::Writer::from_path(&csv_path)
        .with_context(|| format!("write {}", csv_path.display()))?;
    for row in rows {
        writer.serialize(row).context("serialize approval row")?;
    }
    // An empty ledger still gets its header so reviewers can append by hand.
    if rows.is_empty() {
        writer
            .write_record([
                "id",
                "type",
                "player",
                "week",
                "approved",
                "reviewer",
                "note",
                "updated_at",
            ])
            .context("write approval header")?;
    }
    writer.flush().context("flush approval ledger")?;

    let json_path = root.join("manifest.json");
    let text = serde_json::to_string_pretty(rows).context("serialize approval ledger")?;
    fs::write(&json_path, text).with_context(|| format!("write {}", json_path.display()))?;
    Ok(())
}

/// Update or insert a reviewer decision for an entry id and persist the
/// ledger. Missing rows are created with only the decision fields filled.
pub fn set_approval(
    root: &Path,
    entry_id: &str,
    approved: bool,
    reviewer: &str,
    note: &str,
) -> Result<()> {
    let mut rows = ApprovalLedger::load(root).rows;
    let now = Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true);
    let decision = if approved { "true" } else { "false" };
    let mut found = false;
    for row in rows.iter_mut() {
        if row.id == entry_id {
            row.approved = decision.to_string();
            row.reviewer = reviewer.to_string();
            row.note = note.to_string();
            row.updated_at = now.clone();
            found = true;
        }
    }
    if !found {
        rows.push(ApprovalRow {
            id: entry_id.to_string(),
            approved: decision.to_string(),
            reviewer: reviewer.to_string(),
            note: note.to_string(),
            updated_at: now,
            ..ApprovalRow::default()
        });
    }
    write_ledger(root, &rows)
}

/// One line of the append-only skip log.
#[derive(Debug, Serialize, Deserialize)]
pub struct SkipLine {
    pub ts: String,
    pub entry_id: String,
    pub action: String,
    pub reviewer: String,
    pub note: String,
}

/// Append one structured line to `<week>/audit/skipped.log`.
///
/// The log is append-only; nothing in normal operation truncates it.
pub fn append_skip(paths: &WeekPaths, entry_id: &str, row: Option<&ApprovalRow>) -> Result<()> {
    let audit_dir = paths.audit_dir();
    fs::create_dir_all(&audit_dir).with_context(|| format!("create {}", audit_dir.display()))?;
    let line = SkipLine {
        ts: Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true),
        entry_id: entry_id.to_string(),
        action: "skipped".to_string(),
        reviewer: row
            .map(|r| r.reviewer.clone())
            .filter(|r| !r.is_empty())
            .unwrap_or_else(|| "none".to_string()),
        note: row
            .map(|r| r.note.clone())
            .filter(|n| !n.is_empty())
            .unwrap_or_else(|| "not in manifest".to_string()),
    };
    let path = paths.skip_log_path();
    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .with_context(|| format!("open {}", path.display()))?;
    let json = serde_json::to_string(&line).context("serialize skip line")?;
    file.write_all(json.as_bytes())
        .with_context(|| format!("write {}", path.display()))?;
    file.write_all(b"\n")
        .with_context(|| format!("write {}", path.display()))?;
    Ok(())
}

/// Seed a fresh ledger, optionally with sample rows.
pub fn init_ledger(root: &Path, sample: Option<Vec<ApprovalRow>>) -> Result<()> {
    write_ledger(root, &sample.unwrap_or_default())
}
