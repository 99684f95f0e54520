//! Week manifest store: idempotent upserts over an atomically written file.
//!
//! The manifest is the durable record of which scripts exist for a week. Reads
//! are forgiving (a damaged file is treated as empty); writes are atomic and
//! failures propagate because continuing with stale state would corrupt the
//! run.
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fs::{self, File};
use std::path::Path;

/// One manifest row. Extra fields round-trip through `extra` so the CSV
/// mirror can derive its column union.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ManifestEntry {
    #[serde(default)]
    pub player: String,
    #[serde(default)]
    pub week: i64,
    #[serde(default)]
    pub kind: String,
    #[serde(default)]
    pub path: String,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl ManifestEntry {
    pub fn new(player: &str, week: i64, kind: &str, path: &str) -> Self {
        Self {
            player: player.trim().to_string(),
            week,
            kind: kind.trim().to_string(),
            path: path.to_string(),
            extra: BTreeMap::new(),
        }
    }

    fn key(&self) -> (String, String, i64) {
        (
            self.player.trim().to_lowercase(),
            self.kind.trim().to_lowercase(),
            self.week,
        )
    }
}

/// Read manifest entries, returning an empty list when the file is missing or
/// unparsable. Damage is logged, never fatal.
pub fn read(path: &Path) -> Vec<ManifestEntry> {
    let bytes = match fs::read(path) {
        Ok(bytes) => bytes,
        Err(_) => return Vec::new(),
    };
    match serde_json::from_slice::<Vec<ManifestEntry>>(&bytes) {
        Ok(entries) => entries,
        Err(err) => {
            tracing::warn!(path = %path.display(), %err, "unparsable manifest treated as empty");
            Vec::new()
        }
    }
}

/// Upsert `new_entry` into `entries` by normalized (player, kind, week) key.
///
/// Returns the entries resorted by (week, player, kind) so repeated writes of
/// the same logical content are byte-identical. Duplicate keys collapse to the
/// most recently seen entry.
pub fn upsert(entries: Vec<ManifestEntry>, new_entry: ManifestEntry) -> Vec<ManifestEntry> {
    let mut order: Vec<(String, String, i64)> = Vec::with_capacity(entries.len() + 1);
    let mut by_key: BTreeMap<(String, String, i64), ManifestEntry> = BTreeMap::new();
    for entry in entries.into_iter().chain(std::iter::once(new_entry)) {
        let key = entry.key();
        if by_key.insert(key.clone(), entry).is_none() {
            order.push(key);
        }
    }
    let mut merged: Vec<ManifestEntry> = order
        .into_iter()
        .filter_map(|key| by_key.remove(&key))
        .collect();
    merged.sort_by(|a, b| {
        let ka = (
            a.week,
            a.player.trim().to_lowercase(),
            a.kind.trim().to_lowercase(),
        );
        let kb = (
            b.week,
            b.player.trim().to_lowercase(),
            b.kind.trim().to_lowercase(),
        );
        ka.cmp(&kb)
    });
    merged
}

/// Write manifest JSON atomically: serialize to a sibling tmp file, sync, then
/// rename over the destination. No reader ever observes a partial file.
pub fn write_atomic(path: &Path, entries: &[ManifestEntry]) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).with_context(|| format!("create {}", parent.display()))?;
    }
    let tmp = tmp_sibling(path);
    let mut file = File::create(&tmp).with_context(|| format!("write {}", tmp.display()))?;
    serde_json::to_writer_pretty(&mut file, entries).context("serialize manifest")?;
    file.sync_all().with_context(|| format!("sync {}", tmp.display()))?;
    fs::rename(&tmp, path).with_context(|| format!("replace {}", path.display()))?;
    Ok(())
}

/// Overwrite the CSV mirror derived from entries, atomically.
///
/// Header is the fixed core columns followed by the sorted union of every
/// extra key seen across entries.
pub fn write_csv(path: &Path, entries: &[ManifestEntry]) -> Result<()> {
    const CORE: [&str; 4] = ["player", "week", "kind", "path"];

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).with_context(|| format!("create {}", parent.display()))?;
    }

    let mut extras: Vec<String> = Vec::new();
    for entry in entries {
        for key in entry.extra.keys() {
            if !CORE.contains(&key.as_str()) && !extras.contains(key) {
                extras.push(key.clone());
            }
        }
    }
    extras.sort();

    let tmp = tmp_sibling(path);
    {
        let file = File::create(&tmp).with_context(|| format!("write {}", tmp.display()))?;
        let mut writer = csv::Writer::from_writer(&file);
        let header: Vec<&str> = CORE
            .iter()
            .copied()
            .chain(extras.iter().map(String::as_str))
            .collect();
        writer.write_record(&header).context("write csv header")?;
        for entry in entries {
            let mut row: Vec<String> = vec![
                entry.player.clone(),
                entry.week.to_string(),
                entry.kind.clone(),
                entry.path.clone(),
            ];
            for key in &extras {
                row.push(entry.extra.get(key).map(cell_text).unwrap_or_default());
            }
            writer.write_record(&row).context("write csv row")?;
        }
        writer.flush().context("flush csv")?;
        file.sync_all().with_context(|| format!("sync {}", tmp.display()))?;
    }
    fs::rename(&tmp, path).with_context(|| format!("replace {}", path.display()))?;
    Ok(())
}

fn cell_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

fn tmp_sibling(path: &Path) -> std::path::PathBuf {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| "manifest".to_string());
    path.with_file_name(format!("{name}.tmp"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn upsert_replaces_same_key_and_keeps_latest_path() {
        let entries = upsert(Vec::new(), ManifestEntry::new("Player A", 3, "start-sit", "a.md"));
        let entries = upsert(entries, ManifestEntry::new("player a", 3, "Start-Sit", "b.md"));
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].path, "b.md");
    }

    #[test]
    fn upsert_distinct_keys_sorts_by_week_player_kind() {
        let entries = upsert(Vec::new(), ManifestEntry::new("Zeke", 2, "waiver-wire", "z.md"));
        let entries = upsert(entries, ManifestEntry::new("Amon", 2, "waiver-wire", "a.md"));
        let entries = upsert(entries, ManifestEntry::new("Amon", 1, "waiver-wire", "a1.md"));
        assert_eq!(entries.len(), 3);
        assert_eq!(entries[0].week, 1);
        assert_eq!(entries[1].player, "Amon");
        assert_eq!(entries[2].player, "Zeke");
    }

    #[test]
    fn read_missing_or_damaged_file_is_empty() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("manifest.json");
        assert!(read(&path).is_empty());
        fs::write(&path, b"{not json").expect("write");
        assert!(read(&path).is_empty());
    }

    #[test]
    fn csv_mirror_has_header_plus_one_row_per_entry() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut entry = ManifestEntry::new("A", 1, "start-sit", "a.md");
        entry.extra.insert("day_slot".to_string(), Value::from(4));
        let entries = vec![entry, ManifestEntry::new("B", 1, "waiver-wire", "b.md")];
        let path = dir.path().join("manifest.csv");
        write_csv(&path, &entries).expect("write csv");
        let text = fs::read_to_string(&path).expect("read csv");
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), entries.len() + 1);
        assert_eq!(lines[0], "player,week,kind,path,day_slot");
        assert!(lines[1].starts_with("A,1,start-sit,a.md,4"));
    }

    #[test]
    fn atomic_write_round_trips() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("manifest.json");
        let entries = vec![ManifestEntry::new("A", 1, "start-sit", "a.md")];
        write_atomic(&path, &entries).expect("write");
        assert_eq!(read(&path), entries);
        assert!(!path.with_file_name("manifest.json.tmp").exists());
    }
}
