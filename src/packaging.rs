//! Caption, hashtag, and export metadata packaging.
//!
//! Pure functions; deterministic under dry-run so golden outputs are stable
//! between runs.
use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::util::{short_digest, truncate_chars};

/// Maximum caption length accepted by the upload targets.
const CAPTION_MAX_CHARS: usize = 120;

/// Export metadata for one generated item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Metadata {
    pub id: String,
    pub kind: String,
    pub week: i64,
    pub player: Option<String>,
    pub caption: String,
    pub hashtags: Vec<String>,
    pub created_at: String,
    pub source: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extra: Option<Value>,
}

/// Build the post caption: title-cased kind plus the week marker.
///
/// In dry-run a deterministic digest tag is prefixed so reruns are
/// recognizable and reproducible. Output is always at most 120 chars.
pub fn build_caption(script_text: &str, kind: &str, week: i64, dry_run: bool) -> String {
    let base = format!("{} — Week {week}", title_case_kind(kind));
    if dry_run {
        let seed = short_digest(&[kind, &week.to_string(), script_text], 10);
        truncate_chars(&format!("[dry-run-{seed}] {base}"), CAPTION_MAX_CHARS)
    } else {
        truncate_chars(&base, CAPTION_MAX_CHARS)
    }
}

/// Build the fixed hashtag set for a kind and week.
pub fn build_hashtags(kind: &str, week: i64) -> Vec<String> {
    let mut tags = vec![
        "#FantasyFootball".to_string(),
        "#NFL".to_string(),
        format!("#Week{week}"),
    ];
    let pascal = pascal_case_kind(kind);
    if !pascal.is_empty() {
        tags.push(format!("#{pascal}"));
    }
    tags
}

/// Assemble the export metadata record, stamped with the current UTC time.
pub fn package_metadata(
    id: Option<&str>,
    kind: &str,
    week: i64,
    player: Option<&str>,
    caption: String,
    hashtags: Vec<String>,
    extra: Option<Value>,
) -> Metadata {
    let id = id
        .map(str::to_string)
        .unwrap_or_else(|| short_digest(&[kind, &week.to_string(), player.unwrap_or("")], 10));
    Metadata {
        id,
        kind: kind.to_string(),
        week,
        player: player.map(str::to_string),
        caption,
        hashtags,
        created_at: Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true),
        source: "packaging".to_string(),
        extra,
    }
}

/// Serialize metadata to its compact export form.
pub fn to_exportable(metadata: &Metadata) -> String {
    serde_json::to_string(metadata).unwrap_or_else(|_| "{}".to_string())
}

fn title_case_kind(kind: &str) -> String {
    kind.replace('-', " ")
        .split_whitespace()
        .map(capitalize)
        .collect::<Vec<String>>()
        .join(" ")
}

fn pascal_case_kind(kind: &str) -> String {
    kind.split('-').map(capitalize).collect()
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}
