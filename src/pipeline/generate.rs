//! Generation step: render the template, ask the script backend, persist the
//! script file.
use anyhow::{Context, Result};
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;

use crate::adapters::{ScriptBackend, ScriptRequest};
use crate::guardrails::{self, LengthMode};
use crate::paths::{self, WeekPaths};
use crate::planner::PlanItem;
use crate::templates;

/// Words allowed in a short-form script before the length guardrail warns.
const SCRIPT_WORD_BUDGET: usize = 70;

/// Output of one generation step. Created once per plan item per run and not
/// mutated afterward.
#[derive(Debug, Clone, Serialize)]
pub struct GenerateRecord {
    pub entry_id: String,
    pub player: String,
    pub kind: String,
    pub week: i64,
    pub script_path: PathBuf,
    pub script_text: String,
}

/// Generate the script for one plan item and write it under the week dir.
///
/// The script file write is deliberately not atomic: content is re-derivable
/// and overwritten on every re-run of the same item.
pub fn generate_step(
    item: &PlanItem,
    week: i64,
    paths: &WeekPaths,
    backend: &dyn ScriptBackend,
) -> Result<GenerateRecord> {
    let player = item.player.trim().to_string();
    let kind = item.kind.trim().to_string();

    if let Some(status) = item_status(item) {
        let check = guardrails::assert_not_out(Some(&status));
        if !check.ok {
            tracing::warn!(player = %player, reason = %check.reason, "featuring a sidelined player");
        }
    }

    let template_text = templates::load_template_text(&kind, item.template.as_deref());
    let context = render_context(item, &kind, week, &player);
    let prompt = templates::render_template(&template_text, &context);

    let request = ScriptRequest::new(prompt);
    let script_text = backend.generate(&request).context("generate script")?;

    let length = guardrails::enforce_length(&script_text, SCRIPT_WORD_BUDGET, LengthMode::Fail);
    if !length.ok {
        tracing::warn!(
            kind = %kind,
            player = %player,
            words = length.word_count,
            "script exceeds short-form budget"
        );
    }

    fs::create_dir_all(paths.root())
        .with_context(|| format!("create {}", paths.root().display()))?;
    let stem = paths::item_stem(&player, &kind);
    let script_path = paths.script_path(&stem);
    fs::write(&script_path, &script_text)
        .with_context(|| format!("write {}", script_path.display()))?;

    Ok(GenerateRecord {
        entry_id: paths::entry_id(&player, &kind, week),
        player,
        kind,
        week,
        script_path,
        script_text,
    })
}

fn render_context(
    item: &PlanItem,
    kind: &str,
    week: i64,
    player: &str,
) -> BTreeMap<String, String> {
    let mut context = BTreeMap::new();
    context.insert("kind".to_string(), kind.to_string());
    context.insert("week".to_string(), week.to_string());
    context.insert("player".to_string(), player.to_string());
    for (key, value) in &item.extra {
        context.insert(key.clone(), value_text(value));
    }
    context
}

fn item_status(item: &PlanItem) -> Option<String> {
    item.extra
        .get("status")
        .or_else(|| item.extra.get("injury_status"))
        .map(value_text)
}

fn value_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::DryScriptBackend;

    fn item(player: &str, kind: &str) -> PlanItem {
        PlanItem {
            player: player.to_string(),
            kind: kind.to_string(),
            template: None,
            day_slot: 0,
            extra: BTreeMap::new(),
        }
    }

    #[test]
    fn generate_writes_script_and_builds_entry_id() {
        let dir = tempfile::tempdir().expect("tempdir");
        let paths = WeekPaths::new(dir.path(), 5);
        let record = generate_step(&item("Test Player", "start-sit"), 5, &paths, &DryScriptBackend)
            .expect("generate");
        assert_eq!(record.entry_id, "Test Player__start-sit__5");
        assert!(record.script_path.ends_with("Test_Player__start-sit.md"));
        let on_disk = fs::read_to_string(&record.script_path).expect("read script");
        assert_eq!(on_disk, record.script_text);
    }

    #[test]
    fn generate_is_deterministic_in_dry_mode() {
        let dir = tempfile::tempdir().expect("tempdir");
        let paths = WeekPaths::new(dir.path(), 5);
        let a = generate_step(&item("A", "waiver-wire"), 5, &paths, &DryScriptBackend)
            .expect("generate");
        let b = generate_step(&item("A", "waiver-wire"), 5, &paths, &DryScriptBackend)
            .expect("generate");
        assert_eq!(a.script_text, b.script_text);
    }

    #[test]
    fn item_extras_feed_the_template_context() {
        let mut it = item("A", "start-sit");
        it.extra
            .insert("recommendation".to_string(), Value::from("start"));
        let context = render_context(&it, "start-sit", 3, "A");
        assert_eq!(context.get("recommendation").map(String::as_str), Some("start"));
        assert_eq!(context.get("week").map(String::as_str), Some("3"));
    }
}
