//! Template lookup and best-effort placeholder rendering.
//!
//! Lookup consolidates the canonical and legacy template directories so the
//! planner, generation step, and CLI agree on one resolution order. Rendering
//! never fails: unknown placeholders are left intact.
use regex::Regex;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Canonical template directory.
pub const TEMPLATE_ROOT: &str = "templates/script_templates";
/// Legacy template directory, still honored for lookup.
pub const LEGACY_TEMPLATE_ROOT: &str = "prompts/templates";

/// Kinds whose canonical template filename differs from `<kind>.md`.
const FILENAME_OVERRIDES: &[(&str, &str)] = &[
    ("start-sit", "start_sit.md"),
    ("waiver-wire", "waiver_wire.md"),
];

fn override_for(kind: &str) -> Option<&'static str> {
    FILENAME_OVERRIDES
        .iter()
        .find(|(k, _)| *k == kind)
        .map(|(_, fname)| *fname)
}

/// Locate the template file for a content kind.
///
/// Tries the canonical directory (override filename, `<kind>.md`, underscored
/// variant), then the legacy directory in the same order. When nothing exists
/// the canonical default path is returned anyway so callers have a stable
/// reference; loading falls back to a built-in template.
pub fn resolve_template(kind: &str) -> PathBuf {
    let underscored = format!("{}.md", kind.replace('-', "_"));
    let plain = format!("{kind}.md");
    let mut candidates: Vec<PathBuf> = Vec::new();
    for root in [TEMPLATE_ROOT, LEGACY_TEMPLATE_ROOT] {
        let root = Path::new(root);
        if let Some(fname) = override_for(kind) {
            candidates.push(root.join(fname));
        }
        candidates.push(root.join(&plain));
        candidates.push(root.join(&underscored));
    }
    for candidate in &candidates {
        if candidate.exists() {
            return candidate.clone();
        }
    }
    let default_name = override_for(kind).map(str::to_string).unwrap_or(plain);
    Path::new(TEMPLATE_ROOT).join(default_name)
}

/// Load template text for a kind, preferring an explicit path when given.
///
/// Falls back to a minimal built-in template when no file can be read.
pub fn load_template_text(kind: &str, template: Option<&Path>) -> String {
    let path = template
        .map(Path::to_path_buf)
        .unwrap_or_else(|| resolve_template(kind));
    match fs::read_to_string(&path) {
        Ok(text) => text,
        Err(_) => fallback_template(kind),
    }
}

fn fallback_template(kind: &str) -> String {
    format!("# {kind}\n\nWeek {{week}} update for {{player}}.")
}

/// Substitute `{name}` placeholders from the context, leaving unknown
/// placeholders untouched. A formatting gap must never abort the pipeline.
pub fn render_template(template: &str, context: &BTreeMap<String, String>) -> String {
    let placeholder = Regex::new(r"\{([A-Za-z0-9_]+)\}").expect("placeholder pattern");
    placeholder
        .replace_all(template, |caps: &regex::Captures<'_>| {
            let key = &caps[1];
            context
                .get(key)
                .cloned()
                .unwrap_or_else(|| caps[0].to_string())
        })
        .into_owned()
}
