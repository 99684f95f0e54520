//! End-to-end tests driving the ffclips binary in dry-run mode.

use std::path::Path;
use std::process::Command;

fn ffclips() -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_ffclips"));
    cmd.env("DRY_RUN", "true");
    cmd
}

fn read_manifest(week_dir: &Path) -> Vec<serde_json::Value> {
    let text = std::fs::read_to_string(week_dir.join("manifest.json")).expect("read manifest");
    serde_json::from_str(&text).expect("parse manifest")
}

#[test]
fn plan_is_deterministic_across_invocations() {
    let temp = tempfile::tempdir().expect("tempdir");
    let out_a = temp.path().join("a");
    let out_b = temp.path().join("b");

    for out in [&out_a, &out_b] {
        let status = ffclips()
            .args(["plan", "--week", "5", "--kinds", "start-sit,waiver-wire"])
            .arg("--out")
            .arg(out)
            .status()
            .expect("run plan");
        assert!(status.success());
    }

    let plan_a = std::fs::read(out_a.join("week-5").join("plan.json")).expect("read plan a");
    let plan_b = std::fs::read(out_b.join("week-5").join("plan.json")).expect("read plan b");
    assert_eq!(plan_a, plan_b);
}

#[test]
fn dry_run_week_produces_scripts_and_idempotent_manifest() {
    let temp = tempfile::tempdir().expect("tempdir");
    let out = temp.path().join("out");
    let approval = temp.path().join("approval");

    let run = |label: &str| {
        let status = ffclips()
            .args(["run", "--week", "5", "--count", "12"])
            .arg("--out")
            .arg(&out)
            .arg("--approval-dir")
            .arg(&approval)
            .status()
            .unwrap_or_else(|err| panic!("{label}: {err}"));
        assert!(status.success(), "{label} failed");
    };

    run("first run");
    let week_dir = out.join("week-5");
    let entries = read_manifest(&week_dir);
    assert_eq!(entries.len(), 12);

    // Entries are sorted by (week, player, kind).
    let keys: Vec<(i64, String, String)> = entries
        .iter()
        .map(|e| {
            (
                e["week"].as_i64().expect("week"),
                e["player"].as_str().expect("player").to_lowercase(),
                e["kind"].as_str().expect("kind").to_lowercase(),
            )
        })
        .collect();
    let mut sorted = keys.clone();
    sorted.sort();
    assert_eq!(keys, sorted);

    // One script file per entry, plus metadata per entry id.
    for entry in &entries {
        let script = week_dir.join(entry["path"].as_str().expect("path"));
        assert!(script.is_file(), "missing script {}", script.display());
    }
    let scripts = std::fs::read_dir(&week_dir)
        .expect("read week dir")
        .flatten()
        .filter(|e| e.path().extension().is_some_and(|ext| ext == "md"))
        .count();
    assert_eq!(scripts, 12);

    // Nothing approved: every item leaves an audit line and no uploads.
    let audit = std::fs::read_to_string(week_dir.join("audit").join("skipped.log"))
        .expect("read skip log");
    assert_eq!(audit.lines().count(), 12);
    for line in audit.lines() {
        let parsed: serde_json::Value = serde_json::from_str(line).expect("audit line JSON");
        assert_eq!(parsed["action"], "skipped");
        assert_eq!(parsed["reviewer"], "none");
    }

    let first = std::fs::read(week_dir.join("manifest.json")).expect("manifest bytes");
    run("second run");
    let second = std::fs::read(week_dir.join("manifest.json")).expect("manifest bytes");
    assert_eq!(first, second, "rerun must leave manifest byte-identical");

    // The audit log is append-only: the rerun added 12 more lines.
    let audit = std::fs::read_to_string(week_dir.join("audit").join("skipped.log"))
        .expect("read skip log");
    assert_eq!(audit.lines().count(), 24);
}

#[test]
fn approved_items_render_and_upload_in_dry_mode() {
    let temp = tempfile::tempdir().expect("tempdir");
    let out = temp.path().join("out");
    let approval = temp.path().join("approval");

    // Plan first to learn the entry ids, then approve them all.
    let status = ffclips()
        .args(["plan", "--week", "3", "--kinds", "start-sit", "--count", "10"])
        .arg("--out")
        .arg(&out)
        .status()
        .expect("run plan");
    assert!(status.success());
    let plan: Vec<serde_json::Value> = serde_json::from_str(
        &std::fs::read_to_string(out.join("week-3").join("plan.json")).expect("read plan"),
    )
    .expect("parse plan");
    for item in &plan {
        let entry_id = format!(
            "{}__{}__3",
            item["player"].as_str().expect("player"),
            item["kind"].as_str().expect("kind")
        );
        let status = ffclips()
            .args(["approve", "set", &entry_id, "--approved", "true"])
            .arg("--dir")
            .arg(&approval)
            .status()
            .expect("run approve");
        assert!(status.success());
    }

    let status = ffclips()
        .args([
            "run",
            "--week",
            "3",
            "--kinds",
            "start-sit",
            "--count",
            "10",
            "--render",
            "--upload",
        ])
        .arg("--out")
        .arg(&out)
        .arg("--approval-dir")
        .arg(&approval)
        .status()
        .expect("run pipeline");
    assert!(status.success());

    let week_dir = out.join("week-3");
    let ledger: serde_json::Value = serde_json::from_str(
        &std::fs::read_to_string(week_dir.join("tiktok_uploads.json")).expect("read ledger"),
    )
    .expect("parse ledger");
    assert_eq!(ledger["uploads"].as_array().expect("uploads").len(), 10);
    assert!(ledger["skipped"].as_array().expect("skipped").is_empty());

    // Each item carries a render status snapshot and a placeholder video.
    for entry in read_manifest(&week_dir) {
        let stem = format!(
            "{}__{}",
            entry["player"].as_str().expect("player").replace(' ', "_"),
            entry["kind"].as_str().expect("kind")
        );
        let avatar_dir = week_dir.join(&stem).join("avatar");
        assert!(avatar_dir.join("render.json").is_file());
        assert!(avatar_dir.join("video.mp4").is_file());
    }

    // Replaying the pipeline performs no second upload for recorded ids.
    let status = ffclips()
        .args([
            "run",
            "--week",
            "3",
            "--kinds",
            "start-sit",
            "--count",
            "10",
            "--upload",
        ])
        .arg("--out")
        .arg(&out)
        .arg("--approval-dir")
        .arg(&approval)
        .status()
        .expect("replay pipeline");
    assert!(status.success());
    let replayed: serde_json::Value = serde_json::from_str(
        &std::fs::read_to_string(week_dir.join("tiktok_uploads.json")).expect("read ledger"),
    )
    .expect("parse ledger");
    assert_eq!(replayed["uploads"].as_array().expect("uploads").len(), 10);
}

#[test]
fn upload_command_writes_dry_artifacts() {
    let temp = tempfile::tempdir().expect("tempdir");
    let out = temp.path().join("out");
    let video = temp.path().join("clip.mp4");
    std::fs::write(&video, b"").expect("write video");

    let status = ffclips()
        .args(["upload", "--week", "2", "--kind", "start-sit"])
        .arg("--file")
        .arg(&video)
        .arg("--out")
        .arg(&out)
        .status()
        .expect("run upload");
    assert!(status.success());

    let canonical = out
        .join("week-2")
        .join("start-sit")
        .join("tiktok")
        .join("upload.json");
    let payload: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&canonical).expect("read payload"))
            .expect("parse payload");
    assert_eq!(payload["upload_id"], "dry-upload-123");
    assert_eq!(payload["dry_run"], true);
    assert!(temp.path().join("clip.mp4.upload.json").is_file());
}

#[test]
fn upload_command_rejects_out_of_range_week() {
    let temp = tempfile::tempdir().expect("tempdir");
    let video = temp.path().join("clip.mp4");
    std::fs::write(&video, b"").expect("write video");

    let output = ffclips()
        .args(["upload", "--week", "19", "--kind", "start-sit"])
        .arg("--file")
        .arg(&video)
        .output()
        .expect("run upload");
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("week must be between 1 and 18"));
}
