//! Typed paths into a week output directory.
//!
//! Centralizing path construction keeps file access consistent across the
//! pipeline and prevents drift when the layout evolves.
use std::path::{Path, PathBuf};

/// Convenience wrapper for locating artifacts under `<out>/week-<N>/`.
#[derive(Debug, Clone)]
pub struct WeekPaths {
    root: PathBuf,
}

impl WeekPaths {
    /// Create a path helper for the given week under an output root.
    pub fn new(out_root: &Path, week: i64) -> Self {
        Self {
            root: out_root.join(format!("week-{week}")),
        }
    }

    /// Return the week directory used for path derivation.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Return the `manifest.json` path.
    pub fn manifest_path(&self) -> PathBuf {
        self.root.join("manifest.json")
    }

    /// Return the `manifest.csv` mirror path.
    pub fn manifest_csv_path(&self) -> PathBuf {
        self.root.join("manifest.csv")
    }

    /// Return the `plan.json` path.
    pub fn plan_path(&self) -> PathBuf {
        self.root.join("plan.json")
    }

    /// Return the `audit/` directory path.
    pub fn audit_dir(&self) -> PathBuf {
        self.root.join("audit")
    }

    /// Return the `audit/skipped.log` path.
    pub fn skip_log_path(&self) -> PathBuf {
        self.audit_dir().join("skipped.log")
    }

    /// Return the `<stem>.md` script path for a plan item stem.
    pub fn script_path(&self, stem: &str) -> PathBuf {
        self.root.join(format!("{stem}.md"))
    }

    /// Return the `<entry_id>.meta.json` packaging metadata path.
    pub fn meta_path(&self, entry_id: &str) -> PathBuf {
        self.root.join(format!("{entry_id}.meta.json"))
    }

    /// Return the `<stem>/avatar/` render working directory.
    pub fn avatar_dir(&self, stem: &str) -> PathBuf {
        self.root.join(stem).join("avatar")
    }

    /// Return the `<stem>/avatar/render.json` status snapshot path.
    pub fn render_status_path(&self, stem: &str) -> PathBuf {
        self.avatar_dir(stem).join("render.json")
    }

    /// Return the `<stem>/avatar/video.mp4` artifact path.
    pub fn video_path(&self, stem: &str) -> PathBuf {
        self.avatar_dir(stem).join("video.mp4")
    }

    /// Return the `<stem>.mp4` placeholder path used when no render exists.
    pub fn placeholder_video_path(&self, stem: &str) -> PathBuf {
        self.root.join(format!("{stem}.mp4"))
    }

    /// Return the `tiktok_uploads.json` upload ledger path.
    pub fn uploads_path(&self) -> PathBuf {
        self.root.join("tiktok_uploads.json")
    }
}

/// Build the filesystem stem for a plan item: `<safe_player>__<kind>`.
///
/// Spaces in the player name become underscores; the kind is used verbatim.
pub fn item_stem(player: &str, kind: &str) -> String {
    format!("{}__{}", player.replace(' ', "_"), kind)
}

/// Canonical identity for one item in one week: `player__kind__week`.
///
/// Approval, render, and publish records all key off this exact string.
pub fn entry_id(player: &str, kind: &str, week: i64) -> String {
    format!("{player}__{kind}__{week}")
}
