//! Avatar-render backend: submit a script, poll the job until it finishes.
//!
//! Both implementations return raw JSON responses so the render step can
//! persist exactly what the backend said at every tick.
use anyhow::{Context, Result};
use serde_json::{json, Value};

use crate::adapters::http;
use crate::util::truncate_chars;

const HEYGEN_BASE_URL: &str = "https://api.heygen.com/v2";

/// Parameters for one avatar render job.
#[derive(Debug, Clone)]
pub struct RenderRequest {
    pub script_text: String,
    pub avatar_id: String,
    pub voice_id: Option<String>,
}

/// Avatar rendering collaborator.
pub trait AvatarBackend {
    /// Submit a render job; the response carries the job handle.
    fn submit(&self, request: &RenderRequest) -> Result<Value>;
    /// Fetch the current status of a submitted job.
    fn poll(&self, video_id: &str) -> Result<Value>;
    fn dry_run(&self) -> bool;
}

/// Stub backend: submission succeeds instantly and polling always reports a
/// finished job.
#[derive(Debug, Default)]
pub struct DryAvatarBackend;

impl AvatarBackend for DryAvatarBackend {
    fn submit(&self, request: &RenderRequest) -> Result<Value> {
        Ok(json!({
            "video_id": "dry-video-abc123",
            "script_preview": truncate_chars(&request.script_text, 40),
            "avatar_id": request.avatar_id,
        }))
    }

    fn poll(&self, video_id: &str) -> Result<Value> {
        Ok(json!({
            "video_id": video_id,
            "status": "completed(dry)",
            "progress": 100,
        }))
    }

    fn dry_run(&self) -> bool {
        true
    }
}

/// Live HeyGen-style backend.
pub struct LiveAvatarBackend {
    api_key: String,
}

impl LiveAvatarBackend {
    pub fn new(api_key: String) -> Self {
        Self { api_key }
    }
}

impl AvatarBackend for LiveAvatarBackend {
    fn submit(&self, request: &RenderRequest) -> Result<Value> {
        let mut payload = json!({
            "script_text": request.script_text,
            "avatar_id": request.avatar_id,
        });
        if let Some(voice_id) = &request.voice_id {
            payload["voice_id"] = Value::from(voice_id.clone());
        }
        let url = format!("{HEYGEN_BASE_URL}/videos/createByText");
        http::post_json(&url, Some(&self.api_key), &payload).context("submit render job")
    }

    fn poll(&self, video_id: &str) -> Result<Value> {
        let url = format!("{HEYGEN_BASE_URL}/videos/{video_id}");
        http::get_json(&url, Some(&self.api_key), &[]).context("poll render job")
    }

    fn dry_run(&self) -> bool {
        false
    }
}
