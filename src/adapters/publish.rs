//! Upload backend: draft init, byte upload, status check, listing.
//!
//! The live implementation talks to the TikTok open API; construction fails
//! when the OAuth app credentials are missing so a live toggle can never
//! silently degrade into the stub.
use anyhow::{anyhow, Context, Result};
use serde_json::{json, Value};

use crate::adapters::http;

const INIT_UPLOAD_URL: &str = "https://open.tiktokapis.com/v2/post/publish/inbox/video/init/";
const UPLOAD_URL: &str = "https://open.tiktokapis.com/v2/post/publish/inbox/video/upload/";
const CHECK_URL: &str = "https://open.tiktokapis.com/v2/post/publish/inbox/video/query/";
const LIST_URL: &str = "https://open.tiktokapis.com/v2/post/publish/list/";

/// Upload collaborator.
pub trait PublishBackend {
    fn init_upload(&self, access_token: &str, open_id: &str, draft: bool) -> Result<Value>;
    fn upload_video(
        &self,
        access_token: &str,
        open_id: &str,
        upload_id: &str,
        video_bytes: &[u8],
        filename: &str,
    ) -> Result<Value>;
    fn check_upload_status(&self, access_token: &str, open_id: &str, upload_id: &str)
        -> Result<Value>;
    fn list_videos(
        &self,
        access_token: &str,
        open_id: &str,
        cursor: u64,
        max_count: u64,
    ) -> Result<Value>;
    fn dry_run(&self) -> bool;
}

/// Stub backend with stable, recognizable responses.
#[derive(Debug, Default)]
pub struct DryPublishBackend;

impl PublishBackend for DryPublishBackend {
    fn init_upload(&self, _access_token: &str, open_id: &str, draft: bool) -> Result<Value> {
        Ok(json!({
            "upload_id": "dry-upload-123",
            "draft": draft,
            "open_id": open_id,
        }))
    }

    fn upload_video(
        &self,
        _access_token: &str,
        _open_id: &str,
        upload_id: &str,
        video_bytes: &[u8],
        filename: &str,
    ) -> Result<Value> {
        Ok(json!({
            "upload_id": upload_id,
            "size": video_bytes.len(),
            "filename": filename,
            "status": "uploaded(dry)",
        }))
    }

    fn check_upload_status(
        &self,
        _access_token: &str,
        open_id: &str,
        upload_id: &str,
    ) -> Result<Value> {
        Ok(json!({
            "upload_id": upload_id,
            "open_id": open_id,
            "status": "processed(dry)",
        }))
    }

    fn list_videos(
        &self,
        _access_token: &str,
        open_id: &str,
        cursor: u64,
        max_count: u64,
    ) -> Result<Value> {
        let videos: Vec<Value> = (cursor..cursor + max_count)
            .map(|i| json!({"id": format!("dry-video-{i}"), "open_id": open_id}))
            .collect();
        Ok(json!({
            "videos": videos,
            "cursor": cursor + max_count,
            "has_more": false,
        }))
    }

    fn dry_run(&self) -> bool {
        true
    }
}

/// Live TikTok-style backend.
pub struct LivePublishBackend {
    client_key: String,
}

impl LivePublishBackend {
    /// Construct the live backend. Fails when the OAuth app credentials are
    /// missing; callers must not fall back to the stub on this path.
    pub fn new(client_key: Option<String>, client_secret: Option<String>) -> Result<Self> {
        let client_key =
            client_key.ok_or_else(|| anyhow!("live upload backend requires TIKTOK_CLIENT_KEY"))?;
        if client_secret.is_none() {
            return Err(anyhow!("live upload backend requires TIKTOK_CLIENT_SECRET"));
        }
        tracing::info!(client_key = %client_key, "UPLOAD LIVE MODE ENABLED");
        Ok(Self { client_key })
    }
}

impl PublishBackend for LivePublishBackend {
    fn init_upload(&self, access_token: &str, open_id: &str, draft: bool) -> Result<Value> {
        let body = json!({"open_id": open_id, "draft": draft, "client_key": self.client_key});
        http::post_json(INIT_UPLOAD_URL, Some(access_token), &body).context("init upload")
    }

    fn upload_video(
        &self,
        access_token: &str,
        open_id: &str,
        upload_id: &str,
        video_bytes: &[u8],
        filename: &str,
    ) -> Result<Value> {
        let query = [
            ("open_id", open_id.to_string()),
            ("upload_id", upload_id.to_string()),
            ("filename", filename.to_string()),
        ];
        http::post_bytes(UPLOAD_URL, Some(access_token), &query, "video/mp4", video_bytes)
            .context("upload video bytes")
    }

    fn check_upload_status(
        &self,
        access_token: &str,
        open_id: &str,
        upload_id: &str,
    ) -> Result<Value> {
        let query = [
            ("open_id", open_id.to_string()),
            ("upload_id", upload_id.to_string()),
        ];
        http::get_json(CHECK_URL, Some(access_token), &query).context("check upload status")
    }

    fn list_videos(
        &self,
        access_token: &str,
        open_id: &str,
        cursor: u64,
        max_count: u64,
    ) -> Result<Value> {
        let query = [
            ("open_id", open_id.to_string()),
            ("cursor", cursor.to_string()),
            ("max_count", max_count.to_string()),
        ];
        http::get_json(LIST_URL, Some(access_token), &query).context("list videos")
    }

    fn dry_run(&self) -> bool {
        false
    }
}

/// Pull the upload id out of an init response, tolerating both the flat and
/// the `data`-wrapped shapes the API returns.
pub fn extract_upload_id(response: &Value) -> Option<String> {
    response
        .get("upload_id")
        .and_then(Value::as_str)
        .or_else(|| response.pointer("/data/upload_id").and_then(Value::as_str))
        .filter(|id| !id.is_empty())
        .map(str::to_string)
}
