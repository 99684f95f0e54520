//! Run configuration loaded once per invocation.
//!
//! Every step receives the config explicitly; nothing reads the environment
//! after construction. Live toggles are opt-in and fail loudly when the
//! matching credential is absent (see `adapters::build_backends`).
use std::env;

/// Environment snapshot for one pipeline run.
#[derive(Debug, Clone, Default)]
pub struct RunConfig {
    /// Force every backend into deterministic stub behavior.
    pub dry_run: bool,
    /// Use the live script backend instead of the deterministic stub.
    pub openai_enabled: bool,
    /// Use the live avatar-render backend.
    pub heygen_live: bool,
    /// Use the live upload backend.
    pub tiktok_live: bool,
    pub openai_api_key: Option<String>,
    pub heygen_api_key: Option<String>,
    pub tiktok_client_key: Option<String>,
    pub tiktok_client_secret: Option<String>,
    pub tiktok_access_token: Option<String>,
    pub tiktok_open_id: Option<String>,
}

impl RunConfig {
    /// Load the config from process environment variables.
    pub fn from_env() -> Self {
        Self {
            dry_run: parse_bool(env::var("DRY_RUN").ok().as_deref()),
            openai_enabled: parse_bool(env::var("OPENAI_ENABLED").ok().as_deref()),
            heygen_live: parse_bool(env::var("HEYGEN_LIVE").ok().as_deref()),
            tiktok_live: parse_bool(env::var("TIKTOK_LIVE").ok().as_deref()),
            openai_api_key: non_empty(env::var("OPENAI_API_KEY").ok()),
            heygen_api_key: non_empty(env::var("HEYGEN_API_KEY").ok()),
            tiktok_client_key: non_empty(env::var("TIKTOK_CLIENT_KEY").ok()),
            tiktok_client_secret: non_empty(env::var("TIKTOK_CLIENT_SECRET").ok()),
            tiktok_access_token: non_empty(env::var("TIKTOK_ACCESS_TOKEN").ok()),
            tiktok_open_id: non_empty(env::var("TIKTOK_OPEN_ID").ok()),
        }
    }

    /// Build a config with every backend stubbed, for local runs and tests.
    pub fn dry() -> Self {
        Self {
            dry_run: true,
            ..Self::default()
        }
    }
}

/// Parse an opt-in boolean the way the rest of the tooling does.
pub fn parse_bool(raw: Option<&str>) -> bool {
    let Some(raw) = raw else {
        return false;
    };
    matches!(
        raw.trim().to_lowercase().as_str(),
        "1" | "true" | "t" | "yes" | "y"
    )
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}
