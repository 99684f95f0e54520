//! Backend collaborators and their wiring.
//!
//! Selection happens exactly once per run: dry-run forces every backend into
//! its stub, and a live toggle without the matching credential is a
//! construction error, never a silent fallback.
mod avatar;
mod http;
mod publish;
mod script;

pub use avatar::{AvatarBackend, DryAvatarBackend, LiveAvatarBackend, RenderRequest};
pub use http::get_bytes;
pub use publish::{
    extract_upload_id, DryPublishBackend, LivePublishBackend, PublishBackend,
};
pub use script::{DryScriptBackend, LiveScriptBackend, ScriptBackend, ScriptRequest};

use anyhow::{anyhow, Result};

use crate::config::RunConfig;

/// The three collaborators a pipeline run needs, selected at wiring time.
pub struct Backends {
    pub script: Box<dyn ScriptBackend>,
    pub avatar: Box<dyn AvatarBackend>,
    pub publish: Box<dyn PublishBackend>,
}

/// Build all backends for a run.
pub fn build_backends(config: &RunConfig) -> Result<Backends> {
    Ok(Backends {
        script: build_script_backend(config)?,
        avatar: build_avatar_backend(config)?,
        publish: build_publish_backend(config)?,
    })
}

/// Select the script backend: stub unless live generation is enabled.
pub fn build_script_backend(config: &RunConfig) -> Result<Box<dyn ScriptBackend>> {
    if config.dry_run || !config.openai_enabled {
        return Ok(Box::new(DryScriptBackend));
    }
    let api_key = config
        .openai_api_key
        .clone()
        .ok_or_else(|| anyhow!("OPENAI_ENABLED is set but OPENAI_API_KEY is missing"))?;
    Ok(Box::new(LiveScriptBackend::new(api_key)))
}

/// Select the avatar backend: stub unless the live toggle is set.
pub fn build_avatar_backend(config: &RunConfig) -> Result<Box<dyn AvatarBackend>> {
    if config.dry_run || !config.heygen_live {
        return Ok(Box::new(DryAvatarBackend));
    }
    let api_key = config
        .heygen_api_key
        .clone()
        .ok_or_else(|| anyhow!("HEYGEN_LIVE is set but HEYGEN_API_KEY is missing"))?;
    Ok(Box::new(LiveAvatarBackend::new(api_key)))
}

/// Select the upload backend: stub unless the live toggle is set.
pub fn build_publish_backend(config: &RunConfig) -> Result<Box<dyn PublishBackend>> {
    if config.dry_run || !config.tiktok_live {
        return Ok(Box::new(DryPublishBackend));
    }
    let backend = LivePublishBackend::new(
        config.tiktok_client_key.clone(),
        config.tiktok_client_secret.clone(),
    )?;
    Ok(Box::new(backend))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dry_run_forces_stubs_even_with_live_toggles() {
        let config = RunConfig {
            dry_run: true,
            heygen_live: true,
            tiktok_live: true,
            openai_enabled: true,
            ..RunConfig::default()
        };
        let backends = build_backends(&config).expect("build");
        assert!(backends.script.dry_run());
        assert!(backends.avatar.dry_run());
        assert!(backends.publish.dry_run());
    }

    #[test]
    fn live_toggle_without_credentials_fails_loudly() {
        let config = RunConfig {
            heygen_live: true,
            ..RunConfig::default()
        };
        assert!(build_avatar_backend(&config).is_err());

        let config = RunConfig {
            tiktok_live: true,
            ..RunConfig::default()
        };
        assert!(build_publish_backend(&config).is_err());

        let config = RunConfig {
            openai_enabled: true,
            ..RunConfig::default()
        };
        assert!(build_script_backend(&config).is_err());
    }

    #[test]
    fn live_toggle_with_credentials_builds_live_backend() {
        let config = RunConfig {
            heygen_live: true,
            heygen_api_key: Some("key".to_string()),
            ..RunConfig::default()
        };
        let backend = build_avatar_backend(&config).expect("build");
        assert!(!backend.dry_run());
    }
}
