//! Application state.

use std::sync::Arc;

use vigil_media::{ClipAssembler, FfmpegAssembler, FfmpegRunner};

use crate::config::ApiConfig;
use crate::error::{ApiError, ApiResult};
use crate::security::SourcePolicy;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: ApiConfig,
    pub http: reqwest::Client,
    pub assembler: Arc<dyn ClipAssembler>,
    pub source_policy: SourcePolicy,
}

impl AppState {
    /// Create application state backed by the `ffmpeg` binary.
    pub fn new(config: ApiConfig) -> ApiResult<Self> {
        let runner = FfmpegRunner::new().with_timeout(config.ffmpeg_timeout.as_secs());
        Self::with_assembler(config, Arc::new(FfmpegAssembler::new(runner)))
    }

    /// Create application state with a custom assembler.
    pub fn with_assembler(config: ApiConfig, assembler: Arc<dyn ClipAssembler>) -> ApiResult<Self> {
        let source_policy = SourcePolicy {
            allowed_hosts: config.source_allowed_hosts.clone(),
            allow_private: config.allow_private_sources,
        };

        let http = reqwest::Client::builder()
            .timeout(config.download_timeout)
            .redirect(source_policy.redirect_policy())
            .user_agent(concat!("vigil/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| ApiError::internal(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            config,
            http,
            assembler,
            source_policy,
        })
    }
}
