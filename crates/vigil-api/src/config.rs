//! API configuration.

use std::path::PathBuf;
use std::time::Duration;

use vigil_models::DEFAULT_CONTEXT_SECS;

/// API server configuration.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Server host
    pub host: String,
    /// Server port
    pub port: u16,
    /// CORS origins
    pub cors_origins: Vec<String>,
    /// Rate limit requests per second
    pub rate_limit_rps: u32,
    /// Max request body size
    pub max_body_size: usize,
    /// Environment (development/production)
    pub environment: String,
    /// Context window applied on each side of a marker
    pub context_secs: u64,
    /// Segment extractions in flight per request
    pub max_parallel: usize,
    /// Per-invocation FFmpeg timeout
    pub ffmpeg_timeout: Duration,
    /// Source download timeout
    pub download_timeout: Duration,
    /// Hosts allowed as footage sources; empty allows any public host
    pub source_allowed_hosts: Vec<String>,
    /// Allow sources on loopback and private networks (local NVRs)
    pub allow_private_sources: bool,
    /// Parent directory for per-request scratch space
    pub work_dir: PathBuf,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
            cors_origins: vec!["*".to_string()],
            rate_limit_rps: 10,
            max_body_size: 1024 * 1024, // 1MB
            environment: "development".to_string(),
            context_secs: DEFAULT_CONTEXT_SECS,
            max_parallel: 4,
            ffmpeg_timeout: Duration::from_secs(600),
            download_timeout: Duration::from_secs(300),
            source_allowed_hosts: Vec::new(),
            allow_private_sources: false,
            work_dir: std::env::temp_dir(),
        }
    }
}

impl ApiConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();

        Self {
            host: std::env::var("API_HOST").unwrap_or(defaults.host),
            port: env_parse("API_PORT").unwrap_or(defaults.port),
            cors_origins: std::env::var("CORS_ORIGINS")
                .map(|s| split_list(&s))
                .unwrap_or(defaults.cors_origins),
            rate_limit_rps: env_parse("RATE_LIMIT_RPS").unwrap_or(defaults.rate_limit_rps),
            max_body_size: env_parse("MAX_BODY_SIZE").unwrap_or(defaults.max_body_size),
            environment: std::env::var("ENVIRONMENT").unwrap_or(defaults.environment),
            context_secs: env_parse("CLIP_CONTEXT_SECS").unwrap_or(defaults.context_secs),
            max_parallel: env_parse::<usize>("CLIP_MAX_PARALLEL")
                .map(|n| n.max(1))
                .unwrap_or(defaults.max_parallel),
            ffmpeg_timeout: env_parse("FFMPEG_TIMEOUT_SECS")
                .map(Duration::from_secs)
                .unwrap_or(defaults.ffmpeg_timeout),
            download_timeout: env_parse("DOWNLOAD_TIMEOUT_SECS")
                .map(Duration::from_secs)
                .unwrap_or(defaults.download_timeout),
            source_allowed_hosts: std::env::var("SOURCE_ALLOWED_HOSTS")
                .map(|s| split_list(&s).into_iter().map(|h| h.to_lowercase()).collect())
                .unwrap_or(defaults.source_allowed_hosts),
            allow_private_sources: std::env::var("SOURCE_ALLOW_PRIVATE")
                .map(|v| v == "true" || v == "1")
                .unwrap_or(defaults.allow_private_sources),
            work_dir: std::env::var("WORK_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.work_dir),
        }
    }

    /// Check if running in production mode.
    pub fn is_production(&self) -> bool {
        self.environment.to_lowercase() == "production"
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|s| s.trim().parse().ok())
}

fn split_list(s: &str) -> Vec<String> {
    s.split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}
