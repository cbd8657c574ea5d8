//! services/client/src/config.rs
//!
//! Defines the application's configuration structure and loading logic.
//!
//! All configuration is loaded from environment variables at startup. The `.env`
//! file is used for local development.

use std::path::PathBuf;
use std::time::Duration;
use tracing::Level;

/// A custom error type for configuration loading failures.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing the environment variable {0}")]
    MissingVar(String),
    #[error("Invalid value for the environment variable {0}: {1}")]
    InvalidValue(String, String),
}

/// Holds all configuration loaded from the environment at startup.
#[derive(Clone, Debug)]
pub struct Config {
    /// Base URL of the generation backend, e.g. `http://127.0.0.1:5000`.
    pub backend_url: String,
    pub log_level: Level,
    /// How often the health monitor polls the backend.
    pub health_poll: Duration,
    /// Tick interval of the synthetic progress signal.
    pub progress_tick: Duration,
    /// Where the credential pair is persisted.
    pub credentials_path: PathBuf,
    /// Where bulk downloads are written.
    pub download_dir: PathBuf,
}

impl Config {
    /// Loads configuration from environment variables.
    ///
    /// It will look for a `.env` file in the current directory for development,
    /// but this is skipped in test environments to ensure tests are hermetic.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Only load from .env in non-test mode to avoid contamination.
        if !cfg!(test) {
            dotenvy::dotenv().ok();
        }

        let backend_url = std::env::var("STUDIO_BACKEND_URL")
            .unwrap_or_else(|_| "http://127.0.0.1:5000".to_string());

        let log_level_str = std::env::var("RUST_LOG").unwrap_or_else(|_| "INFO".to_string());
        let log_level = log_level_str.parse::<Level>().map_err(|_| {
            ConfigError::InvalidValue(
                "RUST_LOG".to_string(),
                format!("'{}' is not a valid log level", log_level_str),
            )
        })?;

        let health_poll = parse_duration_var("HEALTH_POLL_SECS", 30, Duration::from_secs)?;
        let progress_tick = parse_duration_var("PROGRESS_TICK_MS", 500, Duration::from_millis)?;

        let credentials_path = match std::env::var("CREDENTIALS_PATH") {
            Ok(path) => PathBuf::from(path),
            Err(_) => default_data_dir()?.join("credentials.json"),
        };

        let download_dir = match std::env::var("DOWNLOAD_DIR") {
            Ok(path) => PathBuf::from(path),
            Err(_) => dirs::download_dir().unwrap_or_else(|| PathBuf::from(".")),
        };

        Ok(Self {
            backend_url,
            log_level,
            health_poll,
            progress_tick,
            credentials_path,
            download_dir,
        })
    }
}

fn default_data_dir() -> Result<PathBuf, ConfigError> {
    dirs::data_dir()
        .map(|p| p.join("studio-client"))
        .ok_or_else(|| {
            ConfigError::MissingVar(
                "CREDENTIALS_PATH (no platform data directory available)".to_string(),
            )
        })
}

fn parse_duration_var(
    name: &str,
    default: u64,
    to_duration: fn(u64) -> Duration,
) -> Result<Duration, ConfigError> {
    match std::env::var(name) {
        Err(_) => Ok(to_duration(default)),
        Ok(raw) => raw
            .parse::<u64>()
            .map(to_duration)
            .map_err(|e| ConfigError::InvalidValue(name.to_string(), e.to_string())),
    }
}
