//! services/client/src/error.rs
//!
//! Defines the primary error type for the entire client service.

use crate::config::ConfigError;

/// The primary error type for the `client` service.
///
/// Note that operation-level failures (validation, transport, server-side
/// errors) never surface through this type: the session controller converts
/// them into events on the notification channel. This type only covers
/// faults in the process itself (startup, wiring, I/O).
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// Represents an error that occurred during configuration loading.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Represents a standard Input/Output error (e.g. reading stdin).
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
