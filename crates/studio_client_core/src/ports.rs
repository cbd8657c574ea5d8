//! crates/studio_client_core/src/ports.rs
//!
//! Defines the service contracts (traits) for the client's core logic.
//! These traits form the boundary of the hexagonal architecture, allowing the
//! session controller to be independent of the concrete HTTP transport,
//! credential storage, and randomness source.

use async_trait::async_trait;

use crate::domain::{Credential, GeneratedImage, GenerationRequest, HealthReport};

//=========================================================================================
// Backend Error and Result Types
//=========================================================================================

/// An error reported by (or on the way to) the generation backend.
///
/// The two variants carry the distinction the orchestrator needs when
/// classifying failures: whether the backend answered with a structured
/// error, or the request never produced a usable structured reply at all.
#[derive(Debug, Clone, thiserror::Error)]
pub enum BackendError {
    /// The network failed or the response body was not the expected
    /// structured format (e.g. a gateway-timeout HTML page). The message
    /// names the HTTP status when one was received.
    #[error("{message}")]
    Transport {
        status: Option<u16>,
        message: String,
    },

    /// The backend answered with `success: false` and a message of its own.
    #[error("{0}")]
    Server(String),
}

/// A convenience type alias for `Result<T, BackendError>`.
pub type BackendResult<T> = Result<T, BackendError>;

/// An error from the local credential store.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Malformed credential data: {0}")]
    Malformed(String),
}

//=========================================================================================
// Service Ports (Traits)
//=========================================================================================

/// The remote image-generation backend, one method per HTTP operation.
///
/// The credential snapshot is passed explicitly where the backend needs it;
/// `None` means "send null credential fields" and lets the backend decide
/// whether that is fatal.
#[async_trait]
pub trait GenerationBackend: Send + Sync {
    /// Queries backend health and upstream-session validity.
    async fn health(&self) -> BackendResult<HealthReport>;

    /// Submits a generation request; returns images in display order.
    async fn generate(
        &self,
        request: &GenerationRequest,
        credential: Option<&Credential>,
    ) -> BackendResult<Vec<GeneratedImage>>;

    /// Upscales a single image; returns the replacement URL.
    async fn upscale(&self, image_url: &str) -> BackendResult<String>;

    /// Rewrites a prompt into a more descriptive one.
    async fn enhance(&self, prompt: &str) -> BackendResult<String>;

    /// Sends one chat turn; returns the assistant's reply text.
    async fn send_chat(
        &self,
        message: &str,
        image: Option<&str>,
        credential: Option<&Credential>,
    ) -> BackendResult<String>;

    /// Pushes a replacement credential pair to the backend.
    async fn update_credentials(&self, credential: &Credential) -> BackendResult<()>;

    /// Fetches the raw bytes of a result image (for download).
    async fn fetch_image(&self, url: &str) -> BackendResult<Vec<u8>>;
}

/// Local, synchronous persistence for the credential pair.
///
/// The settings-save path is the sole writer; everything else only reads.
/// `read` returning `None` is the valid "unset" state, never an error.
pub trait CredentialStore: Send + Sync {
    fn read(&self) -> Option<Credential>;

    /// Fully replaces the stored pair.
    fn write(&self, credential: &Credential) -> Result<(), StoreError>;
}

/// A source of uniform randomness in `[0, 1)`.
///
/// Behind a trait so progress stepping is deterministic under test.
pub trait RandomSource: Send + Sync {
    fn next_unit(&self) -> f64;
}
