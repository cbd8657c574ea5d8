pub mod domain;
pub mod ports;

pub use domain::{
    clamp_quantity, AspectRatio, ChatMessage, ChatRole, ConnectivityState, Credential,
    GeneratedImage, GenerationRequest, HealthReport, ProgressUpdate, MIN_PROMPT_LEN,
};
pub use ports::{
    BackendError, BackendResult, CredentialStore, GenerationBackend, RandomSource, StoreError,
};
