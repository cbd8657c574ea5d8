//! services/client/src/session/protocol.rs
//!
//! Defines the command/event protocol between a presentation layer and the
//! session controller. Intents flow in as `ClientCommand` values; state
//! changes flow out as `SessionEvent` values.

use serde::{Deserialize, Serialize};
use studio_client_core::domain::{AspectRatio, ChatMessage, GeneratedImage};
use uuid::Uuid;

//=========================================================================================
// Commands Sent FROM the Presentation Layer TO the Controller
//=========================================================================================

/// Represents the user intents a presentation layer can dispatch.
#[derive(Deserialize, Debug)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientCommand {
    /// Submit a generation request. Quantity is clamped to the supported
    /// range before anything else happens.
    Generate {
        prompt: String,
        aspect_ratio: AspectRatio,
        quantity: i64,
        style: Option<String>,
        hd_mode: bool,
        reference_image: Option<String>,
    },

    /// Request a single-image upscale, scoped to one gallery item.
    Upscale { image_url: String },

    /// Rewrite the current prompt into a more descriptive one.
    Enhance { prompt: String },

    /// Send one chat turn (text, attached image, or both).
    Chat {
        text: String,
        image: Option<String>,
    },

    /// Replace the credential pair, locally and on the backend.
    SaveCredentials { psid: String, psidts: String },

    /// Download every gallery image, in display order.
    DownloadAll { urls: Vec<String> },

    /// Probe backend health immediately, outside the fixed poll.
    RefreshHealth,
}

//=========================================================================================
// Events Sent FROM the Controller TO the Presentation Layer
//=========================================================================================

/// How a failed operation was classified at the orchestration boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureReason {
    /// A local precondition failed; no network call was made.
    Validation,
    /// The network failed or the response was not the structured format.
    Transport,
    /// The backend reported an expiry/initialization/cookie-shaped error.
    Auth,
    /// Any other backend-reported error.
    Generic,
}

/// Represents the state changes the controller can report.
#[derive(Serialize, Debug, Clone)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SessionEvent {
    /// A generation request was accepted and is now in flight.
    GenerationStarted,

    /// One tick of the synthetic progress signal.
    ProgressTick { percent: u8, label: String },

    /// The generation resolved with images, in display order.
    GenerationSucceeded { images: Vec<GeneratedImage> },

    /// The generation resolved with a classified failure.
    GenerationFailed {
        reason: FailureReason,
        message: String,
    },

    /// An upscale request was issued for the named gallery item.
    UpscaleStarted { source_url: String },

    /// The upscale resolved with a single replacement URL.
    UpscaleSucceeded {
        source_url: String,
        upscaled_url: String,
    },

    /// The upscale failed; scoped to the originating item.
    UpscaleFailed {
        source_url: String,
        message: String,
    },

    /// Prompt enhancement resolved with the rewritten prompt.
    PromptEnhanced { enhanced_prompt: String },

    /// Prompt enhancement failed.
    EnhanceFailed {
        reason: FailureReason,
        message: String,
    },

    /// A message (user, pending placeholder, or assistant) was appended to
    /// the chat history.
    ChatMessageAppended { message: ChatMessage },

    /// The pending placeholder with this id was removed from the history.
    ChatPlaceholderCleared { id: Uuid },

    /// The last-known reachability/auth health of the backend session.
    Connectivity { connected: bool, message: String },

    /// The credential pair was accepted by the backend and persisted.
    CredentialsSaved,

    /// The credential pair was rejected, locally or by the backend.
    CredentialsRejected {
        reason: FailureReason,
        message: String,
    },

    /// A transient, toast-equivalent notification.
    Notice { text: String },
}
