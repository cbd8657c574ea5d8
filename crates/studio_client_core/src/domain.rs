//! crates/studio_client_core/src/domain.rs
//!
//! Defines the pure, core data structures for the client.
//! These structs are independent of any transport or storage format.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Minimum trimmed prompt length accepted before any network call is made.
pub const MIN_PROMPT_LEN: usize = 3;

/// The two-part session credential the backend uses to act on the user's
/// behalf against the upstream provider. Both parts are required together
/// and are always replaced as a pair, never mutated independently.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credential {
    pub psid: String,
    pub psidts: String,
}

/// Output framing for a generation request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AspectRatio {
    Square,
    Portrait,
    Landscape,
}

/// A fully assembled generation request, ready for the backend.
///
/// The credential snapshot is deliberately NOT part of this struct; it is
/// read from the store at submission time and merged by the transport
/// adapter, so the request itself stays secret-free.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationRequest {
    pub prompt: String,
    pub aspect_ratio: AspectRatio,
    pub quantity: u8,
    pub style: Option<String>,
    pub hd_mode: bool,
    /// Optional reference image as a data URI.
    pub reference_image: Option<String>,
}

/// A single generated image. Sequence order is display and download order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratedImage {
    pub url: String,
}

/// Who authored a chat message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChatRole {
    User,
    Assistant,
}

/// One turn in the conversation history. History is append-only; a pending
/// assistant placeholder is inserted optimistically and removed when the
/// real reply (or an in-band error message) arrives.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChatMessage {
    pub id: Uuid,
    pub role: ChatRole,
    pub text: String,
    /// Optional attached image as a data URI.
    pub image: Option<String>,
    pub timestamp: DateTime<Utc>,
    pub pending: bool,
}

impl ChatMessage {
    pub fn user(text: impl Into<String>, image: Option<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            role: ChatRole::User,
            text: text.into(),
            image,
            timestamp: Utc::now(),
            pending: false,
        }
    }

    pub fn assistant(text: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            role: ChatRole::Assistant,
            text: text.into(),
            image: None,
            timestamp: Utc::now(),
            pending: false,
        }
    }

    /// The transient "typing" bubble shown while a reply is in flight.
    pub fn pending_assistant() -> Self {
        Self {
            pending: true,
            ..Self::assistant("")
        }
    }
}

/// Synthetic progress shown while a long-running request is outstanding.
/// Monotonically non-decreasing while active; forced to 100 on success.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProgressUpdate {
    pub percent: u8,
    pub label: String,
}

/// Last-known reachability and auth health of the backend session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConnectivityState {
    pub connected: bool,
    pub message: String,
}

/// The structured reply from the backend's health endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct HealthReport {
    pub cookie_valid: bool,
    #[serde(default)]
    pub message: String,
}

/// Clamps a requested image quantity to the backend's supported range.
pub fn clamp_quantity(quantity: i64) -> u8 {
    quantity.clamp(1, 4) as u8
}
