//! services/client/src/session/orchestrator.rs
//!
//! The central request state machine. It accepts generation-side intents,
//! assembles payloads with the current credential snapshot, drives the
//! progress simulator while a request is in flight, classifies failures,
//! and emits terminal events. Every failure is converted to an event here;
//! nothing propagates past this boundary.

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use studio_client_core::domain::{Credential, GenerationRequest, MIN_PROMPT_LEN};
use studio_client_core::ports::{BackendError, CredentialStore, GenerationBackend};
use tokio::sync::mpsc::UnboundedSender;
use tracing::{debug, error, info, warn};

use crate::session::progress::ProgressSimulator;
use crate::session::protocol::{FailureReason, SessionEvent};

/// How long the forced 100% frame is held before the terminal event, so the
/// bar visibly completes.
const COMPLETION_HOLD: Duration = Duration::from_millis(500);

/// Pause between items of a bulk download.
const DOWNLOAD_SPACING: Duration = Duration::from_millis(300);

/// Substrings (lowercased) that mark a server-reported message as an
/// expired/invalid upstream-session failure.
const AUTH_PATTERNS: [&str; 3] = ["expired", "cookie", "initialize"];

pub struct RequestOrchestrator {
    backend: Arc<dyn GenerationBackend>,
    store: Arc<dyn CredentialStore>,
    events: UnboundedSender<SessionEvent>,
    progress: ProgressSimulator,
    /// Serializes generation: at most one outstanding request.
    generation_pending: AtomicBool,
    download_dir: PathBuf,
}

impl RequestOrchestrator {
    pub fn new(
        backend: Arc<dyn GenerationBackend>,
        store: Arc<dyn CredentialStore>,
        events: UnboundedSender<SessionEvent>,
        progress: ProgressSimulator,
        download_dir: PathBuf,
    ) -> Self {
        Self {
            backend,
            store,
            events,
            progress,
            generation_pending: AtomicBool::new(false),
            download_dir,
        }
    }

    fn emit(&self, event: SessionEvent) {
        if self.events.send(event).is_err() {
            warn!("Session event channel closed; dropping event");
        }
    }

    /// Point-in-time credential snapshot, read once per outbound request.
    fn credential_snapshot(&self) -> Option<Credential> {
        self.store.read()
    }

    //=====================================================================================
    // Generation
    //=====================================================================================

    /// Submits a generation request.
    ///
    /// Precondition failures are reported as `Validation` events without a
    /// network call. A second call while one generation is pending is a
    /// silent no-op: not queued, not an error.
    pub async fn submit_generation(&self, request: GenerationRequest) {
        let trimmed = request.prompt.trim();
        if trimmed.len() < MIN_PROMPT_LEN {
            self.emit(SessionEvent::GenerationFailed {
                reason: FailureReason::Validation,
                message: "Prompt is too short. Please be more descriptive.".to_string(),
            });
            return;
        }

        if self
            .generation_pending
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            debug!("Generation already pending; ignoring submit");
            return;
        }

        let request = GenerationRequest {
            prompt: trimmed.to_string(),
            ..request
        };

        info!(
            "Generating {} image(s), aspect ratio {:?}",
            request.quantity, request.aspect_ratio
        );
        self.emit(SessionEvent::GenerationStarted);
        let progress_handle = self.progress.start();

        let credential = self.credential_snapshot();
        let outcome = self.backend.generate(&request, credential.as_ref()).await;

        // Stop the simulator and wait for its task to exit before the
        // terminal frames, so no stale tick can land after the forced 100%.
        progress_handle.stop().await;

        match outcome {
            Ok(images) => {
                self.emit(SessionEvent::ProgressTick {
                    percent: 100,
                    label: "Finalizing...".to_string(),
                });
                tokio::time::sleep(COMPLETION_HOLD).await;
                info!("Generation succeeded with {} image(s)", images.len());
                self.emit(SessionEvent::GenerationSucceeded { images });
            }
            Err(e) => {
                let (reason, message) = classify(e);
                error!("Generation failed ({:?}): {}", reason, message);
                self.emit(SessionEvent::GenerationFailed {
                    reason,
                    message: message.clone(),
                });
                if reason == FailureReason::Auth {
                    self.refresh_connectivity().await;
                }
            }
        }

        self.generation_pending.store(false, Ordering::SeqCst);
    }

    /// On-demand connectivity probe, used after auth-shaped failures so the
    /// presentation layer can prompt for new credentials.
    async fn refresh_connectivity(&self) {
        let state = match self.backend.health().await {
            Ok(report) => SessionEvent::Connectivity {
                connected: report.cookie_valid,
                message: report.message,
            },
            Err(e) => SessionEvent::Connectivity {
                connected: false,
                message: e.to_string(),
            },
        };
        self.emit(state);
    }

    //=====================================================================================
    // Upscale
    //=====================================================================================

    /// Upscales a single gallery item. Deliberately not serialized: each
    /// call is scoped to its own item and several may run concurrently.
    pub async fn upscale(&self, image_url: String) {
        self.emit(SessionEvent::UpscaleStarted {
            source_url: image_url.clone(),
        });
        match self.backend.upscale(&image_url).await {
            Ok(upscaled_url) => {
                info!("Upscaled {} -> {}", image_url, upscaled_url);
                self.emit(SessionEvent::UpscaleSucceeded {
                    source_url: image_url,
                    upscaled_url,
                });
            }
            Err(e) => {
                let (_, message) = classify(e);
                warn!("Upscale of {} failed: {}", image_url, message);
                self.emit(SessionEvent::UpscaleFailed {
                    source_url: image_url,
                    message,
                });
            }
        }
    }

    //=====================================================================================
    // Prompt Enhancement
    //=====================================================================================

    pub async fn enhance_prompt(&self, prompt: String) {
        let trimmed = prompt.trim();
        if trimmed.is_empty() {
            self.emit(SessionEvent::EnhanceFailed {
                reason: FailureReason::Validation,
                message: "Please enter a prompt first".to_string(),
            });
            return;
        }
        match self.backend.enhance(trimmed).await {
            Ok(enhanced_prompt) => self.emit(SessionEvent::PromptEnhanced { enhanced_prompt }),
            Err(e) => {
                let (reason, message) = classify(e);
                self.emit(SessionEvent::EnhanceFailed { reason, message });
            }
        }
    }

    //=====================================================================================
    // Credentials
    //=====================================================================================

    /// Replaces the credential pair: backend first, then the local store.
    /// Both fields are required together; a half-filled pair is rejected
    /// locally and the store is left untouched.
    pub async fn save_credentials(&self, psid: String, psidts: String) {
        let psid = psid.trim().to_string();
        let psidts = psidts.trim().to_string();
        if psid.is_empty() || psidts.is_empty() {
            self.emit(SessionEvent::CredentialsRejected {
                reason: FailureReason::Validation,
                message: "Please enter both cookies!".to_string(),
            });
            return;
        }

        let credential = Credential { psid, psidts };
        if let Err(e) = self.backend.update_credentials(&credential).await {
            let (reason, message) = classify(e);
            self.emit(SessionEvent::CredentialsRejected { reason, message });
            return;
        }

        if let Err(e) = self.store.write(&credential) {
            // The backend accepted the pair; a local persistence failure
            // only means it will not survive a restart.
            error!("Failed to persist credentials: {}", e);
            self.emit(SessionEvent::Notice {
                text: format!("Credentials accepted but not persisted: {}", e),
            });
        }
        info!("Credential pair replaced");
        self.emit(SessionEvent::CredentialsSaved);
    }

    //=====================================================================================
    // Bulk Download
    //=====================================================================================

    /// Downloads every image in display order, spacing requests slightly.
    /// A per-item failure is reported and does not abort the remainder.
    pub async fn download_all(&self, urls: Vec<String>) {
        if urls.is_empty() {
            return;
        }
        let total = urls.len();
        let batch = Utc::now().timestamp_millis();
        let mut saved = 0usize;

        for (index, url) in urls.iter().enumerate() {
            match self.backend.fetch_image(url).await {
                Ok(bytes) => {
                    let filename = format!("studio-image-{}-{}.png", batch, index + 1);
                    let path = self.download_dir.join(&filename);
                    match tokio::fs::write(&path, bytes).await {
                        Ok(()) => {
                            debug!("Saved {}", path.display());
                            saved += 1;
                        }
                        Err(e) => {
                            warn!("Failed to write {}: {}", path.display(), e);
                            self.emit(SessionEvent::Notice {
                                text: format!("Failed to save image {}", index + 1),
                            });
                        }
                    }
                }
                Err(e) => {
                    warn!("Failed to fetch {}: {}", url, e);
                    self.emit(SessionEvent::Notice {
                        text: format!("Failed to download image {}", index + 1),
                    });
                }
            }
            if index + 1 < total {
                tokio::time::sleep(DOWNLOAD_SPACING).await;
            }
        }

        self.emit(SessionEvent::Notice {
            text: format!("Downloaded {} of {} images", saved, total),
        });
    }
}

/// Classifies a backend error for the presentation layer.
///
/// Server-reported messages matching the documented auth patterns become
/// `Auth`; anything else the server reports is `Generic`; everything that
/// never produced a structured reply is `Transport`.
pub fn classify(error: BackendError) -> (FailureReason, String) {
    match error {
        BackendError::Transport { message, .. } => (FailureReason::Transport, message),
        BackendError::Server(message) => {
            if is_auth_shaped(&message) {
                (FailureReason::Auth, message)
            } else {
                (FailureReason::Generic, message)
            }
        }
    }
}

fn is_auth_shaped(message: &str) -> bool {
    let lowered = message.to_lowercase();
    AUTH_PATTERNS.iter().any(|p| lowered.contains(p))
}
