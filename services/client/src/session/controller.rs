//! services/client/src/session/controller.rs
//!
//! Glues the orchestrator, chat session, and health monitor behind one
//! UI-agnostic dispatch surface. A presentation layer owns the event
//! receiver and calls `dispatch` with commands; everything else is wiring.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use studio_client_core::domain::{clamp_quantity, GenerationRequest};
use studio_client_core::ports::{CredentialStore, GenerationBackend, RandomSource};
use tokio::sync::mpsc::UnboundedSender;
use tokio_util::sync::CancellationToken;

use crate::config::Config;
use crate::session::chat::ChatSession;
use crate::session::health::HealthMonitor;
use crate::session::orchestrator::RequestOrchestrator;
use crate::session::progress::ProgressSimulator;
use crate::session::protocol::{ClientCommand, SessionEvent};

/// Tunables the controller needs from configuration.
#[derive(Clone, Debug)]
pub struct SessionSettings {
    pub progress_tick: Duration,
    pub health_poll: Duration,
    pub download_dir: PathBuf,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            progress_tick: Duration::from_millis(500),
            health_poll: Duration::from_secs(30),
            download_dir: PathBuf::from("."),
        }
    }
}

impl From<&Config> for SessionSettings {
    fn from(config: &Config) -> Self {
        Self {
            progress_tick: config.progress_tick,
            health_poll: config.health_poll,
            download_dir: config.download_dir.clone(),
        }
    }
}

pub struct SessionController {
    orchestrator: RequestOrchestrator,
    chat: ChatSession,
    health: Arc<HealthMonitor>,
}

impl SessionController {
    pub fn new(
        backend: Arc<dyn GenerationBackend>,
        store: Arc<dyn CredentialStore>,
        rng: Arc<dyn RandomSource>,
        settings: SessionSettings,
        events: UnboundedSender<SessionEvent>,
    ) -> Self {
        let progress = ProgressSimulator::new(rng, settings.progress_tick, events.clone());
        let orchestrator = RequestOrchestrator::new(
            backend.clone(),
            store.clone(),
            events.clone(),
            progress,
            settings.download_dir,
        );
        let chat = ChatSession::new(backend.clone(), store, events.clone());
        let health = Arc::new(HealthMonitor::new(backend, events, settings.health_poll));
        Self {
            orchestrator,
            chat,
            health,
        }
    }

    /// Starts the recurring health poll; returns the handle that stops it.
    pub fn spawn_health_monitor(&self) -> CancellationToken {
        self.health.spawn()
    }

    /// The ordered chat history (for presentation layers that re-render).
    pub fn chat_history(&self) -> Vec<studio_client_core::domain::ChatMessage> {
        self.chat.history()
    }

    /// Routes one user intent to the owning component. Resolves when the
    /// operation reaches a terminal state; all outcomes are reported as
    /// events, never as return values.
    pub async fn dispatch(&self, command: ClientCommand) {
        match command {
            ClientCommand::Generate {
                prompt,
                aspect_ratio,
                quantity,
                style,
                hd_mode,
                reference_image,
            } => {
                let request = GenerationRequest {
                    prompt,
                    aspect_ratio,
                    quantity: clamp_quantity(quantity),
                    style,
                    hd_mode,
                    reference_image,
                };
                self.orchestrator.submit_generation(request).await;
            }
            ClientCommand::Upscale { image_url } => {
                self.orchestrator.upscale(image_url).await;
            }
            ClientCommand::Enhance { prompt } => {
                self.orchestrator.enhance_prompt(prompt).await;
            }
            ClientCommand::Chat { text, image } => {
                self.chat.send(&text, image).await;
            }
            ClientCommand::SaveCredentials { psid, psidts } => {
                self.orchestrator.save_credentials(psid, psidts).await;
            }
            ClientCommand::DownloadAll { urls } => {
                self.orchestrator.download_all(urls).await;
            }
            ClientCommand::RefreshHealth => {
                self.health.check_now().await;
            }
        }
    }
}
