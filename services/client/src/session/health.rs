//! services/client/src/session/health.rs
//!
//! Periodic backend health polling. A failed probe is never an application
//! error: it is swallowed, logged, and surfaced only as a disconnected
//! `Connectivity` event.

use std::sync::Arc;
use std::time::Duration;

use studio_client_core::ports::GenerationBackend;
use tokio::sync::mpsc::UnboundedSender;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::session::protocol::SessionEvent;

/// Polls `/api/health` on a fixed interval and on demand.
pub struct HealthMonitor {
    backend: Arc<dyn GenerationBackend>,
    events: UnboundedSender<SessionEvent>,
    poll_interval: Duration,
}

impl HealthMonitor {
    pub fn new(
        backend: Arc<dyn GenerationBackend>,
        events: UnboundedSender<SessionEvent>,
        poll_interval: Duration,
    ) -> Self {
        Self {
            backend,
            events,
            poll_interval,
        }
    }

    /// Spawns the recurring poll loop: one probe immediately, then one per
    /// interval. Returns the handle that stops the loop.
    pub fn spawn(self: &Arc<Self>) -> CancellationToken {
        let token = CancellationToken::new();
        let task_token = token.clone();
        let monitor = self.clone();

        tokio::spawn(async move {
            info!(
                "Health monitor started (poll every {:?})",
                monitor.poll_interval
            );
            let mut ticker = tokio::time::interval(monitor.poll_interval);
            loop {
                tokio::select! {
                    biased;
                    _ = task_token.cancelled() => break,
                    _ = ticker.tick() => monitor.check_now().await,
                }
            }
            info!("Health monitor stopped");
        });

        token
    }

    /// Performs a single probe and reports the result as a state update.
    pub async fn check_now(&self) {
        let state = match self.backend.health().await {
            Ok(report) => SessionEvent::Connectivity {
                connected: report.cookie_valid,
                message: report.message,
            },
            Err(e) => {
                warn!("Health check failed: {}", e);
                SessionEvent::Connectivity {
                    connected: false,
                    message: "Connection failed".to_string(),
                }
            }
        };
        let _ = self.events.send(state);
    }
}
