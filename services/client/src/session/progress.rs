//! services/client/src/session/progress.rs
//!
//! The synthetic progress signal shown while a generation request is in
//! flight. The backend reports no real progress, so this produces a
//! monotonically increasing percentage that slows down as it nears a soft
//! ceiling and never self-reports completion before the real response.

use std::sync::Arc;
use std::time::Duration;

use studio_client_core::ports::RandomSource;
use tokio::sync::mpsc::UnboundedSender;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::session::protocol::SessionEvent;

/// The simulated value never passes this before the real response arrives.
pub const SOFT_CEILING: u8 = 95;

/// Ordered status phrases; the phrase advances roughly every 15 points.
pub const STATUS_PHRASES: [&str; 7] = [
    "Connecting to the studio...",
    "Analyzing prompt...",
    "Dreaming up concepts...",
    "Rendering pixels...",
    "Polishing details...",
    "Adding magic...",
    "Nearly there...",
];

/// Advances the simulated percentage by a randomized step.
///
/// The step shrinks as the value approaches the soft ceiling: fast at the
/// start, slow at the end, always at least one point, never past the
/// ceiling. Pure so tests can drive it with a scripted roll sequence.
pub fn next_percent(current: u8, roll: f64) -> u8 {
    if current >= SOFT_CEILING {
        return current;
    }
    let remaining = (SOFT_CEILING - current) as f64;
    let step = ((roll * remaining * 0.1).floor() as u8).max(1);
    (current + step).min(SOFT_CEILING)
}

/// Picks the status phrase for a given percentage.
pub fn phrase_for(percent: u8) -> &'static str {
    let index = (percent as usize / 15).min(STATUS_PHRASES.len() - 1);
    STATUS_PHRASES[index]
}

/// Produces `ProgressTick` events on a fixed interval until cancelled.
pub struct ProgressSimulator {
    rng: Arc<dyn RandomSource>,
    tick: Duration,
    events: UnboundedSender<SessionEvent>,
}

impl ProgressSimulator {
    pub fn new(
        rng: Arc<dyn RandomSource>,
        tick: Duration,
        events: UnboundedSender<SessionEvent>,
    ) -> Self {
        Self { rng, tick, events }
    }

    /// Starts a tick loop at zero and returns its handle.
    ///
    /// The handle's cancellation is idempotent. The orchestrator always
    /// stops the loop on request resolution so no orphaned loop keeps
    /// ticking.
    pub fn start(&self) -> ProgressHandle {
        let token = CancellationToken::new();
        let task_token = token.clone();
        let rng = self.rng.clone();
        let tick = self.tick;
        let events = self.events.clone();

        let task = tokio::spawn(async move {
            let mut percent: u8 = 0;
            let _ = events.send(SessionEvent::ProgressTick {
                percent,
                label: phrase_for(percent).to_string(),
            });

            let mut ticker = tokio::time::interval(tick);
            // The first interval tick completes immediately; skip it so the
            // initial 0% frame stays on screen for a full tick.
            ticker.tick().await;

            loop {
                tokio::select! {
                    biased;
                    _ = task_token.cancelled() => break,
                    _ = ticker.tick() => {
                        if percent >= SOFT_CEILING {
                            continue;
                        }
                        percent = next_percent(percent, rng.next_unit());
                        let send = events.send(SessionEvent::ProgressTick {
                            percent,
                            label: phrase_for(percent).to_string(),
                        });
                        if send.is_err() {
                            break;
                        }
                    }
                }
            }
            debug!("Progress simulator stopped at {}%", percent);
        });

        ProgressHandle { token, task }
    }
}

/// Handle to a running tick loop.
pub struct ProgressHandle {
    token: CancellationToken,
    task: tokio::task::JoinHandle<()>,
}

impl ProgressHandle {
    /// Stops the loop and waits for it to exit, so no stale tick can be
    /// sent after this returns. Cancellation itself is idempotent; a loop
    /// that already exited (closed channel) joins immediately.
    pub async fn stop(self) {
        self.token.cancel();
        let _ = self.task.await;
    }
}
