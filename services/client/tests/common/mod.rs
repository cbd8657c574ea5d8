//! services/client/tests/common/mod.rs
//!
//! Hand-rolled fake port implementations shared by the integration suites.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use client_lib::session::{SessionController, SessionEvent, SessionSettings};
use studio_client_core::domain::{
    Credential, GeneratedImage, GenerationRequest, HealthReport,
};
use studio_client_core::ports::{
    BackendError, BackendResult, CredentialStore, GenerationBackend, RandomSource, StoreError,
};
use tokio::sync::mpsc::{self, UnboundedReceiver};

/// A scripted backend: every operation replies with a pre-loaded result
/// and counts its calls, so tests can assert "no network call was made".
#[derive(Default)]
pub struct FakeBackend {
    pub generate_calls: AtomicUsize,
    pub chat_calls: AtomicUsize,
    pub health_calls: AtomicUsize,
    pub update_calls: AtomicUsize,
    pub enhance_calls: AtomicUsize,
    /// Simulated round-trip latency for `generate`.
    pub generate_latency: Mutex<Duration>,
    pub generate_reply: Mutex<Option<BackendResult<Vec<GeneratedImage>>>>,
    pub last_generate_request: Mutex<Option<GenerationRequest>>,
    pub last_generate_credential: Mutex<Option<Option<Credential>>>,
    pub upscale_reply: Mutex<Option<BackendResult<String>>>,
    pub enhance_reply: Mutex<Option<BackendResult<String>>>,
    pub chat_reply: Mutex<Option<BackendResult<String>>>,
    pub update_reply: Mutex<Option<BackendResult<()>>>,
    pub health_reply: Mutex<Option<BackendResult<HealthReport>>>,
    /// One reply per `fetch_image` call, consumed in order.
    pub fetch_replies: Mutex<VecDeque<BackendResult<Vec<u8>>>>,
    /// Every URL passed to `fetch_image`, in call order.
    pub fetched_urls: Mutex<Vec<String>>,
}

impl FakeBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_generate(self, reply: BackendResult<Vec<GeneratedImage>>) -> Self {
        *self.generate_reply.lock().unwrap() = Some(reply);
        self
    }

    pub fn with_generate_latency(self, latency: Duration) -> Self {
        *self.generate_latency.lock().unwrap() = latency;
        self
    }

    pub fn with_chat(self, reply: BackendResult<String>) -> Self {
        *self.chat_reply.lock().unwrap() = Some(reply);
        self
    }

    pub fn with_health(self, reply: BackendResult<HealthReport>) -> Self {
        *self.health_reply.lock().unwrap() = Some(reply);
        self
    }

    pub fn with_update(self, reply: BackendResult<()>) -> Self {
        *self.update_reply.lock().unwrap() = Some(reply);
        self
    }

    pub fn with_upscale(self, reply: BackendResult<String>) -> Self {
        *self.upscale_reply.lock().unwrap() = Some(reply);
        self
    }

    pub fn with_enhance(self, reply: BackendResult<String>) -> Self {
        *self.enhance_reply.lock().unwrap() = Some(reply);
        self
    }

    pub fn with_fetch_sequence(self, replies: Vec<BackendResult<Vec<u8>>>) -> Self {
        *self.fetch_replies.lock().unwrap() = replies.into();
        self
    }

    fn scripted<T: Clone>(slot: &Mutex<Option<BackendResult<T>>>, name: &str) -> BackendResult<T> {
        slot.lock()
            .unwrap()
            .clone()
            .unwrap_or_else(|| Err(BackendError::Server(format!("no scripted {} reply", name))))
    }
}

#[async_trait]
impl GenerationBackend for FakeBackend {
    async fn health(&self) -> BackendResult<HealthReport> {
        self.health_calls.fetch_add(1, Ordering::SeqCst);
        Self::scripted(&self.health_reply, "health")
    }

    async fn generate(
        &self,
        request: &GenerationRequest,
        credential: Option<&Credential>,
    ) -> BackendResult<Vec<GeneratedImage>> {
        self.generate_calls.fetch_add(1, Ordering::SeqCst);
        *self.last_generate_request.lock().unwrap() = Some(request.clone());
        *self.last_generate_credential.lock().unwrap() = Some(credential.cloned());
        let latency = *self.generate_latency.lock().unwrap();
        if !latency.is_zero() {
            tokio::time::sleep(latency).await;
        }
        Self::scripted(&self.generate_reply, "generate")
    }

    async fn upscale(&self, _image_url: &str) -> BackendResult<String> {
        Self::scripted(&self.upscale_reply, "upscale")
    }

    async fn enhance(&self, _prompt: &str) -> BackendResult<String> {
        self.enhance_calls.fetch_add(1, Ordering::SeqCst);
        Self::scripted(&self.enhance_reply, "enhance")
    }

    async fn send_chat(
        &self,
        _message: &str,
        _image: Option<&str>,
        _credential: Option<&Credential>,
    ) -> BackendResult<String> {
        self.chat_calls.fetch_add(1, Ordering::SeqCst);
        Self::scripted(&self.chat_reply, "chat")
    }

    async fn update_credentials(&self, _credential: &Credential) -> BackendResult<()> {
        self.update_calls.fetch_add(1, Ordering::SeqCst);
        Self::scripted(&self.update_reply, "update_credentials")
    }

    async fn fetch_image(&self, url: &str) -> BackendResult<Vec<u8>> {
        self.fetched_urls.lock().unwrap().push(url.to_string());
        self.fetch_replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(BackendError::Server("no scripted fetch reply".to_string())))
    }
}

/// In-memory credential store with a write counter.
#[derive(Default)]
pub struct MemoryCredentialStore {
    pub value: Mutex<Option<Credential>>,
    pub writes: AtomicUsize,
}

impl MemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn preset(credential: Credential) -> Self {
        let store = Self::default();
        *store.value.lock().unwrap() = Some(credential);
        store
    }
}

impl CredentialStore for MemoryCredentialStore {
    fn read(&self) -> Option<Credential> {
        self.value.lock().unwrap().clone()
    }

    fn write(&self, credential: &Credential) -> Result<(), StoreError> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        *self.value.lock().unwrap() = Some(credential.clone());
        Ok(())
    }
}

/// Replays a fixed roll sequence, then repeats the final value.
pub struct ScriptedRandom {
    rolls: Mutex<VecDeque<f64>>,
}

impl ScriptedRandom {
    pub fn new(rolls: &[f64]) -> Self {
        Self {
            rolls: Mutex::new(rolls.iter().copied().collect()),
        }
    }
}

impl RandomSource for ScriptedRandom {
    fn next_unit(&self) -> f64 {
        let mut rolls = self.rolls.lock().unwrap();
        if rolls.len() > 1 {
            rolls.pop_front().unwrap()
        } else {
            rolls.front().copied().unwrap_or(0.5)
        }
    }
}

/// Builds a controller around the given fakes with fast test timings.
pub fn controller_with(
    backend: Arc<FakeBackend>,
    store: Arc<MemoryCredentialStore>,
) -> (Arc<SessionController>, UnboundedReceiver<SessionEvent>) {
    let (events_tx, events_rx) = mpsc::unbounded_channel();
    let settings = SessionSettings {
        progress_tick: Duration::from_millis(100),
        health_poll: Duration::from_secs(30),
        download_dir: std::env::temp_dir(),
    };
    let controller = SessionController::new(
        backend,
        store,
        Arc::new(ScriptedRandom::new(&[0.6])),
        settings,
        events_tx,
    );
    (Arc::new(controller), events_rx)
}

/// Drains every event currently buffered on the channel.
pub fn drain(rx: &mut UnboundedReceiver<SessionEvent>) -> Vec<SessionEvent> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}
