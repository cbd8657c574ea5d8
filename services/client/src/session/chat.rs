//! services/client/src/session/chat.rs
//!
//! Sequences conversational turns: optimistic user append, a transient
//! pending placeholder while the request is in flight, and an in-band
//! error message when the turn fails. A failed turn is never an error to
//! the caller; conversational continuity is preserved.

use std::sync::{Arc, Mutex};

use regex::Regex;
use studio_client_core::domain::ChatMessage;
use studio_client_core::ports::{BackendError, CredentialStore, GenerationBackend};
use tokio::sync::mpsc::UnboundedSender;
use tracing::{info, warn};

use crate::session::protocol::SessionEvent;

pub struct ChatSession {
    backend: Arc<dyn GenerationBackend>,
    store: Arc<dyn CredentialStore>,
    events: UnboundedSender<SessionEvent>,
    history: Mutex<Vec<ChatMessage>>,
}

impl ChatSession {
    pub fn new(
        backend: Arc<dyn GenerationBackend>,
        store: Arc<dyn CredentialStore>,
        events: UnboundedSender<SessionEvent>,
    ) -> Self {
        Self {
            backend,
            store,
            events,
            history: Mutex::new(Vec::new()),
        }
    }

    fn append(&self, message: ChatMessage) {
        self.history
            .lock()
            .expect("chat history lock poisoned")
            .push(message.clone());
        let _ = self.events.send(SessionEvent::ChatMessageAppended { message });
    }

    fn remove(&self, id: uuid::Uuid) {
        self.history
            .lock()
            .expect("chat history lock poisoned")
            .retain(|m| m.id != id);
        let _ = self.events.send(SessionEvent::ChatPlaceholderCleared { id });
    }

    /// A snapshot of the ordered message history.
    pub fn history(&self) -> Vec<ChatMessage> {
        self.history
            .lock()
            .expect("chat history lock poisoned")
            .clone()
    }

    /// Sends one chat turn. A no-op when both text and image are empty.
    ///
    /// The user message is appended immediately and always survives,
    /// regardless of the network outcome; it is always visible before the
    /// placeholder and the reply.
    pub async fn send(&self, text: &str, image: Option<String>) {
        let text = text.trim();
        if text.is_empty() && image.is_none() {
            return;
        }

        self.append(ChatMessage::user(text, image.clone()));

        let placeholder = ChatMessage::pending_assistant();
        let placeholder_id = placeholder.id;
        self.append(placeholder);

        let credential = self.store.read();
        let reply = self
            .backend
            .send_chat(text, image.as_deref(), credential.as_ref())
            .await;

        self.remove(placeholder_id);

        let assistant = match reply {
            Ok(reply_text) => {
                info!("Chat turn answered ({} chars)", reply_text.len());
                ChatMessage::assistant(reply_text)
            }
            Err(BackendError::Server(message)) => {
                warn!("Chat turn failed: {}", message);
                ChatMessage::assistant(format!("⚠️ Error: {}", message))
            }
            Err(e @ BackendError::Transport { .. }) => {
                warn!("Chat turn failed: {}", e);
                ChatMessage::assistant("⚠️ Connection error")
            }
        };
        self.append(assistant);
    }
}

/// Render-time inline emphasis: `**bold**`, `*italic*`, and line breaks.
/// Stored message text stays raw; presentation layers call this when (and
/// only when) they display a message.
pub fn render_inline_markup(text: &str) -> String {
    let bold = Regex::new(r"\*\*(.+?)\*\*").unwrap();
    let italic = Regex::new(r"\*([^*\n]+)\*").unwrap();

    let rendered = bold.replace_all(text, "<strong>$1</strong>");
    let rendered = italic.replace_all(&rendered, "<em>$1</em>");
    rendered.replace('\n', "<br>")
}
