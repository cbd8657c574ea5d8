//! services/client/tests/chat_and_credentials.rs
//!
//! Drives the chat session, credential lifecycle, and health monitoring
//! through the controller against scripted fakes.

mod common;

use std::sync::atomic::Ordering;
use std::sync::Arc;

use client_lib::session::{ClientCommand, FailureReason, SessionEvent};
use common::{controller_with, drain, FakeBackend, MemoryCredentialStore};
use studio_client_core::domain::{ChatRole, Credential, HealthReport};
use studio_client_core::ports::{BackendError, CredentialStore};

fn chat(text: &str) -> ClientCommand {
    ClientCommand::Chat {
        text: text.to_string(),
        image: None,
    }
}

#[tokio::test(start_paused = true)]
async fn empty_chat_send_is_a_no_op() {
    let backend = Arc::new(FakeBackend::new());
    let store = Arc::new(MemoryCredentialStore::new());
    let (controller, mut events) = controller_with(backend.clone(), store);

    controller.dispatch(chat("   ")).await;

    assert!(drain(&mut events).is_empty());
    assert_eq!(backend.chat_calls.load(Ordering::SeqCst), 0);
    assert!(controller.chat_history().is_empty());
}

#[tokio::test(start_paused = true)]
async fn user_message_precedes_placeholder_and_reply() {
    let backend = Arc::new(FakeBackend::new().with_chat(Ok("Hello **there**".to_string())));
    let store = Arc::new(MemoryCredentialStore::new());
    let (controller, mut events) = controller_with(backend, store);

    controller.dispatch(chat("hi")).await;

    let events = drain(&mut events);
    assert_eq!(events.len(), 4);

    let placeholder_id = match (&events[0], &events[1]) {
        (
            SessionEvent::ChatMessageAppended { message: user },
            SessionEvent::ChatMessageAppended { message: placeholder },
        ) => {
            assert_eq!(user.role, ChatRole::User);
            assert_eq!(user.text, "hi");
            assert!(!user.pending);
            assert_eq!(placeholder.role, ChatRole::Assistant);
            assert!(placeholder.pending);
            placeholder.id
        }
        other => panic!("unexpected event prefix: {:?}", other),
    };

    match &events[2] {
        SessionEvent::ChatPlaceholderCleared { id } => assert_eq!(*id, placeholder_id),
        other => panic!("expected ChatPlaceholderCleared, got {:?}", other),
    }
    match &events[3] {
        SessionEvent::ChatMessageAppended { message } => {
            assert_eq!(message.role, ChatRole::Assistant);
            assert!(!message.pending);
            // Stored text stays raw; emphasis is substituted at render time.
            assert_eq!(message.text, "Hello **there**");
        }
        other => panic!("expected the assistant reply, got {:?}", other),
    }

    // History holds exactly the user turn and the final reply, in order.
    let history = controller.chat_history();
    assert_eq!(history.len(), 2);
    assert_eq!(history[0].role, ChatRole::User);
    assert_eq!(history[1].role, ChatRole::Assistant);
}

#[tokio::test(start_paused = true)]
async fn failed_chat_turn_is_rendered_in_band() {
    let backend =
        Arc::new(FakeBackend::new().with_chat(Err(BackendError::Server("boom".to_string()))));
    let store = Arc::new(MemoryCredentialStore::new());
    let (controller, _events) = controller_with(backend, store);

    controller.dispatch(chat("hi")).await;

    let history = controller.chat_history();
    assert_eq!(history.len(), 2);
    assert_eq!(history[0].role, ChatRole::User);
    assert_eq!(history[1].role, ChatRole::Assistant);
    assert!(history[1].text.contains("Error: boom"));
}

#[tokio::test(start_paused = true)]
async fn chat_transport_failure_becomes_a_connection_error_message() {
    let backend = Arc::new(FakeBackend::new().with_chat(Err(BackendError::Transport {
        status: None,
        message: "Network error: connection refused".to_string(),
    })));
    let store = Arc::new(MemoryCredentialStore::new());
    let (controller, _events) = controller_with(backend, store);

    controller.dispatch(chat("hi")).await;

    let history = controller.chat_history();
    assert!(history[1].text.contains("Connection error"));
}

#[tokio::test(start_paused = true)]
async fn image_only_chat_turn_is_sent() {
    let backend = Arc::new(FakeBackend::new().with_chat(Ok("nice picture".to_string())));
    let store = Arc::new(MemoryCredentialStore::new());
    let (controller, _events) = controller_with(backend.clone(), store);

    controller
        .dispatch(ClientCommand::Chat {
            text: String::new(),
            image: Some("data:image/png;base64,AAAA".to_string()),
        })
        .await;

    assert_eq!(backend.chat_calls.load(Ordering::SeqCst), 1);
    let history = controller.chat_history();
    assert_eq!(history[0].image.as_deref(), Some("data:image/png;base64,AAAA"));
}

#[tokio::test(start_paused = true)]
async fn half_filled_credential_pair_is_rejected_locally() {
    let backend = Arc::new(FakeBackend::new());
    let store = Arc::new(MemoryCredentialStore::new());
    let (controller, mut events) = controller_with(backend.clone(), store.clone());

    controller
        .dispatch(ClientCommand::SaveCredentials {
            psid: "only-one".to_string(),
            psidts: "   ".to_string(),
        })
        .await;

    let events = drain(&mut events);
    assert!(matches!(
        &events[0],
        SessionEvent::CredentialsRejected { reason: FailureReason::Validation, .. }
    ));
    assert_eq!(backend.update_calls.load(Ordering::SeqCst), 0);
    assert_eq!(store.writes.load(Ordering::SeqCst), 0);
    assert_eq!(store.read(), None);
}

#[tokio::test(start_paused = true)]
async fn credentials_are_persisted_only_after_the_backend_accepts_them() {
    let backend = Arc::new(FakeBackend::new().with_update(Ok(())));
    let store = Arc::new(MemoryCredentialStore::new());
    let (controller, mut events) = controller_with(backend.clone(), store.clone());

    controller
        .dispatch(ClientCommand::SaveCredentials {
            psid: " psid-value ".to_string(),
            psidts: "psidts-value".to_string(),
        })
        .await;

    let events = drain(&mut events);
    assert!(events
        .iter()
        .any(|e| matches!(e, SessionEvent::CredentialsSaved)));
    assert_eq!(backend.update_calls.load(Ordering::SeqCst), 1);
    assert_eq!(
        store.read(),
        Some(Credential {
            psid: "psid-value".to_string(),
            psidts: "psidts-value".to_string(),
        })
    );
}

#[tokio::test(start_paused = true)]
async fn backend_rejection_leaves_the_store_unchanged() {
    let backend = Arc::new(
        FakeBackend::new().with_update(Err(BackendError::Server("bad pair".to_string()))),
    );
    let existing = Credential {
        psid: "old".to_string(),
        psidts: "old-ts".to_string(),
    };
    let store = Arc::new(MemoryCredentialStore::preset(existing.clone()));
    let (controller, mut events) = controller_with(backend, store.clone());

    controller
        .dispatch(ClientCommand::SaveCredentials {
            psid: "new".to_string(),
            psidts: "new-ts".to_string(),
        })
        .await;

    let events = drain(&mut events);
    assert!(matches!(
        &events[0],
        SessionEvent::CredentialsRejected { .. }
    ));
    assert_eq!(store.writes.load(Ordering::SeqCst), 0);
    assert_eq!(store.read(), Some(existing));
}

#[tokio::test(start_paused = true)]
async fn health_probe_failure_is_swallowed_and_reported_as_disconnected() {
    let backend = Arc::new(FakeBackend::new().with_health(Err(BackendError::Transport {
        status: None,
        message: "Network error: connection refused".to_string(),
    })));
    let store = Arc::new(MemoryCredentialStore::new());
    let (controller, mut events) = controller_with(backend, store);

    controller.dispatch(ClientCommand::RefreshHealth).await;

    let events = drain(&mut events);
    assert_eq!(events.len(), 1);
    match &events[0] {
        SessionEvent::Connectivity { connected, message } => {
            assert!(!connected);
            assert_eq!(message, "Connection failed");
        }
        other => panic!("expected Connectivity, got {:?}", other),
    }
}

#[tokio::test(start_paused = true)]
async fn healthy_probe_reports_the_backend_message() {
    let backend = Arc::new(FakeBackend::new().with_health(Ok(HealthReport {
        cookie_valid: true,
        message: "All systems operational".to_string(),
    })));
    let store = Arc::new(MemoryCredentialStore::new());
    let (controller, mut events) = controller_with(backend, store);

    controller.dispatch(ClientCommand::RefreshHealth).await;

    let events = drain(&mut events);
    assert!(matches!(
        &events[0],
        SessionEvent::Connectivity { connected: true, .. }
    ));
}
