//! services/client/src/bin/client.rs
//!
//! Headless command-line front end: wires the adapters into the session
//! controller, prints events as they arrive, and translates stdin lines
//! into commands. Any richer presentation layer plugs in the same way.

use std::sync::Arc;

use client_lib::{
    adapters::{
        credential_file::FileCredentialStore, http_backend::HttpBackendAdapter,
        rng::ThreadRngSource,
    },
    config::Config,
    error::ClientError,
    session::{
        chat::render_inline_markup, ClientCommand, SessionController, SessionEvent,
        SessionSettings,
    },
};
use studio_client_core::domain::{AspectRatio, ChatRole};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), ClientError> {
    // --- 1. Load Configuration & Set Up Logging ---
    let config = Config::from_env()?;
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(config.log_level.to_string()))
        .with(tracing_subscriber::fmt::layer())
        .init();
    info!("Configuration loaded. Backend at {}", config.backend_url);

    // --- 2. Initialize Adapters ---
    let http_client = reqwest::Client::new();
    let backend = Arc::new(HttpBackendAdapter::new(http_client, config.backend_url.clone()));
    let store = Arc::new(FileCredentialStore::new(config.credentials_path.clone()));
    let rng = Arc::new(ThreadRngSource);

    // --- 3. Build the Session Controller ---
    let (events_tx, mut events_rx) = mpsc::unbounded_channel();
    let controller = Arc::new(SessionController::new(
        backend,
        store,
        rng,
        SessionSettings::from(&config),
        events_tx,
    ));
    let _health_guard = controller.spawn_health_monitor();

    // --- 4. Print Events as They Arrive ---
    tokio::spawn(async move {
        while let Some(event) = events_rx.recv().await {
            print_event(event);
        }
    });

    // --- 5. Translate stdin Lines into Commands ---
    println!("studio client ready. Commands:");
    println!("  gen <prompt> | upscale <url> | enhance <prompt> | chat <text>");
    println!("  creds <psid> <psidts> | download <url> [url...] | health | quit");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if line == "quit" || line == "exit" {
            break;
        }
        match parse_command(line) {
            Some(command) => controller.dispatch(command).await,
            None => println!("Unrecognized command: {}", line),
        }
    }

    info!("Shutting down");
    Ok(())
}

fn parse_command(line: &str) -> Option<ClientCommand> {
    let (verb, rest) = match line.split_once(' ') {
        Some((verb, rest)) => (verb, rest.trim()),
        None => (line, ""),
    };

    match verb {
        "gen" if !rest.is_empty() => Some(ClientCommand::Generate {
            prompt: rest.to_string(),
            aspect_ratio: AspectRatio::Square,
            quantity: 4,
            style: None,
            hd_mode: false,
            reference_image: None,
        }),
        "upscale" if !rest.is_empty() => Some(ClientCommand::Upscale {
            image_url: rest.to_string(),
        }),
        "enhance" if !rest.is_empty() => Some(ClientCommand::Enhance {
            prompt: rest.to_string(),
        }),
        "chat" => Some(ClientCommand::Chat {
            text: rest.to_string(),
            image: None,
        }),
        "creds" => {
            let mut parts = rest.split_whitespace();
            let psid = parts.next().unwrap_or("").to_string();
            let psidts = parts.next().unwrap_or("").to_string();
            Some(ClientCommand::SaveCredentials { psid, psidts })
        }
        "download" if !rest.is_empty() => Some(ClientCommand::DownloadAll {
            urls: rest.split_whitespace().map(str::to_string).collect(),
        }),
        "health" => Some(ClientCommand::RefreshHealth),
        _ => None,
    }
}

fn print_event(event: SessionEvent) {
    match event {
        SessionEvent::GenerationStarted => println!("… generating"),
        SessionEvent::ProgressTick { percent, label } => {
            println!("  [{:>3}%] {}", percent, label)
        }
        SessionEvent::GenerationSucceeded { images } => {
            println!("✔ {} image(s):", images.len());
            for image in images {
                println!("    {}", image.url);
            }
        }
        SessionEvent::GenerationFailed { reason, message } => {
            println!("✘ generation failed ({:?}): {}", reason, message)
        }
        SessionEvent::UpscaleStarted { source_url } => println!("… upscaling {}", source_url),
        SessionEvent::UpscaleSucceeded { upscaled_url, .. } => {
            println!("✔ upscaled: {}", upscaled_url)
        }
        SessionEvent::UpscaleFailed { source_url, message } => {
            println!("✘ upscale of {} failed: {}", source_url, message)
        }
        SessionEvent::PromptEnhanced { enhanced_prompt } => {
            println!("✨ {}", enhanced_prompt)
        }
        SessionEvent::EnhanceFailed { message, .. } => println!("✘ enhance failed: {}", message),
        SessionEvent::ChatMessageAppended { message } => {
            if message.pending {
                println!("  assistant is typing…");
            } else {
                let who = match message.role {
                    ChatRole::User => "you",
                    ChatRole::Assistant => "assistant",
                };
                println!("  {}: {}", who, render_inline_markup(&message.text));
            }
        }
        SessionEvent::ChatPlaceholderCleared { .. } => {}
        SessionEvent::Connectivity { connected, message } => {
            let state = if connected { "connected" } else { "not connected" };
            if message.is_empty() {
                println!("status: {}", state);
            } else {
                println!("status: {} ({})", state, message);
            }
        }
        SessionEvent::CredentialsSaved => println!("✔ credentials saved"),
        SessionEvent::CredentialsRejected { message, .. } => {
            println!("✘ credentials rejected: {}", message)
        }
        SessionEvent::Notice { text } => println!("• {}", text),
    }
}
