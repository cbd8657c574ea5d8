//! services/client/src/session/mod.rs
//!
//! The request orchestration and session controller: the state-machine
//! heart of the client. Commands flow in through [`SessionController`],
//! state changes flow out as [`protocol::SessionEvent`] values on an
//! unbounded channel that the presentation layer drains.

pub mod chat;
pub mod controller;
pub mod health;
pub mod orchestrator;
pub mod progress;
pub mod protocol;

pub use controller::{SessionController, SessionSettings};
pub use protocol::{ClientCommand, FailureReason, SessionEvent};
