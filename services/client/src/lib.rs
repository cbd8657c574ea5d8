//! services/client/src/lib.rs
//!
//! Library surface of the client service: configuration, the concrete
//! adapters, and the session controller that a presentation layer drives
//! with commands and observes through events.

pub mod adapters;
pub mod config;
pub mod error;
pub mod session;
