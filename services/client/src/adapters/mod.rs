//! services/client/src/adapters/mod.rs
//!
//! Concrete implementations of the core crate's ports.

pub mod credential_file;
pub mod http_backend;
pub mod rng;
