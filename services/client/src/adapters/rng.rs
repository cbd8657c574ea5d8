//! services/client/src/adapters/rng.rs
//!
//! Thread-RNG implementation of the `RandomSource` port.

use rand::Rng;
use studio_client_core::ports::RandomSource;

/// Draws each roll from the thread-local generator.
pub struct ThreadRngSource;

impl RandomSource for ThreadRngSource {
    fn next_unit(&self) -> f64 {
        rand::rng().random::<f64>()
    }
}
