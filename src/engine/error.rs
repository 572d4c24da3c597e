//! Error definitions for the sampling engine.

use thiserror::Error;

/// Errors raised during a sampling tick.
///
/// None of these are fatal: the sampler logs them and falls back to idle
/// gamepad polling.
#[derive(Debug, Error)]
pub enum SamplerError {
    #[error("Failed to query gamepad source: {0}")]
    SourceError(String),

    #[error("Gamepad no longer present: {0}")]
    GamepadLost(String),
}
