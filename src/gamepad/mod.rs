//! Gamepad source boundary.
//!
//! Everything platform-shaped is normalized here into [`GamepadSnapshot`]
//! before it reaches the edge detector. Platforms report buttons either as a
//! `{pressed, value}` pair or as a bare scalar; both shapes are kept in
//! [`ButtonReading`] so the pressed test stays in one place.

pub mod gilrs_source;

pub use gilrs_source::GilrsSource;

use thiserror::Error;

/// Errors from querying the platform gamepad list.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("Failed to initialize gamepad backend: {0}")]
    InitializationError(String),

    #[error("Failed to query gamepads: {0}")]
    QueryError(String),
}

/// One button as read from the platform.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ButtonReading {
    /// Object form: explicit pressed flag plus analog value.
    Flagged { pressed: bool, value: f32 },
    /// Scalar form: analog value only, pressed iff exactly 1.0.
    Scalar(f32),
}

impl ButtonReading {
    pub fn is_pressed(&self) -> bool {
        match *self {
            ButtonReading::Flagged { pressed, .. } => pressed,
            ButtonReading::Scalar(value) => value == 1.0,
        }
    }
}

/// Immutable per-tick read of one gamepad.
///
/// Button and axis order is the platform's slot order and stays stable across
/// ticks for the same device. Produced fresh each tick, never mutated.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GamepadSnapshot {
    pub buttons: Vec<ButtonReading>,
    /// Axis values in −1.0..=1.0.
    pub axes: Vec<f32>,
}

/// Live view of the platform's gamepad slots.
///
/// `list_connected` returns one entry per platform slot; empty slots are
/// `None` and must be skipped without error.
pub trait GamepadSource: Send {
    fn list_connected(&mut self) -> Result<Vec<Option<GamepadSnapshot>>, SourceError>;
}
