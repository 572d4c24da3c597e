//! Input-state tracking and edge-detection engine.
//!
//! Converts raw gamepad snapshots into discrete press/release transitions and
//! routes them through the mapping table to an event sink. One sampler owns
//! the whole pipeline for exactly one gamepad:
//!
//! ```text
//! GamepadSource ──► EdgeDetector ──► TransitionDispatcher ──► EventSink
//!       ▲                │                    │
//!   detect poll     ControlState        MappingTable (watch)
//! ```

pub mod control;
pub mod dispatch;
pub mod edge;
pub mod error;
pub mod sampler;

pub use control::{LogicalControlId, Sign};
pub use dispatch::TransitionDispatcher;
pub use edge::{EdgeDetector, Transition};
pub use error::SamplerError;
pub use sampler::{SamplerHandle, SamplerSettings};
