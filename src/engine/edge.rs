//! Per-tick edge detection over gamepad snapshots.
//!
//! Diffs the current snapshot against remembered control state and produces
//! an ordered list of press/release transitions. Buttons fire on change only;
//! axes act as a pair of virtual buttons per axis, with a deflection
//! threshold providing hysteresis against jitter around the center.

use std::collections::HashMap;

use tracing::{debug, trace};

use crate::engine::control::{LogicalControlId, Sign};
use crate::gamepad::GamepadSnapshot;

/// Fraction of full deflection at which an axis counts as a pressed button.
pub const AXIS_PRESS_THRESHOLD: f32 = 0.5;

/// Scale applied to remembered axis values. Only used for magnitude
/// comparison across ticks; externally observable semantics don't depend
/// on it.
pub const AXIS_MEMORY_SCALE: f32 = 128.0;

/// One logical press or release detected in a tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Transition {
    pub control: LogicalControlId,
    pub down: bool,
}

/// Holds the per-control down state and per-axis memory for exactly one
/// gamepad, across ticks.
#[derive(Debug, Default)]
pub struct EdgeDetector {
    controls_down: HashMap<LogicalControlId, bool>,
    axis_memory: HashMap<usize, f32>,
}

impl EdgeDetector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drops all remembered state. The next tick sees every held control as
    /// a fresh rising edge.
    pub fn reset(&mut self) {
        self.controls_down.clear();
        self.axis_memory.clear();
    }

    /// Diffs `snapshot` against the remembered state and returns the ordered
    /// transitions for this tick.
    ///
    /// Without focus no transitions are produced and all state is cleared,
    /// so nothing stale survives a focus change. Button transitions are
    /// emitted before axis transitions.
    pub fn detect(&mut self, focused: bool, snapshot: &GamepadSnapshot) -> Vec<Transition> {
        if !focused {
            if !self.controls_down.is_empty() || !self.axis_memory.is_empty() {
                debug!("Focus lost, clearing control state");
            }
            self.reset();
            return Vec::new();
        }

        let mut transitions = Vec::new();

        for (index, reading) in snapshot.buttons.iter().enumerate() {
            let control = LogicalControlId::Button(index);
            let pressed = reading.is_pressed();
            let was_down = self.controls_down.get(&control).copied().unwrap_or(false);

            if pressed != was_down {
                self.controls_down.insert(control, pressed);
                transitions.push(Transition {
                    control,
                    down: pressed,
                });
            }
        }

        for (index, &value) in snapshot.axes.iter().enumerate() {
            let direction = Sign::of(value);
            let remembered = self.axis_memory.get(&index).copied().unwrap_or(0.0);
            let previous_direction = Sign::of(remembered);
            let previous_magnitude = (remembered / AXIS_MEMORY_SCALE).abs();

            if value.abs() >= AXIS_PRESS_THRESHOLD
                && (previous_magnitude < AXIS_PRESS_THRESHOLD || previous_direction != direction)
            {
                let pressed = LogicalControlId::AxisDirection(index, direction);
                let opposite = LogicalControlId::AxisDirection(index, direction.opposite());

                transitions.push(Transition {
                    control: pressed,
                    down: true,
                });
                // A rapid sign flip can skip the release step entirely, so the
                // opposite direction is released alongside every press.
                // Idempotent when it was never down.
                transitions.push(Transition {
                    control: opposite,
                    down: false,
                });
                self.controls_down.insert(pressed, true);
                self.controls_down.insert(opposite, false);
            } else if value.abs() < AXIS_PRESS_THRESHOLD
                && previous_magnitude >= AXIS_PRESS_THRESHOLD
            {
                for sign in [Sign::Plus, Sign::Minus] {
                    let control = LogicalControlId::AxisDirection(index, sign);
                    transitions.push(Transition {
                        control,
                        down: false,
                    });
                    self.controls_down.insert(control, false);
                }
            }

            self.axis_memory.insert(index, value * AXIS_MEMORY_SCALE);
        }

        if !transitions.is_empty() {
            trace!("Detected {} transitions this tick", transitions.len());
        }
        transitions
    }
}
