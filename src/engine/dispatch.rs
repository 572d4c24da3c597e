//! Transition-to-key-event dispatch.
//!
//! Resolves each transition against the mapping table by exact match on the
//! control's canonical text form and forwards the resulting key events to
//! the sink. Purely a read path: control state is never touched here.

use tracing::{debug, warn};

use crate::engine::edge::Transition;
use crate::mapping::MappingTable;
use crate::sink::EventSink;

pub struct TransitionDispatcher {
    sink: Box<dyn EventSink>,
}

impl TransitionDispatcher {
    pub fn new(sink: Box<dyn EventSink>) -> Self {
        Self { sink }
    }

    /// Dispatches `transitions` in order against `table`.
    ///
    /// Every entry matching a transition's canonical form fires, in table
    /// order, one key event per descriptor. Unmapped transitions are dropped
    /// silently; sink failures drop the single affected key event and the
    /// remaining events still go out. Returns the delivered event count.
    pub fn dispatch(&mut self, table: &MappingTable, transitions: &[Transition]) -> usize {
        let mut delivered = 0;

        for transition in transitions {
            let canonical = transition.control.to_string();
            let mut matched = false;

            for entry in table.matches(&canonical) {
                matched = true;
                for key in &entry.keys {
                    match self.sink.emit(key, transition.down) {
                        Ok(()) => delivered += 1,
                        Err(e) => {
                            warn!("Dropping key event for control {}: {}", canonical, e);
                        }
                    }
                }
            }

            if !matched {
                debug!("No mapping for control {}, ignoring", canonical);
            }
        }

        delivered
    }
}
