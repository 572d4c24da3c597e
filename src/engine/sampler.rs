//! Sampling loop driving the edge detector at a fixed cadence.
//!
//! Implemented as a statum two-state machine running in one tokio task:
//!
//! ```text
//! Idle ──(gamepad detected)──► Active
//!   ▲                            │
//!   └────(tick failure or ───────┘
//!         gamepad lost)
//! ```
//!
//! Idle polls for any connected gamepad on a coarse interval. Active runs
//! the detect→dispatch pipeline on a fine interval, self-rescheduling: the
//! next tick is only scheduled after the current one completes, so ticks for
//! one gamepad never overlap. There is no terminal state; the loop runs for
//! the lifetime of the hosting runtime.

use chrono::Local;
use statum::{machine, state};
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::engine::dispatch::TransitionDispatcher;
use crate::engine::edge::{EdgeDetector, Transition};
use crate::engine::error::SamplerError;
use crate::focus::FocusOracle;
use crate::gamepad::GamepadSource;
use crate::mapping::MappingTable;
use crate::sink::EventSink;

/// Sampler timing settings.
#[derive(Clone, Debug)]
pub struct SamplerSettings {
    /// Coarse gamepad-detection poll interval while idle.
    pub detect_interval_ms: u64,
    /// Fine sampling interval while a gamepad is active.
    pub tick_interval_ms: u64,
}

impl Default for SamplerSettings {
    fn default() -> Self {
        Self {
            detect_interval_ms: 500,
            tick_interval_ms: 10,
        }
    }
}

#[state]
#[derive(Debug, Clone)]
pub enum SamplerState {
    Idle,
    Active,
}

/// Sampling state machine for exactly one gamepad.
///
/// Owns the edge detector state and the dispatcher; all of it is touched
/// only from this machine's task, so no locking is needed.
#[machine]
pub struct Sampler<S: SamplerState> {
    source: Box<dyn GamepadSource>,

    focus: Box<dyn FocusOracle>,

    detector: EdgeDetector,

    dispatcher: TransitionDispatcher,

    // Hot-swapped by the mapping refresh worker; borrow() is an atomic
    // snapshot of whichever table is currently installed.
    table_rx: watch::Receiver<MappingTable>,

    // Optional tap carrying raw transitions to a binding-editor surface.
    capture_tx: Option<mpsc::Sender<Transition>>,

    settings: SamplerSettings,
}

impl<S: SamplerState> Sampler<S> {
    pub fn settings(&self) -> &SamplerSettings {
        &self.settings
    }
}

impl Sampler<Idle> {
    pub fn create(
        source: Box<dyn GamepadSource>,
        focus: Box<dyn FocusOracle>,
        dispatcher: TransitionDispatcher,
        table_rx: watch::Receiver<MappingTable>,
        capture_tx: Option<mpsc::Sender<Transition>>,
        settings: Option<SamplerSettings>,
    ) -> Self {
        let settings = settings.unwrap_or_default();
        info!("Creating sampler with settings: {:?}", settings);

        Self::new(
            source,
            focus,
            EdgeDetector::new(),
            dispatcher,
            table_rx,
            capture_tx,
            settings,
        )
    }

    /// Polls the gamepad list on the coarse interval until any slot is
    /// occupied, then transitions to Active. Query errors while idle are
    /// logged and polling continues.
    pub async fn wait_for_gamepad(mut self) -> Sampler<Active> {
        debug!(
            "Idle: polling for gamepads every {}ms",
            self.settings.detect_interval_ms
        );

        loop {
            tokio::time::sleep(tokio::time::Duration::from_millis(
                self.settings.detect_interval_ms,
            ))
            .await;

            match self.source.list_connected() {
                Ok(slots) => {
                    if slots.iter().any(Option::is_some) {
                        info!("Gamepad detected, starting active sampling");
                        // Fresh control state for the newly tracked gamepad.
                        self.detector.reset();
                        return self.transition();
                    }
                }
                Err(e) => {
                    warn!("Gamepad query failed while idle: {}", e);
                }
            }
        }
    }
}

impl Sampler<Active> {
    /// One sampling cycle: focus check, snapshot, edge detection, dispatch.
    ///
    /// Returns the number of transitions detected. Errors indicate the
    /// gamepad or its backend went away and the caller should fall back to
    /// idle polling.
    fn tick(&mut self) -> Result<usize, SamplerError> {
        let focused = self.focus.has_focus();

        let slots = self
            .source
            .list_connected()
            .map_err(|e| SamplerError::SourceError(e.to_string()))?;

        let snapshot = slots
            .into_iter()
            .flatten()
            .next()
            .ok_or_else(|| SamplerError::GamepadLost("platform gamepad list is empty".into()))?;

        let transitions = self.detector.detect(focused, &snapshot);

        if let Some(capture_tx) = &self.capture_tx {
            for transition in &transitions {
                if capture_tx.try_send(*transition).is_err() {
                    debug!("Capture channel unavailable, dropping transition");
                }
            }
        }

        if !transitions.is_empty() {
            let table = self.table_rx.borrow().clone();
            let delivered = self.dispatcher.dispatch(&table, &transitions);
            debug!(
                "Tick produced {} transitions, {} key events delivered",
                transitions.len(),
                delivered
            );
        }

        Ok(transitions.len())
    }

    /// Self-rescheduling tick loop. Each cycle sleeps only after the
    /// current tick completed, so ticks never overlap. Any tick failure
    /// logs the condition and falls back to Idle.
    pub async fn run_ticks(mut self) -> Sampler<Idle> {
        let mut cycles: u64 = 0;
        let mut transitions_total: u64 = 0;
        let mut last_stats_time = Local::now();
        let stats_interval = chrono::Duration::seconds(30);

        loop {
            match self.tick() {
                Ok(count) => {
                    transitions_total += count as u64;
                }
                Err(e) => {
                    error!("Sampling tick failed, resuming idle polling: {}", e);
                    return self.transition();
                }
            }
            cycles += 1;

            let now = Local::now();
            if now - last_stats_time > stats_interval {
                info!(
                    "Sampler stats: {} ticks, {} transitions in {}s",
                    cycles,
                    transitions_total,
                    (now - last_stats_time).num_seconds()
                );
                cycles = 0;
                transitions_total = 0;
                last_stats_time = now;
            }

            tokio::time::sleep(tokio::time::Duration::from_millis(
                self.settings.tick_interval_ms,
            ))
            .await;
        }
    }
}

/// Handle for the sampler running in a background task.
pub struct SamplerHandle {
    task_handle: JoinHandle<()>,
}

impl SamplerHandle {
    /// Wires up the pipeline and spawns the sampler loop.
    pub fn spawn(
        source: Box<dyn GamepadSource>,
        focus: Box<dyn FocusOracle>,
        sink: Box<dyn EventSink>,
        table_rx: watch::Receiver<MappingTable>,
        capture_tx: Option<mpsc::Sender<Transition>>,
        settings: Option<SamplerSettings>,
    ) -> Self {
        let dispatcher = TransitionDispatcher::new(sink);
        let sampler = Sampler::create(source, focus, dispatcher, table_rx, capture_tx, settings);

        info!("Spawning sampler task");
        let task_handle = tokio::spawn(async move {
            run_sampler_loop(sampler).await;
        });

        Self { task_handle }
    }

    pub fn abort(&self) {
        self.task_handle.abort();
    }
}

/// Alternates Idle and Active until the hosting runtime shuts down.
async fn run_sampler_loop(mut sampler: Sampler<Idle>) {
    loop {
        let active = sampler.wait_for_gamepad().await;
        sampler = active.run_ticks().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gamepad::{ButtonReading, GamepadSnapshot, SourceError};
    use crate::mapping::{KeyDescriptor, MappingEntry};
    use crate::sink::SinkError;
    use std::collections::VecDeque;
    use std::sync::{Arc, Mutex};

    /// Replays a scripted sequence of gamepad-list answers; the last frame
    /// repeats once the script runs out.
    struct ScriptedSource {
        frames: VecDeque<Result<Vec<Option<GamepadSnapshot>>, SourceError>>,
    }

    impl ScriptedSource {
        fn new(frames: Vec<Result<Vec<Option<GamepadSnapshot>>, SourceError>>) -> Self {
            Self {
                frames: frames.into(),
            }
        }
    }

    impl GamepadSource for ScriptedSource {
        fn list_connected(&mut self) -> Result<Vec<Option<GamepadSnapshot>>, SourceError> {
            if self.frames.len() > 1 {
                self.frames.pop_front().unwrap()
            } else {
                match self.frames.front().unwrap() {
                    Ok(slots) => Ok(slots.clone()),
                    Err(_) => Err(SourceError::QueryError("scripted failure".into())),
                }
            }
        }
    }

    #[derive(Clone, Default)]
    struct RecordingSink {
        emitted: Arc<Mutex<Vec<(String, bool)>>>,
    }

    impl EventSink for RecordingSink {
        fn emit(&mut self, key: &KeyDescriptor, down: bool) -> Result<(), SinkError> {
            self.emitted
                .lock()
                .unwrap()
                .push((key.display_key.clone(), down));
            Ok(())
        }
    }

    fn button_frame(pressed: bool) -> Vec<Option<GamepadSnapshot>> {
        vec![
            None,
            Some(GamepadSnapshot {
                buttons: vec![ButtonReading::Flagged {
                    pressed,
                    value: if pressed { 1.0 } else { 0.0 },
                }],
                axes: Vec::new(),
            }),
        ]
    }

    fn table_with(control: &str, display: &str) -> MappingTable {
        MappingTable {
            entries: vec![MappingEntry {
                control: control.into(),
                keys: vec![KeyDescriptor {
                    display_key: display.into(),
                    key_code: 0,
                    physical_code: String::new(),
                }],
            }],
        }
    }

    fn make_sampler(
        source: ScriptedSource,
        sink: RecordingSink,
        table: MappingTable,
        capture_tx: Option<mpsc::Sender<Transition>>,
    ) -> (Sampler<Idle>, watch::Sender<MappingTable>) {
        let (table_tx, table_rx) = watch::channel(table);
        let sampler = Sampler::create(
            Box::new(source),
            Box::new(crate::focus::AlwaysFocused),
            TransitionDispatcher::new(Box::new(sink)),
            table_rx,
            capture_tx,
            None,
        );
        (sampler, table_tx)
    }

    #[tokio::test(start_paused = true)]
    async fn idle_skips_empty_lists_until_a_gamepad_appears() {
        let source = ScriptedSource::new(vec![
            Ok(vec![]),
            Ok(vec![None, None]),
            Ok(button_frame(false)),
        ]);
        let sink = RecordingSink::default();
        let (sampler, _table_tx) = make_sampler(source, sink, MappingTable::default(), None);

        // Completes only because the third frame contains a gamepad.
        let _active = sampler.wait_for_gamepad().await;
    }

    #[tokio::test(start_paused = true)]
    async fn ticks_dispatch_mapped_transitions() {
        let source = ScriptedSource::new(vec![
            Ok(button_frame(false)),
            Ok(button_frame(true)),
            Ok(button_frame(false)),
        ]);
        let sink = RecordingSink::default();
        let emitted = sink.emitted.clone();
        let (sampler, _table_tx) = make_sampler(source, sink, table_with("0", "x"), None);

        let mut active = sampler.wait_for_gamepad().await;
        assert_eq!(active.tick().unwrap(), 1); // press
        assert_eq!(active.tick().unwrap(), 1); // release
        assert_eq!(active.tick().unwrap(), 0); // steady state

        assert_eq!(
            *emitted.lock().unwrap(),
            vec![("x".to_string(), true), ("x".to_string(), false)]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn source_failure_falls_back_to_idle() {
        let source = ScriptedSource::new(vec![
            Ok(button_frame(false)),
            Ok(button_frame(true)),
            Err(SourceError::QueryError("backend gone".into())),
        ]);
        let sink = RecordingSink::default();
        let (sampler, _table_tx) = make_sampler(source, sink, MappingTable::default(), None);

        let active = sampler.wait_for_gamepad().await;
        // Second tick hits the scripted failure and returns the Idle machine.
        let _idle: Sampler<Idle> = active.run_ticks().await;
    }

    #[tokio::test(start_paused = true)]
    async fn empty_gamepad_list_counts_as_gamepad_lost() {
        let source = ScriptedSource::new(vec![Ok(button_frame(false)), Ok(vec![None])]);
        let sink = RecordingSink::default();
        let (sampler, _table_tx) = make_sampler(source, sink, MappingTable::default(), None);

        let mut active = sampler.wait_for_gamepad().await;
        assert!(matches!(
            active.tick(),
            Err(SamplerError::GamepadLost(_))
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn hot_swapped_table_applies_to_later_ticks() {
        let source = ScriptedSource::new(vec![
            Ok(button_frame(false)),
            Ok(button_frame(true)),
            Ok(button_frame(false)),
        ]);
        let sink = RecordingSink::default();
        let emitted = sink.emitted.clone();
        let (sampler, table_tx) = make_sampler(source, sink, MappingTable::default(), None);

        let mut active = sampler.wait_for_gamepad().await;
        active.tick().unwrap(); // press: table is empty, nothing delivered

        table_tx.send(table_with("0", "y")).unwrap();
        active.tick().unwrap(); // release: new table already installed

        assert_eq!(*emitted.lock().unwrap(), vec![("y".to_string(), false)]);
    }

    #[tokio::test(start_paused = true)]
    async fn capture_tap_sees_raw_transitions_even_when_unmapped() {
        let source = ScriptedSource::new(vec![Ok(button_frame(false)), Ok(button_frame(true))]);
        let sink = RecordingSink::default();
        let (capture_tx, mut capture_rx) = mpsc::channel(16);
        let (sampler, _table_tx) =
            make_sampler(source, sink, MappingTable::default(), Some(capture_tx));

        let mut active = sampler.wait_for_gamepad().await;
        active.tick().unwrap();

        let transition = capture_rx.recv().await.unwrap();
        assert_eq!(transition.control.to_string(), "0");
        assert!(transition.down);
    }
}
