//! gilrs-backed gamepad source.
//!
//! Pumps the gilrs event queue so cached gamepad state stays current, then
//! snapshots that state per connected pad. Button and axis codes are sorted
//! so indices stay stable across ticks for the same device.

use gilrs::{Event, EventType, Gamepad, Gilrs};
use tracing::{debug, info, warn};

use super::{ButtonReading, GamepadSnapshot, GamepadSource, SourceError};

pub struct GilrsSource {
    gilrs: Gilrs,
}

impl GilrsSource {
    pub fn new() -> Result<Self, SourceError> {
        info!("Initializing gilrs controller interface");
        let gilrs = Gilrs::new().map_err(|e| SourceError::InitializationError(e.to_string()))?;

        let connected = gilrs.gamepads().count();
        if connected == 0 {
            info!("No gamepad connected yet");
        } else {
            for (id, gamepad) in gilrs.gamepads() {
                info!("Found gamepad [{}]: {}", id, gamepad.name());
            }
        }

        Ok(Self { gilrs })
    }

    fn snapshot(gamepad: &Gamepad<'_>) -> GamepadSnapshot {
        let state = gamepad.state();

        let mut buttons: Vec<(u32, ButtonReading)> = state
            .buttons()
            .map(|(code, data)| {
                (
                    code.into_u32(),
                    ButtonReading::Flagged {
                        pressed: data.is_pressed(),
                        value: data.value(),
                    },
                )
            })
            .collect();
        buttons.sort_by_key(|(code, _)| *code);

        let mut axes: Vec<(u32, f32)> = state
            .axes()
            .map(|(code, data)| (code.into_u32(), data.value()))
            .collect();
        axes.sort_by_key(|(code, _)| *code);

        GamepadSnapshot {
            buttons: buttons.into_iter().map(|(_, reading)| reading).collect(),
            axes: axes.into_iter().map(|(_, value)| value).collect(),
        }
    }
}

impl GamepadSource for GilrsSource {
    fn list_connected(&mut self) -> Result<Vec<Option<GamepadSnapshot>>, SourceError> {
        // Drain pending events so the cached state reflects this tick.
        while let Some(Event { id, event, .. }) = self.gilrs.next_event() {
            match event {
                EventType::Connected => info!("Gamepad connected: {:?}", id),
                EventType::Disconnected => warn!("Gamepad disconnected: {:?}", id),
                _ => debug!("gilrs event from {:?}: {:?}", id, event),
            }
        }

        Ok(self
            .gilrs
            .gamepads()
            .map(|(_, gamepad)| {
                if gamepad.is_connected() {
                    Some(Self::snapshot(&gamepad))
                } else {
                    None
                }
            })
            .collect())
    }
}
