//! Synthetic key event delivery.
//!
//! Two delivery modes exist. [`DirectSink`] hands events to an in-process
//! consumer over a channel, for surfaces that accept plain input. When the
//! focused surface needs elevated permissions, [`RelaySink`] forwards each
//! event through a privileged [`RelayChannel`] with strict
//! attach/send/detach semantics: the channel is fully detached after every
//! single key event, on every exit path.

use thiserror::Error;
use tokio::sync::mpsc;
use tracing::debug;

use crate::mapping::KeyDescriptor;

/// Errors from delivering a key event.
#[derive(Debug, Error)]
pub enum SinkError {
    #[error("Failed to deliver key event: {0}")]
    DeliveryError(String),

    #[error("Failed to attach relay channel: {0}")]
    AttachError(String),

    #[error("Failed to detach relay channel: {0}")]
    DetachError(String),
}

/// One synthetic keyboard event.
#[derive(Debug, Clone, PartialEq)]
pub struct KeyEvent {
    pub key: KeyDescriptor,
    pub down: bool,
}

/// Destination for synthetic key events.
pub trait EventSink: Send {
    fn emit(&mut self, key: &KeyDescriptor, down: bool) -> Result<(), SinkError>;
}

/// Direct delivery to an in-process consumer.
pub struct DirectSink {
    events_tx: mpsc::Sender<KeyEvent>,
}

impl DirectSink {
    pub fn new(events_tx: mpsc::Sender<KeyEvent>) -> Self {
        Self { events_tx }
    }
}

impl EventSink for DirectSink {
    fn emit(&mut self, key: &KeyDescriptor, down: bool) -> Result<(), SinkError> {
        let event = KeyEvent {
            key: key.clone(),
            down,
        };
        debug!("Dispatching key event: {:?}", event);
        self.events_tx
            .try_send(event)
            .map_err(|e| SinkError::DeliveryError(e.to_string()))
    }
}

/// Privileged out-of-process key event channel.
///
/// Modeled on debugging-protocol key injection: a session is attached, one
/// key event command is sent, and the session is detached again. No
/// persistent attachment is allowed.
pub trait RelayChannel: Send {
    fn attach(&mut self) -> Result<(), SinkError>;
    fn send_key(&mut self, key: &KeyDescriptor, down: bool) -> Result<(), SinkError>;
    fn detach(&mut self) -> Result<(), SinkError>;
}

/// Relay delivery wrapping a [`RelayChannel`].
pub struct RelaySink<C: RelayChannel> {
    channel: C,
}

impl<C: RelayChannel> RelaySink<C> {
    pub fn new(channel: C) -> Self {
        Self { channel }
    }
}

impl<C: RelayChannel> EventSink for RelaySink<C> {
    fn emit(&mut self, key: &KeyDescriptor, down: bool) -> Result<(), SinkError> {
        self.channel.attach()?;

        // Detach runs whether or not the send succeeded; a failed send must
        // not leave the privileged channel attached.
        let sent = self.channel.send_key(key, down);
        let detached = self.channel.detach();

        sent?;
        detached?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(display: &str) -> KeyDescriptor {
        KeyDescriptor {
            display_key: display.to_string(),
            key_code: 65,
            physical_code: "KeyA".into(),
        }
    }

    #[derive(Default)]
    struct RecordingRelay {
        calls: Vec<&'static str>,
        fail_attach: bool,
        fail_send: bool,
    }

    impl RelayChannel for RecordingRelay {
        fn attach(&mut self) -> Result<(), SinkError> {
            self.calls.push("attach");
            if self.fail_attach {
                return Err(SinkError::AttachError("no target".into()));
            }
            Ok(())
        }

        fn send_key(&mut self, _key: &KeyDescriptor, _down: bool) -> Result<(), SinkError> {
            self.calls.push("send");
            if self.fail_send {
                return Err(SinkError::DeliveryError("command rejected".into()));
            }
            Ok(())
        }

        fn detach(&mut self) -> Result<(), SinkError> {
            self.calls.push("detach");
            Ok(())
        }
    }

    #[tokio::test]
    async fn direct_sink_forwards_key_events() {
        let (tx, mut rx) = mpsc::channel(4);
        let mut sink = DirectSink::new(tx);

        sink.emit(&key("a"), true).unwrap();
        sink.emit(&key("a"), false).unwrap();

        assert_eq!(rx.recv().await.unwrap().down, true);
        assert_eq!(rx.recv().await.unwrap().down, false);
    }

    #[test]
    fn relay_attaches_sends_and_detaches_per_event() {
        let mut sink = RelaySink::new(RecordingRelay::default());

        sink.emit(&key("a"), true).unwrap();
        sink.emit(&key("a"), false).unwrap();

        assert_eq!(
            sink.channel.calls,
            vec!["attach", "send", "detach", "attach", "send", "detach"]
        );
    }

    #[test]
    fn relay_detaches_even_when_send_fails() {
        let mut sink = RelaySink::new(RecordingRelay {
            fail_send: true,
            ..Default::default()
        });

        assert!(sink.emit(&key("a"), true).is_err());
        assert_eq!(sink.channel.calls, vec!["attach", "send", "detach"]);
    }

    #[test]
    fn relay_does_not_send_when_attach_fails() {
        let mut sink = RelaySink::new(RecordingRelay {
            fail_attach: true,
            ..Default::default()
        });

        assert!(sink.emit(&key("a"), true).is_err());
        assert_eq!(sink.channel.calls, vec!["attach"]);
    }
}
