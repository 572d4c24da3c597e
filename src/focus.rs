//! Input focus oracle.
//!
//! The engine consults focus exactly once per tick; everything else about
//! window or page focus is the hosting surface's business.

use tokio::sync::watch;

pub trait FocusOracle: Send {
    fn has_focus(&self) -> bool;
}

/// For deployments without a focus concept (headless daemon).
pub struct AlwaysFocused;

impl FocusOracle for AlwaysFocused {
    fn has_focus(&self) -> bool {
        true
    }
}

/// Focus flag fed by the hosting surface over a watch channel.
pub struct WatchFocus {
    focus_rx: watch::Receiver<bool>,
}

impl WatchFocus {
    pub fn new(focus_rx: watch::Receiver<bool>) -> Self {
        Self { focus_rx }
    }
}

impl FocusOracle for WatchFocus {
    fn has_focus(&self) -> bool {
        *self.focus_rx.borrow()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn watch_focus_tracks_the_sender() {
        let (tx, rx) = watch::channel(true);
        let oracle = WatchFocus::new(rx);

        assert!(oracle.has_focus());
        tx.send(false).unwrap();
        assert!(!oracle.has_focus());
    }
}
