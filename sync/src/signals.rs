//! Cross-view coordination signals.
//!
//! Views never mutate each other's state. Instead the view that performed a
//! write broadcasts what changed: a phase change after a toggle, or an epoch
//! advance after a reset. Every other view refreshes in response.

use ballot_types::{ElectionPhase, Epoch};
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{debug, info};

/// The last broadcast election signal.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct ElectionSignal {
    pub epoch: Epoch,
    /// Last phase announced in `epoch`; `NotStarted` until someone toggles.
    pub phase: ElectionPhase,
    /// Number of toggles announced so far, across all epochs.
    pub toggles: u64,
}

impl Default for ElectionSignal {
    fn default() -> Self {
        Self {
            epoch: Epoch::GENESIS,
            phase: ElectionPhase::NotStarted,
            toggles: 0,
        }
    }
}

/// Shared broadcast channel for epoch and phase signals.
///
/// Cheap to clone; all clones share one channel.
#[derive(Clone)]
pub struct SyncSignals {
    tx: Arc<watch::Sender<ElectionSignal>>,
}

impl SyncSignals {
    pub fn new() -> Self {
        let (tx, _) = watch::channel(ElectionSignal::default());
        Self { tx: Arc::new(tx) }
    }

    pub fn subscribe(&self) -> watch::Receiver<ElectionSignal> {
        self.tx.subscribe()
    }

    pub fn current(&self) -> ElectionSignal {
        *self.tx.borrow()
    }

    pub fn epoch(&self) -> Epoch {
        self.current().epoch
    }

    /// Announce a toggle and the phase it produced. Every announcement wakes
    /// all subscribers, even when the phase repeats the previous one: the
    /// contract may have been toggled by someone not on this channel in
    /// between. Returns the new toggle count.
    pub fn publish_phase(&self, phase: ElectionPhase) -> u64 {
        let mut toggles = 0;
        self.tx.send_modify(|signal| {
            signal.phase = phase;
            signal.toggles += 1;
            toggles = signal.toggles;
        });
        debug!(%phase, toggles, "election phase announced");
        toggles
    }

    /// Advance to the next epoch after a reset. Returns the new epoch.
    pub fn advance_epoch(&self) -> Epoch {
        let mut next = Epoch::GENESIS;
        self.tx.send_modify(|signal| {
            signal.epoch = signal.epoch.next();
            signal.phase = ElectionPhase::NotStarted;
            next = signal.epoch;
        });
        info!(epoch = next.0, "election epoch advanced");
        next
    }
}

impl Default for SyncSignals {
    fn default() -> Self {
        Self::new()
    }
}
