//! Mutable per-cycle state owned by the synchronizer.

use std::num::NonZeroU8;

use contracts::{ReceivedMask, Timestamp};

/// Gate applied to triple emission right after a resync.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum EmissionGate {
    /// Every completed cycle is published
    #[default]
    Normal,
    /// Completed cycles consume `remaining` before publishing resumes
    Suppressing { remaining: NonZeroU8 },
}

impl EmissionGate {
    /// Armed when a LOST_SYNC cycle completes.
    pub const fn suppress_once() -> Self {
        Self::Suppressing {
            remaining: NonZeroU8::MIN,
        }
    }

    /// Consume one completed cycle. Returns true if its triple is published.
    ///
    /// Decrement first, then publish when the count reaches zero on this
    /// decrement. The gate never goes below zero.
    pub fn admit(&mut self) -> bool {
        match *self {
            EmissionGate::Normal => true,
            EmissionGate::Suppressing { remaining } => match NonZeroU8::new(remaining.get() - 1) {
                Some(left) => {
                    *self = EmissionGate::Suppressing { remaining: left };
                    false
                }
                None => {
                    *self = EmissionGate::Normal;
                    true
                }
            },
        }
    }
}

/// A skipped pulse waiting for the unfinished cycle to complete.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct PendingSkip {
    pub sync_time: Timestamp,
    pub received_at: Timestamp,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct SyncCounters {
    pub lost_sync_periods: u64,
    pub skipped_sync: u64,
}

/// Cycle progress. `current_sync` is set iff a collection cycle is open.
#[derive(Debug, Clone, Default)]
pub(crate) struct CycleState {
    pub previous_sync: Option<Timestamp>,
    pub current_sync: Option<Timestamp>,
    pub received: ReceivedMask,
    pub gate: EmissionGate,
    pub pending_skip: Option<PendingSkip>,
    pub counters: SyncCounters,
}

impl CycleState {
    /// Open a new cycle at `sync_time` with `seed` already marked received.
    pub fn open(&mut self, sync_time: Timestamp, seed: ReceivedMask) {
        self.current_sync = Some(sync_time);
        self.received = seed;
    }

    /// Move the sync time of the open cycle to `sync_time`, keeping the
    /// joints already received.
    pub fn restart(&mut self, sync_time: Timestamp) {
        self.current_sync = Some(sync_time);
    }

    /// Close the current cycle: it becomes the previous one.
    pub fn roll(&mut self) {
        self.received = ReceivedMask::NONE;
        self.previous_sync = self.current_sync.take();
    }
}
