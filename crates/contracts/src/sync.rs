//! Synchronizer state and the records it publishes.

use serde::{Deserialize, Serialize};

use crate::{JointTriple, Timestamp};

/// CANopen SYNC COB-ID.
pub const CANOPEN_SYNC_COB_ID: u16 = 0x080;

/// Synchronization state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncState {
    /// Waiting for a cycle to complete after (re)start or a timeout
    #[default]
    LostSync,
    /// Pulses arrive within the resync timeout
    Running,
}

impl SyncState {
    pub const fn as_str(self) -> &'static str {
        match self {
            SyncState::LostSync => "lost_sync",
            SyncState::Running => "running",
        }
    }
}

/// Synchronization message written to the bus on each accepted pulse.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncPulse {
    /// Time the pulse was generated
    pub time: Timestamp,

    /// Bus identifier of the message
    pub cob_id: u16,
}

impl SyncPulse {
    pub fn at(time: Timestamp) -> Self {
        Self {
            time,
            cob_id: CANOPEN_SYNC_COB_ID,
        }
    }
}

/// Cumulative synchronizer statistics, published every tick.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncStats {
    /// Time of publication
    pub time: Timestamp,

    /// Pulses that (re)started a cycle while synchronization was lost
    pub lost_sync_periods: u64,

    /// Pulses that arrived while the previous cycle was still collecting
    pub skipped_sync: u64,
}

/// A pulse that arrived before the previous cycle finished collecting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkipEvent {
    /// Time of the skipped pulse
    pub sync_time: Timestamp,

    /// Time the skip was detected
    pub received_at: Timestamp,

    /// Time the unfinished cycle completed
    pub ready_at: Timestamp,
}

impl SkipEvent {
    /// How long the late cycle kept the skipped pulse waiting.
    pub fn latency(&self) -> std::time::Duration {
        self.ready_at - self.sync_time
    }
}

/// Anything the synchronizer publishes downstream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SyncEvent {
    Joints(JointTriple),
    Stats(SyncStats),
    Skip(SkipEvent),
}

impl SyncEvent {
    pub fn kind(&self) -> &'static str {
        match self {
            SyncEvent::Joints(_) => "joints",
            SyncEvent::Stats(_) => "stats",
            SyncEvent::Skip(_) => "skip",
        }
    }

    /// Reference time of the event.
    pub fn time(&self) -> Timestamp {
        match self {
            SyncEvent::Joints(triple) => triple.time,
            SyncEvent::Stats(stats) => stats.time,
            SyncEvent::Skip(skip) => skip.sync_time,
        }
    }
}
