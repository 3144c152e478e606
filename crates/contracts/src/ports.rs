//! Port traits - the synchronizer's collaborators
//!
//! Every port is polled or written from inside one synchronizer tick and
//! must never block: "read if available, else proceed".

use crate::{JointSample, JointTriple, SkipEvent, SyncPulse, SyncStats};

/// Source of synchronization triggers.
///
/// The synchronizer does not interpret message content, only its arrival.
pub trait PulseSource: Send {
    /// Source name (used for logging)
    fn name(&self) -> &str;

    /// Whether a producer is attached to this source
    fn is_connected(&self) -> bool;

    /// Consume the pending trigger, if any.
    ///
    /// Returns true when a new message arrived since the previous call.
    fn take_pulse(&mut self) -> bool;
}

/// Writes generated sync messages to the bus. Fire and forget.
pub trait PulseEmitter: Send {
    fn emit(&mut self, pulse: SyncPulse);
}

/// Buffered feed of samples for one joint.
pub trait JointFeed: Send {
    /// Whether a driver is attached to this feed
    fn is_connected(&self) -> bool;

    /// Pop the oldest buffered sample, `None` when the buffer is empty.
    fn try_read(&mut self) -> Option<JointSample>;

    /// Discard everything buffered.
    fn clear(&mut self);
}

/// Downstream consumer of synchronizer output.
pub trait SyncOutput: Send {
    /// Synchronized joint triple
    fn write_joints(&mut self, triple: &JointTriple);

    /// Statistics, once per tick
    fn write_stats(&mut self, stats: &SyncStats);

    /// Resolved skip record
    fn write_skip(&mut self, skip: &SkipEvent);
}

/// Peer motor driver advanced once per tick before synchronization runs.
pub trait PeerDriver: Send {
    fn name(&self) -> &str;

    fn update(&mut self);
}
