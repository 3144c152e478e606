//! In-process sync bus.

use contracts::{PulseEmitter, SyncPulse};
use tokio::sync::broadcast;
use tracing::trace;

use crate::{IngestionError, Result};

/// Broadcasts generated sync messages to every subscribed motor driver.
#[derive(Debug, Clone)]
pub struct SyncBus {
    tx: broadcast::Sender<SyncPulse>,
}

impl SyncBus {
    pub fn new(capacity: usize) -> Result<Self> {
        if capacity == 0 {
            return Err(IngestionError::InvalidCapacity {
                what: "sync bus",
                capacity,
            });
        }
        let (tx, _) = broadcast::channel(capacity);
        Ok(Self { tx })
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SyncPulse> {
        self.tx.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl PulseEmitter for SyncBus {
    fn emit(&mut self, pulse: SyncPulse) {
        match self.tx.send(pulse) {
            Ok(receivers) => trace!(time = %pulse.time, receivers, "sync written"),
            Err(_) => trace!(time = %pulse.time, "sync written with no listeners"),
        }
        metrics::counter!("joint_syncer_sync_messages_total").increment(1);
    }
}
