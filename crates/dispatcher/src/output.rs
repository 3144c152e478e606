//! Bridge from the synchronous synchronizer tick to the async dispatcher.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use contracts::{JointTriple, SkipEvent, SyncEvent, SyncOutput, SyncStats};
use tokio::sync::mpsc;
use tracing::{trace, warn};

/// Create the synchronizer-side output and the dispatcher-side receiver.
pub fn event_channel(capacity: usize) -> (ChannelOutput, mpsc::Receiver<SyncEvent>) {
    let (tx, rx) = mpsc::channel(capacity.max(1));
    let output = ChannelOutput {
        tx,
        counters: Arc::new(OutputCounters::default()),
    };
    (output, rx)
}

/// Events forwarded or lost by a [`ChannelOutput`].
#[derive(Debug, Default)]
pub struct OutputCounters {
    sent: AtomicU64,
    dropped: AtomicU64,
}

impl OutputCounters {
    pub fn sent(&self) -> u64 {
        self.sent.load(Ordering::Relaxed)
    }

    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }
}

/// [`SyncOutput`] that never blocks the tick: events that do not fit in
/// the queue are dropped and counted.
#[derive(Debug, Clone)]
pub struct ChannelOutput {
    tx: mpsc::Sender<SyncEvent>,
    counters: Arc<OutputCounters>,
}

impl ChannelOutput {
    pub fn counters(&self) -> Arc<OutputCounters> {
        Arc::clone(&self.counters)
    }

    fn forward(&self, event: SyncEvent) {
        match self.tx.try_send(event) {
            Ok(()) => {
                self.counters.sent.fetch_add(1, Ordering::Relaxed);
            }
            Err(mpsc::error::TrySendError::Full(event)) => {
                self.counters.dropped.fetch_add(1, Ordering::Relaxed);
                metrics::counter!("joint_syncer_output_dropped_total", "kind" => event.kind())
                    .increment(1);
                // Stats go out every tick, losing one is routine
                if matches!(event, SyncEvent::Stats(_)) {
                    trace!("output queue full, stats dropped");
                } else {
                    warn!(kind = event.kind(), time = %event.time(), "output queue full, event dropped");
                }
            }
            Err(mpsc::error::TrySendError::Closed(event)) => {
                self.counters.dropped.fetch_add(1, Ordering::Relaxed);
                trace!(kind = event.kind(), "output receiver closed");
            }
        }
    }
}

impl SyncOutput for ChannelOutput {
    fn write_joints(&mut self, triple: &JointTriple) {
        self.forward(SyncEvent::Joints(triple.clone()));
    }

    fn write_stats(&mut self, stats: &SyncStats) {
        self.forward(SyncEvent::Stats(*stats));
    }

    fn write_skip(&mut self, skip: &SkipEvent) {
        self.forward(SyncEvent::Skip(*skip));
    }
}
