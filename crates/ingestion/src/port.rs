//! Bounded joint sample ports.
//!
//! A port is a single-producer single-consumer ring buffer: the motor driver
//! owns the writer, the synchronizer owns the reader. Writes never block; a
//! full port drops the new sample and counts it.

use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use contracts::{JointFeed, JointSample};
use ringbuf::traits::{Consumer, Observer, Producer, Split};
use ringbuf::{HeapCons, HeapProd, HeapRb};
use tracing::trace;

use crate::{IngestionError, Result};

#[derive(Debug, Default)]
struct PortShared {
    writer_attached: AtomicBool,
    written: AtomicU64,
    dropped: AtomicU64,
}

/// Create a joint port holding at most `capacity` samples.
pub fn joint_port(name: &str, capacity: usize) -> Result<(JointPortWriter, JointPortReader)> {
    if capacity == 0 {
        return Err(IngestionError::InvalidCapacity {
            what: "joint port",
            capacity,
        });
    }

    let (producer, consumer) = HeapRb::<JointSample>::new(capacity).split();
    let shared = Arc::new(PortShared {
        writer_attached: AtomicBool::new(true),
        ..Default::default()
    });

    Ok((
        JointPortWriter {
            name: name.to_string(),
            producer,
            shared: shared.clone(),
        },
        JointPortReader {
            name: name.to_string(),
            consumer,
            shared,
        },
    ))
}

/// Counters of one port.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PortStats {
    pub written: u64,
    pub dropped: u64,
    pub buffered: usize,
}

/// Producer half, held by the driver publishing samples.
pub struct JointPortWriter {
    name: String,
    producer: HeapProd<JointSample>,
    shared: Arc<PortShared>,
}

impl JointPortWriter {
    /// Push a sample. Returns false if the port was full and it was dropped.
    pub fn write(&mut self, sample: JointSample) -> bool {
        match self.producer.try_push(sample) {
            Ok(()) => {
                self.shared.written.fetch_add(1, Ordering::Relaxed);
                true
            }
            Err(_) => {
                self.shared.dropped.fetch_add(1, Ordering::Relaxed);
                metrics::counter!("joint_syncer_port_dropped_total", "port" => self.name.clone())
                    .increment(1);
                trace!(port = %self.name, time = %sample.time, "joint port full, sample dropped");
                false
            }
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl Drop for JointPortWriter {
    fn drop(&mut self) {
        self.shared.writer_attached.store(false, Ordering::Release);
    }
}

impl fmt::Debug for JointPortWriter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JointPortWriter")
            .field("name", &self.name)
            .field("vacant", &self.producer.vacant_len())
            .finish()
    }
}

/// Consumer half, the synchronizer's view of one joint.
pub struct JointPortReader {
    name: String,
    consumer: HeapCons<JointSample>,
    shared: Arc<PortShared>,
}

impl JointPortReader {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn stats(&self) -> PortStats {
        PortStats {
            written: self.shared.written.load(Ordering::Relaxed),
            dropped: self.shared.dropped.load(Ordering::Relaxed),
            buffered: self.consumer.occupied_len(),
        }
    }
}

impl JointFeed for JointPortReader {
    fn is_connected(&self) -> bool {
        self.shared.writer_attached.load(Ordering::Acquire)
    }

    fn try_read(&mut self) -> Option<JointSample> {
        self.consumer.try_pop()
    }

    fn clear(&mut self) {
        let discarded = self.consumer.clear();
        if discarded > 0 {
            trace!(port = %self.name, discarded, "joint port cleared");
        }
    }
}

impl fmt::Debug for JointPortReader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JointPortReader")
            .field("name", &self.name)
            .field("stats", &self.stats())
            .finish()
    }
}

/// A joint input with no driver attached.
#[derive(Debug, Clone, Copy, Default)]
pub struct DisconnectedFeed;

impl JointFeed for DisconnectedFeed {
    fn is_connected(&self) -> bool {
        false
    }

    fn try_read(&mut self) -> Option<JointSample> {
        None
    }

    fn clear(&mut self) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::{JointState, Timestamp};

    fn sample(ms: u64) -> JointSample {
        JointSample {
            time: Timestamp::from_millis(ms),
            state: JointState::from_position(ms as f64),
        }
    }

    #[test]
    fn test_fifo_order() {
        let (mut writer, mut reader) = joint_port("yaw", 4).unwrap();
        assert!(writer.write(sample(1)));
        assert!(writer.write(sample(2)));

        assert_eq!(reader.try_read(), Some(sample(1)));
        assert_eq!(reader.try_read(), Some(sample(2)));
        assert_eq!(reader.try_read(), None);
    }

    #[test]
    fn test_full_port_drops_newest() {
        let (mut writer, mut reader) = joint_port("pitch", 2).unwrap();
        assert!(writer.write(sample(1)));
        assert!(writer.write(sample(2)));
        assert!(!writer.write(sample(3)));

        let stats = reader.stats();
        assert_eq!(stats.written, 2);
        assert_eq!(stats.dropped, 1);
        assert_eq!(stats.buffered, 2);
        assert_eq!(reader.try_read(), Some(sample(1)));
    }

    #[test]
    fn test_clear_discards_everything() {
        let (mut writer, mut reader) = joint_port("roll", 4).unwrap();
        writer.write(sample(1));
        writer.write(sample(2));
        reader.clear();
        assert_eq!(reader.try_read(), None);
    }

    #[test]
    fn test_reader_disconnects_with_writer() {
        let (writer, reader) = joint_port("yaw", 1).unwrap();
        assert!(reader.is_connected());
        drop(writer);
        assert!(!reader.is_connected());
    }

    #[test]
    fn test_zero_capacity_rejected() {
        assert!(matches!(
            joint_port("yaw", 0),
            Err(IngestionError::InvalidCapacity { capacity: 0, .. })
        ));
    }

    #[test]
    fn test_disconnected_feed() {
        let mut feed = DisconnectedFeed;
        assert!(!feed.is_connected());
        assert_eq!(feed.try_read(), None);
    }
}
