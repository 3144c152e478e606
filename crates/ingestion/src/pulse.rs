//! Channel-backed pulse sources.

use async_channel::{bounded, Receiver, Sender, TryRecvError, TrySendError};
use contracts::{PulseSource, PulseSourceKind, Timestamp};
use tracing::{debug, trace};

use crate::{IngestionError, Result};

/// Create a trigger/source pair of the given kind.
///
/// The source reports itself disconnected once every trigger is dropped.
pub fn pulse_channel(
    kind: PulseSourceKind,
    capacity: usize,
) -> Result<(PulseTrigger, ChannelPulseSource)> {
    if capacity == 0 {
        return Err(IngestionError::InvalidCapacity {
            what: "pulse channel",
            capacity,
        });
    }

    let (tx, rx) = bounded(capacity);
    Ok((
        PulseTrigger { kind, tx },
        ChannelPulseSource {
            kind,
            rx,
            last_message: None,
            received: 0,
        },
    ))
}

/// Producer side of a pulse source: an IMU sample or a bus message arriving.
#[derive(Debug, Clone)]
pub struct PulseTrigger {
    kind: PulseSourceKind,
    tx: Sender<Timestamp>,
}

impl PulseTrigger {
    /// Deliver a trigger message stamped `time`.
    ///
    /// Returns `Ok(false)` when the source's buffer is full and the message
    /// was dropped.
    pub fn fire(&self, time: Timestamp) -> Result<bool> {
        match self.tx.try_send(time) {
            Ok(()) => Ok(true),
            Err(TrySendError::Full(_)) => {
                trace!(source = self.kind.as_str(), %time, "pulse source full");
                Ok(false)
            }
            Err(TrySendError::Closed(_)) => Err(IngestionError::ChannelClosed {
                source_name: self.kind.as_str().to_string(),
            }),
        }
    }

    pub fn kind(&self) -> PulseSourceKind {
        self.kind
    }
}

/// Consumer side polled by the synchronizer's trigger detector.
///
/// An IMU source collapses everything pending into one trigger since only
/// the newest orientation sample matters. A bus source yields one trigger
/// per message.
#[derive(Debug)]
pub struct ChannelPulseSource {
    kind: PulseSourceKind,
    rx: Receiver<Timestamp>,
    last_message: Option<Timestamp>,
    received: u64,
}

impl ChannelPulseSource {
    pub fn kind(&self) -> PulseSourceKind {
        self.kind
    }

    /// Time carried by the most recently consumed message.
    pub fn last_message(&self) -> Option<Timestamp> {
        self.last_message
    }

    pub fn received(&self) -> u64 {
        self.received
    }

    fn next_message(&mut self) -> Option<Timestamp> {
        match self.rx.try_recv() {
            Ok(time) => {
                self.received += 1;
                Some(time)
            }
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Closed) => {
                debug!(source = self.kind.as_str(), "pulse source closed");
                None
            }
        }
    }
}

impl PulseSource for ChannelPulseSource {
    fn name(&self) -> &str {
        match self.kind {
            PulseSourceKind::Imu => "imu_messages",
            PulseSourceKind::Bus => "sync_messages",
        }
    }

    fn is_connected(&self) -> bool {
        self.rx.sender_count() > 0
    }

    fn take_pulse(&mut self) -> bool {
        let kind = self.kind;
        let newest = match kind {
            PulseSourceKind::Imu => std::iter::from_fn(|| self.next_message()).last(),
            PulseSourceKind::Bus => self.next_message(),
        };
        if newest.is_some() {
            self.last_message = newest;
        }
        newest.is_some()
    }
}
