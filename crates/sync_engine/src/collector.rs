//! Per-joint sample collection.

use contracts::{JointFeed, JointSample, JointSlot, JointState, ReceivedMask, Timestamp};
use tracing::trace;

/// The three joint feeds in slot order.
pub struct JointFeeds {
    feeds: [Box<dyn JointFeed>; 3],
}

impl JointFeeds {
    pub fn new(
        yaw: Box<dyn JointFeed>,
        pitch: Box<dyn JointFeed>,
        roll: Box<dyn JointFeed>,
    ) -> Self {
        Self {
            feeds: [yaw, pitch, roll],
        }
    }

    pub fn get(&self, slot: JointSlot) -> &dyn JointFeed {
        self.feeds[slot.index()].as_ref()
    }

    pub fn get_mut(&mut self, slot: JointSlot) -> &mut dyn JointFeed {
        self.feeds[slot.index()].as_mut()
    }

    pub fn into_array(self) -> [Box<dyn JointFeed>; 3] {
        self.feeds
    }
}

/// Pulls, per joint, the newest sample taken after the current sync time.
pub struct JointCollector {
    feeds: JointFeeds,
    samples: [JointState; 3],
}

impl JointCollector {
    pub fn new(feeds: JointFeeds) -> Self {
        Self {
            feeds,
            samples: [JointState::default(); 3],
        }
    }

    /// Seed mask for a fresh cycle: feeds that are not connected at all
    /// have nothing to wait for.
    pub fn initial_received(&self) -> ReceivedMask {
        JointSlot::ALL
            .into_iter()
            .filter(|slot| !self.feeds.get(*slot).is_connected())
            .fold(ReceivedMask::NONE, |mask, slot| mask | slot.mask())
    }

    /// Poll every joint not yet in `received`; returns the updated mask.
    pub fn poll(&mut self, received: ReceivedMask, sync_time: Timestamp) -> ReceivedMask {
        let mut mask = received;
        for slot in JointSlot::ALL {
            if !mask.contains(slot.mask()) && self.update_joint(slot, sync_time) {
                mask |= slot.mask();
            }
        }
        mask
    }

    /// Latest collected state of every slot.
    pub fn samples(&self) -> &[JointState; 3] {
        &self.samples
    }

    /// Discard everything buffered on all feeds.
    pub fn clear_feeds(&mut self) {
        for slot in JointSlot::ALL {
            self.feeds.get_mut(slot).clear();
        }
    }

    pub fn into_feeds(self) -> JointFeeds {
        self.feeds
    }

    fn update_joint(&mut self, slot: JointSlot, sync_time: Timestamp) -> bool {
        let feed = self.feeds.get_mut(slot);
        if !feed.is_connected() {
            self.samples[slot.index()] = JointState::default();
            return true;
        }

        let mut newest: Option<JointSample> = None;
        while let Some(sample) = feed.try_read() {
            if sample.time > sync_time && newest.is_none_or(|kept| sample.time >= kept.time) {
                newest = Some(sample);
            }
        }

        match newest {
            Some(sample) => {
                trace!(joint = %slot, sample_time = %sample.time, "joint received");
                self.samples[slot.index()] = sample.state;
                true
            }
            None => false,
        }
    }
}
