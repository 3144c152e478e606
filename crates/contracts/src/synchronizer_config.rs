//! Synchronizer configuration contracts that can be shared across crates.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::JointNames;

/// Default maximum gap between pulses before synchronization is lost.
pub const DEFAULT_RESYNC_TIMEOUT_US: u64 = 10_000;

/// Default pause between regaining synchronization and flushing the feeds.
pub const DEFAULT_SETTLE_DELAY_US: u64 = 5_000;

/// Joint synchronizer configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct SynchronizerConfig {
    /// Maximum gap between two pulses before synchronization is declared lost (µs)
    #[serde(default = "default_resync_timeout_us")]
    #[validate(range(min = 1, max = 10_000_000))]
    pub resync_timeout_us: u64,

    /// Settle pause when leaving LOST_SYNC (µs)
    #[serde(default = "default_settle_delay_us")]
    #[validate(range(max = 1_000_000))]
    pub settle_delay_us: u64,

    /// Names of the exported joints
    #[serde(default)]
    pub joint_names: JointNames,
}

impl SynchronizerConfig {
    pub fn resync_timeout(&self) -> Duration {
        Duration::from_micros(self.resync_timeout_us)
    }

    pub fn settle_delay(&self) -> Duration {
        Duration::from_micros(self.settle_delay_us)
    }

    /// Builder-style override of the resync timeout.
    pub fn with_resync_timeout(mut self, timeout: Duration) -> Self {
        self.resync_timeout_us = u64::try_from(timeout.as_micros()).unwrap_or(u64::MAX);
        self
    }
}

impl Default for SynchronizerConfig {
    fn default() -> Self {
        Self {
            resync_timeout_us: default_resync_timeout_us(),
            settle_delay_us: default_settle_delay_us(),
            joint_names: JointNames::default(),
        }
    }
}

fn default_resync_timeout_us() -> u64 {
    DEFAULT_RESYNC_TIMEOUT_US
}

fn default_settle_delay_us() -> u64 {
    DEFAULT_SETTLE_DELAY_US
}
