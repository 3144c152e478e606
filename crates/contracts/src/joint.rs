//! Joint samples and the synchronized joint triple.

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

use crate::Timestamp;

/// State of a single joint as reported by its motor driver.
///
/// All fields are optional: an empty state is what a disconnected feed
/// contributes to a triple.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct JointState {
    /// Position (rad)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<f64>,

    /// Speed (rad/s)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub speed: Option<f64>,

    /// Effort (Nm)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub effort: Option<f64>,
}

impl JointState {
    pub fn from_position(position: f64) -> Self {
        Self {
            position: Some(position),
            ..Default::default()
        }
    }

    /// True when no field is set.
    pub fn is_empty(&self) -> bool {
        self.position.is_none() && self.speed.is_none() && self.effort.is_none()
    }
}

/// One joint state tagged with the time of the feed sample it came from.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct JointSample {
    pub time: Timestamp,
    pub state: JointState,
}

/// Joint slot in the fixed triple order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JointSlot {
    Yaw,
    Pitch,
    Roll,
}

impl JointSlot {
    /// All slots in triple order.
    pub const ALL: [JointSlot; 3] = [JointSlot::Yaw, JointSlot::Pitch, JointSlot::Roll];

    /// Position of this slot inside a [`JointTriple`].
    pub const fn index(self) -> usize {
        match self {
            JointSlot::Yaw => 0,
            JointSlot::Pitch => 1,
            JointSlot::Roll => 2,
        }
    }

    /// Bit of this slot inside a [`ReceivedMask`].
    pub const fn mask(self) -> ReceivedMask {
        match self {
            JointSlot::Yaw => ReceivedMask::YAW,
            JointSlot::Pitch => ReceivedMask::PITCH,
            JointSlot::Roll => ReceivedMask::ROLL,
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            JointSlot::Yaw => "yaw",
            JointSlot::Pitch => "pitch",
            JointSlot::Roll => "roll",
        }
    }
}

impl std::fmt::Display for JointSlot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

bitflags! {
    /// Joints collected during the current cycle, one bit per slot.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
    pub struct ReceivedMask: u8 {
        const YAW   = 0b001;
        const PITCH = 0b010;
        const ROLL  = 0b100;
        const ALL   = Self::YAW.bits() | Self::PITCH.bits() | Self::ROLL.bits();
    }
}

impl ReceivedMask {
    /// No joint received yet.
    pub const NONE: Self = Self::empty();

    pub fn is_complete(&self) -> bool {
        self.contains(Self::ALL)
    }
}

impl Default for ReceivedMask {
    fn default() -> Self {
        Self::NONE
    }
}

/// Names the triple is exported with.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JointNames {
    #[serde(default = "default_yaw_name")]
    pub yaw: String,
    #[serde(default = "default_pitch_name")]
    pub pitch: String,
    #[serde(default = "default_roll_name")]
    pub roll: String,
}

impl JointNames {
    pub fn get(&self, slot: JointSlot) -> &str {
        match slot {
            JointSlot::Yaw => &self.yaw,
            JointSlot::Pitch => &self.pitch,
            JointSlot::Roll => &self.roll,
        }
    }

    /// Names in triple order.
    pub fn to_array(&self) -> [String; 3] {
        [self.yaw.clone(), self.pitch.clone(), self.roll.clone()]
    }
}

impl Default for JointNames {
    fn default() -> Self {
        Self {
            yaw: default_yaw_name(),
            pitch: default_pitch_name(),
            roll: default_roll_name(),
        }
    }
}

fn default_yaw_name() -> String {
    "ship_and_heads::heads::joint_base_yaw".to_string()
}

fn default_pitch_name() -> String {
    "ship_and_heads::heads::joint_yaw_pitch".to_string()
}

fn default_roll_name() -> String {
    "ship_and_heads::heads::joint_pitch_roll".to_string()
}

/// Time-aligned yaw/pitch/roll sample, the synchronizer's output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JointTriple {
    /// Sync pulse that opened the collection interval
    pub time: Timestamp,

    /// Joint names in slot order
    pub names: [String; 3],

    /// Joint states in slot order
    pub elements: [JointState; 3],
}

impl JointTriple {
    pub fn get(&self, slot: JointSlot) -> &JointState {
        &self.elements[slot.index()]
    }
}
