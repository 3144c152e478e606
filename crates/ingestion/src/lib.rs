//! # Ingestion
//!
//! Input side of the joint synchronizer.
//!
//! Responsibilities:
//! - Bounded joint sample ports (SPSC ring buffers, drop-newest when full)
//! - Channel-backed pulse sources (IMU stream, bus sync messages)
//! - The in-process sync bus the synchronizer writes sync messages to
//! - Simulated motor drivers and a pulse generator for dry runs
//!
//! ## Usage Example
//!
//! ```ignore
//! use contracts::PulseSourceKind;
//! use ingestion::{joint_port, pulse_channel, SyncBus};
//!
//! let (writer, reader) = joint_port("yaw", 16)?;
//! let (trigger, source) = pulse_channel(PulseSourceKind::Bus, 16)?;
//! let bus = SyncBus::new(64)?;
//!
//! // reader and source go to the synchronizer, writer to the motor driver
//! trigger.fire(clock.now())?;
//! ```

mod bus;
mod error;
mod mock;
mod port;
mod pulse;

pub use bus::SyncBus;
pub use error::{IngestionError, Result};
pub use mock::{MotorProfile, PulseGenerator, PulseProfile, SimulatedMotor};
pub use port::{joint_port, DisconnectedFeed, JointPortReader, JointPortWriter, PortStats};
pub use pulse::{pulse_channel, ChannelPulseSource, PulseTrigger};
