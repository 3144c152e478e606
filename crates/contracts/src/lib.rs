//! # Contracts
//!
//! Frozen interface contracts (ICD), defining inter-module data structures and traits.
//! All business crates can only depend on this crate, reverse dependencies are prohibited.
//!
//! ## Time Model
//! - Every timestamp is a [`Timestamp`] produced by one shared [`Clock`]
//!   (microseconds since the clock epoch, monotonic)
//! - An unset time ("null") is `Option<Timestamp>::None`

mod blueprint;
mod error;
mod joint;
mod ports;
mod sink;
mod sync;
mod synchronizer_config;
mod time;

pub use blueprint::*;
pub use error::*;
pub use joint::*;
pub use ports::*;
pub use sink::*;
pub use sync::*;
pub use synchronizer_config::*;
pub use time::*;
