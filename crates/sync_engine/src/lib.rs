//! # Sync Engine
//!
//! 关节同步器：把 yaw / pitch / roll 三路独立时钟的关节流对齐到同一个同步脉冲。
//!
//! 负责：
//! - 触发检测（IMU 优先，总线消息次之）
//! - LOST_SYNC / RUNNING 状态机与重同步超时
//! - 逐关节采集同步时刻之后的最新样本
//! - 输出 `JointTriple`、统计信息与跳过记录
//!
//! ## 使用示例
//!
//! ```ignore
//! use sync_engine::{JointSynchronizer, PeerSet, SynchronizerConfig, SynchronizerPorts};
//!
//! let peers = PeerSet::resolve(&mut registry, &blueprint.peers)?;
//! let mut synchronizer =
//!     JointSynchronizer::start(SynchronizerConfig::default(), ports, peers, clock)?;
//!
//! // Once per scheduler tick
//! let report = synchronizer.update();
//! if let Some(triple) = report.emitted {
//!     // Handle synchronized joints
//! }
//! ```

mod collector;
mod cycle;
mod engine;
mod error;
mod peers;
mod trigger;

pub use collector::{JointCollector, JointFeeds};
pub use cycle::EmissionGate;
pub use engine::{JointSynchronizer, PulseOutcome, SynchronizerPorts, TickReport};
pub use error::SyncError;
pub use peers::{PeerRegistry, PeerSet};
pub use trigger::{PulseDetected, TriggerDetector};

// Re-export contracts types
pub use contracts::{
    JointTriple, ReceivedMask, SkipEvent, SyncState, SyncStats, SynchronizerConfig,
};
