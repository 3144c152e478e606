//! # Dispatcher
//!
//! 同步结果分发模块。
//!
//! 负责：
//! - 把同步器的输出 (`JointTriple` / `SyncStats` / `SkipEvent`) 非阻塞地送入队列
//! - Fan-out 到多个 sinks
//! - 隔离慢 sink，不阻塞调度 tick

pub mod dispatcher;
pub mod error;
pub mod handle;
pub mod metrics;
pub mod output;
pub mod sinks;

pub use contracts::{DataSink, SyncEvent};
pub use dispatcher::{create_dispatcher, Dispatcher, DispatcherBuilder, DispatcherConfig};
pub use error::DispatcherError;
pub use handle::SinkHandle;
pub use metrics::{MetricsSnapshot, SinkMetrics};
pub use output::{event_channel, ChannelOutput, OutputCounters};
pub use sinks::{FileSink, FileSinkConfig, LogSink};
