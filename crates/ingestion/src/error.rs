//! Ingestion 错误类型

use thiserror::Error;

/// Ingestion 错误
#[derive(Debug, Error)]
pub enum IngestionError {
    /// 触发源的接收端已关闭
    #[error("pulse source {source_name} is closed")]
    ChannelClosed {
        /// 触发源名称
        source_name: String,
    },

    /// 缓冲容量无效
    #[error("invalid capacity {capacity} for {what}")]
    InvalidCapacity {
        /// 缓冲用途
        what: &'static str,
        /// 请求的容量
        capacity: usize,
    },
}

/// Ingestion Result 类型别名
pub type Result<T> = std::result::Result<T, IngestionError>;
