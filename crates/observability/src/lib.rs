//! # Observability
//!
//! 可观测性模块：Tracing + Prometheus 指标。
//!
//! ## 功能
//!
//! - Tracing 初始化 (JSON/Pretty/Compact 格式)
//! - Prometheus 指标导出
//! - 同步事件指标记录与运行摘要
//!
//! ## 使用示例
//!
//! ```ignore
//! use observability::{init_with_config, record_sync_event, ObservabilityConfig};
//!
//! init_with_config(ObservabilityConfig::default())?;
//!
//! let report = synchronizer.update();
//! record_sync_event(&SyncEvent::Stats(report.stats));
//! ```

pub mod metrics;

use anyhow::{Context, Result};
use metrics_exporter_prometheus::PrometheusBuilder;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

pub use crate::metrics::{
    record_joint_triple, record_running, record_skip_event, record_sync_event,
    record_sync_stats, MetricsSummary, RunningStats, StatsSummary, SyncMetricsAggregator,
};

/// 以默认配置初始化 (紧凑日志，不导出指标)
pub fn init() -> Result<()> {
    init_with_config(ObservabilityConfig::default())
}

/// 可观测性配置
#[derive(Debug, Clone)]
pub struct ObservabilityConfig {
    /// 日志格式
    pub log_format: LogFormat,
    /// Prometheus 端口 (None = 禁用)
    pub metrics_port: Option<u16>,
    /// 默认日志级别，`RUST_LOG` 优先
    pub default_log_level: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_format: LogFormat::Compact,
            metrics_port: None,
            default_log_level: "info".to_string(),
        }
    }
}

/// 日志格式
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    /// JSON 结构化日志
    Json,
    /// 人类可读格式
    Pretty,
    /// 紧凑单行格式
    #[default]
    Compact,
}

/// 使用自定义配置初始化
pub fn init_with_config(config: ObservabilityConfig) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.default_log_level));

    let registry = tracing_subscriber::registry().with(filter);
    match config.log_format {
        LogFormat::Json => registry
            .with(
                fmt::layer()
                    .json()
                    .with_target(true)
                    .with_thread_names(true)
                    .with_file(true)
                    .with_line_number(true),
            )
            .try_init(),
        LogFormat::Pretty => registry.with(fmt::layer().pretty()).try_init(),
        LogFormat::Compact => registry.with(fmt::layer().compact()).try_init(),
    }
    .context("Failed to initialize tracing subscriber")?;

    if let Some(port) = config.metrics_port {
        init_metrics_only(port)?;
    }

    tracing::info!(
        log_format = ?config.log_format,
        metrics_port = ?config.metrics_port,
        "Observability initialized"
    );

    Ok(())
}

/// 仅安装 Prometheus 导出器 (Tracing 已由调用方初始化)
pub fn init_metrics_only(port: u16) -> Result<()> {
    PrometheusBuilder::new()
        .with_http_listener(([0, 0, 0, 0], port))
        .install()
        .context("Failed to install Prometheus recorder")?;

    describe_metrics();
    tracing::info!(port, "Prometheus metrics endpoint initialized");
    Ok(())
}

fn describe_metrics() {
    ::metrics::describe_counter!(
        "joint_syncer_pulses_total",
        "Detected sync pulses by state machine outcome"
    );
    ::metrics::describe_counter!(
        "joint_syncer_triples_total",
        "Joint triples emitted by the synchronizer"
    );
    ::metrics::describe_counter!(
        "joint_syncer_sync_lost_total",
        "Cycles that exceeded the resync timeout"
    );
    ::metrics::describe_counter!(
        "joint_syncer_resyncs_total",
        "LOST_SYNC cycles that completed and regained sync"
    );
    ::metrics::describe_gauge!(
        "joint_syncer_lost_sync_periods",
        "Cumulative lost sync periods"
    );
    ::metrics::describe_gauge!("joint_syncer_skipped_sync", "Cumulative skipped sync pulses");
    ::metrics::describe_histogram!(
        "joint_syncer_skip_latency_ms",
        ::metrics::Unit::Milliseconds,
        "Delay between a skipped pulse and completion of the late cycle"
    );
}
