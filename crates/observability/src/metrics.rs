//! 同步器指标收集模块
//!
//! 基于 `SyncEvent` 记录 Prometheus 指标，并在内存中聚合运行摘要。

use std::time::Duration;

use contracts::{JointSlot, JointTriple, SkipEvent, SyncEvent, SyncStats, Timestamp};
use metrics::{counter, gauge, histogram};

fn as_ms(duration: Duration) -> f64 {
    duration.as_secs_f64() * 1000.0
}

/// 按事件类型记录指标
///
/// # Example
///
/// ```ignore
/// use observability::metrics::record_sync_event;
///
/// let report = synchronizer.update();
/// if let Some(triple) = &report.emitted {
///     record_sync_event(&SyncEvent::Joints(triple.clone()));
/// }
/// ```
pub fn record_sync_event(event: &SyncEvent) {
    match event {
        SyncEvent::Joints(triple) => record_joint_triple(triple),
        SyncEvent::Stats(stats) => record_sync_stats(stats),
        SyncEvent::Skip(skip) => record_skip_event(skip),
    }
}

/// 记录同步输出的关节三元组
pub fn record_joint_triple(triple: &JointTriple) {
    counter!("joint_syncer_triples_published_total").increment(1);
    gauge!("joint_syncer_last_triple_time_s").set(triple.time.as_secs_f64());

    for slot in JointSlot::ALL {
        let state = triple.get(slot);
        if state.is_empty() {
            // 未连接关节输出空样本
            counter!("joint_syncer_empty_joint_total", "joint" => slot.as_str()).increment(1);
        } else if let Some(position) = state.position {
            gauge!("joint_syncer_joint_position_rad", "joint" => slot.as_str()).set(position);
        }
    }
}

/// 记录累计统计 (每个 tick 一次)
pub fn record_sync_stats(stats: &SyncStats) {
    gauge!("joint_syncer_lost_sync_periods").set(stats.lost_sync_periods as f64);
    gauge!("joint_syncer_skipped_sync").set(stats.skipped_sync as f64);
}

/// 记录已结算的跳过事件
pub fn record_skip_event(skip: &SkipEvent) {
    counter!("joint_syncer_skips_resolved_total").increment(1);
    histogram!("joint_syncer_skip_latency_ms").record(as_ms(skip.latency()));
}

/// 同步器状态 (0 = LOST_SYNC, 1 = RUNNING)
pub fn record_running(running: bool) {
    gauge!("joint_syncer_running").set(if running { 1.0 } else { 0.0 });
}

/// 同步指标聚合器
///
/// 在内存中聚合事件，便于运行结束时输出摘要。
#[derive(Debug, Clone, Default)]
pub struct SyncMetricsAggregator {
    /// 输出的三元组数
    pub triples: u64,

    /// 结算的跳过数
    pub skips: u64,

    /// 各关节空样本次数 (yaw, pitch, roll)
    pub empty_joints: [u64; 3],

    /// 最近一次统计
    pub last_stats: Option<SyncStats>,

    /// 相邻三元组时间间隔 (ms)
    pub triple_period: RunningStats,

    /// 跳过延迟 (ms)
    pub skip_latency: RunningStats,

    last_triple_time: Option<Timestamp>,
}

impl SyncMetricsAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// 更新聚合统计
    pub fn update(&mut self, event: &SyncEvent) {
        match event {
            SyncEvent::Joints(triple) => {
                self.triples += 1;
                if let Some(last) = self.last_triple_time.replace(triple.time) {
                    self.triple_period.push(as_ms(triple.time - last));
                }
                for slot in JointSlot::ALL {
                    if triple.get(slot).is_empty() {
                        self.empty_joints[slot.index()] += 1;
                    }
                }
            }
            SyncEvent::Stats(stats) => self.last_stats = Some(*stats),
            SyncEvent::Skip(skip) => {
                self.skips += 1;
                self.skip_latency.push(as_ms(skip.latency()));
            }
        }
    }

    /// 生成摘要报告
    pub fn summary(&self) -> MetricsSummary {
        let stats = self.last_stats.unwrap_or_default();
        MetricsSummary {
            triples: self.triples,
            skips_resolved: self.skips,
            lost_sync_periods: stats.lost_sync_periods,
            skipped_sync: stats.skipped_sync,
            empty_joints: self.empty_joints,
            triple_period_ms: StatsSummary::from(&self.triple_period),
            skip_latency_ms: StatsSummary::from(&self.skip_latency),
        }
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// 指标摘要
#[derive(Debug, Clone, Default)]
pub struct MetricsSummary {
    pub triples: u64,
    pub skips_resolved: u64,
    pub lost_sync_periods: u64,
    pub skipped_sync: u64,
    pub empty_joints: [u64; 3],
    pub triple_period_ms: StatsSummary,
    pub skip_latency_ms: StatsSummary,
}

impl std::fmt::Display for MetricsSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "=== Joint Sync Summary ===")?;
        writeln!(f, "Joint triples: {}", self.triples)?;
        writeln!(f, "Lost sync periods: {}", self.lost_sync_periods)?;
        writeln!(
            f,
            "Skipped syncs: {} ({} resolved)",
            self.skipped_sync, self.skips_resolved
        )?;
        writeln!(f, "Triple period (ms): {}", self.triple_period_ms)?;
        writeln!(f, "Skip latency (ms): {}", self.skip_latency_ms)?;

        if self.empty_joints.iter().any(|&count| count > 0) {
            writeln!(f, "Empty joint samples:")?;
            for slot in JointSlot::ALL {
                writeln!(f, "  {}: {}", slot, self.empty_joints[slot.index()])?;
            }
        }

        Ok(())
    }
}

/// 统计摘要
#[derive(Debug, Clone, Default)]
pub struct StatsSummary {
    pub count: u64,
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub std_dev: f64,
}

impl From<&RunningStats> for StatsSummary {
    fn from(stats: &RunningStats) -> Self {
        Self {
            count: stats.count,
            min: stats.min,
            max: stats.max,
            mean: stats.mean(),
            std_dev: stats.std_dev(),
        }
    }
}

impl std::fmt::Display for StatsSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.count == 0 {
            write!(f, "N/A")
        } else {
            write!(
                f,
                "min={:.3}, max={:.3}, mean={:.3}, std={:.3} (n={})",
                self.min, self.max, self.mean, self.std_dev, self.count
            )
        }
    }
}

/// 在线统计 (Welford)
#[derive(Debug, Clone, Default)]
pub struct RunningStats {
    count: u64,
    mean: f64,
    m2: f64,
    min: f64,
    max: f64,
}

impl RunningStats {
    pub fn push(&mut self, value: f64) {
        self.count += 1;
        if self.count == 1 {
            self.min = value;
            self.max = value;
            self.mean = value;
            self.m2 = 0.0;
            return;
        }

        self.min = self.min.min(value);
        self.max = self.max.max(value);
        let delta = value - self.mean;
        self.mean += delta / self.count as f64;
        self.m2 += delta * (value - self.mean);
    }

    pub fn count(&self) -> u64 {
        self.count
    }

    pub fn mean(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.mean
        }
    }

    /// 样本方差
    pub fn variance(&self) -> f64 {
        if self.count < 2 {
            0.0
        } else {
            self.m2 / (self.count - 1) as f64
        }
    }

    pub fn std_dev(&self) -> f64 {
        self.variance().sqrt()
    }

    pub fn min(&self) -> f64 {
        self.min
    }

    pub fn max(&self) -> f64 {
        self.max
    }
}
