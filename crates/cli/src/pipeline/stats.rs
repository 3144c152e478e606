//! Run statistics.

use std::time::Duration;

use contracts::{SyncEvent, SyncState};
use dispatcher::MetricsSnapshot;
use observability::{
    record_joint_triple, record_running, record_skip_event, record_sync_stats,
    SyncMetricsAggregator,
};
use sync_engine::TickReport;

/// Statistics from a synchronizer run
#[derive(Debug, Clone, Default)]
pub struct PipelineStats {
    /// Scheduler ticks executed
    pub ticks: u64,

    /// Pulses produced by the generator
    pub pulses_generated: u64,

    /// Pulses the generator dropped on purpose
    pub pulses_dropped: u64,

    /// Trigger messages lost to a full pulse channel
    pub pulses_overflowed: u64,

    /// Pulses the synchronizer detected
    pub pulses_detected: u64,

    /// Joint triples published
    pub triples: u64,

    /// Events handed to the dispatcher
    pub events_sent: u64,

    /// Events lost to a full output queue
    pub events_dropped: u64,

    /// Total duration of the run
    pub duration: Duration,

    /// Number of sinks attached to the dispatcher
    pub active_sinks: usize,

    /// Final per-sink counters
    pub sink_metrics: Vec<(String, MetricsSnapshot)>,

    /// Synchronizer output aggregator
    pub sync_metrics: SyncMetricsAggregator,
}

impl PipelineStats {
    /// Fold one tick's report into the totals and the metrics recorder.
    pub fn record_tick(&mut self, report: &TickReport) {
        self.ticks += 1;

        if report.pulse.is_some() {
            self.pulses_detected += 1;
        }

        if let Some(triple) = &report.emitted {
            self.triples += 1;
            record_joint_triple(triple);
            self.sync_metrics.update(&SyncEvent::Joints(triple.clone()));
        }

        if let Some(skip) = &report.skip {
            record_skip_event(skip);
            self.sync_metrics.update(&SyncEvent::Skip(*skip));
        }

        record_sync_stats(&report.stats);
        self.sync_metrics.update(&SyncEvent::Stats(report.stats));
        record_running(report.state == SyncState::Running);
    }

    /// Joint triples per second
    pub fn triple_rate(&self) -> f64 {
        if self.duration.as_secs_f64() > 0.0 {
            self.triples as f64 / self.duration.as_secs_f64()
        } else {
            0.0
        }
    }

    /// Share of output events lost, as percentage
    pub fn output_drop_rate(&self) -> f64 {
        let total = self.events_sent + self.events_dropped;
        if total > 0 {
            (self.events_dropped as f64 / total as f64) * 100.0
        } else {
            0.0
        }
    }

    /// Print detailed summary
    pub fn print_summary(&self) {
        println!("\n╔══════════════════════════════════════════════════════════════╗");
        println!("║                  Joint Synchronizer Statistics               ║");
        println!("╚══════════════════════════════════════════════════════════════╝\n");

        println!("📊 Overview");
        println!("   ├─ Duration: {:.2}s", self.duration.as_secs_f64());
        println!("   ├─ Ticks: {}", self.ticks);
        println!(
            "   ├─ Pulses: {} generated, {} dropped, {} detected",
            self.pulses_generated, self.pulses_dropped, self.pulses_detected
        );
        println!("   ├─ Joint triples: {} ({:.2}/s)", self.triples, self.triple_rate());
        println!(
            "   ├─ Output events: {} sent, {} dropped ({:.2}%)",
            self.events_sent,
            self.events_dropped,
            self.output_drop_rate()
        );
        println!("   └─ Active sinks: {}", self.active_sinks);

        if self.pulses_overflowed > 0 {
            println!("\n⚠️  {} trigger messages overflowed", self.pulses_overflowed);
        }

        println!("\n{}", self.sync_metrics.summary());

        if !self.sink_metrics.is_empty() {
            println!("📤 Sinks");
            for (i, (name, snapshot)) in self.sink_metrics.iter().enumerate() {
                let prefix = if i == self.sink_metrics.len() - 1 { "└─" } else { "├─" };
                println!(
                    "   {} {}: {} written, {} failed, {} dropped",
                    prefix, name, snapshot.written, snapshot.failed, snapshot.dropped
                );
            }
        }

        println!();
    }
}
