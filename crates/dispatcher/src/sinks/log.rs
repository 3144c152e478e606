//! LogSink - reports synchronizer events via tracing

use std::collections::HashMap;

use contracts::{ContractError, DataSink, SyncEvent};
use tracing::{debug, info, instrument, warn};

/// Sink that logs every event, for debugging and dry runs
pub struct LogSink {
    name: String,
    include_stats: bool,
}

impl LogSink {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            include_stats: false,
        }
    }

    /// `include_stats = "true"` also logs the per-tick statistics
    pub fn from_params(name: impl Into<String>, params: &HashMap<String, String>) -> Self {
        Self {
            name: name.into(),
            include_stats: params
                .get("include_stats")
                .is_some_and(|value| value == "true"),
        }
    }

    fn log_event(&self, event: &SyncEvent) {
        match event {
            SyncEvent::Joints(triple) => info!(
                sink = %self.name,
                time = %triple.time,
                yaw = ?triple.elements[0].position,
                pitch = ?triple.elements[1].position,
                roll = ?triple.elements[2].position,
                "joint triple"
            ),
            SyncEvent::Skip(skip) => warn!(
                sink = %self.name,
                sync_time = %skip.sync_time,
                latency_us = skip.latency().as_micros() as u64,
                "skipped sync resolved"
            ),
            SyncEvent::Stats(stats) if self.include_stats => debug!(
                sink = %self.name,
                lost_sync_periods = stats.lost_sync_periods,
                skipped_sync = stats.skipped_sync,
                "sync stats"
            ),
            SyncEvent::Stats(_) => {}
        }
    }
}

impl DataSink for LogSink {
    fn name(&self) -> &str {
        &self.name
    }

    #[instrument(
        name = "log_sink_write",
        level = "trace",
        skip(self, event),
        fields(sink = %self.name, kind = event.kind())
    )]
    async fn write(&mut self, event: &SyncEvent) -> Result<(), ContractError> {
        self.log_event(event);
        Ok(())
    }

    async fn flush(&mut self) -> Result<(), ContractError> {
        Ok(())
    }

    #[instrument(name = "log_sink_close", skip(self))]
    async fn close(&mut self) -> Result<(), ContractError> {
        info!(sink = %self.name, "LogSink closed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::{SkipEvent, SyncStats, Timestamp};

    #[tokio::test]
    async fn test_log_sink_accepts_every_kind() {
        let mut sink = LogSink::new("test_log");
        let events = [
            SyncEvent::Stats(SyncStats::default()),
            SyncEvent::Skip(SkipEvent {
                sync_time: Timestamp::ZERO,
                received_at: Timestamp::ZERO,
                ready_at: Timestamp::from_millis(1),
            }),
        ];
        for event in &events {
            assert!(sink.write(event).await.is_ok());
        }
    }

    #[test]
    fn test_log_sink_params() {
        let params = HashMap::from([("include_stats".to_string(), "true".to_string())]);
        let sink = LogSink::from_params("my_logger", &params);
        assert_eq!(sink.name(), "my_logger");
        assert!(sink.include_stats);
        assert!(!LogSink::new("quiet").include_stats);
    }
}
