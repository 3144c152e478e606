//! Joint synchronizer: the per-tick state machine.

use std::sync::Arc;

use contracts::{
    Clock, JointNames, JointTriple, PulseEmitter, PulseSource, ReceivedMask, SkipEvent,
    SyncOutput, SyncPulse, SyncState, SyncStats, SynchronizerConfig, Timestamp,
};
use tracing::{debug, info, instrument, warn};

use crate::collector::{JointCollector, JointFeeds};
use crate::cycle::{CycleState, EmissionGate, PendingSkip};
use crate::peers::PeerSet;
use crate::trigger::TriggerDetector;
use crate::SyncError;

/// Everything the synchronizer reads from and writes to.
pub struct SynchronizerPorts {
    /// Pulse sources, highest priority first
    pub pulse_sources: Vec<Box<dyn PulseSource>>,
    /// Where generated sync messages go
    pub pulse_emitter: Box<dyn PulseEmitter>,
    pub joint_feeds: JointFeeds,
    pub output: Box<dyn SyncOutput>,
}

/// Which transition a detected pulse caused.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PulseOutcome {
    /// New cycle opened while running with no cycle in progress
    Started,
    /// New cycle opened while synchronization was lost
    Restarted,
    /// Previous cycle exceeded the resync timeout, synchronization lost
    TimedOut,
    /// Previous cycle still collecting within the timeout
    Skipped,
}

impl PulseOutcome {
    pub const fn as_str(self) -> &'static str {
        match self {
            PulseOutcome::Started => "started",
            PulseOutcome::Restarted => "restarted",
            PulseOutcome::TimedOut => "timed_out",
            PulseOutcome::Skipped => "skipped",
        }
    }

    /// Whether a sync message was written to the bus.
    pub const fn emits_pulse(self) -> bool {
        !matches!(self, PulseOutcome::Skipped)
    }
}

/// What happened during one `update` call.
#[derive(Debug, Clone, PartialEq)]
pub struct TickReport {
    pub pulse: Option<PulseOutcome>,
    /// All three joints were collected this tick
    pub completed: bool,
    pub emitted: Option<JointTriple>,
    pub skip: Option<SkipEvent>,
    pub state: SyncState,
    pub stats: SyncStats,
}

/// Aligns the yaw, pitch and roll feeds to a shared sync pulse.
///
/// Owned by exactly one scheduler which calls [`update`](Self::update)
/// once per tick. Nothing inside a tick blocks except the settle delay
/// issued when synchronization is regained.
pub struct JointSynchronizer {
    config: SynchronizerConfig,
    names: [String; 3],
    clock: Arc<dyn Clock>,
    trigger: TriggerDetector,
    emitter: Box<dyn PulseEmitter>,
    collector: JointCollector,
    output: Box<dyn SyncOutput>,
    peers: PeerSet,
    state: SyncState,
    cycle: CycleState,
}

impl JointSynchronizer {
    /// Create all cycle state: LOST_SYNC, no timestamps, empty mask,
    /// zeroed counters.
    pub fn start(
        config: SynchronizerConfig,
        ports: SynchronizerPorts,
        peers: PeerSet,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, SyncError> {
        if config.resync_timeout_us == 0 {
            return Err(SyncError::invalid_config("resync timeout must be positive"));
        }

        let names = config.joint_names.to_array();
        info!(
            resync_timeout_us = config.resync_timeout_us,
            settle_delay_us = config.settle_delay_us,
            pulse_sources = ports.pulse_sources.len(),
            "joint synchronizer started"
        );

        Ok(Self {
            names,
            clock,
            trigger: TriggerDetector::new(ports.pulse_sources),
            emitter: ports.pulse_emitter,
            collector: JointCollector::new(ports.joint_feeds),
            output: ports.output,
            peers,
            state: SyncState::LostSync,
            cycle: CycleState::default(),
            config,
        })
    }

    /// Run one tick: peers, trigger, collection, aggregation, statistics.
    #[instrument(level = "trace", name = "joint_synchronizer_update", skip(self))]
    pub fn update(&mut self) -> TickReport {
        self.peers.update_all();

        let pulse = self.trigger.detect().map(|detected| {
            debug!(source = self.trigger.source_name(detected.source), "sync trigger");
            self.process_trigger()
        });

        let mut completed = false;
        let mut emitted = None;
        let mut skip = None;
        if let Some(sync_time) = self.cycle.current_sync {
            self.cycle.received = self.collector.poll(self.cycle.received, sync_time);
            if self.cycle.received.is_complete() {
                completed = true;
                (emitted, skip) = self.complete_cycle();
            }
        }

        let stats = self.publish_stats();
        TickReport {
            pulse,
            completed,
            emitted,
            skip,
            state: self.state,
            stats,
        }
    }

    /// Discard all cycle state and hand the ports back.
    pub fn stop(self) -> (SynchronizerPorts, PeerSet) {
        info!(
            lost_sync_periods = self.cycle.counters.lost_sync_periods,
            skipped_sync = self.cycle.counters.skipped_sync,
            "joint synchronizer stopped"
        );
        let ports = SynchronizerPorts {
            pulse_sources: self.trigger.into_sources(),
            pulse_emitter: self.emitter,
            joint_feeds: self.collector.into_feeds(),
            output: self.output,
        };
        (ports, self.peers)
    }

    pub fn state(&self) -> SyncState {
        self.state
    }

    /// Counters as of now.
    pub fn stats(&self) -> SyncStats {
        SyncStats {
            time: self.clock.now(),
            lost_sync_periods: self.cycle.counters.lost_sync_periods,
            skipped_sync: self.cycle.counters.skipped_sync,
        }
    }

    pub fn previous_sync_time(&self) -> Option<Timestamp> {
        self.cycle.previous_sync
    }

    pub fn current_sync_time(&self) -> Option<Timestamp> {
        self.cycle.current_sync
    }

    pub fn received(&self) -> ReceivedMask {
        self.cycle.received
    }

    pub fn emission_gate(&self) -> EmissionGate {
        self.cycle.gate
    }

    pub fn config(&self) -> &SynchronizerConfig {
        &self.config
    }

    pub fn joint_names(&self) -> &JointNames {
        &self.config.joint_names
    }

    fn process_trigger(&mut self) -> PulseOutcome {
        let now = self.clock.now();

        let outcome = match (self.state, self.cycle.current_sync) {
            (SyncState::LostSync, _) => {
                self.cycle.counters.lost_sync_periods += 1;
                PulseOutcome::Restarted
            }
            (SyncState::Running, Some(current)) => {
                let elapsed = now - current;
                if elapsed > self.config.resync_timeout() {
                    self.cycle.counters.lost_sync_periods += 1;
                    self.state = SyncState::LostSync;
                    warn!(
                        elapsed_us = elapsed.as_micros() as u64,
                        received = ?self.cycle.received,
                        "sync lost: cycle exceeded resync timeout"
                    );
                    metrics::counter!("joint_syncer_sync_lost_total").increment(1);
                    PulseOutcome::TimedOut
                } else {
                    self.cycle.counters.skipped_sync += 1;
                    self.cycle.pending_skip = Some(PendingSkip {
                        sync_time: now,
                        received_at: self.clock.now(),
                    });
                    warn!(
                        sync_time = %now,
                        cycle_start = %current,
                        received = ?self.cycle.received,
                        "sync pulse skipped: previous cycle unfinished"
                    );
                    PulseOutcome::Skipped
                }
            }
            (SyncState::Running, None) => PulseOutcome::Started,
        };

        if outcome.emits_pulse() {
            self.emitter.emit(SyncPulse::at(now));
            if outcome == PulseOutcome::Restarted {
                self.cycle.restart(now);
            } else {
                let seed = self.collector.initial_received();
                self.cycle.open(now, seed);
            }
        }

        metrics::counter!("joint_syncer_pulses_total", "outcome" => outcome.as_str())
            .increment(1);
        outcome
    }

    fn complete_cycle(&mut self) -> (Option<JointTriple>, Option<SkipEvent>) {
        let mut emitted = None;

        match self.state {
            SyncState::LostSync => {
                self.clock.sleep(self.config.settle_delay());
                self.collector.clear_feeds();
                self.state = SyncState::Running;
                self.cycle.gate = EmissionGate::suppress_once();
                info!(sync_time = ?self.cycle.current_sync, "sync regained");
                metrics::counter!("joint_syncer_resyncs_total").increment(1);
            }
            SyncState::Running => {
                if self.cycle.gate.admit() {
                    emitted = self.output_joint_state();
                } else {
                    debug!("joint triple suppressed after resync");
                }
            }
        }

        let skip = self.cycle.pending_skip.take().map(|pending| {
            let skip = SkipEvent {
                sync_time: pending.sync_time,
                received_at: pending.received_at,
                ready_at: self.clock.now(),
            };
            self.output.write_skip(&skip);
            skip
        });

        self.cycle.roll();
        (emitted, skip)
    }

    fn output_joint_state(&mut self) -> Option<JointTriple> {
        let Some(time) = self.cycle.previous_sync else {
            debug!("no previous sync time, joint triple not published");
            return None;
        };

        let triple = JointTriple {
            time,
            names: self.names.clone(),
            elements: *self.collector.samples(),
        };
        self.output.write_joints(&triple);
        metrics::counter!("joint_syncer_triples_total").increment(1);
        Some(triple)
    }

    fn publish_stats(&mut self) -> SyncStats {
        let stats = self.stats();
        self.output.write_stats(&stats);
        stats
    }
}

impl std::fmt::Debug for JointSynchronizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JointSynchronizer")
            .field("config", &self.config)
            .field("state", &self.state)
            .field("cycle", &self.cycle)
            .field("trigger", &self.trigger)
            .finish_non_exhaustive()
    }
}
