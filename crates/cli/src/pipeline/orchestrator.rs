//! Pipeline orchestrator - wires simulated motors, pulse sources, the
//! synchronizer and the dispatcher, then drives the tick loop.

use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use contracts::{
    Clock, DeploymentBlueprint, JointFeed, JointSlot, PulseSource, PulseSourceKind, SystemClock,
};
use dispatcher::{event_channel, ChannelOutput};
use ingestion::{
    joint_port, pulse_channel, DisconnectedFeed, MotorProfile, PulseGenerator, PulseProfile,
    PulseTrigger, SimulatedMotor, SyncBus,
};
use sync_engine::{
    JointFeeds, JointSynchronizer, PeerRegistry, PeerSet, SynchronizerPorts, TickReport,
};
use tokio::runtime::{Handle, RuntimeFlavor};
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use super::PipelineStats;

/// Pipeline configuration
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// The deployment blueprint
    pub blueprint: DeploymentBlueprint,

    /// Maximum number of ticks (None = unlimited)
    pub max_ticks: Option<u64>,

    /// Stop after this many triples (None = unlimited)
    pub max_triples: Option<u64>,

    /// Run timeout (None = no timeout)
    pub timeout: Option<Duration>,

    /// Output queue and pulse channel capacity
    pub buffer_size: usize,

    /// Metrics server port (None = disabled)
    pub metrics_port: Option<u16>,
}

/// Main pipeline orchestrator
pub struct Pipeline {
    config: PipelineConfig,
}

impl Pipeline {
    pub fn new(config: PipelineConfig) -> Self {
        Self { config }
    }

    /// Run until a limit is hit or `shutdown` resolves.
    pub async fn run(self, shutdown: impl Future<Output = ()>) -> Result<PipelineStats> {
        let start_time = Instant::now();
        let blueprint = &self.config.blueprint;

        if let Some(port) = self.config.metrics_port {
            observability::init_metrics_only(port)?;
            info!("Metrics endpoint available on port {}", port);
        }

        // Dispatcher
        let (output, events_rx) = event_channel(self.config.buffer_size);
        let counters = output.counters();

        if blueprint.sinks.is_empty() {
            warn!("No sinks configured - joint triples will be dropped");
        }

        let dispatcher = dispatcher::create_dispatcher(blueprint.sinks.clone(), events_rx)
            .context("Failed to create dispatcher")?;
        let active_sinks = dispatcher.sink_names().len();
        let dispatcher_handle = dispatcher.spawn();
        info!(active_sinks, "Dispatcher started");

        // Synchronizer
        let clock: Arc<dyn Clock> = Arc::new(SystemClock::new());
        let mut rig = Rig::assemble(blueprint, clock, output, self.config.buffer_size)?;

        let mut stats = PipelineStats {
            active_sinks,
            ..Default::default()
        };

        let tick_period = Duration::from_micros(blueprint.simulation.tick_period_us);
        let mut interval = tokio::time::interval(tick_period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

        let deadline = self.config.timeout;
        let timed_out = async move {
            match deadline {
                Some(timeout) => tokio::time::sleep(timeout).await,
                None => std::future::pending::<()>().await,
            }
        };
        tokio::pin!(shutdown);
        tokio::pin!(timed_out);

        info!(
            tick_period_us = blueprint.simulation.tick_period_us,
            max_ticks = ?self.config.max_ticks,
            max_triples = ?self.config.max_triples,
            "Synchronizer running"
        );

        loop {
            tokio::select! {
                _ = interval.tick() => {}
                _ = &mut shutdown => {
                    warn!("Received shutdown signal, stopping synchronizer...");
                    break;
                }
                _ = &mut timed_out => {
                    warn!(timeout_secs = deadline.map(|t| t.as_secs()), "Run timed out");
                    break;
                }
            }

            let report = tick_off_runtime(&mut rig, &mut stats);
            if report.emitted.is_some() {
                debug!(triples = stats.triples, "Joint triple published");
            }

            if self.limit_reached(&stats) {
                break;
            }
        }

        // Shutdown: dropping the synchronizer closes the dispatcher input
        info!("Shutting down synchronizer...");
        stats.pulses_generated = rig.generator.generated();
        stats.pulses_dropped = rig.generator.dropped();
        drop(rig);

        match tokio::time::timeout(Duration::from_secs(5), dispatcher_handle).await {
            Ok(Ok(sink_metrics)) => stats.sink_metrics = sink_metrics,
            Ok(Err(e)) => warn!(error = %e, "Dispatcher task failed"),
            Err(_) => warn!("Dispatcher did not drain within 5s"),
        }

        stats.events_sent = counters.sent();
        stats.events_dropped = counters.dropped();
        stats.duration = start_time.elapsed();

        info!(
            duration_secs = stats.duration.as_secs_f64(),
            triples = stats.triples,
            rate = format!("{:.2}", stats.triple_rate()),
            "Synchronizer shutdown complete"
        );

        Ok(stats)
    }

    fn limit_reached(&self, stats: &PipelineStats) -> bool {
        if let Some(max) = self.config.max_ticks {
            if stats.ticks >= max {
                info!(ticks = stats.ticks, "Reached max ticks limit");
                return true;
            }
        }
        if let Some(max) = self.config.max_triples {
            if stats.triples >= max {
                info!(triples = stats.triples, "Reached max triples limit");
                return true;
            }
        }
        false
    }
}

/// Everything one tick touches.
struct Rig {
    synchronizer: JointSynchronizer,
    triggers: Vec<PulseTrigger>,
    generator: PulseGenerator,
    clock: Arc<dyn Clock>,
}

impl Rig {
    fn assemble(
        blueprint: &DeploymentBlueprint,
        clock: Arc<dyn Clock>,
        output: ChannelOutput,
        buffer_size: usize,
    ) -> Result<Self> {
        let sim = &blueprint.simulation;
        let bus = SyncBus::new(buffer_size).context("Failed to create sync bus")?;
        let profile = MotorProfile {
            response_delay: Duration::from_micros(sim.response_delay_us),
            amplitude_rad: sim.amplitude_rad,
            trajectory_hz: sim.trajectory_hz,
        };

        // One simulated motor per joint; disconnected joints get a motor
        // with no port so the peer still resolves
        let mut registry = PeerRegistry::new();
        let mut connect = |slot: JointSlot| -> Result<Box<dyn JointFeed>> {
            let peer = blueprint.peers.get(slot);
            let (port, feed) = if sim.disconnected_joints.contains(&slot) {
                warn!(joint = %slot, peer, "Joint disconnected");
                (None, Box::new(DisconnectedFeed) as Box<dyn JointFeed>)
            } else {
                let (writer, reader) = joint_port(slot.as_str(), sim.port_capacity)
                    .with_context(|| format!("Failed to create {slot} joint port"))?;
                (Some(writer), Box::new(reader) as Box<dyn JointFeed>)
            };

            let motor = SimulatedMotor::new(
                peer,
                slot,
                profile.clone(),
                Arc::clone(&clock),
                bus.subscribe(),
                port,
            );
            if registry.register(Box::new(motor)).is_some() {
                warn!(peer, "Peer registered twice, keeping the latest");
            }
            Ok(feed)
        };
        let joint_feeds = JointFeeds::new(
            connect(JointSlot::Yaw)?,
            connect(JointSlot::Pitch)?,
            connect(JointSlot::Roll)?,
        );

        let peers = PeerSet::resolve(&mut registry, &blueprint.peers)?;

        // Pulse sources in priority order
        let mut triggers = Vec::new();
        let mut pulse_sources: Vec<Box<dyn PulseSource>> = Vec::new();
        for kind in PulseSourceKind::PRIORITY {
            if sim.pulse_sources.contains(&kind) {
                let (trigger, source) = pulse_channel(kind, buffer_size)
                    .with_context(|| format!("Failed to create {} pulse source", kind.as_str()))?;
                triggers.push(trigger);
                pulse_sources.push(Box::new(source));
            }
        }

        let ports = SynchronizerPorts {
            pulse_sources,
            pulse_emitter: Box::new(bus),
            joint_feeds,
            output: Box::new(output),
        };
        let synchronizer = JointSynchronizer::start(
            blueprint.synchronizer.clone(),
            ports,
            peers,
            Arc::clone(&clock),
        )?;

        let generator = PulseGenerator::new(
            PulseProfile {
                period: Duration::from_micros(sim.pulse_period_us),
                jitter: Duration::from_micros(sim.pulse_jitter_us),
                drop_probability: sim.pulse_drop_probability,
            },
            clock.now(),
            sim.seed,
        );

        info!(
            peers = ?synchronizer_peer_names(blueprint),
            pulse_sources = triggers.len(),
            "Synchronizer assembled"
        );

        Ok(Self {
            synchronizer,
            triggers,
            generator,
            clock,
        })
    }

    /// Fire any due pulse, then run one synchronizer update.
    fn tick(&mut self, stats: &mut PipelineStats) -> TickReport {
        let now = self.clock.now();
        if let Some(time) = self.generator.poll(now) {
            for trigger in &self.triggers {
                match trigger.fire(time) {
                    Ok(true) => {}
                    Ok(false) => stats.pulses_overflowed += 1,
                    Err(e) => warn!(error = %e, "Pulse trigger failed"),
                }
            }
        }

        let report = self.synchronizer.update();
        stats.record_tick(&report);
        report
    }
}

fn synchronizer_peer_names(blueprint: &DeploymentBlueprint) -> [&str; 3] {
    JointSlot::ALL.map(|slot| blueprint.peers.get(slot))
}

/// Run one tick without stalling the runtime.
///
/// A resync sleeps for the settle delay on the system clock, so on a
/// multi-threaded runtime the worker hands its other tasks off first.
/// `block_in_place` is not available on a current-thread runtime.
fn tick_off_runtime(rig: &mut Rig, stats: &mut PipelineStats) -> TickReport {
    match Handle::current().runtime_flavor() {
        RuntimeFlavor::MultiThread => tokio::task::block_in_place(|| rig.tick(stats)),
        _ => rig.tick(stats),
    }
}
