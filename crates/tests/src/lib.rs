//! # Integration Tests
//!
//! 集成测试与端到端测试。
//!
//! 负责：
//! - 合约快照测试
//! - 仿真 e2e 测试（无需硬件）：仿真电机 -> 同步器 -> Dispatcher -> Sink
//! - 状态机场景：电机卡顿导致超时、重同步与跳过结算

#[cfg(test)]
mod contract_tests {
    use contracts::{JointSlot, PulseSourceKind, SyncEvent, SyncStats, Timestamp};

    #[test]
    fn test_contracts_compile() {
        let _ = contracts::ConfigVersion::V1;
    }

    #[test]
    fn test_wire_names_are_stable() {
        let slots: Vec<_> = JointSlot::ALL.iter().map(|slot| slot.as_str()).collect();
        assert_eq!(slots, ["yaw", "pitch", "roll"]);
        assert_eq!(
            PulseSourceKind::PRIORITY.map(PulseSourceKind::as_str),
            ["imu", "bus"]
        );

        let json = serde_json::to_value(SyncEvent::Stats(SyncStats {
            time: Timestamp::from_micros(1),
            lost_sync_periods: 0,
            skipped_sync: 0,
        }))
        .unwrap();
        assert_eq!(json["kind"], "stats");
    }
}

#[cfg(test)]
mod scenario_tests {
    use std::sync::Arc;
    use std::time::Duration;

    use contracts::{
        Clock, JointSample, JointSlot, JointState, ManualClock, PeerDriver, PeerNames,
        PulseSourceKind, SyncEvent, SyncState, SynchronizerConfig, Timestamp,
    };
    use dispatcher::event_channel;
    use ingestion::{
        joint_port, pulse_channel, JointPortWriter, MotorProfile, PulseTrigger, SimulatedMotor,
        SyncBus,
    };
    use sync_engine::{
        JointFeeds, JointSynchronizer, PeerRegistry, PeerSet, PulseOutcome, SynchronizerPorts,
        TickReport,
    };
    use tokio::sync::mpsc;

    /// Peer that never writes; its joint is fed by the test.
    struct IdleDriver(String);

    impl PeerDriver for IdleDriver {
        fn name(&self) -> &str {
            &self.0
        }

        fn update(&mut self) {}
    }

    /// Yaw is fed by hand, pitch and roll by simulated motors.
    struct StallRig {
        clock: ManualClock,
        synchronizer: JointSynchronizer,
        trigger: PulseTrigger,
        yaw: JointPortWriter,
        events: mpsc::Receiver<SyncEvent>,
    }

    impl StallRig {
        fn new() -> Self {
            let clock = ManualClock::starting_at(Timestamp::from_millis(1_000));
            let shared: Arc<dyn Clock> = Arc::new(clock.clone());
            let bus = SyncBus::new(16).unwrap();
            let names = PeerNames::default();

            let (yaw, yaw_feed) = joint_port("yaw", 16).unwrap();
            let (pitch_writer, pitch_feed) = joint_port("pitch", 16).unwrap();
            let (roll_writer, roll_feed) = joint_port("roll", 16).unwrap();

            let mut registry = PeerRegistry::new();
            registry.register(Box::new(IdleDriver(names.yaw.clone())));
            for (slot, writer) in [(JointSlot::Pitch, pitch_writer), (JointSlot::Roll, roll_writer)]
            {
                registry.register(Box::new(SimulatedMotor::new(
                    names.get(slot),
                    slot,
                    MotorProfile::default(),
                    Arc::clone(&shared),
                    bus.subscribe(),
                    Some(writer),
                )));
            }
            let peers = PeerSet::resolve(&mut registry, &names).unwrap();

            let (trigger, source) = pulse_channel(PulseSourceKind::Bus, 16).unwrap();
            let (output, events) = event_channel(1_024);
            let ports = SynchronizerPorts {
                pulse_sources: vec![Box::new(source)],
                pulse_emitter: Box::new(bus),
                joint_feeds: JointFeeds::new(
                    Box::new(yaw_feed),
                    Box::new(pitch_feed),
                    Box::new(roll_feed),
                ),
                output: Box::new(output),
            };
            let synchronizer =
                JointSynchronizer::start(SynchronizerConfig::default(), ports, peers, shared)
                    .unwrap();

            Self {
                clock,
                synchronizer,
                trigger,
                yaw,
                events,
            }
        }

        fn now(&self) -> Timestamp {
            self.clock.now()
        }

        fn step(&mut self) -> TickReport {
            let report = self.synchronizer.update();
            self.clock.advance(Duration::from_millis(1));
            report
        }

        fn pulse(&mut self) -> TickReport {
            assert!(self.trigger.fire(self.now()).unwrap());
            self.step()
        }

        fn feed_yaw(&mut self) {
            let sample = JointSample {
                time: self.now(),
                state: JointState::from_position(0.25),
            };
            assert!(self.yaw.write(sample));
        }

        fn advance_to(&mut self, ms: u64) {
            while self.now() < Timestamp::from_millis(ms) {
                let report = self.step();
                assert!(!report.completed, "unexpected completion at {}", self.now());
            }
        }

        fn step_until_complete(&mut self) -> TickReport {
            for _ in 0..20 {
                let report = self.step();
                if report.completed {
                    return report;
                }
            }
            panic!("cycle did not complete");
        }
    }

    #[test]
    fn test_stalled_joint_times_out_and_resyncs() {
        let mut rig = StallRig::new();

        // Initial synchronization
        assert_eq!(rig.pulse().pulse, Some(PulseOutcome::Restarted));
        rig.feed_yaw();
        let report = rig.step_until_complete();
        assert_eq!(report.state, SyncState::Running);
        assert!(report.emitted.is_none());

        // Yaw stalls: pitch and roll arrive, the cycle stays open
        rig.advance_to(1_010);
        assert_eq!(rig.pulse().pulse, Some(PulseOutcome::Started));
        rig.advance_to(1_015);
        let received = rig.synchronizer.received();
        assert!(received.contains(JointSlot::Pitch.mask()));
        assert!(received.contains(JointSlot::Roll.mask()));
        assert!(!received.contains(JointSlot::Yaw.mask()));

        // Within the timeout the pulse is skipped
        let report = rig.pulse();
        assert_eq!(report.pulse, Some(PulseOutcome::Skipped));
        assert_eq!(report.stats.skipped_sync, 1);

        // Past the timeout synchronization is lost and restarted
        rig.advance_to(1_030);
        let report = rig.pulse();
        assert_eq!(report.pulse, Some(PulseOutcome::TimedOut));
        assert_eq!(report.state, SyncState::LostSync);
        assert_eq!(report.stats.lost_sync_periods, 2);

        // Yaw recovers: the resync cycle completes and settles the skip
        rig.feed_yaw();
        let report = rig.step_until_complete();
        assert_eq!(report.state, SyncState::Running);
        assert!(report.emitted.is_none());
        let skip = report.skip.expect("pending skip resolved");
        assert_eq!(skip.sync_time, Timestamp::from_millis(1_015));
        assert!(skip.ready_at > skip.sync_time);

        // Triples resume, stamped with the resync pulse
        rig.advance_to(1_040);
        assert_eq!(rig.pulse().pulse, Some(PulseOutcome::Started));
        rig.feed_yaw();
        let triple = rig.step_until_complete().emitted.expect("triple");
        assert_eq!(triple.time, Timestamp::from_millis(1_030));
        assert_eq!(triple.get(JointSlot::Yaw).position, Some(0.25));
        assert!(triple.get(JointSlot::Pitch).position.is_some());

        let events: Vec<_> = std::iter::from_fn(|| rig.events.try_recv().ok()).collect();
        let joints = events.iter().filter(|e| matches!(e, SyncEvent::Joints(_))).count();
        let skips = events.iter().filter(|e| matches!(e, SyncEvent::Skip(_))).count();
        assert_eq!(joints, 1);
        assert_eq!(skips, 1);
    }

    #[test]
    fn test_missing_peer_refuses_to_start() {
        let mut registry = PeerRegistry::new();
        registry.register(Box::new(IdleDriver("yaw_motor_r".into())));
        registry.register(Box::new(IdleDriver("pitch_motor_r".into())));

        let err = PeerSet::resolve(&mut registry, &PeerNames::default()).unwrap_err();
        assert!(err.to_string().contains("roll_motor_r"));
    }
}

#[cfg(test)]
mod e2e_tests {
    use std::collections::HashMap;
    use std::io::BufRead;
    use std::sync::Arc;
    use std::time::Duration;

    use config_loader::{ConfigFormat, ConfigLoader};
    use contracts::{
        Clock, DeploymentBlueprint, JointFeed, JointSlot, ManualClock, PulseSource, SinkConfig,
        SinkType, SyncEvent, SyncState, Timestamp,
    };
    use dispatcher::{create_dispatcher, event_channel, ChannelOutput};
    use ingestion::{
        joint_port, pulse_channel, DisconnectedFeed, MotorProfile, PulseGenerator, PulseProfile,
        PulseTrigger, SimulatedMotor, SyncBus,
    };
    use observability::SyncMetricsAggregator;
    use sync_engine::{JointFeeds, JointSynchronizer, PeerRegistry, PeerSet, SynchronizerPorts};
    use tokio::sync::mpsc;

    /// Simulated head: generator -> pulse sources -> synchronizer -> motors.
    struct SimHead {
        clock: ManualClock,
        synchronizer: JointSynchronizer,
        triggers: Vec<PulseTrigger>,
        generator: PulseGenerator,
        aggregator: SyncMetricsAggregator,
    }

    impl SimHead {
        fn build(bp: &DeploymentBlueprint, output: ChannelOutput) -> Self {
            let clock = ManualClock::starting_at(Timestamp::from_millis(500));
            let shared: Arc<dyn Clock> = Arc::new(clock.clone());
            let sim = &bp.simulation;
            let bus = SyncBus::new(64).unwrap();
            let profile = MotorProfile {
                response_delay: Duration::from_micros(sim.response_delay_us),
                amplitude_rad: sim.amplitude_rad,
                trajectory_hz: sim.trajectory_hz,
            };

            let mut registry = PeerRegistry::new();
            let feeds = JointSlot::ALL.map(|slot| {
                let (port, feed) = if sim.disconnected_joints.contains(&slot) {
                    (None, Box::new(DisconnectedFeed) as Box<dyn JointFeed>)
                } else {
                    let (writer, reader) = joint_port(slot.as_str(), sim.port_capacity).unwrap();
                    (Some(writer), Box::new(reader) as Box<dyn JointFeed>)
                };
                registry.register(Box::new(SimulatedMotor::new(
                    bp.peers.get(slot),
                    slot,
                    profile.clone(),
                    Arc::clone(&shared),
                    bus.subscribe(),
                    port,
                )));
                feed
            });
            let [yaw, pitch, roll] = feeds;
            let peers = PeerSet::resolve(&mut registry, &bp.peers).unwrap();

            let mut triggers = Vec::new();
            let mut sources: Vec<Box<dyn PulseSource>> = Vec::new();
            for &kind in &sim.pulse_sources {
                let (trigger, source) = pulse_channel(kind, 64).unwrap();
                triggers.push(trigger);
                sources.push(Box::new(source));
            }

            let ports = SynchronizerPorts {
                pulse_sources: sources,
                pulse_emitter: Box::new(bus),
                joint_feeds: JointFeeds::new(yaw, pitch, roll),
                output: Box::new(output),
            };
            let synchronizer =
                JointSynchronizer::start(bp.synchronizer.clone(), ports, peers, Arc::clone(&shared))
                    .unwrap();
            let generator = PulseGenerator::new(
                PulseProfile {
                    period: Duration::from_micros(sim.pulse_period_us),
                    jitter: Duration::from_micros(sim.pulse_jitter_us),
                    drop_probability: sim.pulse_drop_probability,
                },
                clock.now(),
                sim.seed,
            );

            Self {
                clock,
                synchronizer,
                triggers,
                generator,
                aggregator: SyncMetricsAggregator::new(),
            }
        }

        fn run_ms(&mut self, ms: u64) {
            for _ in 0..ms {
                if let Some(time) = self.generator.poll(self.clock.now()) {
                    for trigger in &self.triggers {
                        trigger.fire(time).unwrap();
                    }
                }
                let report = self.synchronizer.update();
                if let Some(triple) = report.emitted {
                    self.aggregator.update(&SyncEvent::Joints(triple));
                }
                if let Some(skip) = report.skip {
                    self.aggregator.update(&SyncEvent::Skip(skip));
                }
                self.aggregator.update(&SyncEvent::Stats(report.stats));
                self.clock.advance(Duration::from_millis(1));
            }
        }
    }

    fn read_lines(path: &std::path::Path) -> Vec<serde_json::Value> {
        let file = std::fs::File::open(path).unwrap();
        std::io::BufReader::new(file)
            .lines()
            .map(|line| serde_json::from_str(&line.unwrap()).unwrap())
            .collect()
    }

    /// End-to-end: config -> simulated motors -> synchronizer -> dispatcher -> file sink
    #[tokio::test]
    async fn test_e2e_config_to_file_sink() {
        let dir = tempfile::tempdir().unwrap();
        let content = format!(
            r#"
[synchronizer]
resync_timeout_us = 10000

[simulation]
pulse_period_us = 10000
seed = 11

[[sinks]]
name = "recorder"
sink_type = "file"
queue_capacity = 1024
[sinks.params]
base_path = "{}"
include_stats = "true"

[[sinks]]
name = "log"
sink_type = "log"
queue_capacity = 1024
"#,
            dir.path().display()
        );
        let bp = ConfigLoader::load_from_str(&content, ConfigFormat::Toml).unwrap();

        let (output, events_rx) = event_channel(4_096);
        let dispatcher = create_dispatcher(bp.sinks.clone(), events_rx).unwrap();
        let dispatcher_handle = dispatcher.spawn();

        let mut head = SimHead::build(&bp, output);
        head.run_ms(200);
        assert_eq!(head.synchronizer.state(), SyncState::Running);

        let summary = head.aggregator.summary();
        assert!(summary.triples >= 15, "triples: {}", summary.triples);
        assert_eq!(summary.lost_sync_periods, 1);
        assert_eq!(summary.skipped_sync, 0);
        assert!((summary.triple_period_ms.mean - 10.0).abs() < 1e-6);

        // Dropping the synchronizer closes the dispatcher input
        drop(head);
        let metrics = tokio::time::timeout(Duration::from_secs(5), dispatcher_handle)
            .await
            .expect("dispatcher drained")
            .unwrap();
        assert_eq!(metrics.len(), 2);

        let joints = read_lines(&dir.path().join("joints.jsonl"));
        assert_eq!(joints.len() as u64, summary.triples);
        assert!(joints[0].get("kind").is_none());
        assert_eq!(joints[0]["names"].as_array().unwrap().len(), 3);
        assert!(joints[0]["elements"][0]["position"].is_number());

        let stats = read_lines(&dir.path().join("stats.jsonl"));
        assert!(!stats.is_empty());
        assert!(!dir.path().join("skips.jsonl").exists());
    }

    #[tokio::test]
    async fn test_e2e_disconnected_joint_and_jitter() {
        let mut bp = DeploymentBlueprint::default();
        bp.simulation.disconnected_joints = vec![JointSlot::Pitch];
        bp.simulation.pulse_jitter_us = 2_000;
        bp.simulation.seed = Some(5);

        let (output, mut events_rx) = event_channel(4_096);
        let mut head = SimHead::build(&bp, output);
        head.run_ms(150);

        let summary = head.aggregator.summary();
        assert!(summary.triples > 0);
        assert_eq!(summary.empty_joints[JointSlot::Pitch.index()], summary.triples);
        assert_eq!(summary.empty_joints[JointSlot::Yaw.index()], 0);
        assert_eq!(summary.lost_sync_periods, 1);

        let events: Vec<_> = std::iter::from_fn(|| events_rx.try_recv().ok()).collect();
        let last_stats = events
            .iter()
            .rev()
            .find_map(|event| match event {
                SyncEvent::Stats(stats) => Some(*stats),
                _ => None,
            })
            .unwrap();
        assert_eq!(last_stats.lost_sync_periods, 1);
    }

    /// Test dispatcher with multiple sink types
    #[tokio::test]
    async fn test_dispatcher_multiple_sinks() {
        let (tx, rx) = mpsc::channel::<SyncEvent>(10);

        let sink_configs = vec![
            SinkConfig {
                name: "log1".to_string(),
                sink_type: SinkType::Log,
                queue_capacity: 50,
                params: HashMap::new(),
            },
            SinkConfig {
                name: "log2".to_string(),
                sink_type: SinkType::Log,
                queue_capacity: 50,
                params: HashMap::new(),
            },
        ];

        let dispatcher = create_dispatcher(sink_configs, rx).unwrap();
        assert_eq!(dispatcher.metrics().len(), 2);
        let handle = dispatcher.spawn();

        for i in 0..5 {
            let event = SyncEvent::Stats(contracts::SyncStats {
                time: Timestamp::from_millis(i),
                lost_sync_periods: 0,
                skipped_sync: i,
            });
            tx.send(event).await.unwrap();
        }
        drop(tx);

        let metrics = tokio::time::timeout(Duration::from_secs(2), handle)
            .await
            .unwrap()
            .unwrap();
        for (_, snapshot) in metrics {
            assert_eq!(snapshot.written, 5);
        }
    }
}
