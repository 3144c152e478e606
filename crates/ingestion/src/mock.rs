//! 仿真电机与同步脉冲发生器
//!
//! 用于无硬件环境的 dry run 与测试。

use std::collections::VecDeque;
use std::f64::consts::TAU;
use std::sync::Arc;
use std::time::Duration;

use contracts::{Clock, JointSample, JointSlot, JointState, PeerDriver, SyncPulse, Timestamp};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tokio::sync::broadcast::{self, error::TryRecvError};
use tracing::{debug, trace, warn};

use crate::JointPortWriter;

/// 仿真电机参数
#[derive(Debug, Clone)]
pub struct MotorProfile {
    /// 收到同步后多久上报关节状态
    pub response_delay: Duration,

    /// 轨迹幅值 (rad)
    pub amplitude_rad: f64,

    /// 轨迹频率 (Hz)
    pub trajectory_hz: f64,
}

impl Default for MotorProfile {
    fn default() -> Self {
        Self {
            response_delay: Duration::from_micros(1_500),
            amplitude_rad: 0.5,
            trajectory_hz: 0.2,
        }
    }
}

/// 仿真电机驱动
///
/// 监听同步总线，每个同步脉冲在 `response_delay` 之后写出一个关节样本。
/// 轨迹为正弦，三个关节相位错开。没有写端口时表示该关节未连接。
pub struct SimulatedMotor {
    name: String,
    slot: JointSlot,
    profile: MotorProfile,
    clock: Arc<dyn Clock>,
    bus: broadcast::Receiver<SyncPulse>,
    port: Option<JointPortWriter>,
    /// 待响应的同步 (到期时间)
    pending: VecDeque<Timestamp>,
    samples_written: u64,
}

impl SimulatedMotor {
    pub fn new(
        name: impl Into<String>,
        slot: JointSlot,
        profile: MotorProfile,
        clock: Arc<dyn Clock>,
        bus: broadcast::Receiver<SyncPulse>,
        port: Option<JointPortWriter>,
    ) -> Self {
        Self {
            name: name.into(),
            slot,
            profile,
            clock,
            bus,
            port,
            pending: VecDeque::new(),
            samples_written: 0,
        }
    }

    pub fn slot(&self) -> JointSlot {
        self.slot
    }

    pub fn samples_written(&self) -> u64 {
        self.samples_written
    }

    /// 在时刻 `time` 的关节状态
    pub fn state_at(&self, time: Timestamp) -> JointState {
        let phase = self.slot.index() as f64 * TAU / 3.0;
        let omega = TAU * self.profile.trajectory_hz;
        let t = time.as_secs_f64();
        JointState {
            position: Some(self.profile.amplitude_rad * (omega * t + phase).sin()),
            speed: Some(self.profile.amplitude_rad * omega * (omega * t + phase).cos()),
            effort: None,
        }
    }

    fn drain_bus(&mut self) {
        loop {
            match self.bus.try_recv() {
                Ok(pulse) => {
                    self.pending.push_back(pulse.time + self.profile.response_delay);
                }
                Err(TryRecvError::Empty) | Err(TryRecvError::Closed) => break,
                Err(TryRecvError::Lagged(missed)) => {
                    warn!(motor = %self.name, missed, "sync bus lagged");
                }
            }
        }
    }
}

impl PeerDriver for SimulatedMotor {
    fn name(&self) -> &str {
        &self.name
    }

    fn update(&mut self) {
        self.drain_bus();

        let now = self.clock.now();
        while let Some(&due) = self.pending.front() {
            if due > now {
                break;
            }
            self.pending.pop_front();

            let sample = JointSample {
                time: due,
                state: self.state_at(due),
            };
            if let Some(port) = self.port.as_mut() {
                if port.write(sample) {
                    self.samples_written += 1;
                    trace!(motor = %self.name, time = %due, "joint sample written");
                }
            }
        }
    }
}

impl std::fmt::Debug for SimulatedMotor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SimulatedMotor")
            .field("name", &self.name)
            .field("slot", &self.slot)
            .field("connected", &self.port.is_some())
            .field("pending", &self.pending.len())
            .finish()
    }
}

/// 脉冲发生器参数
#[derive(Debug, Clone)]
pub struct PulseProfile {
    /// 标称周期
    pub period: Duration,

    /// 抖动上限 (均匀分布于 ±jitter)
    pub jitter: Duration,

    /// 丢失概率
    pub drop_probability: f64,
}

/// 同步脉冲发生器
///
/// 每个 tick 询问一次是否触发。到期后按周期加抖动安排下一次，
/// 按 `drop_probability` 随机丢弃本次脉冲。
#[derive(Debug)]
pub struct PulseGenerator {
    profile: PulseProfile,
    next_due: Timestamp,
    rng: StdRng,
    generated: u64,
    dropped: u64,
}

impl PulseGenerator {
    pub fn new(profile: PulseProfile, start: Timestamp, seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        debug!(
            period_us = profile.period.as_micros() as u64,
            jitter_us = profile.jitter.as_micros() as u64,
            drop_probability = profile.drop_probability,
            "pulse generator created"
        );
        Self {
            profile,
            next_due: start,
            rng,
            generated: 0,
            dropped: 0,
        }
    }

    /// Returns the pulse time if a pulse fires at `now`.
    pub fn poll(&mut self, now: Timestamp) -> Option<Timestamp> {
        if now < self.next_due {
            return None;
        }
        self.next_due = self.schedule_after(now);

        if self.profile.drop_probability > 0.0
            && self.rng.random::<f64>() < self.profile.drop_probability
        {
            self.dropped += 1;
            trace!(%now, "pulse dropped");
            return None;
        }
        self.generated += 1;
        Some(now)
    }

    pub fn next_due(&self) -> Timestamp {
        self.next_due
    }

    pub fn generated(&self) -> u64 {
        self.generated
    }

    pub fn dropped(&self) -> u64 {
        self.dropped
    }

    fn schedule_after(&mut self, now: Timestamp) -> Timestamp {
        let period = self.profile.period.as_micros() as i64;
        let jitter = self.profile.jitter.as_micros() as i64;
        let offset = if jitter > 0 {
            self.rng.random_range(-jitter..=jitter)
        } else {
            0
        };
        let delay = (period + offset).max(1) as u64;
        Timestamp::from_micros(now.as_micros().saturating_add(delay))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::joint_port;
    use contracts::{JointFeed, ManualClock};

    fn motor(
        slot: JointSlot,
        clock: &ManualClock,
        bus: &broadcast::Sender<SyncPulse>,
        port: Option<JointPortWriter>,
    ) -> SimulatedMotor {
        SimulatedMotor::new(
            format!("{slot}_motor_r"),
            slot,
            MotorProfile::default(),
            Arc::new(clock.clone()),
            bus.subscribe(),
            port,
        )
    }

    #[test]
    fn test_motor_answers_after_response_delay() {
        let clock = ManualClock::starting_at(Timestamp::from_millis(100));
        let (bus, _keep) = broadcast::channel(8);
        let (writer, mut reader) = joint_port("yaw", 8).unwrap();
        let mut motor = motor(JointSlot::Yaw, &clock, &bus, Some(writer));

        bus.send(SyncPulse::at(clock.now())).unwrap();
        motor.update();
        assert_eq!(reader.try_read(), None);

        clock.advance(Duration::from_micros(1_500));
        motor.update();
        let sample = reader.try_read().expect("sample after delay");
        assert_eq!(sample.time, Timestamp::from_micros(101_500));
        assert!(sample.state.position.is_some());
        assert_eq!(motor.samples_written(), 1);
    }

    #[test]
    fn test_motor_without_port_only_consumes_pulses() {
        let clock = ManualClock::new();
        let (bus, _keep) = broadcast::channel(8);
        let mut motor = motor(JointSlot::Roll, &clock, &bus, None);

        bus.send(SyncPulse::at(clock.now())).unwrap();
        clock.advance(Duration::from_millis(5));
        motor.update();
        assert_eq!(motor.samples_written(), 0);
    }

    #[test]
    fn test_trajectory_phases_differ_per_joint() {
        let clock = ManualClock::new();
        let (bus, _keep) = broadcast::channel(1);
        let yaw = motor(JointSlot::Yaw, &clock, &bus, None);
        let pitch = motor(JointSlot::Pitch, &clock, &bus, None);

        let t = Timestamp::from_millis(250);
        let yaw_position = yaw.state_at(t).position.unwrap();
        let pitch_position = pitch.state_at(t).position.unwrap();
        assert!((yaw_position - pitch_position).abs() > 1e-6);
        assert!(yaw_position.abs() <= 0.5);
    }

    #[test]
    fn test_generator_fires_on_period() {
        let profile = PulseProfile {
            period: Duration::from_millis(10),
            jitter: Duration::ZERO,
            drop_probability: 0.0,
        };
        let mut generator = PulseGenerator::new(profile, Timestamp::ZERO, Some(7));

        let fired: Vec<u64> = (0..=30)
            .map(Timestamp::from_millis)
            .filter_map(|now| generator.poll(now))
            .map(|time| time.as_micros() / 1000)
            .collect();

        assert_eq!(fired, vec![0, 10, 20, 30]);
        assert_eq!(generator.generated(), 4);
    }

    #[test]
    fn test_generator_jitter_stays_in_bounds() {
        let profile = PulseProfile {
            period: Duration::from_millis(10),
            jitter: Duration::from_millis(2),
            drop_probability: 0.0,
        };
        let mut generator = PulseGenerator::new(profile, Timestamp::ZERO, Some(42));

        for _ in 0..50 {
            let now = generator.next_due();
            assert!(generator.poll(now).is_some());
            let gap = generator.next_due() - now;
            assert!(gap >= Duration::from_millis(8) && gap <= Duration::from_millis(12));
        }
    }

    #[test]
    fn test_generator_drops_everything_at_probability_one() {
        let profile = PulseProfile {
            period: Duration::from_millis(1),
            jitter: Duration::ZERO,
            drop_probability: 1.0,
        };
        let mut generator = PulseGenerator::new(profile, Timestamp::ZERO, Some(1));
        for ms in 0..10 {
            assert_eq!(generator.poll(Timestamp::from_millis(ms)), None);
        }
        assert_eq!(generator.dropped(), 10);
    }
}
