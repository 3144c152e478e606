//! DeploymentBlueprint - Config Loader 输出
//!
//! 描述完整的部署配置：同步器参数、电机驱动 peer、触发源仿真、输出路由。

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use validator::Validate;

use crate::{JointSlot, SynchronizerConfig};

/// 配置版本
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ConfigVersion {
    #[default]
    V1,
}

/// 完整的部署配置蓝图
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct DeploymentBlueprint {
    /// 配置版本
    #[serde(default)]
    pub version: ConfigVersion,

    /// 同步器参数
    #[serde(default)]
    #[validate(nested)]
    pub synchronizer: SynchronizerConfig,

    /// 三个电机驱动 peer 的名称
    #[serde(default)]
    pub peers: PeerNames,

    /// 仿真运行参数 (触发源、电机响应)
    #[serde(default)]
    #[validate(nested)]
    pub simulation: SimulationConfig,

    /// 输出路由配置
    #[serde(default)]
    pub sinks: Vec<SinkConfig>,
}

/// 电机驱动 peer 名称
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeerNames {
    #[serde(default = "default_yaw_peer")]
    pub yaw: String,
    #[serde(default = "default_pitch_peer")]
    pub pitch: String,
    #[serde(default = "default_roll_peer")]
    pub roll: String,
}

impl PeerNames {
    pub fn get(&self, slot: JointSlot) -> &str {
        match slot {
            JointSlot::Yaw => &self.yaw,
            JointSlot::Pitch => &self.pitch,
            JointSlot::Roll => &self.roll,
        }
    }
}

impl Default for PeerNames {
    fn default() -> Self {
        Self {
            yaw: default_yaw_peer(),
            pitch: default_pitch_peer(),
            roll: default_roll_peer(),
        }
    }
}

fn default_yaw_peer() -> String {
    "yaw_motor_r".to_string()
}

fn default_pitch_peer() -> String {
    "pitch_motor_r".to_string()
}

fn default_roll_peer() -> String {
    "roll_motor_r".to_string()
}

/// 触发源类型，按优先级排列 (IMU 优先)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PulseSourceKind {
    /// IMU 定时流，只取最新一条
    Imu,
    /// 总线同步消息流，逐条消费
    Bus,
}

impl PulseSourceKind {
    /// 优先级顺序
    pub const PRIORITY: [PulseSourceKind; 2] = [PulseSourceKind::Imu, PulseSourceKind::Bus];

    pub const fn as_str(self) -> &'static str {
        match self {
            PulseSourceKind::Imu => "imu",
            PulseSourceKind::Bus => "bus",
        }
    }
}

/// 仿真配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct SimulationConfig {
    /// 调度周期 (µs)
    #[serde(default = "default_tick_period_us")]
    #[validate(range(min = 100, max = 1_000_000))]
    pub tick_period_us: u64,

    /// 同步脉冲标称周期 (µs)
    #[serde(default = "default_pulse_period_us")]
    #[validate(range(min = 100, max = 10_000_000))]
    pub pulse_period_us: u64,

    /// 脉冲抖动上限 (µs, 均匀分布)
    #[serde(default)]
    pub pulse_jitter_us: u64,

    /// 脉冲丢失概率
    #[serde(default)]
    #[validate(range(min = 0.0, max = 1.0))]
    pub pulse_drop_probability: f64,

    /// 已连接的触发源
    #[serde(default = "default_pulse_sources")]
    pub pulse_sources: Vec<PulseSourceKind>,

    /// 电机响应延迟 (µs)
    #[serde(default = "default_response_delay_us")]
    #[validate(range(min = 1, max = 1_000_000))]
    pub response_delay_us: u64,

    /// 关节端口缓冲容量
    #[serde(default = "default_port_capacity")]
    #[validate(range(min = 1, max = 65_536))]
    pub port_capacity: usize,

    /// 未连接的关节
    #[serde(default)]
    pub disconnected_joints: Vec<JointSlot>,

    /// 轨迹幅值 (rad)
    #[serde(default = "default_amplitude_rad")]
    pub amplitude_rad: f64,

    /// 轨迹频率 (Hz)
    #[serde(default = "default_trajectory_hz")]
    #[validate(range(min = 0.0))]
    pub trajectory_hz: f64,

    /// 随机种子，缺省时取系统熵
    #[serde(default)]
    pub seed: Option<u64>,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            tick_period_us: default_tick_period_us(),
            pulse_period_us: default_pulse_period_us(),
            pulse_jitter_us: 0,
            pulse_drop_probability: 0.0,
            pulse_sources: default_pulse_sources(),
            response_delay_us: default_response_delay_us(),
            port_capacity: default_port_capacity(),
            disconnected_joints: Vec::new(),
            amplitude_rad: default_amplitude_rad(),
            trajectory_hz: default_trajectory_hz(),
            seed: None,
        }
    }
}

fn default_tick_period_us() -> u64 {
    1_000 // 1ms
}

fn default_pulse_period_us() -> u64 {
    10_000 // 10ms
}

fn default_pulse_sources() -> Vec<PulseSourceKind> {
    vec![PulseSourceKind::Bus]
}

fn default_response_delay_us() -> u64 {
    1_500
}

fn default_port_capacity() -> usize {
    16
}

fn default_amplitude_rad() -> f64 {
    0.5
}

fn default_trajectory_hz() -> f64 {
    0.2
}

/// Sink 输出配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SinkConfig {
    /// Sink 名称
    pub name: String,

    /// Sink 类型
    pub sink_type: SinkType,

    /// 队列容量
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,

    /// 类型特定参数
    #[serde(default)]
    pub params: HashMap<String, String>,
}

fn default_queue_capacity() -> usize {
    100
}

/// Sink 类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SinkType {
    /// 日志输出
    Log,
    /// JSON Lines 文件
    File,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_blueprint_uses_defaults() {
        let bp: DeploymentBlueprint = toml::from_str("").unwrap();
        assert_eq!(bp.version, ConfigVersion::V1);
        assert_eq!(bp.peers.get(JointSlot::Roll), "roll_motor_r");
        assert_eq!(bp.simulation.pulse_sources, vec![PulseSourceKind::Bus]);
        assert!(bp.sinks.is_empty());
        assert!(bp.validate().is_ok());
    }

    #[test]
    fn test_nested_validation() {
        let mut bp = DeploymentBlueprint::default();
        bp.simulation.pulse_drop_probability = 1.5;
        assert!(bp.validate().is_err());
    }

    #[test]
    fn test_disconnected_joints_parse() {
        let bp: DeploymentBlueprint = toml::from_str(
            r#"
[simulation]
disconnected_joints = ["pitch"]
pulse_sources = ["imu", "bus"]
"#,
        )
        .unwrap();
        assert_eq!(bp.simulation.disconnected_joints, vec![JointSlot::Pitch]);
        assert_eq!(bp.simulation.pulse_sources.len(), 2);
    }
}
