//! 配置解析模块
//!
//! 支持 TOML (主要) 和 JSON (可选) 格式。

use contracts::{ContractError, DeploymentBlueprint};
use std::path::Path;

/// 配置文件格式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    /// TOML 格式 (推荐)
    Toml,
    /// JSON 格式
    Json,
}

impl ConfigFormat {
    /// 从文件扩展名推断格式
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "toml" => Some(Self::Toml),
            "json" => Some(Self::Json),
            _ => None,
        }
    }

    /// 从路径推断格式，无扩展名或不支持的扩展名报错
    pub fn from_path(path: &Path) -> Result<Self, ContractError> {
        let ext = path.extension().and_then(|e| e.to_str()).ok_or_else(|| {
            ContractError::config_parse(format!(
                "cannot determine config format of {}",
                path.display()
            ))
        })?;

        Self::from_extension(ext).ok_or_else(|| {
            ContractError::config_parse(format!("unsupported config format: .{ext}"))
        })
    }
}

/// 解析 TOML 格式配置
pub fn parse_toml(content: &str) -> Result<DeploymentBlueprint, ContractError> {
    toml::from_str(content).map_err(|e| ContractError::ConfigParse {
        message: format!("TOML parse error: {e}"),
        source: Some(Box::new(e)),
    })
}

/// 解析 JSON 格式配置
pub fn parse_json(content: &str) -> Result<DeploymentBlueprint, ContractError> {
    serde_json::from_str(content).map_err(|e| ContractError::ConfigParse {
        message: format!("JSON parse error: {e}"),
        source: Some(Box::new(e)),
    })
}

/// 根据格式解析配置
pub fn parse(content: &str, format: ConfigFormat) -> Result<DeploymentBlueprint, ContractError> {
    match format {
        ConfigFormat::Toml => parse_toml(content),
        ConfigFormat::Json => parse_json(content),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::{JointSlot, PulseSourceKind, SinkType};

    #[test]
    fn test_parse_toml_sections() {
        let content = r#"
[synchronizer]
resync_timeout_us = 20000

[synchronizer.joint_names]
yaw = "heads::yaw"
pitch = "heads::pitch"
roll = "heads::roll"

[peers]
yaw = "yaw_drive"

[simulation]
pulse_sources = ["imu", "bus"]
disconnected_joints = ["roll"]

[[sinks]]
name = "log_sink"
sink_type = "log"
"#;
        let bp = parse_toml(content).unwrap();
        assert_eq!(bp.synchronizer.resync_timeout_us, 20_000);
        assert_eq!(bp.synchronizer.settle_delay_us, 5_000);
        assert_eq!(bp.synchronizer.joint_names.get(JointSlot::Pitch), "heads::pitch");
        assert_eq!(bp.peers.get(JointSlot::Yaw), "yaw_drive");
        assert_eq!(bp.peers.get(JointSlot::Pitch), "pitch_motor_r");
        assert_eq!(
            bp.simulation.pulse_sources,
            vec![PulseSourceKind::Imu, PulseSourceKind::Bus]
        );
        assert_eq!(bp.simulation.disconnected_joints, vec![JointSlot::Roll]);
        assert_eq!(bp.sinks[0].sink_type, SinkType::Log);
    }

    #[test]
    fn test_parse_json_minimal() {
        let content = r#"{
            "synchronizer": { "resync_timeout_us": 15000 },
            "sinks": [{ "name": "log", "sink_type": "log" }]
        }"#;
        let bp = parse_json(content).unwrap();
        assert_eq!(bp.synchronizer.resync_timeout_us, 15_000);
        assert_eq!(bp.sinks[0].queue_capacity, 100);
    }

    #[test]
    fn test_parse_toml_syntax_error() {
        let err = parse_toml("invalid toml [[[").unwrap_err();
        assert!(matches!(err, ContractError::ConfigParse { .. }));
    }

    #[test]
    fn test_unknown_pulse_source_rejected() {
        let err = parse_toml("[simulation]\npulse_sources = [\"gps\"]").unwrap_err();
        assert!(err.to_string().contains("TOML parse error"));
    }

    #[test]
    fn test_format_from_extension() {
        assert_eq!(ConfigFormat::from_extension("toml"), Some(ConfigFormat::Toml));
        assert_eq!(ConfigFormat::from_extension("TOML"), Some(ConfigFormat::Toml));
        assert_eq!(ConfigFormat::from_extension("json"), Some(ConfigFormat::Json));
        assert_eq!(ConfigFormat::from_extension("yaml"), None);
    }
}
