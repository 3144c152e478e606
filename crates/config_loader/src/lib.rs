//! # Config Loader
//!
//! 部署配置加载：读取 TOML / JSON，解析为 `DeploymentBlueprint`，
//! 再做范围与语义校验。
//!
//! # Example
//!
//! ```no_run
//! use config_loader::ConfigLoader;
//! use std::path::Path;
//!
//! let blueprint = ConfigLoader::load_from_path(Path::new("heads.toml")).unwrap();
//! println!("timeout: {:?}", blueprint.synchronizer.resync_timeout());
//! ```

mod parser;
mod validator;

pub use contracts::DeploymentBlueprint;
pub use parser::ConfigFormat;

use contracts::ContractError;
use std::path::Path;
use tracing::debug;

/// Loads and checks deployment blueprints.
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load a blueprint from disk; the format follows the extension.
    ///
    /// # Errors
    /// Unreadable file, unknown extension, parse or validation failure.
    pub fn load_from_path(path: &Path) -> Result<DeploymentBlueprint, ContractError> {
        let format = ConfigFormat::from_path(path)?;
        let content = std::fs::read_to_string(path)?;
        debug!(path = %path.display(), ?format, bytes = content.len(), "config read");
        Self::load_from_str(&content, format)
    }

    /// Parse then validate.
    pub fn load_from_str(
        content: &str,
        format: ConfigFormat,
    ) -> Result<DeploymentBlueprint, ContractError> {
        let blueprint = parser::parse(content, format)?;
        validator::validate(&blueprint)?;
        debug!(
            sinks = blueprint.sinks.len(),
            pulse_sources = blueprint.simulation.pulse_sources.len(),
            "config validated"
        );
        Ok(blueprint)
    }

    /// 序列化为 TOML
    pub fn to_toml(blueprint: &DeploymentBlueprint) -> Result<String, ContractError> {
        toml::to_string_pretty(blueprint)
            .map_err(|e| ContractError::config_parse(format!("TOML serialize error: {e}")))
    }

    /// 序列化为 JSON
    pub fn to_json(blueprint: &DeploymentBlueprint) -> Result<String, ContractError> {
        serde_json::to_string_pretty(blueprint)
            .map_err(|e| ContractError::config_parse(format!("JSON serialize error: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::{JointSlot, PulseSourceKind, SinkType};
    use std::io::Write;
    use std::time::Duration;

    const HEADS_TOML: &str = r#"
[synchronizer]
resync_timeout_us = 10000

[synchronizer.joint_names]
yaw = "head_yaw"
pitch = "head_pitch"
roll = "head_roll"

[peers]
yaw = "yaw_motor_r"
pitch = "pitch_motor_r"
roll = "roll_motor_r"

[simulation]
pulse_period_us = 10000
pulse_sources = ["imu", "bus"]
seed = 42

[[sinks]]
name = "log_sink"
sink_type = "log"

[[sinks]]
name = "recorder"
sink_type = "file"
queue_capacity = 256
[sinks.params]
base_path = "./output"
"#;

    #[test]
    fn test_load_from_str_toml() {
        let bp = ConfigLoader::load_from_str(HEADS_TOML, ConfigFormat::Toml).unwrap();
        assert_eq!(bp.synchronizer.resync_timeout(), Duration::from_millis(10));
        assert_eq!(bp.synchronizer.joint_names.get(JointSlot::Pitch), "head_pitch");
        assert_eq!(
            bp.simulation.pulse_sources,
            vec![PulseSourceKind::Imu, PulseSourceKind::Bus]
        );
        assert_eq!(bp.simulation.seed, Some(42));
        assert_eq!(bp.sinks[1].sink_type, SinkType::File);
        assert_eq!(bp.sinks[1].params["base_path"], "./output");
    }

    #[test]
    fn test_round_trip_toml() {
        let bp = ConfigLoader::load_from_str(HEADS_TOML, ConfigFormat::Toml).unwrap();
        let serialized = ConfigLoader::to_toml(&bp).unwrap();
        let bp2 = ConfigLoader::load_from_str(&serialized, ConfigFormat::Toml).unwrap();
        assert_eq!(bp.synchronizer, bp2.synchronizer);
        assert_eq!(bp.simulation, bp2.simulation);
        assert_eq!(bp.sinks.len(), bp2.sinks.len());
    }

    #[test]
    fn test_round_trip_json() {
        let bp = ConfigLoader::load_from_str(HEADS_TOML, ConfigFormat::Toml).unwrap();
        let json = ConfigLoader::to_json(&bp).unwrap();
        let bp2 = ConfigLoader::load_from_str(&json, ConfigFormat::Json).unwrap();
        assert_eq!(bp.peers, bp2.peers);
    }

    #[test]
    fn test_validation_runs_after_parse() {
        let content = r#"
[synchronizer.joint_names]
yaw = "head"
pitch = "head"
"#;
        let result = ConfigLoader::load_from_str(content, ConfigFormat::Toml);
        assert!(result.unwrap_err().to_string().contains("duplicate"));
    }

    #[test]
    fn test_load_from_path() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        file.write_all(HEADS_TOML.as_bytes()).unwrap();

        let bp = ConfigLoader::load_from_path(file.path()).unwrap();
        assert_eq!(bp.sinks.len(), 2);
    }

    #[test]
    fn test_unsupported_extension() {
        let file = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
        let err = ConfigLoader::load_from_path(file.path()).unwrap_err();
        assert!(err.to_string().contains("unsupported"));
    }

    #[test]
    fn test_missing_file() {
        let result = ConfigLoader::load_from_path(Path::new("/nonexistent/heads.toml"));
        assert!(matches!(result, Err(ContractError::Io(_))));
    }
}
