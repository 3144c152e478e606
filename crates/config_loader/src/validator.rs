//! 配置校验模块
//!
//! 校验规则：
//! - 字段范围 (由 `validator` derive 规则给出)
//! - 关节名、peer 名、sink 名非空且唯一
//! - 脉冲周期不小于调度周期，抖动小于脉冲周期
//! - 至少一个触发源，且不重复
//! - 未连接关节不重复

use std::collections::HashSet;

use ::validator::Validate;
use contracts::{ContractError, DeploymentBlueprint, JointSlot};

/// 校验 DeploymentBlueprint 配置
///
/// 返回第一个遇到的错误，或 Ok(())。
pub fn validate(blueprint: &DeploymentBlueprint) -> Result<(), ContractError> {
    validate_ranges(blueprint)?;
    validate_joint_names(blueprint)?;
    validate_peer_names(blueprint)?;
    validate_timing(blueprint)?;
    validate_pulse_sources(blueprint)?;
    validate_disconnected_joints(blueprint)?;
    validate_sinks(blueprint)?;
    Ok(())
}

fn validate_ranges(blueprint: &DeploymentBlueprint) -> Result<(), ContractError> {
    blueprint
        .validate()
        .map_err(|e| ContractError::config_validation("blueprint", e.to_string()))
}

/// 一组名称非空且唯一
fn unique_names<'a>(
    section: &str,
    names: impl IntoIterator<Item = (String, &'a str)>,
) -> Result<(), ContractError> {
    let mut seen = HashSet::new();
    for (field, name) in names {
        if name.trim().is_empty() {
            return Err(ContractError::config_validation(
                format!("{section}.{field}"),
                "name cannot be empty",
            ));
        }
        if !seen.insert(name) {
            return Err(ContractError::config_validation(
                format!("{section}.{field}"),
                format!("duplicate name '{name}'"),
            ));
        }
    }
    Ok(())
}

fn validate_joint_names(blueprint: &DeploymentBlueprint) -> Result<(), ContractError> {
    let names = &blueprint.synchronizer.joint_names;
    unique_names(
        "synchronizer.joint_names",
        JointSlot::ALL.map(|slot| (slot.to_string(), names.get(slot))),
    )
}

fn validate_peer_names(blueprint: &DeploymentBlueprint) -> Result<(), ContractError> {
    let peers = &blueprint.peers;
    unique_names(
        "peers",
        JointSlot::ALL.map(|slot| (slot.to_string(), peers.get(slot))),
    )
}

fn validate_timing(blueprint: &DeploymentBlueprint) -> Result<(), ContractError> {
    let sim = &blueprint.simulation;

    if sim.pulse_period_us < sim.tick_period_us {
        return Err(ContractError::config_validation(
            "simulation.pulse_period_us",
            format!(
                "pulse period ({} µs) must be >= tick period ({} µs)",
                sim.pulse_period_us, sim.tick_period_us
            ),
        ));
    }

    if sim.pulse_jitter_us >= sim.pulse_period_us {
        return Err(ContractError::config_validation(
            "simulation.pulse_jitter_us",
            format!(
                "jitter ({} µs) must be < pulse period ({} µs)",
                sim.pulse_jitter_us, sim.pulse_period_us
            ),
        ));
    }

    Ok(())
}

fn validate_pulse_sources(blueprint: &DeploymentBlueprint) -> Result<(), ContractError> {
    let sources = &blueprint.simulation.pulse_sources;
    if sources.is_empty() {
        return Err(ContractError::config_validation(
            "simulation.pulse_sources",
            "at least one pulse source is required",
        ));
    }

    let mut seen = HashSet::new();
    for kind in sources {
        if !seen.insert(kind) {
            return Err(ContractError::config_validation(
                "simulation.pulse_sources",
                format!("duplicate pulse source '{}'", kind.as_str()),
            ));
        }
    }
    Ok(())
}

fn validate_disconnected_joints(blueprint: &DeploymentBlueprint) -> Result<(), ContractError> {
    let mut seen = HashSet::new();
    for slot in &blueprint.simulation.disconnected_joints {
        if !seen.insert(slot) {
            return Err(ContractError::config_validation(
                "simulation.disconnected_joints",
                format!("joint '{slot}' listed twice"),
            ));
        }
    }
    Ok(())
}

fn validate_sinks(blueprint: &DeploymentBlueprint) -> Result<(), ContractError> {
    unique_names(
        "sinks",
        blueprint
            .sinks
            .iter()
            .enumerate()
            .map(|(idx, sink)| (format!("[{idx}].name"), sink.name.as_str())),
    )?;

    for (idx, sink) in blueprint.sinks.iter().enumerate() {
        if sink.queue_capacity == 0 {
            return Err(ContractError::config_validation(
                format!("sinks[{idx}].queue_capacity"),
                "queue capacity must be > 0",
            ));
        }
    }
    Ok(())
}
