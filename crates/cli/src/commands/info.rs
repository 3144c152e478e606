//! `info` command implementation.

use anyhow::{Context, Result};
use contracts::{DeploymentBlueprint, JointSlot};
use serde::Serialize;
use tracing::info;

use crate::cli::InfoArgs;

/// Configuration info for JSON output
#[derive(Serialize)]
struct ConfigInfo {
    version: String,
    synchronizer: SynchronizerInfo,
    joints: Vec<JointInfo>,
    #[serde(skip_serializing_if = "Option::is_none")]
    simulation: Option<SimulationInfo>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    sinks: Vec<SinkInfo>,
}

#[derive(Serialize)]
struct SynchronizerInfo {
    resync_timeout_us: u64,
    settle_delay_us: u64,
}

#[derive(Serialize)]
struct JointInfo {
    slot: &'static str,
    name: String,
    peer: String,
    connected: bool,
}

#[derive(Serialize)]
struct SimulationInfo {
    tick_period_us: u64,
    pulse_period_us: u64,
    pulse_jitter_us: u64,
    pulse_drop_probability: f64,
    pulse_sources: Vec<&'static str>,
    response_delay_us: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    seed: Option<u64>,
}

#[derive(Serialize)]
struct SinkInfo {
    name: String,
    sink_type: String,
    queue_capacity: usize,
}

/// Execute the `info` command
pub fn run_info(args: &InfoArgs) -> Result<()> {
    info!(config = %args.config.display(), "Loading configuration info");

    if !args.config.exists() {
        anyhow::bail!("Configuration file not found: {}", args.config.display());
    }

    let blueprint = config_loader::ConfigLoader::load_from_path(&args.config)
        .with_context(|| format!("Failed to load config from {}", args.config.display()))?;

    if args.json {
        let info = build_config_info(&blueprint, args);
        let json =
            serde_json::to_string_pretty(&info).context("Failed to serialize config info")?;
        println!("{}", json);
    } else {
        print_config_info(&blueprint, args);
    }

    Ok(())
}

fn joint_infos(blueprint: &DeploymentBlueprint) -> Vec<JointInfo> {
    JointSlot::ALL
        .iter()
        .map(|&slot| JointInfo {
            slot: slot.as_str(),
            name: blueprint.synchronizer.joint_names.get(slot).to_string(),
            peer: blueprint.peers.get(slot).to_string(),
            connected: !blueprint.simulation.disconnected_joints.contains(&slot),
        })
        .collect()
}

fn build_config_info(blueprint: &DeploymentBlueprint, args: &InfoArgs) -> ConfigInfo {
    let sim = &blueprint.simulation;

    let simulation = args.simulation.then(|| SimulationInfo {
        tick_period_us: sim.tick_period_us,
        pulse_period_us: sim.pulse_period_us,
        pulse_jitter_us: sim.pulse_jitter_us,
        pulse_drop_probability: sim.pulse_drop_probability,
        pulse_sources: sim.pulse_sources.iter().map(|kind| kind.as_str()).collect(),
        response_delay_us: sim.response_delay_us,
        seed: sim.seed,
    });

    let sinks = if args.sinks {
        blueprint
            .sinks
            .iter()
            .map(|s| SinkInfo {
                name: s.name.clone(),
                sink_type: format!("{:?}", s.sink_type),
                queue_capacity: s.queue_capacity,
            })
            .collect()
    } else {
        Vec::new()
    };

    ConfigInfo {
        version: format!("{:?}", blueprint.version),
        synchronizer: SynchronizerInfo {
            resync_timeout_us: blueprint.synchronizer.resync_timeout_us,
            settle_delay_us: blueprint.synchronizer.settle_delay_us,
        },
        joints: joint_infos(blueprint),
        simulation,
        sinks,
    }
}

fn print_config_info(blueprint: &DeploymentBlueprint, args: &InfoArgs) {
    println!("╔══════════════════════════════════════════════════════════════╗");
    println!("║               Joint Syncer Configuration                     ║");
    println!("╚══════════════════════════════════════════════════════════════╝\n");

    let sync = &blueprint.synchronizer;
    println!("⚙️  Synchronizer");
    println!("   ├─ Version: {:?}", blueprint.version);
    println!("   ├─ Resync timeout: {:?}", sync.resync_timeout());
    println!("   └─ Settle delay: {:?}", sync.settle_delay());

    let joints = joint_infos(blueprint);
    println!("\n🦾 Joints ({})", joints.len());
    for (i, joint) in joints.iter().enumerate() {
        let prefix = if i == joints.len() - 1 { "└─" } else { "├─" };
        let status = if joint.connected { "" } else { " [disconnected]" };
        println!(
            "   {} {}: {} <- {}{}",
            prefix, joint.slot, joint.name, joint.peer, status
        );
    }

    if args.simulation {
        let sim = &blueprint.simulation;
        let sources: Vec<&str> = sim.pulse_sources.iter().map(|kind| kind.as_str()).collect();
        println!("\n⏱  Simulation");
        println!("   ├─ Tick period: {} µs", sim.tick_period_us);
        println!(
            "   ├─ Pulse period: {} µs (±{} µs, drop {:.1}%)",
            sim.pulse_period_us,
            sim.pulse_jitter_us,
            sim.pulse_drop_probability * 100.0
        );
        println!("   ├─ Pulse sources: {}", sources.join(" > "));
        println!("   ├─ Motor response delay: {} µs", sim.response_delay_us);
        match sim.seed {
            Some(seed) => println!("   └─ Seed: {}", seed),
            None => println!("   └─ Seed: (entropy)"),
        }
    }

    if args.sinks && !blueprint.sinks.is_empty() {
        println!("\n📤 Sinks ({})", blueprint.sinks.len());
        for (i, sink) in blueprint.sinks.iter().enumerate() {
            let prefix = if i == blueprint.sinks.len() - 1 { "└─" } else { "├─" };
            println!(
                "   {} {} ({:?}, queue {})",
                prefix, sink.name, sink.sink_type, sink.queue_capacity
            );
        }
    }

    println!();
}
