//! `run` command implementation.

use anyhow::{Context, Result};
use contracts::{DeploymentBlueprint, JointSlot};
use std::time::Duration;
use tracing::{info, warn};

use crate::cli::RunArgs;
use crate::pipeline::{Pipeline, PipelineConfig};

/// Execute the `run` command
pub async fn run_pipeline(args: &RunArgs) -> Result<()> {
    info!(config = %args.config.display(), "Loading configuration");

    if !args.config.exists() {
        anyhow::bail!("Configuration file not found: {}", args.config.display());
    }

    let mut blueprint = config_loader::ConfigLoader::load_from_path(&args.config)
        .with_context(|| format!("Failed to load config from {}", args.config.display()))?;

    apply_overrides(&mut blueprint, args)?;

    info!(
        resync_timeout_us = blueprint.synchronizer.resync_timeout_us,
        pulse_period_us = blueprint.simulation.pulse_period_us,
        disconnected = blueprint.simulation.disconnected_joints.len(),
        sinks = blueprint.sinks.len(),
        "Configuration loaded"
    );

    if args.dry_run {
        info!("Dry run mode - configuration is valid, exiting");
        print_config_summary(&blueprint);
        return Ok(());
    }

    let pipeline = Pipeline::new(PipelineConfig {
        blueprint,
        max_ticks: (args.max_ticks > 0).then_some(args.max_ticks),
        max_triples: (args.max_triples > 0).then_some(args.max_triples),
        timeout: (args.timeout > 0).then(|| Duration::from_secs(args.timeout)),
        buffer_size: args.buffer_size,
        metrics_port: (args.metrics_port > 0).then_some(args.metrics_port),
    });

    info!("Starting synchronizer...");
    let stats = pipeline
        .run(shutdown_signal())
        .await
        .context("Synchronizer run failed")?;

    info!(
        triples = stats.triples,
        ticks = stats.ticks,
        duration_secs = stats.duration.as_secs_f64(),
        "Synchronizer completed"
    );
    stats.print_summary();

    info!("Joint Syncer finished");
    Ok(())
}

/// Apply CLI overrides on top of the loaded configuration
fn apply_overrides(blueprint: &mut DeploymentBlueprint, args: &RunArgs) -> Result<()> {
    if let Some(ms) = args.resync_timeout_ms {
        if ms == 0 {
            anyhow::bail!("--resync-timeout-ms must be positive");
        }
        info!(resync_timeout_ms = ms, "Overriding resync timeout from CLI");
        blueprint.synchronizer = blueprint
            .synchronizer
            .clone()
            .with_resync_timeout(Duration::from_millis(ms));
    }
    if let Some(seed) = args.seed {
        info!(seed, "Overriding simulation seed from CLI");
        blueprint.simulation.seed = Some(seed);
    }
    Ok(())
}

/// Resolves on Ctrl+C or SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

/// Print configuration summary for dry-run mode
fn print_config_summary(blueprint: &DeploymentBlueprint) {
    println!("\n=== Configuration Summary ===\n");
    println!("Synchronizer:");
    println!("  Resync timeout: {:?}", blueprint.synchronizer.resync_timeout());
    println!("  Settle delay: {:?}", blueprint.synchronizer.settle_delay());

    println!("\nJoints:");
    for slot in JointSlot::ALL {
        let connected = !blueprint.simulation.disconnected_joints.contains(&slot);
        println!(
            "  - {} ({}) via {}{}",
            blueprint.synchronizer.joint_names.get(slot),
            slot,
            blueprint.peers.get(slot),
            if connected { "" } else { " [disconnected]" }
        );
    }

    let sources: Vec<&str> = blueprint
        .simulation
        .pulse_sources
        .iter()
        .map(|kind| kind.as_str())
        .collect();
    println!("\nPulse sources: {}", sources.join(", "));

    if !blueprint.sinks.is_empty() {
        println!("\nSinks ({}):", blueprint.sinks.len());
        for sink in &blueprint.sinks {
            println!("  - {} ({:?})", sink.name, sink.sink_type);
        }
    }

    println!();
}
