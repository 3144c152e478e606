//! `validate` command implementation.

use anyhow::{Context, Result};
use contracts::{DeploymentBlueprint, JointSlot};
use serde::Serialize;
use tracing::info;

use crate::cli::ValidateArgs;

/// Validation result for JSON output
#[derive(Serialize)]
struct ValidationResult {
    valid: bool,
    config_path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    warnings: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    summary: Option<ConfigSummary>,
}

#[derive(Serialize)]
struct ConfigSummary {
    version: String,
    resync_timeout_us: u64,
    pulse_sources: Vec<&'static str>,
    connected_joints: usize,
    sink_count: usize,
}

/// Execute the `validate` command
pub fn run_validate(args: &ValidateArgs) -> Result<()> {
    info!(config = %args.config.display(), "Validating configuration");

    let result = validate_config(args);

    if args.json {
        let json = serde_json::to_string_pretty(&result)
            .context("Failed to serialize validation result")?;
        println!("{}", json);
    } else {
        print_validation_result(&result);
    }

    if result.valid {
        Ok(())
    } else {
        anyhow::bail!("Configuration validation failed")
    }
}

fn validate_config(args: &ValidateArgs) -> ValidationResult {
    let config_path = args.config.display().to_string();

    if !args.config.exists() {
        return ValidationResult {
            valid: false,
            config_path,
            error: Some(format!("File not found: {}", args.config.display())),
            warnings: None,
            summary: None,
        };
    }

    match config_loader::ConfigLoader::load_from_path(&args.config) {
        Ok(blueprint) => {
            let warnings = collect_warnings(&blueprint);
            ValidationResult {
                valid: true,
                config_path,
                error: None,
                warnings: if warnings.is_empty() {
                    None
                } else {
                    Some(warnings)
                },
                summary: Some(ConfigSummary {
                    version: format!("{:?}", blueprint.version),
                    resync_timeout_us: blueprint.synchronizer.resync_timeout_us,
                    pulse_sources: blueprint
                        .simulation
                        .pulse_sources
                        .iter()
                        .map(|kind| kind.as_str())
                        .collect(),
                    connected_joints: JointSlot::ALL.len()
                        - blueprint.simulation.disconnected_joints.len(),
                    sink_count: blueprint.sinks.len(),
                }),
            }
        }
        Err(e) => ValidationResult {
            valid: false,
            config_path,
            error: Some(e.to_string()),
            warnings: None,
            summary: None,
        },
    }
}

/// Collect configuration warnings (non-fatal issues)
fn collect_warnings(blueprint: &DeploymentBlueprint) -> Vec<String> {
    let mut warnings = Vec::new();
    let sim = &blueprint.simulation;

    if blueprint.sinks.is_empty() {
        warnings.push("No sinks configured - joint triples will be dropped".to_string());
    }

    if sim.disconnected_joints.len() == JointSlot::ALL.len() {
        warnings.push("Every joint is disconnected - triples will only carry empty samples".to_string());
    }

    // Motors answering after the timeout never let a cycle finish in time
    if sim.response_delay_us >= blueprint.synchronizer.resync_timeout_us {
        warnings.push(format!(
            "simulation.response_delay_us ({}) >= synchronizer.resync_timeout_us ({}) - every cycle will time out",
            sim.response_delay_us, blueprint.synchronizer.resync_timeout_us
        ));
    }

    if sim.pulse_period_us > blueprint.synchronizer.resync_timeout_us {
        warnings.push(format!(
            "simulation.pulse_period_us ({}) > synchronizer.resync_timeout_us ({}) - pulses arrive after the timeout",
            sim.pulse_period_us, blueprint.synchronizer.resync_timeout_us
        ));
    }

    warnings
}

fn print_validation_result(result: &ValidationResult) {
    if result.valid {
        println!("✓ Configuration is valid: {}", result.config_path);

        if let Some(ref summary) = result.summary {
            println!("\n  Version: {}", summary.version);
            println!("  Resync timeout: {} µs", summary.resync_timeout_us);
            println!("  Pulse sources: {}", summary.pulse_sources.join(", "));
            println!("  Connected joints: {}", summary.connected_joints);
            println!("  Sinks: {}", summary.sink_count);
        }

        if let Some(ref warnings) = result.warnings {
            println!("\n⚠ Warnings:");
            for warning in warnings {
                println!("  - {}", warning);
            }
        }
    } else {
        println!("✗ Configuration is invalid: {}", result.config_path);
        if let Some(ref error) = result.error {
            println!("\n  Error: {}", error);
        }
    }
}
