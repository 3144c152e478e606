//! CLI argument definitions using clap.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Joint Syncer - aligns yaw / pitch / roll motor feeds to a shared sync pulse
#[derive(Parser, Debug)]
#[command(
    name = "joint-syncer",
    author,
    version,
    about = "Head joint synchronizer",
    long_about = "Synchronizes three independently clocked joint feeds (yaw, pitch, roll)\n\
                  to a common sync pulse and publishes one joint triple per cycle.\n\n\
                  Runs against simulated motor drivers described in the configuration."
)]
pub struct Cli {
    /// Increase logging verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true, env = "JOINT_SYNCER_VERBOSE")]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Log output format
    #[arg(
        long,
        value_enum,
        default_value = "pretty",
        global = true,
        env = "JOINT_SYNCER_LOG_FORMAT"
    )]
    pub log_format: LogFormat,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the synchronizer against simulated motors
    Run(RunArgs),

    /// Validate configuration file without running
    Validate(ValidateArgs),

    /// Display configuration information
    Info(InfoArgs),
}

/// Arguments for the `run` command
#[derive(Parser, Debug, Clone)]
pub struct RunArgs {
    /// Path to configuration file (TOML or JSON)
    #[arg(
        short,
        long,
        default_value = "joint_syncer.toml",
        env = "JOINT_SYNCER_CONFIG"
    )]
    pub config: PathBuf,

    /// Override the resync timeout from configuration (milliseconds)
    #[arg(long, env = "JOINT_SYNCER_RESYNC_TIMEOUT_MS")]
    pub resync_timeout_ms: Option<u64>,

    /// Override the simulation seed from configuration
    #[arg(long, env = "JOINT_SYNCER_SEED")]
    pub seed: Option<u64>,

    /// Maximum number of scheduler ticks to run (0 = unlimited)
    #[arg(long, default_value = "0", env = "JOINT_SYNCER_MAX_TICKS")]
    pub max_ticks: u64,

    /// Stop after this many joint triples (0 = unlimited)
    #[arg(long, default_value = "0", env = "JOINT_SYNCER_MAX_TRIPLES")]
    pub max_triples: u64,

    /// Run timeout in seconds (0 = no timeout)
    #[arg(long, default_value = "0", env = "JOINT_SYNCER_TIMEOUT")]
    pub timeout: u64,

    /// Validate configuration and exit without running
    #[arg(long)]
    pub dry_run: bool,

    /// Capacity of the synchronizer output queue and pulse channels
    #[arg(long, default_value = "100", env = "JOINT_SYNCER_BUFFER_SIZE")]
    pub buffer_size: usize,

    /// Metrics server port (0 = disabled)
    #[arg(long, default_value = "0", env = "JOINT_SYNCER_METRICS_PORT")]
    pub metrics_port: u16,
}

/// Arguments for the `validate` command
#[derive(Parser, Debug)]
pub struct ValidateArgs {
    /// Path to configuration file to validate
    #[arg(short, long, default_value = "joint_syncer.toml")]
    pub config: PathBuf,

    /// Output validation result as JSON
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the `info` command
#[derive(Parser, Debug)]
pub struct InfoArgs {
    /// Path to configuration file
    #[arg(short, long, default_value = "joint_syncer.toml")]
    pub config: PathBuf,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,

    /// Show simulation parameters
    #[arg(long)]
    pub simulation: bool,

    /// Show sink configuration
    #[arg(long)]
    pub sinks: bool,
}

/// Log output format
#[derive(ValueEnum, Clone, Copy, Debug, Default)]
pub enum LogFormat {
    /// JSON structured logging
    Json,
    /// Human-readable pretty format
    #[default]
    Pretty,
    /// Compact single-line format
    Compact,
}

impl From<LogFormat> for observability::LogFormat {
    fn from(format: LogFormat) -> Self {
        match format {
            LogFormat::Json => observability::LogFormat::Json,
            LogFormat::Pretty => observability::LogFormat::Pretty,
            LogFormat::Compact => observability::LogFormat::Compact,
        }
    }
}
