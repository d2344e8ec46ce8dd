//! CLI argument definitions and shared statics.

use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use std::sync::OnceLock;

pub static FILE_GUARD: OnceLock<tracing_appender::non_blocking::WorkerGuard> = OnceLock::new();
/// Whether the user asked for JSON output (controls structured error output).
pub static JSON_MODE: OnceLock<bool> = OnceLock::new();

#[derive(Parser, Debug)]
#[command(name = "armrest", version, about = "Sensorized armrest force / CoP stream")]
pub struct Cli {
    /// Path to config TOML; built-in defaults when omitted
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Log (and report errors) as JSON instead of pretty text
    #[arg(long, action = ArgAction::SetTrue)]
    pub json: bool,

    /// Console log level (error|warn|info|debug|trace); overrides [logging].level
    #[arg(long = "log-level", value_name = "LEVEL")]
    pub log_level: Option<String>,

    /// Command to execute
    #[command(subcommand)]
    pub cmd: Commands,
}

/// Record encoding on stdout.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, ValueEnum)]
pub enum OutputFormat {
    /// Header line plus one CSV line per record
    #[default]
    Csv,
    /// One JSON object per record
    Jsonl,
}

/// Memory locking mode for real-time operation.
#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
pub enum RtLock {
    /// Do not lock memory
    None,
    /// Lock currently resident pages
    Current,
    /// Lock current and future pages
    All,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Zero the rig, then stream force / CoP records on stdout
    Stream {
        /// Stop after this many loop iterations (default: run until Ctrl-C)
        #[arg(long, value_name = "N")]
        iterations: Option<u64>,
        /// Output encoding
        #[arg(long, value_enum, default_value_t = OutputFormat::Csv)]
        format: OutputFormat,
        /// Pause between loop iterations in milliseconds (default: free-running)
        #[arg(long, value_name = "MS")]
        pace_ms: Option<u64>,
        /// Enable real-time mode (SCHED_FIFO, affinity, mlockall)
        #[arg(
            long,
            action = ArgAction::SetTrue,
            long_help = "Enable real-time mode on Linux.\n\nAttempts SCHED_FIFO priority, pins to one CPU, and locks memory (see --rt-lock). Needs CAP_SYS_NICE / CAP_IPC_LOCK or root; failures are reported as warnings and the stream continues."
        )]
        rt: bool,
        /// Real-time priority for SCHED_FIFO (1..=max)
        #[arg(long, value_name = "PRIO")]
        rt_prio: Option<i32>,
        /// Memory locking mode for --rt: none, current, or all (default: current)
        #[arg(long, value_enum, value_name = "MODE")]
        rt_lock: Option<RtLock>,
        /// CPU index to pin the process to (default: 0)
        #[arg(long, value_name = "CPU")]
        rt_cpu: Option<usize>,
    },
    /// Read every channel once and print the voltages
    SelfCheck,
    /// Derive calibration coefficients from reference-load measurements
    Calibrate {
        /// CSV with headers 'channel,raw_units' (response of each cell to the same load)
        #[arg(long, value_name = "FILE")]
        sensitivity: PathBuf,
        /// Known reference mass in kg (derives [scale] together with --corrected-raw-total)
        #[arg(long, value_name = "KG", requires = "corrected_raw_total")]
        known_kg: Option<f32>,
        /// Sum of sensitivity-corrected raw units measured under the reference mass
        #[arg(long, value_name = "UNITS", requires = "known_kg")]
        corrected_raw_total: Option<f32>,
    },
}
