//! Command-line interface for audiosig
//!
//! Provides argument parsing using clap derive macros.

use crate::config::{Config, OutputFormat};
use clap::{Parser, Subcommand};
use clap_complete::Shell;
use std::path::PathBuf;

/// Chunked acoustic fingerprints for audio files
#[derive(Parser, Debug)]
#[command(
    name = "audiosig",
    version,
    about = "Chunked acoustic fingerprints for audio files",
    args_conflicts_with_subcommands = true
)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Audio files to fingerprint ("-" reads a WAV stream from stdin)
    #[arg(value_name = "FILE")]
    pub files: Vec<String>,

    /// Path to configuration file
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Suppress log output (quiet mode)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Verbose output (-v: info, -vv: debug, -vvv: trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Maximum audio analysed per file (default: 120s). Examples: 300, 5m, 0 = whole file
    #[arg(long, short = 'l', value_name = "DURATION", value_parser = parse_duration_secs)]
    pub length: Option<u32>,

    /// Split the analysed audio into chunks of this duration (0 = single fingerprint)
    #[arg(long, short = 'c', value_name = "DURATION", value_parser = parse_duration_secs)]
    pub chunk: Option<u32>,

    /// Compensate the fingerprinter's lookback between chunks
    #[arg(long)]
    pub overlap: bool,

    /// Timestamp of the first chunk, in seconds
    #[arg(long = "ts", value_name = "SECONDS")]
    pub start_timestamp: Option<f64>,

    /// Output format
    #[arg(long, short = 'f', value_enum, value_name = "FORMAT")]
    pub format: Option<OutputFormat>,
}

/// Parse a duration string into whole seconds.
///
/// Supports any duration format accepted by `humantime`: bare numbers (seconds),
/// single-unit (`30s`, `5m`, `2h`), and compound (`1h30m`, `2m30s`).
fn parse_duration_secs(s: &str) -> Result<u32, String> {
    let s = s.trim();
    // Bare number → seconds
    if let Ok(secs) = s.parse::<u32>() {
        return Ok(secs);
    }
    let secs = humantime::parse_duration(s)
        .map(|d| d.as_secs())
        .map_err(|e| e.to_string())?;
    u32::try_from(secs).map_err(|_| format!("duration too long: {}s", secs))
}

impl Cli {
    /// Applies command-line overrides on top of a loaded configuration.
    pub fn apply_overrides(&self, mut config: Config) -> Config {
        if let Some(length) = self.length {
            config.fingerprint.max_total_duration_seconds = length;
        }
        if let Some(chunk) = self.chunk {
            config.fingerprint.max_chunk_duration_seconds = chunk;
        }
        if self.overlap {
            config.fingerprint.overlap_enabled = true;
        }
        if let Some(ts) = self.start_timestamp {
            config.fingerprint.start_timestamp_seconds = ts;
        }
        if let Some(format) = self.format {
            config.output.format = format;
        }
        config
    }
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// View configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        shell: Shell,
    },
}

/// Configuration actions
#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Print the effective configuration as TOML
    Show,
    /// Print the default configuration file path
    Path,
}
