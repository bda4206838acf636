//! Configuration file, environment overrides and validation.

use crate::defaults;
use crate::error::{AudiosigError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Root configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct Config {
    pub fingerprint: FingerprintConfig,
    pub output: OutputConfig,
}

/// Segmentation settings for one fingerprinting run
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct FingerprintConfig {
    /// Maximum audio analysed per file; 0 = whole file.
    pub max_total_duration_seconds: u32,
    /// Chunk length; 0 = one fingerprint for the whole analysed audio.
    pub max_chunk_duration_seconds: u32,
    /// Feed the backend's lookback into the first chunk and add it to every
    /// chunk duration.
    pub overlap_enabled: bool,
    /// Timestamp reported for the first chunk.
    pub start_timestamp_seconds: f64,
}

/// Output configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct OutputConfig {
    pub format: OutputFormat,
}

/// Output format enumeration
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// `KEY=value` lines, like fpcalc
    #[default]
    Text,
    /// Fingerprints only
    Plain,
    /// One JSON object per chunk
    Json,
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            OutputFormat::Text => "text",
            OutputFormat::Plain => "plain",
            OutputFormat::Json => "json",
        };
        f.write_str(name)
    }
}

impl FromStr for OutputFormat {
    type Err = AudiosigError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "text" => Ok(OutputFormat::Text),
            "plain" => Ok(OutputFormat::Plain),
            "json" => Ok(OutputFormat::Json),
            other => Err(AudiosigError::ConfigInvalidValue {
                key: "output.format".to_string(),
                message: format!("unknown format '{}' (expected text, plain or json)", other),
            }),
        }
    }
}

impl Default for FingerprintConfig {
    fn default() -> Self {
        Self {
            max_total_duration_seconds: defaults::MAX_TOTAL_DURATION_SECS,
            max_chunk_duration_seconds: defaults::MAX_CHUNK_DURATION_SECS,
            overlap_enabled: defaults::OVERLAP_ENABLED,
            start_timestamp_seconds: defaults::START_TIMESTAMP_SECS,
        }
    }
}

impl FingerprintConfig {
    /// Rejects values the segmentation cannot work with.
    pub fn validate(&self) -> Result<()> {
        if !self.start_timestamp_seconds.is_finite() || self.start_timestamp_seconds < 0.0 {
            return Err(AudiosigError::ConfigInvalidValue {
                key: "fingerprint.start_timestamp_seconds".to_string(),
                message: format!(
                    "must be a finite, non-negative number (got {})",
                    self.start_timestamp_seconds
                ),
            });
        }
        Ok(())
    }

    pub fn is_chunked(&self) -> bool {
        self.max_chunk_duration_seconds > 0
    }
}

impl Config {
    /// Load configuration from a TOML file
    ///
    /// Returns an error if the file contains invalid TOML.
    /// Missing fields will use default values.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;
        config.fingerprint.validate()?;
        Ok(config)
    }

    /// Load configuration from a file or return defaults if file doesn't exist
    ///
    /// Only returns defaults if the file is missing.
    /// Returns errors for invalid TOML.
    pub fn load_or_default(path: &Path) -> Result<Self> {
        match Self::load(path) {
            Err(AudiosigError::Io(e)) if e.kind() == std::io::ErrorKind::NotFound => {
                Ok(Self::default())
            }
            other => other,
        }
    }

    /// Apply environment variable overrides
    ///
    /// Supported environment variables:
    /// - AUDIOSIG_LENGTH → fingerprint.max_total_duration_seconds
    /// - AUDIOSIG_CHUNK → fingerprint.max_chunk_duration_seconds
    /// - AUDIOSIG_OVERLAP → fingerprint.overlap_enabled
    /// - AUDIOSIG_FORMAT → output.format
    ///
    /// Empty values are ignored; values that do not parse are an error.
    pub fn with_env_overrides(mut self) -> Result<Self> {
        if let Some(length) = env_value("AUDIOSIG_LENGTH") {
            self.fingerprint.max_total_duration_seconds = parse_seconds("AUDIOSIG_LENGTH", &length)?;
        }

        if let Some(chunk) = env_value("AUDIOSIG_CHUNK") {
            self.fingerprint.max_chunk_duration_seconds = parse_seconds("AUDIOSIG_CHUNK", &chunk)?;
        }

        if let Some(overlap) = env_value("AUDIOSIG_OVERLAP") {
            self.fingerprint.overlap_enabled = parse_bool("AUDIOSIG_OVERLAP", &overlap)?;
        }

        if let Some(format) = env_value("AUDIOSIG_FORMAT") {
            self.output.format = format.parse().map_err(|_| AudiosigError::ConfigInvalidValue {
                key: "AUDIOSIG_FORMAT".to_string(),
                message: format!("unknown format '{}' (expected text, plain or json)", format),
            })?;
        }

        Ok(self)
    }

    /// Get the default configuration file path
    ///
    /// Returns ~/.config/audiosig/config.toml on Linux, `None` when the
    /// platform has no config directory.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("audiosig").join("config.toml"))
    }

    /// Serialize back to TOML (for `config show`).
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| AudiosigError::ConfigParse {
            message: e.to_string(),
        })
    }
}

fn env_value(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|value| !value.is_empty())
}

fn parse_seconds(key: &str, value: &str) -> Result<u32> {
    value
        .trim()
        .parse()
        .map_err(|_| AudiosigError::ConfigInvalidValue {
            key: key.to_string(),
            message: format!("expected whole seconds, got '{}'", value),
        })
}

fn parse_bool(key: &str, value: &str) -> Result<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(AudiosigError::ConfigInvalidValue {
            key: key.to_string(),
            message: format!("expected a boolean, got '{}'", value),
        }),
    }
}
