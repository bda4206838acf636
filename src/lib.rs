//! audiosig - Chunked acoustic fingerprints for audio files
//!
//! Streams decoded PCM through a Chromaprint-compatible fingerprinter in
//! bounded windows, optionally splitting long recordings into timestamped
//! chunks.

// Enforce error handling discipline
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]
#![warn(clippy::let_underscore_must_use)]

pub mod audio;
#[cfg(feature = "cli")]
pub mod cli;
pub mod config;
pub mod defaults;
pub mod error;
pub mod ffi;
pub mod fingerprint;
#[cfg(feature = "cli")]
pub mod logging;
pub mod output;
pub mod signature;
pub mod streaming;

// Core traits (source → segmentation → backend)
pub use audio::source::{AudioSource, SourceFormat};
pub use fingerprint::backend::FingerprintBackend;

// Entry points
pub use signature::{
    audio_signature, compute_fingerprints, compute_fingerprints_with, fingerprint_source,
};

// Segmentation
pub use streaming::{ChunkResult, DriverState, StreamDriver, StreamReport};

// Error handling
pub use error::{AudiosigError, Result};

// Config
pub use config::{Config, FingerprintConfig, OutputFormat};

/// Build version string with optional git commit hash.
///
/// Returns `"0.1.0+abc1234"` when git hash is available, `"0.1.0"` otherwise.
pub fn version_string() -> String {
    let version = env!("CARGO_PKG_VERSION");
    match option_env!("GIT_HASH") {
        Some(hash) if !hash.is_empty() => format!("{}+{}", version, hash),
        _ => version.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn version_string_starts_with_cargo_version() {
        let ver = version_string();
        assert!(
            ver.starts_with(env!("CARGO_PKG_VERSION")),
            "version_string should start with CARGO_PKG_VERSION, got: {}",
            ver
        );
    }

    #[test]
    fn version_string_has_hash_only_when_embedded() {
        let ver = version_string();
        if option_env!("GIT_HASH").is_some_and(|h| !h.is_empty()) {
            let hash_part = ver.split('+').nth(1).unwrap_or("");
            assert_eq!(hash_part.len(), 7, "Git hash should be 7 chars, got: {}", ver);
        } else {
            assert_eq!(ver, env!("CARGO_PKG_VERSION"));
        }
    }
}
