//! Error types for audiosig.

use crate::streaming::frame::ChunkResult;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AudiosigError {
    // Input errors
    #[error("Audio file not found: {path}")]
    FileNotFound { path: String },

    #[error("Failed to open audio source {path}: {message}")]
    SourceOpen { path: String, message: String },

    /// Mid-stream read failure. Chunks harvested before the failure (including
    /// the chunk that was in progress) travel with the error.
    #[error("Audio read failed: {message}")]
    Read {
        message: String,
        partial: Vec<ChunkResult>,
    },

    #[error("Fingerprinting cancelled")]
    Cancelled,

    // Fingerprint backend errors
    #[error("Could not initialize the fingerprint backend: {message}")]
    BackendInit { message: String },

    #[error("Could not process audio data: {message}")]
    Feed { message: String },

    #[error("Could not finish the fingerprint session: {message}")]
    Finalize { message: String },

    #[error("Could not get the fingerprint: {message}")]
    FingerprintExtraction { message: String },

    // Soft outcomes
    #[error("Empty fingerprint")]
    EmptyFingerprint,

    #[error("Not enough audio data")]
    InsufficientAudio,

    // Configuration errors
    #[error("Failed to parse configuration: {message}")]
    ConfigParse { message: String },

    #[error("Invalid configuration value for {key}: {message}")]
    ConfigInvalidValue { key: String, message: String },

    #[error("Configuration error: {0}")]
    Config(#[from] toml::de::Error),

    // General I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Other(String),
}

impl AudiosigError {
    /// Too-short or silent input: callers decide whether that is acceptable.
    pub fn is_soft(&self) -> bool {
        matches!(
            self,
            AudiosigError::EmptyFingerprint | AudiosigError::InsufficientAudio
        )
    }

    /// Chunks harvested before a read failure; empty for every other error.
    pub fn partial_results(&self) -> &[ChunkResult] {
        match self {
            AudiosigError::Read { partial, .. } => partial,
            _ => &[],
        }
    }
}

pub type Result<T> = std::result::Result<T, AudiosigError>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    #[test]
    fn test_file_not_found_display() {
        let error = AudiosigError::FileNotFound {
            path: "/music/missing.flac".to_string(),
        };
        assert_eq!(error.to_string(), "Audio file not found: /music/missing.flac");
    }

    #[test]
    fn test_source_open_display() {
        let error = AudiosigError::SourceOpen {
            path: "song.xyz".to_string(),
            message: "unsupported format".to_string(),
        };
        assert_eq!(
            error.to_string(),
            "Failed to open audio source song.xyz: unsupported format"
        );
    }

    #[test]
    fn test_backend_errors_display() {
        let init = AudiosigError::BackendInit {
            message: "bad sample rate".to_string(),
        };
        assert_eq!(
            init.to_string(),
            "Could not initialize the fingerprint backend: bad sample rate"
        );

        let feed = AudiosigError::Feed {
            message: "no session".to_string(),
        };
        assert_eq!(feed.to_string(), "Could not process audio data: no session");
    }

    #[test]
    fn test_soft_errors() {
        assert!(AudiosigError::EmptyFingerprint.is_soft());
        assert!(AudiosigError::InsufficientAudio.is_soft());
        assert!(!AudiosigError::Cancelled.is_soft());
        assert!(
            !AudiosigError::FingerprintExtraction {
                message: "x".to_string()
            }
            .is_soft()
        );
    }

    #[test]
    fn test_partial_results_only_on_read_failure() {
        let chunk = ChunkResult {
            is_first: true,
            timestamp: 0.0,
            duration: 5.0,
            fingerprint: Some("AQAA".to_string()),
        };
        let read = AudiosigError::Read {
            message: "truncated packet".to_string(),
            partial: vec![chunk.clone()],
        };
        assert_eq!(read.partial_results(), &[chunk]);
        assert!(AudiosigError::InsufficientAudio.partial_results().is_empty());
    }

    #[test]
    fn test_from_io_error() {
        let io_error = io::Error::new(io::ErrorKind::NotFound, "file not found");
        let error: AudiosigError = io_error.into();
        assert!(error.to_string().contains("file not found"));
    }

    #[test]
    fn test_from_toml_error() {
        let toml_error = toml::from_str::<toml::Value>("invalid = toml = syntax").unwrap_err();
        let error: AudiosigError = toml_error.into();
        assert!(error.to_string().contains("Configuration error"));

        let error_trait: &dyn std::error::Error = &error;
        assert!(error_trait.source().is_some());
    }

    #[test]
    fn test_error_is_send_and_sync() {
        fn assert_send<T: Send>() {}
        fn assert_sync<T: Sync>() {}

        assert_send::<AudiosigError>();
        assert_sync::<AudiosigError>();
    }
}
