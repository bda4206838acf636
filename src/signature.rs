//! Entry points for fingerprinting a file.

use crate::audio::decoder::SymphoniaSource;
use crate::audio::source::{AudioSource, SourceFormat};
use crate::config::FingerprintConfig;
use crate::error::{AudiosigError, Result};
use crate::fingerprint::{ChromaprintBackend, FingerprintBackend};
use crate::streaming::driver::StreamDriver;
use crate::streaming::frame::ChunkResult;
use std::path::Path;
use tracing::{debug, warn};

/// Fingerprints `path` with the Chromaprint backend and the symphonia decoder.
///
/// Returns one [`ChunkResult`] per chunk, or a single one when
/// `max_chunk_duration_seconds` is 0.
pub fn compute_fingerprints(
    path: impl AsRef<Path>,
    config: &FingerprintConfig,
) -> Result<Vec<ChunkResult>> {
    compute_fingerprints_with(path, config, ChromaprintBackend::new(), |path, hints| {
        SymphoniaSource::open(path, hints)
    })
}

/// Like [`compute_fingerprints`] with an explicit backend and source opener.
///
/// The opener receives the backend's preferred format as hints; the backend
/// is started with the format the opened source actually reports.
pub fn compute_fingerprints_with<B, S, F>(
    path: impl AsRef<Path>,
    config: &FingerprintConfig,
    backend: B,
    open: F,
) -> Result<Vec<ChunkResult>>
where
    B: FingerprintBackend,
    S: AudioSource,
    F: FnOnce(&Path, SourceFormat) -> Result<S>,
{
    let path = path.as_ref();
    config.validate()?;
    ensure_exists(path)?;

    let hints = SourceFormat {
        sample_rate: backend.preferred_sample_rate(),
        channels: backend.preferred_channels(),
    };
    let source = open(path, hints)?;
    debug!(path = %path.display(), "Fingerprinting");
    fingerprint_source(source, backend, config)
}

/// Runs an already opened source through `backend`.
pub fn fingerprint_source<S, B>(
    source: S,
    backend: B,
    config: &FingerprintConfig,
) -> Result<Vec<ChunkResult>>
where
    S: AudioSource,
    B: FingerprintBackend,
{
    config.validate()?;
    StreamDriver::new(source, backend, config).run()?.into_result()
}

/// Fingerprint of the first 120 seconds of `path` as one string.
///
/// Too-short or silent input is `Ok(None)`.
pub fn audio_signature(path: impl AsRef<Path>) -> Result<Option<String>> {
    match compute_fingerprints(path.as_ref(), &FingerprintConfig::default()) {
        Ok(chunks) => Ok(chunks.into_iter().find_map(|chunk| chunk.fingerprint)),
        Err(error) if error.is_soft() => {
            warn!("No fingerprint for {}: {}", path.as_ref().display(), error);
            Ok(None)
        }
        Err(error) => Err(error),
    }
}

fn ensure_exists(path: &Path) -> Result<()> {
    if path.is_file() {
        Ok(())
    } else {
        Err(AudiosigError::FileNotFound {
            path: path.display().to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::source::MockAudioSource;
    use crate::fingerprint::MockBackend;
    use std::sync::atomic::Ordering;
    use tempfile::NamedTempFile;

    #[test]
    fn test_missing_file_creates_no_session() {
        let backend = MockBackend::new();
        let sessions = backend.session_counter();
        let mut opened = false;

        let result = compute_fingerprints_with(
            "/nonexistent/audiosig/song.flac",
            &FingerprintConfig::default(),
            backend,
            |_, _| {
                opened = true;
                Ok(MockAudioSource::new(1000, 1))
            },
        );

        assert!(matches!(result, Err(AudiosigError::FileNotFound { .. })));
        assert!(!opened);
        assert_eq!(sessions.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_negotiates_hints_then_uses_actual_format() {
        let file = NamedTempFile::new().unwrap();
        let backend = MockBackend::new();
        let starts = backend.start_log();
        let mut seen_hints = None;

        let chunks = compute_fingerprints_with(
            file.path(),
            &FingerprintConfig::default(),
            backend,
            |_, hints| {
                seen_hints = Some(hints);
                Ok(MockAudioSource::new(44100, 2).with_duration(1.0, 4096))
            },
        )
        .unwrap();

        assert_eq!(
            seen_hints,
            Some(SourceFormat {
                sample_rate: 1000,
                channels: 1
            })
        );
        assert_eq!(*starts.lock().unwrap(), vec![(44100, 2)]);
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].duration, 1.0);
    }

    #[test]
    fn test_open_failure_is_returned() {
        let file = NamedTempFile::new().unwrap();
        let result = compute_fingerprints_with(
            file.path(),
            &FingerprintConfig::default(),
            MockBackend::new(),
            |path, _| -> Result<MockAudioSource> {
                Err(AudiosigError::SourceOpen {
                    path: path.display().to_string(),
                    message: "unsupported".to_string(),
                })
            },
        );
        assert!(matches!(result, Err(AudiosigError::SourceOpen { .. })));
    }

    #[test]
    fn test_invalid_config_rejected_before_open() {
        let config = FingerprintConfig {
            start_timestamp_seconds: f64::NAN,
            ..FingerprintConfig::default()
        };
        let result = fingerprint_source(
            MockAudioSource::new(1000, 1).with_duration(1.0, 100),
            MockBackend::new(),
            &config,
        );
        assert!(matches!(
            result,
            Err(AudiosigError::ConfigInvalidValue { .. })
        ));
    }

    #[test]
    fn test_read_failure_carries_partial_chunk() {
        let source = MockAudioSource::new(1000, 1)
            .with_duration(60.0, 1000)
            .with_read_failure_after(5);
        let config = FingerprintConfig {
            max_total_duration_seconds: 0,
            ..FingerprintConfig::default()
        };

        let err = fingerprint_source(source, MockBackend::new(), &config).unwrap_err();
        let partial = err.partial_results();
        assert_eq!(partial.len(), 1);
        assert_eq!(partial[0].duration, 5.0);
        assert!(partial[0].has_fingerprint());
    }

    #[test]
    fn test_compute_fingerprints_missing_file() {
        let config = FingerprintConfig::default();
        let err = compute_fingerprints("/nonexistent/audiosig/intro.mp3", &config).unwrap_err();
        assert!(
            matches!(err, AudiosigError::FileNotFound { ref path } if path.ends_with("intro.mp3"))
        );
    }

    #[test]
    fn test_audio_signature_missing_file_is_error() {
        let result = audio_signature("/nonexistent/audiosig/song.mp3");
        assert!(matches!(result, Err(AudiosigError::FileNotFound { .. })));
    }
}
