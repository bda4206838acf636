//! Chromaprint backend on top of `rusty-chromaprint`.
//!
//! Uses the AcoustID-compatible `preset_test2` algorithm. The engine resamples
//! and downmixes internally, so sessions can be started with whatever format
//! the audio source actually delivers.

use crate::defaults::{CHROMAPRINT_CHANNELS, CHROMAPRINT_SAMPLE_RATE};
use crate::error::{AudiosigError, Result};
use crate::fingerprint::backend::FingerprintBackend;
use crate::fingerprint::compress;
use rusty_chromaprint::{Configuration, Fingerprinter};

/// Algorithm id written into the compressed header for `preset_test2`.
pub const ALGORITHM_ID: u8 = 1;

/// Lookback of the algorithm, in samples at [`CHROMAPRINT_SAMPLE_RATE`]:
/// `(filter coefficients - 1 + max filter width - 1) * item duration + frame overlap`
/// = `(4 + 15) * 1365 + 2731`.
const DELAY_SAMPLES_NATIVE: usize = 28_666;

/// Chromaprint-backed [`FingerprintBackend`].
pub struct ChromaprintBackend {
    config: Configuration,
    session: Option<Session>,
}

struct Session {
    fingerprinter: Fingerprinter,
    sample_rate: u32,
    finished: bool,
}

impl ChromaprintBackend {
    pub fn new() -> Self {
        Self {
            config: Configuration::preset_test2(),
            session: None,
        }
    }

    /// Raw sub-fingerprints of the finished session.
    pub fn raw_fingerprint(&self) -> Result<&[u32]> {
        let session = self.finished_session()?;
        Ok(session.fingerprinter.fingerprint())
    }

    fn finished_session(&self) -> Result<&Session> {
        match &self.session {
            Some(session) if session.finished => Ok(session),
            Some(_) => Err(AudiosigError::FingerprintExtraction {
                message: "session has not been finished".to_string(),
            }),
            None => Err(AudiosigError::FingerprintExtraction {
                message: "no fingerprint session".to_string(),
            }),
        }
    }
}

impl Default for ChromaprintBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl FingerprintBackend for ChromaprintBackend {
    fn preferred_channels(&self) -> u16 {
        CHROMAPRINT_CHANNELS
    }

    fn preferred_sample_rate(&self) -> u32 {
        CHROMAPRINT_SAMPLE_RATE
    }

    fn start(&mut self, sample_rate: u32, channels: u16) -> Result<()> {
        if sample_rate == 0 || channels == 0 {
            return Err(AudiosigError::BackendInit {
                message: format!("unsupported format: {} Hz, {} channels", sample_rate, channels),
            });
        }

        let mut fingerprinter = Fingerprinter::new(&self.config);
        fingerprinter
            .start(sample_rate, u32::from(channels))
            .map_err(|e| AudiosigError::BackendInit {
                message: format!("{:?}", e),
            })?;

        self.session = Some(Session {
            fingerprinter,
            sample_rate,
            finished: false,
        });
        Ok(())
    }

    fn feed(&mut self, samples: &[i16]) -> Result<()> {
        match &mut self.session {
            Some(session) if !session.finished => {
                session.fingerprinter.consume(samples);
                Ok(())
            }
            _ => Err(AudiosigError::Feed {
                message: "no active fingerprint session".to_string(),
            }),
        }
    }

    fn finish(&mut self) -> Result<()> {
        match &mut self.session {
            Some(session) if !session.finished => {
                session.fingerprinter.finish();
                session.finished = true;
                Ok(())
            }
            _ => Err(AudiosigError::Finalize {
                message: "no active fingerprint session".to_string(),
            }),
        }
    }

    fn raw_size(&self) -> Result<i64> {
        Ok(self.raw_fingerprint()?.len() as i64)
    }

    fn extract(&self) -> Result<String> {
        Ok(compress::encode(self.raw_fingerprint()?, ALGORITHM_ID))
    }

    fn delay_samples(&self) -> usize {
        let rate = self
            .session
            .as_ref()
            .map_or(CHROMAPRINT_SAMPLE_RATE, |session| session.sample_rate);
        (self.delay_ms() * f64::from(rate) / 1000.0).round() as usize
    }

    fn delay_ms(&self) -> f64 {
        DELAY_SAMPLES_NATIVE as f64 * 1000.0 / f64::from(CHROMAPRINT_SAMPLE_RATE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tone(seconds: usize, sample_rate: u32, channels: u16) -> Vec<i16> {
        let frames = seconds * sample_rate as usize;
        let mut samples = Vec::with_capacity(frames * channels as usize);
        for i in 0..frames {
            let t = i as f64 / f64::from(sample_rate);
            // Sweep keeps the chroma features changing over time.
            let freq = 220.0 + 440.0 * (t / seconds as f64);
            let value = (t * freq * std::f64::consts::TAU).sin() * 12_000.0;
            for _ in 0..channels {
                samples.push(value as i16);
            }
        }
        samples
    }

    #[test]
    fn test_preferred_format() {
        let backend = ChromaprintBackend::new();
        assert_eq!(backend.preferred_channels(), 1);
        assert_eq!(backend.preferred_sample_rate(), 11025);
    }

    #[test]
    fn test_delay_is_reported_at_session_rate() {
        let mut backend = ChromaprintBackend::new();
        assert_eq!(backend.delay_samples(), DELAY_SAMPLES_NATIVE);
        assert!((backend.delay_ms() - 2600.09).abs() < 0.01);

        backend.start(44100, 2).unwrap();
        assert_eq!(backend.delay_samples(), DELAY_SAMPLES_NATIVE * 4);
    }

    #[test]
    fn test_start_rejects_zero_format() {
        let mut backend = ChromaprintBackend::new();
        assert!(matches!(
            backend.start(0, 1),
            Err(AudiosigError::BackendInit { .. })
        ));
        assert!(matches!(
            backend.start(11025, 0),
            Err(AudiosigError::BackendInit { .. })
        ));
    }

    #[test]
    fn test_calls_outside_session_are_errors() {
        let mut backend = ChromaprintBackend::new();
        assert!(matches!(backend.feed(&[0; 4]), Err(AudiosigError::Feed { .. })));
        assert!(matches!(backend.finish(), Err(AudiosigError::Finalize { .. })));
        assert!(matches!(
            backend.extract(),
            Err(AudiosigError::FingerprintExtraction { .. })
        ));

        backend.start(11025, 1).unwrap();
        assert!(backend.raw_size().is_err());
        backend.finish().unwrap();
        assert!(matches!(backend.feed(&[0; 4]), Err(AudiosigError::Feed { .. })));
    }

    #[test]
    fn test_fingerprints_a_tone() {
        let mut backend = ChromaprintBackend::new();
        backend.start(11025, 1).unwrap();
        backend.feed(&tone(10, 11025, 1)).unwrap();
        backend.finish().unwrap();

        assert!(backend.raw_size().unwrap() > 0);
        let fingerprint = backend.extract().unwrap();
        assert!(fingerprint.starts_with("AQ"), "got {}", fingerprint);
    }

    #[test]
    fn test_same_audio_same_fingerprint() {
        let audio = tone(8, 11025, 2);
        let run = |audio: &[i16]| {
            let mut backend = ChromaprintBackend::new();
            backend.start(11025, 2).unwrap();
            backend.feed(audio).unwrap();
            backend.finish().unwrap();
            backend.extract().unwrap()
        };
        assert_eq!(run(&audio), run(&audio));
    }

    #[test]
    fn test_too_little_audio_has_empty_raw_fingerprint() {
        let mut backend = ChromaprintBackend::new();
        backend.start(11025, 1).unwrap();
        backend.feed(&[0i16; 1000]).unwrap();
        backend.finish().unwrap();
        assert_eq!(backend.raw_size().unwrap(), 0);
    }
}
