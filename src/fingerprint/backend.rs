//! Fingerprint engine trait and a mock engine for tests.

use crate::error::{AudiosigError, Result};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// Trait for stateful acoustic fingerprinting engines.
///
/// One `start` → `feed`×N → `finish` → `raw_size`/`extract` cycle is a
/// session and covers exactly one chunk. `start` may be called again after
/// `finish` to begin the next session; dropping the backend releases it.
pub trait FingerprintBackend {
    /// Channel count the engine analyses natively.
    fn preferred_channels(&self) -> u16;

    /// Sample rate the engine analyses natively.
    fn preferred_sample_rate(&self) -> u32;

    /// Begin a new session for interleaved audio in the given format.
    fn start(&mut self, sample_rate: u32, channels: u16) -> Result<()>;

    /// Feed interleaved samples (already scaled by the channel count).
    fn feed(&mut self, samples: &[i16]) -> Result<()>;

    /// Flush buffered audio; no `feed` is valid until the next `start`.
    fn finish(&mut self) -> Result<()>;

    /// Size of the raw fingerprint accumulated by the finished session.
    fn raw_size(&self) -> Result<i64>;

    /// Encoded fingerprint of the finished session.
    fn extract(&self) -> Result<String>;

    /// Lookback latency in samples at the sample rate passed to `start`.
    fn delay_samples(&self) -> usize;

    /// Lookback latency in milliseconds.
    fn delay_ms(&self) -> f64;
}

impl<B: FingerprintBackend + ?Sized> FingerprintBackend for Box<B> {
    fn preferred_channels(&self) -> u16 {
        (**self).preferred_channels()
    }

    fn preferred_sample_rate(&self) -> u32 {
        (**self).preferred_sample_rate()
    }

    fn start(&mut self, sample_rate: u32, channels: u16) -> Result<()> {
        (**self).start(sample_rate, channels)
    }

    fn feed(&mut self, samples: &[i16]) -> Result<()> {
        (**self).feed(samples)
    }

    fn finish(&mut self) -> Result<()> {
        (**self).finish()
    }

    fn raw_size(&self) -> Result<i64> {
        (**self).raw_size()
    }

    fn extract(&self) -> Result<String> {
        (**self).extract()
    }

    fn delay_samples(&self) -> usize {
        (**self).delay_samples()
    }

    fn delay_ms(&self) -> f64 {
        (**self).delay_ms()
    }
}

/// Mock backend for testing.
///
/// The fingerprint of a session is `"mock-<n>"` where `n` is the number of
/// interleaved samples the session received, which lets tests check chunk
/// boundaries exactly.
#[derive(Debug, Clone)]
pub struct MockBackend {
    delay_samples: usize,
    delay_ms: f64,
    min_samples: usize,
    fail_start_on: Option<usize>,
    fail_feed: bool,
    fail_finish: bool,
    fail_extract: bool,
    sessions: Arc<AtomicUsize>,
    formats: Arc<Mutex<Vec<(u32, u16)>>>,
    session_samples: usize,
    active: bool,
    finished: bool,
}

impl MockBackend {
    /// Create a new mock backend with no delay.
    pub fn new() -> Self {
        Self {
            delay_samples: 0,
            delay_ms: 0.0,
            min_samples: 1,
            fail_start_on: None,
            fail_feed: false,
            fail_finish: false,
            fail_extract: false,
            sessions: Arc::new(AtomicUsize::new(0)),
            formats: Arc::new(Mutex::new(Vec::new())),
            session_samples: 0,
            active: false,
            finished: false,
        }
    }

    /// Configure the reported lookback delay.
    pub fn with_delay(mut self, samples: usize, ms: f64) -> Self {
        self.delay_samples = samples;
        self.delay_ms = ms;
        self
    }

    /// Sessions with fewer interleaved samples report a raw size of zero.
    pub fn with_min_samples(mut self, samples: usize) -> Self {
        self.min_samples = samples;
        self
    }

    /// Fail the `n`th call to `start` (1-based).
    pub fn with_start_failure_on(mut self, n: usize) -> Self {
        self.fail_start_on = Some(n);
        self
    }

    pub fn with_feed_failure(mut self) -> Self {
        self.fail_feed = true;
        self
    }

    pub fn with_finish_failure(mut self) -> Self {
        self.fail_finish = true;
        self
    }

    pub fn with_extract_failure(mut self) -> Self {
        self.fail_extract = true;
        self
    }

    /// Shared counter of `start` calls, readable after the backend is moved.
    pub fn session_counter(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.sessions)
    }

    /// Shared log of the `(sample_rate, channels)` every session started with.
    pub fn start_log(&self) -> Arc<Mutex<Vec<(u32, u16)>>> {
        Arc::clone(&self.formats)
    }
}

impl Default for MockBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl FingerprintBackend for MockBackend {
    fn preferred_channels(&self) -> u16 {
        1
    }

    fn preferred_sample_rate(&self) -> u32 {
        1000
    }

    fn start(&mut self, sample_rate: u32, channels: u16) -> Result<()> {
        let n = self.sessions.fetch_add(1, Ordering::SeqCst) + 1;
        if let Ok(mut formats) = self.formats.lock() {
            formats.push((sample_rate, channels));
        }
        if self.fail_start_on == Some(n) {
            return Err(AudiosigError::BackendInit {
                message: "mock start failure".to_string(),
            });
        }
        self.session_samples = 0;
        self.active = true;
        self.finished = false;
        Ok(())
    }

    fn feed(&mut self, samples: &[i16]) -> Result<()> {
        if self.fail_feed || !self.active {
            return Err(AudiosigError::Feed {
                message: "mock feed failure".to_string(),
            });
        }
        self.session_samples += samples.len();
        Ok(())
    }

    fn finish(&mut self) -> Result<()> {
        if self.fail_finish || !self.active {
            return Err(AudiosigError::Finalize {
                message: "mock finish failure".to_string(),
            });
        }
        self.active = false;
        self.finished = true;
        Ok(())
    }

    fn raw_size(&self) -> Result<i64> {
        if !self.finished {
            return Err(AudiosigError::FingerprintExtraction {
                message: "session not finished".to_string(),
            });
        }
        if self.session_samples < self.min_samples {
            Ok(0)
        } else {
            Ok(self.session_samples as i64)
        }
    }

    fn extract(&self) -> Result<String> {
        if self.fail_extract || !self.finished {
            return Err(AudiosigError::FingerprintExtraction {
                message: "mock extract failure".to_string(),
            });
        }
        Ok(format!("mock-{}", self.session_samples))
    }

    fn delay_samples(&self) -> usize {
        self.delay_samples
    }

    fn delay_ms(&self) -> f64 {
        self.delay_ms
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mock_session_cycle() {
        let mut backend = MockBackend::new();
        backend.start(1000, 2).unwrap();
        backend.feed(&[0i16; 10]).unwrap();
        backend.feed(&[0i16; 6]).unwrap();
        backend.finish().unwrap();

        assert_eq!(backend.raw_size().unwrap(), 16);
        assert_eq!(backend.extract().unwrap(), "mock-16");
    }

    #[test]
    fn test_mock_restart_resets_session() {
        let mut backend = MockBackend::new();
        let counter = backend.session_counter();

        backend.start(1000, 1).unwrap();
        backend.feed(&[0i16; 10]).unwrap();
        backend.finish().unwrap();
        backend.start(1000, 1).unwrap();
        backend.feed(&[0i16; 3]).unwrap();
        backend.finish().unwrap();

        assert_eq!(backend.extract().unwrap(), "mock-3");
        assert_eq!(counter.load(Ordering::SeqCst), 2);
        assert_eq!(*backend.start_log().lock().unwrap(), vec![(1000, 1), (1000, 1)]);
    }

    #[test]
    fn test_mock_feed_without_session_fails() {
        let mut backend = MockBackend::new();
        assert!(matches!(
            backend.feed(&[1, 2, 3]),
            Err(AudiosigError::Feed { .. })
        ));
    }

    #[test]
    fn test_mock_min_samples_reports_empty() {
        let mut backend = MockBackend::new().with_min_samples(100);
        backend.start(1000, 1).unwrap();
        backend.feed(&[0i16; 99]).unwrap();
        backend.finish().unwrap();
        assert_eq!(backend.raw_size().unwrap(), 0);
    }

    #[test]
    fn test_mock_start_failure_on_second_session() {
        let mut backend = MockBackend::new().with_start_failure_on(2);
        assert!(backend.start(1000, 1).is_ok());
        assert!(matches!(
            backend.start(1000, 1),
            Err(AudiosigError::BackendInit { .. })
        ));
    }

    #[test]
    fn test_boxed_backend_delegates() {
        let mut backend: Box<dyn FingerprintBackend> =
            Box::new(MockBackend::new().with_delay(25, 2.5));
        assert_eq!(backend.delay_samples(), 25);
        assert_eq!(backend.delay_ms(), 2.5);
        backend.start(1000, 1).unwrap();
        backend.feed(&[0i16; 4]).unwrap();
        backend.finish().unwrap();
        assert_eq!(backend.extract().unwrap(), "mock-4");
    }
}
