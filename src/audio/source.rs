//! Decoded audio sources: the trait, cancellation and a scripted mock.

use crate::error::{AudiosigError, Result};
use crate::streaming::frame::AudioFrame;
use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// PCM layout of a source: interleaved 16-bit samples.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SourceFormat {
    pub sample_rate: u32,
    pub channels: u16,
}

/// Trait for decoded audio sources.
///
/// This trait allows swapping implementations (real decoder vs mock).
pub trait AudioSource {
    /// Actual format of the frames this source yields.
    ///
    /// May differ from the hints the source was opened with.
    fn format(&self) -> SourceFormat;

    /// Read the next frame.
    ///
    /// # Returns
    /// The next frame (possibly empty once the stream ends), or an error.
    /// Errors end the stream: the caller does not read again.
    fn read_frame(&mut self) -> Result<AudioFrame>;

    /// True once every frame has been delivered.
    fn is_finished(&self) -> bool;

    /// Stop producing frames. Decoder resources are released on drop.
    fn close(&mut self) {}
}

impl<S: AudioSource + ?Sized> AudioSource for Box<S> {
    fn format(&self) -> SourceFormat {
        (**self).format()
    }

    fn read_frame(&mut self) -> Result<AudioFrame> {
        (**self).read_frame()
    }

    fn is_finished(&self) -> bool {
        (**self).is_finished()
    }

    fn close(&mut self) {
        (**self).close()
    }
}

/// Handle that cancels a [`Cancellable`] source from any thread.
#[derive(Debug, Clone, Default)]
pub struct CancelHandle(Arc<AtomicBool>);

impl CancelHandle {
    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Source wrapper whose next frame pull fails with
/// [`AudiosigError::Cancelled`] once its handle is cancelled.
pub struct Cancellable<S> {
    inner: S,
    handle: CancelHandle,
}

impl<S: AudioSource> Cancellable<S> {
    pub fn new(inner: S) -> Self {
        Self {
            inner,
            handle: CancelHandle::default(),
        }
    }

    pub fn handle(&self) -> CancelHandle {
        self.handle.clone()
    }
}

impl<S: AudioSource> AudioSource for Cancellable<S> {
    fn format(&self) -> SourceFormat {
        self.inner.format()
    }

    fn read_frame(&mut self) -> Result<AudioFrame> {
        if self.handle.is_cancelled() {
            return Err(AudiosigError::Cancelled);
        }
        self.inner.read_frame()
    }

    fn is_finished(&self) -> bool {
        self.inner.is_finished()
    }

    fn close(&mut self) {
        self.inner.close()
    }
}

/// Mock audio source for testing
#[derive(Debug, Clone)]
pub struct MockAudioSource {
    format: SourceFormat,
    frames: VecDeque<Vec<i16>>,
    fail_after: Option<usize>,
    delivered: usize,
    error_message: String,
}

impl MockAudioSource {
    /// Create an empty mock source with the given format.
    pub fn new(sample_rate: u32, channels: u16) -> Self {
        Self {
            format: SourceFormat {
                sample_rate,
                channels: channels.max(1),
            },
            frames: VecDeque::new(),
            fail_after: None,
            delivered: 0,
            error_message: "mock read error".to_string(),
        }
    }

    /// Append `seconds` of audio split into frames of `frame_len` samples
    /// per channel; the last frame may be shorter.
    pub fn with_duration(self, seconds: f64, frame_len: usize) -> Self {
        let total = (seconds * f64::from(self.format.sample_rate)).round() as usize;
        self.with_samples(total, frame_len)
    }

    /// Append `total` samples per channel split into frames of `frame_len`.
    pub fn with_samples(mut self, total: usize, frame_len: usize) -> Self {
        let channels = self.format.channels as usize;
        let frame_len = frame_len.max(1);
        let mut produced = 0;
        while produced < total {
            let len = frame_len.min(total - produced);
            let frame = (0..len * channels)
                .map(|i| ((produced * channels + i) % 2000) as i16 - 1000)
                .collect();
            self.frames.push_back(frame);
            produced += len;
        }
        self
    }

    /// Append one frame of interleaved samples as-is (may be empty).
    pub fn with_frame(mut self, samples: Vec<i16>) -> Self {
        self.frames.push_back(samples);
        self
    }

    /// Fail the read that follows `frames` successful reads.
    pub fn with_read_failure_after(mut self, frames: usize) -> Self {
        self.fail_after = Some(frames);
        self
    }

    /// Configure the error message for failures
    pub fn with_error_message(mut self, message: &str) -> Self {
        self.error_message = message.to_string();
        self
    }

    /// Number of frames delivered so far.
    pub fn delivered(&self) -> usize {
        self.delivered
    }
}

impl AudioSource for MockAudioSource {
    fn format(&self) -> SourceFormat {
        self.format
    }

    fn read_frame(&mut self) -> Result<AudioFrame> {
        if self.fail_after == Some(self.delivered) {
            return Err(AudiosigError::Other(self.error_message.clone()));
        }

        let samples = self.frames.pop_front().unwrap_or_default();
        let frame = AudioFrame::new(self.delivered as u64, self.format.channels, samples);
        self.delivered += 1;
        Ok(frame)
    }

    fn is_finished(&self) -> bool {
        self.frames.is_empty() && self.fail_after.is_none_or(|n| n < self.delivered)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mock_splits_duration_into_frames() {
        let mut source = MockAudioSource::new(1000, 2).with_duration(2.5, 1000);

        let sizes: Vec<usize> = std::iter::from_fn(|| {
            (!source.is_finished()).then(|| source.read_frame().unwrap().len())
        })
        .collect();

        assert_eq!(sizes, vec![1000, 1000, 500]);
    }

    #[test]
    fn test_mock_read_failure_after_frames() {
        let mut source = MockAudioSource::new(1000, 1)
            .with_samples(5000, 1000)
            .with_read_failure_after(2)
            .with_error_message("device unplugged");

        assert!(source.read_frame().is_ok());
        assert!(source.read_frame().is_ok());
        let err = source.read_frame().unwrap_err();
        assert_eq!(err.to_string(), "device unplugged");
        assert_eq!(source.delivered(), 2);
    }

    #[test]
    fn test_mock_pending_failure_keeps_source_open() {
        let mut source = MockAudioSource::new(1000, 1)
            .with_samples(1000, 1000)
            .with_read_failure_after(1);

        source.read_frame().unwrap();
        assert!(!source.is_finished());
        assert!(source.read_frame().is_err());
    }

    #[test]
    fn test_empty_mock_is_finished() {
        let mut source = MockAudioSource::new(44100, 2);
        assert!(source.is_finished());
        assert!(source.read_frame().unwrap().is_empty());
    }

    #[test]
    fn test_cancellable_fails_after_cancel() {
        let mut source = Cancellable::new(MockAudioSource::new(1000, 1).with_samples(3000, 1000));
        let handle = source.handle();

        assert!(source.read_frame().is_ok());
        handle.cancel();
        assert!(matches!(source.read_frame(), Err(AudiosigError::Cancelled)));
        assert!(!source.is_finished());
    }

    #[test]
    fn test_boxed_source_delegates() {
        let mut source: Box<dyn AudioSource> =
            Box::new(MockAudioSource::new(22050, 2).with_samples(10, 10));
        assert_eq!(
            source.format(),
            SourceFormat {
                sample_rate: 22050,
                channels: 2
            }
        );
        assert_eq!(source.read_frame().unwrap().len(), 10);
        assert!(source.is_finished());
    }
}
