//! Frame and result types for the segmentation pipeline.
//!
//! An [`AudioFrame`] travels from the audio source into the driver and is
//! consumed piecewise across chunk boundaries; a [`ChunkResult`] is what the
//! driver hands back for every completed chunk.

use serde::Serialize;

/// Batch of interleaved 16-bit PCM samples with a read cursor.
///
/// Lengths are counted in samples per channel ("sample frames"), the unit the
/// stream and chunk budgets are expressed in.
#[derive(Debug, Clone)]
pub struct AudioFrame {
    /// Sequence number of the frame within its source.
    pub sequence: u64,
    /// Channel count; fixed for the whole session.
    pub channels: u16,
    samples: Vec<i16>,
    /// Offset of the first unconsumed sample, in interleaved samples.
    cursor: usize,
}

impl AudioFrame {
    /// Creates a frame. A trailing partial sample frame is dropped.
    pub fn new(sequence: u64, channels: u16, mut samples: Vec<i16>) -> Self {
        let channels = channels.max(1);
        let whole = samples.len() - samples.len() % channels as usize;
        samples.truncate(whole);
        Self {
            sequence,
            channels,
            samples,
            cursor: 0,
        }
    }

    /// Total length in samples per channel, ignoring the cursor.
    pub fn len(&self) -> usize {
        self.samples.len() / self.channels as usize
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Samples per channel not yet consumed.
    pub fn remaining(&self) -> usize {
        (self.samples.len() - self.cursor) / self.channels as usize
    }

    /// Consumes up to `count` samples per channel and returns them interleaved.
    pub fn take(&mut self, count: usize) -> &[i16] {
        let count = count.min(self.remaining());
        let start = self.cursor;
        self.cursor += count * self.channels as usize;
        &self.samples[start..self.cursor]
    }

    /// Returns the duration of this frame in milliseconds.
    pub fn duration_ms(&self, sample_rate: u32) -> u64 {
        if sample_rate == 0 {
            return 0;
        }
        (self.len() as u64 * 1000) / sample_rate as u64
    }
}

/// Outcome of one completed chunk.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChunkResult {
    /// Whether this is the run's first chunk.
    #[serde(skip)]
    pub is_first: bool,
    /// Seconds from the start of the stream (plus the configured offset).
    pub timestamp: f64,
    /// Seconds of audio the fingerprint covers.
    pub duration: f64,
    /// Encoded fingerprint; `None` when the chunk yielded no usable audio.
    pub fingerprint: Option<String>,
}

impl ChunkResult {
    pub fn has_fingerprint(&self) -> bool {
        self.fingerprint.as_deref().is_some_and(|fp| !fp.is_empty())
    }
}
