//! Chunk lifecycle controller.
//!
//! Owns the fingerprint backend and drives one session per chunk:
//! start → feed×N → finish → harvest → restart. Tracks how many samples the
//! live session has received, the pre-roll allowance of the first chunk, and
//! the timestamp of the chunk in progress.

use crate::error::{AudiosigError, Result};
use crate::fingerprint::FingerprintBackend;
use crate::streaming::frame::ChunkResult;
use crate::streaming::limiter::StreamBudget;
use tracing::debug;

/// Counters of the chunk in progress.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ChunkState {
    /// Samples per channel fed since the last `start`.
    pub chunk_size: usize,
    /// Pre-roll allowance; nonzero only until the first chunk closes.
    pub extra_chunk_limit: usize,
    /// Seconds elapsed at the start of this chunk.
    pub timestamp: f64,
}

/// Drives fingerprint sessions chunk by chunk.
pub struct ChunkController<B> {
    backend: B,
    budget: StreamBudget,
    state: ChunkState,
    sample_rate: u32,
    channels: u16,
    /// Seconds added to every chunk duration when overlap is on.
    overlap_amount: f64,
    started: bool,
    active: bool,
    closed_chunks: usize,
}

impl<B: FingerprintBackend> ChunkController<B> {
    pub fn new(backend: B, budget: StreamBudget) -> Self {
        Self {
            backend,
            state: ChunkState {
                timestamp: budget.start_timestamp,
                ..ChunkState::default()
            },
            budget,
            sample_rate: 0,
            channels: 1,
            overlap_amount: 0.0,
            started: false,
            active: false,
            closed_chunks: 0,
        }
    }

    pub fn state(&self) -> &ChunkState {
        &self.state
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Seconds of overlap compensation captured on the first start.
    pub fn overlap_amount(&self) -> f64 {
        self.overlap_amount
    }

    /// Number of chunks closed so far.
    pub fn closed_chunks(&self) -> usize {
        self.closed_chunks
    }

    /// True between `start` and `finish`.
    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Begins a backend session for a new chunk.
    ///
    /// The first call of a run also captures the backend's pre-roll delay
    /// when overlap is enabled and chunking is on.
    pub fn start(&mut self, sample_rate: u32, channels: u16) -> Result<()> {
        self.backend.start(sample_rate, channels)?;
        self.sample_rate = sample_rate;
        self.channels = channels.max(1);
        self.active = true;

        if !self.started {
            self.started = true;
            if self.budget.overlap_enabled && self.budget.is_chunked() {
                self.state.extra_chunk_limit = self.backend.delay_samples();
                self.overlap_amount = self.backend.delay_ms() / 1000.0;
                debug!(
                    extra_samples = self.state.extra_chunk_limit,
                    overlap_secs = self.overlap_amount,
                    "Overlap enabled"
                );
            }
        }
        Ok(())
    }

    /// Starts the next chunk's session with the format of the previous one.
    pub fn restart(&mut self) -> Result<()> {
        self.start(self.sample_rate, self.channels)
    }

    /// Forwards interleaved samples to the live session.
    ///
    /// Empty slices are not forwarded.
    pub fn feed(&mut self, samples: &[i16]) -> Result<()> {
        if samples.is_empty() {
            return Ok(());
        }
        if !self.active {
            return Err(AudiosigError::Feed {
                message: "no active chunk".to_string(),
            });
        }
        self.backend.feed(samples)?;
        self.state.chunk_size += samples.len() / self.channels as usize;
        Ok(())
    }

    /// Finalizes the live session; `feed` fails until the next `start`.
    pub fn finish(&mut self) -> Result<()> {
        self.active = false;
        self.backend.finish()
    }

    /// Duration of the current chunk in seconds.
    pub fn chunk_duration(&self) -> f64 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        let counted = self
            .state
            .chunk_size
            .saturating_sub(self.state.extra_chunk_limit);
        counted as f64 / f64::from(self.sample_rate) + self.overlap_amount
    }

    /// Collects the finished session's fingerprint.
    ///
    /// An empty first chunk is [`AudiosigError::EmptyFingerprint`]; an empty
    /// later chunk yields a result without a fingerprint.
    pub fn harvest(&self, is_first: bool) -> Result<ChunkResult> {
        let fingerprint = if self.backend.raw_size()? <= 0 {
            if is_first {
                return Err(AudiosigError::EmptyFingerprint);
            }
            None
        } else {
            Some(self.backend.extract()?)
        };

        Ok(ChunkResult {
            is_first,
            timestamp: self.state.timestamp,
            duration: self.chunk_duration(),
            fingerprint,
        })
    }

    /// Finishes and harvests the current chunk, then advances the timestamp
    /// and resets the per-chunk counters. Does not start the next session.
    pub fn close_chunk(&mut self) -> Result<ChunkResult> {
        let is_first = self.closed_chunks == 0;
        self.finish()?;
        let result = self.harvest(is_first)?;

        debug!(
            timestamp = result.timestamp,
            duration = result.duration,
            samples = self.state.chunk_size,
            empty = result.fingerprint.is_none(),
            "Chunk closed"
        );

        self.state.timestamp += result.duration;
        self.state.chunk_size = 0;
        self.state.extra_chunk_limit = 0;
        self.closed_chunks += 1;
        Ok(result)
    }
}
