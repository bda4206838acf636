//! Stream driver: the outer read loop.
//!
//! Pulls frames from an [`AudioSource`], bounds them with [`cap`], cuts them
//! at chunk boundaries with [`split`] and feeds the pieces to a
//! [`ChunkController`]. The loop stops on source exhaustion, when the stream
//! budget is used up, or on a read failure.

use crate::audio::source::AudioSource;
use crate::config::FingerprintConfig;
use crate::error::{AudiosigError, Result};
use crate::fingerprint::FingerprintBackend;
use crate::streaming::chunker::ChunkController;
use crate::streaming::frame::ChunkResult;
use crate::streaming::limiter::{StreamBudget, StreamState, cap, split};
use tracing::{debug, warn};

/// Driver state; every state but `Running` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriverState {
    Running,
    StreamLimitReached,
    ReadFailed,
    Exhausted,
}

/// Outcome of a completed run.
#[derive(Debug)]
pub struct StreamReport {
    pub chunks: Vec<ChunkResult>,
    pub state: DriverState,
    /// Set when the run ended with [`DriverState::ReadFailed`].
    pub read_error: Option<AudiosigError>,
    /// Samples per channel analysed over the whole run.
    pub stream_size: usize,
}

impl StreamReport {
    /// Folds a read failure into [`AudiosigError::Read`], carrying the chunks
    /// harvested before it.
    pub fn into_result(self) -> Result<Vec<ChunkResult>> {
        match self.read_error {
            Some(error) => Err(AudiosigError::Read {
                message: error.to_string(),
                partial: self.chunks,
            }),
            None => Ok(self.chunks),
        }
    }
}

/// Runs one fingerprinting pass of a source through a backend.
pub struct StreamDriver<S, B> {
    source: S,
    controller: ChunkController<B>,
    budget: StreamBudget,
    stream: StreamState,
    state: DriverState,
}

impl<S: AudioSource, B: FingerprintBackend> StreamDriver<S, B> {
    /// Creates a driver whose budgets are expressed at the source's actual
    /// sample rate.
    pub fn new(source: S, backend: B, config: &FingerprintConfig) -> Self {
        let budget = StreamBudget::from_config(config, source.format().sample_rate);
        Self::with_budget(source, backend, budget)
    }

    pub fn with_budget(source: S, backend: B, budget: StreamBudget) -> Self {
        Self {
            source,
            controller: ChunkController::new(backend, budget),
            budget,
            stream: StreamState::default(),
            state: DriverState::Running,
        }
    }

    pub fn budget(&self) -> &StreamBudget {
        &self.budget
    }

    /// Runs the loop to completion.
    ///
    /// Backend failures and soft outcomes are returned as errors; a read
    /// failure ends the loop and is reported in [`StreamReport::read_error`]
    /// next to whatever was harvested.
    pub fn run(mut self) -> Result<StreamReport> {
        let format = self.source.format();
        debug!(
            sample_rate = format.sample_rate,
            channels = format.channels,
            stream_limit = self.budget.stream_limit,
            chunk_limit = self.budget.chunk_limit,
            "Starting fingerprint run"
        );
        self.controller.start(format.sample_rate, format.channels)?;

        let mut chunks = Vec::new();
        let mut read_error = None;

        while self.state == DriverState::Running && !self.source.is_finished() {
            let mut frame = match self.source.read_frame() {
                Ok(frame) => frame,
                Err(error) => {
                    warn!("Read failed after {} samples: {}", self.stream.stream_size, error);
                    read_error = Some(error);
                    self.state = DriverState::ReadFailed;
                    break;
                }
            };

            let capped = cap(self.budget.stream_limit, self.stream.stream_size, frame.len());
            if capped.size == 0 {
                if capped.exhausted {
                    self.state = DriverState::StreamLimitReached;
                }
                continue;
            }
            self.stream.stream_size += capped.size;

            let mut pending = capped.size;
            loop {
                let chunk = self.controller.state();
                let cut = split(
                    pending,
                    self.budget.chunk_limit,
                    chunk.extra_chunk_limit,
                    chunk.chunk_size,
                );
                self.controller.feed(frame.take(cut.first_part))?;
                pending -= cut.first_part;
                if !cut.chunk_done {
                    break;
                }
                chunks.push(self.controller.close_chunk()?);
                self.controller.restart()?;
            }

            if capped.exhausted {
                self.state = DriverState::StreamLimitReached;
            }
        }

        if self.state == DriverState::Running {
            self.state = DriverState::Exhausted;
        }
        self.source.close();
        debug!(
            state = ?self.state,
            samples = self.stream.stream_size,
            "Read loop finished"
        );

        if self.controller.state().chunk_size > 0 {
            match self.controller.close_chunk() {
                Ok(chunk) => chunks.push(chunk),
                Err(error) if error.is_soft() && read_error.is_some() => {
                    warn!("Discarding partial chunk: {}", error);
                }
                Err(error) => return Err(error),
            }
        } else if chunks.is_empty() && read_error.is_none() {
            return Err(AudiosigError::InsufficientAudio);
        }

        Ok(StreamReport {
            chunks,
            state: self.state,
            read_error,
            stream_size: self.stream.stream_size,
        })
    }
}
