//! Stream and chunk budgets.
//!
//! [`cap`] bounds a frame against the global analysis budget and [`split`]
//! finds where a frame crosses the current chunk's boundary. Both are pure;
//! the driver owns the counters they are applied to.

use crate::config::FingerprintConfig;

/// Immutable per-run limits, in samples per channel.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StreamBudget {
    /// Maximum samples analysed over the whole run; 0 = unlimited.
    pub stream_limit: usize,
    /// Maximum samples per chunk; 0 = a single unbounded chunk.
    pub chunk_limit: usize,
    pub overlap_enabled: bool,
    /// Timestamp of the first chunk, in seconds.
    pub start_timestamp: f64,
}

impl StreamBudget {
    /// Converts the duration-based configuration into sample counts for a
    /// stream at `sample_rate`.
    pub fn from_config(config: &FingerprintConfig, sample_rate: u32) -> Self {
        let rate = sample_rate as usize;
        Self {
            stream_limit: config.max_total_duration_seconds as usize * rate,
            chunk_limit: config.max_chunk_duration_seconds as usize * rate,
            overlap_enabled: config.overlap_enabled,
            start_timestamp: config.start_timestamp_seconds,
        }
    }

    pub fn is_chunked(&self) -> bool {
        self.chunk_limit > 0
    }
}

/// Run-wide counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StreamState {
    /// Samples per channel consumed so far; never exceeds a nonzero limit.
    pub stream_size: usize,
}

/// Result of [`cap`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Capped {
    /// Part of the frame that may still be analysed.
    pub size: usize,
    /// The global budget is used up once this part is consumed.
    pub exhausted: bool,
}

/// Result of [`split`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Split {
    /// Samples that still belong to the current chunk.
    pub first_part: usize,
    /// The current chunk closes after `first_part`.
    pub chunk_done: bool,
}

/// Bounds `frame_size` by what is left of the global budget.
///
/// Callers keep `stream_size <= stream_limit`; the subtraction saturates
/// rather than wrapping if that is ever violated.
pub fn cap(stream_limit: usize, stream_size: usize, frame_size: usize) -> Capped {
    if stream_limit == 0 {
        return Capped {
            size: frame_size,
            exhausted: false,
        };
    }

    let remaining = stream_limit.saturating_sub(stream_size);
    if frame_size > remaining {
        Capped {
            size: remaining,
            exhausted: true,
        }
    } else {
        Capped {
            size: frame_size,
            exhausted: false,
        }
    }
}

/// Splits `frame_size` at the current chunk's boundary.
///
/// Handles one boundary per call: the remainder `frame_size - first_part`
/// belongs to the next chunk and is split again by the caller if needed.
pub fn split(
    frame_size: usize,
    chunk_limit: usize,
    extra_chunk_limit: usize,
    chunk_size: usize,
) -> Split {
    if chunk_limit == 0 {
        return Split {
            first_part: frame_size,
            chunk_done: false,
        };
    }

    let remaining = (chunk_limit + extra_chunk_limit).saturating_sub(chunk_size);
    if frame_size > remaining {
        Split {
            first_part: remaining,
            chunk_done: true,
        }
    } else {
        Split {
            first_part: frame_size,
            chunk_done: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cap_unlimited_passes_frame_through() {
        assert_eq!(
            cap(0, 1_000_000, 4096),
            Capped {
                size: 4096,
                exhausted: false
            }
        );
    }

    #[test]
    fn cap_truncates_to_remaining_budget() {
        assert_eq!(
            cap(10_000, 8_000, 4096),
            Capped {
                size: 2000,
                exhausted: true
            }
        );
    }

    #[test]
    fn cap_exact_fit_is_not_exhausted() {
        assert_eq!(
            cap(10_000, 5_904, 4096),
            Capped {
                size: 4096,
                exhausted: false
            }
        );
        assert_eq!(
            cap(10_000, 10_000, 1),
            Capped {
                size: 0,
                exhausted: true
            }
        );
    }

    #[test]
    fn cap_never_exceeds_remaining() {
        let limit = 1000;
        for stream_size in (0..=limit).step_by(37) {
            for frame in [0, 1, 63, 500, 999, 1000, 4096] {
                let capped = cap(limit, stream_size, frame);
                let remaining = limit - stream_size;
                assert!(capped.size <= remaining);
                if frame <= remaining {
                    assert_eq!(capped.size, frame);
                    assert!(!capped.exhausted);
                } else {
                    assert!(capped.exhausted);
                }
            }
        }
    }

    #[test]
    fn cap_saturates_when_state_overruns_limit() {
        assert_eq!(cap(100, 150, 10).size, 0);
    }

    #[test]
    fn split_unbounded_chunk_takes_whole_frame() {
        assert_eq!(
            split(4096, 0, 500, 1_000_000),
            Split {
                first_part: 4096,
                chunk_done: false
            }
        );
    }

    #[test]
    fn split_at_boundary() {
        assert_eq!(
            split(4096, 10_000, 0, 8_000),
            Split {
                first_part: 2000,
                chunk_done: true
            }
        );
    }

    #[test]
    fn split_counts_extra_chunk_limit() {
        assert_eq!(
            split(4096, 10_000, 3_000, 8_000),
            Split {
                first_part: 4096,
                chunk_done: false
            }
        );
        assert_eq!(
            split(4096, 10_000, 3_000, 12_000),
            Split {
                first_part: 1000,
                chunk_done: true
            }
        );
    }

    #[test]
    fn split_full_chunk_closes_with_empty_first_part() {
        assert_eq!(
            split(4096, 10_000, 0, 10_000),
            Split {
                first_part: 0,
                chunk_done: true
            }
        );
    }

    #[test]
    fn split_partitions_frame_and_flags_crossing() {
        for chunk_limit in [1, 7, 100, 4096] {
            for extra in [0, 3, 50] {
                for chunk_size in (0..=chunk_limit + extra).step_by(5) {
                    for frame in [0, 1, 99, 4096, 10_000] {
                        let s = split(frame, chunk_limit, extra, chunk_size);
                        let rest = frame - s.first_part;
                        assert_eq!(s.first_part + rest, frame);
                        assert_eq!(s.chunk_done, frame > chunk_limit + extra - chunk_size);
                        assert!(chunk_size + s.first_part <= chunk_limit + extra);
                    }
                }
            }
        }
    }

    #[test]
    fn budget_from_config_converts_seconds_to_samples() {
        let config = FingerprintConfig {
            max_total_duration_seconds: 120,
            max_chunk_duration_seconds: 10,
            overlap_enabled: true,
            start_timestamp_seconds: 4.5,
        };
        let budget = StreamBudget::from_config(&config, 11025);

        assert_eq!(budget.stream_limit, 120 * 11025);
        assert_eq!(budget.chunk_limit, 10 * 11025);
        assert!(budget.overlap_enabled);
        assert!(budget.is_chunked());
        assert_eq!(budget.start_timestamp, 4.5);
    }
}
