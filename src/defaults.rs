//! Default configuration constants for audiosig.
//!
//! Shared by the configuration types, the CLI and the fingerprint entry points
//! so that every surface agrees on the same defaults.

/// Default maximum duration of audio analysed per file, in seconds.
///
/// 120 seconds is what AcoustID lookups expect; anything past that point adds
/// cost without improving identification.
pub const MAX_TOTAL_DURATION_SECS: u32 = 120;

/// Default maximum chunk duration in seconds.
///
/// 0 means unlimited: the whole analysed stream forms a single chunk.
pub const MAX_CHUNK_DURATION_SECS: u32 = 0;

/// Whether chunks are lengthened by the backend's lookback delay by default.
pub const OVERLAP_ENABLED: bool = false;

/// Timestamp, in seconds, assigned to the first chunk.
pub const START_TIMESTAMP_SECS: f64 = 0.0;

/// Frame length, in samples per channel, used by in-memory and WAV sources.
///
/// 4096 matches the analysis frame of the Chromaprint algorithm.
pub const FRAME_LEN: usize = 4096;

/// Sample rate the Chromaprint algorithm analyses at internally.
pub const CHROMAPRINT_SAMPLE_RATE: u32 = 11025;

/// Channel count the Chromaprint algorithm analyses internally.
pub const CHROMAPRINT_CHANNELS: u16 = 1;

/// Environment variable that overrides the log filter of the binary.
pub const LOG_ENV: &str = "AUDIOSIG_LOG";
