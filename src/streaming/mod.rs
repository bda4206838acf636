//! Stream segmentation: how much decoded audio goes into which fingerprint.
//!
//! ```text
//! ┌─────────────┐  frame  ┌─────────┐ capped ┌─────────┐ pieces ┌─────────────────┐
//! │ AudioSource │────────▶│   cap   │───────▶│  split  │───────▶│ ChunkController │───▶ ChunkResult
//! └─────────────┘         └─────────┘        └─────────┘        └─────────────────┘
//!        ▲                 stream budget      chunk budget         start/feed/finish
//!        │                                                         harvest/restart
//!        └──────────────────── StreamDriver (read loop) ──────────────────┘
//! ```

pub mod chunker;
pub mod driver;
pub mod frame;
pub mod limiter;

pub use chunker::{ChunkController, ChunkState};
pub use driver::{DriverState, StreamDriver, StreamReport};
pub use frame::{AudioFrame, ChunkResult};
pub use limiter::{Capped, Split, StreamBudget, StreamState, cap, split};
