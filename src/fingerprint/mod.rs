//! Fingerprint backends.
//!
//! ```text
//! PCM ──feed──▶ FingerprintBackend ──finish──▶ raw_size / extract ──▶ base64 text
//!                    ▲
//!                    ├── ChromaprintBackend (rusty-chromaprint, preset_test2)
//!                    └── MockBackend (tests)
//! ```

pub mod backend;
pub mod chromaprint;
pub mod compress;

pub use backend::{FingerprintBackend, MockBackend};
pub use chromaprint::ChromaprintBackend;
