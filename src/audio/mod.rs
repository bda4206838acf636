pub mod decoder;
pub mod source;
pub mod wav;

pub use decoder::SymphoniaSource;
pub use source::{AudioSource, CancelHandle, Cancellable, MockAudioSource, SourceFormat};
pub use wav::WavAudioSource;
