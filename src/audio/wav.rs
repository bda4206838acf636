//! WAV stream audio source for pipe mode.

use crate::audio::source::{AudioSource, SourceFormat};
use crate::defaults::FRAME_LEN;
use crate::error::{AudiosigError, Result};
use crate::streaming::frame::AudioFrame;
use std::io::Read;

/// Audio source that reads a WAV stream with hound.
///
/// Integer samples of any width and 32-bit float samples are converted to
/// 16-bit. Frames hold `frame_len` samples per channel; the last one may be
/// shorter.
pub struct WavAudioSource {
    reader: hound::WavReader<Box<dyn Read + Send>>,
    format: SourceFormat,
    sample_format: hound::SampleFormat,
    bits_per_sample: u16,
    frame_len: usize,
    /// Interleaved samples not yet read.
    remaining: usize,
    sequence: u64,
}

impl WavAudioSource {
    /// Create from any reader (for testing/flexibility).
    pub fn from_reader(reader: Box<dyn Read + Send>, frame_len: usize) -> Result<Self> {
        Self::open_named(reader, frame_len, "<reader>")
    }

    /// Create from stdin.
    pub fn from_stdin() -> Result<Self> {
        use std::io::Cursor;

        // Read all data from stdin into memory first (StdinLock is not Send)
        let mut buffer = Vec::new();
        std::io::stdin()
            .lock()
            .read_to_end(&mut buffer)
            .map_err(|e| AudiosigError::SourceOpen {
                path: "-".to_string(),
                message: format!("Failed to read from stdin: {}", e),
            })?;

        Self::open_named(Box::new(Cursor::new(buffer)), FRAME_LEN, "-")
    }

    fn open_named(reader: Box<dyn Read + Send>, frame_len: usize, name: &str) -> Result<Self> {
        let open_error = |message: String| AudiosigError::SourceOpen {
            path: name.to_string(),
            message,
        };

        let reader = hound::WavReader::new(reader)
            .map_err(|e| open_error(format!("Failed to parse WAV file: {}", e)))?;

        let spec = reader.spec();
        match (spec.sample_format, spec.bits_per_sample) {
            (hound::SampleFormat::Int, 1..=32) | (hound::SampleFormat::Float, 32) => {}
            (format, bits) => {
                return Err(open_error(format!(
                    "Unsupported sample format: {:?} {} bit",
                    format, bits
                )));
            }
        }
        if spec.channels == 0 || spec.sample_rate == 0 {
            return Err(open_error("WAV header has no channels or rate".to_string()));
        }

        let remaining = reader.len() as usize;
        Ok(Self {
            format: SourceFormat {
                sample_rate: spec.sample_rate,
                channels: spec.channels,
            },
            sample_format: spec.sample_format,
            bits_per_sample: spec.bits_per_sample,
            frame_len: frame_len.max(1),
            remaining,
            sequence: 0,
            reader,
        })
    }

    fn read_block(&mut self, count: usize) -> Result<Vec<i16>> {
        let bits = u32::from(self.bits_per_sample);
        let samples: std::result::Result<Vec<i16>, hound::Error> = match self.sample_format {
            hound::SampleFormat::Int => self
                .reader
                .samples::<i32>()
                .take(count)
                .map(|s| s.map(|v| int_to_i16(v, bits)))
                .collect(),
            hound::SampleFormat::Float => self
                .reader
                .samples::<f32>()
                .take(count)
                .map(|s| s.map(float_to_i16))
                .collect(),
        };
        samples.map_err(|e| AudiosigError::Other(format!("Failed to read WAV samples: {}", e)))
    }
}

impl AudioSource for WavAudioSource {
    fn format(&self) -> SourceFormat {
        self.format
    }

    fn read_frame(&mut self) -> Result<AudioFrame> {
        let want = (self.frame_len * self.format.channels as usize).min(self.remaining);
        let result = self.read_block(want);
        // A failed read ends the stream.
        self.remaining = match &result {
            Ok(samples) => self.remaining - samples.len(),
            Err(_) => 0,
        };
        let samples = result?;

        let frame = AudioFrame::new(self.sequence, self.format.channels, samples);
        self.sequence += 1;
        Ok(frame)
    }

    fn is_finished(&self) -> bool {
        self.remaining == 0
    }

    fn close(&mut self) {
        self.remaining = 0;
    }
}

fn int_to_i16(value: i32, bits: u32) -> i16 {
    if bits > 16 {
        (value >> (bits - 16)) as i16
    } else {
        (value << (16 - bits)) as i16
    }
}

fn float_to_i16(value: f32) -> i16 {
    (value.clamp(-1.0, 1.0) * f32::from(i16::MAX)) as i16
}
