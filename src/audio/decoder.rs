//! File decoding through symphonia.
//!
//! One decoded packet becomes one [`AudioFrame`]. No resampling or remixing
//! happens here: the stream's own format is reported and used as-is.

use crate::audio::source::{AudioSource, SourceFormat};
use crate::error::{AudiosigError, Result};
use crate::streaming::frame::AudioFrame;
use std::fs::File;
use std::path::{Path, PathBuf};
use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::{CODEC_TYPE_NULL, Decoder, DecoderOptions};
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::{FormatOptions, FormatReader};
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;
use symphonia::default::{get_codecs, get_probe};
use tracing::{debug, warn};

/// Audio source decoding a file with symphonia.
pub struct SymphoniaSource {
    path: PathBuf,
    reader: Box<dyn FormatReader>,
    decoder: Box<dyn Decoder>,
    track_id: u32,
    format: SourceFormat,
    /// Samples decoded while probing the format, served by the first read.
    pending: Option<Vec<i16>>,
    sequence: u64,
    finished: bool,
}

impl SymphoniaSource {
    /// Opens `path` and selects its first decodable track.
    ///
    /// `hints` is the format the consumer would prefer; it is only used when
    /// the stream does not declare its own.
    pub fn open(path: impl AsRef<Path>, hints: SourceFormat) -> Result<Self> {
        let path = path.as_ref();
        let open_error = |message: String| AudiosigError::SourceOpen {
            path: path.display().to_string(),
            message,
        };

        let file = File::open(path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => AudiosigError::FileNotFound {
                path: path.display().to_string(),
            },
            _ => open_error(e.to_string()),
        })?;
        let mss = MediaSourceStream::new(Box::new(file), Default::default());

        let mut hint = Hint::new();
        if let Some(ext) = path.extension().and_then(|s| s.to_str()) {
            hint.with_extension(ext);
        }

        let probed = get_probe()
            .format(
                &hint,
                mss,
                &FormatOptions::default(),
                &MetadataOptions::default(),
            )
            .map_err(|e| open_error(format!("unsupported format: {}", e)))?;
        let reader = probed.format;

        let track = reader
            .tracks()
            .iter()
            .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
            .ok_or_else(|| open_error("no decodable audio track".to_string()))?;
        let track_id = track.id;
        let params = &track.codec_params;
        let format = SourceFormat {
            sample_rate: params.sample_rate.unwrap_or(0),
            channels: params.channels.map_or(0, |c| c.count() as u16),
        };

        let decoder = get_codecs()
            .make(params, &DecoderOptions::default())
            .map_err(|e| open_error(format!("unsupported codec: {}", e)))?;

        let mut source = Self {
            path: path.to_path_buf(),
            reader,
            decoder,
            track_id,
            format,
            pending: None,
            sequence: 0,
            finished: false,
        };

        // Some containers only reveal the format once a packet is decoded.
        if source.format.sample_rate == 0 || source.format.channels == 0 {
            match source.next_samples() {
                Ok(Some(samples)) => source.pending = Some(samples),
                Ok(None) => {
                    source.finished = true;
                    source.format = hints;
                }
                Err(e) => return Err(open_error(e.to_string())),
            }
        }

        if source.format != hints {
            debug!(
                path = %source.path.display(),
                sample_rate = source.format.sample_rate,
                channels = source.format.channels,
                preferred_rate = hints.sample_rate,
                preferred_channels = hints.channels,
                "Using the stream's own format"
            );
        }

        Ok(source)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Decodes the next packet of the selected track.
    ///
    /// Returns `None` at end of stream.
    fn next_samples(&mut self) -> Result<Option<Vec<i16>>> {
        loop {
            let packet = match self.reader.next_packet() {
                Ok(packet) => packet,
                Err(SymphoniaError::IoError(e)) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
                    return Ok(None);
                }
                Err(SymphoniaError::ResetRequired) => return Ok(None),
                Err(e) => return Err(AudiosigError::Other(format!("Failed to read packet: {}", e))),
            };

            if packet.track_id() != self.track_id {
                continue;
            }

            let decoded = match self.decoder.decode(&packet) {
                Ok(decoded) => decoded,
                Err(SymphoniaError::DecodeError(e)) => {
                    warn!("Skipping undecodable packet in {}: {}", self.path.display(), e);
                    continue;
                }
                Err(e) => return Err(AudiosigError::Other(format!("Failed to decode: {}", e))),
            };

            let spec = *decoded.spec();
            let actual = SourceFormat {
                sample_rate: spec.rate,
                channels: spec.channels.count() as u16,
            };
            if self.format.sample_rate == 0 || self.format.channels == 0 {
                self.format = actual;
            } else if actual != self.format {
                return Err(AudiosigError::Other(format!(
                    "Stream format changed from {} Hz/{} ch to {} Hz/{} ch",
                    self.format.sample_rate,
                    self.format.channels,
                    actual.sample_rate,
                    actual.channels
                )));
            }

            let mut buffer = SampleBuffer::<i16>::new(decoded.capacity() as u64, spec);
            buffer.copy_interleaved_ref(decoded);
            return Ok(Some(buffer.samples().to_vec()));
        }
    }

    fn frame(&mut self, samples: Vec<i16>) -> AudioFrame {
        let frame = AudioFrame::new(self.sequence, self.format.channels, samples);
        self.sequence += 1;
        frame
    }
}

impl AudioSource for SymphoniaSource {
    fn format(&self) -> SourceFormat {
        self.format
    }

    fn read_frame(&mut self) -> Result<AudioFrame> {
        if let Some(samples) = self.pending.take() {
            return Ok(self.frame(samples));
        }
        if self.finished {
            return Ok(self.frame(Vec::new()));
        }

        match self.next_samples() {
            Ok(Some(samples)) => Ok(self.frame(samples)),
            Ok(None) => {
                self.finished = true;
                Ok(self.frame(Vec::new()))
            }
            Err(e) => {
                self.finished = true;
                Err(e)
            }
        }
    }

    fn is_finished(&self) -> bool {
        self.finished && self.pending.is_none()
    }

    fn close(&mut self) {
        self.finished = true;
        self.pending = None;
    }
}
