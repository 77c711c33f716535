//! PCM16 WAV encoding
//!
//! Always writes the canonical 44-byte RIFF header with a 16-byte `fmt `
//! chunk, whatever the channel count. Decoding of existing files goes
//! through hound.

use super::buffer::AudioBuffer;
use std::io::Cursor;
use thiserror::Error;

/// Size of the RIFF/WAVE/fmt/data header
pub const WAV_HEADER_LEN: usize = 44;

const BYTES_PER_SAMPLE: u16 = 2;

/// Largest data chunk the 32-bit RIFF size fields can describe
const MAX_DATA_BYTES: usize = (u32::MAX - 36) as usize;

/// Errors raised when reading an existing WAV file
#[derive(Error, Debug)]
pub enum WavError {
    #[error("Invalid WAV data: {0}")]
    Invalid(String),

    #[error("Unsupported WAV format: {bits} bits {format:?}, expected 16-bit PCM")]
    UnsupportedFormat {
        bits: u16,
        format: hound::SampleFormat,
    },
}

/// Encoded WAV file, never mutated after creation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WavPayload {
    bytes: Vec<u8>,
    sample_rate: u32,
    channels: u16,
}

impl WavPayload {
    /// Wraps existing WAV bytes after checking they hold 16-bit PCM
    pub fn from_bytes(bytes: Vec<u8>) -> Result<Self, WavError> {
        let spec = hound::WavReader::new(Cursor::new(bytes.as_slice()))
            .map_err(|e| WavError::Invalid(e.to_string()))?
            .spec();

        if spec.bits_per_sample != 16 || spec.sample_format != hound::SampleFormat::Int {
            return Err(WavError::UnsupportedFormat {
                bits: spec.bits_per_sample,
                format: spec.sample_format,
            });
        }

        Ok(Self {
            sample_rate: spec.sample_rate,
            channels: spec.channels,
            bytes,
        })
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn channels(&self) -> u16 {
        self.channels
    }

    /// Size of the PCM data following the header
    pub fn data_len(&self) -> usize {
        self.bytes.len().saturating_sub(WAV_HEADER_LEN)
    }
}

/// Encodes a buffer as PCM16 WAV, averaging channels down to mono when asked
pub fn encode(buffer: &AudioBuffer, force_mono: bool) -> WavPayload {
    let (samples, channels) = if force_mono && buffer.channels() > 1 {
        (downmix(buffer.samples(), buffer.channels()), 1)
    } else {
        (buffer.samples().to_vec(), buffer.channels())
    };

    let count = writable_samples(samples.len(), channels);
    if count < samples.len() {
        tracing::warn!(
            "WAV data capped at {} bytes, dropping {} trailing samples",
            MAX_DATA_BYTES,
            samples.len() - count
        );
    }
    let samples = &samples[..count];

    let data_size = (count * BYTES_PER_SAMPLE as usize) as u32;
    let sample_rate = buffer.sample_rate();
    let block_align = channels * BYTES_PER_SAMPLE;
    let byte_rate = sample_rate.saturating_mul(block_align as u32);

    let mut bytes = Vec::with_capacity(WAV_HEADER_LEN + data_size as usize);

    bytes.extend_from_slice(b"RIFF");
    bytes.extend_from_slice(&(36u32.saturating_add(data_size)).to_le_bytes());
    bytes.extend_from_slice(b"WAVE");

    bytes.extend_from_slice(b"fmt ");
    bytes.extend_from_slice(&16u32.to_le_bytes());
    bytes.extend_from_slice(&1u16.to_le_bytes()); // PCM
    bytes.extend_from_slice(&channels.to_le_bytes());
    bytes.extend_from_slice(&sample_rate.to_le_bytes());
    bytes.extend_from_slice(&byte_rate.to_le_bytes());
    bytes.extend_from_slice(&block_align.to_le_bytes());
    bytes.extend_from_slice(&16u16.to_le_bytes());

    bytes.extend_from_slice(b"data");
    bytes.extend_from_slice(&data_size.to_le_bytes());

    for &sample in samples {
        bytes.extend_from_slice(&quantize(sample).to_le_bytes());
    }

    tracing::debug!(
        "Encoded WAV: {} frames, {} ch @ {}Hz, {} bytes",
        samples.len() / channels as usize,
        channels,
        sample_rate,
        bytes.len()
    );

    WavPayload {
        bytes,
        sample_rate,
        channels,
    }
}

/// Whole frames that fit in one data chunk
fn writable_samples(len: usize, channels: u16) -> usize {
    let max = MAX_DATA_BYTES / BYTES_PER_SAMPLE as usize;
    let max = max - max % channels.max(1) as usize;
    len.min(max)
}

/// Averages every frame into a single sample
pub fn downmix(samples: &[f32], channels: u16) -> Vec<f32> {
    if channels <= 1 {
        return samples.to_vec();
    }

    samples
        .chunks_exact(channels as usize)
        .map(|frame| frame.iter().sum::<f32>() / channels as f32)
        .collect()
}

/// Clamps to [-1, 1] and scales by `i16::MAX`, rounding half away from zero.
///
/// `-1.0` maps to `-32767`, not `i16::MIN`. NaN maps to 0.
pub fn quantize(sample: f32) -> i16 {
    (sample.clamp(-1.0, 1.0) * i16::MAX as f32).round() as i16
}
