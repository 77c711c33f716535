//! Interleaved sample buffer produced by a capture session

use thiserror::Error;

/// Errors raised when building an [`AudioBuffer`]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AudioBufferError {
    #[error("Channel count must be at least 1")]
    NoChannels,

    #[error("{len} samples is not a whole number of {channels}-channel frames")]
    PartialFrame { len: usize, channels: u16 },
}

/// Normalized `f32` samples in [-1.0, 1.0], interleaved by channel
#[derive(Debug, Clone, PartialEq)]
pub struct AudioBuffer {
    samples: Vec<f32>,
    sample_rate: u32,
    channels: u16,
}

impl AudioBuffer {
    pub fn new(samples: Vec<f32>, sample_rate: u32, channels: u16) -> Result<Self, AudioBufferError> {
        if channels == 0 {
            return Err(AudioBufferError::NoChannels);
        }
        if samples.len() % channels as usize != 0 {
            return Err(AudioBufferError::PartialFrame {
                len: samples.len(),
                channels,
            });
        }

        Ok(Self {
            samples,
            sample_rate,
            channels,
        })
    }

    /// Single-channel buffer, always valid
    pub fn mono(samples: Vec<f32>, sample_rate: u32) -> Self {
        Self {
            samples,
            sample_rate,
            channels: 1,
        }
    }

    pub fn samples(&self) -> &[f32] {
        &self.samples
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn channels(&self) -> u16 {
        self.channels
    }

    pub fn frames(&self) -> usize {
        self.samples.len() / self.channels as usize
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Duration in seconds
    pub fn duration_secs(&self) -> f32 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.frames() as f32 / self.sample_rate as f32
    }

    pub fn into_samples(self) -> Vec<f32> {
        self.samples
    }

    /// Linear-interpolation resample of every channel to `target_rate`
    pub fn resampled(self, target_rate: u32) -> Self {
        if target_rate == 0 || self.sample_rate == 0 || target_rate == self.sample_rate {
            return self;
        }

        let channels = self.channels as usize;
        let frames = self.frames();
        let ratio = self.sample_rate as f64 / target_rate as f64;
        let output_frames = (frames as f64 / ratio) as usize;
        let mut samples = Vec::with_capacity(output_frames * channels);

        for i in 0..output_frames {
            let src_idx = i as f64 * ratio;
            let idx_floor = src_idx.floor() as usize;
            let idx_ceil = (idx_floor + 1).min(frames - 1);
            let frac = (src_idx - idx_floor as f64) as f32;

            for ch in 0..channels {
                let a = self.samples[idx_floor * channels + ch];
                let b = self.samples[idx_ceil * channels + ch];
                samples.push(a * (1.0 - frac) + b * frac);
            }
        }

        Self {
            samples,
            sample_rate: target_rate,
            channels: self.channels,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_partial_frames() {
        let err = AudioBuffer::new(vec![0.0; 5], 16000, 2).unwrap_err();
        assert_eq!(err, AudioBufferError::PartialFrame { len: 5, channels: 2 });
    }

    #[test]
    fn rejects_zero_channels() {
        assert_eq!(
            AudioBuffer::new(vec![], 16000, 0).unwrap_err(),
            AudioBufferError::NoChannels
        );
    }

    #[test]
    fn frame_count_and_duration() {
        let buffer = AudioBuffer::new(vec![0.0; 32000], 16000, 2).unwrap();
        assert_eq!(buffer.frames(), 16000);
        assert!((buffer.duration_secs() - 1.0).abs() < f32::EPSILON);
    }

    #[test]
    fn downsampling_keeps_every_nth_frame() {
        let samples: Vec<f32> = (0..48).map(|i| i as f32 / 100.0).collect();
        let buffer = AudioBuffer::mono(samples, 48000).resampled(16000);

        assert_eq!(buffer.sample_rate(), 16000);
        assert_eq!(buffer.frames(), 16);
        assert_eq!(buffer.samples()[1], 0.03);
        assert_eq!(buffer.samples()[15], 0.45);
    }

    #[test]
    fn resampling_keeps_channels_apart() {
        let samples: Vec<f32> = [0.5, -0.5].repeat(8);
        let buffer = AudioBuffer::new(samples, 32000, 2)
            .unwrap()
            .resampled(16000);

        assert_eq!(buffer.channels(), 2);
        assert_eq!(buffer.frames(), 4);
        assert_eq!(buffer.samples(), [0.5, -0.5].repeat(4).as_slice());
    }

    #[test]
    fn upsampling_interpolates() {
        let buffer = AudioBuffer::mono(vec![0.0, 1.0], 8000).resampled(16000);
        assert_eq!(buffer.samples(), &[0.0, 0.5, 1.0, 1.0]);
    }

    #[test]
    fn resampling_empty_buffer_only_changes_rate() {
        let buffer = AudioBuffer::new(vec![], 44100, 2).unwrap().resampled(16000);
        assert!(buffer.is_empty());
        assert_eq!(buffer.sample_rate(), 16000);
        assert_eq!(buffer.channels(), 2);
    }
}
