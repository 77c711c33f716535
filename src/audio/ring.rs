//! Looping capture buffer
//!
//! Wraps a ringbuf heap ring that overwrites its oldest samples once full, so
//! a device can keep writing indefinitely while only the latest window is kept.

use ringbuf::{traits::*, HeapRb};

pub struct CaptureRing {
    rb: HeapRb<f32>,
    capacity: usize,
    channels: u16,
    written: usize,
}

impl CaptureRing {
    /// Ring holding `seconds` of `channels`-channel audio at `sample_rate`
    pub fn for_duration(seconds: u32, sample_rate: u32, channels: u16) -> Self {
        let frames = seconds as usize * sample_rate as usize;
        Self::with_frames(frames, channels)
    }

    pub fn with_frames(frames: usize, channels: u16) -> Self {
        let channels = channels.max(1);
        let capacity = (frames * channels as usize).max(channels as usize);

        Self {
            rb: HeapRb::new(capacity),
            capacity,
            channels,
            written: 0,
        }
    }

    /// Appends interleaved samples, overwriting the oldest ones when full
    pub fn push_slice(&mut self, samples: &[f32]) {
        let keep = if samples.len() > self.capacity {
            &samples[samples.len() - self.capacity..]
        } else {
            samples
        };
        self.rb.push_slice_overwrite(keep);
        self.written += samples.len();
    }

    /// Total samples written since creation, including overwritten ones
    pub fn written(&self) -> usize {
        self.written
    }

    pub fn channels(&self) -> u16 {
        self.channels
    }

    /// Samples currently held
    pub fn len(&self) -> usize {
        self.rb.occupied_len()
    }

    pub fn is_empty(&self) -> bool {
        self.rb.is_empty()
    }

    /// Drains the ring in chronological order, trimmed to whole frames
    pub fn take(&mut self) -> Vec<f32> {
        let mut samples: Vec<f32> = self.rb.pop_iter().collect();
        let partial = samples.len() % self.channels as usize;
        if partial != 0 {
            samples.drain(..partial);
        }
        samples
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keeps_everything_below_capacity() {
        let mut ring = CaptureRing::with_frames(8, 1);
        ring.push_slice(&[0.1, 0.2, 0.3]);

        assert_eq!(ring.written(), 3);
        assert_eq!(ring.take(), vec![0.1, 0.2, 0.3]);
        assert!(ring.is_empty());
    }

    #[test]
    fn overwrites_oldest_when_full() {
        let mut ring = CaptureRing::with_frames(4, 1);
        ring.push_slice(&[1.0, 2.0, 3.0]);
        ring.push_slice(&[4.0, 5.0, 6.0]);

        assert_eq!(ring.written(), 6);
        assert_eq!(ring.len(), 4);
        assert_eq!(ring.take(), vec![3.0, 4.0, 5.0, 6.0]);
    }

    #[test]
    fn oversized_push_keeps_tail() {
        let mut ring = CaptureRing::with_frames(2, 2);
        ring.push_slice(&[1.0, 1.0, 2.0, 2.0, 3.0, 3.0]);

        assert_eq!(ring.take(), vec![2.0, 2.0, 3.0, 3.0]);
    }

    #[test]
    fn duration_sizing() {
        let mut ring = CaptureRing::for_duration(1, 4, 2);
        ring.push_slice(&[0.0; 10]);
        assert_eq!(ring.len(), 8);
        assert_eq!(ring.channels(), 2);
    }
}
