//! Microphone capture
//!
//! Uses cpal for cross-platform capture. The stream runs on a dedicated thread
//! and writes into a looping [`CaptureRing`] shared with the caller.

use super::buffer::AudioBuffer;
use super::ring::CaptureRing;
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{Device, SampleFormat, StreamConfig};
use std::sync::{mpsc, Arc, Mutex, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::Duration;
use thiserror::Error;

/// Parameters of one recording pass
#[derive(Debug, Clone, PartialEq)]
pub struct CaptureRequest {
    /// Length of the recording window
    pub duration: Duration,
    /// Input device name, `None` for the host default
    pub device_name: Option<String>,
    /// Length of the looping device buffer
    pub ring_seconds: u32,
    /// Sample rate of the returned buffer (16kHz suits speech models).
    /// Devices record at their native rate and are resampled on `end`.
    pub sample_rate: u32,
    /// Average channels down to mono when encoding
    pub force_mono: bool,
}

impl Default for CaptureRequest {
    fn default() -> Self {
        Self {
            duration: Duration::from_secs(3),
            device_name: None,
            ring_seconds: 10,
            sample_rate: 16000,
            force_mono: true,
        }
    }
}

/// Microphone capture errors
#[derive(Error, Debug)]
pub enum MicrophoneError {
    #[error("No audio device found")]
    NoDevice,

    #[error("Audio device not found: {0}")]
    DeviceNotFound(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Stream error: {0}")]
    StreamError(String),

    #[error("Audio capture not started")]
    NotStarted,
}

/// An input device that records into a looping buffer
#[cfg_attr(test, mockall::automock)]
pub trait InputDevice: Send + 'static {
    /// Opens the device and starts writing into a fresh ring buffer
    fn start(&mut self, request: &CaptureRequest) -> Result<(), MicrophoneError>;

    /// Samples written since `start`, 0 until the device delivers audio
    fn position(&self) -> usize;

    /// Stops the device and returns the captured samples
    fn end(&mut self) -> Result<AudioBuffer, MicrophoneError>;
}

/// Commands to control the audio thread
enum AudioCommand {
    Stop,
}

struct CaptureThread {
    command_tx: mpsc::Sender<AudioCommand>,
    thread_handle: JoinHandle<()>,
    native_rate: u32,
    target_rate: u32,
}

impl CaptureThread {
    fn stop(self) {
        let _ = self.command_tx.send(AudioCommand::Stop);
        if self.thread_handle.join().is_err() {
            tracing::error!("Audio capture thread panicked");
        }
    }
}

/// cpal-backed input device
pub struct CpalInput {
    ring: Arc<Mutex<CaptureRing>>,
    capture: Option<CaptureThread>,
}

impl CpalInput {
    pub fn new() -> Self {
        Self {
            ring: Arc::new(Mutex::new(CaptureRing::with_frames(0, 1))),
            capture: None,
        }
    }

    fn ring(&self) -> std::sync::MutexGuard<'_, CaptureRing> {
        self.ring.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for CpalInput {
    fn default() -> Self {
        Self::new()
    }
}

impl InputDevice for CpalInput {
    fn start(&mut self, request: &CaptureRequest) -> Result<(), MicrophoneError> {
        if let Some(previous) = self.capture.take() {
            tracing::warn!("Restarting audio capture, previous stream discarded");
            previous.stop();
        }

        let (command_tx, command_rx) = mpsc::channel();
        let (ready_tx, ready_rx) = mpsc::channel();
        let ring = Arc::clone(&self.ring);
        let thread_request = request.clone();

        let thread_handle = thread::Builder::new()
            .name("emopulse-capture".into())
            .spawn(move || {
                if let Err(e) = run_audio_capture(thread_request, ring, &ready_tx, command_rx) {
                    tracing::error!("Audio capture error: {}", e);
                    let _ = ready_tx.send(Err(e));
                }
            })
            .map_err(|e| MicrophoneError::StreamError(e.to_string()))?;

        match ready_rx.recv() {
            Ok(Ok(native_rate)) => {
                self.capture = Some(CaptureThread {
                    command_tx,
                    thread_handle,
                    native_rate,
                    target_rate: request.sample_rate,
                });
                Ok(())
            }
            Ok(Err(e)) => {
                let _ = thread_handle.join();
                Err(e)
            }
            Err(_) => {
                let _ = thread_handle.join();
                Err(MicrophoneError::StreamError(
                    "audio thread exited before starting".into(),
                ))
            }
        }
    }

    fn position(&self) -> usize {
        self.ring().written()
    }

    fn end(&mut self) -> Result<AudioBuffer, MicrophoneError> {
        let capture = self.capture.take().ok_or(MicrophoneError::NotStarted)?;
        let (native_rate, target_rate) = (capture.native_rate, capture.target_rate);
        capture.stop();

        let mut ring = self.ring();
        let channels = ring.channels();
        let samples = ring.take();
        tracing::debug!(
            "Extracted {} samples ({} ch) from capture ring",
            samples.len(),
            channels
        );

        let buffer = AudioBuffer::new(samples, native_rate, channels)
            .map_err(|e| MicrophoneError::StreamError(e.to_string()))?;
        drop(ring);

        Ok(buffer.resampled(target_rate))
    }
}

impl Drop for CpalInput {
    fn drop(&mut self) {
        if let Some(capture) = self.capture.take() {
            capture.stop();
        }
    }
}

/// List available input devices
pub fn list_input_devices() -> Vec<String> {
    let host = cpal::default_host();
    host.input_devices()
        .map(|devices| devices.filter_map(|d| d.name().ok()).collect())
        .unwrap_or_default()
}

fn find_device(name: Option<&str>) -> Result<Device, MicrophoneError> {
    let host = cpal::default_host();
    match name {
        None => host.default_input_device().ok_or(MicrophoneError::NoDevice),
        Some(wanted) => host
            .input_devices()
            .map_err(|e| MicrophoneError::ConfigError(e.to_string()))?
            .find(|d| d.name().map(|n| n == wanted).unwrap_or(false))
            .ok_or_else(|| MicrophoneError::DeviceNotFound(wanted.to_string())),
    }
}

/// Run audio capture (in a dedicated thread)
fn run_audio_capture(
    request: CaptureRequest,
    ring: Arc<Mutex<CaptureRing>>,
    ready_tx: &mpsc::Sender<Result<u32, MicrophoneError>>,
    command_rx: mpsc::Receiver<AudioCommand>,
) -> Result<(), MicrophoneError> {
    let device = find_device(request.device_name.as_deref())?;
    tracing::info!("Audio device: {:?}", device.name());

    let supported_config = device
        .default_input_config()
        .map_err(|e| MicrophoneError::ConfigError(e.to_string()))?;

    // Record at the device's native config, resampled once capture ends
    let native_rate = supported_config.sample_rate().0;
    let channels = supported_config.channels();
    let sample_format = supported_config.sample_format();
    let stream_config: StreamConfig = supported_config.into();

    tracing::info!(
        "Audio config: {}Hz {}ch {:?} -> {}Hz, {}s ring",
        native_rate,
        channels,
        sample_format,
        request.sample_rate,
        request.ring_seconds
    );

    *ring.lock().unwrap_or_else(PoisonError::into_inner) =
        CaptureRing::for_duration(request.ring_seconds, native_rate, channels);

    let stream = match sample_format {
        SampleFormat::I16 => build_stream::<i16>(&device, &stream_config, ring),
        SampleFormat::U16 => build_stream::<u16>(&device, &stream_config, ring),
        SampleFormat::F32 => build_stream::<f32>(&device, &stream_config, ring),
        other => Err(MicrophoneError::ConfigError(format!(
            "unsupported sample format {:?}",
            other
        ))),
    }?;

    stream
        .play()
        .map_err(|e| MicrophoneError::StreamError(e.to_string()))?;

    tracing::info!("Audio capture started");
    let _ = ready_tx.send(Ok(native_rate));

    // Wait for stop signal
    loop {
        match command_rx.recv_timeout(Duration::from_millis(100)) {
            Ok(AudioCommand::Stop) => {
                tracing::info!("Audio capture stopped");
                break;
            }
            Err(mpsc::RecvTimeoutError::Timeout) => continue,
            Err(mpsc::RecvTimeoutError::Disconnected) => break,
        }
    }

    Ok(())
}

fn build_stream<T>(
    device: &Device,
    config: &StreamConfig,
    ring: Arc<Mutex<CaptureRing>>,
) -> Result<cpal::Stream, MicrophoneError>
where
    T: cpal::SizedSample + Send + 'static,
    f32: cpal::FromSample<T>,
{
    device
        .build_input_stream(
            config,
            move |data: &[T], _: &cpal::InputCallbackInfo| {
                let samples: Vec<f32> = data
                    .iter()
                    .map(|&s| <f32 as cpal::FromSample<T>>::from_sample_(s))
                    .collect();
                ring.lock()
                    .unwrap_or_else(PoisonError::into_inner)
                    .push_slice(&samples);
            },
            |err| {
                tracing::error!("Audio stream error: {}", err);
            },
            None,
        )
        .map_err(|e| MicrophoneError::StreamError(e.to_string()))
}
