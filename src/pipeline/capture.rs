//! One-shot capture session
//!
//! Opens the input device, waits for it to actually deliver audio, records
//! for a fixed window and hands back the captured samples. Only one capture
//! runs at a time; overlapping requests are rejected, not queued.

use crate::audio::{AudioBuffer, CaptureRequest, InputDevice, MicrophoneError};
use crate::events::EventChannel;
use std::sync::{Arc, Mutex, PoisonError};
use thiserror::Error;
use tokio::task;
use tokio::time::{sleep, timeout, Duration};

pub const STARTED_MESSAGE: &str = "Started recording...";
pub const STOPPED_MESSAGE: &str = "Stopped recording...";
pub const BUSY_MESSAGE: &str = "Currently recording... Can't start new recording session.";

/// Interval between device position checks while waiting for audio
const START_POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Capture lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    Recording,
    Draining,
}

#[derive(Error, Debug)]
pub enum CaptureError {
    #[error("A recording is already in progress")]
    Busy,

    #[error("Audio device error: {0}")]
    Device(#[from] MicrophoneError),

    #[error("Audio device delivered no samples within {0:?}")]
    DeviceTimeout(Duration),
}

pub struct CaptureSession<D: InputDevice> {
    device: Arc<tokio::sync::Mutex<D>>,
    state: Mutex<SessionState>,
    start_timeout: Duration,
    events: EventChannel,
}

/// Puts the session back to Idle however the capture ends
struct IdleOnDrop<'a>(&'a Mutex<SessionState>);

impl Drop for IdleOnDrop<'_> {
    fn drop(&mut self) {
        *self.0.lock().unwrap_or_else(PoisonError::into_inner) = SessionState::Idle;
    }
}

impl<D: InputDevice> CaptureSession<D> {
    pub fn new(device: D, start_timeout: Duration, events: EventChannel) -> Self {
        Self {
            device: Arc::new(tokio::sync::Mutex::new(device)),
            state: Mutex::new(SessionState::Idle),
            start_timeout,
            events,
        }
    }

    pub fn state(&self) -> SessionState {
        *self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn set_state(&self, state: SessionState) {
        *self.state.lock().unwrap_or_else(PoisonError::into_inner) = state;
    }

    /// Records `request.duration` of audio once the device is live
    pub async fn capture(&self, request: &CaptureRequest) -> Result<AudioBuffer, CaptureError> {
        {
            let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
            if *state != SessionState::Idle {
                drop(state);
                tracing::warn!("Capture rejected, session is busy");
                self.events.publish_feedback(BUSY_MESSAGE);
                return Err(CaptureError::Busy);
            }
            *state = SessionState::Recording;
        }
        let _idle = IdleOnDrop(&self.state);

        self.events.publish_feedback(STARTED_MESSAGE);

        self.start_device(request).await?;

        if timeout(self.start_timeout, self.wait_for_audio()).await.is_err() {
            tracing::error!(
                "Audio device produced nothing after {:?}, giving up",
                self.start_timeout
            );
            if let Err(e) = self.device.lock().await.end() {
                tracing::warn!("Failed to release silent device: {}", e);
            }
            return Err(CaptureError::DeviceTimeout(self.start_timeout));
        }

        sleep(request.duration).await;

        self.set_state(SessionState::Draining);
        let buffer = self.device.lock().await.end()?;

        tracing::info!(
            "Captured {:.2}s ({} frames, {} ch @ {}Hz)",
            buffer.duration_secs(),
            buffer.frames(),
            buffer.channels(),
            buffer.sample_rate()
        );
        self.events.publish_feedback(STOPPED_MESSAGE);

        Ok(buffer)
    }

    /// Opening a stream blocks until the audio thread reports back
    async fn start_device(&self, request: &CaptureRequest) -> Result<(), MicrophoneError> {
        let device = Arc::clone(&self.device);
        let request = request.clone();

        task::spawn_blocking(move || device.blocking_lock().start(&request))
            .await
            .map_err(|e| MicrophoneError::StreamError(format!("device start task failed: {}", e)))?
    }

    async fn wait_for_audio(&self) {
        loop {
            let position = self.device.lock().await.position();
            if position > 0 {
                tracing::debug!("Audio device live at position {}", position);
                return;
            }
            sleep(START_POLL_INTERVAL).await;
        }
    }
}
