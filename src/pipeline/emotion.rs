//! Capture → encode → upload → classify
//!
//! Every failure ends the attempt, is logged and reported as feedback text.
//! Only a labelled response changes the emotion state.

use super::capture::{CaptureError, CaptureSession, SessionState};
use crate::audio::{encode, CaptureRequest, InputDevice, WavPayload};
use crate::emotion::{EmotionClient, EmotionState, InferenceError, InferenceOutcome};
use crate::events::EventChannel;
use crate::storage::{RecordingStore, StorageError};
use thiserror::Error;
use tokio::time::Duration;

pub const NO_LABEL_MESSAGE: &str = "No emotion label available";

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error(transparent)]
    Capture(#[from] CaptureError),

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error(transparent)]
    Inference(#[from] InferenceError),
}

pub struct EmotionPipeline<D: InputDevice> {
    session: CaptureSession<D>,
    request: CaptureRequest,
    store: RecordingStore,
    client: EmotionClient,
    events: EventChannel,
}

impl<D: InputDevice> EmotionPipeline<D> {
    pub fn new(
        device: D,
        request: CaptureRequest,
        device_start_timeout: Duration,
        store: RecordingStore,
        client: EmotionClient,
        events: EventChannel,
    ) -> Self {
        Self {
            session: CaptureSession::new(device, device_start_timeout, events.clone()),
            request,
            store,
            client,
            events,
        }
    }

    pub fn session_state(&self) -> SessionState {
        self.session.state()
    }

    pub fn events(&self) -> &EventChannel {
        &self.events
    }

    /// Records one utterance, saves it and classifies it.
    ///
    /// Returns `Ok(None)` when the server answered without a usable label.
    pub async fn record_and_classify(&self) -> Result<Option<EmotionState>, PipelineError> {
        let buffer = match self.session.capture(&self.request).await {
            Ok(buffer) => buffer,
            // already reported by the session
            Err(CaptureError::Busy) => return Err(CaptureError::Busy.into()),
            Err(e) => {
                tracing::error!("Capture failed: {}", e);
                self.events.publish_feedback(format!("Recording failed: {}", e));
                return Err(e.into());
            }
        };

        let payload = encode(&buffer, self.request.force_mono);

        if let Err(e) = self.store.save(&payload).await {
            tracing::error!("Failed to save recording: {}", e);
            self.events
                .publish_feedback(format!("Could not save recording: {}", e));
            return Err(e.into());
        }

        Ok(self.analyze(&payload).await?)
    }

    /// Sends the last saved recording again
    pub async fn classify_saved_recording(&self) -> Result<Option<EmotionState>, PipelineError> {
        let payload = match self.store.load().await {
            Ok(payload) => payload,
            Err(e) => {
                tracing::error!("Cannot load saved recording: {}", e);
                self.events.publish_feedback(format!("No usable saved recording: {}", e));
                return Err(e.into());
            }
        };

        Ok(self.analyze(&payload).await?)
    }

    /// Uploads a payload and publishes the resulting emotion state
    pub async fn analyze(&self, payload: &WavPayload) -> Result<Option<EmotionState>, InferenceError> {
        self.events.publish_feedback("Analyzing emotion...");

        match self.client.classify(payload).await {
            Ok(InferenceOutcome::Labelled(result)) => {
                let state = EmotionState::from_label(&result.label);
                tracing::info!("Emotion label {:?} resolved to {}", result.label, state);
                self.events.publish_emotion(state);
                self.events
                    .publish_feedback(format!("Emotion detected: {}", state));
                Ok(Some(state))
            }
            Ok(InferenceOutcome::Unlabelled(reason)) => {
                tracing::warn!("Emotion response unusable: {}", reason);
                self.events.publish_feedback(NO_LABEL_MESSAGE);
                Ok(None)
            }
            Err(e) => {
                tracing::error!("Emotion request failed: {}", e);
                self.events
                    .publish_feedback(format!("Emotion request failed: {}", e));
                Err(e)
            }
        }
    }
}
