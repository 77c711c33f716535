//! Capture and classification pipeline
//!
//! Handles the microphone → WAV → emotion endpoint → events flow.

mod capture;
mod emotion;

pub use capture::{
    CaptureError, CaptureSession, SessionState, BUSY_MESSAGE, STARTED_MESSAGE, STOPPED_MESSAGE,
};
pub use emotion::{EmotionPipeline, PipelineError, NO_LABEL_MESSAGE};
