//! Audio capture and encoding
//!
//! Microphone capture into a looping ring buffer and PCM16 WAV serialization.

mod buffer;
mod microphone;
mod ring;
pub mod wav;

pub use buffer::{AudioBuffer, AudioBufferError};
#[cfg(test)]
pub use microphone::MockInputDevice;
pub use microphone::{
    list_input_devices, CaptureRequest, CpalInput, InputDevice, MicrophoneError,
};
pub use ring::CaptureRing;
pub use wav::{encode, WavError, WavPayload};
