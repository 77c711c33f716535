//! emopulse - microphone emotion detection
//!
//! Records a short utterance, encodes it as PCM16 WAV, posts it to an emotion
//! inference endpoint and broadcasts the resulting emotion state.

pub mod audio;
pub mod config;
pub mod console;
pub mod emotion;
pub mod events;
pub mod pipeline;
pub mod storage;
