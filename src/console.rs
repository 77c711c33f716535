//! Console front-end
//!
//! Reads commands from stdin and prints published events, standing in for
//! the key binding and UI that would normally drive the pipeline.

use crate::audio::{list_input_devices, InputDevice};
use crate::events::EventChannel;
use crate::pipeline::EmotionPipeline;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};

pub const HELP: &str = "Commands:
  <enter> | r | record   record and classify an utterance
  s | send               classify the last saved recording again
  d | devices            list audio input devices
  q | quit               exit";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Record,
    SendSaved,
    Devices,
    Help,
    Quit,
}

impl Command {
    /// Unknown input maps to [`Command::Help`]
    pub fn parse(line: &str) -> Self {
        match line.trim().to_lowercase().as_str() {
            "" | "r" | "record" => Command::Record,
            "s" | "send" => Command::SendSaved,
            "d" | "devices" => Command::Devices,
            "q" | "quit" | "exit" => Command::Quit,
            _ => Command::Help,
        }
    }
}

/// Prints every emotion and feedback event to stdout
pub fn attach_printers(events: &EventChannel) {
    events.on_emotion_state(|state| println!("Last Emotion State: {}", state));
    events.on_feedback_text(|text| println!("> {}", text));
}

/// Runs commands until `quit` or end of input.
///
/// Recordings run as background tasks so a second request while one is in
/// flight reaches the session and is rejected as busy.
pub async fn run<D>(pipeline: Arc<EmotionPipeline<D>>) -> std::io::Result<()>
where
    D: InputDevice,
{
    println!("{}", HELP);
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    while let Some(line) = lines.next_line().await? {
        match Command::parse(&line) {
            Command::Record => {
                let pipeline = Arc::clone(&pipeline);
                tokio::spawn(async move {
                    if let Err(e) = pipeline.record_and_classify().await {
                        tracing::debug!("Recording attempt ended: {}", e);
                    }
                });
            }
            Command::SendSaved => {
                let pipeline = Arc::clone(&pipeline);
                tokio::spawn(async move {
                    if let Err(e) = pipeline.classify_saved_recording().await {
                        tracing::debug!("Saved recording attempt ended: {}", e);
                    }
                });
            }
            Command::Devices => {
                let devices = list_input_devices();
                if devices.is_empty() {
                    println!("No input devices found");
                }
                for device in &devices {
                    println!("  - {}", device);
                }
            }
            Command::Help => println!("{}", HELP),
            Command::Quit => break,
        }
    }

    tracing::info!("Console closed");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_commands() {
        assert_eq!(Command::parse(""), Command::Record);
        assert_eq!(Command::parse("  R "), Command::Record);
        assert_eq!(Command::parse("send"), Command::SendSaved);
        assert_eq!(Command::parse("d"), Command::Devices);
        assert_eq!(Command::parse("QUIT"), Command::Quit);
        assert_eq!(Command::parse("dance"), Command::Help);
    }
}
