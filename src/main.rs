//! emopulse - microphone emotion detection
//!
//! Press enter to record a short utterance and have its emotion classified
//! by the configured inference endpoint.

use emopulse::audio::{list_input_devices, CpalInput};
use emopulse::config::AppConfig;
use emopulse::console;
use emopulse::emotion::EmotionClient;
use emopulse::events::EventChannel;
use emopulse::pipeline::EmotionPipeline;
use emopulse::storage::RecordingStore;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "emopulse=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("emopulse v{}", env!("CARGO_PKG_VERSION"));

    let config_path = AppConfig::default_path();
    let config = AppConfig::load(&config_path).with_env_overrides();

    let devices = list_input_devices();
    tracing::info!("Audio input devices: {:?}", devices);

    let events = EventChannel::new();
    console::attach_printers(&events);

    let client = EmotionClient::new(
        config.endpoint.clone(),
        config.bearer_token(),
        config.request_timeout(),
    )?;
    let store = RecordingStore::new(config.recordings_dir(), config.recording_file_name.clone());
    tracing::info!(
        "Endpoint: {}, recordings in {}",
        client.endpoint(),
        store.root().display()
    );

    let pipeline = Arc::new(EmotionPipeline::new(
        CpalInput::new(),
        config.capture_request(),
        config.device_start_timeout(),
        store,
        client,
        events,
    ));

    console::run(pipeline).await?;
    Ok(())
}
