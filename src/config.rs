//! Application configuration
//!
//! Read from `$EMOPULSE_CONFIG` or `<config dir>/emopulse/config.json`.
//! Every field has a default, so a partial file is fine.

use crate::audio::CaptureRequest;
use crate::storage::{default_recordings_dir, DEFAULT_RECORDING_FILE};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const CONFIG_PATH_ENV: &str = "EMOPULSE_CONFIG";
pub const ENDPOINT_ENV: &str = "EMOPULSE_ENDPOINT";
pub const AUTH_TOKEN_ENV: &str = "EMOPULSE_AUTH_TOKEN";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Emotion inference endpoint
    pub endpoint: String,
    /// Bearer token, empty for none
    pub auth_bearer: String,
    /// Input device name, default device when unset
    pub device_name: Option<String>,
    pub sample_rate: u32,
    /// Length of the looping device buffer
    pub ring_buffer_seconds: u32,
    /// Length of one recording
    pub recording_seconds: f32,
    pub force_mono: bool,
    /// How long to wait for the device to deliver its first samples
    pub device_start_timeout_ms: u64,
    pub request_timeout_secs: u64,
    pub storage_dir: Option<PathBuf>,
    pub recording_file_name: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://127.0.0.1:8000/predict_emotion".to_string(),
            auth_bearer: String::new(),
            device_name: None,
            sample_rate: 16000,
            ring_buffer_seconds: 10,
            recording_seconds: 3.0,
            force_mono: true,
            device_start_timeout_ms: 5000,
            request_timeout_secs: 60,
            storage_dir: None,
            recording_file_name: DEFAULT_RECORDING_FILE.to_string(),
        }
    }
}

impl AppConfig {
    /// Config file path
    pub fn default_path() -> PathBuf {
        if let Ok(path) = std::env::var(CONFIG_PATH_ENV) {
            if !path.is_empty() {
                return PathBuf::from(path);
            }
        }

        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("emopulse")
            .join("config.json")
    }

    /// Load config from disk, or return defaults
    pub fn load(path: &Path) -> Self {
        if path.exists() {
            match std::fs::read_to_string(path) {
                Ok(content) => match serde_json::from_str(&content) {
                    Ok(config) => {
                        tracing::info!("Config loaded from {}", path.display());
                        return config;
                    }
                    Err(e) => tracing::warn!("Invalid config, using defaults: {}", e),
                },
                Err(e) => tracing::warn!("Cannot read config: {}", e),
            }
        }
        Self::default()
    }

    /// Applies `EMOPULSE_ENDPOINT` and `EMOPULSE_AUTH_TOKEN` when set
    pub fn with_env_overrides(mut self) -> Self {
        if let Some(endpoint) = non_empty_env(ENDPOINT_ENV) {
            self.endpoint = endpoint;
        }
        if let Some(token) = non_empty_env(AUTH_TOKEN_ENV) {
            self.auth_bearer = token;
        }
        self
    }

    /// Save config to disk
    pub fn save(&self, path: &Path) -> std::io::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
        std::fs::write(path, json)?;
        tracing::info!("Config saved to {}", path.display());
        Ok(())
    }

    pub fn bearer_token(&self) -> Option<String> {
        Some(self.auth_bearer.trim())
            .filter(|t| !t.is_empty())
            .map(str::to_string)
    }

    pub fn capture_request(&self) -> CaptureRequest {
        CaptureRequest {
            duration: Duration::from_secs_f32(self.recording_seconds.max(0.0)),
            device_name: self.device_name.clone().filter(|n| !n.is_empty()),
            ring_seconds: self.ring_buffer_seconds.max(1),
            sample_rate: self.sample_rate,
            force_mono: self.force_mono,
        }
    }

    pub fn device_start_timeout(&self) -> Duration {
        Duration::from_millis(self.device_start_timeout_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn recordings_dir(&self) -> PathBuf {
        self.storage_dir.clone().unwrap_or_else(default_recordings_dir)
    }
}

fn non_empty_env(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.is_empty())
}
