//! Persistence of the last encoded recording
//!
//! Recordings are stored in: ~/.local/share/emopulse/recordings/ unless a
//! directory is configured. Each capture overwrites the previous file.

use crate::audio::{WavError, WavPayload};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const DEFAULT_RECORDING_FILE: &str = "last-recording.wav";

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("No saved recording at {0}")]
    NotFound(PathBuf),

    #[error("Recording I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Saved recording is not usable: {0}")]
    InvalidWav(#[from] WavError),
}

/// Default recordings directory
pub fn default_recordings_dir() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("emopulse")
        .join("recordings")
}

#[derive(Debug, Clone)]
pub struct RecordingStore {
    root: PathBuf,
    file_name: String,
}

impl RecordingStore {
    pub fn new(root: impl Into<PathBuf>, file_name: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            file_name: file_name.into(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn recording_path(&self) -> PathBuf {
        self.root.join(&self.file_name)
    }

    /// Writes the payload, replacing any previous recording
    pub async fn save(&self, payload: &WavPayload) -> Result<PathBuf, StorageError> {
        tokio::fs::create_dir_all(&self.root)
            .await
            .map_err(|source| StorageError::Io {
                path: self.root.clone(),
                source,
            })?;

        let path = self.recording_path();
        tokio::fs::write(&path, payload.as_bytes())
            .await
            .map_err(|source| StorageError::Io {
                path: path.clone(),
                source,
            })?;

        tracing::info!("Saved WAV to: {}", path.display());
        Ok(path)
    }

    /// Reads back and validates the last saved recording
    pub async fn load(&self) -> Result<WavPayload, StorageError> {
        let path = self.recording_path();
        let bytes = match tokio::fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => return Err(StorageError::NotFound(path)),
            Err(source) => return Err(StorageError::Io { path, source }),
        };

        tracing::debug!("Loaded {} bytes from {}", bytes.len(), path.display());
        Ok(WavPayload::from_bytes(bytes)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::{encode, AudioBuffer};
    use tempfile::tempdir;

    #[tokio::test]
    async fn save_then_load() {
        let dir = tempdir().unwrap();
        let store = RecordingStore::new(dir.path().join("nested"), DEFAULT_RECORDING_FILE);
        let payload = encode(&AudioBuffer::mono(vec![0.5, -0.5], 16000), true);

        let path = store.save(&payload).await.unwrap();
        assert_eq!(path, dir.path().join("nested").join(DEFAULT_RECORDING_FILE));

        let loaded = store.load().await.unwrap();
        assert_eq!(loaded, payload);
    }

    #[tokio::test]
    async fn save_overwrites_previous_recording() {
        let dir = tempdir().unwrap();
        let store = RecordingStore::new(dir.path(), "clip.wav");

        store
            .save(&encode(&AudioBuffer::mono(vec![0.1; 100], 16000), true))
            .await
            .unwrap();
        let second = encode(&AudioBuffer::mono(vec![0.2; 10], 16000), true);
        store.save(&second).await.unwrap();

        assert_eq!(store.load().await.unwrap(), second);
    }

    #[tokio::test]
    async fn load_missing_file() {
        let dir = tempdir().unwrap();
        let store = RecordingStore::new(dir.path(), "absent.wav");

        assert!(matches!(store.load().await, Err(StorageError::NotFound(p)) if p.ends_with("absent.wav")));
    }

    #[tokio::test]
    async fn load_rejects_non_wav() {
        let dir = tempdir().unwrap();
        let store = RecordingStore::new(dir.path(), "broken.wav");
        std::fs::write(store.recording_path(), b"garbage").unwrap();

        assert!(matches!(store.load().await, Err(StorageError::InvalidWav(_))));
    }

    #[test]
    fn default_dir_contains_app_name() {
        let dir = default_recordings_dir();
        let path_str = dir.to_string_lossy();
        assert!(path_str.contains("emopulse"));
        assert!(path_str.ends_with("recordings"));
    }
}
