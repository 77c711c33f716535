//! HTTP client for the emotion inference endpoint
//!
//! Uploads a WAV payload as multipart form data and reads back
//! `{ "emotion": { "label": ..., "scores": ... }, "raw_result": ... }`.

use crate::audio::WavPayload;
use reqwest::multipart::{Form, Part};
use reqwest::Client;
use serde::Deserialize;
use serde_json::{Map, Value};
use std::time::Duration;
use thiserror::Error;

const FILE_FIELD: &str = "file";
const FILE_NAME: &str = "audio.wav";
const FILE_MIME: &str = "audio/wav";

/// Request-level failures. Nothing is retried.
#[derive(Error, Debug)]
pub enum InferenceError {
    #[error("HTTP client error: {0}")]
    Client(String),

    #[error("Network error: {0}")]
    Transport(String),

    #[error("Emotion API error ({status}): {body}")]
    Status { status: u16, body: String },
}

/// Why a successful response carried no usable label
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("response is not valid JSON: {0}")]
    MalformedJson(String),

    #[error("response JSON has an unexpected shape: {0}")]
    UnexpectedShape(String),

    #[error("response has no `emotion` object")]
    MissingEmotion,

    #[error("response has no `emotion.label`")]
    MissingLabel,

    #[error("`emotion.label` is empty")]
    EmptyLabel,
}

/// Parsed response with a usable label
#[derive(Debug, Clone, PartialEq)]
pub struct InferenceResult {
    /// Trimmed label as returned by the server
    pub label: String,
    pub scores: Option<Map<String, Value>>,
    pub raw_result: Option<Value>,
}

/// Result of a request that reached the server and got a 2xx
#[derive(Debug, Clone, PartialEq)]
pub enum InferenceOutcome {
    Labelled(InferenceResult),
    Unlabelled(ParseError),
}

#[derive(Debug, Deserialize)]
struct EmotionResponse {
    #[serde(default)]
    emotion: Option<EmotionField>,
    #[serde(default)]
    raw_result: Option<Value>,
}

#[derive(Debug, Deserialize)]
struct EmotionField {
    #[serde(default)]
    label: Option<String>,
    #[serde(default)]
    scores: Option<Map<String, Value>>,
}

/// Client bound to one endpoint
#[derive(Debug, Clone)]
pub struct EmotionClient {
    http: Client,
    endpoint: String,
    bearer_token: Option<String>,
}

impl EmotionClient {
    pub fn new(
        endpoint: impl Into<String>,
        bearer_token: Option<String>,
        timeout: Duration,
    ) -> Result<Self, InferenceError> {
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| InferenceError::Client(e.to_string()))?;

        Ok(Self {
            http,
            endpoint: endpoint.into(),
            bearer_token: bearer_token.filter(|t| !t.is_empty()),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Uploads the payload and parses the emotion label out of the response
    pub async fn classify(&self, payload: &WavPayload) -> Result<InferenceOutcome, InferenceError> {
        tracing::info!(
            "Sending {} bytes of audio to {}",
            payload.len(),
            self.endpoint
        );

        let file_part = Part::bytes(payload.as_bytes().to_vec())
            .file_name(FILE_NAME)
            .mime_str(FILE_MIME)
            .map_err(|e| InferenceError::Client(e.to_string()))?;
        let form = Form::new().part(FILE_FIELD, file_part);

        let mut request = self.http.post(&self.endpoint).multipart(form);
        if let Some(token) = &self.bearer_token {
            request = request.bearer_auth(token);
        }

        let response = request
            .send()
            .await
            .map_err(|e| InferenceError::Transport(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| InferenceError::Transport(e.to_string()))?;

        if !status.is_success() {
            tracing::error!("Emotion API error ({}): {}", status.as_u16(), body);
            return Err(InferenceError::Status {
                status: status.as_u16(),
                body,
            });
        }

        tracing::debug!("Emotion API response: {}", body);
        Ok(parse_response(&body))
    }
}

/// Parses a response body, reporting why no label could be extracted
pub fn parse_response(body: &str) -> InferenceOutcome {
    match extract(body) {
        Ok(result) => InferenceOutcome::Labelled(result),
        Err(e) => InferenceOutcome::Unlabelled(e),
    }
}

fn extract(body: &str) -> Result<InferenceResult, ParseError> {
    let value: Value =
        serde_json::from_str(body).map_err(|e| ParseError::MalformedJson(e.to_string()))?;
    let response: EmotionResponse =
        serde_json::from_value(value).map_err(|e| ParseError::UnexpectedShape(e.to_string()))?;

    let emotion = response.emotion.ok_or(ParseError::MissingEmotion)?;
    let label = emotion.label.ok_or(ParseError::MissingLabel)?;
    let label = label.trim();
    if label.is_empty() {
        return Err(ParseError::EmptyLabel);
    }

    Ok(InferenceResult {
        label: label.to_string(),
        scores: emotion.scores,
        raw_result: response.raw_result,
    })
}
