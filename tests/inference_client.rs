//! Wire-level tests for the emotion inference client
//!
//! Runs the client against a local wiremock server, no real endpoint needed.

use emopulse::audio::{encode, AudioBuffer, WavPayload};
use emopulse::emotion::{EmotionClient, InferenceError, InferenceOutcome, ParseError};
use std::time::Duration;
use wiremock::matchers::{header, header_exists, method, path};
use wiremock::{Match, Mock, MockServer, Request, ResponseTemplate};

/// Matches requests whose raw body contains every given byte sequence
struct BodyContains(Vec<Vec<u8>>);

impl Match for BodyContains {
    fn matches(&self, request: &Request) -> bool {
        self.0.iter().all(|needle| {
            request
                .body
                .windows(needle.len())
                .any(|window| window == needle.as_slice())
        })
    }
}

fn payload() -> WavPayload {
    encode(&AudioBuffer::mono(vec![0.0, 0.5, -0.5, 1.0], 16000), true)
}

fn client_for(server: &MockServer, token: Option<&str>) -> EmotionClient {
    EmotionClient::new(
        format!("{}/predict_emotion", server.uri()),
        token.map(str::to_string),
        Duration::from_secs(5),
    )
    .unwrap()
}

#[tokio::test]
async fn uploads_wav_as_multipart_file_with_bearer() {
    let server = MockServer::start().await;
    let payload = payload();

    Mock::given(method("POST"))
        .and(path("/predict_emotion"))
        .and(header("authorization", "Bearer secret-token"))
        .and(BodyContains(vec![
            b"name=\"file\"".to_vec(),
            b"filename=\"audio.wav\"".to_vec(),
            b"audio/wav".to_vec(),
            payload.as_bytes().to_vec(),
        ]))
        .respond_with(
            ResponseTemplate::new(200).set_body_string(
                r#"{"emotion":{"label":"happy","scores":{"happy":0.97}},"raw_result":{"id":7}}"#,
            ),
        )
        .expect(1)
        .mount(&server)
        .await;

    let outcome = client_for(&server, Some("secret-token"))
        .classify(&payload)
        .await
        .unwrap();

    match outcome {
        InferenceOutcome::Labelled(result) => {
            assert_eq!(result.label, "happy");
            assert!(result.scores.is_some());
            assert_eq!(result.raw_result.unwrap()["id"], 7);
        }
        other => panic!("expected a label, got {:?}", other),
    }
}

#[tokio::test]
async fn missing_or_empty_token_sends_no_authorization() {
    let server = MockServer::start().await;

    // Mounted first so it wins whenever the header is present
    Mock::given(header_exists("authorization"))
        .respond_with(ResponseTemplate::new(500))
        .expect(0)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/predict_emotion"))
        .respond_with(
            ResponseTemplate::new(200).set_body_string(r#"{"emotion":{"label":"sad"}}"#),
        )
        .expect(2)
        .mount(&server)
        .await;

    for token in [None, Some("")] {
        let outcome = client_for(&server, token)
            .classify(&payload())
            .await
            .unwrap();
        assert!(matches!(outcome, InferenceOutcome::Labelled(ref r) if r.label == "sad"));
    }

    assert_eq!(server.received_requests().await.unwrap().len(), 2);
}

#[tokio::test]
async fn non_success_status_is_an_error_with_body() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(401).set_body_string("bad token"))
        .expect(1)
        .mount(&server)
        .await;

    let err = client_for(&server, None)
        .classify(&payload())
        .await
        .unwrap_err();

    match err {
        InferenceError::Status { status, body } => {
            assert_eq!(status, 401);
            assert_eq!(body, "bad token");
        }
        other => panic!("expected a status error, got {:?}", other),
    }
}

#[tokio::test]
async fn unusable_bodies_are_outcomes_not_errors() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"emotion":{}}"#))
        .mount(&server)
        .await;

    let outcome = client_for(&server, None).classify(&payload()).await.unwrap();
    assert_eq!(outcome, InferenceOutcome::Unlabelled(ParseError::MissingLabel));
}

#[tokio::test]
async fn unreachable_endpoint_is_a_transport_error() {
    // Grab a free port, then close it again
    let port = {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap().port()
    };
    let client = EmotionClient::new(
        format!("http://127.0.0.1:{}/predict_emotion", port),
        None,
        Duration::from_secs(2),
    )
    .unwrap();

    let err = client.classify(&payload()).await.unwrap_err();
    assert!(matches!(err, InferenceError::Transport(_)));
}
