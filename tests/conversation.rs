//! End-to-end submissions against a mock generation endpoint.

use std::sync::Arc;
use std::time::Duration;

use promptline::{
    ChatMessage, GenerateClient, GenerationOptions, Session, SubmissionController, SubmitOutcome,
    FALLBACK_MESSAGE,
};
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn converse(server: &MockServer, input: &str, timeout: Duration) -> (Session, SubmitOutcome) {
    let client = GenerateClient::new(&server.uri(), timeout).unwrap();
    let (controller, mut completions) =
        SubmissionController::new(Arc::new(client), GenerationOptions::default());
    let mut session = Session::new();

    let outcome = controller.submit(&mut session, input);
    if outcome == SubmitOutcome::Accepted {
        assert!(session.is_pending());
        let completion = completions.recv().await.unwrap();
        controller.resolve(&mut session, completion);
    }

    (session, outcome)
}

#[tokio::test]
async fn test_reply_is_appended_after_prompt() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/generate"))
        .and(body_json(serde_json::json!({
            "prompt": "Hello",
            "max_length": 1000,
            "temperature": 0.7,
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({ "response": "Hi there" })))
        .expect(1)
        .mount(&server)
        .await;

    let (session, _) = converse(&server, "Hello", Duration::from_secs(5)).await;

    assert_eq!(
        session.transcript().messages(),
        &[ChatMessage::user("Hello"), ChatMessage::assistant("Hi there")]
    );
    assert!(!session.is_pending());
}

#[tokio::test]
async fn test_server_error_becomes_fallback_message() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/generate"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let (session, _) = converse(&server, "Hello", Duration::from_secs(5)).await;

    assert_eq!(
        session.transcript().messages(),
        &[ChatMessage::user("Hello"), ChatMessage::assistant(FALLBACK_MESSAGE)]
    );
    assert!(!session.is_pending());
}

#[tokio::test]
async fn test_empty_prompt_sends_nothing() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let (session, outcome) = converse(&server, "", Duration::from_secs(5)).await;

    assert_eq!(outcome, SubmitOutcome::Empty);
    assert!(session.transcript().is_empty());
}

#[tokio::test]
async fn test_missing_response_field_becomes_fallback_message() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/generate"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({ "foo": "bar" })))
        .mount(&server)
        .await;

    let (session, _) = converse(&server, "Hello", Duration::from_secs(5)).await;

    assert_eq!(session.transcript().len(), 2);
    assert_eq!(
        session.transcript().get(1),
        Some(&ChatMessage::assistant(FALLBACK_MESSAGE))
    );
}

#[tokio::test]
async fn test_timeout_becomes_fallback_message() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/generate"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(serde_json::json!({ "response": "too late" }))
                .set_delay(Duration::from_secs(2)),
        )
        .mount(&server)
        .await;

    let (session, _) = converse(&server, "Hello", Duration::from_millis(200)).await;

    assert_eq!(
        session.transcript().last(),
        Some(&ChatMessage::assistant(FALLBACK_MESSAGE))
    );
    assert!(!session.is_pending());
}
