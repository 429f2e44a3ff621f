//! HTTP exchange tests against a mock backend.

use codeai::api::ChatClient;
use codeai::session::{ChatSession, Mode, BACKEND_ERROR_NOTICE, NO_RESPONSE_FALLBACK};
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn mock_reply(server: &MockServer, reply: serde_json::Value) {
    Mock::given(method("POST"))
        .and(path("/api/chat"))
        .respond_with(ResponseTemplate::new(200).set_body_json(reply))
        .mount(server)
        .await;
}

#[tokio::test]
async fn send_returns_reply_text() {
    let server = MockServer::start().await;
    mock_reply(&server, serde_json::json!({ "reply": "use a HashMap" })).await;

    let client = ChatClient::new(&server.uri());
    let reply = client.send("what collection should I use?").await.unwrap();

    assert_eq!(reply, "use a HashMap");
}

#[tokio::test]
async fn send_posts_the_composed_prompt() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/chat"))
        .and(body_json(serde_json::json!({ "message": "hello" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({ "reply": "hi" })))
        .expect(1)
        .mount(&server)
        .await;

    let client = ChatClient::new(&server.uri());
    client.send("hello").await.unwrap();
}

#[tokio::test]
async fn missing_reply_field_becomes_empty() {
    let server = MockServer::start().await;
    mock_reply(&server, serde_json::json!({ "model": "unrelated" })).await;

    let client = ChatClient::new(&server.uri());
    let reply = client.send("hello").await.unwrap();

    assert!(reply.is_empty());
}

#[tokio::test]
async fn server_error_is_an_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/chat"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let client = ChatClient::new(&server.uri());
    assert!(client.send("hello").await.is_err());
}

#[tokio::test]
async fn health_returns_status_field() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/health"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({ "status": "ok" })))
        .mount(&server)
        .await;

    let client = ChatClient::new(&server.uri());
    assert_eq!(client.health().await.unwrap(), "ok");
}

// Full submission cycles through the session, the way the TUI drives them.

#[tokio::test]
async fn session_round_trip_appends_reply() {
    let server = MockServer::start().await;
    mock_reply(&server, serde_json::json!({ "reply": "an answer" })).await;

    let client = ChatClient::new(&server.uri());
    let mut session = ChatSession::new(Mode::Chat);

    let prompt = session.begin_submit("a question").unwrap();
    let result = client.send(&prompt).await;
    session.finish_submit(result);

    assert!(!session.is_sending());
    assert_eq!(session.messages().last().unwrap().content, "an answer");
}

#[tokio::test]
async fn empty_reply_falls_back_after_exchange() {
    let server = MockServer::start().await;
    mock_reply(&server, serde_json::json!({})).await;

    let client = ChatClient::new(&server.uri());
    let mut session = ChatSession::new(Mode::Chat);

    let prompt = session.begin_submit("a question").unwrap();
    let result = client.send(&prompt).await;
    session.finish_submit(result);

    assert_eq!(
        session.messages().last().unwrap().content,
        NO_RESPONSE_FALLBACK
    );
}

#[tokio::test]
async fn failed_exchange_leaves_error_notice_and_releases_guard() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/chat"))
        .respond_with(ResponseTemplate::new(502))
        .mount(&server)
        .await;

    let client = ChatClient::new(&server.uri());
    let mut session = ChatSession::new(Mode::Chat);

    let prompt = session.begin_submit("a question").unwrap();
    let result = client.send(&prompt).await;
    session.finish_submit(result);

    assert!(!session.is_sending());
    assert_eq!(
        session.messages().last().unwrap().content,
        BACKEND_ERROR_NOTICE
    );
}

#[tokio::test]
async fn overlapping_submissions_issue_one_request() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/chat"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({ "reply": "ok" })))
        .expect(1)
        .mount(&server)
        .await;

    let client = ChatClient::new(&server.uri());
    let mut session = ChatSession::new(Mode::Chat);

    let prompt = session.begin_submit("first").unwrap();
    // A second submission while the first is pending is dropped
    assert!(session.begin_submit("second").is_none());

    let result = client.send(&prompt).await;
    session.finish_submit(result);
}
