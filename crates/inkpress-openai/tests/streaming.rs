use std::{sync::Mutex, time::Duration};

use inkpress_core::{
    AssistantClient,
    config::ProviderSettings,
    error::InkpressError,
    request::{DEEP_THINKING_PREFIX, StreamRequest},
    sink::{FnSink, StreamOutcome, StreamSink},
};
use inkpress_openai::{OpenAiAdapter, OpenAiAdapterBuilder};
use serde_json::{Value, json};
use tokio::{
    io::{AsyncReadExt, AsyncWriteExt},
    net::TcpListener,
};
use wiremock::{
    Mock, MockServer, ResponseTemplate,
    matchers::{header, method, path},
};

const CHAT_PATH: &str = "/v1/chat/completions";

#[derive(Default)]
struct Recorder {
    tokens: Vec<String>,
    errors: Vec<String>,
    finishes: usize,
}

impl StreamSink for Recorder {
    fn on_token(&mut self, token: &str) {
        self.tokens.push(token.to_owned());
    }

    fn on_error(&mut self, error: &InkpressError) {
        self.errors.push(error.to_string());
    }

    fn on_finish(&mut self) {
        self.finishes += 1;
    }
}

fn client_for(server: &MockServer, provider: &str) -> AssistantClient<OpenAiAdapter> {
    client_at(&server.uri(), provider)
}

fn client_at(base_uri: &str, provider: &str) -> AssistantClient<OpenAiAdapter> {
    let settings = ProviderSettings::new(format!("{base_uri}{CHAT_PATH}"), "sk-test", "test-model")
        .with_provider(provider)
        .with_temperature(0.7);
    let adapter = OpenAiAdapterBuilder::new()
        .with_timeout(Duration::from_secs(2))
        .build()
        .unwrap();

    AssistantClient::new(adapter, settings)
}

fn sse(body: &str) -> ResponseTemplate {
    ResponseTemplate::new(200)
        .insert_header("content-type", "text/event-stream")
        .set_body_string(body)
}

const HI_THERE: &str = concat!(
    "data: {\"choices\":[{\"delta\":{\"content\":\"Hi\"}}]}\n\n",
    "data: {\"choices\":[{\"delta\":{\"content\":\" there\"}}]}\n\n",
    "data: [DONE]\n\n",
);

#[tokio::test]
async fn streams_tokens_then_finishes() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(CHAT_PATH))
        .and(header("authorization", "Bearer sk-test"))
        .and(header("accept", "text/event-stream"))
        .respond_with(sse(HI_THERE))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server, "custom");
    let mut sink = Recorder::default();

    let outcome = client.stream_ai_content(StreamRequest::new("Say hi"), &mut sink).await;

    assert_eq!(outcome, StreamOutcome::Finished);
    assert_eq!(sink.tokens, vec!["Hi", " there"]);
    assert_eq!(sink.finishes, 1);
    assert!(sink.errors.is_empty());
    assert!(!client.is_generating());
}

#[tokio::test]
async fn malformed_and_foreign_lines_do_not_stop_the_stream() {
    let server = MockServer::start().await;
    let body = concat!(
        ": keep-alive\n",
        "data: {\"choices\":[{\"delta\":{\"content\":\"a\"}}]}\n",
        "data: {broken\n",
        "{\"choices\":[{\"delta\":{\"content\":\"b\"}}]}\n",
        "data: {\"choices\":[{\"delta\":{}}]}\n",
        "data: [DONE]\n",
    );
    Mock::given(method("POST"))
        .respond_with(sse(body))
        .mount(&server)
        .await;

    let client = client_for(&server, "deepseek");
    let text = client.generate_with_ai("go").await.unwrap();

    assert_eq!(text, "ab");
}

#[tokio::test]
async fn unauthorized_reports_the_provider_message() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(401).set_body_string("{\"error\":\"bad key\"}"))
        .mount(&server)
        .await;

    let client = client_for(&server, "qwen");
    let mut sink = Recorder::default();

    let outcome = client.stream_ai_content(StreamRequest::new("hello"), &mut sink).await;

    assert_eq!(outcome, StreamOutcome::Failed);
    assert!(sink.tokens.is_empty());
    assert_eq!(sink.finishes, 0);
    assert_eq!(sink.errors.len(), 1);
    assert!(sink.errors[0].contains("invalid API key"), "{}", sink.errors[0]);
    assert!(sink.errors[0].contains("Qwen"), "{}", sink.errors[0]);
    assert!(!client.is_generating());
}

#[tokio::test]
async fn rate_limiting_surfaces_as_a_provider_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(429))
        .mount(&server)
        .await;

    let err = client_for(&server, "unknown-vendor")
        .generate_with_ai("hello")
        .await
        .unwrap_err();

    assert_eq!(err.status(), Some(429));
    assert!(err.to_string().contains("rate limited"));
}

#[tokio::test]
async fn no_content_is_a_missing_body() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(204))
        .mount(&server)
        .await;

    let client = client_for(&server, "openai");
    let mut sink = Recorder::default();

    let outcome = client.stream_ai_content(StreamRequest::new("hello"), &mut sink).await;

    assert_eq!(outcome, StreamOutcome::Failed);
    assert_eq!(sink.errors.len(), 1);
    assert!(sink.errors[0].contains("no response body available"));
}

#[tokio::test]
async fn cancelling_before_the_response_calls_no_sink() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(sse(HI_THERE).set_delay(Duration::from_secs(10)))
        .mount(&server)
        .await;

    let client = client_for(&server, "custom");
    let mut sink = Recorder::default();

    let run = async {
        tokio::join!(
            client.stream_ai_content(StreamRequest::new("slow"), &mut sink),
            async {
                tokio::time::sleep(Duration::from_millis(100)).await;
                client.cancel_ai_request()
            }
        )
    };
    let (outcome, had_request) = tokio::time::timeout(Duration::from_secs(5), run)
        .await
        .expect("cancellation did not interrupt the pending request");

    assert!(had_request);
    assert_eq!(outcome, StreamOutcome::Cancelled);
    assert!(sink.tokens.is_empty());
    assert!(sink.errors.is_empty());
    assert_eq!(sink.finishes, 0);
    assert!(!client.is_generating());
    assert!(!client.cancel_ai_request());
}

/// Answers one request with a chunked SSE body holding `first_event`, then
/// keeps the connection open without sending anything else.
async fn stalling_server(first_event: &'static str) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();

        let mut request = Vec::new();
        let mut buf = [0u8; 1024];
        while !request.windows(4).any(|w| w == b"\r\n\r\n") {
            let n = socket.read(&mut buf).await.unwrap();
            if n == 0 {
                return;
            }
            request.extend_from_slice(&buf[..n]);
        }

        let head = "HTTP/1.1 200 OK\r\ncontent-type: text/event-stream\r\ntransfer-encoding: chunked\r\n\r\n";
        let chunk = format!("{:x}\r\n{first_event}\r\n", first_event.len());
        socket.write_all(head.as_bytes()).await.unwrap();
        socket.write_all(chunk.as_bytes()).await.unwrap();
        socket.flush().await.unwrap();

        tokio::time::sleep(Duration::from_secs(30)).await;
    });

    format!("http://{addr}")
}

#[tokio::test]
async fn cancelling_mid_body_keeps_only_delivered_tokens() {
    let base = stalling_server("data: {\"choices\":[{\"delta\":{\"content\":\"Hi\"}}]}\n\n").await;
    let client = client_at(&base, "custom");

    let events = Mutex::new(Vec::new());
    let mut sink = FnSink::new()
        .with_token(|t| events.lock().unwrap().push(format!("token:{t}")))
        .with_error(|e| events.lock().unwrap().push(format!("error:{e}")))
        .with_finish(|| events.lock().unwrap().push("finish".to_owned()));

    let run = async {
        tokio::join!(
            client.stream_ai_content(StreamRequest::new("slow"), &mut sink),
            async {
                while events.lock().unwrap().is_empty() {
                    tokio::time::sleep(Duration::from_millis(10)).await;
                }
                client.cancel_ai_request()
            }
        )
    };
    let (outcome, had_request) = tokio::time::timeout(Duration::from_secs(5), run)
        .await
        .expect("cancellation did not interrupt the pending body read");
    drop(sink);

    assert!(had_request);
    assert_eq!(outcome, StreamOutcome::Cancelled);
    assert_eq!(events.into_inner().unwrap(), vec!["token:Hi"]);
    assert!(!client.is_generating());
    assert!(!client.cancel_ai_request());
}

#[tokio::test]
async fn deep_thinking_shapes_the_request_body() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(sse("data: [DONE]\n\n"))
        .mount(&server)
        .await;

    let client = client_for(&server, "zhipu");
    client.set_settings(
        client
            .settings()
            .with_preset_messages(vec!["Answer in English.".into()]),
    );

    let outcome = client
        .stream_ai_content(StreamRequest::new("Why is the sky blue?").with_deep_thinking(true), &mut ())
        .await;
    assert_eq!(outcome, StreamOutcome::Finished);

    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 1);
    let body: Value = requests[0].body_json().unwrap();

    assert_eq!(body["model"], "test-model");
    assert_eq!(body["stream"], true);
    assert_eq!(body["temperature"], 0.3);
    assert_eq!(body["max_tokens"], 2048);
    assert_eq!(
        body["extra_body"],
        json!({"reasoning_mode": "long", "enable_thinking": true})
    );
    assert_eq!(
        body["messages"],
        json!([
            {"role": "system", "content": "Answer in English."},
            {"role": "user", "content": format!("{DEEP_THINKING_PREFIX}Why is the sky blue?")}
        ])
    );
}

#[tokio::test]
async fn call_ai_returns_the_message_content() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(CHAT_PATH))
        .and(header("content-type", "application/json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "chatcmpl-1",
            "choices": [{"index": 0, "message": {"role": "assistant", "content": "Polished text."}}]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server, "openai");
    let content = client.call_ai("Polish this").await.unwrap();

    assert_eq!(content, "Polished text.");

    let requests = server.received_requests().await.unwrap();
    let body: Value = requests[0].body_json().unwrap();
    assert_eq!(body["stream"], false);
    assert!(body.get("extra_body").is_none());
}

#[tokio::test]
async fn call_ai_propagates_server_errors() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&server)
        .await;

    let err = client_for(&server, "deepseek").call_ai("hi").await.unwrap_err();

    assert!(matches!(err, InkpressError::Provider { status: 500, .. }));
    assert_eq!(err.to_string(), "AI server error, please try again later.");
}

#[tokio::test]
async fn call_ai_times_out() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(5)))
        .mount(&server)
        .await;

    let err = client_for(&server, "openai").call_ai("hi").await.unwrap_err();

    assert!(matches!(err, InkpressError::Backend(_)));
}
