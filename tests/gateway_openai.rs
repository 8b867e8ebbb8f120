use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use serde_json::json;
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, Request, Respond, ResponseTemplate};

use trendscout::gateway::openai::{ChatProvider, EmbedProvider, OpenAiAdapter};
use trendscout::gateway::{
    ChatGateway, ChatModel, ChatRequest, EmbedModel, EmbedRequest, FinishReason, GatewayConfig,
    Message, ProviderError, ProviderGateway,
};

fn adapter_for(server: &MockServer) -> OpenAiAdapter {
    OpenAiAdapter::with_config("sk-test", server.uri(), Duration::from_secs(5)).unwrap()
}

#[tokio::test]
async fn openai_parses_success_content_and_usage() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "choices": [{
                "message": { "content": "hello" },
                "finish_reason": "stop"
            }],
            "usage": { "prompt_tokens": 10, "completion_tokens": 20 }
        })))
        .mount(&server)
        .await;

    let adapter = adapter_for(&server);
    let req = ChatRequest::new(ChatModel::default(), vec![Message::user("hi")], "test");

    let resp = adapter.chat(&req).await.unwrap();
    assert_eq!(resp.content, "hello");
    assert_eq!(resp.finish_reason, FinishReason::Stop);
    assert_eq!(resp.input_tokens, 10);
    assert_eq!(resp.output_tokens, 20);
}

#[tokio::test]
async fn openai_sends_json_response_format_when_requested() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .and(body_partial_json(json!({
            "response_format": { "type": "json_object" }
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "choices": [{
                "message": { "content": "{}" },
                "finish_reason": "stop"
            }],
            "usage": { "prompt_tokens": 1, "completion_tokens": 1 }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let adapter = adapter_for(&server);
    let req = ChatRequest::new(ChatModel::default(), vec![Message::user("hi")], "test").json();

    let resp = adapter.chat(&req).await.unwrap();
    assert_eq!(resp.content, "{}");
}

#[tokio::test]
async fn openai_classifies_http_429_as_rate_limit_and_keeps_context() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(429).set_body_json(json!({
            "error": { "message": "rate limited", "code": "rate_limit_exceeded" }
        })))
        .mount(&server)
        .await;

    let adapter = adapter_for(&server);
    let req = ChatRequest::new(ChatModel::default(), vec![Message::user("hi")], "test");

    let err = adapter.chat(&req).await.unwrap_err();
    match err {
        ProviderError::RateLimited {
            retry_after,
            context,
        } => {
            assert_eq!(retry_after, Duration::from_secs(60));
            let ctx = context.expect("expected error context");
            assert_eq!(ctx.http_status, Some(429));
            assert_eq!(ctx.provider_code.as_deref(), Some("rate_limit_exceeded"));
        }
        other => panic!("expected RateLimited, got {other:?}"),
    }
}

#[tokio::test]
async fn openai_marks_http_500_retryable_and_400_permanent() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(500).set_body_json(json!({
            "error": { "message": "internal error", "code": "internal" }
        })))
        .mount(&server)
        .await;

    let adapter = adapter_for(&server);
    let req = ChatRequest::new(ChatModel::default(), vec![Message::user("hi")], "test");
    let err = adapter.chat(&req).await.unwrap_err();
    assert!(err.is_retryable());

    server.reset().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "error": { "message": "bad request", "code": "invalid_request_error" }
        })))
        .mount(&server)
        .await;

    let err = adapter.chat(&req).await.unwrap_err();
    assert!(!err.is_retryable());
}

#[tokio::test]
async fn openai_rejects_oversized_input_without_calling_provider() {
    let server = MockServer::start().await;
    let adapter = adapter_for(&server);

    let huge = "x".repeat(600_000);
    let req = ChatRequest::new(ChatModel::default(), vec![Message::user(huge)], "test");

    let err = adapter.chat(&req).await.unwrap_err();
    assert!(matches!(err, ProviderError::InvalidRequest { .. }));
    assert!(server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn openai_embed_returns_index_ordered_vectors() {
    let server = MockServer::start().await;

    // Out-of-order data entries must come back sorted by index.
    Mock::given(method("POST"))
        .and(path("/embeddings"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [
                { "index": 1, "embedding": [0.0, 1.0] },
                { "index": 0, "embedding": [1.0, 0.0] }
            ],
            "usage": { "prompt_tokens": 4, "total_tokens": 4 }
        })))
        .mount(&server)
        .await;

    let adapter = adapter_for(&server);
    let req = EmbedRequest::new(
        EmbedModel::OpenAI3Small,
        vec!["first".into(), "second".into()],
        "test",
    );

    let resp = adapter.embed(&req).await.unwrap();
    assert_eq!(resp.embeddings, vec![vec![1.0, 0.0], vec![0.0, 1.0]]);
    assert_eq!(resp.tokens, 4);
}

#[tokio::test]
async fn openai_embed_rejects_count_mismatch() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/embeddings"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [{ "index": 0, "embedding": [1.0] }],
            "usage": { "total_tokens": 2 }
        })))
        .mount(&server)
        .await;

    let adapter = adapter_for(&server);
    let req = EmbedRequest::new(
        EmbedModel::OpenAI3Small,
        vec!["first".into(), "second".into()],
        "test",
    );

    let err = adapter.embed(&req).await.unwrap_err();
    assert!(matches!(err, ProviderError::Provider { .. }));
}

#[derive(Clone)]
struct FlipResponder {
    calls: Arc<AtomicUsize>,
    first: ResponseTemplate,
    second: ResponseTemplate,
}

impl Respond for FlipResponder {
    fn respond(&self, _request: &Request) -> ResponseTemplate {
        let n = self.calls.fetch_add(1, Ordering::SeqCst);
        if n == 0 {
            self.first.clone()
        } else {
            self.second.clone()
        }
    }
}

#[tokio::test]
async fn provider_gateway_retries_on_retryable_errors_and_succeeds() {
    let server = MockServer::start().await;

    let calls = Arc::new(AtomicUsize::new(0));
    let first = ResponseTemplate::new(500).set_body_json(json!({
        "error": { "message": "transient error", "code": "internal" }
    }));
    let second = ResponseTemplate::new(200).set_body_json(json!({
        "choices": [{
            "message": { "content": "ok" },
            "finish_reason": "stop"
        }],
        "usage": { "prompt_tokens": 1, "completion_tokens": 1 }
    }));

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(FlipResponder {
            calls,
            first,
            second,
        })
        .mount(&server)
        .await;

    let adapter = adapter_for(&server);
    let gateway = ProviderGateway::with_config(
        adapter,
        GatewayConfig {
            max_retries: 1,
            retry_base_delay: Duration::from_millis(0),
        },
    );

    let req = ChatRequest::new(ChatModel::default(), vec![Message::user("hi")], "test");
    let resp = gateway.chat(req).await.unwrap();
    assert_eq!(resp.content, "ok");

    let received = server.received_requests().await.unwrap();
    assert_eq!(received.len(), 2);
}

#[tokio::test]
async fn provider_gateway_does_not_retry_permanent_errors() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "error": { "message": "bad request", "code": "invalid_request_error" }
        })))
        .mount(&server)
        .await;

    let adapter = adapter_for(&server);
    let gateway = ProviderGateway::with_config(
        adapter,
        GatewayConfig {
            max_retries: 3,
            retry_base_delay: Duration::from_millis(0),
        },
    );

    let req = ChatRequest::new(ChatModel::default(), vec![Message::user("hi")], "test");
    assert!(gateway.chat(req).await.is_err());

    let received = server.received_requests().await.unwrap();
    assert_eq!(received.len(), 1);
}
