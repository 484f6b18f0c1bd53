//! HTTP provider tests against a mock generation API.

use std::time::Duration;

use pretty_assertions::assert_eq;
use serde_json::json;
use tokio::io::AsyncReadExt;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use study_assistant::config::LlmConfig;
use study_assistant::llm::classifier::classify;
use study_assistant::llm::error::ProviderErrorKind;
use study_assistant::llm::provider::{CompletionOptions, CompletionProvider, HttpProvider};

fn openai_config(server: &MockServer) -> LlmConfig {
    LlmConfig {
        provider: "openai".to_string(),
        base_url: server.uri(),
        chat_model: "test-model".to_string(),
        api_key: Some("sk-test".to_string()),
        timeout_secs: 5,
        max_retries: 0,
        retry_base_delay_ms: 0,
    }
}

fn openai_reply(content: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({
        "choices": [{ "message": { "role": "assistant", "content": content } }],
        "usage": { "prompt_tokens": 12, "completion_tokens": 1, "total_tokens": 13 }
    }))
}

#[tokio::test]
async fn test_openai_completion_parses_content_and_usage() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .and(header("authorization", "Bearer sk-test"))
        .and(body_partial_json(json!({ "model": "test-model", "max_tokens": 10 })))
        .respond_with(openai_reply("YES"))
        .expect(1)
        .mount(&server)
        .await;

    let provider = HttpProvider::new(openai_config(&server)).unwrap();
    let completion = provider
        .simple_completion(
            "hi",
            CompletionOptions {
                temperature: 0.1,
                max_tokens: 10,
            },
        )
        .await
        .unwrap();

    assert_eq!(completion.content, "YES");
    assert_eq!(completion.usage.unwrap().total_tokens, 13);
}

#[tokio::test]
async fn test_classifier_over_http() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(openai_reply("  no  "))
        .mount(&server)
        .await;

    let provider = HttpProvider::new(openai_config(&server)).unwrap();
    assert!(!classify(&provider, "오늘 날씨 어때?").await.unwrap());
}

#[tokio::test]
async fn test_rate_limit_status_maps_to_429() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(429))
        .expect(1)
        .mount(&server)
        .await;

    let provider = HttpProvider::new(openai_config(&server)).unwrap();
    let err = provider
        .simple_completion("hi", CompletionOptions::default())
        .await
        .unwrap_err();

    assert_eq!(err.kind, ProviderErrorKind::RateLimit);
    assert_eq!(err.status, 429);
}

#[tokio::test]
async fn test_upstream_error_type_wins_over_status() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "error": { "message": "too fast", "type": "rate_limit_exceeded" }
        })))
        .mount(&server)
        .await;

    let provider = HttpProvider::new(openai_config(&server)).unwrap();
    let err = provider
        .simple_completion("hi", CompletionOptions::default())
        .await
        .unwrap_err();
    assert_eq!(err.kind, ProviderErrorKind::RateLimit);
    assert_eq!(err.status, 429);
}

#[tokio::test]
async fn test_invalid_key_maps_to_401_without_retry() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(401))
        .expect(1)
        .mount(&server)
        .await;

    let provider = HttpProvider::new(LlmConfig {
        max_retries: 3,
        ..openai_config(&server)
    })
    .unwrap();
    let err = provider
        .simple_completion("hi", CompletionOptions::default())
        .await
        .unwrap_err();
    assert_eq!(err.kind, ProviderErrorKind::ApiError);
    assert_eq!(err.status, 401);
}

#[tokio::test]
async fn test_server_errors_are_retried() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(2)
        .expect(2)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .respond_with(openai_reply("recovered"))
        .expect(1)
        .mount(&server)
        .await;

    let provider = HttpProvider::new(LlmConfig {
        max_retries: 3,
        ..openai_config(&server)
    })
    .unwrap();
    let completion = provider
        .simple_completion("hi", CompletionOptions::default())
        .await
        .unwrap();
    assert_eq!(completion.content, "recovered");
}

#[tokio::test]
async fn test_retries_are_bounded() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500))
        .expect(3)
        .mount(&server)
        .await;

    let provider = HttpProvider::new(LlmConfig {
        max_retries: 2,
        ..openai_config(&server)
    })
    .unwrap();
    let err = provider
        .simple_completion("hi", CompletionOptions::default())
        .await
        .unwrap_err();
    assert_eq!(err.status, 500);
}

#[tokio::test]
async fn test_slow_upstream_is_timeout() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(openai_reply("late").set_delay(Duration::from_secs(3)))
        .mount(&server)
        .await;

    let provider = HttpProvider::new(LlmConfig {
        timeout_secs: 1,
        ..openai_config(&server)
    })
    .unwrap();
    let err = provider
        .simple_completion("hi", CompletionOptions::default())
        .await
        .unwrap_err();
    assert_eq!(err.kind, ProviderErrorKind::Timeout);
    assert_eq!(err.status, 408);
}

#[tokio::test]
async fn test_dropped_connection_is_timeout() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        while let Ok((mut socket, _)) = listener.accept().await {
            let mut buf = [0u8; 64];
            let _ = socket.read(&mut buf).await;
            drop(socket);
        }
    });

    let provider = HttpProvider::new(LlmConfig {
        provider: "openai".to_string(),
        base_url: format!("http://{addr}"),
        api_key: Some("sk-test".to_string()),
        max_retries: 0,
        ..LlmConfig::default()
    })
    .unwrap();
    let err = provider
        .simple_completion("hi", CompletionOptions::default())
        .await
        .unwrap_err();
    assert_eq!(err.kind, ProviderErrorKind::Timeout);
    assert_eq!(err.status, 408);
}

#[tokio::test]
async fn test_ollama_chat() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/chat"))
        .and(body_partial_json(json!({
            "model": "llama3",
            "stream": false,
            "options": { "num_predict": 10 }
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "message": { "role": "assistant", "content": "Hello!" },
            "prompt_eval_count": 5,
            "eval_count": 2
        })))
        .mount(&server)
        .await;

    let provider = HttpProvider::new(LlmConfig {
        provider: "ollama".to_string(),
        base_url: server.uri(),
        chat_model: "llama3".to_string(),
        api_key: None,
        ..LlmConfig::default()
    })
    .unwrap();
    assert!(provider.health_check().await);
}
