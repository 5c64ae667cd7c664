// SPDX-FileCopyrightText: 2026 Solace Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Ollama adapters against a wiremock server.

use std::time::Duration;

use futures::StreamExt;
use serde_json::json;
use solace_core::traits::{EmbeddingAdapter, PluginAdapter, ProviderAdapter};
use solace_core::types::{
    EmbeddingInput, HealthStatus, ProviderMessage, ProviderRequest, StreamEventType,
};
use solace_ollama::{OllamaClient, OllamaEmbedder, OllamaProvider};
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn provider(server: &MockServer) -> OllamaProvider {
    let client = OllamaClient::new(&server.uri(), Duration::from_secs(5)).unwrap();
    OllamaProvider::with_client(client, "llama3.2".into())
}

fn request(stream: bool) -> ProviderRequest {
    ProviderRequest {
        model: "llama3.2".into(),
        system_prompt: Some("You are Sage.".into()),
        messages: vec![ProviderMessage::user("Human: hello")],
        max_tokens: 64,
        temperature: Some(0.7),
        top_p: Some(0.9),
        stream,
    }
}

#[tokio::test]
async fn complete_returns_content_and_usage() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/chat"))
        .and(body_partial_json(json!({
            "model": "llama3.2",
            "stream": false,
            "options": { "num_predict": 64 }
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "model": "llama3.2",
            "message": { "role": "assistant", "content": "Hello there." },
            "done": true,
            "done_reason": "stop",
            "prompt_eval_count": 20,
            "eval_count": 3
        })))
        .expect(1)
        .mount(&server)
        .await;

    let response = provider(&server).complete(request(false)).await.unwrap();
    assert_eq!(response.content, "Hello there.");
    assert_eq!(response.usage.input_tokens, 20);
    assert_eq!(response.usage.output_tokens, 3);
    assert_eq!(response.stop_reason.as_deref(), Some("stop"));
}

#[tokio::test]
async fn stream_yields_start_text_delta_stop() {
    let server = MockServer::start().await;
    let body = [
        r#"{"message":{"role":"assistant","content":"Good "},"done":false}"#,
        r#"{"message":{"role":"assistant","content":"morning."},"done":false}"#,
        r#"{"message":{"role":"assistant","content":""},"done":true,"done_reason":"stop","prompt_eval_count":12,"eval_count":2}"#,
    ]
    .join("\n");
    Mock::given(method("POST"))
        .and(path("/api/chat"))
        .and(body_partial_json(json!({ "stream": true })))
        .respond_with(ResponseTemplate::new(200).set_body_string(body))
        .mount(&server)
        .await;

    let mut stream = provider(&server).stream(request(true)).await.unwrap();
    let mut events = Vec::new();
    let mut text = String::new();
    let mut output_tokens = 0;
    while let Some(chunk) = stream.next().await {
        let chunk = chunk.unwrap();
        if let Some(t) = &chunk.text {
            text.push_str(t);
        }
        if let Some(u) = chunk.usage {
            output_tokens = u.output_tokens;
        }
        events.push(chunk.event_type);
    }

    assert_eq!(text, "Good morning.");
    assert_eq!(output_tokens, 2);
    assert_eq!(events.first(), Some(&StreamEventType::MessageStart));
    assert_eq!(events.last(), Some(&StreamEventType::MessageStop));
}

#[tokio::test]
async fn api_error_surfaces_message() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/chat"))
        .respond_with(
            ResponseTemplate::new(404).set_body_json(json!({ "error": "model 'llama3.2' not found" })),
        )
        .mount(&server)
        .await;

    let err = provider(&server).complete(request(false)).await.unwrap_err();
    assert!(err.to_string().contains("not found"), "{err}");
}

#[tokio::test]
async fn slow_server_times_out() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/chat"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "done": true }))
                .set_delay(Duration::from_secs(2)),
        )
        .mount(&server)
        .await;

    let client = OllamaClient::new(&server.uri(), Duration::from_millis(200)).unwrap();
    let provider = OllamaProvider::with_client(client, "llama3.2".into());
    let err = provider.complete(request(false)).await.unwrap_err();
    assert!(err.to_string().contains("timed out"), "{err}");
}

#[tokio::test]
async fn health_reflects_pulled_models() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/tags"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "models": [{ "name": "llama3.2:latest" }]
        })))
        .mount(&server)
        .await;

    assert_eq!(
        provider(&server).health_check().await.unwrap(),
        HealthStatus::Healthy
    );

    let client = OllamaClient::new(&server.uri(), Duration::from_secs(5)).unwrap();
    let embedder = OllamaEmbedder::with_client(client, "mxbai-embed-large".into(), 1024);
    assert!(matches!(
        embedder.health_check().await.unwrap(),
        HealthStatus::Degraded(_)
    ));
}

#[tokio::test]
async fn health_unreachable_server_is_unhealthy() {
    let client = OllamaClient::new("http://127.0.0.1:9", Duration::from_millis(500)).unwrap();
    let provider = OllamaProvider::with_client(client, "llama3.2".into());
    assert!(matches!(
        provider.health_check().await.unwrap(),
        HealthStatus::Unhealthy(_)
    ));
}

#[tokio::test]
async fn embed_returns_vectors_in_order() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/embed"))
        .and(body_partial_json(json!({
            "model": "mxbai-embed-large",
            "input": ["first", "second"]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "model": "mxbai-embed-large",
            "embeddings": [[0.1, 0.2, 0.3], [0.4, 0.5, 0.6]]
        })))
        .mount(&server)
        .await;

    let client = OllamaClient::new(&server.uri(), Duration::from_secs(5)).unwrap();
    let embedder = OllamaEmbedder::with_client(client, "mxbai-embed-large".into(), 3);
    let out = embedder
        .embed(EmbeddingInput {
            texts: vec!["first".into(), "second".into()],
        })
        .await
        .unwrap();
    assert_eq!(out.dimensions, 3);
    assert_eq!(out.embeddings.len(), 2);
    assert!((out.embeddings[1][0] - 0.4).abs() < 1e-6);
}

#[tokio::test]
async fn embed_count_mismatch_is_an_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/embed"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "embeddings": [[1.0]] })))
        .mount(&server)
        .await;

    let client = OllamaClient::new(&server.uri(), Duration::from_secs(5)).unwrap();
    let embedder = OllamaEmbedder::with_client(client, "m".into(), 1);
    let err = embedder
        .embed(EmbeddingInput {
            texts: vec!["a".into(), "b".into()],
        })
        .await
        .unwrap_err();
    assert!(err.to_string().contains("mismatch"));
}
