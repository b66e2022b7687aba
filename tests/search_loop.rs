//! End-to-end tests: the search loop driving the real OpenAI-compatible
//! clients against a mock HTTP backend.

use std::time::Duration;

use wiremock::matchers::{body_string_contains, method, path};
use wiremock::{Mock, MockServer, Request, Respond, ResponseTemplate};

use reverse_vector::embedder::openai::OpenAiEmbedder;
use reverse_vector::llm_client::openai::OpenAiClient;
use reverse_vector::{SearchConfig, SearchLoop, StopReason};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Serves `POST /embeddings`, mapping each input text to a fixed point on
/// the x-axis so distances to the target are known in advance.
struct EmbeddingTable;

impl Respond for EmbeddingTable {
    fn respond(&self, request: &Request) -> ResponseTemplate {
        let body: serde_json::Value =
            serde_json::from_slice(&request.body).expect("request body is JSON");
        let inputs: Vec<String> = match &body["input"] {
            serde_json::Value::String(s) => vec![s.clone()],
            serde_json::Value::Array(items) => items
                .iter()
                .map(|v| v.as_str().unwrap_or_default().to_string())
                .collect(),
            _ => Vec::new(),
        };

        let data: Vec<serde_json::Value> = inputs
            .iter()
            .enumerate()
            .map(|(i, text)| {
                let x = match text.as_str() {
                    "Be mindful" => 0.0_f32,
                    "Be" => 1.0,
                    _ => 2.0,
                };
                serde_json::json!({
                    "object": "embedding",
                    "index": i,
                    "embedding": [x, 0.0],
                })
            })
            .collect();

        ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "object": "list",
            "data": data,
            "model": "text-embedding-3-small",
            "usage": { "prompt_tokens": 1, "total_tokens": 1 },
        }))
    }
}

fn chat_response(content: &str) -> serde_json::Value {
    serde_json::json!({
        "id": "chatcmpl-test",
        "object": "chat.completion",
        "created": 1700000000_u64,
        "model": "gpt-4o-mini",
        "choices": [{
            "index": 0,
            "message": { "role": "assistant", "content": content },
            "finish_reason": "stop",
        }],
        "usage": { "prompt_tokens": 10, "completion_tokens": 2, "total_tokens": 12 },
    })
}

fn test_config() -> SearchConfig {
    SearchConfig {
        target_text: "Be mindful".to_string(),
        initial_guess: "Be".to_string(),
        embed_retry_delay: Duration::from_millis(1),
        chat_retry_delay: Duration::from_millis(1),
        retry_attempt_limit: Some(5),
        ..SearchConfig::default()
    }
}

fn clients(server: &MockServer) -> (OpenAiEmbedder, OpenAiClient) {
    (
        OpenAiEmbedder::with_api_base("sk-test", "text-embedding-3-small", server.uri()),
        OpenAiClient::with_api_base("sk-test", "gpt-4o-mini", server.uri()),
    )
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[tokio::test]
async fn loop_converges_against_mock_backend() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/embeddings"))
        .respond_with(EmbeddingTable)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(chat_response("Be mindful")))
        .expect(1)
        .mount(&server)
        .await;

    let (embedder, llm) = clients(&server);
    let report = SearchLoop::new(embedder, llm, test_config())
        .run()
        .await
        .expect("search should complete");

    // "Be" sits at distance 1.0 (no match); the guidance reply "Be mindful"
    // lands on the target exactly.
    assert_eq!(report.reason, StopReason::Matched);
    assert_eq!(report.guesses_made, 2);
    assert_eq!(report.best_text, "Be mindful");
    assert!(report.best_distance < 1e-6);
    assert_eq!(
        report.best_guesses[0].to_string(),
        "ERROR 0.0000, \"Be mindful\""
    );
    assert_eq!(report.best_guesses.len(), 2);
}

#[tokio::test]
async fn loop_rides_out_a_transient_embedding_failure() {
    let server = MockServer::start().await;

    // The first evaluation of "Be" gets a 500 once; the target acquisition
    // request (`"Be mindful"`) never matches this mock.
    Mock::given(method("POST"))
        .and(path("/embeddings"))
        .and(body_string_contains("\"Be\""))
        .respond_with(ResponseTemplate::new(500).set_body_string("backend hiccup"))
        .up_to_n_times(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/embeddings"))
        .respond_with(EmbeddingTable)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(chat_response("Be mindful")))
        .mount(&server)
        .await;

    let (embedder, llm) = clients(&server);
    let report = SearchLoop::new(embedder, llm, test_config())
        .run()
        .await
        .expect("search should recover from the transient failure");

    assert_eq!(report.reason, StopReason::Matched);
    assert_eq!(report.best_text, "Be mindful");
}

#[tokio::test]
async fn budget_of_zero_stops_before_any_evaluation() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/embeddings"))
        .respond_with(EmbeddingTable)
        // Target acquisition only.
        .expect(1)
        .mount(&server)
        .await;

    let (embedder, llm) = clients(&server);
    let config = SearchConfig {
        cost_limit: 0.0,
        embed_call_cost: 0.01,
        ..test_config()
    };
    let report = SearchLoop::new(embedder, llm, config)
        .run()
        .await
        .expect("search should stop cleanly");

    assert_eq!(report.reason, StopReason::BudgetExhausted);
    assert_eq!(report.guesses_made, 0);
    assert!(report.best_guesses.is_empty());
}
