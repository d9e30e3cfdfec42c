//! Integration tests for the Gemini client
//!
//! Tests HTTP client behavior using wiremock for request/response mocking.

use serde_json::json;
use wiremock::{
    matchers::{body_partial_json, header, method, path},
    Mock, MockServer, Request, ResponseTemplate,
};

use deepread::config::{GeminiConfig, RequestConfig};
use deepread::credentials::{Credential, CredentialSource};
use deepread::error::{classify_transport, GeminiError, TransportFailure};
use deepread::gemini::{GeminiClient, InvocationConfig, ModelBackend};
use deepread::prompts::compile;
use deepread::AnalysisRequest;

const MODEL_PATH: &str = "/v1beta/models/test-model:generateContent";

/// Create a test client pointing to mock server
fn create_test_client(base_url: &str) -> GeminiClient {
    let config = GeminiConfig {
        base_url: base_url.to_string(),
        ..GeminiConfig::default()
    };

    GeminiClient::new(&config, RequestConfig { timeout_ms: 5000 }).expect("Failed to create client")
}

fn credential() -> Credential {
    Credential {
        api_key: "test-api-key".to_string(),
        model_id: "test-model".to_string(),
        source: CredentialSource::User,
    }
}

#[cfg(test)]
mod invoke_tests {
    use super::*;

    #[tokio::test]
    async fn test_grounded_invocation() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path(MODEL_PATH))
            .and(header("x-goog-api-key", "test-api-key"))
            .and(body_partial_json(json!({"tools": [{"google_search": {}}]})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "candidates": [{
                    "content": {"role": "model", "parts": [{"text": "{\"title\":\"T\",\"summary\":\"S\"}"}]},
                    "finishReason": "STOP",
                    "groundingMetadata": {
                        "groundingChunks": [
                            {"web": {"uri": "https://source.example/1", "title": "Source 1"}},
                            {"web": {"uri": "https://source.example/2", "title": "Source 2"}}
                        ]
                    }
                }]
            })))
            .expect(1)
            .mount(&mock_server)
            .await;

        let client = create_test_client(&mock_server.uri());
        let prompt = compile(&AnalysisRequest::link("https://example.com/article"), "English");
        let raw = client
            .invoke(&prompt, &credential(), InvocationConfig::SearchGrounded)
            .await
            .expect("invocation should succeed");

        assert_eq!(raw.text, "{\"title\":\"T\",\"summary\":\"S\"}");
        assert_eq!(raw.grounding_chunks.len(), 2);
        assert_eq!(raw.grounding_chunks[0].uri, "https://source.example/1");
        assert_eq!(raw.grounding_chunks[1].title, "Source 2");
    }

    #[tokio::test]
    async fn test_strict_invocation_body() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path(MODEL_PATH))
            .and(body_partial_json(json!({
                "generationConfig": {"responseMimeType": "application/json"}
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "candidates": [{"content": {"parts": [{"text": "{}"}]}}]
            })))
            .expect(1)
            .mount(&mock_server)
            .await;

        let client = create_test_client(&mock_server.uri());
        let prompt = compile(&AnalysisRequest::text("Essay"), "English");
        let raw = client
            .invoke(&prompt, &credential(), InvocationConfig::StrictSchema)
            .await
            .unwrap();

        assert_eq!(raw.text, "{}");
        assert!(raw.grounding_chunks.is_empty());

        let requests: Vec<Request> = mock_server.received_requests().await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&requests[0].body).unwrap();
        assert!(body.get("tools").is_none());
        assert!(!requests[0].url.as_str().contains("test-api-key"));
    }

    #[tokio::test]
    async fn test_no_candidates_is_not_an_error() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path(MODEL_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "promptFeedback": {"blockReason": "SAFETY"}
            })))
            .mount(&mock_server)
            .await;

        let client = create_test_client(&mock_server.uri());
        let prompt = compile(&AnalysisRequest::text("Essay"), "English");
        let raw = client
            .invoke(&prompt, &credential(), InvocationConfig::StrictSchema)
            .await
            .unwrap();

        assert!(raw.text.is_empty());
    }
}

#[cfg(test)]
mod error_tests {
    use super::*;

    async fn invoke_against(template: ResponseTemplate) -> GeminiError {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path(MODEL_PATH))
            .respond_with(template)
            .expect(1)
            .mount(&mock_server)
            .await;

        let client = create_test_client(&mock_server.uri());
        let prompt = compile(&AnalysisRequest::link("https://example.com"), "English");
        client
            .invoke(&prompt, &credential(), InvocationConfig::SearchGrounded)
            .await
            .expect_err("invocation should fail")
    }

    #[tokio::test]
    async fn test_invalid_key() {
        let err = invoke_against(ResponseTemplate::new(400).set_body_json(json!({
            "error": {
                "code": 400,
                "message": "API key not valid. Please pass a valid API key.",
                "status": "INVALID_ARGUMENT",
                "details": [{
                    "@type": "type.googleapis.com/google.rpc.ErrorInfo",
                    "reason": "API_KEY_INVALID",
                    "domain": "googleapis.com"
                }]
            }
        })))
        .await;

        assert!(matches!(err, GeminiError::Api { status: 400, .. }));
        assert_eq!(classify_transport(&err), TransportFailure::CredentialRejected);
    }

    #[tokio::test]
    async fn test_quota_exhausted() {
        let err = invoke_against(ResponseTemplate::new(429).set_body_json(json!({
            "error": {
                "code": 429,
                "message": "Resource has been exhausted (e.g. check quota).",
                "status": "RESOURCE_EXHAUSTED"
            }
        })))
        .await;

        assert_eq!(classify_transport(&err), TransportFailure::QuotaExhausted);
    }

    #[tokio::test]
    async fn test_server_error_with_plain_body() {
        let err = invoke_against(ResponseTemplate::new(503).set_body_string("upstream down")).await;

        match &err {
            GeminiError::Api { status, message, .. } => {
                assert_eq!(*status, 503);
                assert_eq!(message, "upstream down");
            }
            other => panic!("unexpected error: {:?}", other),
        }
        assert_eq!(classify_transport(&err), TransportFailure::Unavailable);
    }

    #[tokio::test]
    async fn test_unparseable_success_body() {
        let err = invoke_against(ResponseTemplate::new(200).set_body_string("not json")).await;
        assert!(matches!(err, GeminiError::InvalidResponse { .. }));
    }

    #[tokio::test]
    async fn test_timeout() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"candidates": []}))
                    .set_delay(std::time::Duration::from_secs(2)),
            )
            .mount(&mock_server)
            .await;

        let config = GeminiConfig {
            base_url: mock_server.uri(),
            ..GeminiConfig::default()
        };
        let client = GeminiClient::new(&config, RequestConfig { timeout_ms: 100 }).unwrap();
        let prompt = compile(&AnalysisRequest::text("Essay"), "English");
        let err = client
            .invoke(&prompt, &credential(), InvocationConfig::StrictSchema)
            .await
            .unwrap_err();

        assert!(matches!(err, GeminiError::Timeout { timeout_ms: 100 }));
        assert_eq!(classify_transport(&err), TransportFailure::Timeout);
    }

    #[tokio::test]
    async fn test_no_internal_retry() {
        // `.expect(1)` in invoke_against verifies a single request on drop
        let err = invoke_against(ResponseTemplate::new(500)).await;
        assert!(matches!(err, GeminiError::Api { status: 500, .. }));
    }
}
