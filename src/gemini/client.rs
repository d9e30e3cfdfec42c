use async_trait::async_trait;
use reqwest::Client;
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};

use super::types::{
    ApiErrorEnvelope, GenerateContentRequest, GenerateContentResponse, InvocationConfig,
    RawModelResponse,
};
use crate::config::{GeminiConfig, RequestConfig};
use crate::credentials::Credential;
use crate::error::{GeminiError, GeminiResult};
use crate::prompts::PromptSpec;

/// Sends compiled prompts to a generative model.
///
/// Exactly one network call per invocation, no internal retries.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ModelBackend: Send + Sync {
    /// Invoke the model with `prompt` using `credential`.
    async fn invoke(
        &self,
        prompt: &PromptSpec,
        credential: &Credential,
        config: InvocationConfig,
    ) -> GeminiResult<RawModelResponse>;
}

/// Client for the Gemini `generateContent` API
///
/// The key is supplied per call, so a single client serves both user and
/// system credentials.
#[derive(Clone)]
pub struct GeminiClient {
    client: Client,
    base_url: String,
    timeout_ms: u64,
}

impl GeminiClient {
    /// Create a new Gemini client
    pub fn new(config: &GeminiConfig, request_config: RequestConfig) -> GeminiResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_millis(request_config.timeout_ms))
            .build()
            .map_err(GeminiError::Http)?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            timeout_ms: request_config.timeout_ms,
        })
    }

    /// Get the base URL (for testing)
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Execute a single request (internal)
    async fn execute_request(
        &self,
        url: &str,
        api_key: &str,
        request: &GenerateContentRequest,
    ) -> GeminiResult<GenerateContentResponse> {
        let response = self
            .client
            .post(url)
            .header("x-goog-api-key", api_key)
            .header("Content-Type", "application/json")
            .json(request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    GeminiError::Timeout {
                        timeout_ms: self.timeout_ms,
                    }
                } else {
                    GeminiError::Http(e)
                }
            })?;

        let status = response.status();

        if !status.is_success() {
            let error_body = response.text().await.unwrap_or_default();
            return Err(api_error(status.as_u16(), &error_body));
        }

        response
            .json()
            .await
            .map_err(|e| GeminiError::InvalidResponse {
                message: format!("Failed to parse response: {}", e),
            })
    }
}

#[async_trait]
impl ModelBackend for GeminiClient {
    async fn invoke(
        &self,
        prompt: &PromptSpec,
        credential: &Credential,
        config: InvocationConfig,
    ) -> GeminiResult<RawModelResponse> {
        let url = format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url, credential.model_id
        );
        let request = GenerateContentRequest::new(prompt, config);

        debug!(
            model = %credential.model_id,
            search_grounding = config.uses_search_grounding(),
            strict_schema = config.enforces_strict_schema(),
            prompt_chars = prompt.text.chars().count(),
            "Calling Gemini"
        );

        let start = Instant::now();
        match self
            .execute_request(&url, &credential.api_key, &request)
            .await
        {
            Ok(response) => {
                let stop_reason = response.stop_reason().map(String::from);
                let raw = response.into_raw();
                if raw.text.trim().is_empty() {
                    warn!(
                        model = %credential.model_id,
                        stop_reason = stop_reason.as_deref().unwrap_or("unknown"),
                        "Gemini returned no text"
                    );
                }
                info!(
                    model = %credential.model_id,
                    latency_ms = start.elapsed().as_millis(),
                    grounding_chunks = raw.grounding_chunks.len(),
                    "Gemini call succeeded"
                );
                Ok(raw)
            }
            Err(e) => {
                error!(
                    model = %credential.model_id,
                    error = %e,
                    latency_ms = start.elapsed().as_millis(),
                    "Gemini call failed"
                );
                Err(e)
            }
        }
    }
}

/// Map a non-2xx response to [`GeminiError::Api`], keeping structured fields
/// when the body is a Google error envelope.
fn api_error(status: u16, body: &str) -> GeminiError {
    match serde_json::from_str::<ApiErrorEnvelope>(body) {
        Ok(envelope) => {
            let reason = envelope.error.reason().map(String::from);
            GeminiError::Api {
                status,
                code: envelope.error.status,
                reason,
                message: envelope.error.message.unwrap_or_else(|| body.to_string()),
            }
        }
        Err(_) => GeminiError::Api {
            status,
            code: None,
            reason: None,
            message: body.to_string(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_creation() {
        let config = GeminiConfig {
            base_url: "https://generativelanguage.googleapis.com/".to_string(),
            ..GeminiConfig::default()
        };

        let client = GeminiClient::new(&config, RequestConfig::default()).unwrap();
        assert_eq!(client.base_url(), "https://generativelanguage.googleapis.com");
    }

    #[test]
    fn test_api_error_parses_google_envelope() {
        let body = r#"{
            "error": {
                "code": 400,
                "message": "API key not valid. Please pass a valid API key.",
                "status": "INVALID_ARGUMENT",
                "details": [
                    {"@type": "type.googleapis.com/google.rpc.ErrorInfo", "reason": "API_KEY_INVALID"}
                ]
            }
        }"#;

        match api_error(400, body) {
            GeminiError::Api {
                status,
                code,
                reason,
                message,
            } => {
                assert_eq!(status, 400);
                assert_eq!(code.as_deref(), Some("INVALID_ARGUMENT"));
                assert_eq!(reason.as_deref(), Some("API_KEY_INVALID"));
                assert!(message.starts_with("API key not valid"));
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_api_error_keeps_plain_body() {
        match api_error(502, "Bad Gateway") {
            GeminiError::Api {
                code,
                reason,
                message,
                ..
            } => {
                assert!(code.is_none());
                assert!(reason.is_none());
                assert_eq!(message, "Bad Gateway");
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }
}
