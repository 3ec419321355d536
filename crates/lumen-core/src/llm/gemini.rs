//! Gemini provider using the Generative Language `generateContent` API.
//!
//! Sends the prompt and the image as two parts of a single user turn, with
//! the image as base64 inline data.

use super::provider::{ModelRequest, ModelResponse, VisionModel};
use crate::error::CaptionError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

/// Gemini provider using the REST API.
pub struct GeminiProvider {
    endpoint: String,
    api_key: String,
    model: String,
    timeout: Duration,
    client: reqwest::Client,
}

impl GeminiProvider {
    pub fn new(endpoint: &str, api_key: &str, model: &str, timeout: Duration) -> Self {
        Self {
            endpoint: endpoint.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            model: model.to_string(),
            timeout,
            client: reqwest::Client::new(),
        }
    }

    fn url(&self) -> String {
        format!("{}/models/{}:generateContent", self.endpoint, self.model)
    }
}

// --- Request types ---

#[derive(Serialize)]
struct GenerateContentRequest {
    contents: Vec<Content>,
}

#[derive(Serialize)]
struct Content {
    role: String,
    parts: Vec<Part>,
}

#[derive(Serialize)]
#[serde(untagged)]
enum Part {
    Text { text: String },
    InlineData { inline_data: Blob },
}

#[derive(Serialize)]
struct Blob {
    mime_type: String,
    data: String,
}

// --- Response types ---

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    usage_metadata: Option<UsageMetadata>,
    model_version: Option<String>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Deserialize)]
struct ResponsePart {
    text: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct UsageMetadata {
    total_token_count: Option<u32>,
}

#[derive(Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Deserialize)]
struct ErrorBody {
    message: String,
}

/// Concatenate the text parts of the first candidate.
fn extract_text(response: &GenerateContentResponse) -> Option<String> {
    let parts = &response.candidates.first()?.content.as_ref()?.parts;
    let text: String = parts.iter().filter_map(|p| p.text.as_deref()).collect();
    if text.is_empty() {
        None
    } else {
        Some(text)
    }
}

/// Prefer the API's own error message over the raw body.
fn error_message(body: &str) -> String {
    serde_json::from_str::<ErrorEnvelope>(body)
        .map(|e| e.error.message)
        .unwrap_or_else(|_| body.to_string())
}

#[async_trait]
impl VisionModel for GeminiProvider {
    fn name(&self) -> &str {
        "gemini"
    }

    fn model(&self) -> &str {
        &self.model
    }

    async fn generate(&self, request: &ModelRequest) -> Result<ModelResponse, CaptionError> {
        let start = Instant::now();

        let body = GenerateContentRequest {
            contents: vec![Content {
                role: "user".to_string(),
                parts: vec![
                    Part::Text {
                        text: request.prompt.clone(),
                    },
                    Part::InlineData {
                        inline_data: Blob {
                            mime_type: request.image.media_type.clone(),
                            data: request.image.data.clone(),
                        },
                    },
                ],
            }],
        };

        let resp = self
            .client
            .post(self.url())
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .timeout(self.timeout())
            .send()
            .await
            .map_err(|e| CaptionError::model(format!("Gemini request failed: {e}")))?;

        let status = resp.status();
        if !status.is_success() {
            let text = resp.text().await.unwrap_or_default();
            return Err(CaptionError::Model {
                message: format!("Gemini HTTP {status}: {}", error_message(&text)),
                status_code: Some(status.as_u16()),
            });
        }

        let parsed: GenerateContentResponse = resp
            .json()
            .await
            .map_err(|e| CaptionError::model(format!("Failed to parse Gemini response: {e}")))?;

        let text = extract_text(&parsed);
        if text.is_none() {
            tracing::warn!(model = %self.model, "Gemini returned no text content");
        }

        Ok(ModelResponse {
            text,
            model: parsed
                .model_version
                .clone()
                .unwrap_or_else(|| self.model.clone()),
            tokens_used: parsed.usage_metadata.and_then(|u| u.total_token_count),
            latency_ms: start.elapsed().as_millis() as u64,
        })
    }

    fn timeout(&self) -> Duration {
        self.timeout
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::ImageInput;
    use axum::{http::StatusCode, routing::post, Json, Router};
    use serde_json::{json, Value};

    fn request() -> ModelRequest {
        ModelRequest::new("Caption this", ImageInput::from_bytes(&[1, 2, 3], "image/png"))
    }

    /// Serve a single canned response on an ephemeral port.
    async fn mock_gemini(status: StatusCode, body: Value) -> String {
        let app = Router::new().route(
            "/v1beta/models/:call",
            post(move || {
                let body = body.clone();
                async move { (status, Json(body)) }
            }),
        );
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{addr}/v1beta")
    }

    #[test]
    fn test_request_wire_format() {
        let body = GenerateContentRequest {
            contents: vec![Content {
                role: "user".to_string(),
                parts: vec![
                    Part::Text {
                        text: "hi".to_string(),
                    },
                    Part::InlineData {
                        inline_data: Blob {
                            mime_type: "image/png".to_string(),
                            data: "AQID".to_string(),
                        },
                    },
                ],
            }],
        };
        let value = serde_json::to_value(&body).unwrap();
        assert_eq!(
            value,
            json!({
                "contents": [{
                    "role": "user",
                    "parts": [
                        {"text": "hi"},
                        {"inline_data": {"mime_type": "image/png", "data": "AQID"}}
                    ]
                }]
            })
        );
    }

    #[test]
    fn test_extract_text_joins_parts() {
        let resp: GenerateContentResponse = serde_json::from_value(json!({
            "candidates": [{"content": {"parts": [{"text": "A dog "}, {"text": "on a beach."}]}}]
        }))
        .unwrap();
        assert_eq!(extract_text(&resp).as_deref(), Some("A dog on a beach."));
    }

    #[test]
    fn test_extract_text_none_without_candidates() {
        let resp: GenerateContentResponse =
            serde_json::from_value(json!({"promptFeedback": {"blockReason": "SAFETY"}}))
                .unwrap();
        assert_eq!(extract_text(&resp), None);

        let resp: GenerateContentResponse = serde_json::from_value(json!({
            "candidates": [{"finishReason": "SAFETY"}]
        }))
        .unwrap();
        assert_eq!(extract_text(&resp), None);
    }

    #[test]
    fn test_error_message_prefers_api_message() {
        let body = r#"{"error":{"code":400,"message":"API key not valid.","status":"INVALID_ARGUMENT"}}"#;
        assert_eq!(error_message(body), "API key not valid.");
        assert_eq!(error_message("upstream exploded"), "upstream exploded");
    }

    #[tokio::test]
    async fn test_generate_returns_text_and_usage() {
        let endpoint = mock_gemini(
            StatusCode::OK,
            json!({
                "candidates": [{"content": {"role": "model", "parts": [{"text": " Sunny day! "}]}}],
                "usageMetadata": {"totalTokenCount": 321},
                "modelVersion": "gemini-2.5-flash-001"
            }),
        )
        .await;
        let provider =
            GeminiProvider::new(&endpoint, "key", "gemini-2.5-flash", Duration::from_secs(5));

        let resp = provider.generate(&request()).await.unwrap();
        assert_eq!(resp.text.as_deref(), Some(" Sunny day! "));
        assert_eq!(resp.tokens_used, Some(321));
        assert_eq!(resp.model, "gemini-2.5-flash-001");
    }

    #[tokio::test]
    async fn test_generate_maps_http_errors() {
        let endpoint = mock_gemini(
            StatusCode::TOO_MANY_REQUESTS,
            json!({"error": {"code": 429, "message": "Quota exceeded", "status": "RESOURCE_EXHAUSTED"}}),
        )
        .await;
        let provider =
            GeminiProvider::new(&endpoint, "key", "gemini-2.5-flash", Duration::from_secs(5));

        match provider.generate(&request()).await.unwrap_err() {
            CaptionError::Model {
                message,
                status_code,
            } => {
                assert_eq!(status_code, Some(429));
                assert!(message.contains("Quota exceeded"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_generate_reports_connection_failure() {
        // Nothing listens on port 9 of localhost in the test environment.
        let provider = GeminiProvider::new(
            "http://127.0.0.1:9/v1beta",
            "key",
            "gemini-2.5-flash",
            Duration::from_secs(2),
        );
        let err = provider.generate(&request()).await.unwrap_err();
        assert!(err.to_string().starts_with("Gemini request failed"));
    }
}
