use anyhow::Result;
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::warn;

use crate::domain::{
    repositories::generative_model::GenerativeModel,
    value_objects::generation::{GenerationError, ResponseFormat},
};

pub const DEFAULT_GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

#[derive(Debug, Clone)]
pub struct GeminiConfig {
    pub api_key: String,
    pub model: String,
    pub base_url: String,
    pub timeout: Duration,
}

/// Gemini `generateContent` over plain reqwest.
pub struct GeminiClient {
    http: Client,
    config: GeminiConfig,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest<'a> {
    contents: Vec<Content<'a>>,
    generation_config: GenerationConfig,
}

#[derive(Serialize)]
struct Content<'a> {
    role: &'static str,
    parts: Vec<Part<'a>>,
}

#[derive(Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f32,
    top_p: f32,
    top_k: u32,
    max_output_tokens: u32,
    response_mime_type: &'static str,
}

#[derive(Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    content: Option<CandidateContent>,
    finish_reason: Option<String>,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Deserialize)]
struct CandidatePart {
    text: Option<String>,
}

impl GeminiClient {
    pub fn new(config: GeminiConfig) -> Result<Self> {
        let http = Client::builder().timeout(config.timeout).build()?;
        Ok(Self { http, config })
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/models/{}:generateContent",
            self.config.base_url.trim_end_matches('/'),
            self.config.model
        )
    }
}

#[async_trait]
impl GenerativeModel for GeminiClient {
    async fn generate(
        &self,
        prompt: &str,
        format: ResponseFormat,
    ) -> Result<String, GenerationError> {
        let request = GenerateContentRequest {
            contents: vec![Content {
                role: "user",
                parts: vec![Part { text: prompt }],
            }],
            generation_config: GenerationConfig {
                temperature: 1.0,
                top_p: 0.95,
                top_k: 40,
                max_output_tokens: 8192,
                response_mime_type: match format {
                    ResponseFormat::Json => "application/json",
                    ResponseFormat::Text => "text/plain",
                },
            },
        };

        let response = self
            .http
            .post(self.endpoint())
            .header("x-goog-api-key", &self.config.api_key)
            .json(&request)
            .send()
            .await
            .map_err(classify_transport_error)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(
                status = %status,
                model = %self.config.model,
                response_body = %body,
                "gemini: generateContent failed"
            );
            return Err(classify_status(status));
        }

        let parsed: GenerateContentResponse = response
            .json()
            .await
            .map_err(|err| GenerationError::Transient(format!("unreadable response: {err}")))?;

        extract_text(parsed)
    }
}

fn classify_status(status: StatusCode) -> GenerationError {
    if status == StatusCode::TOO_MANY_REQUESTS
        || status == StatusCode::REQUEST_TIMEOUT
        || status.is_server_error()
    {
        GenerationError::Transient(format!("model endpoint returned {status}"))
    } else {
        GenerationError::Fatal(format!("model endpoint returned {status}"))
    }
}

// The request URL never carries the key (it goes in a header), so the error text is safe to keep.
fn classify_transport_error(error: reqwest::Error) -> GenerationError {
    GenerationError::Transient(format!("model request failed: {error}"))
}

fn extract_text(response: GenerateContentResponse) -> Result<String, GenerationError> {
    let Some(candidate) = response.candidates.into_iter().next() else {
        return Err(GenerationError::Fatal("model returned no candidates".to_string()));
    };

    let text: String = candidate
        .content
        .map(|content| {
            content
                .parts
                .into_iter()
                .filter_map(|part| part.text)
                .collect()
        })
        .unwrap_or_default();

    if text.trim().is_empty() {
        return Err(GenerationError::Fatal(format!(
            "model returned empty content (finish reason: {})",
            candidate.finish_reason.as_deref().unwrap_or("unknown")
        )));
    }

    Ok(text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn response(value: serde_json::Value) -> GenerateContentResponse {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn rate_limits_and_server_errors_are_transient() {
        assert!(classify_status(StatusCode::TOO_MANY_REQUESTS).is_retryable());
        assert!(classify_status(StatusCode::SERVICE_UNAVAILABLE).is_retryable());
        assert!(!classify_status(StatusCode::BAD_REQUEST).is_retryable());
        assert!(!classify_status(StatusCode::FORBIDDEN).is_retryable());
    }

    #[test]
    fn joins_candidate_parts() {
        let text = extract_text(response(json!({
            "candidates": [{
                "content": { "parts": [{ "text": "<h3>Intro" }, { "text": "</h3>" }] },
                "finishReason": "STOP"
            }]
        })))
        .unwrap();

        assert_eq!(text, "<h3>Intro</h3>");
    }

    #[test]
    fn empty_candidates_are_fatal() {
        let err = extract_text(response(json!({ "candidates": [] }))).unwrap_err();
        assert!(!err.is_retryable());

        let err = extract_text(response(json!({
            "candidates": [{ "finishReason": "SAFETY" }]
        })))
        .unwrap_err();
        assert_eq!(
            err,
            GenerationError::Fatal("model returned empty content (finish reason: SAFETY)".to_string())
        );
    }

    #[test]
    fn request_asks_for_json_mime_type() {
        let request = GenerateContentRequest {
            contents: vec![Content {
                role: "user",
                parts: vec![Part { text: "hi" }],
            }],
            generation_config: GenerationConfig {
                temperature: 1.0,
                top_p: 0.95,
                top_k: 40,
                max_output_tokens: 8192,
                response_mime_type: "application/json",
            },
        };

        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value["generationConfig"]["responseMimeType"], "application/json");
        assert_eq!(value["contents"][0]["parts"][0]["text"], "hi");
    }
}
