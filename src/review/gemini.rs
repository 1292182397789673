use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use super::{ReviewError, ReviewModel};
use crate::config::GeminiConfig;

/// Client for the Gemini `generateContent` endpoint.
pub struct GeminiClient {
    http: reqwest::Client,
    api_url: String,
    api_key: String,
    model: String,
}

#[derive(Serialize)]
struct GenerateRequest<'a> {
    contents: Vec<Content<'a>>,
}

#[derive(Serialize)]
struct Content<'a> {
    role: &'a str,
    parts: Vec<Part<'a>>,
}

#[derive(Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Deserialize)]
struct CandidatePart {
    #[serde(default)]
    text: Option<String>,
}

impl GeminiClient {
    pub fn new(config: &GeminiConfig, api_key: &str) -> Result<GeminiClient, ReviewError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(GeminiClient {
            http,
            api_url: config.api_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            model: config.model.clone(),
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

#[async_trait]
impl ReviewModel for GeminiClient {
    #[instrument(skip(self, prompt), fields(model = %self.model, prompt_bytes = prompt.len()))]
    async fn generate(&self, prompt: &str) -> Result<String, ReviewError> {
        let url = format!(
            "{}/v1beta/models/{}:generateContent",
            self.api_url, self.model
        );
        let body = GenerateRequest {
            contents: vec![Content {
                role: "user",
                parts: vec![Part { text: prompt }],
            }],
        };

        let response = self
            .http
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ReviewError::ApiStatus { status, body });
        }

        let parsed: GenerateResponse = response.json().await?;
        let text: String = parsed
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .ok_or(ReviewError::NoCandidates)?
            .parts
            .into_iter()
            .filter_map(|p| p.text)
            .collect();
        debug!(response_bytes = text.len(), "received model response");
        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;
    use serde_json::json;

    fn config_for(server: &mockito::ServerGuard) -> GeminiConfig {
        GeminiConfig {
            api_url: server.url(),
            ..GeminiConfig::default()
        }
    }

    #[test]
    fn test_client_uses_configured_model() {
        let config = GeminiConfig {
            model: "gemini-2.5-pro".to_string(),
            ..GeminiConfig::default()
        };
        let client = GeminiClient::new(&config, "key").unwrap();
        assert_eq!(client.model(), "gemini-2.5-pro");
    }

    #[tokio::test]
    async fn test_generate_concatenates_parts() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/v1beta/models/gemini-2.5-flash:generateContent")
            .match_header("x-goog-api-key", "gem-key")
            .match_body(Matcher::Json(json!({
                "contents": [{ "role": "user", "parts": [{ "text": "review this" }] }]
            })))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                json!({
                    "candidates": [{
                        "content": { "role": "model", "parts": [{ "text": "[" }, { "text": "]" }] },
                        "finishReason": "STOP"
                    }]
                })
                .to_string(),
            )
            .create_async()
            .await;

        let client = GeminiClient::new(&config_for(&server), "gem-key").unwrap();
        let text = client.generate("review this").await.unwrap();
        assert_eq!(text, "[]");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_generate_reports_quota_error() {
        let mut server = mockito::Server::new_async().await;
        let _quota = server
            .mock("POST", "/v1beta/models/gemini-2.5-flash:generateContent")
            .with_status(429)
            .with_body(r#"{"error":{"code":429,"message":"Resource has been exhausted"}}"#)
            .create_async()
            .await;

        let client = GeminiClient::new(&config_for(&server), "gem-key").unwrap();
        let err = client.generate("x").await.unwrap_err();
        assert!(matches!(err, ReviewError::ApiStatus { status, .. } if status.as_u16() == 429));
    }

    #[tokio::test]
    async fn test_generate_without_candidates() {
        let mut server = mockito::Server::new_async().await;
        let _blocked = server
            .mock("POST", "/v1beta/models/gemini-2.5-flash:generateContent")
            .with_status(200)
            .with_body(r#"{"promptFeedback":{"blockReason":"SAFETY"}}"#)
            .create_async()
            .await;

        let client = GeminiClient::new(&config_for(&server), "gem-key").unwrap();
        let err = client.generate("x").await.unwrap_err();
        assert!(matches!(err, ReviewError::NoCandidates));
    }
}
