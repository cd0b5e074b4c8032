//! Gemini Provider - AiProvider implementation for Google's Gemini API.
//!
//! Calls the `generateContent` endpoint. System messages are folded into the
//! request's `systemInstruction`; user and assistant turns map to Gemini's
//! `user`/`model` roles.

use async_trait::async_trait;
use reqwest::{Client, Response, StatusCode};
use secrecy::{ExposeSecret, Secret};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::ports::{
    AiProvider, CompletionRequest, CompletionResponse, MessageRole, ProviderError, ProviderInfo,
};

const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Configuration for the Gemini provider.
#[derive(Debug, Clone)]
pub struct GeminiConfig {
    api_key: Secret<String>,
    /// Registered provider name, as used by the selector.
    pub name: String,
    /// Model identifier (e.g. "gemini-1.5-flash").
    pub model: String,
    /// Base URL for the API.
    pub base_url: String,
}

impl GeminiConfig {
    /// Creates a configuration with the given registered name and API key.
    pub fn new(name: impl Into<String>, api_key: Secret<String>) -> Self {
        Self {
            api_key,
            name: name.into(),
            model: "gemini-1.5-flash".to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }

    /// Sets the model.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Sets the base URL.
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    fn api_key(&self) -> &str {
        self.api_key.expose_secret()
    }
}

/// Gemini API provider implementation.
pub struct GeminiProvider {
    config: GeminiConfig,
    client: Client,
}

impl GeminiProvider {
    /// Creates a provider; fails if the HTTP client cannot be built.
    pub fn new(config: GeminiConfig) -> Result<Self, ProviderError> {
        let client = Client::builder()
            .build()
            .map_err(|e| ProviderError::network(e.to_string()))?;
        Ok(Self { config, client })
    }

    fn generate_url(&self) -> String {
        format!(
            "{}/models/{}:generateContent",
            self.config.base_url, self.config.model
        )
    }

    fn to_gemini_request(&self, request: &CompletionRequest) -> GeminiRequest {
        let mut system_parts = Vec::new();
        let mut contents = Vec::new();

        for msg in &request.messages {
            match msg.role {
                MessageRole::System => system_parts.push(GeminiPart {
                    text: msg.content.clone(),
                }),
                MessageRole::User => contents.push(GeminiContent {
                    role: "user".to_string(),
                    parts: vec![GeminiPart {
                        text: msg.content.clone(),
                    }],
                }),
                MessageRole::Assistant => contents.push(GeminiContent {
                    role: "model".to_string(),
                    parts: vec![GeminiPart {
                        text: msg.content.clone(),
                    }],
                }),
            }
        }

        GeminiRequest {
            contents,
            system_instruction: if system_parts.is_empty() {
                None
            } else {
                Some(GeminiSystemInstruction {
                    parts: system_parts,
                })
            },
            generation_config: GeminiGenerationConfig {
                max_output_tokens: request.max_tokens,
                temperature: request.temperature,
            },
        }
    }

    async fn send_request(&self, request: &CompletionRequest) -> Result<Response, ProviderError> {
        let body = self.to_gemini_request(request);

        self.client
            .post(self.generate_url())
            .query(&[("key", self.config.api_key())])
            .timeout(request.timeout)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    ProviderError::Timeout {
                        timeout_secs: request.timeout.as_secs() as u32,
                    }
                } else {
                    ProviderError::network(e.to_string())
                }
            })
    }

    async fn classify_status(&self, response: Response) -> Result<Response, ProviderError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        match status {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Err(ProviderError::AuthInvalid),
            StatusCode::TOO_MANY_REQUESTS => {
                Err(ProviderError::rate_limited(parse_retry_after(&body)))
            }
            s if s.is_server_error() => Err(ProviderError::server(s.as_u16(), body)),
            _ => Err(ProviderError::malformed(format!(
                "unexpected status {}: {}",
                status.as_u16(),
                body
            ))),
        }
    }
}

#[async_trait]
impl AiProvider for GeminiProvider {
    async fn complete(
        &self,
        request: CompletionRequest,
    ) -> Result<CompletionResponse, ProviderError> {
        let response = self.send_request(&request).await?;
        let response = self.classify_status(response).await?;

        let parsed: GeminiResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::malformed(e.to_string()))?;

        let content = parsed
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content.parts.into_iter().next())
            .map(|p| p.text)
            .ok_or_else(|| ProviderError::malformed("response contained no candidates"))?;

        Ok(CompletionResponse {
            content,
            model: self.config.model.clone(),
        })
    }

    fn provider_info(&self) -> ProviderInfo {
        ProviderInfo::new(&self.config.name, &self.config.model)
    }
}

/// Best-effort retry-after from the error body, falling back to 30s.
fn parse_retry_after(body: &str) -> u32 {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| {
            v.pointer("/error/details/0/retryDelay")
                .and_then(|d| d.as_str())
                .and_then(|d| d.trim_end_matches('s').parse().ok())
        })
        .unwrap_or(30)
}

#[derive(Debug, Serialize)]
struct GeminiRequest {
    contents: Vec<GeminiContent>,
    #[serde(rename = "systemInstruction", skip_serializing_if = "Option::is_none")]
    system_instruction: Option<GeminiSystemInstruction>,
    #[serde(rename = "generationConfig")]
    generation_config: GeminiGenerationConfig,
}

#[derive(Debug, Serialize)]
struct GeminiSystemInstruction {
    parts: Vec<GeminiPart>,
}

#[derive(Debug, Serialize, Deserialize)]
struct GeminiContent {
    role: String,
    parts: Vec<GeminiPart>,
}

#[derive(Debug, Serialize, Deserialize)]
struct GeminiPart {
    text: String,
}

#[derive(Debug, Serialize)]
struct GeminiGenerationConfig {
    #[serde(rename = "maxOutputTokens", skip_serializing_if = "Option::is_none")]
    max_output_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
}

#[derive(Debug, Deserialize)]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
}

#[derive(Debug, Deserialize)]
struct GeminiCandidate {
    content: GeminiCandidateContent,
}

#[derive(Debug, Deserialize)]
struct GeminiCandidateContent {
    #[serde(default)]
    parts: Vec<GeminiPart>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::Message;

    fn provider() -> GeminiProvider {
        GeminiProvider::new(GeminiConfig::new(
            "gemini",
            Secret::new("test-key".to_string()),
        ))
        .unwrap()
    }

    #[test]
    fn system_messages_become_system_instruction() {
        let provider = provider();
        let request = CompletionRequest::new(Duration::from_secs(30)).with_messages(vec![
            Message::system("be kind"),
            Message::user("hello"),
            Message::assistant("hi"),
        ]);

        let gemini = provider.to_gemini_request(&request);

        let instruction = gemini.system_instruction.unwrap();
        assert_eq!(instruction.parts[0].text, "be kind");
        assert_eq!(gemini.contents.len(), 2);
        assert_eq!(gemini.contents[0].role, "user");
        assert_eq!(gemini.contents[1].role, "model");
    }

    #[test]
    fn generate_url_includes_model() {
        let provider = provider();
        assert_eq!(
            provider.generate_url(),
            "https://generativelanguage.googleapis.com/v1beta/models/gemini-1.5-flash:generateContent"
        );
    }

    #[test]
    fn retry_after_parses_gemini_detail() {
        let body = r#"{"error":{"details":[{"retryDelay":"17s"}]}}"#;
        assert_eq!(parse_retry_after(body), 17);
    }

    #[test]
    fn retry_after_defaults_without_detail() {
        assert_eq!(parse_retry_after("not json"), 30);
        assert_eq!(parse_retry_after("{}"), 30);
    }

    #[test]
    fn response_parsing_extracts_first_candidate() {
        let json = r#"{"candidates":[{"content":{"parts":[{"text":"hello there"}]}}]}"#;
        let parsed: GeminiResponse = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.candidates[0].content.parts[0].text, "hello there");
    }
}
