//! OpenRouter Provider - AiProvider implementation for OpenRouter's
//! OpenAI-compatible chat completions API.

use async_trait::async_trait;
use reqwest::{Client, Response, StatusCode};
use secrecy::{ExposeSecret, Secret};
use serde::{Deserialize, Serialize};

use crate::ports::{
    AiProvider, CompletionRequest, CompletionResponse, MessageRole, ProviderError, ProviderInfo,
};

const DEFAULT_BASE_URL: &str = "https://openrouter.ai/api/v1";

/// Configuration for the OpenRouter provider.
#[derive(Debug, Clone)]
pub struct OpenRouterConfig {
    api_key: Secret<String>,
    /// Registered provider name, as used by the selector.
    pub name: String,
    /// Model identifier (e.g. "anthropic/claude-3.5-sonnet").
    pub model: String,
    /// Base URL for the API.
    pub base_url: String,
}

impl OpenRouterConfig {
    /// Creates a configuration with the given registered name and API key.
    pub fn new(name: impl Into<String>, api_key: Secret<String>) -> Self {
        Self {
            api_key,
            name: name.into(),
            model: "openai/gpt-4o-mini".to_string(),
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

/// OpenRouter API provider implementation.
pub struct OpenRouterProvider {
    config: OpenRouterConfig,
    client: Client,
}

impl OpenRouterProvider {
    /// Creates a provider; fails if the HTTP client cannot be built.
    pub fn new(config: OpenRouterConfig) -> Result<Self, ProviderError> {
        let client = Client::builder()
            .build()
            .map_err(|e| ProviderError::network(e.to_string()))?;
        Ok(Self { config, client })
    }

    fn completions_url(&self) -> String {
        format!("{}/chat/completions", self.config.base_url)
    }

    fn to_openrouter_request(&self, request: &CompletionRequest) -> OpenRouterRequest {
        let messages = request
            .messages
            .iter()
            .map(|msg| OpenRouterMessage {
                role: match msg.role {
                    MessageRole::System => "system",
                    MessageRole::User => "user",
                    MessageRole::Assistant => "assistant",
                }
                .to_string(),
                content: msg.content.clone(),
            })
            .collect();

        OpenRouterRequest {
            model: self.config.model.clone(),
            messages,
            max_tokens: request.max_tokens,
            temperature: request.temperature,
        }
    }

    async fn send_request(&self, request: &CompletionRequest) -> Result<Response, ProviderError> {
        let body = self.to_openrouter_request(request);

        self.client
            .post(self.completions_url())
            .header("Authorization", format!("Bearer {}", self.config.api_key()))
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
            // 402 is OpenRouter's out-of-credits signal; treat like a quota hit
            StatusCode::TOO_MANY_REQUESTS | StatusCode::PAYMENT_REQUIRED => {
                Err(ProviderError::rate_limited(60))
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
impl AiProvider for OpenRouterProvider {
    async fn complete(
        &self,
        request: CompletionRequest,
    ) -> Result<CompletionResponse, ProviderError> {
        let response = self.send_request(&request).await?;
        let response = self.classify_status(response).await?;

        let parsed: OpenRouterResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::malformed(e.to_string()))?;

        let content = parsed
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or_else(|| ProviderError::malformed("response contained no choices"))?;

        Ok(CompletionResponse {
            content,
            model: parsed.model.unwrap_or_else(|| self.config.model.clone()),
        })
    }

    fn provider_info(&self) -> ProviderInfo {
        ProviderInfo::new(&self.config.name, &self.config.model)
    }
}

#[derive(Debug, Serialize)]
struct OpenRouterRequest {
    model: String,
    messages: Vec<OpenRouterMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
}

#[derive(Debug, Serialize, Deserialize)]
struct OpenRouterMessage {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct OpenRouterResponse {
    #[serde(default)]
    choices: Vec<OpenRouterChoice>,
    model: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OpenRouterChoice {
    message: OpenRouterMessage,
}
