//! Reqwest-backed chat-completions adapter.
//!
//! This adapter owns transport details only: request serialisation, bearer
//! authentication, HTTP error mapping and JSON decoding of the first choice.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode, Url};
use tracing::debug;
use zeroize::Zeroizing;

use super::dto::{CompletionRequestDto, CompletionResponseDto, MessageDto, ProviderErrorDto};
use crate::domain::SYSTEM_PROMPT;
use crate::domain::ports::{LanguageModel, LanguageModelError};

/// Default provider base URL.
pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
/// Default model identifier.
pub const DEFAULT_MODEL: &str = "gpt-3.5-turbo";
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);
const TEMPERATURE: f32 = 0.7;

/// Provider settings for [`ChatCompletionsModel`].
#[derive(Debug, Clone)]
pub struct ChatCompletionsConfig {
    /// Bearer key; `None` leaves the adapter unconfigured.
    pub api_key: Option<String>,
    /// Base URL the `/chat/completions` path is appended to.
    pub base_url: Url,
    pub model: String,
    pub timeout: Duration,
}

impl ChatCompletionsConfig {
    /// Configuration pointing at the default provider.
    ///
    /// # Errors
    ///
    /// Returns an error when `base_url` is not a valid URL.
    pub fn new(
        api_key: Option<String>,
        base_url: Option<&str>,
        model: Option<String>,
    ) -> Result<Self, url::ParseError> {
        let base_url = Url::parse(base_url.unwrap_or(DEFAULT_BASE_URL))?;
        Ok(Self {
            api_key: api_key.filter(|key| !key.trim().is_empty()),
            base_url,
            model: model.unwrap_or_else(|| DEFAULT_MODEL.to_owned()),
            timeout: DEFAULT_TIMEOUT,
        })
    }
}

/// `LanguageModel` adapter for OpenAI-compatible providers.
pub struct ChatCompletionsModel {
    client: Client,
    endpoint: Url,
    api_key: Option<Zeroizing<String>>,
    model: String,
}

impl ChatCompletionsModel {
    /// Build an adapter with a reqwest client bounded by `config.timeout`.
    ///
    /// # Errors
    ///
    /// Returns an error when the reqwest client cannot be constructed.
    pub fn new(config: ChatCompletionsConfig) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(config.timeout).build()?;
        Ok(Self {
            client,
            endpoint: completions_endpoint(&config.base_url),
            api_key: config.api_key.map(Zeroizing::new),
            model: config.model,
        })
    }

    /// Whether an API key is present.
    #[must_use]
    pub const fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }
}

#[async_trait]
impl LanguageModel for ChatCompletionsModel {
    fn model(&self) -> String {
        self.model.clone()
    }

    async fn complete(&self, prompt: &str) -> Result<String, LanguageModelError> {
        let Some(api_key) = self.api_key.as_ref() else {
            return Err(LanguageModelError::not_configured());
        };
        let request = CompletionRequestDto {
            model: &self.model,
            messages: [
                MessageDto {
                    role: "system",
                    content: SYSTEM_PROMPT,
                },
                MessageDto {
                    role: "user",
                    content: prompt,
                },
            ],
            temperature: TEMPERATURE,
        };
        debug!(model = %self.model, "requesting completion");
        let response = self
            .client
            .post(self.endpoint.clone())
            .bearer_auth(api_key.as_str())
            .json(&request)
            .send()
            .await
            .map_err(|error| LanguageModelError::transport(error.to_string()))?;

        let status = response.status();
        let body = response
            .bytes()
            .await
            .map_err(|error| LanguageModelError::transport(error.to_string()))?;
        if !status.is_success() {
            return Err(map_status_error(status, body.as_ref()));
        }
        parse_completion(body.as_ref())
    }
}

fn completions_endpoint(base_url: &Url) -> Url {
    let mut endpoint = base_url.clone();
    let path = format!("{}/chat/completions", base_url.path().trim_end_matches('/'));
    endpoint.set_path(&path);
    endpoint
}

fn parse_completion(body: &[u8]) -> Result<String, LanguageModelError> {
    let decoded: CompletionResponseDto = serde_json::from_slice(body)
        .map_err(|error| LanguageModelError::decode(format!("invalid JSON payload: {error}")))?;
    decoded.into_text().map_err(LanguageModelError::decode)
}

fn map_status_error(status: StatusCode, body: &[u8]) -> LanguageModelError {
    let message = serde_json::from_slice::<ProviderErrorDto>(body).map_or_else(
        |_| body_preview(body),
        |envelope| envelope.error.message,
    );
    LanguageModelError::provider(status.as_u16(), message)
}

fn body_preview(body: &[u8]) -> String {
    const PREVIEW_CHAR_LIMIT: usize = 160;

    let compact = String::from_utf8_lossy(body)
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ");
    compact.chars().take(PREVIEW_CHAR_LIMIT).collect()
}
