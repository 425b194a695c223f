//! Driven port for text completion by a language model.
use async_trait::async_trait;

use super::define_port_error;

define_port_error! {
    /// Failures talking to the model provider.
    pub enum LanguageModelError {
        /// No API key is configured.
        NotConfigured => "AI provider is not configured",
        /// The request never produced a response.
        Transport { message: String } => "AI provider request failed: {message}",
        /// The provider answered with a non-success status.
        Provider { status: u16, message: String } =>
            "AI provider returned status {status}: {message}",
        /// The response body did not have the expected shape.
        Decode { message: String } => "AI provider response was malformed: {message}",
    }
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LanguageModel: Send + Sync {
    /// Model identifier recorded alongside each call.
    fn model(&self) -> String;

    /// Complete `prompt` and return the generated text.
    async fn complete(&self, prompt: &str) -> Result<String, LanguageModelError>;
}
