//! DTOs for the chat-completions wire format.

use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize)]
pub(super) struct CompletionRequestDto<'a> {
    pub(super) model: &'a str,
    pub(super) messages: [MessageDto<'a>; 2],
    pub(super) temperature: f32,
}

#[derive(Debug, Serialize)]
pub(super) struct MessageDto<'a> {
    pub(super) role: &'a str,
    pub(super) content: &'a str,
}

#[derive(Debug, Deserialize)]
pub(super) struct CompletionResponseDto {
    #[serde(default)]
    pub(super) choices: Vec<ChoiceDto>,
}

#[derive(Debug, Deserialize)]
pub(super) struct ChoiceDto {
    pub(super) message: ChoiceMessageDto,
}

#[derive(Debug, Deserialize)]
pub(super) struct ChoiceMessageDto {
    #[serde(default)]
    pub(super) content: Option<String>,
}

/// Error envelope returned by OpenAI-compatible providers.
#[derive(Debug, Deserialize)]
pub(super) struct ProviderErrorDto {
    pub(super) error: ProviderErrorBodyDto,
}

#[derive(Debug, Deserialize)]
pub(super) struct ProviderErrorBodyDto {
    pub(super) message: String,
}

impl CompletionResponseDto {
    /// First non-empty choice content.
    pub(super) fn into_text(self) -> Result<String, String> {
        self.choices
            .into_iter()
            .find_map(|choice| choice.message.content.filter(|text| !text.trim().is_empty()))
            .ok_or_else(|| "response contained no completion text".to_owned())
    }
}
