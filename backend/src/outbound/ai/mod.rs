//! Language model outbound adapters.
//!
//! This module provides a thin HTTP implementation of the `LanguageModel`
//! port against any OpenAI-compatible `/chat/completions` endpoint.

mod dto;
mod http_model;

pub use http_model::{ChatCompletionsConfig, ChatCompletionsModel};
