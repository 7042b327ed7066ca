// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Language model access
//!
//! Answer synthesis goes through the [`LanguageModel`] trait. The production
//! implementation, [`GroqClient`], talks to Groq's OpenAI-compatible chat
//! completions API.

pub mod groq;

pub use groq::GroqClient;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Generation parameters, fixed per answerer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompletionOptions {
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
}

impl Default for CompletionOptions {
    fn default() -> Self {
        Self {
            model: "llama3-8b-8192".to_string(),
            temperature: 0.1,
            max_tokens: 1000,
        }
    }
}

/// Errors returned by language model providers
#[derive(Debug, Error)]
pub enum LlmError {
    /// No API key configured for the provider
    #[error("GROQ_API_KEY environment variable not set")]
    MissingApiKey,

    /// Request exceeded the configured deadline
    #[error("LLM request timed out after {timeout_secs}s")]
    Timeout { timeout_secs: u64 },

    /// Provider returned a non-success status
    #[error("LLM API error: {status} - {message}")]
    Api { status: u16, message: String },

    /// Connection or protocol failure
    #[error("LLM transport error: {0}")]
    Transport(String),

    /// Provider response could not be understood
    #[error("Invalid LLM response: {0}")]
    InvalidResponse(String),
}

/// Prompt → completion capability
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LanguageModel: Send + Sync {
    /// Generate a completion for `prompt`
    async fn complete(
        &self,
        prompt: &str,
        options: &CompletionOptions,
    ) -> Result<String, LlmError>;

    /// Provider name for logging
    fn name(&self) -> &'static str;
}
