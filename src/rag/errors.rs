// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Error types for the document question-answering pipeline
//!
//! Every operation of the pipeline returns one of these variants:
//! - Request errors (bad file type, blank question, no document loaded)
//! - Content errors (PDF without extractable text)
//! - Server errors (missing configuration, index build failures, LLM failures)

use thiserror::Error;

use crate::llm::LlmError;
use crate::pdf::ExtractError;

/// Errors that can occur while indexing a document or answering a question
#[derive(Error, Debug)]
pub enum RagError {
    /// Request failed validation (file type, empty question, bad parameters)
    #[error("Validation error: {0}")]
    Validation(String),

    /// A question was asked before any document was indexed
    #[error("No PDF document has been uploaded and processed. Please upload a PDF first.")]
    NotReady,

    /// Required configuration or capability is missing
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// The PDF could not be read or has no extractable text
    #[error("Extraction error: {0}")]
    Extraction(String),

    /// Building the vector index failed; no partial index is kept
    #[error("Failed to build index: {0}")]
    IndexBuild(String),

    /// Query embedding does not match the embedder the index was built with
    #[error("Embedder mismatch: index built with {expected}D vectors, query has {actual}D")]
    EmbedderMismatch { expected: usize, actual: usize },

    /// The language model call failed
    #[error("LLM invocation failed: {0}")]
    LlmInvocation(String),

    /// The language model call exceeded its deadline
    #[error("LLM request timed out after {timeout_secs}s")]
    LlmTimeout { timeout_secs: u64 },
}

impl From<ExtractError> for RagError {
    fn from(err: ExtractError) -> Self {
        RagError::Extraction(err.to_string())
    }
}

impl From<LlmError> for RagError {
    fn from(err: LlmError) -> Self {
        match err {
            LlmError::Timeout { timeout_secs } => RagError::LlmTimeout { timeout_secs },
            LlmError::MissingApiKey => RagError::Configuration(err.to_string()),
            other => RagError::LlmInvocation(other.to_string()),
        }
    }
}

impl RagError {
    /// Get user-friendly error message for API responses
    pub fn user_message(&self) -> String {
        match self {
            RagError::Validation(msg) => msg.clone(),
            RagError::Configuration(msg) => msg.clone(),
            RagError::Extraction(msg) => msg.clone(),
            RagError::IndexBuild(msg) => format!("Error processing PDF: {}", msg),
            RagError::EmbedderMismatch { .. } => {
                "Index integrity error: please re-upload the document".to_string()
            }
            RagError::LlmInvocation(msg) => format!("Error processing question: {}", msg),
            _ => self.to_string(),
        }
    }

    /// Get error code for logging and API responses
    pub fn error_code(&self) -> &'static str {
        match self {
            RagError::Validation(_) => "VALIDATION_ERROR",
            RagError::NotReady => "NOT_READY",
            RagError::Configuration(_) => "CONFIGURATION_ERROR",
            RagError::Extraction(_) => "EXTRACTION_ERROR",
            RagError::IndexBuild(_) => "INDEX_BUILD_ERROR",
            RagError::EmbedderMismatch { .. } => "EMBEDDER_MISMATCH",
            RagError::LlmInvocation(_) => "LLM_INVOCATION_ERROR",
            RagError::LlmTimeout { .. } => "LLM_TIMEOUT",
        }
    }

    /// HTTP status code this error maps to
    pub fn status_code(&self) -> u16 {
        match self {
            RagError::Validation(_) | RagError::NotReady | RagError::Extraction(_) => 400,
            RagError::LlmTimeout { .. } => 504,
            RagError::Configuration(_)
            | RagError::IndexBuild(_)
            | RagError::EmbedderMismatch { .. }
            | RagError::LlmInvocation(_) => 500,
        }
    }
}
