// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Node configuration loaded from environment variables

use std::env;
use std::str::FromStr;

use crate::chunking::{DEFAULT_CHUNK_OVERLAP, DEFAULT_CHUNK_SIZE};
use crate::llm::{groq::GROQ_API_URL, CompletionOptions};
use crate::rag::{DEFAULT_EMBEDDING_BATCH_SIZE, DEFAULT_TOP_K};

pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 50 * 1024 * 1024;

/// Which [`Embedder`](crate::embeddings::Embedder) implementation to load
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmbeddingBackend {
    /// all-MiniLM-L6-v2 on ONNX Runtime
    Onnx,
    /// Feature hashing, no model files
    Hash,
}

impl FromStr for EmbeddingBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "onnx" => Ok(EmbeddingBackend::Onnx),
            "hash" => Ok(EmbeddingBackend::Hash),
            other => Err(format!("Unknown embedding backend: {}", other)),
        }
    }
}

/// Top-level configuration for the question-answering node
#[derive(Debug, Clone)]
pub struct NodeConfig {
    pub llm: LlmConfig,
    pub embedding: EmbeddingConfig,
    /// Maximum chunk length in characters
    pub chunk_size: usize,
    /// Characters shared between consecutive chunks
    pub chunk_overlap: usize,
    /// Chunks retrieved per question
    pub retrieval_top_k: usize,
    pub api_host: String,
    pub api_port: u16,
    /// Upload body limit
    pub max_upload_bytes: usize,
}

/// Groq settings
#[derive(Debug, Clone)]
pub struct LlmConfig {
    pub api_key: Option<String>,
    pub api_url: String,
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
    pub timeout_secs: u64,
}

/// Embedding model settings
#[derive(Debug, Clone)]
pub struct EmbeddingConfig {
    pub backend: EmbeddingBackend,
    pub model_path: String,
    pub tokenizer_path: String,
    pub batch_size: usize,
}

fn parse_env<T: FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}

impl NodeConfig {
    /// Load configuration from environment variables
    ///
    /// Unset or unparsable values fall back to the defaults.
    pub fn from_env() -> Self {
        let defaults = Self::default();

        Self {
            llm: LlmConfig {
                api_key: env::var("GROQ_API_KEY")
                    .ok()
                    .filter(|key| !key.trim().is_empty()),
                api_url: env::var("GROQ_API_URL").unwrap_or(defaults.llm.api_url),
                model: env::var("GROQ_MODEL").unwrap_or(defaults.llm.model),
                temperature: parse_env("LLM_TEMPERATURE", defaults.llm.temperature),
                max_tokens: parse_env("LLM_MAX_TOKENS", defaults.llm.max_tokens),
                timeout_secs: parse_env("LLM_TIMEOUT_SECS", defaults.llm.timeout_secs),
            },
            embedding: EmbeddingConfig {
                backend: parse_env("EMBEDDING_BACKEND", defaults.embedding.backend),
                model_path: env::var("EMBEDDING_MODEL_PATH")
                    .unwrap_or(defaults.embedding.model_path),
                tokenizer_path: env::var("EMBEDDING_TOKENIZER_PATH")
                    .unwrap_or(defaults.embedding.tokenizer_path),
                batch_size: parse_env("EMBEDDING_BATCH_SIZE", defaults.embedding.batch_size),
            },
            chunk_size: parse_env("CHUNK_SIZE", defaults.chunk_size),
            chunk_overlap: parse_env("CHUNK_OVERLAP", defaults.chunk_overlap),
            retrieval_top_k: parse_env("RETRIEVAL_TOP_K", defaults.retrieval_top_k),
            api_host: env::var("API_HOST").unwrap_or(defaults.api_host),
            api_port: parse_env("API_PORT", defaults.api_port),
            max_upload_bytes: parse_env("MAX_UPLOAD_BYTES", defaults.max_upload_bytes),
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.chunk_size == 0 {
            return Err("Chunk size must be greater than 0".to_string());
        }
        if self.chunk_overlap >= self.chunk_size {
            return Err(format!(
                "Chunk overlap ({}) must be smaller than chunk size ({})",
                self.chunk_overlap, self.chunk_size
            ));
        }
        if self.retrieval_top_k == 0 {
            return Err("Retrieval top-k must be greater than 0".to_string());
        }
        if self.embedding.batch_size == 0 {
            return Err("Embedding batch size must be greater than 0".to_string());
        }
        if !(0.0..=2.0).contains(&self.llm.temperature) {
            return Err(format!(
                "LLM temperature must be within 0.0..=2.0, got {}",
                self.llm.temperature
            ));
        }
        if self.llm.timeout_secs == 0 {
            return Err("LLM timeout must be greater than 0".to_string());
        }
        if self.max_upload_bytes == 0 {
            return Err("Max upload size must be greater than 0".to_string());
        }
        Ok(())
    }

    /// Generation parameters for the answerer
    pub fn completion_options(&self) -> CompletionOptions {
        CompletionOptions {
            model: self.llm.model.clone(),
            temperature: self.llm.temperature,
            max_tokens: self.llm.max_tokens,
        }
    }
}

impl Default for NodeConfig {
    fn default() -> Self {
        let options = CompletionOptions::default();
        Self {
            llm: LlmConfig {
                api_key: None,
                api_url: GROQ_API_URL.to_string(),
                model: options.model,
                temperature: options.temperature,
                max_tokens: options.max_tokens,
                timeout_secs: 60,
            },
            embedding: EmbeddingConfig {
                backend: EmbeddingBackend::Onnx,
                model_path: "./models/all-MiniLM-L6-v2-onnx/model.onnx".to_string(),
                tokenizer_path: "./models/all-MiniLM-L6-v2-onnx/tokenizer.json".to_string(),
                batch_size: DEFAULT_EMBEDDING_BATCH_SIZE,
            },
            chunk_size: DEFAULT_CHUNK_SIZE,
            chunk_overlap: DEFAULT_CHUNK_OVERLAP,
            retrieval_top_k: DEFAULT_TOP_K,
            api_host: "0.0.0.0".to_string(),
            api_port: 8000,
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
        }
    }
}
