// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Text embeddings
//!
//! The [`Embedder`] trait is the seam between the retrieval pipeline and the
//! embedding model. Two implementations are provided:
//! - [`OnnxEmbeddingModel`]: all-MiniLM-L6-v2 running on ONNX Runtime (CPU)
//! - [`HashEmbedder`]: deterministic feature-hashing embedder with no model
//!   files, used for lightweight deployments and tests

pub mod hash;
pub mod onnx_model;

pub use hash::HashEmbedder;
pub use onnx_model::OnnxEmbeddingModel;

use anyhow::Result;
use async_trait::async_trait;

/// Text → fixed-length vector capability
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Embed a single text
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;

    /// Embed several texts, one vector per input in the same order
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let mut vectors = Vec::with_capacity(texts.len());
        for text in texts {
            vectors.push(self.embed(text).await?);
        }
        Ok(vectors)
    }

    /// Output dimension
    fn dimension(&self) -> usize;

    /// Model identifier, used to tell embedders apart
    fn model_name(&self) -> &str;
}
