// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use serde::Serialize;
use tracing::debug;

use crate::chunking::Chunk;
use crate::rag::{DocumentIndex, RagError};

pub const DEFAULT_TOP_K: usize = 4;

/// Number of characters shown in a source preview
pub const PREVIEW_CHARS: usize = 200;

/// A chunk returned by retrieval, with its 1-based rank
#[derive(Debug, Clone, Serialize)]
pub struct RetrievedChunk {
    pub chunk: Chunk,
    /// 1 = closest
    pub rank: usize,
    pub distance: f32,
}

impl RetrievedChunk {
    /// First 200 characters of the chunk, with "..." appended when cut
    pub fn preview(&self) -> String {
        content_preview(&self.chunk.content, PREVIEW_CHARS)
    }
}

/// Truncate `content` to `limit` characters, appending "..." when cut
pub fn content_preview(content: &str, limit: usize) -> String {
    match content.char_indices().nth(limit) {
        Some((byte_offset, _)) => format!("{}...", &content[..byte_offset]),
        None => content.to_string(),
    }
}

/// Top-k retriever over a [`DocumentIndex`]
#[derive(Debug, Clone, Copy)]
pub struct Retriever {
    top_k: usize,
}

impl Default for Retriever {
    fn default() -> Self {
        Self {
            top_k: DEFAULT_TOP_K,
        }
    }
}

impl Retriever {
    pub fn new(top_k: usize) -> Self {
        Self { top_k }
    }

    pub fn top_k(&self) -> usize {
        self.top_k
    }

    /// Embed `question` with the index's own embedder and return the
    /// `min(k, index.len())` closest chunks, closest first
    pub async fn query(
        &self,
        index: &DocumentIndex,
        question: &str,
    ) -> Result<Vec<RetrievedChunk>, RagError> {
        let query_vector = index
            .embedder()
            .embed(question)
            .await
            .map_err(|e| RagError::IndexBuild(format!("failed to embed question: {:#}", e)))?;
        if query_vector.iter().any(|v| !v.is_finite()) {
            return Err(RagError::IndexBuild(
                "question embedding contains NaN or Infinity".to_string(),
            ));
        }

        let results: Vec<RetrievedChunk> = index
            .nearest(&query_vector, self.top_k)?
            .into_iter()
            .enumerate()
            .map(|(i, (entry, distance))| RetrievedChunk {
                chunk: entry.chunk.clone(),
                rank: i + 1,
                distance,
            })
            .collect();

        debug!(
            "Retrieved {} of {} chunks (k={})",
            results.len(),
            index.len(),
            self.top_k
        );

        Ok(results)
    }
}
