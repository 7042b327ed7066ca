// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
// In-memory vector index over the chunks of the current document.
// Built in one shot; never updated incrementally.

use std::cmp::Ordering;
use std::sync::Arc;
use tracing::{debug, info};

use crate::chunking::Chunk;
use crate::embeddings::Embedder;
use crate::rag::RagError;

pub const DEFAULT_EMBEDDING_BATCH_SIZE: usize = 32;

/// Chunk paired with its embedding vector
#[derive(Clone, Debug)]
pub struct IndexedChunk {
    pub chunk: Chunk,
    pub vector: Vec<f32>,
}

/// Nearest-neighbour index over one document's chunks
///
/// - Exact brute-force search using cosine distance (`1 - cosine_similarity`)
/// - Ties broken by chunk sequence id (lower id wins)
/// - The embedder used at build time is bound to the index, so queries are
///   always embedded by the same model
pub struct DocumentIndex {
    entries: Vec<IndexedChunk>,
    embedder: Arc<dyn Embedder>,
    dimension: usize,
}

impl std::fmt::Debug for DocumentIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DocumentIndex")
            .field("chunks", &self.entries.len())
            .field("dimension", &self.dimension)
            .field("embedder", &self.embedder.model_name())
            .finish()
    }
}

impl DocumentIndex {
    /// Embed every chunk and build the index
    ///
    /// # Arguments
    /// * `chunks` - Chunks to index (must not be empty)
    /// * `embedder` - Embedding model; bound to the index
    /// * `batch_size` - Number of chunks sent to the embedder per call
    ///
    /// # Returns
    /// * `Err(RagError::IndexBuild)` if `chunks` is empty or any embedding
    ///   fails or is malformed. Nothing partial is ever returned.
    pub async fn build(
        chunks: Vec<Chunk>,
        embedder: Arc<dyn Embedder>,
        batch_size: usize,
    ) -> Result<Self, RagError> {
        if chunks.is_empty() {
            return Err(RagError::IndexBuild("no chunks to index".to_string()));
        }

        let dimension = embedder.dimension();
        let batch_size = batch_size.max(1);
        let mut vectors: Vec<Vec<f32>> = Vec::with_capacity(chunks.len());

        for batch in chunks.chunks(batch_size) {
            let texts: Vec<String> = batch.iter().map(|c| c.content.clone()).collect();
            let embedded = embedder
                .embed_batch(&texts)
                .await
                .map_err(|e| RagError::IndexBuild(format!("embedding failed: {:#}", e)))?;

            if embedded.len() != batch.len() {
                return Err(RagError::IndexBuild(format!(
                    "embedder returned {} vectors for {} chunks",
                    embedded.len(),
                    batch.len()
                )));
            }

            for (chunk, vector) in batch.iter().zip(&embedded) {
                validate_vector(chunk.id, vector, dimension)?;
            }

            vectors.extend(embedded);
            debug!("Embedded {}/{} chunks", vectors.len(), chunks.len());
        }

        let entries: Vec<IndexedChunk> = chunks
            .into_iter()
            .zip(vectors)
            .map(|(chunk, vector)| IndexedChunk { chunk, vector })
            .collect();

        info!(
            "Built index: {} chunks, {}D vectors ({})",
            entries.len(),
            dimension,
            embedder.model_name()
        );

        Ok(Self {
            entries,
            embedder,
            dimension,
        })
    }

    /// Return up to `k` entries closest to `query`, with their distances
    ///
    /// Results are ordered by ascending distance, then ascending chunk id.
    pub fn nearest(&self, query: &[f32], k: usize) -> Result<Vec<(&IndexedChunk, f32)>, RagError> {
        if query.len() != self.dimension {
            return Err(RagError::EmbedderMismatch {
                expected: self.dimension,
                actual: query.len(),
            });
        }

        let mut scored: Vec<(&IndexedChunk, f32)> = self
            .entries
            .iter()
            .map(|entry| (entry, cosine_distance(query, &entry.vector)))
            .collect();

        scored.sort_by(|(a, da), (b, db)| {
            da.partial_cmp(db)
                .unwrap_or(Ordering::Equal)
                .then_with(|| a.chunk.id.cmp(&b.chunk.id))
        });
        scored.truncate(k);

        Ok(scored)
    }

    /// Embedder bound to this index
    pub fn embedder(&self) -> &Arc<dyn Embedder> {
        &self.embedder
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn chunks(&self) -> impl Iterator<Item = &Chunk> {
        self.entries.iter().map(|e| &e.chunk)
    }
}

fn validate_vector(chunk_id: usize, vector: &[f32], dimension: usize) -> Result<(), RagError> {
    if vector.len() != dimension {
        return Err(RagError::IndexBuild(format!(
            "chunk {} embedded to {}D vector, expected {}D",
            chunk_id,
            vector.len(),
            dimension
        )));
    }
    if vector.iter().any(|v| !v.is_finite()) {
        return Err(RagError::IndexBuild(format!(
            "chunk {} embedding contains NaN or Infinity",
            chunk_id
        )));
    }
    Ok(())
}

/// Cosine distance in [0, 2]; zero vectors are treated as orthogonal
pub fn cosine_distance(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 1.0;
    }

    1.0 - dot / (norm_a * norm_b)
}
