// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Document chunking
//!
//! Splits extracted page text into overlapping, size-bounded chunks that
//! become the unit of embedding and retrieval.

mod recursive;

pub use recursive::{RecursiveTextSplitter, DEFAULT_CHUNK_OVERLAP, DEFAULT_CHUNK_SIZE};

use serde::{Deserialize, Serialize};

/// A contiguous text segment with page and sequence provenance
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Chunk {
    /// Sequence id in document order (0-based)
    pub id: usize,
    /// Page the chunk was taken from (0-based)
    pub page: usize,
    /// Chunk text
    pub content: String,
}

impl Chunk {
    /// Length in characters (not bytes)
    pub fn char_len(&self) -> usize {
        self.content.chars().count()
    }
}
