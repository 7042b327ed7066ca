// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
// RAG (Retrieval-Augmented Generation) over a single uploaded PDF
// Index → retrieve → answer, held in a process-wide session

pub mod answerer;
pub mod errors;
pub mod index;
pub mod pipeline;
pub mod retriever;
pub mod session;

pub use answerer::{build_prompt, AnswerResult, Answerer};
pub use errors::RagError;
pub use index::{cosine_distance, DocumentIndex, IndexedChunk, DEFAULT_EMBEDDING_BATCH_SIZE};
pub use pipeline::DocumentProcessor;
pub use retriever::{content_preview, RetrievedChunk, Retriever, DEFAULT_TOP_K, PREVIEW_CHARS};
pub use session::{DocumentInfo, ReadySession, SessionState};
