// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Process-wide document session
//!
//! The session is either EMPTY (no document) or READY (one indexed document).
//! Uploads build a complete [`ReadySession`] without holding the lock, then
//! swap it in. Questions clone the `Arc`s under a read lock and release it
//! before any embedding or LLM work.

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info};

use crate::rag::{AnswerResult, Answerer, DocumentIndex, RagError, Retriever};

/// Summary of the indexed document, echoed in API responses
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentInfo {
    pub filename: String,
    pub num_pages: usize,
    pub num_chunks: usize,
    /// Sum of chunk lengths in characters
    pub total_characters: usize,
}

/// Everything needed to answer questions about one document
#[derive(Clone)]
pub struct ReadySession {
    pub index: Arc<DocumentIndex>,
    pub retriever: Retriever,
    pub answerer: Arc<Answerer>,
    pub document: DocumentInfo,
}

impl std::fmt::Debug for ReadySession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReadySession")
            .field("index", &self.index)
            .field("retriever", &self.retriever)
            .field("document", &self.document)
            .finish()
    }
}

/// Guarded session slot; `None` is EMPTY
#[derive(Default)]
pub struct SessionState {
    slot: RwLock<Option<ReadySession>>,
}

impl SessionState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace whatever is loaded with `ready` (EMPTY or READY → READY)
    pub async fn install(&self, ready: ReadySession) {
        let filename = ready.document.filename.clone();
        let mut slot = self.slot.write().await;
        let replaced = slot.replace(ready);
        drop(slot);

        match replaced {
            Some(old) => info!(
                "Replaced document '{}' with '{}'",
                old.document.filename, filename
            ),
            None => info!("Session ready with document '{}'", filename),
        }
    }

    /// Drop the current document, if any (any state → EMPTY)
    pub async fn reset(&self) {
        let previous = self.slot.write().await.take();
        if let Some(previous) = previous {
            info!("Session reset, discarded '{}'", previous.document.filename);
        } else {
            debug!("Session reset while already empty");
        }
    }

    /// Clone the current session, or `NotReady` if EMPTY
    pub async fn snapshot(&self) -> Result<ReadySession, RagError> {
        self.slot.read().await.clone().ok_or(RagError::NotReady)
    }

    pub async fn is_ready(&self) -> bool {
        self.slot.read().await.is_some()
    }

    pub async fn current_document(&self) -> Option<DocumentInfo> {
        self.slot
            .read()
            .await
            .as_ref()
            .map(|ready| ready.document.clone())
    }

    /// Answer `question` against the current document
    ///
    /// Fails with `NotReady` before any document is loaded, then with
    /// `Validation` for a blank question. Neither failure changes the state.
    pub async fn ask(&self, question: &str) -> Result<(AnswerResult, DocumentInfo), RagError> {
        let ready = self.snapshot().await?;

        if question.trim().is_empty() {
            return Err(RagError::Validation("Question cannot be empty".to_string()));
        }

        info!(
            "Processing question: {}",
            question.chars().take(100).collect::<String>()
        );

        let retrieved = ready.retriever.query(&ready.index, question).await?;
        let result = ready.answerer.answer(question, retrieved).await?;

        Ok((result, ready.document))
    }
}
