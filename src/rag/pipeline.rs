// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Upload pipeline: PDF bytes → ready-to-query session
//!
//! Runs entirely outside the session lock. The caller installs the returned
//! [`ReadySession`] only when every step succeeded, so a failed upload leaves
//! the previous state untouched.

use std::io::Write;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::chunking::RecursiveTextSplitter;
use crate::embeddings::Embedder;
use crate::llm::{CompletionOptions, LanguageModel, LlmError};
use crate::pdf::{ExtractError, ExtractedDocument, TextExtractor};
use crate::rag::{
    Answerer, DocumentIndex, DocumentInfo, RagError, ReadySession, Retriever,
    DEFAULT_EMBEDDING_BATCH_SIZE,
};

/// Turns an uploaded PDF into a [`ReadySession`]
pub struct DocumentProcessor {
    extractor: Arc<dyn TextExtractor>,
    embedder: Option<Arc<dyn Embedder>>,
    llm: Option<Arc<dyn LanguageModel>>,
    splitter: RecursiveTextSplitter,
    retriever: Retriever,
    batch_size: usize,
    options: CompletionOptions,
}

impl DocumentProcessor {
    /// Processor with default chunking, retrieval and generation settings
    /// and no embedder or language model yet
    pub fn new(extractor: Arc<dyn TextExtractor>) -> Self {
        Self {
            extractor,
            embedder: None,
            llm: None,
            splitter: RecursiveTextSplitter::default(),
            retriever: Retriever::default(),
            batch_size: DEFAULT_EMBEDDING_BATCH_SIZE,
            options: CompletionOptions::default(),
        }
    }

    pub fn with_embedder(mut self, embedder: Option<Arc<dyn Embedder>>) -> Self {
        self.embedder = embedder;
        self
    }

    pub fn with_llm(mut self, llm: Option<Arc<dyn LanguageModel>>) -> Self {
        self.llm = llm;
        self
    }

    pub fn with_splitter(mut self, splitter: RecursiveTextSplitter) -> Self {
        self.splitter = splitter;
        self
    }

    pub fn with_retriever(mut self, retriever: Retriever) -> Self {
        self.retriever = retriever;
        self
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }

    pub fn with_options(mut self, options: CompletionOptions) -> Self {
        self.options = options;
        self
    }

    pub fn embeddings_loaded(&self) -> bool {
        self.embedder.is_some()
    }

    pub fn llm_configured(&self) -> bool {
        self.llm.is_some()
    }

    /// Validate, extract, chunk and index an uploaded PDF
    ///
    /// # Arguments
    /// * `filename` - Client-supplied name; must end in `.pdf` (any case)
    /// * `bytes` - Raw file contents
    ///
    /// # Returns
    /// * `Ok(ReadySession)` ready to be installed
    /// * `Err(RagError::Validation)` for a non-PDF filename
    /// * `Err(RagError::Configuration)` if the embedder or LLM is unavailable
    /// * `Err(RagError::Extraction)` if the PDF is unreadable or has no text
    /// * `Err(RagError::IndexBuild)` if embedding fails
    pub async fn process(&self, filename: &str, bytes: Vec<u8>) -> Result<ReadySession, RagError> {
        if !filename.to_lowercase().ends_with(".pdf") {
            return Err(RagError::Validation(
                "Only PDF files are allowed".to_string(),
            ));
        }

        let embedder = self.embedder.clone().ok_or_else(|| {
            RagError::Configuration(
                "Embeddings model not loaded. Please restart the server.".to_string(),
            )
        })?;

        let llm = self
            .llm
            .clone()
            .ok_or_else(|| RagError::from(LlmError::MissingApiKey))?;

        info!("Processing PDF: {} (size: {} bytes)", filename, bytes.len());

        let document = self.extract(bytes).await?;
        if !document.has_text() {
            warn!("'{}' has {} pages but no text", filename, document.num_pages());
            return Err(ExtractError::Empty.into());
        }
        info!(
            "Extracted {} pages ({} characters) with {}",
            document.num_pages(),
            document.total_characters(),
            self.extractor.name()
        );

        let chunks = self.splitter.split_pages(&document.pages);
        if chunks.is_empty() {
            return Err(ExtractError::Empty.into());
        }
        info!("Document split into {} chunks", chunks.len());

        let document_info = DocumentInfo {
            filename: filename.to_string(),
            num_pages: document.num_pages(),
            num_chunks: chunks.len(),
            total_characters: chunks.iter().map(|c| c.char_len()).sum(),
        };

        let index = DocumentIndex::build(chunks, embedder, self.batch_size).await?;

        info!("PDF processed successfully: {:?}", document_info);

        Ok(ReadySession {
            index: Arc::new(index),
            retriever: self.retriever,
            answerer: Arc::new(Answerer::new(llm, self.options.clone())),
            document: document_info,
        })
    }

    /// Spool `bytes` to a temp file and run the extractor on it
    ///
    /// The temp file is removed when the blocking task returns, on success
    /// and failure alike.
    async fn extract(&self, bytes: Vec<u8>) -> Result<ExtractedDocument, RagError> {
        let extractor = Arc::clone(&self.extractor);

        let document = tokio::task::spawn_blocking(move || -> Result<ExtractedDocument, ExtractError> {
            let mut file = tempfile::Builder::new().suffix(".pdf").tempfile()?;
            file.write_all(&bytes)?;
            file.flush()?;
            debug!(
                "Extracting {} with {}",
                file.path().display(),
                extractor.name()
            );
            extractor.extract(file.path())
        })
        .await
        .map_err(|e| RagError::Extraction(format!("extraction task failed: {}", e)))??;

        Ok(document)
    }
}
