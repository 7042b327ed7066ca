// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use serde::Serialize;
use std::sync::Arc;
use tracing::{info, warn};

use crate::llm::{CompletionOptions, LanguageModel};
use crate::rag::{RagError, RetrievedChunk};

/// Generated answer with the chunks used as evidence, in rank order
#[derive(Debug, Clone, Serialize)]
pub struct AnswerResult {
    pub question: String,
    pub answer: String,
    pub sources: Vec<RetrievedChunk>,
}

/// Build the "stuff" prompt: every retrieved chunk inlined as context,
/// followed by the question
pub fn build_prompt(question: &str, retrieved: &[RetrievedChunk]) -> String {
    let context = retrieved
        .iter()
        .map(|r| r.chunk.content.as_str())
        .collect::<Vec<_>>()
        .join("\n\n");

    format!(
        "Use the following pieces of context to answer the question at the end. \
         If you don't know the answer, just say that you don't know, \
         don't try to make up an answer.\n\n\
         {context}\n\n\
         Question: {question}\n\
         Helpful Answer:"
    )
}

/// Assembles prompts and calls the language model
///
/// Generation parameters are fixed at construction.
pub struct Answerer {
    llm: Arc<dyn LanguageModel>,
    options: CompletionOptions,
}

impl Answerer {
    pub fn new(llm: Arc<dyn LanguageModel>, options: CompletionOptions) -> Self {
        Self { llm, options }
    }

    /// Answer `question` from `retrieved`; one LLM call, no retries
    pub async fn answer(
        &self,
        question: &str,
        retrieved: Vec<RetrievedChunk>,
    ) -> Result<AnswerResult, RagError> {
        let prompt = build_prompt(question, &retrieved);

        let answer = self
            .llm
            .complete(&prompt, &self.options)
            .await
            .map_err(|e| {
                warn!("{} completion failed: {}", self.llm.name(), e);
                RagError::from(e)
            })?;

        info!(
            "Question answered via {} (sources: {})",
            self.llm.name(),
            retrieved.len()
        );

        Ok(AnswerResult {
            question: question.to_string(),
            answer,
            sources: retrieved,
        })
    }
}
