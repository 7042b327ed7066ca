// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use axum::{
    async_trait,
    extract::{rejection::FormRejection, FromRequest, Request},
    http::header::CONTENT_TYPE,
    Form,
};
use axum_extra::extract::Multipart;
use serde::{Deserialize, Serialize};

use crate::api::ApiError;
use crate::rag::{AnswerResult, DocumentInfo, RetrievedChunk};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadResponse {
    pub message: String,
    pub document_info: DocumentInfo,
}

/// A retrieved chunk as shown to clients
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceInfo {
    /// 1-based retrieval rank
    pub chunk_id: usize,
    /// 0-based page number
    pub page: usize,
    pub content_preview: String,
}

impl From<&RetrievedChunk> for SourceInfo {
    fn from(retrieved: &RetrievedChunk) -> Self {
        Self {
            chunk_id: retrieved.rank,
            page: retrieved.chunk.page,
            content_preview: retrieved.preview(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AskResponse {
    pub question: String,
    pub answer: String,
    pub document_info: DocumentInfo,
    pub sources: Vec<SourceInfo>,
    pub num_sources: usize,
}

impl AskResponse {
    pub fn new(result: AnswerResult, document_info: DocumentInfo) -> Self {
        let sources: Vec<SourceInfo> = result.sources.iter().map(SourceInfo::from).collect();
        Self {
            question: result.question,
            answer: result.answer,
            document_info,
            num_sources: sources.len(),
            sources,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub embeddings_loaded: bool,
    pub document_processed: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusResponse {
    pub system_ready: bool,
    pub embeddings_loaded: bool,
    pub current_document: Option<DocumentInfo>,
    pub groq_api_configured: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResetResponse {
    pub message: String,
}

/// Form body of `POST /ask/`
#[derive(Debug, Clone, Deserialize)]
pub struct AskForm {
    pub question: String,
}

/// Accepts the question as `application/x-www-form-urlencoded` or
/// `multipart/form-data`, like an HTML form post
#[async_trait]
impl<S> FromRequest<S> for AskForm
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let is_multipart = req
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(|value| value.starts_with("multipart/form-data"))
            .unwrap_or(false);

        if !is_multipart {
            let Form(form) = Form::<AskForm>::from_request(req, state)
                .await
                .map_err(|rejection| match rejection {
                    FormRejection::FailedToDeserializeForm(_)
                    | FormRejection::FailedToDeserializeFormBody(_) => missing_field("question"),
                    other => ApiError::InvalidRequest(other.body_text()),
                })?;
            return Ok(form);
        }

        let mut multipart = Multipart::from_request(req, state)
            .await
            .map_err(|e| ApiError::InvalidRequest(e.to_string()))?;

        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|e| ApiError::InvalidRequest(e.to_string()))?
        {
            if field.name() == Some("question") {
                let question = field
                    .text()
                    .await
                    .map_err(|e| ApiError::InvalidRequest(e.to_string()))?;
                return Ok(AskForm { question });
            }
        }

        Err(missing_field("question"))
    }
}

pub fn missing_field(name: &str) -> ApiError {
    ApiError::InvalidRequest(format!("Missing form field '{}'", name))
}
