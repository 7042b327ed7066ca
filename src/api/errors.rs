// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{error, warn};

use crate::rag::RagError;

/// JSON error body; `detail` matches FastAPI-style clients
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ErrorResponse {
    pub detail: String,
    pub error_type: String,
}

#[derive(Debug)]
pub enum ApiError {
    /// Malformed request that never reached the pipeline
    InvalidRequest(String),
    /// Uploaded file larger than the configured limit
    PayloadTooLarge { limit: usize },
    /// Failure raised by the document pipeline or session
    Rag(RagError),
}

impl ApiError {
    pub fn to_response(&self) -> ErrorResponse {
        let (error_type, detail) = match self {
            ApiError::InvalidRequest(msg) => ("invalid_request".to_string(), msg.clone()),
            ApiError::PayloadTooLarge { limit } => (
                "payload_too_large".to_string(),
                format!("File exceeds the upload limit of {} bytes", limit),
            ),
            ApiError::Rag(err) => (err.error_code().to_ascii_lowercase(), err.user_message()),
        };

        ErrorResponse { detail, error_type }
    }

    pub fn status_code(&self) -> u16 {
        match self {
            ApiError::InvalidRequest(_) => 400,
            ApiError::PayloadTooLarge { .. } => 413,
            ApiError::Rag(err) => err.status_code(),
        }
    }
}

impl From<RagError> for ApiError {
    fn from(err: RagError) -> Self {
        ApiError::Rag(err)
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::InvalidRequest(msg) => write!(f, "Invalid request: {}", msg),
            ApiError::PayloadTooLarge { limit } => {
                write!(f, "Payload too large: limit is {} bytes", limit)
            }
            ApiError::Rag(err) => write!(f, "{}", err),
        }
    }
}

impl std::error::Error for ApiError {}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status =
            StatusCode::from_u16(self.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        if status.is_server_error() {
            error!("{}", self);
        } else {
            warn!("{}", self);
        }

        (status, Json(self.to_response())).into_response()
    }
}
