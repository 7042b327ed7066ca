// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
// POST /upload_pdf/

use crate::support::{
    app_state, body_json, get_request, pdf_bytes, upload_request, FixedExtractor,
    StubLanguageModel,
};
use axum::http::StatusCode;
use fabstir_pdf_qa::api::{create_app, AppState};
use fabstir_pdf_qa::pdf::LopdfExtractor;
use fabstir_pdf_qa::rag::DocumentProcessor;
use std::sync::Arc;
use tower::ServiceExt; // for `oneshot`

fn state_with_pages(pages: &[&str]) -> AppState {
    app_state(
        Arc::new(FixedExtractor::new(pages)),
        Arc::new(StubLanguageModel::answering("answer")),
    )
}

#[tokio::test]
async fn test_upload_returns_document_info() {
    let state = state_with_pages(&["First page text.", "Second page text."]);
    let app = create_app(state.clone());

    let response = app
        .oneshot(upload_request("file", "report.pdf", b"%PDF-1.5"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(
        json["message"],
        "PDF 'report.pdf' uploaded and processed successfully"
    );
    assert_eq!(json["document_info"]["filename"], "report.pdf");
    assert_eq!(json["document_info"]["num_pages"], 2);
    assert_eq!(json["document_info"]["num_chunks"], 2);
    assert_eq!(json["document_info"]["total_characters"], 16 + 17);
    assert!(state.session.is_ready().await);
}

#[tokio::test]
async fn test_non_pdf_rejected_with_400() {
    let state = state_with_pages(&["text"]);
    let app = create_app(state.clone());

    let response = app
        .oneshot(upload_request("file", "notes.txt", b"plain text"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    assert_eq!(json["detail"], "Only PDF files are allowed");
    assert_eq!(json["error_type"], "validation_error");
    assert!(!state.session.is_ready().await);
}

#[tokio::test]
async fn test_missing_embedder_returns_500() {
    let processor = DocumentProcessor::new(Arc::new(FixedExtractor::new(&["text"])))
        .with_llm(Some(Arc::new(StubLanguageModel::answering("answer"))));
    let app = create_app(AppState::new(processor));

    let response = app
        .oneshot(upload_request("file", "doc.pdf", b"%PDF-1.5"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let json = body_json(response).await;
    assert_eq!(
        json["detail"],
        "Embeddings model not loaded. Please restart the server."
    );
    assert_eq!(json["error_type"], "configuration_error");
}

#[tokio::test]
async fn test_missing_api_key_returns_500() {
    let processor = DocumentProcessor::new(Arc::new(FixedExtractor::new(&["text"])))
        .with_embedder(Some(Arc::new(
            fabstir_pdf_qa::embeddings::HashEmbedder::default(),
        )));
    let app = create_app(AppState::new(processor));

    let response = app
        .oneshot(upload_request("file", "doc.pdf", b"%PDF-1.5"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let json = body_json(response).await;
    assert_eq!(json["detail"], "GROQ_API_KEY environment variable not set");
}

#[tokio::test]
async fn test_missing_file_field_is_400() {
    let app = create_app(state_with_pages(&["text"]));

    let response = app
        .oneshot(upload_request("document", "doc.pdf", b"%PDF-1.5"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    assert_eq!(json["detail"], "Missing form field 'file'");
}

#[tokio::test]
async fn test_failed_upload_keeps_previous_document() {
    let state = app_state(
        Arc::new(LopdfExtractor::new()),
        Arc::new(StubLanguageModel::answering("answer")),
    );

    let response = create_app(state.clone())
        .oneshot(upload_request(
            "file",
            "good.pdf",
            &pdf_bytes(&["A page with real text."]),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    // Blank pages: extraction succeeds but there is nothing to index
    let response = create_app(state.clone())
        .oneshot(upload_request("file", "scan.pdf", &pdf_bytes(&["", ""])))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    assert_eq!(json["detail"], "No content found in the PDF file");
    assert_eq!(json["error_type"], "extraction_error");

    let response = create_app(state)
        .oneshot(get_request("/status/"))
        .await
        .unwrap();
    let json = body_json(response).await;
    assert_eq!(json["system_ready"], true);
    assert_eq!(json["current_document"]["filename"], "good.pdf");
}

#[tokio::test]
async fn test_upload_over_body_limit_rejected() {
    let state = state_with_pages(&["text"]).with_max_upload_bytes(1024);
    let app = create_app(state.clone());

    let response = app
        .oneshot(upload_request("file", "big.pdf", &vec![b'x'; 4096]))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
    let json = body_json(response).await;
    assert_eq!(json["error_type"], "payload_too_large");
    assert!(!state.session.is_ready().await);
}

#[tokio::test]
async fn test_upload_past_router_limit_is_413() {
    // Far beyond the limit plus multipart slack, so the body limit trips mid-stream
    let state = state_with_pages(&["text"]).with_max_upload_bytes(1024);
    let app = create_app(state.clone());

    let response = app
        .oneshot(upload_request("file", "huge.pdf", &vec![b'x'; 200 * 1024]))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
    let json = body_json(response).await;
    assert_eq!(json["error_type"], "payload_too_large");
    assert_eq!(json["detail"], "File exceeds the upload limit of 1024 bytes");
    assert!(!state.session.is_ready().await);
}
