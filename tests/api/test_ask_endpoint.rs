// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
// POST /ask/

use crate::support::{
    app_state, ask_multipart_request, ask_request, body_json, upload_request, FixedExtractor,
    StubLanguageModel, StubReply,
};
use axum::{
    body::Body,
    http::{Request, StatusCode},
};
use fabstir_pdf_qa::api::{create_app, AppState};
use std::sync::Arc;
use tower::ServiceExt; // for `oneshot`

const DOCUMENT: &str = "Alpha is the first letter of the Greek alphabet.";

async fn uploaded_state(llm: Arc<StubLanguageModel>) -> AppState {
    let state = app_state(Arc::new(FixedExtractor::new(&[DOCUMENT])), llm);
    let response = create_app(state.clone())
        .oneshot(upload_request("file", "greek.pdf", b"%PDF-1.5"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    state
}

#[tokio::test]
async fn test_ask_before_upload_is_400() {
    let llm = Arc::new(StubLanguageModel::answering("unused"));
    let state = app_state(Arc::new(FixedExtractor::new(&[DOCUMENT])), llm.clone());

    let response = create_app(state.clone())
        .oneshot(ask_request("What is Alpha?"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    assert_eq!(
        json["detail"],
        "No PDF document has been uploaded and processed. Please upload a PDF first."
    );
    assert_eq!(json["error_type"], "not_ready");
    assert!(llm.prompts().is_empty());
    assert!(!state.session.is_ready().await);
}

#[tokio::test]
async fn test_blank_question_is_400() {
    let llm = Arc::new(StubLanguageModel::answering("unused"));
    let state = uploaded_state(llm.clone()).await;

    let response = create_app(state)
        .oneshot(ask_request("   "))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    assert_eq!(json["detail"], "Question cannot be empty");
    assert!(llm.prompts().is_empty());
}

#[tokio::test]
async fn test_missing_question_field_is_400() {
    let state = uploaded_state(Arc::new(StubLanguageModel::answering("unused"))).await;

    let request = Request::builder()
        .method("POST")
        .uri("/ask/")
        .header("content-type", "application/x-www-form-urlencoded")
        .body(Body::from("query=What+is+Alpha"))
        .unwrap();
    let response = create_app(state).oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    assert_eq!(json["detail"], "Missing form field 'question'");
}

#[tokio::test]
async fn test_wrong_content_type_reports_rejection() {
    let llm = Arc::new(StubLanguageModel::answering("unused"));
    let state = uploaded_state(llm.clone()).await;

    let request = Request::builder()
        .method("POST")
        .uri("/ask/")
        .header("content-type", "application/json")
        .body(Body::from(r#"{"question":"What is Alpha?"}"#))
        .unwrap();
    let response = create_app(state).oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    assert_eq!(json["error_type"], "invalid_request");
    let detail = json["detail"].as_str().unwrap();
    assert!(!detail.contains("Missing form field"));
    assert!(detail.contains("Content-Type"));
    assert!(llm.prompts().is_empty());
}

#[tokio::test]
async fn test_answer_response_shape() {
    let llm = Arc::new(StubLanguageModel::answering("Alpha is a Greek letter."));
    let state = uploaded_state(llm.clone()).await;

    let response = create_app(state)
        .oneshot(ask_request("What is Alpha?"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["question"], "What is Alpha?");
    assert_eq!(json["answer"], "Alpha is a Greek letter.");
    assert_eq!(json["document_info"]["filename"], "greek.pdf");
    assert_eq!(json["num_sources"], 1);
    assert_eq!(json["sources"][0]["chunk_id"], 1);
    assert_eq!(json["sources"][0]["page"], 0);
    assert_eq!(json["sources"][0]["content_preview"], DOCUMENT);

    let prompt = llm.last_prompt().unwrap();
    assert!(prompt.contains(DOCUMENT));
    assert!(prompt.contains("Question: What is Alpha?"));
}

#[tokio::test]
async fn test_multipart_question_accepted() {
    let state = uploaded_state(Arc::new(StubLanguageModel::answering("yes"))).await;

    let response = create_app(state)
        .oneshot(ask_multipart_request("Is Alpha a letter?"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["question"], "Is Alpha a letter?");
    assert_eq!(json["answer"], "yes");
}

#[tokio::test]
async fn test_llm_error_is_500() {
    let llm = Arc::new(StubLanguageModel::with_reply(StubReply::ApiError(503)));
    let state = uploaded_state(llm).await;

    let response = create_app(state.clone())
        .oneshot(ask_request("What is Alpha?"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let json = body_json(response).await;
    assert_eq!(json["error_type"], "llm_invocation_error");
    assert!(json["detail"]
        .as_str()
        .unwrap()
        .starts_with("Error processing question:"));
    assert!(state.session.is_ready().await);
}

#[tokio::test]
async fn test_llm_timeout_is_504() {
    let llm = Arc::new(StubLanguageModel::with_reply(StubReply::Timeout(60)));
    let state = uploaded_state(llm).await;

    let response = create_app(state)
        .oneshot(ask_request("What is Alpha?"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::GATEWAY_TIMEOUT);
    let json = body_json(response).await;
    assert_eq!(json["error_type"], "llm_timeout");
}
