// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
// Upload → ask → reset through the HTTP router

use crate::support::{
    alpha_beta_page, app_state, ask_request, body_json, pdf_bytes, upload_request,
    FixedExtractor, StubLanguageModel,
};
use axum::http::StatusCode;
use fabstir_pdf_qa::api::create_app;
use fabstir_pdf_qa::pdf::LopdfExtractor;
use std::sync::Arc;
use tower::ServiceExt; // for `oneshot`

#[tokio::test]
async fn test_two_page_document_question_answering() {
    let page = alpha_beta_page();
    let llm = Arc::new(StubLanguageModel::answering(
        "Alpha is a word that appears throughout the document.",
    ));
    let state = app_state(Arc::new(FixedExtractor::new(&[&page, &page])), llm.clone());

    let response = create_app(state.clone())
        .oneshot(upload_request("file", "alpha.pdf", b"%PDF-1.5"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["document_info"]["num_pages"], 2);
    assert_eq!(json["document_info"]["num_chunks"], 2);
    assert_eq!(
        json["document_info"]["total_characters"],
        2 * page.chars().count()
    );

    let response = create_app(state)
        .oneshot(ask_request("What is Alpha?"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;

    assert!(!json["answer"].as_str().unwrap().is_empty());
    assert_eq!(json["num_sources"], 2);
    let sources = json["sources"].as_array().unwrap();
    assert_eq!(sources.len(), 2);
    for (i, source) in sources.iter().enumerate() {
        assert_eq!(source["chunk_id"], i + 1);
        let preview = source["content_preview"].as_str().unwrap();
        assert!(preview.chars().count() <= 203);
        assert!(preview.ends_with("..."));
    }
    assert_eq!(llm.prompts().len(), 1);
}

#[tokio::test]
async fn test_real_pdf_upload_and_ask() {
    let page = alpha_beta_page();
    let state = app_state(
        Arc::new(LopdfExtractor::new()),
        Arc::new(StubLanguageModel::answering("Alpha and Beta alternate.")),
    );

    let response = create_app(state.clone())
        .oneshot(upload_request("file", "alpha.pdf", &pdf_bytes(&[&page, &page])))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["document_info"]["num_pages"], 2);
    assert_eq!(json["document_info"]["num_chunks"], 2);

    let response = create_app(state)
        .oneshot(ask_request("What is Alpha?"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["num_sources"], 2);
    let pages: Vec<u64> = json["sources"]
        .as_array()
        .unwrap()
        .iter()
        .map(|s| s["page"].as_u64().unwrap())
        .collect();
    let mut sorted = pages.clone();
    sorted.sort_unstable();
    assert_eq!(sorted, vec![0, 1]);
}

#[tokio::test]
async fn test_second_upload_replaces_first() {
    let llm = Arc::new(StubLanguageModel::answering("answer"));
    let first = app_state(
        Arc::new(FixedExtractor::new(&["Alpha lives only in the first file."])),
        llm.clone(),
    );
    // Same session, different document content on the second upload
    let second = fabstir_pdf_qa::api::AppState {
        processor: Arc::new(crate::support::processor(
            Arc::new(FixedExtractor::new(&["Gamma lives only in the second file."])),
            llm.clone(),
        )),
        ..first.clone()
    };

    let response = create_app(first.clone())
        .oneshot(upload_request("file", "first.pdf", b"%PDF-1.5"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = create_app(second.clone())
        .oneshot(upload_request("file", "second.pdf", b"%PDF-1.5"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = create_app(first)
        .oneshot(ask_request("Where does Alpha live?"))
        .await
        .unwrap();
    let json = body_json(response).await;

    assert_eq!(json["document_info"]["filename"], "second.pdf");
    for source in json["sources"].as_array().unwrap() {
        assert!(!source["content_preview"]
            .as_str()
            .unwrap()
            .contains("first file"));
    }
    assert!(!llm.last_prompt().unwrap().contains("first file"));
}
