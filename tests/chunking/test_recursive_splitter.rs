// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
// Recursive splitter behaviour on document-sized inputs

use fabstir_pdf_qa::chunking::{RecursiveTextSplitter, DEFAULT_CHUNK_OVERLAP, DEFAULT_CHUNK_SIZE};
use fabstir_pdf_qa::pdf::PageText;

fn sample_document() -> String {
    let paragraph = "Retrieval augmented generation combines a search step with a \
                     language model. The search step narrows the document down to \
                     a handful of relevant passages.";
    (0..12)
        .map(|i| format!("Section {}. {}", i, paragraph))
        .collect::<Vec<_>>()
        .join("\n\n")
}

#[test]
fn test_defaults_match_upload_pipeline() {
    let splitter = RecursiveTextSplitter::default();
    assert_eq!(splitter.chunk_size(), DEFAULT_CHUNK_SIZE);
    assert_eq!(splitter.overlap(), DEFAULT_CHUNK_OVERLAP);
    assert_eq!(DEFAULT_CHUNK_SIZE, 500);
    assert_eq!(DEFAULT_CHUNK_OVERLAP, 50);
}

#[test]
fn test_chunking_is_deterministic() {
    let splitter = RecursiveTextSplitter::default();
    let text = sample_document();

    let first = splitter.split(&text);
    let second = splitter.split(&text);
    assert_eq!(first, second);
}

#[test]
fn test_every_chunk_within_size_bound() {
    let splitter = RecursiveTextSplitter::new(120, 20).unwrap();
    let chunks = splitter.split(&sample_document());

    assert!(chunks.len() > 1);
    for chunk in &chunks {
        assert!(
            chunk.char_len() <= 120,
            "chunk {} has {} chars",
            chunk.id,
            chunk.char_len()
        );
        assert!(!chunk.content.trim().is_empty());
    }
}

#[test]
fn test_chunk_ids_are_sequential() {
    let chunks = RecursiveTextSplitter::new(100, 10)
        .unwrap()
        .split(&sample_document());

    for (expected, chunk) in chunks.iter().enumerate() {
        assert_eq!(chunk.id, expected);
    }
}

#[test]
fn test_600_char_text_gives_two_overlapping_chunks() {
    let text = "Alpha Beta ".repeat(55);
    let text = text.trim_end();
    let chunks = RecursiveTextSplitter::default().split(text);

    assert_eq!(chunks.len(), 2);
    assert!(chunks[0].char_len() <= 500);
    assert!(chunks[1].char_len() <= 500);

    // The tail of the first chunk opens the second one
    let first = &chunks[0].content;
    let second = &chunks[1].content;
    let shared = (1..=DEFAULT_CHUNK_OVERLAP)
        .rev()
        .find(|&n| n <= second.len() && first.ends_with(&second[..n]))
        .unwrap_or(0);
    assert!(shared >= 40, "only {} overlapping chars", shared);
    assert!(shared <= DEFAULT_CHUNK_OVERLAP);
}

#[test]
fn test_split_pages_keeps_page_numbers_and_global_ids() {
    let pages = vec![
        PageText {
            page: 0,
            text: "Page one talks about Alpha.".to_string(),
        },
        PageText {
            page: 1,
            text: String::new(),
        },
        PageText {
            page: 2,
            text: "Page three talks about Gamma.".to_string(),
        },
    ];

    let chunks = RecursiveTextSplitter::default().split_pages(&pages);

    assert_eq!(chunks.len(), 2);
    assert_eq!((chunks[0].id, chunks[0].page), (0, 0));
    assert_eq!((chunks[1].id, chunks[1].page), (1, 2));
    assert_eq!(chunks[1].content, "Page three talks about Gamma.");
}

#[test]
fn test_chunks_never_span_pages() {
    let pages = vec![
        PageText {
            page: 0,
            text: "short first page".to_string(),
        },
        PageText {
            page: 1,
            text: "short second page".to_string(),
        },
    ];

    let chunks = RecursiveTextSplitter::default().split_pages(&pages);
    assert_eq!(chunks.len(), 2);
    assert!(!chunks[0].content.contains("second"));
}

#[test]
fn test_long_word_falls_back_to_characters() {
    let word = "x".repeat(25);
    let chunks = RecursiveTextSplitter::new(10, 2).unwrap().split(&word);

    assert!(chunks.len() >= 3);
    for chunk in &chunks {
        assert!(chunk.char_len() <= 10);
    }
}

#[test]
fn test_custom_separators() {
    let splitter =
        RecursiveTextSplitter::with_separators(12, 0, vec![";".to_string(), "".to_string()])
            .unwrap();
    let chunks = splitter.split_text("one;two;three;four");

    assert!(chunks.iter().all(|c| c.chars().count() <= 12));
    assert_eq!(chunks.concat().replace(';', ""), "onetwothreefour");
}
