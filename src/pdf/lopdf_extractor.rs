// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use lopdf::Document;
use std::path::Path;
use tracing::{debug, warn};

use super::{ExtractError, ExtractedDocument, PageText, TextExtractor};

/// Pure Rust PDF text extractor backed by `lopdf`
///
/// Produces one [`PageText`] per page, in page order. Pages whose text
/// cannot be decoded are kept with empty text so page numbering stays stable.
#[derive(Debug, Default, Clone, Copy)]
pub struct LopdfExtractor;

impl LopdfExtractor {
    pub fn new() -> Self {
        Self
    }
}

impl TextExtractor for LopdfExtractor {
    fn extract(&self, path: &Path) -> Result<ExtractedDocument, ExtractError> {
        let document = Document::load(path).map_err(|e| ExtractError::Parse(e.to_string()))?;

        if document.is_encrypted() {
            return Err(ExtractError::Parse(
                "encrypted PDFs are not supported".to_string(),
            ));
        }

        let page_numbers: Vec<u32> = document.get_pages().keys().copied().collect();
        if page_numbers.is_empty() {
            return Err(ExtractError::Empty);
        }

        let pages = page_numbers
            .iter()
            .enumerate()
            .map(|(index, number)| {
                let text = match document.extract_text(&[*number]) {
                    Ok(text) => text,
                    Err(e) => {
                        warn!("Could not extract text from page {}: {}", number, e);
                        String::new()
                    }
                };
                PageText { page: index, text }
            })
            .collect::<Vec<_>>();

        debug!(
            "Extracted {} pages from {}",
            pages.len(),
            path.display()
        );

        Ok(ExtractedDocument::new(pages))
    }

    fn name(&self) -> &'static str {
        "lopdf"
    }
}
