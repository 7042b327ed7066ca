// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! PDF text extraction
//!
//! Extraction is a capability behind the [`TextExtractor`] trait so the
//! upload pipeline can be exercised with in-memory stand-ins. The production
//! implementation is [`LopdfExtractor`].

mod lopdf_extractor;

pub use lopdf_extractor::LopdfExtractor;

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

/// Text of a single page
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PageText {
    /// Page number (0-based)
    pub page: usize,
    /// Extracted text (may be empty for scanned pages)
    pub text: String,
}

/// Result of extracting a whole PDF
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtractedDocument {
    pub pages: Vec<PageText>,
}

impl ExtractedDocument {
    pub fn new(pages: Vec<PageText>) -> Self {
        Self { pages }
    }

    pub fn num_pages(&self) -> usize {
        self.pages.len()
    }

    /// True if at least one page has non-whitespace text
    pub fn has_text(&self) -> bool {
        self.pages.iter().any(|p| !p.text.trim().is_empty())
    }

    pub fn total_characters(&self) -> usize {
        self.pages.iter().map(|p| p.text.chars().count()).sum()
    }
}

/// Errors raised while reading a PDF
#[derive(Error, Debug)]
pub enum ExtractError {
    /// File is not a readable PDF
    #[error("Failed to parse PDF: {0}")]
    Parse(String),

    /// PDF has no pages
    #[error("No content found in the PDF file")]
    Empty,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Extracts per-page text from a PDF file on disk
pub trait TextExtractor: Send + Sync {
    fn extract(&self, path: &Path) -> Result<ExtractedDocument, ExtractError>;

    /// Name of the extraction backend, for logging
    fn name(&self) -> &'static str;
}
