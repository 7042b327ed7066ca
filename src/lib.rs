// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
pub mod api;
pub mod chunking;
pub mod cli;
pub mod config;
pub mod embeddings;
pub mod llm;
pub mod pdf;
pub mod rag;

pub use api::{create_app, AppState};
pub use config::NodeConfig;
pub use rag::{DocumentProcessor, RagError, SessionState};
