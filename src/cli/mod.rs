// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use clap::Parser;

use crate::config::{EmbeddingBackend, NodeConfig};

/// Fabstir PDF question-answering node
#[derive(Parser, Debug)]
#[command(name = "fabstir-pdf-qa")]
#[command(version)]
#[command(about = "Upload a PDF and ask questions about it", long_about = None)]
pub struct Cli {
    /// Address to bind the HTTP server to
    #[arg(long, env = "API_HOST")]
    pub host: Option<String>,

    /// Port to bind the HTTP server to
    #[arg(long, short, env = "API_PORT")]
    pub port: Option<u16>,

    /// Embedding backend: "onnx" or "hash"
    #[arg(long, env = "EMBEDDING_BACKEND", value_parser = parse_backend)]
    pub embedding_backend: Option<EmbeddingBackend>,
}

fn parse_backend(value: &str) -> Result<EmbeddingBackend, String> {
    value.parse()
}

impl Cli {
    /// Override environment-derived settings with command-line values
    pub fn apply(&self, config: &mut NodeConfig) {
        if let Some(host) = &self.host {
            config.api_host = host.clone();
        }
        if let Some(port) = self.port {
            config.api_port = port;
        }
        if let Some(backend) = self.embedding_backend {
            config.embedding.backend = backend;
        }
    }
}
