// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use anyhow::{Context, Result};
use clap::Parser;
use fabstir_pdf_qa::{
    api::{start_server, AppState},
    chunking::RecursiveTextSplitter,
    cli::Cli,
    config::{EmbeddingBackend, NodeConfig},
    embeddings::{onnx_model::MINILM_DIMENSION, Embedder, HashEmbedder, OnnxEmbeddingModel},
    llm::{GroqClient, LanguageModel},
    pdf::LopdfExtractor,
    rag::{DocumentProcessor, Retriever},
};
use std::{env, net::SocketAddr, sync::Arc};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();

    // Initialize tracing subscriber for logging
    if env::var("RUST_LOG").is_err() {
        env::set_var("RUST_LOG", "info");
    }
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let mut config = NodeConfig::from_env();
    cli.apply(&mut config);
    config
        .validate()
        .map_err(|e| anyhow::anyhow!("Invalid configuration: {}", e))?;

    info!("Starting PDF question-answering node v{}", env!("CARGO_PKG_VERSION"));

    let embedder = load_embedder(&config).await;

    let llm: Option<Arc<dyn LanguageModel>> = match &config.llm.api_key {
        Some(api_key) => {
            let client = GroqClient::new(
                api_key.clone(),
                config.llm.api_url.clone(),
                config.llm.timeout_secs,
            )
            .context("Failed to create Groq client")?;
            info!("Groq client configured ({})", config.llm.model);
            Some(Arc::new(client))
        }
        None => {
            warn!("GROQ_API_KEY environment variable not set. PDF processing will fail.");
            None
        }
    };

    let splitter = RecursiveTextSplitter::new(config.chunk_size, config.chunk_overlap)
        .context("Invalid chunking configuration")?;

    let processor = DocumentProcessor::new(Arc::new(LopdfExtractor::new()))
        .with_embedder(embedder)
        .with_llm(llm)
        .with_splitter(splitter)
        .with_retriever(Retriever::new(config.retrieval_top_k))
        .with_batch_size(config.embedding.batch_size)
        .with_options(config.completion_options());

    let state = AppState::new(processor).with_max_upload_bytes(config.max_upload_bytes);

    let addr: SocketAddr = format!("{}:{}", config.api_host, config.api_port)
        .parse()
        .context("Invalid API_HOST/API_PORT")?;

    start_server(state, addr).await
}

/// Load the configured embedder; `None` keeps the server up with uploads disabled
async fn load_embedder(config: &NodeConfig) -> Option<Arc<dyn Embedder>> {
    match config.embedding.backend {
        EmbeddingBackend::Hash => match HashEmbedder::new(MINILM_DIMENSION) {
            Ok(embedder) => {
                info!("Using feature-hashing embedder ({}D)", embedder.dimension());
                Some(Arc::new(embedder))
            }
            Err(e) => {
                error!("Failed to create hash embedder: {}", e);
                None
            }
        },
        EmbeddingBackend::Onnx => {
            match OnnxEmbeddingModel::load(
                "all-MiniLM-L6-v2",
                &config.embedding.model_path,
                &config.embedding.tokenizer_path,
                MINILM_DIMENSION,
            )
            .await
            {
                Ok(model) => {
                    info!("Embeddings model loaded successfully");
                    Some(Arc::new(model))
                }
                Err(e) => {
                    error!("Failed to load embeddings model: {:#}", e);
                    warn!("Uploads will fail until the server is restarted with a valid model");
                    None
                }
            }
        }
    }
}
