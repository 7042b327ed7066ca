// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1

//! ONNX Embedding Model Wrapper
//!
//! Runs the all-MiniLM-L6-v2 sentence transformer on ONNX Runtime (CPU).
//!
//! Features:
//! - ONNX model loading from disk, validated with a probe inference
//! - BERT tokenization with truncation to the model's max sequence length
//! - Batched inference with padding
//! - Attention-masked mean pooling over token embeddings
//! - 384-dimensional output vectors

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use ndarray::{Array2, Axis};
use ort::execution_providers::CPUExecutionProvider;
use ort::session::builder::GraphOptimizationLevel;
use ort::session::Session;
use ort::value::Value;
use std::path::Path;
use std::sync::{Arc, Mutex};
use tokenizers::{Encoding, Tokenizer, TruncationParams};
use tracing::info;

use super::Embedder;

/// Output dimension of all-MiniLM-L6-v2
pub const MINILM_DIMENSION: usize = 384;

/// Maximum sequence length of all-MiniLM-L6-v2
pub const MINILM_MAX_LENGTH: usize = 256;

/// ONNX-based embedding model (all-MiniLM-L6-v2)
///
/// # Thread Safety
/// The session sits behind `Arc<Mutex<_>>`; inference runs on the blocking
/// thread pool so it never stalls the async runtime.
#[derive(Clone)]
pub struct OnnxEmbeddingModel {
    session: Arc<Mutex<Session>>,
    tokenizer: Arc<Tokenizer>,
    model_name: String,
    dimension: usize,
}

impl std::fmt::Debug for OnnxEmbeddingModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OnnxEmbeddingModel")
            .field("model_name", &self.model_name)
            .field("dimension", &self.dimension)
            .finish_non_exhaustive()
    }
}

impl OnnxEmbeddingModel {
    /// Loads the model and tokenizer from disk
    ///
    /// # Errors
    /// Returns error if:
    /// - Model or tokenizer file is missing or invalid
    /// - ONNX Runtime initialization fails
    /// - The probe inference does not produce `expected_dimension` outputs
    ///
    /// # Example
    /// ```ignore
    /// let model = OnnxEmbeddingModel::load(
    ///     "all-MiniLM-L6-v2",
    ///     "./models/all-MiniLM-L6-v2-onnx/model.onnx",
    ///     "./models/all-MiniLM-L6-v2-onnx/tokenizer.json",
    ///     384,
    /// ).await?;
    /// ```
    pub async fn load<P: AsRef<Path>>(
        model_name: impl Into<String>,
        model_path: P,
        tokenizer_path: P,
        expected_dimension: usize,
    ) -> Result<Self> {
        let model_name = model_name.into();
        let model_path = model_path.as_ref();
        let tokenizer_path = tokenizer_path.as_ref();

        if !model_path.exists() {
            anyhow::bail!("ONNX model file not found: {}", model_path.display());
        }
        if !tokenizer_path.exists() {
            anyhow::bail!("Tokenizer file not found: {}", tokenizer_path.display());
        }

        info!("Loading embedding model {} on CPU", model_name);

        let session = Session::builder()
            .context("Failed to create session builder")?
            .with_execution_providers([CPUExecutionProvider::default().build()])
            .context("Failed to set CPU execution provider")?
            .with_optimization_level(GraphOptimizationLevel::Level3)
            .context("Failed to set optimization level")?
            .with_intra_threads(4)
            .context("Failed to set intra threads")?
            .commit_from_file(model_path)
            .context(format!(
                "Failed to load ONNX model from {}",
                model_path.display()
            ))?;

        let mut tokenizer = Tokenizer::from_file(tokenizer_path)
            .map_err(|e| anyhow!("Failed to load tokenizer: {}", e))?;
        tokenizer
            .with_truncation(Some(TruncationParams {
                max_length: MINILM_MAX_LENGTH,
                ..Default::default()
            }))
            .map_err(|e| anyhow!("Failed to configure truncation: {}", e))?;

        let model = Self {
            session: Arc::new(Mutex::new(session)),
            tokenizer: Arc::new(tokenizer),
            model_name,
            dimension: expected_dimension,
        };

        let probe = model.embed("validation test").await?;
        if probe.len() != expected_dimension {
            anyhow::bail!(
                "Model outputs {} dimensions (expected {})",
                probe.len(),
                expected_dimension
            );
        }

        info!(
            "Embedding model {} loaded ({} dimensions)",
            model.model_name, model.dimension
        );

        Ok(model)
    }

    fn tokenize(&self, texts: &[String]) -> Result<Vec<Encoding>> {
        self.tokenizer
            .encode_batch(texts.to_vec(), true)
            .map_err(|e| anyhow!("Tokenization failed: {}", e))
    }
}

/// Runs one padded batch through the session and mean-pools each row
fn run_mean_pooled(session: &Mutex<Session>, encodings: &[Encoding]) -> Result<Vec<Vec<f32>>> {
    let batch = encodings.len();
    let max_len = encodings
        .iter()
        .map(|enc| enc.get_ids().len())
        .max()
        .unwrap_or(0);

    let mut input_ids = Vec::with_capacity(batch * max_len);
    let mut attention_mask = Vec::with_capacity(batch * max_len);

    for encoding in encodings {
        let ids = encoding.get_ids();
        let padding = max_len - ids.len();

        input_ids.extend(ids.iter().map(|&id| id as i64));
        input_ids.extend(std::iter::repeat(0i64).take(padding));

        attention_mask.extend(encoding.get_attention_mask().iter().map(|&m| m as i64));
        attention_mask.extend(std::iter::repeat(0i64).take(padding));
    }

    let mask_for_pooling = attention_mask.clone();
    let token_type_ids = vec![0i64; batch * max_len];

    let input_ids_array = Array2::from_shape_vec((batch, max_len), input_ids)
        .context("Failed to create input_ids array")?;
    let attention_mask_array = Array2::from_shape_vec((batch, max_len), attention_mask)
        .context("Failed to create attention_mask array")?;
    let token_type_ids_array = Array2::from_shape_vec((batch, max_len), token_type_ids)
        .context("Failed to create token_type_ids array")?;

    let mut session = session
        .lock()
        .map_err(|_| anyhow!("ONNX session lock poisoned"))?;
    let outputs = session.run(ort::inputs![
        "input_ids" => Value::from_array(input_ids_array)?,
        "attention_mask" => Value::from_array(attention_mask_array)?,
        "token_type_ids" => Value::from_array(token_type_ids_array)?
    ])?;

    // [batch, seq_len, hidden_dim] token embeddings
    let output = outputs[0]
        .try_extract_array::<f32>()
        .context("Failed to extract output tensor")?;

    let mut embeddings = Vec::with_capacity(batch);
    for row in 0..batch {
        let tokens = output.index_axis(Axis(0), row);
        let seq_len = tokens.shape()[0];
        let hidden_dim = tokens.shape()[1];
        let mask = &mask_for_pooling[row * max_len..(row + 1) * max_len];

        let mut pooled = vec![0.0f32; hidden_dim];
        let mut mask_sum = 0.0f32;
        for i in 0..seq_len {
            let weight = mask[i] as f32;
            mask_sum += weight;
            for j in 0..hidden_dim {
                pooled[j] += tokens[[i, j]] * weight;
            }
        }
        for value in &mut pooled {
            *value /= mask_sum.max(1e-9);
        }

        embeddings.push(pooled);
    }

    Ok(embeddings)
}

#[async_trait]
impl Embedder for OnnxEmbeddingModel {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        self.embed_batch(&[text.to_string()])
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| anyhow!("Model returned no embedding"))
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(vec![]);
        }

        let encodings = self.tokenize(texts)?;
        let session = Arc::clone(&self.session);

        let embeddings =
            tokio::task::spawn_blocking(move || run_mean_pooled(&session, &encodings))
                .await
                .context("Embedding task failed")??;

        if let Some((i, bad)) = embeddings
            .iter()
            .enumerate()
            .find(|(_, e)| e.len() != self.dimension)
        {
            anyhow::bail!(
                "Unexpected embedding dimension at index {}: {} (expected {})",
                i,
                bad.len(),
                self.dimension
            );
        }

        Ok(embeddings)
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    fn model_name(&self) -> &str {
        &self.model_name
    }
}
