//! Text-to-vector providers.

use anyhow::{Context, Result};
use async_trait::async_trait;
use fastembed::{EmbeddingModel, InitOptions, TextEmbedding};
use tokio::sync::RwLock;
use tracing::{info, warn};

/// Maps text to fixed-dimension vectors. Deterministic for a given model:
/// the same text always produces the same vector.
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Output dimension, fixed at model load.
    fn dimension(&self) -> usize;

    /// Embeds a batch of texts, one vector per input, in input order.
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;
}

/// fastembed-backed provider (ONNX MiniLM family).
pub struct FastembedProvider {
    model: RwLock<TextEmbedding>,
    dimension: usize,
}

impl FastembedProvider {
    /// Loads the model named in configuration. Fails loudly on a missing or
    /// unreachable model: embeddings are load-bearing for every other memory
    /// operation, so there is no degraded mode.
    pub fn new(model_name: &str) -> Result<Self> {
        let model_kind = resolve_model(model_name);
        info!("Loading embedding model: {:?}", model_kind);
        let mut model = TextEmbedding::try_new(InitOptions::new(model_kind))
            .context("failed to initialize embedding model")?;

        // Probe once; the dimension is fixed for the store's lifetime.
        let probe = model
            .embed(vec!["dimension probe"], None)
            .context("probing embedding dimension")?;
        let dimension = probe
            .first()
            .map(|v| v.len())
            .context("embedding model returned no vector")?;
        info!("Embedding dimension: {}", dimension);

        Ok(Self {
            model: RwLock::new(model),
            dimension,
        })
    }
}

/// Explicit model-name resolution with a defined default. Unknown names warn
/// and fall back rather than failing the whole subsystem.
fn resolve_model(name: &str) -> EmbeddingModel {
    match name
        .to_ascii_lowercase()
        .trim_start_matches("sentence-transformers/")
    {
        "all-minilm-l6-v2" => EmbeddingModel::AllMiniLML6V2,
        "paraphrase-multilingual-minilm-l12-v2" => EmbeddingModel::ParaphraseMLMiniLML12V2,
        other => {
            warn!(
                "Unknown embedding model {:?}, falling back to all-MiniLM-L6-v2",
                other
            );
            EmbeddingModel::AllMiniLML6V2
        }
    }
}

#[async_trait]
impl Embedder for FastembedProvider {
    fn dimension(&self) -> usize {
        self.dimension
    }

    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let mut model = self.model.write().await;
        model
            .embed(texts.to_vec(), None)
            .context("embedding batch failed")
    }
}
