//! FastEmbed-based local embedding generator.
//!
//! Implements the `Embedder` trait from `kindred-core` using fastembed's
//! BGESmallENV15 model (384 dimensions) with ONNX runtime inference.
//! Inference is synchronous, so calls run on the blocking thread pool.

use std::sync::{Arc, Mutex};

use fastembed::{EmbeddingModel, InitOptions, TextEmbedding};

use kindred_core::memory::embedder::Embedder;
use kindred_types::error::RepositoryError;

use super::schema::EMBEDDING_DIMENSION;

/// Model name reported by this embedder.
const MODEL_NAME: &str = "bge-small-en-v1.5";

/// Local embedder backed by fastembed's BGESmallENV15 model.
///
/// The ONNX session is initialized once (downloading model weights on first
/// use) and shared behind a mutex; `embed` hops onto the blocking pool so the
/// async runtime is never stalled by inference.
pub struct FastEmbedder {
    model: Arc<Mutex<TextEmbedding>>,
}

impl FastEmbedder {
    /// Initialize the embedding model.
    ///
    /// Downloads the model weights on first use; subsequent runs load them
    /// from the local cache.
    pub fn new() -> Result<Self, RepositoryError> {
        let model = TextEmbedding::try_new(
            InitOptions::new(EmbeddingModel::BGESmallENV15).with_show_download_progress(false),
        )
        .map_err(|e| RepositoryError::Query(format!("Failed to initialize embedder: {e}")))?;

        Ok(Self {
            model: Arc::new(Mutex::new(model)),
        })
    }
}

impl Embedder for FastEmbedder {
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, RepositoryError> {
        let texts = texts.to_vec();
        let model = Arc::clone(&self.model);

        tokio::task::spawn_blocking(move || {
            let mut guard = model
                .lock()
                .map_err(|_| RepositoryError::Query("embedder mutex poisoned".to_string()))?;
            guard
                .embed(texts, None)
                .map_err(|e| RepositoryError::Query(format!("Embedding failed: {e}")))
        })
        .await
        .map_err(|e| RepositoryError::Query(format!("Embedding task panicked: {e}")))?
    }

    fn model_name(&self) -> &str {
        MODEL_NAME
    }

    fn dimension(&self) -> usize {
        EMBEDDING_DIMENSION as usize
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Downloads model weights (~30 MB); run with `cargo test -- --ignored`.
    #[tokio::test]
    #[ignore]
    async fn test_embed_produces_fixed_dimension_vectors() {
        let embedder = FastEmbedder::new().unwrap();
        assert_eq!(embedder.dimension(), 384);
        assert_eq!(embedder.model_name(), "bge-small-en-v1.5");

        let texts = vec![
            "Hello, how are you?".to_string(),
            "I adopted a cat named Miso".to_string(),
        ];
        let vectors = embedder.embed(&texts).await.unwrap();

        assert_eq!(vectors.len(), 2);
        for v in &vectors {
            assert_eq!(v.len(), 384);
        }
        // Distinct texts produce distinct vectors.
        assert_ne!(vectors[0], vectors[1]);
    }
}
