//! Embedding module - compute embeddings from text

mod hashed;
mod ollama;
mod openai;
mod traits;

#[cfg(feature = "local-embeddings")]
mod candle;

pub use traits::Embedder;

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::OnceCell;
use tracing::info;

/// Embedding mode configuration
#[derive(Debug, Clone)]
pub enum EmbeddingMode {
    Ollama {
        host: Option<String>,
    },
    OpenAI {
        api_key: Option<String>,
        base_url: Option<String>,
    },
    /// Deterministic feature hashing - offline, for tests and air-gapped runs
    Hashed {
        dimensions: usize,
    },
    #[cfg(feature = "local-embeddings")]
    Local {
        model_path: Option<String>,
    },
}

/// Unified embedding provider
///
/// Whatever the backing provider returns, vectors leave this type
/// unit-normalized, so inner-product search over them is cosine similarity.
pub struct EmbeddingProvider {
    model_name: String,
    dimensions: usize,
    inner: EmbeddingProviderInner,
}

enum EmbeddingProviderInner {
    Ollama(ollama::OllamaEmbedding),
    OpenAI(openai::OpenAIEmbedding),
    Hashed(hashed::HashedEmbedding),
    #[cfg(feature = "local-embeddings")]
    Local(candle::CandleEmbedding),
}

impl EmbeddingProvider {
    /// Create a new embedding provider
    pub async fn new(model_name: String, mode: EmbeddingMode) -> anyhow::Result<Self> {
        let (inner, dimensions) = match mode {
            EmbeddingMode::Ollama { host } => {
                let provider = ollama::OllamaEmbedding::new(model_name.clone(), host)?;
                let dims = provider.dimensions();
                (EmbeddingProviderInner::Ollama(provider), dims)
            }
            EmbeddingMode::OpenAI { api_key, base_url } => {
                let provider = openai::OpenAIEmbedding::new_with_detection(
                    model_name.clone(),
                    api_key,
                    base_url,
                )
                .await?;
                let dims = provider.dimensions();
                (EmbeddingProviderInner::OpenAI(provider), dims)
            }
            EmbeddingMode::Hashed { dimensions } => {
                let provider = hashed::HashedEmbedding::new(dimensions)?;
                let dims = provider.dimensions();
                (EmbeddingProviderInner::Hashed(provider), dims)
            }
            #[cfg(feature = "local-embeddings")]
            EmbeddingMode::Local { model_path } => {
                let provider = candle::CandleEmbedding::new(model_name.clone(), model_path)?;
                let dims = provider.dimensions();
                (EmbeddingProviderInner::Local(provider), dims)
            }
        };

        info!(
            "Initialized embedding provider: {} ({} dims)",
            model_name, dimensions
        );

        Ok(Self {
            model_name,
            dimensions,
            inner,
        })
    }

    /// Get model name
    pub fn model_name(&self) -> &str {
        &self.model_name
    }
}

#[async_trait]
impl Embedder for EmbeddingProvider {
    fn dimensions(&self) -> usize {
        self.dimensions
    }

    async fn embed_many(&self, texts: &[&str]) -> anyhow::Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let mut vectors = match &self.inner {
            EmbeddingProviderInner::Ollama(p) => p.embed(texts).await?,
            EmbeddingProviderInner::OpenAI(p) => p.embed(texts).await?,
            EmbeddingProviderInner::Hashed(p) => p.embed(texts),
            #[cfg(feature = "local-embeddings")]
            EmbeddingProviderInner::Local(p) => p.embed(texts)?,
        };

        if vectors.len() != texts.len() {
            anyhow::bail!(
                "embedding provider returned {} vectors for {} texts",
                vectors.len(),
                texts.len()
            );
        }

        for vector in &mut vectors {
            if vector.len() != self.dimensions {
                anyhow::bail!(
                    "embedding dimension mismatch: expected {}, got {}",
                    self.dimensions,
                    vector.len()
                );
            }
            l2_normalize(vector);
        }

        Ok(vectors)
    }
}

fn l2_normalize(vector: &mut [f32]) {
    let norm = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > 0.0 {
        for x in vector.iter_mut() {
            *x /= norm;
        }
    }
}

/// Process-wide embedding service with a lazy-initialization guard.
///
/// The backing model is constructed at most once per service; concurrent
/// first callers all wait on the same initialization. Holds the provider
/// configuration, not the provider, until first use.
pub struct EmbeddingService {
    model_name: String,
    mode: EmbeddingMode,
    cell: OnceCell<Arc<EmbeddingProvider>>,
}

impl EmbeddingService {
    pub fn new(model_name: String, mode: EmbeddingMode) -> Self {
        Self {
            model_name,
            mode,
            cell: OnceCell::new(),
        }
    }

    /// Get the provider, initializing it on first use
    pub async fn provider(&self) -> anyhow::Result<Arc<EmbeddingProvider>> {
        let provider = self
            .cell
            .get_or_try_init(|| async {
                let provider =
                    EmbeddingProvider::new(self.model_name.clone(), self.mode.clone()).await?;
                Ok::<_, anyhow::Error>(Arc::new(provider))
            })
            .await?;
        Ok(provider.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hashed_service(dims: usize) -> EmbeddingService {
        EmbeddingService::new(
            "hashed".to_string(),
            EmbeddingMode::Hashed { dimensions: dims },
        )
    }

    #[tokio::test]
    async fn test_embed_many_preserves_order_and_length() {
        let provider = hashed_service(64).provider().await.unwrap();
        let vectors = provider
            .embed_many(&["first document", "second document", "third"])
            .await
            .unwrap();
        assert_eq!(vectors.len(), 3);
        for v in &vectors {
            assert_eq!(v.len(), 64);
            let norm: f32 = v.iter().map(|x| x * x).sum::<f32>().sqrt();
            assert!((norm - 1.0).abs() < 1e-5);
        }
        // Same text embeds identically regardless of batch position
        let again = provider.embed_many(&["second document"]).await.unwrap();
        assert_eq!(vectors[1], again[0]);
    }

    #[tokio::test]
    async fn test_embed_many_empty_input() {
        let provider = hashed_service(64).provider().await.unwrap();
        let vectors = provider.embed_many(&[]).await.unwrap();
        assert!(vectors.is_empty());
    }

    #[tokio::test]
    async fn test_embed_one_matches_embed_many() {
        let provider = hashed_service(64).provider().await.unwrap();
        let one = provider.embed_one("case facts").await.unwrap();
        let many = provider.embed_many(&["case facts"]).await.unwrap();
        assert_eq!(one, many[0]);
    }

    #[tokio::test]
    async fn test_service_initializes_once() {
        let service = hashed_service(32);
        let first = service.provider().await.unwrap();
        let second = service.provider().await.unwrap();
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[tokio::test]
    async fn test_service_concurrent_first_use() {
        let service = Arc::new(hashed_service(32));
        let (a, b) = tokio::join!(service.provider(), service.provider());
        assert!(Arc::ptr_eq(&a.unwrap(), &b.unwrap()));
    }
}
