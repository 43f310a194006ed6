//! Embedding provider traits

use async_trait::async_trait;

/// Trait for embedding providers
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Get embedding dimensions
    fn dimensions(&self) -> usize;

    /// Compute embeddings for a batch of texts.
    ///
    /// Returns one unit-normalized vector per input, in input order. An
    /// empty input yields an empty output rather than an error.
    async fn embed_many(&self, texts: &[&str]) -> anyhow::Result<Vec<Vec<f32>>>;

    /// Compute the embedding of a single text
    async fn embed_one(&self, text: &str) -> anyhow::Result<Vec<f32>> {
        let mut vectors = self.embed_many(&[text]).await?;
        vectors
            .pop()
            .ok_or_else(|| anyhow::anyhow!("embedding provider returned no vector"))
    }
}
