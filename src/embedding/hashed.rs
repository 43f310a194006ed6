//! Deterministic feature-hashing embedding provider
//!
//! Maps whitespace tokens into a fixed number of buckets with a seeded
//! hash. No model download, no network - usable offline and in tests.
//! Identical texts always produce identical vectors, so exact-text queries
//! score 1.0, but semantic similarity is limited to token overlap.

use std::hash::Hasher;

use rustc_hash::FxHasher;

/// Feature-hashing embedding provider
pub struct HashedEmbedding {
    dimensions: usize,
}

impl HashedEmbedding {
    pub fn new(dimensions: usize) -> anyhow::Result<Self> {
        if dimensions == 0 {
            anyhow::bail!("hashed embedding dimensions must be non-zero");
        }
        Ok(Self { dimensions })
    }

    /// Get dimensions
    pub fn dimensions(&self) -> usize {
        self.dimensions
    }

    /// Compute embeddings
    pub fn embed(&self, texts: &[&str]) -> Vec<Vec<f32>> {
        texts.iter().map(|t| self.embed_text(t)).collect()
    }

    fn embed_text(&self, text: &str) -> Vec<f32> {
        let mut vector = vec![0f32; self.dimensions];

        for token in text.split_whitespace() {
            let mut hasher = FxHasher::default();
            hasher.write(token.to_lowercase().as_bytes());
            let hash = hasher.finish();

            let bucket = (hash as usize) % self.dimensions;
            // Signed weight keeps buckets from drifting uniformly positive
            let sign = if hash & (1 << 63) == 0 { 1.0 } else { -1.0 };
            vector[bucket] += sign;
        }

        let norm = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            for x in &mut vector {
                *x /= norm;
            }
        }

        vector
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vectors_are_unit_norm() {
        let provider = HashedEmbedding::new(64).unwrap();
        let vectors = provider.embed(&["Complainant: John Doe, incident 2025-12-01"]);
        let norm: f32 = vectors[0].iter().map(|x| x * x).sum::<f32>().sqrt();
        assert!((norm - 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_deterministic() {
        let provider = HashedEmbedding::new(64).unwrap();
        let a = provider.embed(&["some case text"]);
        let b = provider.embed(&["some case text"]);
        assert_eq!(a, b);
    }

    #[test]
    fn test_distinct_texts_differ() {
        let provider = HashedEmbedding::new(64).unwrap();
        let vectors = provider.embed(&["John Doe incident", "weather report"]);
        assert_ne!(vectors[0], vectors[1]);
    }

    #[test]
    fn test_empty_input() {
        let provider = HashedEmbedding::new(64).unwrap();
        assert!(provider.embed(&[]).is_empty());
    }

    #[test]
    fn test_zero_dimensions_rejected() {
        assert!(HashedEmbedding::new(0).is_err());
    }
}
