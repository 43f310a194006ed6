//! Vector search backend trait

/// Trait for searching a built vector index
pub trait VectorSearcher: Send + Sync {
    /// Search for the nearest neighbors of `query` by inner product.
    ///
    /// Returns (positions, distances), where positions are integer offsets
    /// into the original insertion order and distances are as reported by
    /// the backend (smaller is closer). At most `top_k` results, fewer when
    /// the index holds fewer vectors.
    fn search(&self, query: &[f32], top_k: usize) -> anyhow::Result<(Vec<u64>, Vec<f32>)>;

    /// Number of vectors in the index
    fn len(&self) -> usize;

    /// Check if the index is empty
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
