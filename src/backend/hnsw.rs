//! HNSW backend using usearch crate

use std::path::Path;

use tracing::info;
use usearch::{Index, IndexOptions, MetricKind, ScalarKind};

use super::traits::VectorSearcher;

// Graph parameters used for both build and load; usearch requires the
// options to match the ones the file was saved with.
const CONNECTIVITY: usize = 32;
const EXPANSION: usize = 64;

fn index_options(dimensions: usize) -> IndexOptions {
    IndexOptions {
        dimensions,
        metric: MetricKind::IP, // Inner product on normalized vectors = cosine
        quantization: ScalarKind::F32,
        connectivity: CONNECTIVITY,
        expansion_add: EXPANSION,
        expansion_search: EXPANSION,
        multi: false,
    }
}

/// HNSW searcher using usearch
pub struct HnswSearcher {
    index: Index,
}

impl HnswSearcher {
    /// Load an HNSW index from disk
    pub fn load(index_file: &Path, dimensions: usize) -> anyhow::Result<Self> {
        info!("Loading vector index from {:?}", index_file);

        if !index_file.exists() {
            anyhow::bail!("Index file not found: {:?}", index_file);
        }

        let index = Index::new(&index_options(dimensions))?;
        index.load(index_file.to_string_lossy().as_ref())?;

        info!("Loaded vector index with {} vectors", index.size());

        Ok(Self { index })
    }
}

impl VectorSearcher for HnswSearcher {
    fn search(&self, query: &[f32], top_k: usize) -> anyhow::Result<(Vec<u64>, Vec<f32>)> {
        if self.index.size() == 0 {
            return Ok((Vec::new(), Vec::new()));
        }

        let results = self.index.search(query, top_k)?;

        Ok((results.keys.to_vec(), results.distances.to_vec()))
    }

    fn len(&self) -> usize {
        self.index.size()
    }
}

/// Build an HNSW index and save it to `index_file`.
///
/// The file is written to a temporary sibling first and renamed into place,
/// so a reader never observes a partially written index. Vectors are keyed
/// by their position in `embeddings`; an empty slice produces a valid empty
/// index file.
pub fn build_index(
    embeddings: &[Vec<f32>],
    index_file: &Path,
    dimensions: usize,
) -> anyhow::Result<()> {
    info!(
        "Building vector index: {} vectors, {} dims",
        embeddings.len(),
        dimensions
    );

    let index = Index::new(&index_options(dimensions))?;
    index.reserve(embeddings.len())?;

    for (i, embedding) in embeddings.iter().enumerate() {
        index.add(i as u64, embedding)?;
    }

    let tmp_file = index_file.with_extension("index.tmp");
    index.save(tmp_file.to_string_lossy().as_ref())?;
    std::fs::rename(&tmp_file, index_file)?;

    info!("Vector index saved to {:?}", index_file);

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit(v: Vec<f32>) -> Vec<f32> {
        let norm = v.iter().map(|x| x * x).sum::<f32>().sqrt();
        v.into_iter().map(|x| x / norm).collect()
    }

    #[test]
    fn test_build_and_search_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let index_file = dir.path().join("extractions.index");

        let embeddings = vec![
            unit(vec![1.0, 0.0, 0.0, 0.0]),
            unit(vec![0.0, 1.0, 0.0, 0.0]),
            unit(vec![1.0, 1.0, 0.0, 0.0]),
        ];

        build_index(&embeddings, &index_file, 4).unwrap();
        let searcher = HnswSearcher::load(&index_file, 4).unwrap();
        assert_eq!(searcher.len(), 3);

        let (keys, distances) = searcher.search(&embeddings[0], 2).unwrap();
        assert_eq!(keys.len(), 2);
        assert_eq!(keys[0], 0);
        // IP distance of a vector with itself is ~0
        assert!(distances[0].abs() < 1e-4);
    }

    #[test]
    fn test_empty_index_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let index_file = dir.path().join("extractions.index");

        build_index(&[], &index_file, 4).unwrap();
        assert!(index_file.exists());

        let searcher = HnswSearcher::load(&index_file, 4).unwrap();
        assert!(searcher.is_empty());

        let (keys, distances) = searcher.search(&unit(vec![1.0, 0.0, 0.0, 0.0]), 5).unwrap();
        assert!(keys.is_empty());
        assert!(distances.is_empty());
    }

    #[test]
    fn test_top_k_larger_than_index() {
        let dir = tempfile::tempdir().unwrap();
        let index_file = dir.path().join("extractions.index");

        let embeddings = vec![unit(vec![1.0, 0.0]), unit(vec![0.0, 1.0])];
        build_index(&embeddings, &index_file, 2).unwrap();

        let searcher = HnswSearcher::load(&index_file, 2).unwrap();
        let (keys, _) = searcher.search(&embeddings[0], 10).unwrap();
        assert_eq!(keys.len(), 2);
    }

    #[test]
    fn test_load_missing_file_fails() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope.index");
        assert!(HnswSearcher::load(&missing, 4).is_err());
    }
}
