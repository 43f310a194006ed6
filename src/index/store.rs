//! Index store - owns the on-disk vector index and metadata registry

use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};

use thiserror::Error;
use tracing::info;

use crate::backend::{self, HnswSearcher, VectorSearcher};
use crate::corpus;
use crate::embedding::Embedder;

use super::registry::MetadataRegistry;

/// File name of the vector index inside the index directory
pub const INDEX_FILE: &str = "extractions.index";

/// File name of the metadata registry inside the index directory
pub const REGISTRY_FILE: &str = "meta.json";

/// Search or load was attempted before any index was built
#[derive(Debug, Error)]
#[error("index not built; run `casevec build` first")]
pub struct NotBuilt;

/// A loaded index/registry pair
pub struct LoadedIndex {
    pub searcher: Box<dyn VectorSearcher>,
    pub registry: MetadataRegistry,
}

impl std::fmt::Debug for LoadedIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoadedIndex")
            .field("registry", &self.registry)
            .finish_non_exhaustive()
    }
}

/// Owner of the on-disk artifacts and the process-wide loaded-pair cache.
///
/// `build` is the only writer; it replaces both files and clears the cache,
/// so a later `load` in the same process always observes the new index.
pub struct IndexStore {
    index_file: PathBuf,
    registry_file: PathBuf,
    cache: RwLock<Option<Arc<LoadedIndex>>>,
}

impl IndexStore {
    pub fn new(index_dir: &Path) -> Self {
        Self {
            index_file: index_dir.join(INDEX_FILE),
            registry_file: index_dir.join(REGISTRY_FILE),
            cache: RwLock::new(None),
        }
    }

    pub fn index_file(&self) -> &Path {
        &self.index_file
    }

    pub fn registry_file(&self) -> &Path {
        &self.registry_file
    }

    /// Whether a built index is present: both artifacts must exist.
    ///
    /// A zero-document build still writes both files, so a built-but-empty
    /// index reports true here.
    pub fn exists(&self) -> bool {
        self.index_file.exists() && self.registry_file.exists()
    }

    /// Rebuild the index from the extraction records in `corpus_dir`.
    ///
    /// Scans the corpus, embeds all eligible texts in one batched call, and
    /// replaces both artifacts. Returns the number of documents indexed;
    /// zero eligible documents still produce a valid (empty) artifact pair.
    pub async fn build(
        &self,
        corpus_dir: &Path,
        embedder: &dyn Embedder,
    ) -> anyhow::Result<usize> {
        let docs = corpus::scan_corpus(corpus_dir)?;
        info!("Indexing {} eligible documents from {:?}", docs.len(), corpus_dir);

        let count = docs.len();
        let texts: Vec<&str> = docs.iter().map(|d| d.text.as_str()).collect();
        let embeddings = embedder.embed_many(&texts).await?;

        if let Some(parent) = self.index_file.parent() {
            std::fs::create_dir_all(parent)?;
        }

        backend::build_index(&embeddings, &self.index_file, embedder.dimensions())?;

        let registry =
            MetadataRegistry::new(docs.into_iter().map(|d| d.entry).collect());
        registry.save(&self.registry_file)?;

        self.invalidate();

        Ok(count)
    }

    /// Index a single extraction record by id.
    ///
    /// Verifies the record file exists, then falls through to a full
    /// rebuild. Reserved as the entry point for a future incremental upsert.
    pub async fn update_one(
        &self,
        corpus_dir: &Path,
        extraction_id: &str,
        embedder: &dyn Embedder,
    ) -> anyhow::Result<usize> {
        let record_path = corpus_dir.join(format!("{extraction_id}.json"));
        if !record_path.exists() {
            anyhow::bail!("extraction record not found: {extraction_id}");
        }

        self.build(corpus_dir, embedder).await
    }

    /// Load the index/registry pair, from cache when possible.
    ///
    /// Fails with [`NotBuilt`] when either artifact is missing, and with a
    /// generic error when the pair is present but out of sync.
    pub fn load(&self, dimensions: usize) -> anyhow::Result<Arc<LoadedIndex>> {
        {
            let cache = self.cache.read().unwrap_or_else(|e| e.into_inner());
            if let Some(loaded) = cache.as_ref() {
                return Ok(loaded.clone());
            }
        }

        if !self.exists() {
            return Err(NotBuilt.into());
        }

        let searcher = HnswSearcher::load(&self.index_file, dimensions)?;
        let registry = MetadataRegistry::load(&self.registry_file)?;

        if searcher.len() != registry.len() {
            anyhow::bail!(
                "index and metadata registry are out of sync ({} vectors, {} entries); rebuild the index",
                searcher.len(),
                registry.len()
            );
        }

        let loaded = Arc::new(LoadedIndex {
            searcher: Box::new(searcher),
            registry,
        });

        let mut cache = self.cache.write().unwrap_or_else(|e| e.into_inner());
        *cache = Some(loaded.clone());

        Ok(loaded)
    }

    fn invalidate(&self) {
        let mut cache = self.cache.write().unwrap_or_else(|e| e.into_inner());
        *cache = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embedding::{EmbeddingMode, EmbeddingService};

    async fn hashed_embedder() -> Arc<crate::embedding::EmbeddingProvider> {
        EmbeddingService::new(
            "hashed".to_string(),
            EmbeddingMode::Hashed { dimensions: 64 },
        )
        .provider()
        .await
        .unwrap()
    }

    fn write_record(dir: &Path, id: &str, text: &str) {
        let record = serde_json::json!({
            "id": id,
            "caseId": format!("case-{id}"),
            "sourceFile": format!("{id}.png"),
            "extractedText": text,
        });
        std::fs::write(dir.join(format!("{id}.json")), record.to_string()).unwrap();
    }

    #[tokio::test]
    async fn test_build_counts_and_exists() {
        let corpus = tempfile::tempdir().unwrap();
        let index_dir = tempfile::tempdir().unwrap();
        write_record(corpus.path(), "a", "Complainant: John Doe, incident 2025-12-01");
        write_record(corpus.path(), "b", "Unrelated text about weather");

        let store = IndexStore::new(index_dir.path());
        assert!(!store.exists());

        let embedder = hashed_embedder().await;
        let count = store.build(corpus.path(), embedder.as_ref()).await.unwrap();
        assert_eq!(count, 2);
        assert!(store.exists());
    }

    #[tokio::test]
    async fn test_vector_count_always_matches_registry() {
        let corpus = tempfile::tempdir().unwrap();
        let index_dir = tempfile::tempdir().unwrap();
        for i in 0..5 {
            write_record(corpus.path(), &format!("doc{i}"), &format!("case text number {i}"));
        }
        // One ineligible record must not leave a hole in either artifact
        std::fs::write(corpus.path().join("blank.json"), r#"{"id": "x", "extractedText": " "}"#)
            .unwrap();

        let store = IndexStore::new(index_dir.path());
        let embedder = hashed_embedder().await;
        let count = store.build(corpus.path(), embedder.as_ref()).await.unwrap();
        assert_eq!(count, 5);

        let loaded = store.load(embedder.dimensions()).unwrap();
        assert_eq!(loaded.searcher.len(), loaded.registry.len());
        assert_eq!(loaded.registry.len(), 5);
    }

    #[tokio::test]
    async fn test_empty_corpus_builds_valid_empty_pair() {
        let corpus = tempfile::tempdir().unwrap();
        let index_dir = tempfile::tempdir().unwrap();

        let store = IndexStore::new(index_dir.path());
        let embedder = hashed_embedder().await;
        let count = store.build(corpus.path(), embedder.as_ref()).await.unwrap();
        assert_eq!(count, 0);

        // Both files are written even with zero documents
        assert!(store.exists());
        let loaded = store.load(embedder.dimensions()).unwrap();
        assert!(loaded.searcher.is_empty());
        assert!(loaded.registry.is_empty());
    }

    #[tokio::test]
    async fn test_rebuild_replaces_stale_index() {
        let corpus = tempfile::tempdir().unwrap();
        let index_dir = tempfile::tempdir().unwrap();
        write_record(corpus.path(), "a", "first version of the corpus");

        let store = IndexStore::new(index_dir.path());
        let embedder = hashed_embedder().await;
        store.build(corpus.path(), embedder.as_ref()).await.unwrap();

        // Empty the corpus and rebuild: artifacts shrink to the empty pair
        std::fs::remove_file(corpus.path().join("a.json")).unwrap();
        let count = store.build(corpus.path(), embedder.as_ref()).await.unwrap();
        assert_eq!(count, 0);
        assert!(store.exists());
        assert!(store.load(embedder.dimensions()).unwrap().registry.is_empty());
    }

    #[tokio::test]
    async fn test_load_without_build_is_not_built() {
        let index_dir = tempfile::tempdir().unwrap();
        let store = IndexStore::new(index_dir.path());

        let err = store.load(64).unwrap_err();
        assert!(err.downcast_ref::<NotBuilt>().is_some());
    }

    #[tokio::test]
    async fn test_half_missing_pair_is_not_built() {
        let corpus = tempfile::tempdir().unwrap();
        let index_dir = tempfile::tempdir().unwrap();
        write_record(corpus.path(), "a", "some text");

        let store = IndexStore::new(index_dir.path());
        let embedder = hashed_embedder().await;
        store.build(corpus.path(), embedder.as_ref()).await.unwrap();

        // Remove one of the two artifacts; a fresh store must refuse to load
        std::fs::remove_file(store.registry_file()).unwrap();
        let fresh = IndexStore::new(index_dir.path());
        assert!(!fresh.exists());
        let err = fresh.load(embedder.dimensions()).unwrap_err();
        assert!(err.downcast_ref::<NotBuilt>().is_some());
    }

    #[tokio::test]
    async fn test_build_invalidates_cache() {
        let corpus = tempfile::tempdir().unwrap();
        let index_dir = tempfile::tempdir().unwrap();
        write_record(corpus.path(), "a", "original document");

        let store = IndexStore::new(index_dir.path());
        let embedder = hashed_embedder().await;
        store.build(corpus.path(), embedder.as_ref()).await.unwrap();
        let first = store.load(embedder.dimensions()).unwrap();
        assert_eq!(first.registry.len(), 1);

        write_record(corpus.path(), "b", "second document");
        store.build(corpus.path(), embedder.as_ref()).await.unwrap();

        // Same store handle observes the new index without restarting
        let second = store.load(embedder.dimensions()).unwrap();
        assert_eq!(second.registry.len(), 2);
    }

    #[tokio::test]
    async fn test_desynced_pair_fails_to_load() {
        let corpus = tempfile::tempdir().unwrap();
        let index_dir = tempfile::tempdir().unwrap();
        write_record(corpus.path(), "a", "first");
        write_record(corpus.path(), "b", "second");

        let store = IndexStore::new(index_dir.path());
        let embedder = hashed_embedder().await;
        store.build(corpus.path(), embedder.as_ref()).await.unwrap();

        // Overwrite the registry with fewer entries than vectors
        MetadataRegistry::default().save(store.registry_file()).unwrap();

        let fresh = IndexStore::new(index_dir.path());
        let err = fresh.load(embedder.dimensions()).unwrap_err();
        assert!(err.to_string().contains("out of sync"));
    }

    #[tokio::test]
    async fn test_update_one_requires_record() {
        let corpus = tempfile::tempdir().unwrap();
        let index_dir = tempfile::tempdir().unwrap();
        write_record(corpus.path(), "a", "present record");

        let store = IndexStore::new(index_dir.path());
        let embedder = hashed_embedder().await;

        let err = store
            .update_one(corpus.path(), "missing", embedder.as_ref())
            .await
            .unwrap_err();
        assert!(err.to_string().contains("not found"));

        // A present record triggers the full rebuild
        let count = store
            .update_one(corpus.path(), "a", embedder.as_ref())
            .await
            .unwrap();
        assert_eq!(count, 1);
        assert!(store.exists());
    }
}
