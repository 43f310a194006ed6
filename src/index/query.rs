//! Query engine - embed free text and join neighbors back to metadata

use serde::Serialize;
use tracing::warn;

use crate::embedding::Embedder;

use super::store::IndexStore;

/// Number of results returned when the caller does not ask for a count
pub const DEFAULT_TOP_K: usize = 5;

/// A search hit joined with its registry entry
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoredResult {
    /// Cosine similarity of the query and the document embedding
    pub score: f32,
    pub id: Option<String>,
    pub case_id: Option<String>,
    pub source_file: Option<String>,
    pub snippet: String,
}

/// Engine for running free-text queries against an [`IndexStore`]
pub struct QueryEngine<'a> {
    store: &'a IndexStore,
    embedder: &'a dyn Embedder,
}

impl<'a> QueryEngine<'a> {
    pub fn new(store: &'a IndexStore, embedder: &'a dyn Embedder) -> Self {
        Self { store, embedder }
    }

    /// Search for the `top_k` documents most similar to `query`.
    ///
    /// Fails with `NotBuilt` when no index has been built;
    /// a built-but-empty index yields an empty result list instead. Results
    /// come back in non-increasing score order, at most `top_k` of them and
    /// never more than the corpus size.
    pub async fn search(&self, query: &str, top_k: usize) -> anyhow::Result<Vec<ScoredResult>> {
        if query.trim().is_empty() {
            anyhow::bail!("search query must not be empty");
        }

        let loaded = self.store.load(self.embedder.dimensions())?;

        let query_embedding = self.embedder.embed_one(query).await?;
        let (positions, distances) = loaded.searcher.search(&query_embedding, top_k)?;

        let mut results = Vec::with_capacity(positions.len());

        for (position, distance) in positions.iter().zip(distances.iter()) {
            // A position outside the registry means the artifact pair is
            // desynced; drop the hit rather than failing the whole query.
            let Some(entry) = loaded.registry.get(*position as usize) else {
                warn!(
                    "Dropping neighbor {} outside registry bounds ({} entries)",
                    position,
                    loaded.registry.len()
                );
                continue;
            };

            // usearch reports inner-product matches as distances (1 - dot);
            // map back to similarity so scores read as cosine.
            results.push(ScoredResult {
                score: 1.0 - *distance,
                id: entry.id.clone(),
                case_id: entry.case_id.clone(),
                source_file: entry.source_file.clone(),
                snippet: entry.snippet.clone(),
            });
        }

        Ok(results)
    }
}
