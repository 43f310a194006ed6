//! Update command - re-index after a single extraction record changed

use std::path::PathBuf;

use clap::Args;
use tracing::info;

use crate::config::Config;
use crate::embedding::EmbeddingService;
use crate::index::IndexStore;

use super::{EmbeddingArgs, StorageArgs};

#[derive(Args)]
pub struct UpdateArgs {
    /// Id of the extraction record to index
    pub extraction_id: String,

    /// Corpus directory of extraction records
    /// (default: <data-dir>/output/ai_extractions)
    #[arg(long)]
    pub corpus: Option<PathBuf>,

    #[command(flatten)]
    pub storage: StorageArgs,

    #[command(flatten)]
    pub embedding: EmbeddingArgs,
}

pub async fn run(args: UpdateArgs, _verbose: bool) -> anyhow::Result<()> {
    let config = Config::load();
    let storage = args.storage.resolve(&config);
    let corpus_dir = args.corpus.unwrap_or_else(|| storage.corpus_dir());

    let (model, mode) = args.embedding.resolve(&config)?;
    let embeddings = EmbeddingService::new(model, mode);
    let provider = embeddings.provider().await?;

    info!("Indexing extraction record '{}'", args.extraction_id);

    let store = IndexStore::new(&storage.index_dir());
    let count = store
        .update_one(&corpus_dir, &args.extraction_id, provider.as_ref())
        .await?;

    println!(
        "Re-indexed {count} documents (including extraction '{}')",
        args.extraction_id
    );

    Ok(())
}
