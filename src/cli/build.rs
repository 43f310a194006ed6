//! Build command - rebuild the index from extraction records

use std::path::PathBuf;

use clap::Args;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::info;

use crate::config::Config;
use crate::embedding::{Embedder, EmbeddingService};
use crate::index::IndexStore;

use super::{EmbeddingArgs, StorageArgs};

#[derive(Args)]
pub struct BuildArgs {
    /// Corpus directory of extraction records
    /// (default: <data-dir>/output/ai_extractions)
    #[arg(long)]
    pub corpus: Option<PathBuf>,

    #[command(flatten)]
    pub storage: StorageArgs,

    #[command(flatten)]
    pub embedding: EmbeddingArgs,
}

pub async fn run(args: BuildArgs, _verbose: bool) -> anyhow::Result<()> {
    let config = Config::load();
    let storage = args.storage.resolve(&config);
    let corpus_dir = args.corpus.unwrap_or_else(|| storage.corpus_dir());

    let (model, mode) = args.embedding.resolve(&config)?;
    let embeddings = EmbeddingService::new(model, mode);
    let provider = embeddings.provider().await?;

    info!(
        "Building index from {:?} with model {}",
        corpus_dir,
        provider.model_name()
    );

    let progress = ProgressBar::new_spinner();
    progress.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {msg}")
            .unwrap(),
    );
    progress.set_message("Indexing extraction records...");

    let store = IndexStore::new(&storage.index_dir());
    let count = store.build(&corpus_dir, provider.as_ref()).await?;

    progress.finish_with_message(format!("Indexed {count} documents"));

    println!("Index built at {:?}", storage.index_dir());
    println!("  Documents: {count}");
    println!("  Dimensions: {}", provider.dimensions());

    Ok(())
}
