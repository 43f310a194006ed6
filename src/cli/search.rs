//! Search command - query the extraction index

use clap::Args;
use tracing::info;

use crate::config::Config;
use crate::embedding::EmbeddingService;
use crate::index::{IndexStore, QueryEngine, DEFAULT_TOP_K};

use super::{EmbeddingArgs, StorageArgs};

#[derive(Args)]
pub struct SearchArgs {
    /// Search query
    pub query: String,

    /// Number of results to return
    #[arg(long, default_value_t = DEFAULT_TOP_K)]
    pub top_k: usize,

    /// Output format (text, json)
    #[arg(long, default_value = "text", value_parser = ["text", "json"])]
    pub format: String,

    #[command(flatten)]
    pub storage: StorageArgs,

    #[command(flatten)]
    pub embedding: EmbeddingArgs,
}

pub async fn run(args: SearchArgs, _verbose: bool) -> anyhow::Result<()> {
    let config = Config::load();
    let storage = args.storage.resolve(&config);

    let (model, mode) = args.embedding.resolve(&config)?;
    let embeddings = EmbeddingService::new(model, mode);
    let provider = embeddings.provider().await?;

    info!("Searching for '{}' (top {})", args.query, args.top_k);

    let store = IndexStore::new(&storage.index_dir());
    let engine = QueryEngine::new(&store, provider.as_ref());

    let results = engine.search(&args.query, args.top_k).await?;

    if args.format == "json" {
        println!("{}", serde_json::to_string_pretty(&results)?);
    } else {
        println!("\nSearch results for '{}' (top {}):\n", args.query, results.len());

        for (i, result) in results.iter().enumerate() {
            println!("{}. Score: {:.4}", i + 1, result.score);

            if let Some(id) = &result.id {
                println!("   Extraction: {id}");
            }
            if let Some(case_id) = &result.case_id {
                println!("   Case: {case_id}");
            }
            if let Some(source_file) = &result.source_file {
                println!("   Source: {source_file}");
            }

            println!("   {}", result.snippet.replace('\n', " "));
            println!();
        }
    }

    Ok(())
}
