//! casevec - semantic search over legal case extraction records
//!
//! A single-binary CLI for indexing extraction records (the JSON output of
//! an upstream OCR/NER pipeline) into a vector index and querying them by
//! cosine similarity.

mod backend;
mod cli;
mod config;
mod corpus;
mod embedding;
mod index;

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use cli::Cli;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "casevec=info,warn".into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .init();

    // Parse CLI args and run
    let cli = Cli::parse();
    cli.run().await
}
