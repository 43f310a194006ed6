//! CLI module - command definitions and handlers

mod build;
mod config_cmd;
mod search;
mod status;
mod update;

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

pub use build::BuildArgs;
pub use config_cmd::ConfigArgs;
pub use search::SearchArgs;
pub use status::StatusArgs;
pub use update::UpdateArgs;

use crate::config::Config;
use crate::embedding::EmbeddingMode;

/// casevec - semantic search over case extraction records
#[derive(Parser)]
#[command(name = "casevec")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Rebuild the search index from extraction records
    Build(BuildArgs),

    /// Re-index after a single extraction record changed
    Update(UpdateArgs),

    /// Search indexed extraction records
    Search(SearchArgs),

    /// Show index artifacts and document count
    Status(StatusArgs),

    /// Manage configuration
    Config(ConfigArgs),
}

impl Cli {
    pub async fn run(self) -> anyhow::Result<()> {
        match self.command {
            Commands::Build(args) => build::run(args, self.verbose).await,
            Commands::Update(args) => update::run(args, self.verbose).await,
            Commands::Search(args) => search::run(args, self.verbose).await,
            Commands::Status(args) => status::run(args).await,
            Commands::Config(args) => config_cmd::run(args).await,
        }
    }
}

/// Embedding flags shared by the commands that need a provider
#[derive(Args)]
pub struct EmbeddingArgs {
    /// Embedding provider: ollama, openai, hashed (local with the local-embeddings feature)
    #[arg(long)]
    pub embedding_provider: Option<String>,

    /// Embedding model name
    #[arg(long)]
    pub embedding_model: Option<String>,

    /// Ollama host for embeddings
    #[arg(long, env = "OLLAMA_HOST")]
    pub embedding_host: Option<String>,

    /// OpenAI API base URL
    #[arg(long, env = "OPENAI_BASE_URL")]
    pub embedding_api_base: Option<String>,

    /// API key for embedding service (OpenAI)
    #[arg(long, env = "OPENAI_API_KEY")]
    pub embedding_api_key: Option<String>,

    /// Vector dimensions for the hashed provider
    #[arg(long)]
    pub embedding_dimensions: Option<usize>,

    /// Local model path (for local embedding mode)
    #[cfg(feature = "local-embeddings")]
    #[arg(long)]
    pub embedding_model_path: Option<String>,
}

impl EmbeddingArgs {
    /// Resolve model name and mode: CLI flags win over config file values
    pub fn resolve(&self, config: &Config) -> anyhow::Result<(String, EmbeddingMode)> {
        let provider = self
            .embedding_provider
            .clone()
            .unwrap_or_else(|| config.embedding.provider.clone());
        let model = self
            .embedding_model
            .clone()
            .unwrap_or_else(|| config.embedding.model.clone());

        let mode = match provider.as_str() {
            "ollama" => EmbeddingMode::Ollama {
                host: self
                    .embedding_host
                    .clone()
                    .or_else(|| config.embedding.host.clone()),
            },
            "openai" => EmbeddingMode::OpenAI {
                api_key: self
                    .embedding_api_key
                    .clone()
                    .or_else(|| config.embedding.api_key.clone()),
                base_url: self
                    .embedding_api_base
                    .clone()
                    .or_else(|| config.embedding.base_url.clone()),
            },
            "hashed" => EmbeddingMode::Hashed {
                dimensions: self
                    .embedding_dimensions
                    .unwrap_or(config.embedding.dimensions),
            },
            #[cfg(feature = "local-embeddings")]
            "local" => EmbeddingMode::Local {
                model_path: self.embedding_model_path.clone(),
            },
            _ => anyhow::bail!("Unknown embedding provider: {provider}"),
        };

        Ok((model, mode))
    }
}

/// Storage flags shared by all index-touching commands
#[derive(Args)]
pub struct StorageArgs {
    /// Data directory holding the corpus and index artifacts
    #[arg(long, env = "CASEVEC_DATA_DIR")]
    pub data_dir: Option<PathBuf>,
}

impl StorageArgs {
    /// Apply the CLI override onto the configured storage layout
    pub fn resolve(&self, config: &Config) -> crate::config::StorageConfig {
        match &self.data_dir {
            Some(dir) => crate::config::StorageConfig {
                data_dir: dir.clone(),
            },
            None => config.storage.clone(),
        }
    }
}
