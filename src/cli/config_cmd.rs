//! Config command - manage casevec configuration

use clap::{Args, Subcommand};

use crate::config::Config;

#[derive(Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommands,
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Show current configuration
    Show,

    /// Initialize config file with defaults
    Init {
        /// Overwrite existing config
        #[arg(short, long)]
        force: bool,
    },

    /// Show config file path
    Path,
}

pub async fn run(args: ConfigArgs) -> anyhow::Result<()> {
    match args.command {
        ConfigCommands::Show => {
            let config = Config::load();
            let path = Config::config_path();

            if path.exists() {
                println!("Config file: {}", path.display());
            } else {
                println!("Config file: {} (not found, using defaults)", path.display());
            }
            println!();
            println!("[embedding]");
            println!("provider = \"{}\"", config.embedding.provider);
            println!("model = \"{}\"", config.embedding.model);
            if let Some(host) = &config.embedding.host {
                println!("host = \"{}\"", host);
            }
            if let Some(base_url) = &config.embedding.base_url {
                println!("base_url = \"{}\"", base_url);
            }
            if config.embedding.api_key.is_some() {
                println!("api_key = \"***\"");
            }
            println!("dimensions = {}", config.embedding.dimensions);
            println!();
            println!("[storage]");
            println!("data_dir = \"{}\"", config.storage.data_dir.display());
        }

        ConfigCommands::Init { force } => {
            let path = Config::config_path();

            if path.exists() && !force {
                anyhow::bail!(
                    "Config file already exists at {}. Use --force to overwrite.",
                    path.display()
                );
            }

            if force && path.exists() {
                std::fs::remove_file(&path)?;
            }

            Config::create_example_if_missing()?;
            println!("Created config file at {}", path.display());
            println!();
            println!("Edit the file to customize your default embedding provider and model.");
            println!();
            println!("Common configurations:");
            println!();
            println!("  # Ollama (local, recommended)");
            println!("  provider = \"ollama\"");
            println!("  model = \"all-minilm\"  # 384 dims, same family as the extraction pipeline");
            println!();
            println!("  # OpenAI");
            println!("  provider = \"openai\"");
            println!("  model = \"text-embedding-3-small\"");
            println!("  # api_key = \"sk-...\"  # or set OPENAI_API_KEY env var");
            println!();
            println!("  # Offline / air-gapped");
            println!("  provider = \"hashed\"");
            println!("  dimensions = 384");
        }

        ConfigCommands::Path => {
            println!("{}", Config::config_path().display());
        }
    }

    Ok(())
}
