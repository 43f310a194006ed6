//! Configuration file support for casevec
//!
//! Config file location: ~/.config/casevec/config.toml
//!
//! Example config:
//! ```toml
//! [embedding]
//! provider = "ollama"  # ollama, openai, hashed (local with the local-embeddings feature)
//! model = "all-minilm"
//! host = "http://localhost:11434"  # for ollama
//! # base_url = "https://api.openai.com/v1"  # for openai-compatible APIs
//! # api_key = "sk-..."  # for openai
//! # dimensions = 384  # for the hashed provider
//!
//! [storage]
//! data_dir = "storage"
//! ```

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub embedding: EmbeddingConfig,

    #[serde(default)]
    pub storage: StorageConfig,
}

/// Embedding provider configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingConfig {
    /// Provider type: ollama, openai, hashed, local
    #[serde(default = "default_provider")]
    pub provider: String,

    /// Model name
    #[serde(default = "default_model")]
    pub model: String,

    /// Host for Ollama (e.g., http://localhost:11434)
    pub host: Option<String>,

    /// Base URL for OpenAI-compatible APIs
    pub base_url: Option<String>,

    /// API key for OpenAI
    pub api_key: Option<String>,

    /// Vector dimensions for the hashed provider
    #[serde(default = "default_dimensions")]
    pub dimensions: usize,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            model: default_model(),
            host: None,
            base_url: None,
            api_key: None,
            dimensions: default_dimensions(),
        }
    }
}

fn default_provider() -> String {
    "ollama".to_string()
}

fn default_model() -> String {
    // Same MiniLM family the upstream extraction pipeline embeds with
    "all-minilm".to_string()
}

fn default_dimensions() -> usize {
    384
}

/// Storage layout configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Data directory holding the corpus and the index artifacts
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
        }
    }
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("storage")
}

impl StorageConfig {
    /// Directory the upstream pipeline writes extraction records into
    pub fn corpus_dir(&self) -> PathBuf {
        self.data_dir.join("output").join("ai_extractions")
    }

    /// Directory holding the index and registry artifacts
    pub fn index_dir(&self) -> PathBuf {
        self.data_dir.join("indexes")
    }
}

impl Config {
    /// Get the config file path
    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("casevec")
            .join("config.toml")
    }

    /// Load config from file, returning defaults if not found
    pub fn load() -> Self {
        let path = Self::config_path();
        if path.exists() {
            match std::fs::read_to_string(&path) {
                Ok(content) => match toml::from_str(&content) {
                    Ok(config) => {
                        tracing::debug!("Loaded config from {:?}", path);
                        return config;
                    }
                    Err(e) => {
                        tracing::warn!("Failed to parse config file: {}", e);
                    }
                },
                Err(e) => {
                    tracing::warn!("Failed to read config file: {}", e);
                }
            }
        }
        Self::default()
    }

    /// Create example config file if it doesn't exist
    pub fn create_example_if_missing() -> anyhow::Result<bool> {
        let path = Self::config_path();
        if path.exists() {
            return Ok(false);
        }

        let example = r#"# casevec configuration
# Location: ~/.config/casevec/config.toml

[embedding]
# Provider: ollama, openai, hashed (or local with the local-embeddings feature)
provider = "ollama"
model = "all-minilm"
# host = "http://localhost:11434"
# base_url = "https://api.openai.com/v1"
# api_key = "sk-..."
# dimensions = 384

[storage]
# Directory containing output/ai_extractions (corpus) and indexes (artifacts)
data_dir = "storage"
"#;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&path, example)?;
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.embedding.provider, "ollama");
        assert_eq!(config.embedding.model, "all-minilm");
        assert_eq!(config.embedding.dimensions, 384);
        assert_eq!(config.storage.data_dir, PathBuf::from("storage"));
    }

    #[test]
    fn test_parse_config() {
        let toml = r#"
[embedding]
provider = "openai"
model = "text-embedding-3-small"
base_url = "http://localhost:1234/v1"

[storage]
data_dir = "/var/lib/casevec"
"#;
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.embedding.provider, "openai");
        assert_eq!(config.embedding.model, "text-embedding-3-small");
        assert_eq!(
            config.storage.corpus_dir(),
            PathBuf::from("/var/lib/casevec/output/ai_extractions")
        );
        assert_eq!(
            config.storage.index_dir(),
            PathBuf::from("/var/lib/casevec/indexes")
        );
    }
}
