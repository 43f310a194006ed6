//! Local embeddings using Candle (sentence-transformers compatible)

use std::path::PathBuf;

use candle_core::{DType, Device, Tensor};
use candle_nn::VarBuilder;
use candle_transformers::models::bert::{BertModel, Config as BertConfig, DTYPE};
use hf_hub::{api::sync::Api, Repo, RepoType};
use tokenizers::Tokenizer;
use tracing::info;

/// Local embedding provider using Candle
///
/// Runs the same model family the original extraction pipeline used
/// (sentence-transformers/all-MiniLM-L6-v2, 384 dims) fully in-process.
pub struct CandleEmbedding {
    model: BertModel,
    tokenizer: Tokenizer,
    device: Device,
    dimensions: usize,
}

impl CandleEmbedding {
    /// Load a sentence-transformers model from a local path or the
    /// HuggingFace Hub
    pub fn new(model_name: String, model_path: Option<String>) -> anyhow::Result<Self> {
        info!("Loading local embedding model: {}", model_name);

        let device = Device::Cpu;

        let (config_path, tokenizer_path, weights_path) = if let Some(path) = model_path {
            let base = PathBuf::from(path);
            (
                base.join("config.json"),
                base.join("tokenizer.json"),
                base.join("model.safetensors"),
            )
        } else {
            let api = Api::new()?;
            let repo = api.repo(Repo::new(model_name.clone(), RepoType::Model));

            let config = repo.get("config.json")?;
            let tokenizer = repo.get("tokenizer.json")?;
            let weights = repo
                .get("model.safetensors")
                .or_else(|_| repo.get("pytorch_model.bin"))?;

            (config, tokenizer, weights)
        };

        let config_content = std::fs::read_to_string(&config_path)?;
        let config: BertConfig = serde_json::from_str(&config_content)?;
        let dimensions = config.hidden_size;

        let tokenizer = Tokenizer::from_file(&tokenizer_path)
            .map_err(|e| anyhow::anyhow!("Failed to load tokenizer: {}", e))?;

        let vb = if weights_path.extension().map(|e| e == "safetensors").unwrap_or(false) {
            unsafe { VarBuilder::from_mmaped_safetensors(&[weights_path], DTYPE, &device)? }
        } else {
            VarBuilder::from_pth(weights_path, DTYPE, &device)?
        };

        let model = BertModel::load(vb, &config)?;

        info!("Loaded model: {} dims, device: {:?}", dimensions, device);

        Ok(Self {
            model,
            tokenizer,
            device,
            dimensions,
        })
    }

    /// Get embedding dimensions
    pub fn dimensions(&self) -> usize {
        self.dimensions
    }

    /// Compute embeddings for texts
    pub fn embed(&self, texts: &[&str]) -> anyhow::Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let mut all_embeddings = Vec::with_capacity(texts.len());

        // Batch to bound peak memory
        let batch_size = 32;
        for batch in texts.chunks(batch_size) {
            all_embeddings.extend(self.embed_batch(batch)?);
        }

        Ok(all_embeddings)
    }

    fn embed_batch(&self, texts: &[&str]) -> anyhow::Result<Vec<Vec<f32>>> {
        let encodings = self
            .tokenizer
            .encode_batch(texts.to_vec(), true)
            .map_err(|e| anyhow::anyhow!("Tokenization failed: {}", e))?;

        let max_len = encodings.iter().map(|e| e.get_ids().len()).max().unwrap_or(0);

        let mut input_ids = Vec::new();
        let mut attention_mask = Vec::new();
        let mut token_type_ids = Vec::new();

        for encoding in &encodings {
            let mut padded_ids = encoding.get_ids().to_vec();
            let mut padded_mask = encoding.get_attention_mask().to_vec();
            let mut padded_types = encoding.get_type_ids().to_vec();

            padded_ids.resize(max_len, 0);
            padded_mask.resize(max_len, 0);
            padded_types.resize(max_len, 0);

            input_ids.extend(padded_ids);
            attention_mask.extend(padded_mask);
            token_type_ids.extend(padded_types);
        }

        let batch_size = encodings.len();

        let input_ids = Tensor::from_vec(input_ids, (batch_size, max_len), &self.device)?
            .to_dtype(DType::U32)?;
        let attention_mask =
            Tensor::from_vec(attention_mask, (batch_size, max_len), &self.device)?
                .to_dtype(DType::U32)?;
        let token_type_ids =
            Tensor::from_vec(token_type_ids, (batch_size, max_len), &self.device)?
                .to_dtype(DType::U32)?;

        let output = self.model.forward(&input_ids, &token_type_ids, Some(&attention_mask))?;

        // Mean pooling over non-padding tokens, then unit normalization
        let embeddings = self.mean_pooling(&output, &attention_mask)?;
        let embeddings = self.l2_normalize(&embeddings)?;

        let embeddings = embeddings.to_dtype(DType::F32)?;
        let data = embeddings.flatten_all()?.to_vec1::<f32>()?;

        let mut result = Vec::with_capacity(batch_size);
        for i in 0..batch_size {
            let start = i * self.dimensions;
            result.push(data[start..start + self.dimensions].to_vec());
        }

        Ok(result)
    }

    fn mean_pooling(&self, output: &Tensor, attention_mask: &Tensor) -> anyhow::Result<Tensor> {
        // output: (batch, seq_len, hidden); attention_mask: (batch, seq_len)
        let mask = attention_mask
            .to_dtype(output.dtype())?
            .unsqueeze(2)?
            .broadcast_as(output.shape())?;

        let masked = output.mul(&mask)?;
        let sum = masked.sum(1)?;

        let count = attention_mask
            .to_dtype(output.dtype())?
            .sum(1)?
            .unsqueeze(1)?
            .broadcast_as(sum.shape())?;

        let mean = sum.div(&count.clamp(1e-9, f64::INFINITY)?)?;

        Ok(mean)
    }

    fn l2_normalize(&self, embeddings: &Tensor) -> anyhow::Result<Tensor> {
        let norm = embeddings
            .sqr()?
            .sum_keepdim(1)?
            .sqrt()?
            .clamp(1e-12, f64::INFINITY)?;
        Ok(embeddings.broadcast_div(&norm)?)
    }
}
