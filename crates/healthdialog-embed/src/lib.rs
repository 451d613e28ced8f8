use anyhow::{anyhow, Result};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use candle_core::{DType, Device};
use candle_nn::VarBuilder;
use candle_transformers::models::bert::{BertModel, Config as BertConfig};
use healthdialog_core::config::EmbeddingConfig;
use healthdialog_core::traits::Embedder;
use tokenizers::Tokenizer;

pub mod device;
pub mod pool;
pub mod tokenize;

pub use pool::masked_mean_l2;
pub use tokenize::tokenize_batch;

const BERT_PAD_ID: u32 = 0;

/// Sentence embedder for BERT-family checkpoints such as
/// `sentence-transformers/all-MiniLM-L6-v2`: masked mean pooling + L2 norm.
pub struct MiniLmEmbedder { model: BertModel, tokenizer: Tokenizer, device: Device, dim: usize, max_len: usize }

impl MiniLmEmbedder {
    pub fn new(model_dir: &Path, max_len: usize) -> Result<Self> {
        let device = device::select_device();
        let model_dir = resolve_model_dir(model_dir)?;
        tracing::info!(dir = %model_dir.display(), "loading sentence embedding model");
        let tokenizer_path = model_dir.join("tokenizer.json");
        let tokenizer = Tokenizer::from_file(&tokenizer_path)
            .map_err(|e| anyhow!("Failed to load tokenizer from {}: {}", tokenizer_path.display(), e))?;
        let config_path = model_dir.join("config.json");
        let raw_config = std::fs::read_to_string(&config_path)?;
        let config: BertConfig = serde_json::from_str(&raw_config)?;
        let dim = serde_json::from_str::<serde_json::Value>(&raw_config)?
            .get("hidden_size")
            .and_then(serde_json::Value::as_u64)
            .ok_or_else(|| anyhow!("{} has no hidden_size", config_path.display()))? as usize;
        let safetensors = model_dir.join("model.safetensors");
        let vb = if safetensors.exists() {
            // SAFETY: the weights file is not modified while the mapping is alive.
            unsafe { VarBuilder::from_mmaped_safetensors(&[safetensors], DType::F32, &device)? }
        } else {
            let weights = candle_core::pickle::read_all(model_dir.join("pytorch_model.bin"))?;
            let weights_map: std::collections::HashMap<String, candle_core::Tensor> = weights.into_iter().collect();
            VarBuilder::from_tensors(weights_map, DType::F32, &device)
        };
        let model = BertModel::load(vb, &config)?;
        tracing::info!(dim, max_len, "embedding model ready");
        Ok(Self { model, tokenizer, device, dim, max_len })
    }

    pub fn embed_texts(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() { return Ok(Vec::new()); }
        let start = Instant::now();
        let (input_ids, attention_mask) = tokenize_batch(&self.tokenizer, texts, self.max_len, BERT_PAD_ID, &self.device)?;
        let token_type_ids = input_ids.zeros_like()?;
        let hidden = self.model.forward(&input_ids, &token_type_ids, Some(&attention_mask))?;
        let pooled = masked_mean_l2(&hidden, &attention_mask)?;
        let vectors: Vec<Vec<f32>> = pooled.to_device(&Device::Cpu)?.to_vec2()?;
        if let Some(v) = vectors.iter().find(|v| v.len() != self.dim) { return Err(anyhow!("model produced {} dims, expected {}", v.len(), self.dim)); }
        let elapsed = start.elapsed();
        if elapsed.as_millis() > 100 * texts.len() as u128 { tracing::warn!(batch = texts.len(), ms = elapsed.as_millis() as u64, "slow embedding"); }
        Ok(vectors)
    }
}

impl Embedder for MiniLmEmbedder {
    fn dim(&self) -> usize { self.dim }
    fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> { self.embed_texts(texts) }
}

/// Deterministic bag-of-tokens hashing embedder for tests and offline development.
/// Texts sharing words land close together; identical texts map to identical vectors.
pub struct FakeEmbedder { dim: usize }

impl FakeEmbedder {
    pub fn new(dim: usize) -> Self { Self { dim: dim.max(1) } }

    fn embed_one(&self, text: &str) -> Vec<f32> {
        use std::hash::{Hash, Hasher}; use twox_hash::XxHash64;
        let mut v = vec![0f32; self.dim];
        for token in text.split(|c: char| !c.is_alphanumeric()).filter(|t| !t.is_empty()) {
            let token = token.to_lowercase();
            let mut hasher = XxHash64::with_seed(0); token.hash(&mut hasher); let h = hasher.finish();
            let idx = (h as usize) % self.dim; let val = (((h >> 32) as u32) as f32) / (u32::MAX as f32);
            v[idx] += 0.5 + val * 0.5;
        }
        let norm = (v.iter().map(|x| x * x).sum::<f32>()).sqrt().max(1e-6); for x in &mut v { *x /= norm; } v
    }
}

impl Embedder for FakeEmbedder {
    fn dim(&self) -> usize { self.dim }
    fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> { Ok(texts.iter().map(|t| self.embed_one(t)).collect()) }
}

pub fn get_default_embedder(config: &EmbeddingConfig) -> Result<Arc<dyn Embedder>> {
    if config.use_fake {
        tracing::info!(dim = config.fake_dim, "using FakeEmbedder");
        return Ok(Arc::new(FakeEmbedder::new(config.fake_dim)));
    }
    Ok(Arc::new(MiniLmEmbedder::new(&config.model_path(), config.max_len)?))
}

fn resolve_model_dir(configured: &Path) -> Result<PathBuf> {
    if let Ok(dir) = std::env::var("APP_MODEL_DIR") { let p = PathBuf::from(&dir); if p.exists() { tracing::debug!(dir = %p.display(), "using APP_MODEL_DIR"); return Ok(p); } }
    if configured.exists() { return Ok(configured.to_path_buf()); }
    let parent = Path::new("..").join(configured); if parent.exists() { return Ok(parent); }
    Err(anyhow!("Could not locate embedding model directory {}", configured.display()))
}
