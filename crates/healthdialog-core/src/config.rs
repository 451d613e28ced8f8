//! Layered configuration and path helpers.
//!
//! Uses Figment to merge built-in defaults + `config.toml` + `config.<env>.toml`
//! + `APP_*` env vars (`__` separates nested keys, e.g. `APP_SERVER__PORT`).
//! `OPENAI_API_KEY` is honoured when `generation.api_key` is not set.

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;

use crate::error::Error;

pub struct Config {
    figment: Figment,
}

impl Config {
    pub fn load() -> anyhow::Result<Self> {
        let env_name = env::var("RUST_ENV").unwrap_or_else(|_| "dev".to_string());

        let mut figment = Figment::from(Serialized::defaults(Settings::default())).merge(Toml::file("config.toml"));
        match env_name.as_str() {
            "dev" | "development" => figment = figment.merge(Toml::file("config.dev.toml")),
            "prod" | "production" => figment = figment.merge(Toml::file("config.prod.toml")),
            "test" | "testing" => figment = figment.merge(Toml::file("config.test.toml")),
            _ => {}
        }
        figment = figment.merge(Env::prefixed("APP_").split("__"));

        let config = Self { figment };
        config.validate_for_env(&env_name)?;
        Ok(config)
    }

    pub fn get<T>(&self, key: &str) -> anyhow::Result<T>
    where
        T: serde::de::DeserializeOwned,
    {
        self.figment
            .extract_inner(key)
            .map_err(|e| anyhow::anyhow!("Failed to get '{}': {}", key, e))
    }

    /// All sections, with defaults for anything not configured.
    pub fn settings(&self) -> anyhow::Result<Settings> {
        let mut settings: Settings = self.figment.extract().map_err(|e| anyhow::anyhow!("Failed to read settings: {}", e))?;
        if settings.generation.api_key.is_none() {
            settings.generation.api_key = env::var("OPENAI_API_KEY").ok().filter(|k| !k.trim().is_empty());
        }
        if fake_embeddings_forced() {
            settings.embedding.use_fake = true;
        }
        settings.validate()?;
        Ok(settings)
    }

    fn validate_for_env(&self, env: &str) -> anyhow::Result<()> {
        match env {
            "prod" | "production" => {
                let use_fake: bool = self.get("embedding.use_fake").unwrap_or(false);
                if use_fake || fake_embeddings_forced() {
                    return Err(anyhow::anyhow!("Prod config must not use the fake embedder"));
                }
            }
            "dev" | "development" => {}
            "test" | "testing" => {}
            _ => {}
        }
        Ok(())
    }
}

/// `APP_USE_FAKE_EMBEDDINGS=1` (or `true`) switches to the hashing embedder.
fn fake_embeddings_forced() -> bool {
    env::var("APP_USE_FAKE_EMBEDDINGS").map(|v| v == "1" || v.eq_ignore_ascii_case("true")).unwrap_or(false)
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub data: DataConfig,
    pub embedding: EmbeddingConfig,
    pub retrieval: RetrievalConfig,
    pub scoring: ScoringConfig,
    pub generation: GenerationConfig,
    pub server: ServerConfig,
}

impl Settings {
    pub fn validate(&self) -> Result<(), Error> {
        if self.retrieval.top_k == 0 {
            return Err(Error::InvalidConfig("retrieval.top_k must be at least 1".into()));
        }
        if !(0.0..=1.0).contains(&self.scoring.consistency_threshold) {
            return Err(Error::InvalidConfig(format!(
                "scoring.consistency_threshold must be within [0, 1], got {}",
                self.scoring.consistency_threshold
            )));
        }
        if self.generation.timeout_secs == 0 {
            return Err(Error::InvalidConfig("generation.timeout_secs must be positive".into()));
        }
        if self.embedding.use_fake && self.embedding.fake_dim == 0 {
            return Err(Error::InvalidConfig("embedding.fake_dim must be positive".into()));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DataConfig {
    pub faq_csv: String,
}

impl Default for DataConfig {
    fn default() -> Self { Self { faq_csv: "data/clinical_faq.csv".to_string() } }
}

impl DataConfig {
    pub fn faq_path(&self) -> PathBuf { expand_path(&self.faq_csv) }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingConfig {
    pub model_dir: String,
    pub use_fake: bool,
    pub fake_dim: usize,
    pub max_len: usize,
}

impl EmbeddingConfig {
    pub fn model_path(&self) -> PathBuf { expand_path(&self.model_dir) }
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self { model_dir: "models/all-MiniLM-L6-v2".to_string(), use_fake: false, fake_dim: 384, max_len: 256 }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrievalConfig {
    pub top_k: usize,
}

impl Default for RetrievalConfig {
    fn default() -> Self { Self { top_k: 3 } }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoringStrategy {
    /// exp(-distance) of the best hit.
    #[default]
    Distance,
    /// Cosine similarity between query and answer embeddings.
    SemanticConsistency,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringConfig {
    pub strategy: ScoringStrategy,
    pub consistency_threshold: f64,
}

impl Default for ScoringConfig {
    fn default() -> Self { Self { strategy: ScoringStrategy::Distance, consistency_threshold: 0.4 } }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationConfig {
    pub enabled: bool,
    pub base_url: String,
    pub model: String,
    pub api_key: Option<String>,
    pub temperature: f32,
    pub timeout_secs: u64,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            base_url: "https://api.openai.com/v1".to_string(),
            model: "gpt-4.1-mini".to_string(),
            api_key: None,
            temperature: 0.0,
            timeout_secs: 20,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub cors_origins: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { host: "127.0.0.1".to_string(), port: 8000, cors_origins: vec!["http://localhost:5173".to_string()] }
    }
}

/// Expand a user-provided path string:
/// - Expands leading '~' to the user's home directory
/// - Expands ${VAR} and $VAR environment variables
/// - Returns a PathBuf without attempting to canonicalize
pub fn expand_path<S: AsRef<str>>(input: S) -> PathBuf {
    let s = input.as_ref();
    // Expand env vars first
    let expanded_env = shellexpand::env(s).unwrap_or(std::borrow::Cow::Borrowed(s));
    // Expand ~ at start
    let expanded = shellexpand::tilde(&expanded_env);
    PathBuf::from(expanded.as_ref())
}
