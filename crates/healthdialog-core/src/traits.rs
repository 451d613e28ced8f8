use async_trait::async_trait;

use crate::error::Result;
use crate::types::{ConfidenceResult, Prompt, RetrievalHit};

/// Text to dense vector. Implementations must return one vector of `dim()`
/// floats per input text, in input order.
pub trait Embedder: Send + Sync {
    fn dim(&self) -> usize;
    fn embed_batch(&self, texts: &[String]) -> anyhow::Result<Vec<Vec<f32>>>;
}

/// Nearest-neighbour structure over raw vectors. Ids are insertion positions.
pub trait NearestNeighbors: Send + Sync {
    fn add(&mut self, vectors: &[Vec<f32>]) -> Result<()>;
    /// Up to `k` hits ordered by ascending distance.
    fn search(&self, query: &[f32], k: usize) -> Result<Vec<RetrievalHit>>;
    fn len(&self) -> usize;
    fn is_empty(&self) -> bool { self.len() == 0 }
}

/// Query text to ranked hits: the surface the response assembler consumes.
pub trait Retriever: Send + Sync {
    fn search(&self, query: &str, top_k: usize) -> Result<Vec<RetrievalHit>>;
}

/// Opaque text-completion oracle. Every failure kind collapses into
/// `Error::Synthesis`.
#[async_trait]
pub trait Generator: Send + Sync {
    fn name(&self) -> &str;
    async fn complete(&self, prompt: &Prompt) -> Result<String>;
}

/// What a risk scorer may look at for one answered query.
#[derive(Debug, Clone, Copy)]
pub struct ScoringInput<'a> {
    pub query: &'a str,
    pub answer: &'a str,
    pub best_distance: f32,
}

/// One confidence strategy. Exactly one is active per pipeline.
pub trait RiskScorer: Send + Sync {
    fn name(&self) -> &'static str;
    fn score(&self, input: &ScoringInput<'_>) -> Result<ConfidenceResult>;
}
