use std::sync::Arc;

use healthdialog_core::error::{Error, Result};
use healthdialog_core::traits::{Embedder, RiskScorer, ScoringInput};
use healthdialog_core::types::{ConfidenceResult, RiskLevel};

pub const DEFAULT_THRESHOLD: f64 = 0.4;

/// Cosine similarity between query and answer embeddings. An answer that
/// drifts below `threshold` is flagged as a likely hallucination.
pub struct SemanticConsistency {
    embedder: Arc<dyn Embedder>,
    threshold: f64,
}

impl SemanticConsistency {
    pub fn new(embedder: Arc<dyn Embedder>, threshold: f64) -> Self { Self { embedder, threshold } }

    pub fn similarity(&self, query: &str, answer: &str) -> Result<f64> {
        let vectors = self
            .embedder
            .embed_batch(&[query.to_string(), answer.to_string()])
            .map_err(|e| Error::Retrieval(format!("consistency embedding failed: {e}")))?;
        match vectors.as_slice() {
            [q, a] => Ok(cosine(q, a)),
            _ => Err(Error::Retrieval(format!("expected 2 embeddings, got {}", vectors.len()))),
        }
    }

    pub fn is_hallucinated(&self, similarity: f64) -> bool { similarity < self.threshold }
}

impl RiskScorer for SemanticConsistency {
    fn name(&self) -> &'static str { "semantic_consistency" }

    fn score(&self, input: &ScoringInput<'_>) -> Result<ConfidenceResult> {
        let sim = self.similarity(input.query, input.answer)?;
        let risk = if self.is_hallucinated(sim) { RiskLevel::High } else { RiskLevel::Low };
        tracing::debug!(similarity = sim, threshold = self.threshold, %risk, "consistency score");
        Ok(ConfidenceResult { confidence: sim.clamp(0.0, 1.0), risk })
    }
}

/// 0.0 when either vector has zero length.
pub fn cosine(a: &[f32], b: &[f32]) -> f64 {
    let (mut dot, mut na, mut nb) = (0f64, 0f64, 0f64);
    for (x, y) in a.iter().zip(b) {
        let (x, y) = (f64::from(*x), f64::from(*y));
        dot += x * y;
        na += x * x;
        nb += y * y;
    }
    if na == 0.0 || nb == 0.0 {
        return 0.0;
    }
    dot / (na.sqrt() * nb.sqrt())
}
