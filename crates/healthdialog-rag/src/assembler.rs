//! One query in, one well-formed [`AnswerResult`] out, whatever fails on the way.
//!
//! Retrieve, drop hits the corpus does not know, score the best hit, then
//! either return the best FAQ answer or ask the generator for a grounded
//! rewrite. Only a retrieval failure forces zero confidence; a generator
//! failure only swaps the answer text and sets `fallback_used`.

use std::sync::Arc;
use std::time::Duration;

use healthdialog_core::config::Settings;
use healthdialog_core::corpus::CorpusStore;
use healthdialog_core::error::Error;
use healthdialog_core::traits::{Generator, Retriever, RiskScorer, ScoringInput};
use healthdialog_core::types::{AnswerResult, ConfidenceResult, CorpusEntry, RetrievalHit, RiskLevel, SourceCitation};

use crate::prompt::build_prompt;

pub const KNOWLEDGE_BASE_UNAVAILABLE: &str =
    "I'm having trouble accessing my knowledge base right now. Please try again later or consult a healthcare professional.";
pub const INSUFFICIENT_INFORMATION: &str =
    "I don't have enough information in my FAQ data to answer that reliably. Please consult a healthcare professional.";
pub const SYNTHESIS_FALLBACK_NOTE: &str =
    "(Note: a summarized answer could not be generated right now, so this is the closest match from the clinical FAQ.)";
pub const NO_MATCH_CONFIDENCE: f64 = 0.2;

#[derive(Debug, Clone)]
pub struct AssemblerConfig {
    pub top_k: usize,
    pub synthesis_timeout: Duration,
}

impl Default for AssemblerConfig {
    fn default() -> Self { Self { top_k: 3, synthesis_timeout: Duration::from_secs(20) } }
}

impl AssemblerConfig {
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            top_k: settings.retrieval.top_k,
            synthesis_timeout: Duration::from_secs(settings.generation.timeout_secs),
        }
    }
}

/// Shared read-only state; clone the `Arc`s freely across requests.
pub struct ResponseAssembler {
    retriever: Arc<dyn Retriever>,
    corpus: Arc<CorpusStore>,
    scorer: Arc<dyn RiskScorer>,
    generator: Option<Arc<dyn Generator>>,
    config: AssemblerConfig,
}

impl ResponseAssembler {
    pub fn new(retriever: Arc<dyn Retriever>, corpus: Arc<CorpusStore>, scorer: Arc<dyn RiskScorer>) -> Self {
        Self { retriever, corpus, scorer, generator: None, config: AssemblerConfig::default() }
    }

    pub fn with_generator(mut self, generator: Option<Arc<dyn Generator>>) -> Self { self.generator = generator; self }

    pub fn with_config(mut self, config: AssemblerConfig) -> Self { self.config = config; self }

    pub fn corpus(&self) -> &CorpusStore { &self.corpus }

    pub fn synthesis_enabled(&self) -> bool { self.generator.is_some() }

    pub fn scorer_name(&self) -> &'static str { self.scorer.name() }

    pub async fn answer(&self, query: &str) -> AnswerResult {
        let hits = match self.retrieve(query).await {
            Ok(hits) => hits,
            Err(err) => {
                tracing::warn!(error = %err, "retrieval failed");
                return Self::retrieval_failed(&err);
            }
        };

        let valid = self.validate(&hits);
        let Some(&(best_hit, best)) = valid.first() else {
            tracing::info!(hits = hits.len(), "no usable FAQ match");
            return Self::no_match();
        };

        let sources: Vec<SourceCitation> = valid.iter().map(|(_, e)| SourceCitation::from_entry(e)).collect();

        let (answer, scored_text, fallback_used) = match &self.generator {
            None => (best.answer.clone(), best.answer.clone(), None),
            Some(generator) => {
                let entries: Vec<&CorpusEntry> = valid.iter().map(|(_, e)| *e).collect();
                match self.synthesize(generator.as_ref(), query, &entries).await {
                    Ok(text) => (text.clone(), text, Some(false)),
                    Err(err) => {
                        tracing::warn!(error = %err, generator = generator.name(), "synthesis failed, using FAQ answer");
                        (format!("{}\n\n{}", best.answer, SYNTHESIS_FALLBACK_NOTE), best.answer.clone(), Some(true))
                    }
                }
            }
        };

        let (confidence, hallucination_risk) = match self.score(query, scored_text, best_hit.distance).await {
            Ok(r) => (Some(r.confidence), Some(r.risk)),
            Err(err) => {
                tracing::warn!(error = %err, scorer = self.scorer.name(), "risk scoring failed");
                (None, None)
            }
        };
        tracing::debug!(row_id = best.row_id, distance = best_hit.distance, ?confidence, sources = sources.len(), "answered");

        AnswerResult { answer, confidence, hallucination_risk, sources, error: None, fallback_used }
    }

    /// Embedding is CPU-bound, so retrieval runs on the blocking pool.
    async fn retrieve(&self, query: &str) -> healthdialog_core::Result<Vec<RetrievalHit>> {
        let retriever = Arc::clone(&self.retriever);
        let query = query.to_string();
        let top_k = self.config.top_k;
        tokio::task::spawn_blocking(move || retriever.search(&query, top_k))
            .await
            .map_err(|e| Error::Retrieval(format!("retrieval task failed: {e}")))?
    }

    async fn score(&self, query: &str, answer: String, best_distance: f32) -> healthdialog_core::Result<ConfidenceResult> {
        let scorer = Arc::clone(&self.scorer);
        let query = query.to_string();
        tokio::task::spawn_blocking(move || scorer.score(&ScoringInput { query: &query, answer: &answer, best_distance }))
            .await
            .map_err(|e| Error::Retrieval(format!("scoring task failed: {e}")))?
    }

    /// Hits whose row exists in the corpus, rank order kept.
    fn validate(&self, hits: &[RetrievalHit]) -> Vec<(RetrievalHit, &CorpusEntry)> {
        hits.iter()
            .filter_map(|hit| match self.corpus.get(hit.row_id) {
                Ok(entry) => Some((*hit, entry)),
                Err(_) => {
                    tracing::warn!(row_id = hit.row_id, corpus = self.corpus.len(), "index returned a row outside the corpus");
                    None
                }
            })
            .collect()
    }

    async fn synthesize(&self, generator: &dyn Generator, query: &str, entries: &[&CorpusEntry]) -> healthdialog_core::Result<String> {
        let prompt = build_prompt(query, entries);
        match tokio::time::timeout(self.config.synthesis_timeout, generator.complete(&prompt)).await {
            Ok(result) => result,
            Err(_) => Err(Error::Synthesis(format!("timed out after {:?}", self.config.synthesis_timeout))),
        }
    }

    fn retrieval_failed(err: &Error) -> AnswerResult {
        AnswerResult {
            answer: KNOWLEDGE_BASE_UNAVAILABLE.to_string(),
            confidence: Some(0.0),
            hallucination_risk: Some(RiskLevel::High),
            sources: Vec::new(),
            error: Some(err.to_string()),
            fallback_used: None,
        }
    }

    fn no_match() -> AnswerResult {
        AnswerResult {
            answer: INSUFFICIENT_INFORMATION.to_string(),
            confidence: Some(NO_MATCH_CONFIDENCE),
            hallucination_risk: Some(RiskLevel::Medium),
            sources: Vec::new(),
            error: None,
            fallback_used: None,
        }
    }
}
