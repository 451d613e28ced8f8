//! Domain types shared by the retrieval, scoring and serving layers.

use serde::{Deserialize, Serialize};

pub type RowId = usize;

/// One FAQ row.
///
/// - `row_id`: 0-based position in the corpus, equal to the position of the
///   question text handed to the index at build time
/// - `question`/`answer`: the curated text pair
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CorpusEntry {
    pub row_id: RowId,
    pub question: String,
    pub answer: String,
}

/// A single nearest-neighbour result. Smaller `distance` is more similar.
///
/// `row_id` comes straight from the index and is not trusted until it has been
/// checked against the corpus bounds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RetrievalHit {
    pub row_id: RowId,
    pub distance: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

impl RiskLevel {
    pub fn as_str(&self) -> &'static str {
        match self { RiskLevel::Low => "low", RiskLevel::Medium => "medium", RiskLevel::High => "high" }
    }
}

impl std::fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result { f.write_str(self.as_str()) }
}

/// Confidence in `[0, 1]` plus its bucketed risk label.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ConfidenceResult {
    pub confidence: f64,
    pub risk: RiskLevel,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceCitation {
    pub title: String,
    pub snippet: String,
    pub url: Option<String>,
}

impl SourceCitation {
    pub const TITLE_PREFIX: &'static str = "Clinical FAQ: ";

    pub fn from_entry(entry: &CorpusEntry) -> Self {
        Self { title: format!("{}{}", Self::TITLE_PREFIX, entry.question), snippet: entry.answer.clone(), url: None }
    }
}

/// The response contract returned for every query, including degraded ones.
///
/// `confidence`, `hallucination_risk` and `url` serialize as `null` when absent;
/// `error` and `fallback_used` are omitted entirely when absent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnswerResult {
    pub answer: String,
    pub confidence: Option<f64>,
    pub hallucination_risk: Option<RiskLevel>,
    pub sources: Vec<SourceCitation>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fallback_used: Option<bool>,
}

/// A grounded prompt for a chat-style generator: a fixed system instruction
/// plus the user turn carrying the retrieved context and the raw question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Prompt {
    pub system: String,
    pub user: String,
}
