//! Distance to confidence: `exp(-max(d, EPSILON))`, bucketed into a risk label.

use healthdialog_core::error::Result;
use healthdialog_core::traits::{RiskScorer, ScoringInput};
use healthdialog_core::types::{ConfidenceResult, RiskLevel};

/// Floor applied to distances so an exact match never reports certainty.
pub const EPSILON: f64 = 1e-6;
pub const LOW_RISK_MIN: f64 = 0.8;
pub const MEDIUM_RISK_MIN: f64 = 0.4;

/// Monotonically non-increasing in `distance`. NaN is treated as infinitely far.
pub fn confidence(distance: f32) -> f64 {
    let d = f64::from(distance);
    let d = if d.is_nan() { f64::INFINITY } else { d.max(EPSILON) };
    (-d).exp().clamp(0.0, 1.0)
}

pub fn risk_for(confidence: f64) -> RiskLevel {
    if confidence >= LOW_RISK_MIN {
        RiskLevel::Low
    } else if confidence >= MEDIUM_RISK_MIN {
        RiskLevel::Medium
    } else {
        RiskLevel::High
    }
}

pub fn score(distance: f32) -> ConfidenceResult {
    let confidence = confidence(distance);
    ConfidenceResult { confidence, risk: risk_for(confidence) }
}

/// Scores only the best hit's distance; the answer text plays no part.
#[derive(Debug, Clone, Copy, Default)]
pub struct DistanceConfidence;

impl RiskScorer for DistanceConfidence {
    fn name(&self) -> &'static str { "distance" }

    fn score(&self, input: &ScoringInput<'_>) -> Result<ConfidenceResult> { Ok(score(input.best_distance)) }
}
