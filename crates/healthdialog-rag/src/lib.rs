pub mod assembler;
pub mod confidence;
pub mod consistency;
pub mod prompt;

use std::sync::Arc;

use healthdialog_core::config::{ScoringConfig, ScoringStrategy};
use healthdialog_core::traits::{Embedder, RiskScorer};

pub use assembler::{AssemblerConfig, ResponseAssembler};
pub use confidence::DistanceConfidence;
pub use consistency::SemanticConsistency;

/// The one scorer a pipeline runs with.
pub fn scorer_from_config(config: &ScoringConfig, embedder: Arc<dyn Embedder>) -> Arc<dyn RiskScorer> {
    match config.strategy {
        ScoringStrategy::Distance => Arc::new(DistanceConfidence),
        ScoringStrategy::SemanticConsistency => Arc::new(SemanticConsistency::new(embedder, config.consistency_threshold)),
    }
}
