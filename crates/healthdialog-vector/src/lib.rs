pub mod adapter;
pub mod flat;

pub use adapter::FaqIndex;
pub use flat::{DistanceMetric, FlatL2Index};
