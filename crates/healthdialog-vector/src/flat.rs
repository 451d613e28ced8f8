//! Exact nearest-neighbour search over a contiguous row-major buffer.
//!
//! Every query scans all stored vectors. The FAQ corpora this serves are a few
//! hundred rows, so brute force beats any approximate structure here.

use healthdialog_core::error::{Error, Result};
use healthdialog_core::traits::NearestNeighbors;
use healthdialog_core::types::RetrievalHit;

/// The default reports squared L2, the same numbers FAISS `IndexFlatL2` gives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DistanceMetric {
    /// Sum of squared differences, no square root.
    #[default]
    SquaredL2,
    L2,
}

impl DistanceMetric {
    fn distance(self, a: &[f32], b: &[f32]) -> f32 {
        let sq: f32 = a.iter().zip(b).map(|(x, y)| (x - y) * (x - y)).sum();
        match self {
            DistanceMetric::SquaredL2 => sq,
            DistanceMetric::L2 => sq.sqrt(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct FlatL2Index {
    dim: usize,
    metric: DistanceMetric,
    data: Vec<f32>,
}

impl FlatL2Index {
    pub fn new(dim: usize) -> Self { Self::with_metric(dim, DistanceMetric::default()) }

    pub fn with_metric(dim: usize, metric: DistanceMetric) -> Self { Self { dim, metric, data: Vec::new() } }

    pub fn dim(&self) -> usize { self.dim }

    fn check_dim(&self, actual: usize) -> Result<()> {
        if actual != self.dim {
            return Err(Error::DimensionMismatch { expected: self.dim, actual });
        }
        Ok(())
    }

    fn row(&self, i: usize) -> &[f32] { &self.data[i * self.dim..(i + 1) * self.dim] }
}

impl NearestNeighbors for FlatL2Index {
    /// All-or-nothing: a batch with one bad vector adds nothing.
    fn add(&mut self, vectors: &[Vec<f32>]) -> Result<()> {
        for v in vectors {
            self.check_dim(v.len())?;
        }
        self.data.reserve(vectors.len() * self.dim);
        for v in vectors {
            self.data.extend_from_slice(v);
        }
        Ok(())
    }

    fn search(&self, query: &[f32], k: usize) -> Result<Vec<RetrievalHit>> {
        self.check_dim(query.len())?;
        if k == 0 || self.is_empty() {
            return Ok(Vec::new());
        }
        let mut hits: Vec<RetrievalHit> = (0..self.len())
            .map(|row_id| RetrievalHit { row_id, distance: self.metric.distance(query, self.row(row_id)) })
            .collect();
        // ties keep insertion order
        hits.sort_by(|a, b| a.distance.total_cmp(&b.distance));
        hits.truncate(k);
        Ok(hits)
    }

    fn len(&self) -> usize {
        if self.dim == 0 { 0 } else { self.data.len() / self.dim }
    }
}
