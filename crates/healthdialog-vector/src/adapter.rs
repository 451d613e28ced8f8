use std::sync::Arc;

use indicatif::{ProgressBar, ProgressStyle};

use healthdialog_core::corpus::CorpusStore;
use healthdialog_core::error::{Error, Result};
use healthdialog_core::traits::{Embedder, NearestNeighbors, Retriever};
use healthdialog_core::types::RetrievalHit;

use crate::flat::{DistanceMetric, FlatL2Index};

const EMBED_BATCH_SIZE: usize = 32;

/// Embedder plus flat index. Row ids returned by `search` are the positions of
/// the texts passed to `build`.
pub struct FaqIndex {
    embedder: Arc<dyn Embedder>,
    metric: DistanceMetric,
    index: Option<FlatL2Index>,
    show_progress: bool,
}

impl FaqIndex {
    pub fn new(embedder: Arc<dyn Embedder>) -> Self {
        Self { embedder, metric: DistanceMetric::default(), index: None, show_progress: true }
    }

    pub fn with_metric(mut self, metric: DistanceMetric) -> Self { self.metric = metric; self }

    pub fn with_progress(mut self, show: bool) -> Self { self.show_progress = show; self }

    pub fn is_ready(&self) -> bool { self.index.is_some() }

    pub fn len(&self) -> usize { self.index.as_ref().map_or(0, |i| i.len()) }

    pub fn is_empty(&self) -> bool { self.len() == 0 }

    /// Embed `texts` and replace any previous index. Position `i` in `texts`
    /// becomes row id `i`.
    pub fn build(&mut self, texts: &[String]) -> Result<()> {
        let mut index = FlatL2Index::with_metric(self.embedder.dim(), self.metric);
        let pb = self.progress_bar(texts.len());
        for chunk in texts.chunks(EMBED_BATCH_SIZE) {
            let vectors = self.embedder.embed_batch(chunk).map_err(Error::retrieval)?;
            if vectors.len() != chunk.len() {
                return Err(Error::Retrieval(format!("embedder returned {} vectors for {} texts", vectors.len(), chunk.len())));
            }
            index.add(&vectors)?;
            pb.inc(chunk.len() as u64);
        }
        pb.finish_and_clear();
        tracing::info!(rows = index.len(), dim = index.dim(), metric = ?self.metric, "FAQ index built");
        self.index = Some(index);
        Ok(())
    }

    /// Index the corpus questions in row order so hit ids line up with
    /// `CorpusStore::get`.
    pub fn build_from_corpus(&mut self, corpus: &CorpusStore) -> Result<()> { self.build(&corpus.questions()) }

    fn progress_bar(&self, len: usize) -> ProgressBar {
        if !self.show_progress { return ProgressBar::hidden(); }
        let pb = ProgressBar::new(len as u64);
        if let Ok(style) = ProgressStyle::default_bar().template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} questions ({percent}%)") {
            pb.set_style(style.progress_chars("#>-"));
        }
        pb
    }
}

impl Retriever for FaqIndex {
    fn search(&self, query: &str, top_k: usize) -> Result<Vec<RetrievalHit>> {
        let index = self.index.as_ref().ok_or(Error::NotReady)?;
        let vector = self
            .embedder
            .embed_batch(&[query.to_string()])
            .map_err(Error::retrieval)?
            .into_iter()
            .next()
            .ok_or_else(|| Error::Retrieval("embedder returned no vector for the query".into()))?;
        let hits = index.search(&vector, top_k).map_err(Error::retrieval)?;
        tracing::debug!(top_k, hits = hits.len(), best = ?hits.first().map(|h| h.distance), "FAQ search");
        Ok(hits)
    }
}
