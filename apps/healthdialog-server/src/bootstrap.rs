//! Startup wiring: corpus, embedder, index, scorer and optional generator,
//! built once and handed to the assembler.

use std::sync::Arc;

use anyhow::Context;
use tracing::info;

use healthdialog_core::config::Settings;
use healthdialog_core::traits::{Embedder, Generator};
use healthdialog_core::CorpusStore;
use healthdialog_embed::get_default_embedder;
use healthdialog_llm::OpenAiGenerator;
use healthdialog_rag::{scorer_from_config, AssemblerConfig, ResponseAssembler};
use healthdialog_vector::FaqIndex;

/// Load the corpus and embedder named by `settings`, then [`assemble`].
pub fn from_settings(settings: &Settings) -> anyhow::Result<ResponseAssembler> {
    let faq_path = settings.data.faq_path();
    let corpus = CorpusStore::load(&faq_path).with_context(|| format!("loading FAQ corpus from {}", faq_path.display()))?;
    let embedder = get_default_embedder(&settings.embedding).context("loading embedding model")?;
    assemble(settings, corpus, embedder)
}

pub fn assemble(settings: &Settings, corpus: CorpusStore, embedder: Arc<dyn Embedder>) -> anyhow::Result<ResponseAssembler> {
    // question texts go to the index in corpus row order
    let mut index = FaqIndex::new(Arc::clone(&embedder));
    index.build_from_corpus(&corpus).context("building FAQ index")?;

    let scorer = scorer_from_config(&settings.scoring, embedder);
    let generator = OpenAiGenerator::from_config(&settings.generation)?.map(|g| Arc::new(g) as Arc<dyn Generator>);
    info!(
        faqs = corpus.len(),
        scorer = scorer.name(),
        generator = generator.as_ref().map_or("none", |g| g.name()),
        top_k = settings.retrieval.top_k,
        "pipeline ready"
    );

    Ok(ResponseAssembler::new(Arc::new(index), Arc::new(corpus), scorer)
        .with_generator(generator)
        .with_config(AssemblerConfig::from_settings(settings)))
}
