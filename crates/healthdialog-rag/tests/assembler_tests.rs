use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use healthdialog_core::error::{Error, Result};
use healthdialog_core::traits::{Generator, Retriever, RiskScorer, ScoringInput};
use healthdialog_core::types::{ConfidenceResult, Prompt, RetrievalHit, RiskLevel};
use healthdialog_core::CorpusStore;
use healthdialog_rag::assembler::{INSUFFICIENT_INFORMATION, KNOWLEDGE_BASE_UNAVAILABLE, SYNTHESIS_FALLBACK_NOTE};
use healthdialog_rag::confidence;
use healthdialog_rag::{AssemblerConfig, DistanceConfidence, ResponseAssembler};

const FEVER_ANSWER: &str = "Fever is commonly caused by infection.";
const HEADACHE_ANSWER: &str = "Rest, hydration, and over-the-counter analgesics can help.";

fn corpus() -> Arc<CorpusStore> {
    Arc::new(CorpusStore::from_pairs([
        ("What causes fever?", FEVER_ANSWER),
        ("What helps a headache?", HEADACHE_ANSWER),
    ]))
}

fn hit(row_id: usize, distance: f32) -> RetrievalHit { RetrievalHit { row_id, distance } }

enum Canned {
    Hits(Vec<RetrievalHit>),
    Fail,
}

struct FakeRetriever {
    canned: Canned,
    calls: AtomicUsize,
}

impl FakeRetriever {
    fn hits(hits: Vec<RetrievalHit>) -> Arc<Self> { Arc::new(Self { canned: Canned::Hits(hits), calls: AtomicUsize::new(0) }) }
    fn failing() -> Arc<Self> { Arc::new(Self { canned: Canned::Fail, calls: AtomicUsize::new(0) }) }
}

impl Retriever for FakeRetriever {
    fn search(&self, _query: &str, top_k: usize) -> Result<Vec<RetrievalHit>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.canned {
            Canned::Hits(h) => Ok(h.iter().copied().take(top_k).collect()),
            Canned::Fail => Err(Error::Retrieval("index offline".into())),
        }
    }
}

/// Stands in for a CPU-bound embedding pass.
struct SlowRetriever;

impl Retriever for SlowRetriever {
    fn search(&self, _query: &str, _top_k: usize) -> Result<Vec<RetrievalHit>> {
        std::thread::sleep(Duration::from_millis(300));
        Ok(vec![hit(0, 0.05)])
    }
}

struct PanickingRetriever;

impl Retriever for PanickingRetriever {
    fn search(&self, _query: &str, _top_k: usize) -> Result<Vec<RetrievalHit>> { panic!("index corrupted") }
}

struct EchoGenerator {
    prompts: Mutex<Vec<Prompt>>,
}

#[async_trait]
impl Generator for EchoGenerator {
    fn name(&self) -> &str { "echo" }
    async fn complete(&self, prompt: &Prompt) -> Result<String> {
        self.prompts.lock().unwrap().push(prompt.clone());
        Ok("Fevers usually come from infections; rest and fluids help.".to_string())
    }
}

struct FailingGenerator;

#[async_trait]
impl Generator for FailingGenerator {
    fn name(&self) -> &str { "failing" }
    async fn complete(&self, _prompt: &Prompt) -> Result<String> { Err(Error::Synthesis("quota exceeded".into())) }
}

struct StalledGenerator;

#[async_trait]
impl Generator for StalledGenerator {
    fn name(&self) -> &str { "stalled" }
    async fn complete(&self, _prompt: &Prompt) -> Result<String> {
        tokio::time::sleep(Duration::from_secs(30)).await;
        Ok("too late".to_string())
    }
}

struct BrokenScorer;

impl RiskScorer for BrokenScorer {
    fn name(&self) -> &'static str { "broken" }
    fn score(&self, _input: &ScoringInput<'_>) -> Result<ConfidenceResult> { Err(Error::Retrieval("embedder down".into())) }
}

fn assembler(retriever: Arc<FakeRetriever>) -> ResponseAssembler {
    ResponseAssembler::new(retriever, corpus(), Arc::new(DistanceConfidence))
}

#[tokio::test]
async fn fever_scenario_answers_directly() {
    let result = assembler(FakeRetriever::hits(vec![hit(0, 0.05), hit(1, 1.3)])).answer("Why do I have a fever?").await;
    assert_eq!(result.answer, FEVER_ANSWER);
    let c = result.confidence.unwrap();
    assert!((c - 0.951).abs() < 1e-3, "{c}");
    assert_eq!(result.hallucination_risk, Some(RiskLevel::Low));
    assert_eq!(result.sources.len(), 2);
    assert_eq!(result.sources[0].title, "Clinical FAQ: What causes fever?");
    assert_eq!(result.sources[0].snippet, FEVER_ANSWER);
    assert_eq!(result.sources[1].title, "Clinical FAQ: What helps a headache?");
    assert!(result.sources.iter().all(|s| s.url.is_none()));
    assert!(result.error.is_none());
    assert!(result.fallback_used.is_none());
}

#[tokio::test]
async fn retrieval_failure_degrades_to_fixed_answer() {
    let retriever = FakeRetriever::failing();
    let result = assembler(Arc::clone(&retriever)).answer("fever").await;
    assert_eq!(result.answer, KNOWLEDGE_BASE_UNAVAILABLE);
    assert_eq!(result.confidence, Some(0.0));
    assert_eq!(result.hallucination_risk, Some(RiskLevel::High));
    assert!(result.sources.is_empty());
    let error = result.error.unwrap();
    assert!(!error.is_empty() && error.contains("index offline"));
    assert_eq!(retriever.calls.load(Ordering::SeqCst), 1, "no retry");
}

#[tokio::test]
async fn all_hits_out_of_range_is_no_match() {
    let result = assembler(FakeRetriever::hits(vec![hit(7, 0.01), hit(99, 0.2)])).answer("fever").await;
    assert_eq!(result.answer, INSUFFICIENT_INFORMATION);
    assert_eq!(result.confidence, Some(0.2));
    assert_eq!(result.hallucination_risk, Some(RiskLevel::Medium));
    assert!(result.sources.is_empty());
    assert!(result.error.is_none());
}

#[tokio::test]
async fn out_of_range_hits_are_dropped_and_rank_kept() {
    let result = assembler(FakeRetriever::hits(vec![hit(5, 0.0), hit(1, 0.5), hit(0, 0.7)])).answer("headache").await;
    assert_eq!(result.answer, HEADACHE_ANSWER);
    assert_eq!(result.confidence, Some(confidence::confidence(0.5)));
    assert_eq!(result.hallucination_risk, Some(RiskLevel::Medium));
    let titles: Vec<_> = result.sources.iter().map(|s| s.title.as_str()).collect();
    assert_eq!(titles, vec!["Clinical FAQ: What helps a headache?", "Clinical FAQ: What causes fever?"]);
}

#[tokio::test]
async fn empty_result_set_is_no_match() {
    let result = assembler(FakeRetriever::hits(Vec::new())).answer("anything").await;
    assert_eq!(result.answer, INSUFFICIENT_INFORMATION);
    assert!(result.error.is_none());
}

#[tokio::test]
async fn top_k_is_passed_to_the_retriever() {
    let retriever = FakeRetriever::hits(vec![hit(0, 0.1), hit(1, 0.2)]);
    let result = assembler(retriever)
        .with_config(AssemblerConfig { top_k: 1, ..Default::default() })
        .answer("fever")
        .await;
    assert_eq!(result.sources.len(), 1);
}

#[tokio::test]
async fn synthesis_success_uses_generator_output() {
    let generator = Arc::new(EchoGenerator { prompts: Mutex::new(Vec::new()) });
    let result = assembler(FakeRetriever::hits(vec![hit(0, 0.05), hit(1, 1.3)]))
        .with_generator(Some(generator.clone()))
        .answer("Why do I have a fever?")
        .await;
    assert_eq!(result.answer, "Fevers usually come from infections; rest and fluids help.");
    assert_eq!(result.fallback_used, Some(false));
    assert_eq!(result.confidence, Some(confidence::confidence(0.05)));
    assert_eq!(result.sources.len(), 2);

    let prompts = generator.prompts.lock().unwrap();
    assert_eq!(prompts.len(), 1, "exactly one generator call");
    assert!(prompts[0].user.contains("Q: What causes fever?\nA: Fever is commonly caused by infection."));
    assert!(prompts[0].user.contains("Why do I have a fever?"));
}

#[tokio::test]
async fn synthesis_failure_falls_back_with_unchanged_confidence() {
    let result = assembler(FakeRetriever::hits(vec![hit(0, 0.05), hit(1, 1.3)]))
        .with_generator(Some(Arc::new(FailingGenerator)))
        .answer("Why do I have a fever?")
        .await;
    assert_eq!(result.fallback_used, Some(true));
    assert!(result.answer.starts_with(FEVER_ANSWER));
    assert!(result.answer.contains(SYNTHESIS_FALLBACK_NOTE));
    assert_eq!(result.confidence, Some(confidence::confidence(0.05)));
    assert_eq!(result.hallucination_risk, Some(RiskLevel::Low));
    assert!(result.error.is_none());
}

#[tokio::test]
async fn synthesis_timeout_is_a_fallback() {
    let result = assembler(FakeRetriever::hits(vec![hit(0, 0.05)]))
        .with_generator(Some(Arc::new(StalledGenerator)))
        .with_config(AssemblerConfig { top_k: 3, synthesis_timeout: Duration::from_millis(20) })
        .answer("fever")
        .await;
    assert_eq!(result.fallback_used, Some(true));
    assert!(result.answer.starts_with(FEVER_ANSWER));
}

#[tokio::test]
async fn scorer_failure_leaves_confidence_empty() {
    let result = ResponseAssembler::new(FakeRetriever::hits(vec![hit(0, 0.05)]), corpus(), Arc::new(BrokenScorer))
        .answer("fever")
        .await;
    assert_eq!(result.answer, FEVER_ANSWER);
    assert!(result.confidence.is_none());
    assert!(result.hallucination_risk.is_none());
    assert_eq!(result.sources.len(), 1);
}

#[tokio::test]
async fn repeated_queries_are_identical() {
    let generator = Arc::new(EchoGenerator { prompts: Mutex::new(Vec::new()) });
    let a = assembler(FakeRetriever::hits(vec![hit(0, 0.05), hit(1, 1.3)])).with_generator(Some(generator));
    let first = a.answer("Why do I have a fever?").await;
    let second = a.answer("Why do I have a fever?").await;
    assert_eq!(first, second);
}

#[tokio::test]
async fn concurrent_queries_share_one_assembler() {
    let a = Arc::new(assembler(FakeRetriever::hits(vec![hit(1, 0.3)])));
    let tasks: Vec<_> = (0..8)
        .map(|_| {
            let a = Arc::clone(&a);
            tokio::spawn(async move { a.answer("headache").await })
        })
        .collect();
    for t in tasks {
        assert_eq!(t.await.unwrap().answer, HEADACHE_ANSWER);
    }
}

#[tokio::test]
async fn slow_retrieval_does_not_stall_the_runtime() {
    let a = ResponseAssembler::new(Arc::new(SlowRetriever), corpus(), Arc::new(DistanceConfidence));
    let timer = async {
        let start = std::time::Instant::now();
        tokio::time::sleep(Duration::from_millis(10)).await;
        start.elapsed()
    };
    let (result, waited) = tokio::join!(a.answer("fever"), timer);
    assert_eq!(result.answer, FEVER_ANSWER);
    assert!(waited < Duration::from_millis(150), "timer waited {waited:?}");
}

#[tokio::test]
async fn panicking_retriever_degrades_to_fixed_answer() {
    let result = ResponseAssembler::new(Arc::new(PanickingRetriever), corpus(), Arc::new(DistanceConfidence))
        .answer("fever")
        .await;
    assert_eq!(result.answer, KNOWLEDGE_BASE_UNAVAILABLE);
    assert_eq!(result.hallucination_risk, Some(RiskLevel::High));
    assert!(result.error.is_some_and(|e| e.contains("retrieval task failed")));
}
