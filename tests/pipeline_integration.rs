use inference::test_support::FakeModels;
use semantic::test_support::{FailingBackend, StaticBackend};
use std::sync::Arc;
use triage::{
    BackendKind, Capabilities, DEFAULT_THRESHOLD, DuplicateDetector, EmbeddingProvider,
    LazyBackend, NerSpan, PipelineError, PipelineOrchestrator, ScoredLabel, SentimentLabel,
};

fn provider(backends: Vec<LazyBackend>) -> Arc<EmbeddingProvider> {
    Arc::new(EmbeddingProvider::new(backends))
}

fn pipeline(models: FakeModels, embeddings: Arc<EmbeddingProvider>) -> PipelineOrchestrator {
    PipelineOrchestrator::new(Capabilities::shared(Arc::new(models)), embeddings)
}

#[tokio::test]
async fn bleeding_and_biting_report_is_maximally_urgent() {
    let models = FakeModels::default().with_spans(vec![
        NerSpan::new("LOC", "Chennai", 0.99),
        NerSpan::new("LOC", "chennai", 0.91),
    ]);
    let embeddings = provider(vec![LazyBackend::ready(
        BackendKind::Primary,
        Arc::new(StaticBackend::uniform("all-MiniLM-L6-v2", vec![1.0, 1.0])),
    )]);

    let result = pipeline(models, embeddings)
        .analyze("A dog was seen bleeding and biting near Chennai", Some("en"))
        .await
        .unwrap();

    assert_eq!(result.urgency_score, 1.0);
    assert_eq!(result.sentiment, SentimentLabel::Negative);
    assert_eq!(result.entities.locations, ["Chennai"]);
    assert_eq!(result.entities.symptoms, ["bite", "bleed"]);
}

#[tokio::test]
async fn symptom_extraction_is_deterministic() {
    let embeddings = provider(Vec::new());
    let orchestrator = pipeline(FakeModels::default(), embeddings);
    let text = "Weak, vomiting puppy with mange and a swollen leg";

    let first = orchestrator.analyze(text, None).await.unwrap();
    let second = orchestrator.analyze(text, None).await.unwrap();
    assert_eq!(first.entities.symptoms, second.entities.symptoms);
    assert_eq!(first.entities.symptoms, ["mange", "swoll", "vomit", "weak"]);
}

#[tokio::test]
async fn unified_pipeline_and_duplicate_check_share_backends() {
    let primary = Arc::new(
        StaticBackend::new("all-MiniLM-L6-v2")
            .with_vector("Injured dog near the market", vec![1.0, 0.0, 0.0])
            .with_vector("Dog hurt next to market", vec![0.95, 0.05, 0.0])
            .with_vector("Puppy needs adoption", vec![0.0, 0.0, 1.0]),
    );
    let embeddings = provider(vec![LazyBackend::ready(
        BackendKind::Primary,
        primary.clone(),
    )]);

    let orchestrator = pipeline(
        FakeModels::default().with_categories(vec![
            ScoredLabel::new("injury case", 0.8),
            ScoredLabel::new("health concern", 0.1),
            ScoredLabel::new("general sighting", 0.05),
            ScoredLabel::new("bite incident", 0.05),
        ]),
        Arc::clone(&embeddings),
    );
    let detector = DuplicateDetector::new(Arc::clone(&embeddings));

    let analysis = orchestrator
        .analyze_unified("Injured dog near the market", None)
        .await
        .unwrap();
    assert_eq!(analysis.dim(), 3);
    assert_eq!(analysis.classification.len(), 3);

    let candidates = vec![
        "Puppy needs adoption".to_string(),
        "Dog hurt next to market".to_string(),
    ];
    let outcome = detector
        .find(&analysis.translated_text, &candidates, DEFAULT_THRESHOLD)
        .await;
    assert!(!outcome.is_degraded());
    let result = outcome.into_value();
    assert!(result.is_duplicate);
    assert_eq!(result.matches.len(), 1);
    assert_eq!(result.matches[0].text, "Dog hurt next to market");

    // One call for the pipeline, one batch for query plus candidates.
    assert_eq!(primary.calls(), 2);
}

#[tokio::test]
async fn duplicate_check_with_no_candidates_never_embeds() {
    let primary = Arc::new(StaticBackend::uniform("all-MiniLM-L6-v2", vec![1.0]));
    let detector = DuplicateDetector::new(provider(vec![LazyBackend::ready(
        BackendKind::Primary,
        primary.clone(),
    )]));

    for threshold in [-1.0, 0.0, DEFAULT_THRESHOLD, 1.0] {
        let result = detector.find("any report", &[], threshold).await.into_value();
        assert!(!result.is_duplicate);
        assert!(result.matches.is_empty());
    }
    assert_eq!(primary.calls(), 0);
}

#[tokio::test]
async fn embed_is_a_hard_error_while_pipeline_degrades() {
    let embeddings = provider(vec![
        LazyBackend::ready(
            BackendKind::Primary,
            Arc::new(FailingBackend::new("all-MiniLM-L6-v2")),
        ),
        LazyBackend::ready(
            BackendKind::Secondary,
            Arc::new(FailingBackend::new("bge-small-en-v1.5")),
        ),
    ]);
    let orchestrator = pipeline(FakeModels::default(), embeddings);

    assert!(matches!(
        orchestrator.embed("dog").await,
        Err(PipelineError::ResourceUnavailable(_))
    ));

    let analysis = orchestrator
        .analyze_unified("dog near temple", None)
        .await
        .unwrap();
    assert!(analysis.embedding.is_none());
}

#[tokio::test]
async fn blank_pipeline_input_is_validation_error() {
    let models = Arc::new(FakeModels::default());
    let orchestrator = PipelineOrchestrator::new(
        Capabilities::shared(models.clone()),
        provider(Vec::new()),
    );

    for text in ["", "   ", "\n\t"] {
        assert!(matches!(
            orchestrator.analyze_unified(text, None).await,
            Err(PipelineError::Validation(_))
        ));
    }
    assert_eq!(models.calls(), 0);
}
