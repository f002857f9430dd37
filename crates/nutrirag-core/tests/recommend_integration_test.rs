//! End-to-end recommendation pipeline with in-process fakes
//!
//! The embedder, index and generator are replaced by local implementations so
//! the orchestration, degradation and safety behaviour can be checked without
//! any running service.

use async_trait::async_trait;
use nutrirag_core::generation::NO_SOURCE_DISCLAIMER;
use nutrirag_core::{
    ActivityLevel, CompletionRequest, Embedder, Generator, GroundedGenerator, Grounding,
    GuidelineFilter, GuidelinePassage, IndexStats, LLMServiceConfig, LabPanel, MemoryIndex,
    NutriRagError, RecommendationRequest, Recommender, RenalAssessment, RetrievalConfig, Retriever,
    Result, ScoredPassage, Sex, TargetsPolicy, UserProfile, VectorIndex, MEDICAL_DISCLAIMER,
};
use std::sync::{Arc, Mutex};
use std::time::Duration;

struct FixedEmbedder;

#[async_trait]
impl Embedder for FixedEmbedder {
    async fn embed(&self, _text: &str) -> Result<Vec<f32>> {
        Ok(vec![1.0, 0.0])
    }

    fn dimensions(&self) -> Option<usize> {
        Some(2)
    }

    fn model_name(&self) -> &str {
        "fixed-embedder"
    }
}

struct StalledEmbedder;

#[async_trait]
impl Embedder for StalledEmbedder {
    async fn embed(&self, _text: &str) -> Result<Vec<f32>> {
        tokio::time::sleep(Duration::from_secs(3600)).await;
        Ok(vec![1.0, 0.0])
    }

    fn dimensions(&self) -> Option<usize> {
        Some(2)
    }

    fn model_name(&self) -> &str {
        "stalled-embedder"
    }
}

struct UnavailableIndex;

#[async_trait]
impl VectorIndex for UnavailableIndex {
    async fn search(
        &self,
        _vector: &[f32],
        _k: usize,
        _filter: Option<&GuidelineFilter>,
    ) -> Result<Vec<ScoredPassage>> {
        Err(NutriRagError::IndexUnavailable("connection refused".into()))
    }

    async fn stats(&self) -> Result<IndexStats> {
        Err(NutriRagError::IndexUnavailable("connection refused".into()))
    }

    fn name(&self) -> &str {
        "unavailable"
    }
}

/// Returns a canned answer and keeps every prompt it was given
struct RecordingGenerator {
    answer: String,
    requests: Mutex<Vec<CompletionRequest>>,
}

impl RecordingGenerator {
    fn new(answer: &str) -> Arc<Self> {
        Arc::new(Self {
            answer: answer.to_string(),
            requests: Mutex::new(Vec::new()),
        })
    }

    fn calls(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    fn last_user_prompt(&self) -> String {
        let requests = self.requests.lock().unwrap();
        requests.last().unwrap().messages[1].content.clone()
    }
}

#[async_trait]
impl Generator for RecordingGenerator {
    async fn complete(&self, request: &CompletionRequest) -> Result<String> {
        self.requests.lock().unwrap().push(request.clone());
        Ok(self.answer.clone())
    }

    fn model_name(&self) -> &str {
        "recording"
    }
}

struct StalledGenerator;

#[async_trait]
impl Generator for StalledGenerator {
    async fn complete(&self, _request: &CompletionRequest) -> Result<String> {
        tokio::time::sleep(Duration::from_secs(3600)).await;
        Ok("too late".into())
    }

    fn model_name(&self) -> &str {
        "stalled"
    }
}

fn passage(id: &str, guideline: &str, text: &str, embedding: Vec<f32>) -> GuidelinePassage {
    GuidelinePassage {
        id: id.to_string(),
        guideline: guideline.to_string(),
        document: Some(format!("{}.pdf", guideline.to_lowercase())),
        text: text.to_string(),
        embedding,
    }
}

fn corpus() -> Vec<GuidelinePassage> {
    vec![
        passage(
            "kdigo-1",
            "KDIGO",
            "Adults with CKD G3-G5 should limit protein to 0.8 g/kg/day.",
            vec![1.0, 0.0],
        ),
        passage(
            "ada-1",
            "ADA",
            "Emphasize non-starchy vegetables and minimize added sugars.",
            vec![0.9, 0.1],
        ),
        passage(
            "aha-1",
            "AHA",
            "Replace saturated fat with unsaturated fat to lower LDL cholesterol.",
            vec![0.8, 0.2],
        ),
        passage(
            "who-1",
            "WHO",
            "Unrelated passage about physical activity.",
            vec![0.0, 1.0],
        ),
    ]
}

fn recommender(
    index: Arc<dyn VectorIndex>,
    generator: Arc<dyn Generator>,
    generation_timeout: Duration,
) -> Recommender {
    let retriever = Retriever::new(
        Arc::new(FixedEmbedder),
        index,
        &RetrievalConfig::default(),
        Duration::from_secs(5),
    );
    let generator = GroundedGenerator::new(generator, &LLMServiceConfig::default())
        .with_timeout(generation_timeout);
    Recommender::new(retriever, generator, TargetsPolicy::default(), 5)
}

fn profile(egfr: Option<f64>) -> UserProfile {
    UserProfile {
        weight_kg: 70.0,
        height_cm: 175.0,
        age: 30,
        sex: Sex::Male,
        activity_level: ActivityLevel::Sedentary,
        egfr,
    }
}

#[tokio::test]
async fn test_renal_profile_is_capped_and_grounded() {
    let generator = RecordingGenerator::new("Following KDIGO guidance, keep protein near 42 g.");
    let rec = recommender(
        Arc::new(MemoryIndex::new(corpus())),
        generator.clone(),
        Duration::from_secs(30),
    );

    let request = RecommendationRequest {
        query: Some("What should I eat for dinner?".into()),
        profile: Some(profile(Some(25.0))),
        ..Default::default()
    };
    let response = rec.handle(&request).await.unwrap();

    let targets = response.targets.as_ref().unwrap();
    assert!((targets.protein_g - 42.0).abs() < 1e-9);
    assert!(matches!(targets.renal, RenalAssessment::Restricted { capped: true, .. }));

    assert_eq!(response.grounding, Grounding::Grounded { passages: 3 });
    assert_eq!(response.context.passages[0].passage.id, "kdigo-1");
    assert!(response.context.passages.iter().all(|p| p.passage.id != "who-1"));
    assert_eq!(response.cited_sources, vec!["KDIGO"]);
    assert_eq!(response.disclaimer, MEDICAL_DISCLAIMER);
    assert!(response
        .safety_notes
        .iter()
        .any(|n| n.starts_with("Renal protein cap applied")));

    let prompt = generator.last_user_prompt();
    assert!(prompt.contains("Protein: 42.0 g/day (0.60 g/kg)"));
    assert!(prompt.contains("[KDIGO] Adults with CKD G3-G5"));
    assert!(prompt.ends_with("What should I eat for dinner?"));
}

#[tokio::test]
async fn test_lab_egfr_applies_when_profile_has_none() {
    let generator = RecordingGenerator::new("Moderate protein intake.");
    let rec = recommender(
        Arc::new(MemoryIndex::new(corpus())),
        generator.clone(),
        Duration::from_secs(30),
    );

    let request = RecommendationRequest {
        profile: Some(profile(None)),
        labs: Some(LabPanel {
            egfr: Some(25.0),
            ..Default::default()
        }),
        ..Default::default()
    };
    let response = rec.handle(&request).await.unwrap();

    let targets = response.targets.unwrap();
    assert!((targets.protein_g - 42.0).abs() < 1e-9);
    // Only KDIGO passages match the lab-derived filter
    assert_eq!(response.context.guidelines(), vec!["KDIGO"]);
    assert!(response.lab_summary.unwrap().contains("eGFR 25"));
    assert!(response.nutrient_limits.is_some());
}

#[tokio::test]
async fn test_profile_only_uses_default_query() {
    let generator = RecordingGenerator::new("Balanced meals with ADA guidance.");
    let rec = recommender(
        Arc::new(MemoryIndex::new(corpus())),
        generator.clone(),
        Duration::from_secs(30),
    );

    let request = RecommendationRequest {
        profile: Some(profile(None)),
        ..Default::default()
    };
    let response = rec.handle(&request).await.unwrap();

    assert!(response.targets.is_some());
    assert!(generator
        .last_user_prompt()
        .ends_with("provide dietary recommendations based on these targets"));
    assert!(response
        .safety_notes
        .iter()
        .any(|n| n.contains("renal protein adjustment was not evaluated")));
}

#[tokio::test]
async fn test_lab_only_request_filters_guidelines() {
    let generator = RecordingGenerator::new("The AHA recommends replacing saturated fat.");
    let rec = recommender(
        Arc::new(MemoryIndex::new(corpus())),
        generator.clone(),
        Duration::from_secs(30),
    );

    let request = RecommendationRequest {
        labs: Some(LabPanel {
            ldl: Some(165.0),
            ..Default::default()
        }),
        ..Default::default()
    };
    let response = rec.handle(&request).await.unwrap();

    assert!(response.targets.is_none());
    assert!(response.nutrient_limits.is_none());
    assert_eq!(response.context.guidelines(), vec!["AHA"]);
    assert_eq!(response.cited_sources, vec!["AHA"]);
    assert!(generator
        .last_user_prompt()
        .contains("LDL cholesterol reduction dietary guidelines"));
}

#[tokio::test]
async fn test_empty_corpus_gets_disclaimer() {
    let generator = RecordingGenerator::new("Eat a variety of whole foods.");
    let rec = recommender(
        Arc::new(MemoryIndex::new(Vec::new())),
        generator.clone(),
        Duration::from_secs(30),
    );

    let request = RecommendationRequest {
        query: Some("healthy breakfast ideas".into()),
        ..Default::default()
    };
    let response = rec.handle(&request).await.unwrap();

    assert_eq!(response.grounding, Grounding::NoSources);
    assert!(response.context.is_empty());
    assert!(response.recommendation.starts_with(NO_SOURCE_DISCLAIMER));
    assert!(response.cited_sources.is_empty());
    assert!(generator
        .last_user_prompt()
        .contains("No clinical guideline passages were found"));
}

#[tokio::test]
async fn test_index_failure_degrades_to_ungrounded() {
    let generator = RecordingGenerator::new("General advice.");
    let rec = recommender(
        Arc::new(UnavailableIndex),
        generator.clone(),
        Duration::from_secs(30),
    );

    let request = RecommendationRequest {
        query: Some("low sodium snacks".into()),
        profile: Some(profile(Some(80.0))),
        ..Default::default()
    };
    let response = rec.handle(&request).await.unwrap();

    match response.grounding {
        Grounding::RetrievalFailed { ref reason } => assert!(reason.contains("connection refused")),
        ref other => panic!("unexpected grounding: {:?}", other),
    }
    assert!(response.context.is_empty());
    assert!(response.recommendation.starts_with(NO_SOURCE_DISCLAIMER));
    assert!(response.safety_notes[0].contains("Guideline retrieval failed"));
    assert_eq!(generator.calls(), 1);
}

#[tokio::test]
async fn test_invalid_profile_never_reaches_generation() {
    let generator = RecordingGenerator::new("unused");
    let rec = recommender(
        Arc::new(MemoryIndex::new(corpus())),
        generator.clone(),
        Duration::from_secs(30),
    );

    let mut bad = profile(None);
    bad.age = 0;
    let request = RecommendationRequest {
        query: Some("anything".into()),
        profile: Some(bad),
        ..Default::default()
    };
    let err = rec.handle(&request).await.unwrap_err();

    assert!(matches!(err, NutriRagError::Validation(_)));
    assert_eq!(generator.calls(), 0);
}

#[tokio::test]
async fn test_negative_lab_value_is_rejected() {
    let generator = RecordingGenerator::new("unused");
    let rec = recommender(
        Arc::new(MemoryIndex::new(corpus())),
        generator.clone(),
        Duration::from_secs(30),
    );

    let request = RecommendationRequest {
        labs: Some(LabPanel {
            a1c: Some(-1.0),
            ..Default::default()
        }),
        ..Default::default()
    };
    let err = rec.handle(&request).await.unwrap_err();
    assert!(matches!(err, NutriRagError::Validation(_)));
}

#[tokio::test]
async fn test_empty_request_is_rejected() {
    let generator = RecordingGenerator::new("unused");
    let rec = recommender(
        Arc::new(MemoryIndex::new(corpus())),
        generator.clone(),
        Duration::from_secs(30),
    );

    let err = rec
        .handle(&RecommendationRequest::default())
        .await
        .unwrap_err();
    assert!(matches!(err, NutriRagError::Validation(_)));
    assert_eq!(err.exit_code(), nutrirag_core::error::exit_codes::INVALID_INPUT);
}

#[tokio::test(start_paused = true)]
async fn test_embedding_timeout_degrades_to_ungrounded() {
    let generator = RecordingGenerator::new("General advice.");
    let retriever = Retriever::new(
        Arc::new(StalledEmbedder),
        Arc::new(MemoryIndex::new(corpus())),
        &RetrievalConfig::default(),
        Duration::from_secs(5),
    );
    let grounded = GroundedGenerator::new(generator.clone(), &LLMServiceConfig::default())
        .with_timeout(Duration::from_secs(30));
    let rec = Recommender::new(retriever, grounded, TargetsPolicy::default(), 5);

    let request = RecommendationRequest {
        query: Some("fiber sources".into()),
        profile: Some(profile(None)),
        ..Default::default()
    };
    let response = rec.handle(&request).await.unwrap();

    match response.grounding {
        Grounding::RetrievalFailed { ref reason } => assert!(reason.contains("timed out")),
        ref other => panic!("unexpected grounding: {:?}", other),
    }
    assert!(response.context.is_empty());
    assert!(response.recommendation.starts_with(NO_SOURCE_DISCLAIMER));
    assert_eq!(generator.calls(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_generation_timeout_is_generation_error() {
    let rec = recommender(
        Arc::new(MemoryIndex::new(corpus())),
        Arc::new(StalledGenerator),
        Duration::from_secs(5),
    );

    let request = RecommendationRequest {
        query: Some("fiber sources".into()),
        ..Default::default()
    };
    let err = rec.handle(&request).await.unwrap_err();

    assert!(matches!(err, NutriRagError::Generation(_)));
    assert!(err.is_retryable());
}

#[tokio::test]
async fn test_same_request_same_context_and_targets() {
    let generator = RecordingGenerator::new("KDIGO and ADA both apply.");
    let rec = recommender(
        Arc::new(MemoryIndex::new(corpus())),
        generator.clone(),
        Duration::from_secs(30),
    );

    let request = RecommendationRequest {
        query: Some("kidney friendly meals".into()),
        profile: Some(profile(Some(40.0))),
        ..Default::default()
    };
    let first = rec.handle(&request).await.unwrap();
    let second = rec.handle(&request).await.unwrap();

    assert_eq!(first.context, second.context);
    assert_eq!(first.targets, second.targets);
    assert_eq!(first.safety_notes, second.safety_notes);
}

#[tokio::test]
async fn test_status_reports_unhealthy_index() {
    let rec = recommender(
        Arc::new(UnavailableIndex),
        RecordingGenerator::new("unused"),
        Duration::from_secs(30),
    );

    let status = rec.status(Duration::from_secs(1)).await;
    assert!(!status.index.healthy);
    assert!(status.embedder.healthy);
    assert_eq!(status.embedder.detail, "2 dimensions");
    assert!(!status.is_healthy());
}
