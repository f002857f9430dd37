//! Recommendation orchestration
//!
//! One request flows through: targets engine (when a profile is present),
//! retriever, grounded generator. Retrieval failures degrade to ungrounded
//! generation with a caveat; validation and generation failures end the
//! request.

use crate::config::{Config, IndexBackend, TargetsPolicy};
use crate::error::{NutriRagError, Result};
use crate::generation::GroundedGenerator;
use crate::index::{GuidelineFilter, IndexStats, MemoryIndex, QdrantIndex, VectorIndex};
use crate::labs::{LabPanel, NutrientLimits};
use crate::llm::{HttpEmbedder, HttpGenerator, HttpLLMClient, LLMClient};
use crate::retrieval::{RetrievedContext, Retriever};
use crate::targets::renal::RenalAssessment;
use crate::targets::{compute_targets, NutritionTargets, UserProfile};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

/// Query used when only a profile is supplied
pub const DEFAULT_TARGETS_QUERY: &str = "provide dietary recommendations based on these targets";

pub const MEDICAL_DISCLAIMER: &str = "IMPORTANT DISCLAIMER: This information is for educational \
purposes only and is not intended as medical advice, diagnosis, or treatment. Always consult with \
a qualified healthcare provider before making any changes to your diet, exercise, or medication \
regimen. The recommendations provided are based on general clinical guidelines and may not be \
appropriate for your specific health situation.";

/// Free text and/or profile and lab values
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RecommendationRequest {
    #[serde(default)]
    pub query: Option<String>,
    #[serde(default)]
    pub profile: Option<UserProfile>,
    #[serde(default)]
    pub labs: Option<LabPanel>,
    /// Overrides the configured number of passages
    #[serde(default)]
    pub top_k: Option<usize>,
}

/// Whether and how the answer is backed by retrieved guidelines
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Grounding {
    Grounded { passages: usize },
    NoSources,
    RetrievalFailed { reason: String },
}

impl Grounding {
    pub fn is_grounded(&self) -> bool {
        matches!(self, Self::Grounded { .. })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecommendationResponse {
    pub recommendation: String,
    pub context: RetrievedContext,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub targets: Option<NutritionTargets>,
    pub grounding: Grounding,
    pub cited_sources: Vec<String>,
    /// What safety context was and was not applied
    pub safety_notes: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lab_summary: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nutrient_limits: Option<NutrientLimits>,
    pub disclaimer: String,
}

/// Result of probing one external dependency
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Probe {
    pub healthy: bool,
    pub detail: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceStatus {
    pub index: Probe,
    pub embedder: Probe,
    pub embedding_model: String,
    pub generation_model: String,
}

impl ServiceStatus {
    pub fn is_healthy(&self) -> bool {
        self.index.healthy && self.embedder.healthy
    }
}

/// Top-level coordinator for recommendations
pub struct Recommender {
    retriever: Retriever,
    generator: GroundedGenerator,
    policy: TargetsPolicy,
    default_k: usize,
}

impl Recommender {
    pub fn new(
        retriever: Retriever,
        generator: GroundedGenerator,
        policy: TargetsPolicy,
        default_k: usize,
    ) -> Self {
        Self {
            retriever,
            generator,
            policy,
            default_k,
        }
    }

    /// Wire the HTTP clients and the configured vector index
    pub fn from_config(config: &Config) -> Result<Self> {
        let client: Arc<dyn LLMClient> = Arc::new(HttpLLMClient::new(config.llm_service.clone())?);
        let embedder = Arc::new(HttpEmbedder::new(client.clone()));
        let generator = Arc::new(HttpGenerator::new(client));

        let index: Arc<dyn VectorIndex> = match config.vector_index.backend {
            IndexBackend::Qdrant => Arc::new(QdrantIndex::new(config.vector_index.clone())?),
            IndexBackend::Memory => {
                let path = config.vector_index.corpus_path.as_ref().ok_or_else(|| {
                    NutriRagError::Config("vector_index.corpus_path is not set".to_string())
                })?;
                Arc::new(MemoryIndex::load(path)?)
            }
        };

        let retriever = Retriever::new(
            embedder,
            index,
            &config.retrieval,
            config.vector_index.timeout(),
        );
        let generator = GroundedGenerator::new(generator, &config.llm_service);

        Ok(Self::new(
            retriever,
            generator,
            config.targets,
            config.retrieval.top_k,
        ))
    }

    pub fn policy(&self) -> &TargetsPolicy {
        &self.policy
    }

    /// Deterministic targets for a profile
    pub fn compute_targets(&self, profile: &UserProfile) -> Result<NutritionTargets> {
        compute_targets(profile, &self.policy)
    }

    /// Run one recommendation request.
    ///
    /// # Errors
    ///
    /// `Validation` for bad input (never retried into a guess), `Generation`
    /// when no narrative could be produced. Retrieval failures do not fail the
    /// request.
    pub async fn handle(&self, request: &RecommendationRequest) -> Result<RecommendationResponse> {
        let labs = request.labs.as_ref().filter(|l| !l.is_empty());
        if let Some(labs) = labs {
            labs.validate()?;
        }

        let targets = match request.profile {
            Some(ref profile) => Some(self.compute_targets(&effective_profile(profile, labs))?),
            None => None,
        };

        let query = resolve_query(request, labs, targets.is_some())?;
        let k = match request.top_k {
            Some(0) => return Err(NutriRagError::validation("top_k must be at least 1")),
            Some(k) => k,
            None => self.default_k,
        };
        let filter = guideline_filter(labs, targets.as_ref());

        tracing::info!(
            k,
            has_profile = targets.is_some(),
            has_labs = labs.is_some(),
            "Handling recommendation request"
        );

        let (context, grounding) = match self
            .retriever
            .retrieve_filtered(&query, k, filter.as_ref())
            .await
        {
            Ok(context) if context.is_empty() => (context, Grounding::NoSources),
            Ok(context) => {
                let passages = context.len();
                (context, Grounding::Grounded { passages })
            }
            Err(e) => {
                tracing::warn!("Retrieval failed, generating without grounding: {}", e);
                (
                    RetrievedContext::default(),
                    Grounding::RetrievalFailed {
                        reason: e.to_string(),
                    },
                )
            }
        };

        let answer = self
            .generator
            .generate(&query, &context, targets.as_ref())
            .await?;

        let safety_notes = safety_notes(&grounding, &context, targets.as_ref());
        let lab_summary = labs.map(LabPanel::summary);
        let nutrient_limits = targets
            .as_ref()
            .map(|t| labs.cloned().unwrap_or_default().nutrient_limits(t.tdee));

        Ok(RecommendationResponse {
            recommendation: answer.text,
            context,
            targets,
            grounding,
            cited_sources: answer.cited_sources,
            safety_notes,
            lab_summary,
            nutrient_limits,
            disclaimer: MEDICAL_DISCLAIMER.to_string(),
        })
    }

    /// Probe the vector index and embedding service; failures are reported
    pub async fn status(&self, timeout: Duration) -> ServiceStatus {
        let index = match tokio::time::timeout(timeout, self.retriever.index().stats()).await {
            Ok(Ok(IndexStats {
                backend,
                passage_count,
            })) => Probe {
                healthy: true,
                detail: format!("{}: {} passages", backend, passage_count),
            },
            Ok(Err(e)) => Probe {
                healthy: false,
                detail: e.to_string(),
            },
            Err(_) => Probe {
                healthy: false,
                detail: "timed out".to_string(),
            },
        };

        let embedder = self.retriever.embedder();
        let embedder_probe =
            match tokio::time::timeout(timeout, embedder.embed("health check")).await {
                Ok(Ok(vector)) => Probe {
                    healthy: true,
                    detail: format!("{} dimensions", vector.len()),
                },
                Ok(Err(e)) => Probe {
                    healthy: false,
                    detail: e.to_string(),
                },
                Err(_) => Probe {
                    healthy: false,
                    detail: "timed out".to_string(),
                },
            };

        ServiceStatus {
            index,
            embedder: embedder_probe,
            embedding_model: embedder.model_name().to_string(),
            generation_model: self.generator.model_name().to_string(),
        }
    }
}

/// Profile with the lab eGFR folded in; the lower reading wins
pub fn effective_profile(profile: &UserProfile, labs: Option<&LabPanel>) -> UserProfile {
    let lab_egfr = labs.and_then(|l| l.egfr);
    let egfr = match (profile.egfr, lab_egfr) {
        (Some(a), Some(b)) => Some(a.min(b)),
        (a, b) => a.or(b),
    };
    UserProfile {
        egfr,
        ..profile.clone()
    }
}

fn resolve_query(
    request: &RecommendationRequest,
    labs: Option<&LabPanel>,
    has_targets: bool,
) -> Result<String> {
    if let Some(query) = request.query.as_deref().map(str::trim).filter(|q| !q.is_empty()) {
        return Ok(query.to_string());
    }
    if let Some(labs) = labs {
        return Ok(labs.build_query());
    }
    if has_targets {
        return Ok(DEFAULT_TARGETS_QUERY.to_string());
    }
    Err(NutriRagError::validation(
        "request must include a query, a user profile or lab values",
    ))
}

fn guideline_filter(
    labs: Option<&LabPanel>,
    targets: Option<&NutritionTargets>,
) -> Option<GuidelineFilter> {
    let mut guidelines = labs?.relevant_guidelines();
    if guidelines == ["GENERAL"] {
        return None;
    }
    if targets.is_some_and(|t| t.renal.is_restricted()) && !guidelines.iter().any(|g| g == "KDIGO")
    {
        guidelines.push("KDIGO".to_string());
    }
    Some(GuidelineFilter::new(guidelines))
}

fn safety_notes(
    grounding: &Grounding,
    context: &RetrievedContext,
    targets: Option<&NutritionTargets>,
) -> Vec<String> {
    let mut notes = Vec::new();

    notes.push(match grounding {
        Grounding::Grounded { passages } => format!(
            "Grounded in {} guideline passage(s) from {}.",
            passages,
            context.guidelines().join(", ")
        ),
        Grounding::NoSources => "No clinical guideline source matched this query; the \
            recommendation is not grounded in a retrieved guideline."
            .to_string(),
        Grounding::RetrievalFailed { reason } => format!(
            "Guideline retrieval failed ({}); the recommendation is not grounded in a retrieved guideline.",
            reason
        ),
    });

    match targets.map(|t| &t.renal) {
        None => notes.push(
            "No user profile provided; no nutrition targets were calculated.".to_string(),
        ),
        Some(RenalAssessment::NotEvaluated) => notes.push(
            "No eGFR provided; renal protein adjustment was not evaluated.".to_string(),
        ),
        Some(RenalAssessment::NoRestriction { egfr }) => notes.push(format!(
            "eGFR {}: no renal protein restriction applied.",
            egfr
        )),
        Some(RenalAssessment::Restricted {
            egfr,
            stage,
            protein_cap_g_per_kg,
            capped,
            nephrology_referral,
        }) => {
            if *capped {
                notes.push(format!(
                    "Renal protein cap applied: eGFR {} (CKD stage {}) limits protein to {} g/kg.",
                    egfr, stage, protein_cap_g_per_kg
                ));
            } else {
                notes.push(format!(
                    "eGFR {} (CKD stage {}): baseline protein already within the {} g/kg cap.",
                    egfr, stage, protein_cap_g_per_kg
                ));
            }
            if *nephrology_referral {
                notes.push("Nephrology referral recommended.".to_string());
            }
        }
    }

    notes
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::targets::{ActivityLevel, Sex};

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

    #[test]
    fn test_effective_profile_takes_lower_egfr() {
        let labs = LabPanel {
            egfr: Some(40.0),
            ..Default::default()
        };
        assert_eq!(effective_profile(&profile(Some(70.0)), Some(&labs)).egfr, Some(40.0));
        assert_eq!(effective_profile(&profile(None), Some(&labs)).egfr, Some(40.0));
        assert_eq!(effective_profile(&profile(Some(25.0)), None).egfr, Some(25.0));
    }

    #[test]
    fn test_resolve_query_precedence() {
        let request = RecommendationRequest {
            query: Some("  low sodium snacks ".into()),
            ..Default::default()
        };
        assert_eq!(resolve_query(&request, None, false).unwrap(), "low sodium snacks");

        let blank = RecommendationRequest {
            query: Some("   ".into()),
            ..Default::default()
        };
        assert_eq!(
            resolve_query(&blank, None, true).unwrap(),
            DEFAULT_TARGETS_QUERY
        );
        assert!(matches!(
            resolve_query(&blank, None, false),
            Err(NutriRagError::Validation(_))
        ));
    }

    #[test]
    fn test_filter_only_for_specific_labs() {
        assert!(guideline_filter(None, None).is_none());
        let general = LabPanel {
            bmi: Some(22.0),
            ..Default::default()
        };
        assert!(guideline_filter(Some(&general), None).is_none());

        let lipid = LabPanel {
            ldl: Some(150.0),
            ..Default::default()
        };
        let targets = compute_targets(&profile(Some(25.0)), &TargetsPolicy::default()).unwrap();
        let filter = guideline_filter(Some(&lipid), Some(&targets)).unwrap();
        assert_eq!(filter.guidelines, vec!["AHA", "LIPID", "KDIGO"]);
    }

    #[test]
    fn test_safety_notes_disclose_missing_context() {
        let notes = safety_notes(&Grounding::NoSources, &RetrievedContext::default(), None);
        assert_eq!(notes.len(), 2);
        assert!(notes[0].contains("not grounded"));
        assert!(notes[1].contains("no nutrition targets"));

        let targets = compute_targets(&profile(Some(10.0)), &TargetsPolicy::default()).unwrap();
        let notes = safety_notes(
            &Grounding::RetrievalFailed {
                reason: "index down".into(),
            },
            &RetrievedContext::default(),
            Some(&targets),
        );
        assert!(notes[0].contains("index down"));
        assert!(notes[1].starts_with("Renal protein cap applied"));
        assert_eq!(notes[2], "Nephrology referral recommended.");
    }
}
