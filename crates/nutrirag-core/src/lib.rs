//! NutriRAG Core Library
//!
//! Clinical-guideline-grounded nutrition recommendations.
//!
//! # Features
//! - Deterministic nutrition targets (Mifflin-St Jeor BMR, TDEE, macros)
//! - Renal protein caps by eGFR band
//! - Guideline retrieval over Qdrant or an in-memory corpus
//! - Grounded generation through OpenAI-compatible endpoints
//! - Daily, weekly and monthly dietary budgets

pub mod budget;
pub mod config;
pub mod error;
pub mod generation;
pub mod index;
pub mod labs;
pub mod llm;
pub mod recommend;
pub mod retrieval;
pub mod targets;

pub use budget::{BudgetPeriod, DailyBudget, DietaryBudget, PeriodTotals};
pub use config::{
    Config, IndexBackend, LLMServiceConfig, RetrievalConfig, TargetsPolicy, VectorIndexConfig,
};
pub use error::{Error, NutriRagError, Result};
pub use generation::{GroundedAnswer, GroundedGenerator};
pub use index::{
    GuidelineFilter, GuidelinePassage, IndexStats, MemoryIndex, QdrantIndex, ScoredPassage,
    VectorIndex,
};
pub use labs::{LabPanel, NutrientLimits};
pub use llm::{
    ChatMessage, CompletionRequest, Embedder, Generator, HttpEmbedder, HttpGenerator,
    HttpLLMClient, LLMClient,
};
pub use recommend::{
    Grounding, Probe, RecommendationRequest, RecommendationResponse, Recommender, ServiceStatus,
    MEDICAL_DISCLAIMER,
};
pub use retrieval::{RetrievedContext, Retriever};
pub use targets::renal::RenalAssessment;
pub use targets::{compute_targets, ActivityLevel, NutritionTargets, Sex, UserProfile};

/// Default config directory name
pub const CONFIG_DIR_NAME: &str = "nutrirag";
