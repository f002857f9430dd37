//! Vector index over pre-embedded guideline passages
//!
//! The corpus is built outside this crate and is read-only here. Two backends:
//! - `QdrantIndex`: Qdrant REST API
//! - `MemoryIndex`: a JSON corpus held in memory, brute-force cosine search

mod memory;
mod qdrant;

pub use memory::MemoryIndex;
pub use qdrant::QdrantIndex;

use crate::error::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// One passage of a clinical guideline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GuidelinePassage {
    pub id: String,
    /// Guideline family, e.g. ADA, AHA, DASH, KDIGO
    pub guideline: String,
    /// Source document the passage was cut from
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub document: Option<String>,
    pub text: String,
    #[serde(default, skip_serializing)]
    pub embedding: Vec<f32>,
}

/// A passage with its similarity to the query
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredPassage {
    pub passage: GuidelinePassage,
    pub score: f32,
}

/// Restricts a search to some guideline families
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GuidelineFilter {
    pub guidelines: Vec<String>,
}

impl GuidelineFilter {
    pub fn new<I, S>(guidelines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            guidelines: guidelines.into_iter().map(Into::into).collect(),
        }
    }

    pub fn matches(&self, passage: &GuidelinePassage) -> bool {
        self.guidelines.is_empty()
            || self
                .guidelines
                .iter()
                .any(|g| g.eq_ignore_ascii_case(&passage.guideline))
    }
}

/// Reachability and size of an index
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexStats {
    pub backend: String,
    pub passage_count: usize,
}

/// Nearest-neighbour search over guideline passages
#[async_trait]
pub trait VectorIndex: Send + Sync {
    /// Top-`k` passages by similarity to `vector`
    async fn search(
        &self,
        vector: &[f32],
        k: usize,
        filter: Option<&GuidelineFilter>,
    ) -> Result<Vec<ScoredPassage>>;

    /// Probe the index
    async fn stats(&self) -> Result<IndexStats>;

    /// Backend name
    fn name(&self) -> &str;
}

/// Cosine similarity; 0.0 for mismatched or zero-length vectors
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    dot / (norm_a * norm_b)
}

/// Order by descending score, ties by passage id ascending
pub fn rank_order(a: &ScoredPassage, b: &ScoredPassage) -> Ordering {
    b.score
        .partial_cmp(&a.score)
        .unwrap_or(Ordering::Equal)
        .then_with(|| a.passage.id.cmp(&b.passage.id))
}
