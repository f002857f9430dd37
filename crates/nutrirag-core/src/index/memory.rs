//! In-memory vector index over a pre-embedded corpus

use super::{
    cosine_similarity, rank_order, GuidelineFilter, GuidelinePassage, IndexStats, ScoredPassage,
    VectorIndex,
};
use crate::error::{NutriRagError, Result};
use async_trait::async_trait;
use std::path::Path;

/// Read-only passages searched by brute-force cosine similarity
pub struct MemoryIndex {
    passages: Vec<GuidelinePassage>,
}

impl MemoryIndex {
    pub fn new(passages: Vec<GuidelinePassage>) -> Self {
        Self { passages }
    }

    /// Load a JSON array of passages with their embeddings
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            NutriRagError::IndexUnavailable(format!(
                "cannot read corpus {}: {}",
                path.display(),
                e
            ))
        })?;
        let passages: Vec<GuidelinePassage> = serde_json::from_str(&content)?;

        if let Some(bad) = passages.iter().find(|p| p.embedding.is_empty()) {
            return Err(NutriRagError::IndexUnavailable(format!(
                "passage {} in {} has no embedding",
                bad.id,
                path.display()
            )));
        }

        tracing::info!("Loaded {} guideline passages from {}", passages.len(), path.display());
        Ok(Self::new(passages))
    }

    pub fn len(&self) -> usize {
        self.passages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.passages.is_empty()
    }
}

#[async_trait]
impl VectorIndex for MemoryIndex {
    async fn search(
        &self,
        vector: &[f32],
        k: usize,
        filter: Option<&GuidelineFilter>,
    ) -> Result<Vec<ScoredPassage>> {
        let mut scored: Vec<ScoredPassage> = self
            .passages
            .iter()
            .filter(|p| filter.map_or(true, |f| f.matches(p)))
            .map(|p| ScoredPassage {
                score: cosine_similarity(vector, &p.embedding),
                passage: p.clone(),
            })
            .collect();

        scored.sort_by(rank_order);
        scored.truncate(k);
        Ok(scored)
    }

    async fn stats(&self) -> Result<IndexStats> {
        Ok(IndexStats {
            backend: self.name().to_string(),
            passage_count: self.passages.len(),
        })
    }

    fn name(&self) -> &str {
        "memory"
    }
}
