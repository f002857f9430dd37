//! Guideline retrieval
//!
//! Embeds a query, searches the vector index, drops passages under the
//! similarity floor and returns the rest ranked by descending score with ties
//! broken by passage id.

use crate::config::RetrievalConfig;
use crate::error::{NutriRagError, Result};
use crate::index::{rank_order, GuidelineFilter, ScoredPassage, VectorIndex};
use crate::llm::Embedder;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

/// Ranked passages used for one request
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RetrievedContext {
    pub passages: Vec<ScoredPassage>,
}

impl RetrievedContext {
    pub fn is_empty(&self) -> bool {
        self.passages.is_empty()
    }

    pub fn len(&self) -> usize {
        self.passages.len()
    }

    /// Guideline names in ranking order, without repeats
    pub fn guidelines(&self) -> Vec<&str> {
        let mut seen: Vec<&str> = Vec::new();
        for scored in &self.passages {
            let name = scored.passage.guideline.as_str();
            if !seen.contains(&name) {
                seen.push(name);
            }
        }
        seen
    }
}

/// Embedder + vector index orchestration
pub struct Retriever {
    embedder: Arc<dyn Embedder>,
    index: Arc<dyn VectorIndex>,
    min_score: f32,
    embed_timeout: Duration,
    search_timeout: Duration,
}

impl Retriever {
    pub fn new(
        embedder: Arc<dyn Embedder>,
        index: Arc<dyn VectorIndex>,
        config: &RetrievalConfig,
        search_timeout: Duration,
    ) -> Self {
        Self {
            embedder,
            index,
            min_score: config.min_score,
            embed_timeout: config.embed_timeout(),
            search_timeout,
        }
    }

    pub fn index(&self) -> &dyn VectorIndex {
        self.index.as_ref()
    }

    pub fn embedder(&self) -> &dyn Embedder {
        self.embedder.as_ref()
    }

    /// Top-`k` passages for a query over the whole corpus
    pub async fn retrieve(&self, query: &str, k: usize) -> Result<RetrievedContext> {
        self.retrieve_filtered(query, k, None).await
    }

    /// Top-`k` passages restricted to some guideline families.
    ///
    /// # Errors
    ///
    /// `Embedding` when the embedding call fails, times out or returns an
    /// unusable vector; `IndexUnavailable` when the search fails or times out.
    pub async fn retrieve_filtered(
        &self,
        query: &str,
        k: usize,
        filter: Option<&GuidelineFilter>,
    ) -> Result<RetrievedContext> {
        if k == 0 {
            return Ok(RetrievedContext::default());
        }

        let vector = tokio::time::timeout(self.embed_timeout, self.embedder.embed(query))
            .await
            .map_err(|_| {
                NutriRagError::Embedding(format!(
                    "embedding timed out after {}s",
                    self.embed_timeout.as_secs_f32()
                ))
            })?
            .map_err(into_embedding_error)?;
        self.check_vector(&vector)?;

        let hits = tokio::time::timeout(self.search_timeout, self.index.search(&vector, k, filter))
            .await
            .map_err(|_| {
                NutriRagError::IndexUnavailable(format!(
                    "{} search timed out after {}s",
                    self.index.name(),
                    self.search_timeout.as_secs_f32()
                ))
            })?
            .map_err(into_index_error)?;

        let total = hits.len();
        let mut passages: Vec<ScoredPassage> = hits
            .into_iter()
            .filter(|hit| hit.score.is_finite() && hit.score >= self.min_score)
            .collect();
        passages.sort_by(rank_order);
        passages.truncate(k);

        tracing::debug!(
            index = self.index.name(),
            hits = total,
            kept = passages.len(),
            min_score = self.min_score,
            "Retrieved guideline passages"
        );

        Ok(RetrievedContext { passages })
    }

    fn check_vector(&self, vector: &[f32]) -> Result<()> {
        if vector.is_empty() {
            return Err(NutriRagError::Embedding("empty embedding returned".to_string()));
        }
        if let Some(expected) = self.embedder.dimensions() {
            if vector.len() != expected {
                return Err(NutriRagError::Embedding(format!(
                    "expected {} dimensions from {}, got {}",
                    expected,
                    self.embedder.model_name(),
                    vector.len()
                )));
            }
        }
        if vector.iter().any(|v| !v.is_finite()) {
            return Err(NutriRagError::Embedding(
                "embedding contains non-finite values".to_string(),
            ));
        }
        Ok(())
    }
}

fn into_embedding_error(err: NutriRagError) -> NutriRagError {
    match err {
        NutriRagError::Embedding(_) => err,
        other => NutriRagError::Embedding(other.to_string()),
    }
}

fn into_index_error(err: NutriRagError) -> NutriRagError {
    match err {
        NutriRagError::IndexUnavailable(_) => err,
        other => NutriRagError::IndexUnavailable(other.to_string()),
    }
}
