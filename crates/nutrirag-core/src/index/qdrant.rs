//! Qdrant REST backend

use super::{GuidelineFilter, GuidelinePassage, IndexStats, ScoredPassage, VectorIndex};
use crate::config::VectorIndexConfig;
use crate::error::{NutriRagError, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Instant;

/// Vector index backed by a Qdrant collection.
///
/// Points carry `content`, `guideline_type` and `source` payload fields.
pub struct QdrantIndex {
    http_client: reqwest::Client,
    config: VectorIndexConfig,
}

#[derive(Deserialize)]
struct QdrantResponse<T> {
    result: T,
}

#[derive(Deserialize)]
struct QdrantHit {
    id: Value,
    score: f32,
    #[serde(default)]
    payload: Option<QdrantPayload>,
}

#[derive(Deserialize)]
struct QdrantPayload {
    content: Option<String>,
    guideline_type: Option<String>,
    source: Option<String>,
}

#[derive(Deserialize)]
struct CollectionInfo {
    #[serde(default)]
    points_count: Option<usize>,
}

impl QdrantIndex {
    pub fn new(config: VectorIndexConfig) -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|e| NutriRagError::Config(format!("HTTP client: {}", e)))?;
        Ok(Self {
            http_client,
            config,
        })
    }

    fn collection_url(&self) -> String {
        format!(
            "{}/collections/{}",
            self.config.url.trim_end_matches('/'),
            self.config.collection
        )
    }

    fn with_key(&self, req: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match self.config.api_key {
            Some(ref key) => req.header("api-key", key),
            None => req,
        }
    }

    async fn send<T: serde::de::DeserializeOwned>(
        &self,
        req: reqwest::RequestBuilder,
    ) -> Result<T> {
        let response = self
            .with_key(req)
            .send()
            .await
            .map_err(|e| NutriRagError::IndexUnavailable(format!("request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(NutriRagError::IndexUnavailable(format!(
                "Qdrant error (HTTP {}): {}",
                status, body
            )));
        }

        let parsed: QdrantResponse<T> = response
            .json()
            .await
            .map_err(|e| NutriRagError::IndexUnavailable(format!("invalid response: {}", e)))?;
        Ok(parsed.result)
    }
}

/// Qdrant `should` filter over the guideline_type payload field
/// Payloads carry upper-case family names; Qdrant keyword matches are exact
fn build_filter(filter: &GuidelineFilter) -> Value {
    let mut names: Vec<String> = filter
        .guidelines
        .iter()
        .map(|g| g.to_ascii_uppercase())
        .collect();
    names.dedup();
    let should: Vec<Value> = names
        .iter()
        .map(|g| serde_json::json!({ "key": "guideline_type", "match": { "value": g } }))
        .collect();
    serde_json::json!({ "should": should })
}

fn point_id(id: &Value) -> String {
    match id {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[async_trait]
impl VectorIndex for QdrantIndex {
    async fn search(
        &self,
        vector: &[f32],
        k: usize,
        filter: Option<&GuidelineFilter>,
    ) -> Result<Vec<ScoredPassage>> {
        #[derive(Serialize)]
        struct SearchRequest<'a> {
            vector: &'a [f32],
            limit: usize,
            with_payload: bool,
            #[serde(skip_serializing_if = "Option::is_none")]
            filter: Option<Value>,
        }

        let start = Instant::now();
        let body = SearchRequest {
            vector,
            limit: k,
            with_payload: true,
            filter: filter
                .filter(|f| !f.guidelines.is_empty())
                .map(build_filter),
        };

        let url = format!("{}/points/search", self.collection_url());
        let hits: Vec<QdrantHit> = self.send(self.http_client.post(&url).json(&body)).await?;

        let mut results = Vec::with_capacity(hits.len());
        for hit in hits {
            let id = point_id(&hit.id);
            let Some(payload) = hit.payload else {
                tracing::warn!("Skipping point {} without payload", id);
                continue;
            };
            let Some(text) = payload.content else {
                tracing::warn!("Skipping point {} without content", id);
                continue;
            };
            results.push(ScoredPassage {
                passage: GuidelinePassage {
                    id,
                    guideline: payload.guideline_type.unwrap_or_else(|| "GENERAL".to_string()),
                    document: payload.source,
                    text,
                    embedding: Vec::new(),
                },
                score: hit.score,
            });
        }

        tracing::debug!(
            collection = %self.config.collection,
            hits = results.len(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Qdrant search finished"
        );

        Ok(results)
    }

    async fn stats(&self) -> Result<IndexStats> {
        let info: CollectionInfo = self
            .send(self.http_client.get(self.collection_url()))
            .await?;
        Ok(IndexStats {
            backend: self.name().to_string(),
            passage_count: info.points_count.unwrap_or(0),
        })
    }

    fn name(&self) -> &str {
        "qdrant"
    }
}
