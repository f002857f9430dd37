//! Configuration management
//!
//! Configuration is loaded once at process start, validated, and then shared
//! read-only (usually behind an `Arc`) with every component.

use crate::error::{NutriRagError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Embedding and generation service configuration
    #[serde(default)]
    pub llm_service: LLMServiceConfig,

    /// Vector index configuration
    #[serde(default)]
    pub vector_index: VectorIndexConfig,

    /// Retrieval thresholds
    #[serde(default)]
    pub retrieval: RetrievalConfig,

    /// Macro split policy for the targets engine
    #[serde(default)]
    pub targets: TargetsPolicy,
}

/// LLM service configuration for external inference
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LLMServiceConfig {
    /// Base URL of the LLM service for chat/completions
    pub url: String,

    /// Model name for chat completions
    #[serde(default = "default_chat_model")]
    pub model: String,

    /// Base URL for embeddings service (can be different from LLM URL)
    #[serde(default)]
    pub embedding_url: Option<String>,

    /// Model name for embeddings
    #[serde(default = "default_embedding_model")]
    pub embedding_model: String,

    /// Expected embedding dimensions; vectors of any other length are rejected
    #[serde(default)]
    pub embedding_dimensions: Option<usize>,

    /// API key (optional, for authenticated services)
    #[serde(default)]
    pub api_key: Option<String>,

    /// Request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    /// Completion token budget
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    /// Sampling temperature
    #[serde(default = "default_temperature")]
    pub temperature: f32,
}

impl LLMServiceConfig {
    /// Get the embeddings URL (falls back to main URL if not specified)
    pub fn embeddings_url(&self) -> &str {
        self.embedding_url.as_deref().unwrap_or(&self.url)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for LLMServiceConfig {
    fn default() -> Self {
        Self {
            url: std::env::var("NUTRIRAG_LLM_URL")
                .unwrap_or_else(|_| "http://localhost:11434".to_string()),
            model: default_chat_model(),
            embedding_url: std::env::var("NUTRIRAG_EMBEDDING_URL").ok(),
            embedding_model: default_embedding_model(),
            embedding_dimensions: std::env::var("NUTRIRAG_EMBEDDING_DIMS")
                .ok()
                .and_then(|s| s.parse().ok()),
            api_key: std::env::var("NUTRIRAG_LLM_API_KEY").ok(),
            timeout_secs: default_timeout(),
            max_tokens: default_max_tokens(),
            temperature: default_temperature(),
        }
    }
}

fn default_chat_model() -> String {
    std::env::var("NUTRIRAG_LLM_MODEL").unwrap_or_else(|_| "llama3".to_string())
}

fn default_embedding_model() -> String {
    std::env::var("NUTRIRAG_EMBEDDING_MODEL").unwrap_or_else(|_| "nomic-embed-text".to_string())
}

fn default_timeout() -> u64 {
    30
}

fn default_max_tokens() -> u32 {
    1024
}

fn default_temperature() -> f32 {
    0.7
}

/// Which vector index implementation to use
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IndexBackend {
    /// Qdrant REST API
    Qdrant,
    /// Pre-embedded corpus file held in memory
    Memory,
}

/// Vector index configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VectorIndexConfig {
    #[serde(default = "default_backend")]
    pub backend: IndexBackend,

    /// Base URL of the vector store
    #[serde(default = "default_qdrant_url")]
    pub url: String,

    /// Collection holding the guideline passages
    #[serde(default = "default_collection")]
    pub collection: String,

    /// Corpus file for the in-memory backend
    #[serde(default)]
    pub corpus_path: Option<PathBuf>,

    #[serde(default)]
    pub api_key: Option<String>,

    /// Search timeout in seconds
    #[serde(default = "default_index_timeout")]
    pub timeout_secs: u64,
}

impl VectorIndexConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for VectorIndexConfig {
    fn default() -> Self {
        let corpus_path = std::env::var("NUTRIRAG_CORPUS").ok().map(PathBuf::from);
        Self {
            backend: if corpus_path.is_some() {
                IndexBackend::Memory
            } else {
                default_backend()
            },
            url: default_qdrant_url(),
            collection: default_collection(),
            corpus_path,
            api_key: std::env::var("NUTRIRAG_QDRANT_API_KEY").ok(),
            timeout_secs: default_index_timeout(),
        }
    }
}

fn default_qdrant_url() -> String {
    std::env::var("NUTRIRAG_QDRANT_URL").unwrap_or_else(|_| "http://localhost:6333".to_string())
}

fn default_backend() -> IndexBackend {
    IndexBackend::Qdrant
}

fn default_collection() -> String {
    std::env::var("NUTRIRAG_QDRANT_COLLECTION")
        .unwrap_or_else(|_| "nutrition_guidelines".to_string())
}

fn default_index_timeout() -> u64 {
    10
}

/// Retrieval thresholds
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievalConfig {
    /// Number of passages to retrieve by default
    #[serde(default = "default_top_k")]
    pub top_k: usize,

    /// Minimum similarity score; passages below it are dropped
    #[serde(default = "default_min_score")]
    pub min_score: f32,

    /// Embedding call timeout in seconds
    #[serde(default = "default_embed_timeout")]
    pub embed_timeout_secs: u64,
}

impl RetrievalConfig {
    pub fn embed_timeout(&self) -> Duration {
        Duration::from_secs(self.embed_timeout_secs)
    }
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            top_k: default_top_k(),
            min_score: default_min_score(),
            embed_timeout_secs: default_embed_timeout(),
        }
    }
}

fn default_top_k() -> usize {
    5
}

fn default_min_score() -> f32 {
    0.35
}

fn default_embed_timeout() -> u64 {
    15
}

/// Macro split policy for the targets engine
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TargetsPolicy {
    /// Baseline protein in g per kg of body weight (0.8 - 1.2)
    #[serde(default = "default_protein_g_per_kg")]
    pub protein_g_per_kg: f64,

    /// Share of non-protein kcal assigned to fat; the rest goes to carbohydrate
    #[serde(default = "default_fat_share")]
    pub fat_share: f64,
}

impl TargetsPolicy {
    pub fn carb_share(&self) -> f64 {
        1.0 - self.fat_share
    }
}

impl Default for TargetsPolicy {
    fn default() -> Self {
        Self {
            protein_g_per_kg: default_protein_g_per_kg(),
            fat_share: default_fat_share(),
        }
    }
}

fn default_protein_g_per_kg() -> f64 {
    1.0
}

fn default_fat_share() -> f64 {
    0.30
}

impl Config {
    /// Load config from `NUTRIRAG_CONFIG` or the default path
    pub fn load() -> Result<Self> {
        let path = std::env::var("NUTRIRAG_CONFIG")
            .map(PathBuf::from)
            .unwrap_or_else(|_| Self::default_path());
        Self::load_from(&path)
    }

    /// Load config from a specific file, using defaults when it does not exist
    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path)?;
            let config: Config = serde_yaml::from_str(&content)?;
            Ok(config)
        } else {
            Ok(Config::default())
        }
    }

    /// Get default config path
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(crate::CONFIG_DIR_NAME)
            .join("config.yml")
    }

    /// Check endpoints and thresholds; failures are fatal at startup
    pub fn validate(&self) -> Result<()> {
        check_url("llm_service.url", &self.llm_service.url)?;
        check_url("llm_service.embedding_url", self.llm_service.embeddings_url())?;
        if self.llm_service.model.trim().is_empty() {
            return Err(config_error("llm_service.model must not be empty"));
        }
        if self.llm_service.embedding_model.trim().is_empty() {
            return Err(config_error("llm_service.embedding_model must not be empty"));
        }
        if self.llm_service.embedding_dimensions == Some(0) {
            return Err(config_error("llm_service.embedding_dimensions must be positive"));
        }
        if self.llm_service.timeout_secs == 0 {
            return Err(config_error("llm_service.timeout_secs must be positive"));
        }
        if self.llm_service.max_tokens == 0 {
            return Err(config_error("llm_service.max_tokens must be positive"));
        }
        if !(0.0..=2.0).contains(&self.llm_service.temperature) {
            return Err(config_error("llm_service.temperature must be within [0, 2]"));
        }

        match self.vector_index.backend {
            IndexBackend::Qdrant => {
                check_url("vector_index.url", &self.vector_index.url)?;
                if self.vector_index.collection.trim().is_empty() {
                    return Err(config_error("vector_index.collection must not be empty"));
                }
            }
            IndexBackend::Memory => {
                if self.vector_index.corpus_path.is_none() {
                    return Err(config_error(
                        "vector_index.corpus_path is required for the memory backend",
                    ));
                }
            }
        }
        if self.vector_index.timeout_secs == 0 {
            return Err(config_error("vector_index.timeout_secs must be positive"));
        }

        if self.retrieval.top_k == 0 {
            return Err(config_error("retrieval.top_k must be at least 1"));
        }
        if !(-1.0..=1.0).contains(&self.retrieval.min_score) {
            return Err(config_error("retrieval.min_score must be within [-1, 1]"));
        }
        if self.retrieval.embed_timeout_secs == 0 {
            return Err(config_error("retrieval.embed_timeout_secs must be positive"));
        }

        if !(0.8..=1.2).contains(&self.targets.protein_g_per_kg) {
            return Err(config_error("targets.protein_g_per_kg must be within [0.8, 1.2]"));
        }
        if !(self.targets.fat_share > 0.0 && self.targets.fat_share < 1.0) {
            return Err(config_error("targets.fat_share must be within (0, 1)"));
        }

        Ok(())
    }
}

fn config_error(message: &str) -> NutriRagError {
    NutriRagError::Config(message.to_string())
}

fn check_url(field: &str, url: &str) -> Result<()> {
    if url.starts_with("http://") || url.starts_with("https://") {
        Ok(())
    } else {
        Err(NutriRagError::Config(format!(
            "{} must be an http(s) URL, got '{}'",
            field, url
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults_are_valid() {
        let mut config = Config::default();
        config.vector_index.backend = IndexBackend::Qdrant;
        config.llm_service.url = "http://localhost:11434".to_string();
        config.llm_service.embedding_url = None;
        config.vector_index.url = "http://localhost:6333".to_string();
        assert!(config.validate().is_ok());
        assert_eq!(config.retrieval.top_k, 5);
        assert!((config.targets.carb_share() - 0.70).abs() < 1e-9);
    }

    #[test]
    fn test_rejects_bad_url() {
        let mut config = Config::default();
        config.vector_index.backend = IndexBackend::Qdrant;
        config.llm_service.url = "localhost:11434".to_string();
        config.llm_service.embedding_url = None;
        let err = config.validate().unwrap_err();
        assert!(matches!(err, NutriRagError::Config(_)));
    }

    #[test]
    fn test_memory_backend_requires_corpus() {
        let mut config = Config::default();
        config.llm_service.url = "http://localhost:11434".to_string();
        config.llm_service.embedding_url = None;
        config.vector_index.backend = IndexBackend::Memory;
        config.vector_index.corpus_path = None;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_protein_policy_out_of_range() {
        let mut config = Config::default();
        config.vector_index.backend = IndexBackend::Qdrant;
        config.llm_service.url = "http://localhost:11434".to_string();
        config.llm_service.embedding_url = None;
        config.vector_index.url = "http://localhost:6333".to_string();
        config.targets.protein_g_per_kg = 1.6;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_load_from_yaml() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "llm_service:\n  url: http://llm:8000\n  model: mistral\nvector_index:\n  backend: memory\n  url: http://unused:1\n  corpus_path: /tmp/corpus.json\nretrieval:\n  top_k: 3\n  min_score: 0.5\ntargets:\n  protein_g_per_kg: 1.2\n  fat_share: 0.25\n"
        )
        .unwrap();

        let config = Config::load_from(file.path()).unwrap();
        assert_eq!(config.llm_service.url, "http://llm:8000");
        assert_eq!(config.llm_service.model, "mistral");
        assert_eq!(config.llm_service.max_tokens, 1024);
        assert_eq!(config.vector_index.backend, IndexBackend::Memory);
        assert_eq!(config.retrieval.top_k, 3);
        assert_eq!(config.targets.fat_share, 0.25);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_missing_file_falls_back_to_defaults() {
        let dir = tempfile::TempDir::new().unwrap();
        let config = Config::load_from(&dir.path().join("absent.yml")).unwrap();
        assert_eq!(config.retrieval.top_k, 5);
    }
}
