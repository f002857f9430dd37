//! LLM trait definitions

use super::ChatMessage;
use crate::error::Result;
use async_trait::async_trait;

/// Embedding generation trait
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Generate embedding for single text
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;

    /// Expected embedding dimensions, when known
    fn dimensions(&self) -> Option<usize>;

    /// Get model name
    fn model_name(&self) -> &str;
}

/// Text generation trait
#[async_trait]
pub trait Generator: Send + Sync {
    /// Complete a prompt
    async fn complete(&self, request: &CompletionRequest) -> Result<String>;

    /// Get model name
    fn model_name(&self) -> &str;
}

/// Prompt plus sampling parameters
#[derive(Debug, Clone)]
pub struct CompletionRequest {
    pub messages: Vec<ChatMessage>,
    pub max_tokens: u32,
    pub temperature: f32,
}
