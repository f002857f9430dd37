//! HTTP client for external LLM services (Ollama, vLLM, OpenAI, etc.)

use super::CompletionRequest;
use crate::config::LLMServiceConfig;
use crate::error::{NutriRagError, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Instant;

/// Trait for LLM service clients
#[async_trait]
pub trait LLMClient: Send + Sync {
    /// Generate chat completion
    async fn chat_completion(&self, request: &CompletionRequest) -> Result<String>;

    /// Generate embeddings for text
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;

    /// Expected embedding dimensions, when configured
    fn embedding_dimensions(&self) -> Option<usize>;

    /// Chat model name
    fn model_name(&self) -> &str;

    /// Embedding model name
    fn embedding_model_name(&self) -> &str;
}

/// Chat message for completion requests
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".to_string(),
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }
}

/// OpenAI-compatible client (`/v1/chat/completions`, `/v1/embeddings`)
pub struct HttpLLMClient {
    http_client: reqwest::Client,
    config: LLMServiceConfig,
}

impl HttpLLMClient {
    /// Create new client from configuration
    pub fn new(config: LLMServiceConfig) -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|e| NutriRagError::Config(format!("HTTP client: {}", e)))?;

        Ok(Self {
            http_client,
            config,
        })
    }

    fn post(&self, url: &str) -> reqwest::RequestBuilder {
        let req = self.http_client.post(url);
        match self.config.api_key {
            Some(ref api_key) => req.header("Authorization", format!("Bearer {}", api_key)),
            None => req,
        }
    }
}

#[async_trait]
impl LLMClient for HttpLLMClient {
    async fn chat_completion(&self, request: &CompletionRequest) -> Result<String> {
        #[derive(Serialize)]
        struct ChatRequest<'a> {
            model: &'a str,
            messages: &'a [ChatMessage],
            temperature: f32,
            max_tokens: u32,
            stream: bool,
        }

        #[derive(Deserialize)]
        struct ChatResponse {
            choices: Vec<ChatChoice>,
        }

        #[derive(Deserialize)]
        struct ChatChoice {
            message: ChatMessage,
        }

        let start = Instant::now();
        let body = ChatRequest {
            model: &self.config.model,
            messages: &request.messages,
            temperature: request.temperature,
            max_tokens: request.max_tokens,
            stream: false,
        };

        let url = format!("{}/v1/chat/completions", self.config.url.trim_end_matches('/'));

        let response = self
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| NutriRagError::Generation(format!("request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(NutriRagError::Generation(format!(
                "LLM service error (HTTP {}): {}",
                status, body
            )));
        }

        let chat_response: ChatResponse = response
            .json()
            .await
            .map_err(|e| NutriRagError::Generation(format!("invalid response: {}", e)))?;

        let content = chat_response
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| NutriRagError::Generation("No response from LLM".to_string()))?
            .message
            .content;

        tracing::debug!(
            model = %self.config.model,
            chars = content.len(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Chat completion finished"
        );

        Ok(content)
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        #[derive(Serialize)]
        struct EmbedRequest<'a> {
            model: &'a str,
            input: Vec<&'a str>,
        }

        #[derive(Deserialize)]
        struct EmbedResponse {
            data: Vec<EmbedData>,
        }

        #[derive(Deserialize)]
        struct EmbedData {
            embedding: Vec<f32>,
        }

        let start = Instant::now();
        let body = EmbedRequest {
            model: &self.config.embedding_model,
            input: vec![text],
        };

        let url = format!(
            "{}/v1/embeddings",
            self.config.embeddings_url().trim_end_matches('/')
        );

        let response = self
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| NutriRagError::Embedding(format!("request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(NutriRagError::Embedding(format!(
                "Embedding service error (HTTP {}): {}",
                status, body
            )));
        }

        let embed_response: EmbedResponse = response
            .json()
            .await
            .map_err(|e| NutriRagError::Embedding(format!("invalid response: {}", e)))?;

        let embedding = embed_response
            .data
            .into_iter()
            .next()
            .map(|d| d.embedding)
            .ok_or_else(|| NutriRagError::Embedding("No embedding returned".to_string()))?;

        tracing::debug!(
            model = %self.config.embedding_model,
            dims = embedding.len(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Embedding finished"
        );

        Ok(embedding)
    }

    fn embedding_dimensions(&self) -> Option<usize> {
        self.config.embedding_dimensions
    }

    fn model_name(&self) -> &str {
        &self.config.model
    }

    fn embedding_model_name(&self) -> &str {
        &self.config.embedding_model
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::{Embedder, Generator, HttpEmbedder, HttpGenerator};

    fn unreachable_config() -> LLMServiceConfig {
        LLMServiceConfig {
            url: "http://127.0.0.1:9".to_string(),
            embedding_url: None,
            api_key: Some("test-key".to_string()),
            timeout_secs: 2,
            ..Default::default()
        }
    }

    #[test]
    fn test_chat_message_roles() {
        let json = serde_json::to_value(ChatMessage::system("be brief")).unwrap();
        assert_eq!(json["role"], "system");
        assert_eq!(ChatMessage::user("hi").role, "user");
    }

    #[tokio::test]
    async fn test_unreachable_service_maps_to_capability_errors() {
        let embedder = HttpEmbedder::from_config(unreachable_config()).unwrap();
        let err = embedder.embed("fiber").await.unwrap_err();
        assert!(matches!(err, NutriRagError::Embedding(_)));

        let generator = HttpGenerator::from_config(unreachable_config()).unwrap();
        let request = CompletionRequest {
            messages: vec![ChatMessage::user("hi")],
            max_tokens: 8,
            temperature: 0.0,
        };
        let err = generator.complete(&request).await.unwrap_err();
        assert!(matches!(err, NutriRagError::Generation(_)));
        assert_eq!(generator.model_name(), unreachable_config().model);
    }
}
