//! HTTP-based generator using external LLM service

use super::{CompletionRequest, Generator, HttpLLMClient, LLMClient};
use crate::config::LLMServiceConfig;
use crate::error::Result;
use async_trait::async_trait;
use std::sync::Arc;

/// Generator using external HTTP LLM service
pub struct HttpGenerator {
    client: Arc<dyn LLMClient>,
}

impl HttpGenerator {
    /// Create from LLM client
    pub fn new(client: Arc<dyn LLMClient>) -> Self {
        Self { client }
    }

    /// Create from configuration
    pub fn from_config(config: LLMServiceConfig) -> Result<Self> {
        let client = HttpLLMClient::new(config)?;
        Ok(Self {
            client: Arc::new(client),
        })
    }
}

#[async_trait]
impl Generator for HttpGenerator {
    async fn complete(&self, request: &CompletionRequest) -> Result<String> {
        self.client.chat_completion(request).await
    }

    fn model_name(&self) -> &str {
        self.client.model_name()
    }
}
