//! LLM integration
//!
//! Provides traits and HTTP implementations for:
//! - Embedding generation via external services (Ollama, vLLM, OpenAI, etc.)
//! - Text generation via chat completions

mod client;
mod http_embedder;
mod http_generator;
mod traits;

pub use client::{ChatMessage, HttpLLMClient, LLMClient};
pub use http_embedder::HttpEmbedder;
pub use http_generator::HttpGenerator;
pub use traits::*;
