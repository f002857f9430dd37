//! Status command

use crate::app::OutputFormat;
use anyhow::Result;
use nutrirag_core::{Config, IndexBackend, Recommender};
use std::time::Duration;

pub async fn run(config: &Config, format: OutputFormat) -> Result<()> {
    let recommender = Recommender::from_config(config)?;
    let status = recommender.status(Duration::from_secs(5)).await;

    let index_location = match config.vector_index.backend {
        IndexBackend::Qdrant => format!(
            "{} (collection {})",
            config.vector_index.url, config.vector_index.collection
        ),
        IndexBackend::Memory => config
            .vector_index
            .corpus_path
            .as_ref()
            .map(|p| p.display().to_string())
            .unwrap_or_default(),
    };

    match format {
        OutputFormat::Json => {
            let value = serde_json::json!({
                "llm_url": config.llm_service.url,
                "embeddings_url": config.llm_service.embeddings_url(),
                "index": index_location,
                "status": status,
            });
            println!("{}", serde_json::to_string_pretty(&value)?);
        }
        OutputFormat::Cli => {
            println!("Generation:      {} @ {}", status.generation_model, config.llm_service.url);
            println!(
                "Embeddings:      {} @ {}",
                status.embedding_model,
                config.llm_service.embeddings_url()
            );
            println!("Vector index:    {}", index_location);
            println!();
            println!("Probes:");
            println!("  Index:         {}", probe_line(status.index.healthy, &status.index.detail));
            println!(
                "  Embedder:      {}",
                probe_line(status.embedder.healthy, &status.embedder.detail)
            );
        }
    }
    Ok(())
}

fn probe_line(healthy: bool, detail: &str) -> String {
    if healthy {
        format!("ok ({})", detail)
    } else {
        format!("unavailable ({})", detail)
    }
}
