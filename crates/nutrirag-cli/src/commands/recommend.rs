//! Recommend command

use crate::app::{OutputFormat, RecommendArgs};
use crate::output::{self, FormatOptions};
use anyhow::{Context, Result};
use nutrirag_core::{Config, RecommendationRequest, Recommender};
use std::io::Read;
use std::path::Path;

pub async fn run(args: RecommendArgs, config: &Config, format: OutputFormat) -> Result<()> {
    let request = match args.input {
        Some(ref path) => read_request(path)?,
        None => RecommendationRequest {
            query: (!args.query.is_empty()).then(|| args.query.join(" ")),
            profile: args.profile.to_profile(),
            labs: args.labs.to_panel(),
            top_k: args.top_k,
        },
    };

    let recommender = Recommender::from_config(config)?;
    let response = recommender.handle(&request).await?;

    let options = FormatOptions {
        show_context: args.show_context,
    };
    print!(
        "{}",
        output::format_recommendation(&response, format, &options)
    );
    Ok(())
}

fn read_request(path: &Path) -> Result<RecommendationRequest> {
    let content = if path == Path::new("-") {
        let mut buf = String::new();
        std::io::stdin().read_to_string(&mut buf)?;
        buf
    } else {
        std::fs::read_to_string(path)
            .with_context(|| format!("reading request {}", path.display()))?
    };
    let request = serde_json::from_str(&content)
        .map_err(|e| nutrirag_core::NutriRagError::validation(format!("invalid request JSON: {}", e)))?;
    Ok(request)
}
