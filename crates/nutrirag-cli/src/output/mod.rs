//! Output formatters

pub mod json;
pub mod terminal;

use crate::app::OutputFormat;
use nutrirag_core::{DietaryBudget, NutritionTargets, RecommendationResponse};

/// Terminal format options; JSON output always carries the full response
pub struct FormatOptions {
    pub show_context: bool,
}

pub fn format_targets(targets: &NutritionTargets, format: OutputFormat) -> String {
    match format {
        OutputFormat::Json => json::to_pretty(targets),
        OutputFormat::Cli => terminal::format_targets(targets),
    }
}

pub fn format_budget(budget: &DietaryBudget, format: OutputFormat) -> String {
    match format {
        OutputFormat::Json => json::to_pretty(budget),
        OutputFormat::Cli => terminal::format_budget(budget),
    }
}

pub fn format_recommendation(
    response: &RecommendationResponse,
    format: OutputFormat,
    options: &FormatOptions,
) -> String {
    match format {
        OutputFormat::Json => json::format_recommendation(response),
        OutputFormat::Cli => terminal::format_recommendation(response, options),
    }
}
