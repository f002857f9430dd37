//! JSON output formatter

use nutrirag_core::RecommendationResponse;
use serde::Serialize;

pub fn to_pretty<T: Serialize>(value: &T) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| "{}".to_string()) + "\n"
}

/// Full response, retrieved context included
pub fn format_recommendation(response: &RecommendationResponse) -> String {
    to_pretty(response)
}
