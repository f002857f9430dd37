//! MCP tool definitions and handlers

use crate::protocol::*;
use anyhow::Result;
use chrono::NaiveDate;
use nutrirag_core::{budget, BudgetPeriod, LabPanel, RecommendationRequest, Recommender, UserProfile};
use serde::Deserialize;
use serde_json::Value;
use std::time::Duration;

const STATUS_PROBE_TIMEOUT: Duration = Duration::from_secs(5);

fn profile_schema() -> Value {
    serde_json::json!({
        "type": "object",
        "properties": {
            "weight_kg": { "type": "number", "description": "Body weight in kg (2-500)" },
            "height_cm": { "type": "number", "description": "Height in cm (30-272)" },
            "age": { "type": "integer", "description": "Age in years (1-120)" },
            "sex": { "type": "string", "enum": ["male", "female"] },
            "activity_level": {
                "type": "string",
                "enum": ["sedentary", "lightly_active", "moderately_active", "very_active", "extra_active"]
            },
            "egfr": { "type": "number", "description": "eGFR in mL/min/1.73m² (optional)" }
        },
        "required": ["weight_kg", "height_cm", "age", "sex", "activity_level"]
    })
}

fn labs_schema() -> Value {
    serde_json::json!({
        "type": "object",
        "description": "Lab values; every field optional",
        "properties": {
            "glucose_fasting": { "type": "number", "description": "mg/dL" },
            "a1c": { "type": "number", "description": "%" },
            "total_cholesterol": { "type": "number", "description": "mg/dL" },
            "ldl": { "type": "number", "description": "mg/dL" },
            "hdl": { "type": "number", "description": "mg/dL" },
            "triglycerides": { "type": "number", "description": "mg/dL" },
            "systolic_bp": { "type": "number", "description": "mmHg" },
            "diastolic_bp": { "type": "number", "description": "mmHg" },
            "bmi": { "type": "number" },
            "egfr": { "type": "number", "description": "mL/min/1.73m²" }
        }
    })
}

pub fn compute_targets_tool_definition() -> ToolDefinition {
    ToolDefinition {
        name: "compute_targets".to_string(),
        description: "Daily BMR, TDEE and macronutrient targets with renal protein caps"
            .to_string(),
        input_schema: profile_schema(),
    }
}

pub fn recommend_tool_definition() -> ToolDefinition {
    ToolDefinition {
        name: "recommend".to_string(),
        description: "Dietary recommendation grounded in clinical guidelines (ADA, AHA, DASH, KDIGO)"
            .to_string(),
        input_schema: serde_json::json!({
            "type": "object",
            "properties": {
                "query": {
                    "type": "string",
                    "description": "Question in natural language"
                },
                "profile": profile_schema(),
                "labs": labs_schema(),
                "top_k": {
                    "type": "integer",
                    "description": "Guideline passages to retrieve (default: 5)",
                    "default": 5
                }
            }
        }),
    }
}

pub fn dietary_budget_tool_definition() -> ToolDefinition {
    ToolDefinition {
        name: "dietary_budget".to_string(),
        description: "Daily, weekly or monthly nutrient budget derived from targets".to_string(),
        input_schema: serde_json::json!({
            "type": "object",
            "properties": {
                "profile": profile_schema(),
                "labs": labs_schema(),
                "period": {
                    "type": "string",
                    "enum": ["daily", "weekly", "monthly"],
                    "default": "weekly"
                },
                "start_date": {
                    "type": "string",
                    "description": "First day (YYYY-MM-DD, default: today)"
                },
                "allow_flexibility": {
                    "type": "boolean",
                    "description": "Note 10-15% daily flexibility (default: true)",
                    "default": true
                }
            },
            "required": ["profile"]
        }),
    }
}

pub fn status_tool_definition() -> ToolDefinition {
    ToolDefinition {
        name: "status".to_string(),
        description: "Models in use and reachability of the guideline index and embedder"
            .to_string(),
        input_schema: serde_json::json!({
            "type": "object",
            "properties": {}
        }),
    }
}

pub async fn handle_compute_targets(recommender: &Recommender, args: Value) -> Result<ToolResult> {
    let profile: UserProfile = serde_json::from_value(args)?;
    let targets = recommender.compute_targets(&profile)?;

    let mut summary: Vec<String> = targets
        .facts()
        .into_iter()
        .map(|(key, value)| format!("{}: {}", key, value))
        .collect();
    summary.extend(
        targets
            .applied_adjustments
            .iter()
            .map(|a| format!("Adjustment: {}", a)),
    );

    Ok(ToolResult::text(
        summary.join("\n"),
        Some(serde_json::to_value(&targets)?),
    ))
}

pub async fn handle_recommend(recommender: &Recommender, args: Value) -> Result<ToolResult> {
    let request: RecommendationRequest = serde_json::from_value(args)?;
    let response = recommender.handle(&request).await?;

    let mut text = response.recommendation.clone();
    if response.grounding.is_grounded() {
        text.push_str(&format!(
            "\n\nGrounded in {} passage(s) from: {}",
            response.context.len(),
            response.context.guidelines().join(", ")
        ));
    }
    for note in &response.safety_notes {
        text.push_str(&format!("\n* {}", note));
    }
    text.push_str("\n\n");
    text.push_str(&response.disclaimer);

    Ok(ToolResult::text(text, Some(serde_json::to_value(&response)?)))
}

#[derive(Deserialize)]
struct BudgetParams {
    profile: UserProfile,
    #[serde(default)]
    labs: Option<LabPanel>,
    #[serde(default = "default_period")]
    period: BudgetPeriod,
    #[serde(default)]
    start_date: Option<NaiveDate>,
    #[serde(default = "default_allow_flexibility")]
    allow_flexibility: bool,
}

fn default_period() -> BudgetPeriod {
    BudgetPeriod::Weekly
}

fn default_allow_flexibility() -> bool {
    true
}

pub async fn handle_dietary_budget(recommender: &Recommender, args: Value) -> Result<ToolResult> {
    let params: BudgetParams = serde_json::from_value(args)?;
    let start_date = params
        .start_date
        .unwrap_or_else(|| chrono::Local::now().date_naive());
    let labs = params.labs.filter(|l| !l.is_empty());

    let budget = budget::plan(
        &params.profile,
        labs.as_ref(),
        recommender.policy(),
        params.period,
        start_date,
        params.allow_flexibility,
    )?;

    let daily = &budget.daily;
    let mut summary = format!(
        "Daily: {:.0} kcal, protein {:.1} g, carbohydrate {:.1} g, fat {:.1} g, fiber {:.0} g, sodium {:.0} mg",
        daily.calories, daily.protein_g, daily.carbs_g, daily.fat_g, daily.fiber_g, daily.sodium_mg
    );
    for totals in budget.weekly.iter().chain(budget.monthly.iter()) {
        summary.push_str(&format!(
            "\n{} days{}: {:.0} kcal, protein {:.0} g",
            totals.days,
            totals
                .label
                .as_ref()
                .map(|l| format!(" ({})", l))
                .unwrap_or_default(),
            totals.calories,
            totals.protein_g
        ));
    }
    for note in &budget.notes {
        summary.push_str(&format!("\nNote: {}", note));
    }

    Ok(ToolResult::text(summary, Some(serde_json::to_value(&budget)?)))
}

pub async fn handle_status(recommender: &Recommender) -> Result<ToolResult> {
    let status = recommender.status(STATUS_PROBE_TIMEOUT).await;

    let summary = format!(
        "Generation model: {}\n\
         Embedding model: {}\n\
         Guideline index: {}\n\
         Embedder: {}",
        status.generation_model,
        status.embedding_model,
        probe_summary(status.index.healthy, &status.index.detail),
        probe_summary(status.embedder.healthy, &status.embedder.detail),
    );

    Ok(ToolResult::text(summary, Some(serde_json::to_value(&status)?)))
}

fn probe_summary(healthy: bool, detail: &str) -> String {
    if healthy {
        format!("available ({})", detail)
    } else {
        format!("unavailable ({})", detail)
    }
}
