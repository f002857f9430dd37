//! Terminal output formatter

use super::FormatOptions;
use nutrirag_core::{DietaryBudget, NutritionTargets, PeriodTotals, RecommendationResponse};

pub fn format_targets(targets: &NutritionTargets) -> String {
    let mut output = String::new();

    for (key, value) in targets.facts() {
        output.push_str(&format!("{:<14} {}\n", format!("{}:", key), value));
    }
    if !targets.applied_adjustments.is_empty() {
        output.push('\n');
        output.push_str("Adjustments:\n");
        for adjustment in &targets.applied_adjustments {
            output.push_str(&format!("  - {}\n", adjustment));
        }
    }

    output
}

pub fn format_budget(budget: &DietaryBudget) -> String {
    let daily = &budget.daily;
    let mut output = String::new();

    output.push_str("Daily:\n");
    output.push_str(&format!("  Calories:      {:.0} kcal\n", daily.calories));
    output.push_str(&format!("  Protein:       {:.1} g\n", daily.protein_g));
    output.push_str(&format!("  Carbohydrate:  {:.1} g\n", daily.carbs_g));
    output.push_str(&format!("  Fat:           {:.1} g\n", daily.fat_g));
    output.push_str(&format!("  Fiber:         {:.0} g\n", daily.fiber_g));
    output.push_str(&format!("  Sodium:        {:.0} mg\n", daily.sodium_mg));

    if let Some(ref weekly) = budget.weekly {
        output.push('\n');
        push_totals(&mut output, "Weekly", weekly);
    }
    if let Some(ref monthly) = budget.monthly {
        output.push('\n');
        let heading = match monthly.label {
            Some(ref label) => format!("Monthly ({})", label),
            None => "Monthly".to_string(),
        };
        push_totals(&mut output, &heading, monthly);
    }

    output.push('\n');
    output.push_str(&format!("Method: {}\n", budget.calculation_method));
    for note in &budget.notes {
        output.push_str(&format!("Note: {}\n", note));
    }

    output
}

fn push_totals(output: &mut String, heading: &str, totals: &PeriodTotals) {
    output.push_str(&format!("{} ({} days):\n", heading, totals.days));
    output.push_str(&format!("  Calories:      {:.0} kcal\n", totals.calories));
    output.push_str(&format!("  Protein:       {:.0} g\n", totals.protein_g));
    output.push_str(&format!("  Carbohydrate:  {:.0} g\n", totals.carbs_g));
    output.push_str(&format!("  Fat:           {:.0} g\n", totals.fat_g));
}

pub fn format_recommendation(response: &RecommendationResponse, options: &FormatOptions) -> String {
    let mut output = String::new();

    output.push_str(&response.recommendation);
    output.push_str("\n\n");

    if let Some(ref targets) = response.targets {
        output.push_str("Targets:\n");
        for (key, value) in targets.facts() {
            output.push_str(&format!("  {}: {}\n", key, value));
        }
        output.push('\n');
    }

    if let Some(ref summary) = response.lab_summary {
        output.push_str(&format!("Labs: {}\n", summary));
    }
    if let Some(ref limits) = response.nutrient_limits {
        output.push_str(&format!(
            "Limits: sodium {:.0} mg, fiber {:.0} g, saturated fat <= {:.1} g\n",
            limits.sodium_mg, limits.fiber_g, limits.saturated_fat_max_g
        ));
    }

    if !response.cited_sources.is_empty() {
        output.push_str(&format!("Sources: {}\n", response.cited_sources.join(", ")));
    }
    for note in &response.safety_notes {
        output.push_str(&format!("* {}\n", note));
    }

    if options.show_context && !response.context.is_empty() {
        output.push_str("\nGuideline passages:\n");
        for scored in &response.context.passages {
            let score_pct = (scored.score * 100.0) as u32;
            output.push_str(&format!(
                "{:>3}% [{}] #{}\n",
                score_pct, scored.passage.guideline, scored.passage.id
            ));
            let lines: Vec<&str> = scored.passage.text.lines().take(3).collect();
            for line in lines {
                output.push_str(&format!("  {}\n", line));
            }
        }
    }

    output.push('\n');
    output.push_str(&response.disclaimer);
    output.push('\n');

    output
}
