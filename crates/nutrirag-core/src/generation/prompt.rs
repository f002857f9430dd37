//! Grounded prompt template
//!
//! Sections always appear in this order: system instruction, numbered
//! evidence, nutrition targets, user query. Evidence precedes the query so the
//! model sees the guidelines before the question it is answering.

use crate::llm::ChatMessage;
use crate::retrieval::RetrievedContext;
use crate::targets::NutritionTargets;

pub const SYSTEM_INSTRUCTION: &str = "You are a knowledgeable nutrition advisor who provides \
evidence-based dietary recommendations grounded in clinical guidelines such as ADA, AHA, DASH \
and KDIGO. This information is for educational purposes only and is not medical advice: you are \
not a doctor, and you always recommend consulting a qualified healthcare provider before any \
change to diet, exercise or medication. When a recommendation relies on a guideline passage, name \
the guideline exactly as it is labelled in the evidence. Never invent guideline citations.";

pub const EVIDENCE_HEADING: &str = "## Clinical Guideline Evidence";
pub const TARGETS_HEADING: &str = "## Nutrition Targets";
pub const QUERY_HEADING: &str = "## Question";

const NO_EVIDENCE: &str = "No clinical guideline passages were found for this query. Answer with \
general, conservative advice and do not cite or imply any specific guideline.";

/// Build the system and user messages for a grounded completion
pub fn build_prompt(
    query: &str,
    context: &RetrievedContext,
    targets: Option<&NutritionTargets>,
) -> Vec<ChatMessage> {
    let mut sections = Vec::with_capacity(3);

    sections.push(evidence_section(context));
    if let Some(targets) = targets {
        sections.push(targets_section(targets));
    }
    sections.push(format!("{}\n{}", QUERY_HEADING, query.trim()));

    vec![
        ChatMessage::system(SYSTEM_INSTRUCTION),
        ChatMessage::user(sections.join("\n\n")),
    ]
}

fn evidence_section(context: &RetrievedContext) -> String {
    if context.is_empty() {
        return format!("{}\n{}", EVIDENCE_HEADING, NO_EVIDENCE);
    }

    let items: Vec<String> = context
        .passages
        .iter()
        .enumerate()
        .map(|(i, scored)| {
            let passage = &scored.passage;
            match passage.document {
                Some(ref doc) => format!(
                    "{}. [{}] {} (source: {})",
                    i + 1,
                    passage.guideline,
                    passage.text.trim(),
                    doc
                ),
                None => format!("{}. [{}] {}", i + 1, passage.guideline, passage.text.trim()),
            }
        })
        .collect();

    format!("{}\n{}", EVIDENCE_HEADING, items.join("\n"))
}

fn targets_section(targets: &NutritionTargets) -> String {
    let mut lines: Vec<String> = targets
        .facts()
        .into_iter()
        .map(|(key, value)| format!("{}: {}", key, value))
        .collect();
    for adjustment in &targets.applied_adjustments {
        lines.push(format!("Safety adjustment: {}", adjustment));
    }
    format!("{}\n{}", TARGETS_HEADING, lines.join("\n"))
}
