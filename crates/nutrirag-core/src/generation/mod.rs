//! Grounded answer generation
//!
//! Composes the grounded prompt, calls the generation service under a timeout
//! and post-processes the completion. The model text is kept verbatim apart
//! from trimming and, when nothing was retrieved, a no-source disclaimer.

pub mod prompt;

use crate::config::LLMServiceConfig;
use crate::error::{NutriRagError, Result};
use crate::llm::{CompletionRequest, Generator};
use crate::retrieval::RetrievedContext;
use crate::targets::NutritionTargets;
use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

pub use prompt::build_prompt;

/// Prepended to answers generated without any retrieved passage
pub const NO_SOURCE_DISCLAIMER: &str = "Note: no clinical guideline source was found for this \
query. The following is general information that is not grounded in a retrieved guideline.";

lazy_static! {
    static ref KNOWN_GUIDELINE_RE: Regex =
        Regex::new(r"\b(ADA|AHA|DASH|KDIGO|LIPID|USDA|WHO)\b").unwrap();
}

/// Generated text plus the retrieved guidelines it names
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroundedAnswer {
    pub text: String,
    pub cited_sources: Vec<String>,
    /// Known guideline names in the text that were not retrieved
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub uncorroborated_sources: Vec<String>,
}

/// Prompt composition + generation client
pub struct GroundedGenerator {
    generator: Arc<dyn Generator>,
    max_tokens: u32,
    temperature: f32,
    timeout: Duration,
}

impl GroundedGenerator {
    pub fn new(generator: Arc<dyn Generator>, config: &LLMServiceConfig) -> Self {
        Self {
            generator,
            max_tokens: config.max_tokens,
            temperature: config.temperature,
            timeout: config.timeout(),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn model_name(&self) -> &str {
        self.generator.model_name()
    }

    /// Answer `query` from `context`, optionally citing concrete targets.
    ///
    /// # Errors
    ///
    /// `Generation` when the service fails, times out or returns no text.
    pub async fn generate(
        &self,
        query: &str,
        context: &RetrievedContext,
        targets: Option<&NutritionTargets>,
    ) -> Result<GroundedAnswer> {
        let request = CompletionRequest {
            messages: build_prompt(query, context, targets),
            max_tokens: self.max_tokens,
            temperature: self.temperature,
        };

        let raw = tokio::time::timeout(self.timeout, self.generator.complete(&request))
            .await
            .map_err(|_| {
                NutriRagError::Generation(format!(
                    "{} timed out after {}s",
                    self.generator.model_name(),
                    self.timeout.as_secs_f32()
                ))
            })?
            .map_err(|e| match e {
                NutriRagError::Generation(_) => e,
                other => NutriRagError::Generation(other.to_string()),
            })?;

        post_process(&raw, context)
    }
}

/// Trim, attribute and disclaim a raw completion
pub fn post_process(raw: &str, context: &RetrievedContext) -> Result<GroundedAnswer> {
    let body = raw.trim();
    if body.is_empty() {
        return Err(NutriRagError::Generation(
            "generation service returned an empty completion".to_string(),
        ));
    }

    let retrieved = context.guidelines();
    let cited_sources: Vec<String> = retrieved
        .iter()
        .filter(|name| mentions(body, name))
        .map(|name| name.to_string())
        .collect();

    let mut uncorroborated_sources: Vec<String> = Vec::new();
    for m in KNOWN_GUIDELINE_RE.find_iter(body) {
        let name = m.as_str();
        let was_retrieved = retrieved.iter().any(|r| r.eq_ignore_ascii_case(name));
        if !was_retrieved && !uncorroborated_sources.iter().any(|u| u == name) {
            uncorroborated_sources.push(name.to_string());
        }
    }
    if !uncorroborated_sources.is_empty() {
        tracing::warn!(
            "Answer names guidelines that were not retrieved: {}",
            uncorroborated_sources.join(", ")
        );
    }

    let text = if context.is_empty() {
        format!("{}\n\n{}", NO_SOURCE_DISCLAIMER, body)
    } else {
        body.to_string()
    };

    Ok(GroundedAnswer {
        text,
        cited_sources,
        uncorroborated_sources,
    })
}

/// Whole-word occurrence of `name` in `text`
fn mentions(text: &str, name: &str) -> bool {
    if name.is_empty() {
        return false;
    }
    let is_word = |c: char| c.is_alphanumeric() || c == '_';
    text.match_indices(name).any(|(start, _)| {
        let before = text[..start].chars().next_back();
        let after = text[start + name.len()..].chars().next();
        !before.is_some_and(is_word) && !after.is_some_and(is_word)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::{GuidelinePassage, ScoredPassage};

    fn context(guidelines: &[&str]) -> RetrievedContext {
        RetrievedContext {
            passages: guidelines
                .iter()
                .enumerate()
                .map(|(i, g)| ScoredPassage {
                    passage: GuidelinePassage {
                        id: i.to_string(),
                        guideline: g.to_string(),
                        document: None,
                        text: "passage".into(),
                        embedding: vec![],
                    },
                    score: 0.9,
                })
                .collect(),
        }
    }

    #[test]
    fn test_text_kept_verbatim() {
        let raw = "  Per the KDIGO guideline, limit protein.\n";
        let answer = post_process(raw, &context(&["KDIGO"])).unwrap();
        assert_eq!(answer.text, "Per the KDIGO guideline, limit protein.");
        assert_eq!(answer.cited_sources, vec!["KDIGO"]);
        assert!(answer.uncorroborated_sources.is_empty());
    }

    #[test]
    fn test_empty_context_prepends_disclaimer() {
        let answer = post_process("Eat vegetables.", &RetrievedContext::default()).unwrap();
        assert!(answer.text.starts_with(NO_SOURCE_DISCLAIMER));
        assert!(answer.text.ends_with("Eat vegetables."));
        assert!(answer.cited_sources.is_empty());
    }

    #[test]
    fn test_flags_unretrieved_guidelines() {
        let answer =
            post_process("The ADA and DASH plans both help.", &context(&["ADA"])).unwrap();
        assert_eq!(answer.cited_sources, vec!["ADA"]);
        assert_eq!(answer.uncorroborated_sources, vec!["DASH"]);
    }

    #[test]
    fn test_word_boundaries() {
        let answer = post_process("Use a DASHboard to track meals.", &context(&["DASH"])).unwrap();
        assert!(answer.cited_sources.is_empty());
    }

    #[test]
    fn test_mentions_whole_words_only() {
        assert!(mentions("Per KDIGO, limit protein.", "KDIGO"));
        assert!(mentions("(DASH)", "DASH"));
        assert!(mentions("the DASH_X and DASH plans", "DASH"));
        assert!(!mentions("KDIGO_2024 tables", "KDIGO"));
        assert!(!mentions("nothing here", ""));
    }

    #[test]
    fn test_blank_completion_is_error() {
        let err = post_process("   \n", &context(&["ADA"])).unwrap_err();
        assert!(matches!(err, NutriRagError::Generation(_)));
    }
}
