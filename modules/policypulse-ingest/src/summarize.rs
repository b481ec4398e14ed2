// AP-style summary generation with a single neutrality retry.
//
// The retry inspects the RAW model output, before JSON parsing, so a
// loaded word anywhere in the response triggers it. The second attempt
// is final: it is parsed and stored even if still imperfect, keeping
// cost per document bounded at two calls.

use anyhow::Result;
use serde::Deserialize;
use tracing::warn;

use ai_client::{GenerateOptions, TextGenerator};
use policypulse_common::vocab::LOADED_WORDS;
use policypulse_common::{ChangeType, PolicyPulseError};

use crate::prompts::{custom_summary_prompt, summary_prompt};
use crate::text::truncate_with_marker;

/// Prompt input budget for one summary, in bytes.
pub(crate) const SUMMARY_INPUT_LIMIT: usize = 15_000;
const TOPIC_INPUT_LIMIT: usize = 20_000;

/// A parsed summary plus the attribution of the model that wrote it.
#[derive(Debug, Clone)]
pub struct PolicySummary {
    pub headline: String,
    pub lead: String,
    pub details: String,
    pub context: String,
    pub topics: Vec<String>,
    pub change_type: Option<ChangeType>,
    pub model: String,
    pub provider: String,
}

impl PolicySummary {
    /// The stored summary body: lead, details and context as paragraphs.
    pub fn summary_text(&self) -> String {
        format!("{}\n\n{}\n\n{}", self.lead, self.details, self.context)
    }
}

#[derive(Debug, Deserialize)]
struct SummaryResponse {
    headline: String,
    lead: String,
    details: String,
    context: String,
    #[serde(default)]
    topics: Vec<String>,
    #[serde(rename = "changeType", default)]
    change_type: Option<ChangeType>,
}

/// Loaded words present in `text`, case-insensitively.
pub fn loaded_words_in(text: &str) -> Vec<&'static str> {
    let lowered = text.to_lowercase();
    LOADED_WORDS
        .iter()
        .copied()
        .filter(|w| lowered.contains(w))
        .collect()
}

pub async fn generate_summary(
    generator: &dyn TextGenerator,
    raw_text: &str,
) -> Result<PolicySummary> {
    let truncated = truncate_with_marker(raw_text, SUMMARY_INPUT_LIMIT);

    let mut response = generator
        .generate(
            &summary_prompt(),
            &truncated,
            GenerateOptions::default().json().temperature(0.2),
        )
        .await?;

    let found = loaded_words_in(&response.content);
    if !found.is_empty() {
        warn!(words = ?found, "Summary contained loaded words, regenerating once");
        let correction = format!(
            "{truncated}\n\nIMPORTANT: Your previous response contained loaded words ({}). \
             Rewrite without any of these words. Be strictly factual and neutral.",
            found.join(", ")
        );
        response = generator
            .generate(
                &summary_prompt(),
                &correction,
                GenerateOptions::default().json().temperature(0.1),
            )
            .await?;
    }

    let parsed: SummaryResponse = serde_json::from_str(response.content.trim())
        .map_err(|e| PolicyPulseError::Generation(format!("summary was not valid JSON: {e}")))?;

    Ok(PolicySummary {
        headline: parsed.headline,
        lead: parsed.lead,
        details: parsed.details,
        context: parsed.context,
        topics: parsed.topics,
        change_type: parsed.change_type,
        model: response.model,
        provider: response.provider,
    })
}

/// Free-text roundup of one topic across several policy texts.
pub async fn topic_summary(
    generator: &dyn TextGenerator,
    topic: &str,
    policy_texts: &[String],
) -> Result<String> {
    let combined = policy_texts
        .iter()
        .enumerate()
        .map(|(i, t)| format!("--- Policy {} ---\n{}", i + 1, t))
        .collect::<Vec<_>>()
        .join("\n\n");
    let truncated = truncate_with_marker(&combined, TOPIC_INPUT_LIMIT);
    let user = format!("Topic: {topic}\n\nRelevant policy changes:\n{truncated}");

    let response = generator
        .generate(
            &custom_summary_prompt(),
            &user,
            GenerateOptions::default().temperature(0.3).max_tokens(2048),
        )
        .await?;

    Ok(response.content)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{summary_json, MockGenerator};
    use ai_client::ResponseFormat;

    #[test]
    fn loaded_word_scan_is_case_insensitive() {
        let found = loaded_words_in("An Unprecedented and sweeping change");
        assert_eq!(found, vec!["unprecedented", "sweeping"]);
        assert!(loaded_words_in("The order sets tariff rates.").is_empty());
    }

    #[tokio::test]
    async fn clean_first_response_is_parsed_without_retry() {
        let generator = MockGenerator::new().respond(summary_json("Agency issues fuel rule"));

        let summary = generate_summary(&generator, "Full text of the rule.")
            .await
            .unwrap();

        assert_eq!(summary.headline, "Agency issues fuel rule");
        assert_eq!(generator.call_count(), 1);
        let call = generator.calls().remove(0);
        assert_eq!(call.options.temperature, 0.2);
        assert_eq!(call.options.response_format, ResponseFormat::Json);
        assert_eq!(call.user, "Full text of the rule.");
    }

    #[tokio::test]
    async fn loaded_response_triggers_exactly_one_retry() {
        let loaded = summary_json("Historic and unprecedented order");
        let generator = MockGenerator::new()
            .respond(loaded)
            .respond(summary_json("Order adjusts import duties"));

        let summary = generate_summary(&generator, "Full text.").await.unwrap();

        assert_eq!(summary.headline, "Order adjusts import duties");
        assert_eq!(generator.call_count(), 2);

        let calls = generator.calls();
        assert_eq!(calls[1].options.temperature, 0.1);
        assert!(calls[1].user.contains("historic, unprecedented"));
        assert!(calls[1].user.contains("Rewrite without any of these words"));
    }

    #[tokio::test]
    async fn second_response_is_final_even_if_still_loaded() {
        let generator = MockGenerator::new()
            .respond(summary_json("A historic first attempt"))
            .respond(summary_json("A historic second attempt"));

        let summary = generate_summary(&generator, "text").await.unwrap();

        // No third call; the loaded second response is accepted as-is.
        assert_eq!(summary.headline, "A historic second attempt");
        assert_eq!(generator.call_count(), 2);
    }

    #[tokio::test]
    async fn long_input_is_truncated_with_marker() {
        let generator = MockGenerator::new().respond(summary_json("h"));
        let long_text = "a".repeat(SUMMARY_INPUT_LIMIT + 500);

        generate_summary(&generator, &long_text).await.unwrap();

        let call = generator.calls().remove(0);
        assert!(call.user.ends_with("\n[truncated]"));
        assert_eq!(call.user.len(), SUMMARY_INPUT_LIMIT + "\n[truncated]".len());
    }

    #[tokio::test]
    async fn non_json_response_is_a_generation_error() {
        let generator = MockGenerator::new().respond("not json at all");

        let err = generate_summary(&generator, "text").await.unwrap_err();
        assert!(err.to_string().contains("summary was not valid JSON"));
    }

    #[tokio::test]
    async fn provider_failure_propagates_without_retry() {
        let generator = MockGenerator::new().respond_err("model unavailable");

        let err = generate_summary(&generator, "text").await.unwrap_err();
        assert!(err.to_string().contains("model unavailable"));
        assert_eq!(generator.call_count(), 1);
    }

    #[tokio::test]
    async fn topic_summary_labels_and_joins_policy_texts() {
        let generator = MockGenerator::new().respond("Plain text roundup.");

        let out = topic_summary(
            &generator,
            "immigration",
            &["First text.".to_string(), "Second text.".to_string()],
        )
        .await
        .unwrap();

        assert_eq!(out, "Plain text roundup.");
        let call = generator.calls().remove(0);
        assert_eq!(call.options.response_format, ResponseFormat::Text);
        assert_eq!(call.options.max_tokens, 2048);
        assert!(call.user.starts_with("Topic: immigration"));
        assert!(call.user.contains("--- Policy 1 ---\nFirst text."));
        assert!(call.user.contains("--- Policy 2 ---\nSecond text."));
    }
}
