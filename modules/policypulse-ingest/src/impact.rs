// Two-phase demographic impact analysis.
//
// Phase 1 (triage) is a cheap call that names the affected categories;
// phase 2 rates every subcategory of those categories against the full
// text. An empty triage answer skips phase 2 entirely, which is the
// common case for routine notices.

use anyhow::Result;
use serde::{Deserialize, Serialize};
use tracing::debug;

use ai_client::{GenerateOptions, TextGenerator};
use policypulse_common::vocab::subcategory_options;
use policypulse_common::{DemographicCategory, PolicyPulseError};

use crate::prompts::{impact_rating_prompt, triage_prompt};
use crate::text::truncate_with_marker;

const IMPACT_INPUT_LIMIT: usize = 12_000;
/// Ratings below this confidence are forced to a neutral score.
const LOW_CONFIDENCE_FLOOR: f32 = 0.2;
/// States are not enumerated; the model reads them from the text.
const US_STATE_SUBCATEGORY: &str = "See policy text for affected states";

/// One normalized rating: score rounded and clamped to [-2, 2],
/// confidence clamped to [0, 1].
#[derive(Debug, Clone)]
pub struct RatedImpact {
    pub category: DemographicCategory,
    pub subcategory: String,
    pub score: i32,
    pub explanation: String,
    pub confidence: f32,
}

#[derive(Debug, Clone)]
pub struct ImpactAnalysis {
    pub ratings: Vec<RatedImpact>,
    pub model: String,
    pub provider: String,
}

#[derive(Debug, Deserialize)]
struct TriageResponse {
    #[serde(rename = "relevantCategories")]
    relevant_categories: Vec<DemographicCategory>,
}

#[derive(Debug, Deserialize)]
struct WireRating {
    category: DemographicCategory,
    subcategory: String,
    score: f64,
    explanation: String,
    confidence: f32,
}

/// Models answer with a bare array, a {"ratings": [...]} wrapper, or a
/// single object. All three decode to the same list.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RatingsPayload {
    Bare(Vec<WireRating>),
    Wrapped { ratings: Vec<WireRating> },
    Single(WireRating),
}

impl RatingsPayload {
    fn into_ratings(self) -> Vec<WireRating> {
        match self {
            RatingsPayload::Bare(ratings) => ratings,
            RatingsPayload::Wrapped { ratings } => ratings,
            RatingsPayload::Single(rating) => vec![rating],
        }
    }
}

#[derive(Debug, Serialize)]
struct RatingTarget {
    category: DemographicCategory,
    subcategory: String,
}

fn normalize(wire: WireRating) -> RatedImpact {
    let confidence = wire.confidence.clamp(0.0, 1.0);
    let score = if confidence < LOW_CONFIDENCE_FLOOR {
        0
    } else {
        wire.score.round().clamp(-2.0, 2.0) as i32
    };
    RatedImpact {
        category: wire.category,
        subcategory: wire.subcategory,
        score,
        explanation: wire.explanation,
        confidence,
    }
}

fn rating_targets(categories: &[DemographicCategory]) -> Vec<RatingTarget> {
    let mut targets = Vec::new();
    for &category in categories {
        if category == DemographicCategory::UsState {
            targets.push(RatingTarget {
                category,
                subcategory: US_STATE_SUBCATEGORY.to_string(),
            });
        } else {
            for sub in subcategory_options(category) {
                targets.push(RatingTarget {
                    category,
                    subcategory: (*sub).to_string(),
                });
            }
        }
    }
    targets
}

/// Phase 1: which categories does this policy measurably affect?
pub async fn triage_relevant_categories(
    generator: &dyn TextGenerator,
    title: &str,
    summary: &str,
) -> Result<Vec<DemographicCategory>> {
    let user = format!("Policy: {title}\n\nSummary: {summary}");

    let response = generator
        .generate(
            &triage_prompt(),
            &user,
            GenerateOptions::default().json().temperature(0.1).max_tokens(256),
        )
        .await?;

    let parsed: TriageResponse = serde_json::from_str(response.content.trim())
        .map_err(|e| PolicyPulseError::Generation(format!("triage was not valid JSON: {e}")))?;
    Ok(parsed.relevant_categories)
}

/// Phase 2: score every subcategory of the triaged categories.
pub async fn generate_impact_ratings(
    generator: &dyn TextGenerator,
    title: &str,
    summary: &str,
    text: &str,
    categories: &[DemographicCategory],
) -> Result<ImpactAnalysis> {
    let targets = rating_targets(categories);
    let targets_json = serde_json::to_string_pretty(&targets)?;
    let truncated = truncate_with_marker(text, IMPACT_INPUT_LIMIT);

    let user = format!(
        "Policy: {title}\n\nSummary: {summary}\n\nFull text:\n{truncated}\n\n\
         Rate the impact on these demographics:\n{targets_json}"
    );

    let response = generator
        .generate(
            &impact_rating_prompt(),
            &user,
            GenerateOptions::default().json().temperature(0.2).max_tokens(4096),
        )
        .await?;

    let payload: RatingsPayload = serde_json::from_str(response.content.trim())
        .map_err(|e| PolicyPulseError::Generation(format!("ratings were not valid JSON: {e}")))?;
    let ratings = payload.into_ratings().into_iter().map(normalize).collect();

    Ok(ImpactAnalysis {
        ratings,
        model: response.model,
        provider: response.provider,
    })
}

/// Full two-phase analysis for one policy change.
pub async fn analyze_policy(
    generator: &dyn TextGenerator,
    title: &str,
    summary: &str,
    text: &str,
) -> Result<ImpactAnalysis> {
    let categories = triage_relevant_categories(generator, title, summary).await?;

    if categories.is_empty() {
        debug!(title, "Triage found no affected categories, skipping ratings");
        return Ok(ImpactAnalysis {
            ratings: Vec::new(),
            model: String::new(),
            provider: String::new(),
        });
    }

    generate_impact_ratings(generator, title, summary, text, &categories).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{triage_json, MockGenerator};

    fn wire(score: f64, confidence: f32) -> WireRating {
        WireRating {
            category: DemographicCategory::Sex,
            subcategory: "Women".to_string(),
            score,
            explanation: "Cited provision.".to_string(),
            confidence,
        }
    }

    #[test]
    fn scores_are_rounded_then_clamped() {
        assert_eq!(normalize(wire(1.4, 0.9)).score, 1);
        assert_eq!(normalize(wire(1.6, 0.9)).score, 2);
        assert_eq!(normalize(wire(7.0, 0.9)).score, 2);
        assert_eq!(normalize(wire(-7.0, 0.9)).score, -2);
        assert_eq!(normalize(wire(0.0, 0.9)).score, 0);
    }

    #[test]
    fn confidence_is_clamped_into_unit_interval() {
        assert_eq!(normalize(wire(1.0, 1.7)).confidence, 1.0);
        assert_eq!(normalize(wire(1.0, -0.3)).confidence, 0.0);
    }

    #[test]
    fn low_confidence_forces_neutral_score() {
        let rated = normalize(wire(2.0, 0.1));
        assert_eq!(rated.score, 0);
        assert_eq!(rated.confidence, 0.1);
        // At the floor itself the score survives.
        assert_eq!(normalize(wire(2.0, 0.2)).score, 2);
    }

    #[test]
    fn payload_decodes_all_three_shapes() {
        let bare = r#"[{"category":"SEX","subcategory":"Women","score":1,"explanation":"x","confidence":0.8}]"#;
        let wrapped = r#"{"ratings":[{"category":"SEX","subcategory":"Women","score":1,"explanation":"x","confidence":0.8}]}"#;
        let single = r#"{"category":"SEX","subcategory":"Women","score":1,"explanation":"x","confidence":0.8}"#;

        for (raw, expected) in [(bare, 1), (wrapped, 1), (single, 1)] {
            let payload: RatingsPayload = serde_json::from_str(raw).unwrap();
            assert_eq!(payload.into_ratings().len(), expected);
        }
    }

    #[test]
    fn targets_expand_subcategories_except_states() {
        let targets = rating_targets(&[
            DemographicCategory::Sex,
            DemographicCategory::UsState,
        ]);

        let sex: Vec<_> = targets
            .iter()
            .filter(|t| t.category == DemographicCategory::Sex)
            .collect();
        assert_eq!(sex.len(), subcategory_options(DemographicCategory::Sex).len());

        let states: Vec<_> = targets
            .iter()
            .filter(|t| t.category == DemographicCategory::UsState)
            .collect();
        assert_eq!(states.len(), 1);
        assert_eq!(states[0].subcategory, US_STATE_SUBCATEGORY);
    }

    #[tokio::test]
    async fn empty_triage_skips_the_rating_call() {
        let generator = MockGenerator::new().respond(triage_json(&[]));

        let analysis = analyze_policy(&generator, "Notice", "A routine notice.", "text")
            .await
            .unwrap();

        assert!(analysis.ratings.is_empty());
        assert_eq!(analysis.model, "");
        assert_eq!(analysis.provider, "");
        assert_eq!(generator.call_count(), 1);
    }

    #[tokio::test]
    async fn two_phase_flow_passes_targets_to_the_rating_call() {
        let ratings = r#"[{"category":"SALARY_BRACKET","subcategory":"Under $25k","score":1.6,"explanation":"Benefit expansion.","confidence":0.9}]"#;
        let generator = MockGenerator::new()
            .respond(triage_json(&["SALARY_BRACKET"]))
            .respond(ratings);

        let analysis = analyze_policy(&generator, "Order", "Summary.", "Full text.")
            .await
            .unwrap();

        assert_eq!(analysis.ratings.len(), 1);
        assert_eq!(analysis.ratings[0].score, 2);
        assert_eq!(generator.call_count(), 2);

        let calls = generator.calls();
        assert_eq!(calls[0].options.max_tokens, 256);
        assert!(calls[1].user.contains("Rate the impact on these demographics:"));
        assert!(calls[1].user.contains("\"subcategory\": \"Under $25k\""));
        assert!(calls[1].user.contains("\"category\": \"SALARY_BRACKET\""));
    }

    #[tokio::test]
    async fn malformed_triage_is_a_generation_error() {
        let generator = MockGenerator::new().respond("not json");

        let err = analyze_policy(&generator, "t", "s", "x").await.unwrap_err();
        assert!(err.to_string().contains("triage was not valid JSON"));
    }
}
