// Daily digest generation. The model picks the 3-5 most significant
// changes from today's candidates; anything it invents (ids that were
// never offered) is dropped before the draft reaches the store.

use anyhow::Result;
use serde::Deserialize;
use std::collections::HashSet;
use tracing::warn;
use uuid::Uuid;

use ai_client::{GenerateOptions, TextGenerator};
use policypulse_common::PolicyPulseError;

use crate::prompts::daily_digest_prompt;
use crate::store::DigestCandidate;

#[derive(Debug, Clone)]
pub struct DigestDraft {
    pub headline: String,
    pub summary: String,
    pub entries: Vec<DigestEntryDraft>,
    pub model: String,
    pub provider: String,
}

#[derive(Debug, Clone)]
pub struct DigestEntryDraft {
    pub policy_change_id: Uuid,
    pub brief_summary: String,
    pub order_index: i32,
}

#[derive(Debug, Deserialize)]
struct DigestResponse {
    headline: String,
    summary: String,
    #[serde(default)]
    entries: Vec<WireEntry>,
}

#[derive(Debug, Deserialize)]
struct WireEntry {
    #[serde(rename = "policyChangeId")]
    policy_change_id: String,
    #[serde(rename = "briefSummary")]
    brief_summary: String,
    #[serde(rename = "orderIndex")]
    order_index: i32,
}

/// Draft a digest from the day's candidates. Entries referencing
/// unknown or unparseable ids are dropped with a warning; remaining
/// entries keep the model's ordering.
pub async fn generate_digest(
    generator: &dyn TextGenerator,
    candidates: &[DigestCandidate],
) -> Result<DigestDraft> {
    let candidates_json = serde_json::to_string(candidates)?;

    let response = generator
        .generate(
            &daily_digest_prompt(),
            &candidates_json,
            GenerateOptions::default().json().temperature(0.3),
        )
        .await?;

    let parsed: DigestResponse = serde_json::from_str(response.content.trim())
        .map_err(|e| PolicyPulseError::Generation(format!("digest was not valid JSON: {e}")))?;

    let known: HashSet<Uuid> = candidates.iter().map(|c| c.id).collect();
    let mut entries = Vec::with_capacity(parsed.entries.len());
    for entry in parsed.entries {
        let id = match Uuid::parse_str(&entry.policy_change_id) {
            Ok(id) => id,
            Err(_) => {
                warn!(id = %entry.policy_change_id, "Digest entry id is not a UUID, dropping");
                continue;
            }
        };
        if !known.contains(&id) {
            warn!(id = %id, "Digest entry references an unknown policy change, dropping");
            continue;
        }
        entries.push(DigestEntryDraft {
            policy_change_id: id,
            brief_summary: entry.brief_summary,
            order_index: entry.order_index,
        });
    }

    Ok(DigestDraft {
        headline: parsed.headline,
        summary: parsed.summary,
        entries,
        model: response.model,
        provider: response.provider,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MockGenerator;
    use policypulse_common::ChangeType;

    fn candidate(id: Uuid, title: &str) -> DigestCandidate {
        DigestCandidate {
            id,
            title: title.to_string(),
            summary: format!("{title} summary."),
            change_type: ChangeType::ExecutiveOrder,
        }
    }

    fn digest_body(entries: &[(String, i32)]) -> String {
        let entries: Vec<String> = entries
            .iter()
            .map(|(id, order)| {
                format!(
                    r#"{{"policyChangeId":"{id}","briefSummary":"Brief.","orderIndex":{order}}}"#
                )
            })
            .collect();
        format!(
            r#"{{"headline":"Busy day","summary":"Several actions.","entries":[{}]}}"#,
            entries.join(",")
        )
    }

    #[tokio::test]
    async fn candidates_reach_the_model_with_wire_field_names() {
        let id = Uuid::new_v4();
        let generator = MockGenerator::new().respond(digest_body(&[(id.to_string(), 0)]));

        let draft = generate_digest(&generator, &[candidate(id, "Tariff order")])
            .await
            .unwrap();

        assert_eq!(draft.headline, "Busy day");
        assert_eq!(draft.entries.len(), 1);
        assert_eq!(draft.entries[0].policy_change_id, id);

        let calls = generator.calls();
        assert!(calls[0].user.contains(r#""type":"EXECUTIVE_ORDER""#));
        assert!(calls[0].user.contains("Tariff order"));
    }

    #[tokio::test]
    async fn foreign_ids_are_dropped_and_order_is_preserved() {
        let known_a = Uuid::new_v4();
        let known_b = Uuid::new_v4();
        let foreign = Uuid::new_v4();
        let generator = MockGenerator::new().respond(digest_body(&[
            (known_b.to_string(), 0),
            (foreign.to_string(), 1),
            (known_a.to_string(), 2),
        ]));

        let draft = generate_digest(
            &generator,
            &[candidate(known_a, "A"), candidate(known_b, "B")],
        )
        .await
        .unwrap();

        let ids: Vec<Uuid> = draft.entries.iter().map(|e| e.policy_change_id).collect();
        assert_eq!(ids, vec![known_b, known_a]);
        assert_eq!(draft.entries[1].order_index, 2);
    }

    #[tokio::test]
    async fn unparseable_ids_are_dropped() {
        let id = Uuid::new_v4();
        let generator = MockGenerator::new().respond(digest_body(&[
            ("not-a-uuid".to_string(), 0),
            (id.to_string(), 1),
        ]));

        let draft = generate_digest(&generator, &[candidate(id, "A")]).await.unwrap();

        assert_eq!(draft.entries.len(), 1);
        assert_eq!(draft.entries[0].policy_change_id, id);
    }

    #[tokio::test]
    async fn malformed_digest_is_a_generation_error() {
        let id = Uuid::new_v4();
        let generator = MockGenerator::new().respond("no json here");

        let err = generate_digest(&generator, &[candidate(id, "A")])
            .await
            .unwrap_err();
        assert!(err.to_string().contains("digest was not valid JSON"));
    }
}
