// Persistence seam for the pipeline.
//
// PolicyStore carries exactly the operations the ingestion paths use.
// Read surfaces for the product UI live elsewhere; keeping this trait
// narrow keeps MemoryStore honest.

mod postgres;

pub use postgres::PostgresStore;

use std::collections::HashSet;

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use uuid::Uuid;

use policypulse_common::{
    ChangeType, ImpactRating, PolicyChange, RunStatus, SourceType, UpcomingEvent,
};

/// A policy change reduced to what the digest prompt needs. The wire
/// field names are part of the prompt contract.
#[derive(Debug, Clone, Serialize)]
pub struct DigestCandidate {
    pub id: Uuid,
    pub title: String,
    pub summary: String,
    #[serde(rename = "type")]
    pub change_type: ChangeType,
}

/// Digest content to upsert for one calendar day.
#[derive(Debug, Clone)]
pub struct NewDailyDigest {
    pub date: NaiveDate,
    pub headline: String,
    pub summary: String,
    pub ai_provider: String,
    pub ai_model: String,
    pub entries: Vec<NewDigestEntry>,
}

#[derive(Debug, Clone)]
pub struct NewDigestEntry {
    pub policy_change_id: Uuid,
    pub brief_summary: String,
    pub order_index: i32,
}

/// Final accounting for one ingestion run.
#[derive(Debug, Clone)]
pub struct RunOutcome {
    pub status: RunStatus,
    pub documents_found: i32,
    pub documents_new: i32,
    pub error_message: Option<String>,
    pub duration_ms: i64,
    pub completed_at: DateTime<Utc>,
}

#[async_trait]
pub trait PolicyStore: Send + Sync {
    /// Insert one fully-built policy change.
    async fn create_policy_change(&self, change: &PolicyChange) -> Result<()>;

    /// Of the given Federal Register document numbers, return those
    /// already stored.
    async fn register_numbers_present(&self, numbers: &[String]) -> Result<HashSet<String>>;

    /// Of the given source URLs, return those already stored.
    async fn source_urls_present(&self, urls: &[String]) -> Result<HashSet<String>>;

    /// Insert a batch of impact ratings for one policy change.
    async fn create_impact_ratings(&self, ratings: &[ImpactRating]) -> Result<()>;

    async fn create_upcoming_event(&self, event: &UpcomingEvent) -> Result<()>;

    /// Policy changes created at or after `since`, for digest assembly.
    async fn changes_created_since(&self, since: DateTime<Utc>) -> Result<Vec<DigestCandidate>>;

    /// Create or refresh the digest for its date. An update replaces
    /// the headline, summary and attribution but keeps the existing
    /// entries, so reruns never duplicate entry rows.
    async fn upsert_daily_digest(&self, digest: &NewDailyDigest) -> Result<()>;

    /// Open an audit record for a run, returning its id.
    async fn create_ingestion_log(
        &self,
        source: SourceType,
        started_at: DateTime<Utc>,
    ) -> Result<Uuid>;

    /// Close the audit record. Called exactly once per run.
    async fn complete_ingestion_log(&self, id: Uuid, outcome: &RunOutcome) -> Result<()>;
}
