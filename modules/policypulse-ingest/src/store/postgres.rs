//! PostgresStore — production PolicyStore backed by sqlx.
//!
//! All writes from one ingestion run share a pool; batch inserts run in
//! a transaction so a crash never leaves half a digest behind.

use std::collections::HashSet;

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

use policypulse_common::{
    ChangeType, ImpactRating, PolicyChange, RunStatus, SourceType, UpcomingEvent,
};

use super::{DigestCandidate, NewDailyDigest, PolicyStore, RunOutcome};

#[derive(Clone)]
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn connect(database_url: &str) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(8)
            .connect(database_url)
            .await?;
        Ok(Self::new(pool))
    }

    /// Apply pending migrations. Embedded at compile time, so no
    /// migration files are needed at runtime.
    pub async fn migrate(&self) -> Result<()> {
        sqlx::migrate!("../../migrations").run(&self.pool).await?;
        info!("Migrations complete");
        Ok(())
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl PolicyStore for PostgresStore {
    async fn create_policy_change(&self, change: &PolicyChange) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO policy_changes (
                id, title, summary, raw_content, change_type, status,
                source_url, source_type, federal_register_number,
                executive_order_number, signing_date, publication_date,
                effective_date, agencies, topics, cfr_references,
                ai_provider, ai_model, created_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12,
                    $13, $14, $15, $16, $17, $18, $19)
            "#,
        )
        .bind(change.id)
        .bind(&change.title)
        .bind(&change.summary)
        .bind(&change.raw_content)
        .bind(change.change_type.as_str())
        .bind(change.status.as_str())
        .bind(&change.source_url)
        .bind(change.source_type.as_str())
        .bind(&change.federal_register_number)
        .bind(change.executive_order_number)
        .bind(change.signing_date)
        .bind(change.publication_date)
        .bind(change.effective_date)
        .bind(&change.agencies)
        .bind(&change.topics)
        .bind(&change.cfr_references)
        .bind(&change.ai_provider)
        .bind(&change.ai_model)
        .bind(change.created_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn register_numbers_present(&self, numbers: &[String]) -> Result<HashSet<String>> {
        let rows = sqlx::query_as::<_, (String,)>(
            r#"
            SELECT federal_register_number
            FROM policy_changes
            WHERE federal_register_number = ANY($1)
            "#,
        )
        .bind(numbers)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(|r| r.0).collect())
    }

    async fn source_urls_present(&self, urls: &[String]) -> Result<HashSet<String>> {
        let rows = sqlx::query_as::<_, (String,)>(
            r#"
            SELECT source_url
            FROM policy_changes
            WHERE source_url = ANY($1)
            "#,
        )
        .bind(urls)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(|r| r.0).collect())
    }

    async fn create_impact_ratings(&self, ratings: &[ImpactRating]) -> Result<()> {
        let mut tx = self.pool.begin().await?;

        for rating in ratings {
            sqlx::query(
                r#"
                INSERT INTO impact_ratings (
                    id, policy_change_id, category, subcategory, score,
                    explanation, confidence, ai_provider, ai_model, created_at
                )
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
                "#,
            )
            .bind(rating.id)
            .bind(rating.policy_change_id)
            .bind(rating.category.as_str())
            .bind(&rating.subcategory)
            .bind(rating.score)
            .bind(&rating.explanation)
            .bind(rating.confidence)
            .bind(&rating.ai_provider)
            .bind(&rating.ai_model)
            .bind(rating.created_at)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(())
    }

    async fn create_upcoming_event(&self, event: &UpcomingEvent) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO upcoming_events (
                id, title, description, event_type, event_date,
                location, source_url, policy_change_id, created_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
        )
        .bind(event.id)
        .bind(&event.title)
        .bind(&event.description)
        .bind(event.event_type.as_str())
        .bind(event.event_date)
        .bind(&event.location)
        .bind(&event.source_url)
        .bind(event.policy_change_id)
        .bind(event.created_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn changes_created_since(&self, since: DateTime<Utc>) -> Result<Vec<DigestCandidate>> {
        let rows = sqlx::query_as::<_, (Uuid, String, String, String)>(
            r#"
            SELECT id, title, summary, change_type
            FROM policy_changes
            WHERE created_at >= $1
            ORDER BY created_at ASC
            "#,
        )
        .bind(since)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|(id, title, summary, change_type)| DigestCandidate {
                id,
                title,
                summary,
                change_type: ChangeType::from_str_loose(&change_type),
            })
            .collect())
    }

    async fn upsert_daily_digest(&self, digest: &NewDailyDigest) -> Result<()> {
        let mut tx = self.pool.begin().await?;

        let existing = sqlx::query_as::<_, (Uuid,)>(
            "SELECT id FROM daily_digests WHERE date = $1",
        )
        .bind(digest.date)
        .fetch_optional(&mut *tx)
        .await?;

        match existing {
            Some((id,)) => {
                // Refresh the header only. Entry rows from the first
                // write survive, so reruns never duplicate them.
                sqlx::query(
                    r#"
                    UPDATE daily_digests
                    SET headline = $2, summary = $3, ai_provider = $4, ai_model = $5
                    WHERE id = $1
                    "#,
                )
                .bind(id)
                .bind(&digest.headline)
                .bind(&digest.summary)
                .bind(&digest.ai_provider)
                .bind(&digest.ai_model)
                .execute(&mut *tx)
                .await?;
            }
            None => {
                let id = Uuid::new_v4();
                sqlx::query(
                    r#"
                    INSERT INTO daily_digests (id, date, headline, summary, ai_provider, ai_model, created_at)
                    VALUES ($1, $2, $3, $4, $5, $6, now())
                    "#,
                )
                .bind(id)
                .bind(digest.date)
                .bind(&digest.headline)
                .bind(&digest.summary)
                .bind(&digest.ai_provider)
                .bind(&digest.ai_model)
                .execute(&mut *tx)
                .await?;

                for entry in &digest.entries {
                    sqlx::query(
                        r#"
                        INSERT INTO digest_entries (id, digest_id, policy_change_id, brief_summary, order_index)
                        VALUES ($1, $2, $3, $4, $5)
                        "#,
                    )
                    .bind(Uuid::new_v4())
                    .bind(id)
                    .bind(entry.policy_change_id)
                    .bind(&entry.brief_summary)
                    .bind(entry.order_index)
                    .execute(&mut *tx)
                    .await?;
                }
            }
        }

        tx.commit().await?;
        Ok(())
    }

    async fn create_ingestion_log(
        &self,
        source: SourceType,
        started_at: DateTime<Utc>,
    ) -> Result<Uuid> {
        let id = Uuid::new_v4();
        sqlx::query(
            r#"
            INSERT INTO ingestion_logs (id, source, status, started_at, documents_found, documents_new)
            VALUES ($1, $2, $3, $4, 0, 0)
            "#,
        )
        .bind(id)
        .bind(source.as_str())
        .bind(RunStatus::Success.as_str())
        .bind(started_at)
        .execute(&self.pool)
        .await?;

        Ok(id)
    }

    async fn complete_ingestion_log(&self, id: Uuid, outcome: &RunOutcome) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE ingestion_logs
            SET status = $2, completed_at = $3, documents_found = $4,
                documents_new = $5, error_message = $6, duration_ms = $7
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(outcome.status.as_str())
        .bind(outcome.completed_at)
        .bind(outcome.documents_found)
        .bind(outcome.documents_new)
        .bind(&outcome.error_message)
        .bind(outcome.duration_ms)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}
