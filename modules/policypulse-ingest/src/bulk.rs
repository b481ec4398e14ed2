//! Bulk backfill of Federal Register documents.
//!
//! No AI calls here: summaries fall back to the document abstract and
//! topics come from the keyword table, which keeps a multi-thousand
//! document backfill fast and free. The daily pipeline enriches only
//! what arrives after the backfill.

use std::sync::Arc;

use anyhow::Result;
use chrono::{NaiveDate, NaiveTime, Utc};
use tracing::warn;
use uuid::Uuid;

use policypulse_common::vocab::topics_for;
use policypulse_common::{
    ChangeStatus, EventType, PolicyChange, RunStatus, SourceType, UpcomingEvent,
};

use crate::dedup;
use crate::federal_register::RegisterDocument;
use crate::orchestrator::RAW_CONTENT_LIMIT;
use crate::store::{PolicyStore, RunOutcome};
use crate::text::clip;
use crate::traits::DocumentSource;

/// First day of the tracked administration. Default backfill start.
pub const BACKFILL_START: &str = "2025-01-20";

/// Emit an insert progress line every this many documents.
const PROGRESS_INTERVAL: usize = 25;
/// The audit log keeps at most this many insert errors.
const LOGGED_ERROR_CAP: usize = 20;

/// Progress callback for long backfills. Messages are preformatted.
pub type Progress<'a> = &'a (dyn Fn(&str) + Send + Sync);

#[derive(Debug, Default)]
pub struct BulkReport {
    pub total_fetched: usize,
    pub total_new: usize,
    pub total_inserted: usize,
    pub errors: Vec<String>,
}

pub struct BulkRunner {
    store: Arc<dyn PolicyStore>,
    documents: Arc<dyn DocumentSource>,
}

impl BulkRunner {
    pub fn new(store: Arc<dyn PolicyStore>, documents: Arc<dyn DocumentSource>) -> Self {
        Self { store, documents }
    }

    /// Backfill every document published in the date range. `date_to`
    /// of `None` means "to present". Insert failures are collected per
    /// document; fetch and store-lookup failures abort the run.
    pub async fn run(
        &self,
        date_from: NaiveDate,
        date_to: Option<NaiveDate>,
        on_progress: Progress<'_>,
    ) -> Result<BulkReport> {
        let started_at = Utc::now();
        let log_id = self
            .store
            .create_ingestion_log(SourceType::FederalRegister, started_at)
            .await?;

        match self.run_inner(date_from, date_to, on_progress).await {
            Ok(report) => {
                let status = if report.errors.is_empty() {
                    RunStatus::Success
                } else {
                    RunStatus::PartialFailure
                };
                let error_message = if report.errors.is_empty() {
                    None
                } else {
                    Some(
                        report
                            .errors
                            .iter()
                            .take(LOGGED_ERROR_CAP)
                            .cloned()
                            .collect::<Vec<_>>()
                            .join("\n"),
                    )
                };
                let outcome = RunOutcome {
                    status,
                    documents_found: report.total_fetched as i32,
                    documents_new: report.total_new as i32,
                    error_message,
                    duration_ms: (Utc::now() - started_at).num_milliseconds(),
                    completed_at: Utc::now(),
                };
                self.store.complete_ingestion_log(log_id, &outcome).await?;
                Ok(report)
            }
            Err(e) => {
                let outcome = RunOutcome {
                    status: RunStatus::Failure,
                    documents_found: 0,
                    documents_new: 0,
                    error_message: Some(e.to_string()),
                    duration_ms: (Utc::now() - started_at).num_milliseconds(),
                    completed_at: Utc::now(),
                };
                if let Err(log_err) = self.store.complete_ingestion_log(log_id, &outcome).await {
                    warn!(error = %log_err, "Failed to record backfill failure in ingestion log");
                }
                Err(e)
            }
        }
    }

    async fn run_inner(
        &self,
        date_from: NaiveDate,
        date_to: Option<NaiveDate>,
        on_progress: Progress<'_>,
    ) -> Result<BulkReport> {
        let mut report = BulkReport::default();

        on_progress(&match date_to {
            Some(to) => format!("Fetching documents from {date_from} to {to}..."),
            None => format!("Fetching documents from {date_from} to present..."),
        });

        let all_docs = self
            .documents
            .range(date_from, date_to, &|page, total| {
                on_progress(&format!("  Fetched page {page}/{total}"));
            })
            .await?;

        report.total_fetched = all_docs.len();
        on_progress(&format!("Total documents fetched: {}", report.total_fetched));

        let new_docs = dedup::new_register_documents(self.store.as_ref(), all_docs).await?;
        report.total_new = new_docs.len();
        on_progress(&format!(
            "New documents to insert: {} ({} already in DB)",
            report.total_new,
            report.total_fetched - report.total_new
        ));

        let total = new_docs.len();
        for (i, doc) in new_docs.iter().enumerate() {
            match self.insert_document(doc).await {
                Ok(()) => {
                    report.total_inserted += 1;
                    if (i + 1) % PROGRESS_INTERVAL == 0 || i == total - 1 {
                        on_progress(&format!("  Inserted {}/{total} documents", i + 1));
                    }
                }
                Err(e) => {
                    report
                        .errors
                        .push(format!("Failed to insert {}: {e}", doc.document_number));
                }
            }
        }

        Ok(report)
    }

    async fn insert_document(&self, doc: &RegisterDocument) -> Result<()> {
        let summary = doc
            .abstract_text
            .as_deref()
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| format!("{}. Published {}.", doc.title, doc.publication_date));

        let change = PolicyChange {
            id: Uuid::new_v4(),
            title: doc.title.clone(),
            summary,
            raw_content: clip(doc.fallback_text(), RAW_CONTENT_LIMIT).to_string(),
            change_type: doc.change_type(),
            status: ChangeStatus::default(),
            source_url: doc.html_url.clone(),
            source_type: SourceType::FederalRegister,
            federal_register_number: Some(doc.document_number.clone()),
            executive_order_number: doc.executive_order_number,
            signing_date: doc.signing_date,
            publication_date: Some(doc.publication_date),
            effective_date: doc.effective_on,
            agencies: doc.agency_names(),
            topics: topics_for(&doc.title, doc.abstract_text.as_deref()),
            cfr_references: doc.cfr_strings(),
            ai_provider: None,
            ai_model: None,
            created_at: Utc::now(),
        };
        self.store.create_policy_change(&change).await?;

        if let Some(effective) = doc.effective_on {
            let event_date = effective.and_time(NaiveTime::MIN).and_utc();
            if event_date > Utc::now() {
                let event = UpcomingEvent {
                    id: Uuid::new_v4(),
                    title: format!("{} takes effect", change.title),
                    description: format!(
                        "This policy action becomes effective on {effective}."
                    ),
                    event_type: EventType::Implementation,
                    event_date,
                    location: None,
                    source_url: doc.html_url.clone(),
                    policy_change_id: Some(change.id),
                    created_at: Utc::now(),
                };
                self.store.create_upcoming_event(&event).await?;
            }
        }

        Ok(())
    }
}
