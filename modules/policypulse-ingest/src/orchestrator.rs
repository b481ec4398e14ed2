//! Daily ingestion pipeline.
//!
//! One run: fetch Federal Register documents and news articles, drop
//! what the store already has, enrich each new item with a summary and
//! impact ratings, then refresh the daily digest. Source fetches and
//! per-item enrichment are failure-isolated; store-level failures abort
//! the run. Every run opens and closes one ingestion_logs row.

use std::sync::Arc;

use anyhow::Result;
use chrono::{NaiveTime, Utc};
use tracing::{info, warn};
use uuid::Uuid;

use ai_client::TextGenerator;
use policypulse_common::{
    ChangeStatus, ChangeType, EventType, ImpactRating, PolicyChange, RunStatus, SourceType,
    UpcomingEvent,
};

use crate::dedup;
use crate::digest::generate_digest;
use crate::federal_register::RegisterDocument;
use crate::impact::{analyze_policy, ImpactAnalysis};
use crate::news::{NewsArticle, DEFAULT_MAX_ARTICLES};
use crate::store::{DigestCandidate, NewDailyDigest, NewDigestEntry, PolicyStore, RunOutcome};
use crate::summarize::generate_summary;
use crate::text::clip;
use crate::traits::{DocumentSource, NewsSource};

/// Stored raw content is capped at this many bytes.
pub(crate) const RAW_CONTENT_LIMIT: usize = 50_000;

/// Result of one daily ingestion run.
#[derive(Debug, Default)]
pub struct IngestionReport {
    pub federal_register_found: usize,
    pub federal_register_new: usize,
    pub ap_news_found: usize,
    pub ap_news_new: usize,
    pub digest_generated: bool,
    pub errors: Vec<String>,
}

impl std::fmt::Display for IngestionReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "\n=== Ingestion Complete ===")?;
        writeln!(f, "Federal Register found: {}", self.federal_register_found)?;
        writeln!(f, "Federal Register new:   {}", self.federal_register_new)?;
        writeln!(f, "News articles found:    {}", self.ap_news_found)?;
        writeln!(f, "News articles new:      {}", self.ap_news_new)?;
        writeln!(f, "Digest generated:       {}", self.digest_generated)?;
        if !self.errors.is_empty() {
            writeln!(f, "\nErrors:")?;
            for e in &self.errors {
                writeln!(f, "  - {e}")?;
            }
        }
        Ok(())
    }
}

pub struct Orchestrator {
    store: Arc<dyn PolicyStore>,
    documents: Arc<dyn DocumentSource>,
    news: Arc<dyn NewsSource>,
    generator: Arc<dyn TextGenerator>,
}

impl Orchestrator {
    pub fn new(
        store: Arc<dyn PolicyStore>,
        documents: Arc<dyn DocumentSource>,
        news: Arc<dyn NewsSource>,
        generator: Arc<dyn TextGenerator>,
    ) -> Self {
        Self {
            store,
            documents,
            news,
            generator,
        }
    }

    /// Run one daily ingestion over the trailing `days_back` days.
    pub async fn run(&self, days_back: i64) -> Result<IngestionReport> {
        let started_at = Utc::now();
        info!(days_back, "Starting daily ingestion");

        let log_id = self
            .store
            .create_ingestion_log(SourceType::FederalRegister, started_at)
            .await?;

        match self.run_inner(days_back).await {
            Ok(report) => {
                let status = if report.errors.is_empty() {
                    RunStatus::Success
                } else {
                    RunStatus::PartialFailure
                };
                let outcome = RunOutcome {
                    status,
                    documents_found: (report.federal_register_found + report.ap_news_found)
                        as i32,
                    documents_new: (report.federal_register_new + report.ap_news_new) as i32,
                    error_message: if report.errors.is_empty() {
                        None
                    } else {
                        Some(report.errors.join("\n"))
                    },
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
                    warn!(error = %log_err, "Failed to record run failure in ingestion log");
                }
                Err(e)
            }
        }
    }

    async fn run_inner(&self, days_back: i64) -> Result<IngestionReport> {
        let mut report = IngestionReport::default();

        let fed_docs = match self.documents.recent(days_back).await {
            Ok(docs) => {
                report.federal_register_found = docs.len();
                docs
            }
            Err(e) => {
                report.errors.push(format!("Federal Register fetch failed: {e}"));
                Vec::new()
            }
        };

        let articles = match self.news.fetch(DEFAULT_MAX_ARTICLES).await {
            Ok(articles) => {
                report.ap_news_found = articles.len();
                articles
            }
            Err(e) => {
                report.errors.push(format!("AP News fetch failed: {e}"));
                Vec::new()
            }
        };

        let new_docs = dedup::new_register_documents(self.store.as_ref(), fed_docs).await?;
        report.federal_register_new = new_docs.len();

        let new_articles = dedup::new_articles(self.store.as_ref(), articles).await?;
        report.ap_news_new = new_articles.len();

        for doc in &new_docs {
            if let Err(e) = self.process_document(doc, &mut report.errors).await {
                report
                    .errors
                    .push(format!("Processing failed for {}: {e}", doc.document_number));
            }
        }

        for article in &new_articles {
            if let Err(e) = self.process_article(article).await {
                report
                    .errors
                    .push(format!("AP article processing failed for {}: {e}", article.link));
            }
        }

        let midnight = Utc::now().date_naive().and_time(NaiveTime::MIN).and_utc();
        let candidates = self.store.changes_created_since(midnight).await?;
        if !candidates.is_empty() {
            match self.build_digest(&candidates).await {
                Ok(()) => report.digest_generated = true,
                Err(e) => report.errors.push(format!("Digest generation failed: {e}")),
            }
        }

        Ok(report)
    }

    /// Summarize, store, rate and derive events for one new document.
    /// Impact-analysis failures are recorded but do not fail the
    /// document; the change row is already committed by then.
    async fn process_document(
        &self,
        doc: &RegisterDocument,
        errors: &mut Vec<String>,
    ) -> Result<()> {
        let text = match &doc.raw_text_url {
            Some(url) => match self.documents.full_text(url).await {
                Ok(text) => text,
                Err(e) => {
                    warn!(
                        document = %doc.document_number,
                        error = %e,
                        "Full text fetch failed, using abstract"
                    );
                    doc.fallback_text().to_string()
                }
            },
            None => doc.fallback_text().to_string(),
        };

        let summary = generate_summary(self.generator.as_ref(), &text).await?;

        let title = if summary.headline.is_empty() {
            doc.title.clone()
        } else {
            summary.headline.clone()
        };

        let change = PolicyChange {
            id: Uuid::new_v4(),
            title,
            summary: summary.summary_text(),
            raw_content: clip(&text, RAW_CONTENT_LIMIT).to_string(),
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
            topics: summary.topics.clone(),
            cfr_references: doc.cfr_strings(),
            ai_provider: Some(summary.provider.clone()),
            ai_model: Some(summary.model.clone()),
            created_at: Utc::now(),
        };
        self.store.create_policy_change(&change).await?;

        if let Err(e) = self.rate_impacts(&change, &text).await {
            errors.push(format!(
                "Impact analysis failed for {}: {e}",
                doc.document_number
            ));
        }

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

    async fn rate_impacts(&self, change: &PolicyChange, text: &str) -> Result<()> {
        let analysis =
            analyze_policy(self.generator.as_ref(), &change.title, &change.summary, text).await?;

        let ImpactAnalysis {
            ratings,
            model,
            provider,
        } = analysis;
        if ratings.is_empty() {
            return Ok(());
        }

        let now = Utc::now();
        let ratings: Vec<ImpactRating> = ratings
            .into_iter()
            .map(|r| ImpactRating {
                id: Uuid::new_v4(),
                policy_change_id: change.id,
                category: r.category,
                subcategory: r.subcategory,
                score: r.score,
                explanation: r.explanation,
                confidence: r.confidence,
                ai_provider: provider.clone(),
                ai_model: model.clone(),
                created_at: now,
            })
            .collect();

        self.store.create_impact_ratings(&ratings).await
    }

    async fn process_article(&self, article: &NewsArticle) -> Result<()> {
        let input = format!("{}\n\n{}", article.title, article.content);
        let summary = generate_summary(self.generator.as_ref(), &input).await?;

        let title = if summary.headline.is_empty() {
            article.title.clone()
        } else {
            summary.headline.clone()
        };

        let change = PolicyChange {
            id: Uuid::new_v4(),
            title,
            summary: summary.summary_text(),
            raw_content: clip(&article.content, RAW_CONTENT_LIMIT).to_string(),
            change_type: summary.change_type.unwrap_or(ChangeType::Other),
            status: ChangeStatus::default(),
            source_url: article.link.clone(),
            source_type: SourceType::ApNews,
            federal_register_number: None,
            executive_order_number: None,
            signing_date: None,
            publication_date: Some(article.pub_date.date_naive()),
            effective_date: None,
            agencies: Vec::new(),
            topics: summary.topics.clone(),
            cfr_references: Vec::new(),
            ai_provider: Some(summary.provider),
            ai_model: Some(summary.model),
            created_at: Utc::now(),
        };
        self.store.create_policy_change(&change).await
    }

    async fn build_digest(&self, candidates: &[DigestCandidate]) -> Result<()> {
        let draft = generate_digest(self.generator.as_ref(), candidates).await?;

        let digest = NewDailyDigest {
            date: Utc::now().date_naive(),
            headline: draft.headline,
            summary: draft.summary,
            ai_provider: draft.provider,
            ai_model: draft.model,
            entries: draft
                .entries
                .into_iter()
                .map(|e| NewDigestEntry {
                    policy_change_id: e.policy_change_id,
                    brief_summary: e.brief_summary,
                    order_index: e.order_index,
                })
                .collect(),
        };

        self.store.upsert_daily_digest(&digest).await
    }
}
