// Test mocks for the ingestion pipeline.
//
// Four mocks matching the four trait boundaries:
// - MockGenerator (TextGenerator) — scripted responses, records calls
// - MockDocumentSource (DocumentSource) — canned listing pages and texts
// - MockNewsSource (NewsSource) — canned articles
// - MemoryStore (PolicyStore) — stateful in-memory persistence
//
// Plus fixture helpers for RegisterDocument, NewsArticle and the JSON
// payloads the generation layers parse.

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Mutex;

use anyhow::{bail, Result};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use serde_json::json;
use uuid::Uuid;

use ai_client::{GenerateOptions, Generation, TextGenerator, TokenUsage};
use policypulse_common::{ImpactRating, PolicyChange, SourceType, UpcomingEvent};

use crate::federal_register::RegisterDocument;
use crate::news::NewsArticle;
use crate::store::{DigestCandidate, NewDailyDigest, PolicyStore, RunOutcome};
use crate::traits::{DocumentSource, NewsSource, PageProgress};

// ---------------------------------------------------------------------------
// MockGenerator
// ---------------------------------------------------------------------------

/// One recorded `generate` call.
#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub system: String,
    pub user: String,
    pub options: GenerateOptions,
}

enum Scripted {
    Content(String),
    Failure(String),
}

struct MockGeneratorInner {
    responses: VecDeque<Scripted>,
    calls: Vec<RecordedCall>,
}

/// Scripted text generator. Responses are consumed in order; running
/// out of script is an error. Builder pattern: `.respond()`,
/// `.respond_err()`.
pub struct MockGenerator {
    inner: Mutex<MockGeneratorInner>,
}

impl MockGenerator {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(MockGeneratorInner {
                responses: VecDeque::new(),
                calls: Vec::new(),
            }),
        }
    }

    pub fn respond(self, content: impl Into<String>) -> Self {
        self.inner
            .lock()
            .unwrap()
            .responses
            .push_back(Scripted::Content(content.into()));
        self
    }

    pub fn respond_err(self, message: impl Into<String>) -> Self {
        self.inner
            .lock()
            .unwrap()
            .responses
            .push_back(Scripted::Failure(message.into()));
        self
    }

    pub fn call_count(&self) -> usize {
        self.inner.lock().unwrap().calls.len()
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.inner.lock().unwrap().calls.clone()
    }
}

#[async_trait]
impl TextGenerator for MockGenerator {
    async fn generate(
        &self,
        system: &str,
        user: &str,
        options: GenerateOptions,
    ) -> Result<Generation> {
        let mut inner = self.inner.lock().unwrap();
        inner.calls.push(RecordedCall {
            system: system.to_string(),
            user: user.to_string(),
            options,
        });
        match inner.responses.pop_front() {
            Some(Scripted::Content(content)) => Ok(Generation {
                content,
                model: "mock-model".to_string(),
                provider: "mock".to_string(),
                usage: TokenUsage::default(),
            }),
            Some(Scripted::Failure(message)) => bail!("{message}"),
            None => bail!("MockGenerator: no scripted response left"),
        }
    }
}

// ---------------------------------------------------------------------------
// MockDocumentSource
// ---------------------------------------------------------------------------

/// Canned Federal Register source. `recent` serves one fixed batch;
/// `range` replays registered pages in order, firing the progress
/// callback like the real client. Builder pattern: `.recent_documents()`,
/// `.with_page()`, `.on_full_text()`.
pub struct MockDocumentSource {
    recent: Vec<RegisterDocument>,
    pages: Vec<Vec<RegisterDocument>>,
    full_texts: HashMap<String, String>,
    fail_recent: bool,
    fail_range: bool,
}

impl MockDocumentSource {
    pub fn new() -> Self {
        Self {
            recent: Vec::new(),
            pages: Vec::new(),
            full_texts: HashMap::new(),
            fail_recent: false,
            fail_range: false,
        }
    }

    pub fn recent_documents(mut self, docs: Vec<RegisterDocument>) -> Self {
        self.recent = docs;
        self
    }

    pub fn with_page(mut self, docs: Vec<RegisterDocument>) -> Self {
        self.pages.push(docs);
        self
    }

    pub fn on_full_text(mut self, raw_text_url: &str, text: &str) -> Self {
        self.full_texts
            .insert(raw_text_url.to_string(), text.to_string());
        self
    }

    pub fn failing_recent(mut self) -> Self {
        self.fail_recent = true;
        self
    }

    pub fn failing_range(mut self) -> Self {
        self.fail_range = true;
        self
    }
}

#[async_trait]
impl DocumentSource for MockDocumentSource {
    async fn recent(&self, _days_back: i64) -> Result<Vec<RegisterDocument>> {
        if self.fail_recent {
            bail!("MockDocumentSource: recent forced failure");
        }
        Ok(self.recent.clone())
    }

    async fn range(
        &self,
        _date_from: NaiveDate,
        _date_to: Option<NaiveDate>,
        on_page: PageProgress<'_>,
    ) -> Result<Vec<RegisterDocument>> {
        if self.fail_range {
            bail!("MockDocumentSource: range forced failure");
        }
        if self.pages.is_empty() {
            on_page(1, 1);
            return Ok(Vec::new());
        }
        let total = self.pages.len() as u32;
        let mut docs = Vec::new();
        for (i, page) in self.pages.iter().enumerate() {
            on_page(i as u32 + 1, total);
            docs.extend(page.iter().cloned());
        }
        Ok(docs)
    }

    async fn full_text(&self, raw_text_url: &str) -> Result<String> {
        self.full_texts
            .get(raw_text_url)
            .cloned()
            .ok_or_else(|| anyhow::anyhow!("MockDocumentSource: no text registered for {raw_text_url}"))
    }
}

// ---------------------------------------------------------------------------
// MockNewsSource
// ---------------------------------------------------------------------------

/// Canned news source. Serves up to `max_articles` of the fixed batch.
pub struct MockNewsSource {
    articles: Vec<NewsArticle>,
    fail: bool,
}

impl MockNewsSource {
    pub fn new(articles: Vec<NewsArticle>) -> Self {
        Self {
            articles,
            fail: false,
        }
    }

    pub fn failing(mut self) -> Self {
        self.fail = true;
        self
    }
}

#[async_trait]
impl NewsSource for MockNewsSource {
    async fn fetch(&self, max_articles: usize) -> Result<Vec<NewsArticle>> {
        if self.fail {
            bail!("MockNewsSource: fetch forced failure");
        }
        Ok(self.articles.iter().take(max_articles).cloned().collect())
    }
}

// ---------------------------------------------------------------------------
// MemoryStore
// ---------------------------------------------------------------------------

/// One audit record held by MemoryStore.
#[derive(Debug, Clone)]
pub struct LogRecord {
    pub id: Uuid,
    pub source: SourceType,
    pub started_at: DateTime<Utc>,
    pub outcome: Option<RunOutcome>,
}

/// Inner mutable state for MemoryStore.
struct MemoryStoreInner {
    changes: Vec<PolicyChange>,
    register_numbers: HashSet<String>,
    source_urls: HashSet<String>,
    ratings: Vec<ImpactRating>,
    events: Vec<UpcomingEvent>,
    digests: HashMap<NaiveDate, NewDailyDigest>,
    logs: Vec<LogRecord>,
    register_lookups: usize,
    url_lookups: usize,
    fail_on_create: bool,
    fail_register_lookup: bool,
}

/// Stateful in-memory PolicyStore. Created changes feed the dedup
/// lookups, so a second run over the same documents sees them as
/// already present.
pub struct MemoryStore {
    inner: Mutex<MemoryStoreInner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(MemoryStoreInner {
                changes: Vec::new(),
                register_numbers: HashSet::new(),
                source_urls: HashSet::new(),
                ratings: Vec::new(),
                events: Vec::new(),
                digests: HashMap::new(),
                logs: Vec::new(),
                register_lookups: 0,
                url_lookups: 0,
                fail_on_create: false,
                fail_register_lookup: false,
            }),
        }
    }

    pub fn with_known_register_number(self, number: &str) -> Self {
        self.inner
            .lock()
            .unwrap()
            .register_numbers
            .insert(number.to_string());
        self
    }

    pub fn with_known_source_url(self, url: &str) -> Self {
        self.inner
            .lock()
            .unwrap()
            .source_urls
            .insert(url.to_string());
        self
    }

    pub fn failing_creates(self) -> Self {
        self.inner.lock().unwrap().fail_on_create = true;
        self
    }

    pub fn failing_register_lookup(self) -> Self {
        self.inner.lock().unwrap().fail_register_lookup = true;
        self
    }

    // --- assertion helpers ---

    pub fn changes_created(&self) -> Vec<PolicyChange> {
        self.inner.lock().unwrap().changes.clone()
    }

    pub fn change_by_number(&self, number: &str) -> Option<PolicyChange> {
        let inner = self.inner.lock().unwrap();
        inner
            .changes
            .iter()
            .find(|c| c.federal_register_number.as_deref() == Some(number))
            .cloned()
    }

    pub fn ratings(&self) -> Vec<ImpactRating> {
        self.inner.lock().unwrap().ratings.clone()
    }

    pub fn events(&self) -> Vec<UpcomingEvent> {
        self.inner.lock().unwrap().events.clone()
    }

    pub fn digest_for(&self, date: NaiveDate) -> Option<NewDailyDigest> {
        self.inner.lock().unwrap().digests.get(&date).cloned()
    }

    pub fn logs(&self) -> Vec<LogRecord> {
        self.inner.lock().unwrap().logs.clone()
    }

    /// Outcome of the most recent run, if it was completed.
    pub fn last_log_outcome(&self) -> Option<RunOutcome> {
        let inner = self.inner.lock().unwrap();
        inner.logs.last().and_then(|l| l.outcome.clone())
    }

    pub fn register_lookup_calls(&self) -> usize {
        self.inner.lock().unwrap().register_lookups
    }

    pub fn url_lookup_calls(&self) -> usize {
        self.inner.lock().unwrap().url_lookups
    }
}

#[async_trait]
impl PolicyStore for MemoryStore {
    async fn create_policy_change(&self, change: &PolicyChange) -> Result<()> {
        let mut inner = self.inner.lock().unwrap();
        if inner.fail_on_create {
            bail!("MemoryStore: create_policy_change forced failure");
        }
        if let Some(number) = &change.federal_register_number {
            inner.register_numbers.insert(number.clone());
        }
        inner.source_urls.insert(change.source_url.clone());
        inner.changes.push(change.clone());
        Ok(())
    }

    async fn register_numbers_present(&self, numbers: &[String]) -> Result<HashSet<String>> {
        let mut inner = self.inner.lock().unwrap();
        inner.register_lookups += 1;
        if inner.fail_register_lookup {
            bail!("MemoryStore: register lookup forced failure");
        }
        Ok(numbers
            .iter()
            .filter(|n| inner.register_numbers.contains(*n))
            .cloned()
            .collect())
    }

    async fn source_urls_present(&self, urls: &[String]) -> Result<HashSet<String>> {
        let mut inner = self.inner.lock().unwrap();
        inner.url_lookups += 1;
        Ok(urls
            .iter()
            .filter(|u| inner.source_urls.contains(*u))
            .cloned()
            .collect())
    }

    async fn create_impact_ratings(&self, ratings: &[ImpactRating]) -> Result<()> {
        let mut inner = self.inner.lock().unwrap();
        if inner.fail_on_create {
            bail!("MemoryStore: create_impact_ratings forced failure");
        }
        inner.ratings.extend(ratings.iter().cloned());
        Ok(())
    }

    async fn create_upcoming_event(&self, event: &UpcomingEvent) -> Result<()> {
        let mut inner = self.inner.lock().unwrap();
        inner.events.push(event.clone());
        Ok(())
    }

    async fn changes_created_since(&self, since: DateTime<Utc>) -> Result<Vec<DigestCandidate>> {
        let inner = self.inner.lock().unwrap();
        Ok(inner
            .changes
            .iter()
            .filter(|c| c.created_at >= since)
            .map(|c| DigestCandidate {
                id: c.id,
                title: c.title.clone(),
                summary: c.summary.clone(),
                change_type: c.change_type,
            })
            .collect())
    }

    async fn upsert_daily_digest(&self, digest: &NewDailyDigest) -> Result<()> {
        let mut inner = self.inner.lock().unwrap();
        match inner.digests.get_mut(&digest.date) {
            Some(existing) => {
                // Entry rows survive an update, mirroring the SQL path.
                existing.headline = digest.headline.clone();
                existing.summary = digest.summary.clone();
                existing.ai_provider = digest.ai_provider.clone();
                existing.ai_model = digest.ai_model.clone();
            }
            None => {
                inner.digests.insert(digest.date, digest.clone());
            }
        }
        Ok(())
    }

    async fn create_ingestion_log(
        &self,
        source: SourceType,
        started_at: DateTime<Utc>,
    ) -> Result<Uuid> {
        let mut inner = self.inner.lock().unwrap();
        let id = Uuid::new_v4();
        inner.logs.push(LogRecord {
            id,
            source,
            started_at,
            outcome: None,
        });
        Ok(id)
    }

    async fn complete_ingestion_log(&self, id: Uuid, outcome: &RunOutcome) -> Result<()> {
        let mut inner = self.inner.lock().unwrap();
        let Some(record) = inner.logs.iter_mut().find(|l| l.id == id) else {
            bail!("MemoryStore: unknown ingestion log {id}");
        };
        if record.outcome.is_some() {
            bail!("MemoryStore: ingestion log {id} already completed");
        }
        record.outcome = Some(outcome.clone());
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

/// A presidential document as the listing API would return it. No raw
/// text URL, so processing falls back to the abstract.
pub fn register_doc(number: &str, title: &str) -> RegisterDocument {
    RegisterDocument {
        document_number: number.to_string(),
        title: title.to_string(),
        abstract_text: Some(format!("{title} abstract.")),
        doc_type: "PRESDOCU".to_string(),
        subtype: Some("executive_order".to_string()),
        publication_date: NaiveDate::from_ymd_opt(2025, 8, 1).unwrap(),
        signing_date: None,
        effective_on: None,
        agencies: Vec::new(),
        citation: None,
        html_url: format!("https://www.federalregister.gov/d/{number}"),
        raw_text_url: None,
        executive_order_number: None,
        cfr_references: Vec::new(),
    }
}

/// Like `register_doc` but with an effective date.
pub fn register_doc_effective(number: &str, title: &str, effective_on: NaiveDate) -> RegisterDocument {
    let mut doc = register_doc(number, title);
    doc.effective_on = Some(effective_on);
    doc
}

pub fn article(title: &str, link: &str) -> NewsArticle {
    NewsArticle {
        title: title.to_string(),
        link: link.to_string(),
        pub_date: Utc::now(),
        snippet: format!("{title} snippet."),
        content: format!("{title} body text."),
    }
}

/// A well-formed summary response. The fixed fields stay clear of the
/// loaded-word list so the headline alone decides whether the
/// neutrality retry fires.
pub fn summary_json(headline: &str) -> String {
    json!({
        "headline": headline,
        "lead": "The action was announced.",
        "details": "It sets new terms for the program.",
        "context": "It follows earlier agency action.",
        "topics": ["general"],
        "changeType": "EXECUTIVE_ORDER",
    })
    .to_string()
}

pub fn triage_json(categories: &[&str]) -> String {
    json!({ "relevantCategories": categories }).to_string()
}

/// A single-element ratings array.
pub fn ratings_json(category: &str, subcategory: &str, score: i32) -> String {
    json!([{
        "category": category,
        "subcategory": subcategory,
        "score": score,
        "explanation": "Provision cited in the text.",
        "confidence": 0.9,
    }])
    .to_string()
}

pub fn digest_json(headline: &str, entries: &[(Uuid, i32)]) -> String {
    let entries: Vec<serde_json::Value> = entries
        .iter()
        .map(|(id, order)| {
            json!({
                "policyChangeId": id.to_string(),
                "briefSummary": "One-sentence brief.",
                "orderIndex": order,
            })
        })
        .collect();
    json!({
        "headline": headline,
        "summary": "Roundup of the day's policy activity.",
        "entries": entries,
    })
    .to_string()
}
