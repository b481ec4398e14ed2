//! Boundary tests — one pipeline handoff at a time.
//!
//! Each test follows MOCK → FUNCTION → OUTPUT: set up mocks, run the
//! orchestrator or bulk runner once, assert stored state and the audit
//! log. Generation scripts are consumed in call order, so each test
//! scripts exactly the calls its scenario triggers.

use std::sync::{Arc, Mutex};

use chrono::{Duration, NaiveDate, Utc};

use policypulse_common::{ChangeType, DemographicCategory, EventType, RunStatus, SourceType};

use crate::bulk::BulkRunner;
use crate::dedup;
use crate::orchestrator::Orchestrator;
use crate::testing::*;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn pipeline(
    store: Arc<MemoryStore>,
    documents: MockDocumentSource,
    news: MockNewsSource,
    generator: Arc<MockGenerator>,
) -> Orchestrator {
    Orchestrator::new(store, Arc::new(documents), Arc::new(news), generator)
}

fn no_news() -> MockNewsSource {
    MockNewsSource::new(Vec::new())
}

// ---------------------------------------------------------------------------
// Sources → store boundary
//
// Documents and articles flow through summarization into policy_changes
// with the right field mapping per source.
// ---------------------------------------------------------------------------

#[tokio::test]
async fn daily_run_stores_document_and_article_changes() {
    let store = Arc::new(MemoryStore::new());
    let generator = Arc::new(
        MockGenerator::new()
            .respond(summary_json("Order streamlines permitting"))
            .respond(triage_json(&[]))
            .respond(summary_json("Tariff bill advances"))
            .respond(digest_json("Active day", &[])),
    );

    let orchestrator = pipeline(
        store.clone(),
        MockDocumentSource::new()
            .recent_documents(vec![register_doc("2025-12345", "Permit Reform Order")]),
        MockNewsSource::new(vec![article(
            "Congress weighs tariff bill",
            "https://news.example/a1",
        )]),
        generator.clone(),
    );

    let report = orchestrator.run(1).await.unwrap();

    assert_eq!(report.federal_register_found, 1);
    assert_eq!(report.federal_register_new, 1);
    assert_eq!(report.ap_news_found, 1);
    assert_eq!(report.ap_news_new, 1);
    assert!(report.digest_generated);
    assert!(report.errors.is_empty(), "errors: {:?}", report.errors);

    let doc_change = store.change_by_number("2025-12345").unwrap();
    assert_eq!(doc_change.title, "Order streamlines permitting");
    assert_eq!(doc_change.source_type, SourceType::FederalRegister);
    assert_eq!(doc_change.change_type, ChangeType::ExecutiveOrder);
    assert_eq!(doc_change.ai_model.as_deref(), Some("mock-model"));
    assert_eq!(doc_change.topics, vec!["general"]);
    assert_eq!(
        doc_change.summary,
        "The action was announced.\n\nIt sets new terms for the program.\n\nIt follows earlier agency action."
    );
    // Triage came back empty, so no ratings were stored for it.
    assert!(store.ratings().is_empty());

    let changes = store.changes_created();
    assert_eq!(changes.len(), 2);
    let article_change = changes
        .iter()
        .find(|c| c.source_type == SourceType::ApNews)
        .unwrap();
    assert_eq!(article_change.source_url, "https://news.example/a1");
    assert_eq!(article_change.federal_register_number, None);
    assert_eq!(article_change.raw_content, "Congress weighs tariff bill body text.");

    let outcome = store.last_log_outcome().unwrap();
    assert_eq!(outcome.status, RunStatus::Success);
    assert_eq!(outcome.documents_found, 2);
    assert_eq!(outcome.documents_new, 2);
}

#[tokio::test]
async fn second_run_over_same_documents_inserts_nothing() {
    let store = Arc::new(MemoryStore::new());
    let doc = register_doc("2025-00001", "Same Order");

    let first_generator = Arc::new(
        MockGenerator::new()
            .respond(summary_json("Order issued"))
            .respond(triage_json(&[]))
            .respond(digest_json("Morning roundup", &[])),
    );
    let first = pipeline(
        store.clone(),
        MockDocumentSource::new().recent_documents(vec![doc.clone()]),
        no_news(),
        first_generator,
    );
    first.run(1).await.unwrap();

    // The rerun's digest response names the already-stored change; the
    // entry list must still not grow.
    let change_id = store.changes_created()[0].id;
    let second_generator =
        Arc::new(MockGenerator::new().respond(digest_json("Evening update", &[(change_id, 0)])));
    let second = pipeline(
        store.clone(),
        MockDocumentSource::new().recent_documents(vec![doc]),
        no_news(),
        second_generator,
    );
    let report = second.run(1).await.unwrap();

    assert_eq!(report.federal_register_found, 1);
    assert_eq!(report.federal_register_new, 0);
    assert!(report.digest_generated);
    assert_eq!(store.changes_created().len(), 1);

    // The rerun refreshed the digest header and nothing else.
    let digest = store.digest_for(Utc::now().date_naive()).unwrap();
    assert_eq!(digest.headline, "Evening update");
    assert!(digest.entries.is_empty());

    let logs = store.logs();
    assert_eq!(logs.len(), 2);
    let outcome = logs[1].outcome.as_ref().unwrap();
    assert_eq!(outcome.status, RunStatus::Success);
    assert_eq!(outcome.documents_found, 1);
    assert_eq!(outcome.documents_new, 0);
}

#[tokio::test]
async fn full_text_is_fetched_when_url_is_registered() {
    let store = Arc::new(MemoryStore::new());
    let generator = Arc::new(
        MockGenerator::new()
            .respond(summary_json("Order analyzed"))
            .respond(triage_json(&[]))
            .respond(digest_json("Day", &[])),
    );
    let mut doc = register_doc("2025-20000", "Order With Text");
    doc.raw_text_url = Some("https://fr.example/raw/20000".to_string());

    let orchestrator = pipeline(
        store.clone(),
        MockDocumentSource::new()
            .recent_documents(vec![doc])
            .on_full_text("https://fr.example/raw/20000", "Full body text of the order."),
        no_news(),
        generator.clone(),
    );

    orchestrator.run(1).await.unwrap();

    assert_eq!(generator.calls()[0].user, "Full body text of the order.");
    let change = store.change_by_number("2025-20000").unwrap();
    assert_eq!(change.raw_content, "Full body text of the order.");
}

#[tokio::test]
async fn full_text_failure_silently_falls_back_to_abstract() {
    let store = Arc::new(MemoryStore::new());
    let generator = Arc::new(
        MockGenerator::new()
            .respond(summary_json("Order analyzed"))
            .respond(triage_json(&[]))
            .respond(digest_json("Day", &[])),
    );
    let mut doc = register_doc("2025-20001", "Unreachable Text Order");
    // Registered URL, but the mock has no text for it.
    doc.raw_text_url = Some("https://fr.example/raw/missing".to_string());

    let orchestrator = pipeline(
        store.clone(),
        MockDocumentSource::new().recent_documents(vec![doc]),
        no_news(),
        generator.clone(),
    );

    let report = orchestrator.run(1).await.unwrap();

    assert!(report.errors.is_empty());
    assert_eq!(
        generator.calls()[0].user,
        "Unreachable Text Order abstract."
    );
}

// ---------------------------------------------------------------------------
// Failure isolation
//
// A broken source or a broken document never takes down the rest of
// the run; a broken store does.
// ---------------------------------------------------------------------------

#[tokio::test]
async fn register_fetch_failure_still_processes_news() {
    let store = Arc::new(MemoryStore::new());
    let generator = Arc::new(
        MockGenerator::new()
            .respond(summary_json("Bill coverage summarized"))
            .respond(digest_json("Day", &[])),
    );

    let orchestrator = pipeline(
        store.clone(),
        MockDocumentSource::new().failing_recent(),
        MockNewsSource::new(vec![article("Senate bill", "https://news.example/b1")]),
        generator.clone(),
    );

    let report = orchestrator.run(1).await.unwrap();

    assert_eq!(report.errors.len(), 1);
    assert!(report.errors[0].starts_with("Federal Register fetch failed:"));
    assert_eq!(report.ap_news_new, 1);
    assert_eq!(store.changes_created().len(), 1);
    assert_eq!(
        store.last_log_outcome().unwrap().status,
        RunStatus::PartialFailure
    );
}

#[tokio::test]
async fn document_parse_failure_continues_with_other_documents() {
    let store = Arc::new(MemoryStore::new());
    let generator = Arc::new(
        MockGenerator::new()
            .respond("not json")
            .respond(summary_json("Second order summarized"))
            .respond(triage_json(&[]))
            .respond(digest_json("Day", &[])),
    );

    let orchestrator = pipeline(
        store.clone(),
        MockDocumentSource::new().recent_documents(vec![
            register_doc("2025-00001", "Broken Order"),
            register_doc("2025-00002", "Good Order"),
        ]),
        no_news(),
        generator.clone(),
    );

    let report = orchestrator.run(1).await.unwrap();

    assert_eq!(report.errors.len(), 1);
    assert!(report.errors[0].starts_with("Processing failed for 2025-00001:"));
    assert_eq!(store.changes_created().len(), 1);
    assert!(store.change_by_number("2025-00002").is_some());

    let outcome = store.last_log_outcome().unwrap();
    assert_eq!(outcome.status, RunStatus::PartialFailure);
    assert_eq!(outcome.documents_new, 2);
}

#[tokio::test]
async fn impact_failure_keeps_the_change_row() {
    let store = Arc::new(MemoryStore::new());
    let generator = Arc::new(
        MockGenerator::new()
            .respond(summary_json("Order summarized"))
            .respond("garbage triage")
            .respond(digest_json("Day", &[])),
    );

    let orchestrator = pipeline(
        store.clone(),
        MockDocumentSource::new()
            .recent_documents(vec![register_doc("2025-00003", "Rated Order")]),
        no_news(),
        generator.clone(),
    );

    let report = orchestrator.run(1).await.unwrap();

    assert_eq!(store.changes_created().len(), 1);
    assert!(store.ratings().is_empty());
    assert_eq!(report.errors.len(), 1);
    assert!(report.errors[0].starts_with("Impact analysis failed for 2025-00003:"));
}

#[tokio::test]
async fn store_lookup_failure_fails_the_whole_run() {
    let store = Arc::new(MemoryStore::new().failing_register_lookup());
    let generator = Arc::new(MockGenerator::new());

    let orchestrator = pipeline(
        store.clone(),
        MockDocumentSource::new()
            .recent_documents(vec![register_doc("2025-00004", "Any Order")]),
        no_news(),
        generator.clone(),
    );

    let err = orchestrator.run(1).await.unwrap_err();
    assert!(err.to_string().contains("register lookup forced failure"));

    let outcome = store.last_log_outcome().unwrap();
    assert_eq!(outcome.status, RunStatus::Failure);
    assert_eq!(outcome.documents_found, 0);
    assert!(outcome
        .error_message
        .as_deref()
        .unwrap()
        .contains("register lookup forced failure"));
    assert_eq!(generator.call_count(), 0);
}

// ---------------------------------------------------------------------------
// Impact analysis → store boundary
// ---------------------------------------------------------------------------

#[tokio::test]
async fn triaged_categories_produce_stored_ratings() {
    let store = Arc::new(MemoryStore::new());
    let generator = Arc::new(
        MockGenerator::new()
            .respond(summary_json("Benefit rule summarized"))
            .respond(triage_json(&["SALARY_BRACKET"]))
            .respond(ratings_json("SALARY_BRACKET", "Under $25k", -1))
            .respond(digest_json("Day", &[])),
    );

    let orchestrator = pipeline(
        store.clone(),
        MockDocumentSource::new()
            .recent_documents(vec![register_doc("2025-00005", "Benefit Rule")]),
        no_news(),
        generator.clone(),
    );

    orchestrator.run(1).await.unwrap();

    let ratings = store.ratings();
    assert_eq!(ratings.len(), 1);
    assert_eq!(ratings[0].category, DemographicCategory::SalaryBracket);
    assert_eq!(ratings[0].subcategory, "Under $25k");
    assert_eq!(ratings[0].score, -1);
    assert_eq!(ratings[0].ai_provider, "mock");

    let change = store.change_by_number("2025-00005").unwrap();
    assert_eq!(ratings[0].policy_change_id, change.id);
}

// ---------------------------------------------------------------------------
// Effective dates → upcoming events
// ---------------------------------------------------------------------------

#[tokio::test]
async fn future_effective_date_creates_implementation_event() {
    let store = Arc::new(MemoryStore::new());
    let generator = Arc::new(
        MockGenerator::new()
            .respond(summary_json("Visa Rule"))
            .respond(triage_json(&[]))
            .respond(digest_json("Day", &[])),
    );
    let effective = Utc::now().date_naive() + Duration::days(30);

    let orchestrator = pipeline(
        store.clone(),
        MockDocumentSource::new().recent_documents(vec![register_doc_effective(
            "2025-00006",
            "Visa Processing Rule",
            effective,
        )]),
        no_news(),
        generator.clone(),
    );

    orchestrator.run(1).await.unwrap();

    let events = store.events();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].title, "Visa Rule takes effect");
    assert_eq!(
        events[0].description,
        format!("This policy action becomes effective on {effective}.")
    );
    assert_eq!(events[0].event_type, EventType::Implementation);
    assert_eq!(events[0].event_date.date_naive(), effective);

    let change = store.change_by_number("2025-00006").unwrap();
    assert_eq!(events[0].policy_change_id, Some(change.id));
}

#[tokio::test]
async fn past_effective_date_creates_no_event() {
    let store = Arc::new(MemoryStore::new());
    let generator = Arc::new(
        MockGenerator::new()
            .respond(summary_json("Old Rule"))
            .respond(triage_json(&[]))
            .respond(digest_json("Day", &[])),
    );
    let effective = Utc::now().date_naive() - Duration::days(1);

    let orchestrator = pipeline(
        store.clone(),
        MockDocumentSource::new().recent_documents(vec![register_doc_effective(
            "2025-00007",
            "Already Effective Rule",
            effective,
        )]),
        no_news(),
        generator.clone(),
    );

    orchestrator.run(1).await.unwrap();

    assert!(store.events().is_empty());
}

// ---------------------------------------------------------------------------
// Digest generation
// ---------------------------------------------------------------------------

#[tokio::test]
async fn digest_skipped_when_nothing_created_today() {
    let store = Arc::new(MemoryStore::new());
    let generator = Arc::new(MockGenerator::new());

    let orchestrator = pipeline(
        store.clone(),
        MockDocumentSource::new(),
        no_news(),
        generator.clone(),
    );

    let report = orchestrator.run(1).await.unwrap();

    assert!(!report.digest_generated);
    assert!(report.errors.is_empty());
    assert_eq!(generator.call_count(), 0);
    assert_eq!(store.last_log_outcome().unwrap().status, RunStatus::Success);
}

// ---------------------------------------------------------------------------
// Bulk backfill
// ---------------------------------------------------------------------------

fn collecting_progress() -> (Arc<Mutex<Vec<String>>>, impl Fn(&str) + Send + Sync) {
    let messages = Arc::new(Mutex::new(Vec::new()));
    let sink = messages.clone();
    let progress = move |m: &str| sink.lock().unwrap().push(m.to_string());
    (messages, progress)
}

#[tokio::test]
async fn bulk_walks_pages_and_skips_known_documents() {
    let store = Arc::new(MemoryStore::new().with_known_register_number("2025-00002"));
    let runner = BulkRunner::new(
        store.clone(),
        Arc::new(
            MockDocumentSource::new()
                .with_page(vec![
                    register_doc("2025-00001", "One"),
                    register_doc("2025-00002", "Two"),
                    register_doc("2025-00003", "Three"),
                ])
                .with_page(vec![
                    register_doc("2025-00004", "Four"),
                    register_doc("2025-00005", "Five"),
                ]),
        ),
    );
    let (messages, progress) = collecting_progress();
    let from = NaiveDate::from_ymd_opt(2025, 1, 20).unwrap();

    let report = runner.run(from, None, &progress).await.unwrap();

    assert_eq!(report.total_fetched, 5);
    assert_eq!(report.total_new, 4);
    assert_eq!(report.total_inserted, 4);
    assert!(report.errors.is_empty());
    assert_eq!(store.changes_created().len(), 4);
    assert!(store.change_by_number("2025-00002").is_none());

    let messages = messages.lock().unwrap();
    assert_eq!(messages[0], "Fetching documents from 2025-01-20 to present...");
    assert!(messages.contains(&"  Fetched page 1/2".to_string()));
    assert!(messages.contains(&"  Fetched page 2/2".to_string()));
    assert!(messages.contains(&"Total documents fetched: 5".to_string()));
    assert!(messages.contains(&"New documents to insert: 4 (1 already in DB)".to_string()));
    assert!(messages.contains(&"  Inserted 4/4 documents".to_string()));

    let outcome = store.last_log_outcome().unwrap();
    assert_eq!(outcome.status, RunStatus::Success);
    assert_eq!(outcome.documents_found, 5);
    assert_eq!(outcome.documents_new, 4);
}

#[tokio::test]
async fn bulk_summary_falls_back_when_abstract_is_missing() {
    let store = Arc::new(MemoryStore::new());
    let mut doc = register_doc("2025-00008", "Tariff Adjustment Proclamation");
    doc.abstract_text = None;
    let runner = BulkRunner::new(
        store.clone(),
        Arc::new(MockDocumentSource::new().with_page(vec![doc])),
    );
    let (_, progress) = collecting_progress();
    let from = NaiveDate::from_ymd_opt(2025, 1, 20).unwrap();

    runner.run(from, None, &progress).await.unwrap();

    let change = store.change_by_number("2025-00008").unwrap();
    assert_eq!(
        change.summary,
        "Tariff Adjustment Proclamation. Published 2025-08-01."
    );
    assert_eq!(change.raw_content, "Tariff Adjustment Proclamation");
    assert!(change.topics.contains(&"trade".to_string()));
    assert_eq!(change.ai_provider, None);
}

#[tokio::test]
async fn bulk_error_cap_limits_log_but_not_report() {
    let store = Arc::new(MemoryStore::new().failing_creates());
    let docs: Vec<_> = (0..25)
        .map(|i| register_doc(&format!("2025-{i:05}"), "Doomed Doc"))
        .collect();
    let runner = BulkRunner::new(
        store.clone(),
        Arc::new(MockDocumentSource::new().with_page(docs)),
    );
    let (_, progress) = collecting_progress();
    let from = NaiveDate::from_ymd_opt(2025, 1, 20).unwrap();

    let report = runner.run(from, None, &progress).await.unwrap();

    assert_eq!(report.total_inserted, 0);
    assert_eq!(report.errors.len(), 25);
    assert!(report.errors[0].starts_with("Failed to insert 2025-00000:"));

    let outcome = store.last_log_outcome().unwrap();
    assert_eq!(outcome.status, RunStatus::PartialFailure);
    assert_eq!(outcome.error_message.as_deref().unwrap().lines().count(), 20);
}

#[tokio::test]
async fn bulk_fetch_failure_marks_run_failed() {
    let store = Arc::new(MemoryStore::new());
    let runner = BulkRunner::new(
        store.clone(),
        Arc::new(MockDocumentSource::new().failing_range()),
    );
    let (messages, progress) = collecting_progress();
    let from = NaiveDate::from_ymd_opt(2025, 1, 20).unwrap();

    let err = runner.run(from, None, &progress).await.unwrap_err();
    assert!(err.to_string().contains("range forced failure"));

    assert_eq!(store.last_log_outcome().unwrap().status, RunStatus::Failure);
    assert_eq!(messages.lock().unwrap().len(), 1);
}

// ---------------------------------------------------------------------------
// Dedup batching
// ---------------------------------------------------------------------------

#[tokio::test]
async fn dedup_batches_lookups_in_fifties() {
    let store = MemoryStore::new();
    let docs: Vec<_> = (0..121)
        .map(|i| register_doc(&format!("2025-{i:05}"), "Doc"))
        .collect();

    let new_docs = dedup::new_register_documents(&store, docs).await.unwrap();

    assert_eq!(new_docs.len(), 121);
    assert_eq!(store.register_lookup_calls(), 3);
}
