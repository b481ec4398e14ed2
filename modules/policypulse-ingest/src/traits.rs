// Trait abstractions for pipeline dependencies.
//
// DocumentSource — Federal Register listing, pagination and raw text.
// NewsSource — RSS polling with the policy-relevance filter applied.
//
// These enable deterministic testing with MockDocumentSource and
// MockNewsSource: no network, no database. `cargo test` in seconds.

use anyhow::Result;
use async_trait::async_trait;
use chrono::NaiveDate;

use crate::federal_register::{FederalRegisterClient, RegisterDocument};
use crate::news::{NewsArticle, RssNewsFetcher};

/// Progress callback for paginated fetches: (page, total_pages).
pub type PageProgress<'a> = &'a (dyn Fn(u32, u32) + Send + Sync);

// ---------------------------------------------------------------------------
// DocumentSource — Federal Register API
// ---------------------------------------------------------------------------

#[async_trait]
pub trait DocumentSource: Send + Sync {
    /// Fetch the first page of documents published in the trailing
    /// `days_back` days, newest first.
    async fn recent(&self, days_back: i64) -> Result<Vec<RegisterDocument>>;

    /// Walk every result page for a publication date range. `date_to`
    /// of `None` means "to present". `on_page` fires after each page.
    async fn range(
        &self,
        date_from: NaiveDate,
        date_to: Option<NaiveDate>,
        on_page: PageProgress<'_>,
    ) -> Result<Vec<RegisterDocument>>;

    /// Fetch the full plain text of one document.
    async fn full_text(&self, raw_text_url: &str) -> Result<String>;
}

#[async_trait]
impl DocumentSource for FederalRegisterClient {
    async fn recent(&self, days_back: i64) -> Result<Vec<RegisterDocument>> {
        self.recent(days_back).await
    }

    async fn range(
        &self,
        date_from: NaiveDate,
        date_to: Option<NaiveDate>,
        on_page: PageProgress<'_>,
    ) -> Result<Vec<RegisterDocument>> {
        self.range(date_from, date_to, on_page).await
    }

    async fn full_text(&self, raw_text_url: &str) -> Result<String> {
        self.full_text(raw_text_url).await
    }
}

// ---------------------------------------------------------------------------
// NewsSource — policy news feeds
// ---------------------------------------------------------------------------

#[async_trait]
pub trait NewsSource: Send + Sync {
    /// Poll every configured feed and return up to `max_articles`
    /// policy-relevant articles, deduplicated by link across feeds.
    async fn fetch(&self, max_articles: usize) -> Result<Vec<NewsArticle>>;
}

#[async_trait]
impl NewsSource for RssNewsFetcher {
    async fn fetch(&self, max_articles: usize) -> Result<Vec<NewsArticle>> {
        self.fetch(max_articles).await
    }
}
