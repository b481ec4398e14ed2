// RSS news polling with the policy-relevance filter applied.
//
// Feeds are polled in order; one bad feed never fails the poll. Links
// are deduplicated across feeds within a single poll.

use std::collections::HashSet;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use chrono::{DateTime, Utc};
use tracing::{info, warn};

use policypulse_common::vocab::POLICY_KEYWORDS;

/// Articles returned per poll unless the caller asks for fewer.
pub const DEFAULT_MAX_ARTICLES: usize = 50;

/// One policy-relevant article pulled from a feed.
#[derive(Debug, Clone)]
pub struct NewsArticle {
    pub title: String,
    pub link: String,
    pub pub_date: DateTime<Utc>,
    pub snippet: String,
    pub content: String,
}

pub struct RssNewsFetcher {
    client: reqwest::Client,
    feeds: Vec<String>,
}

impl RssNewsFetcher {
    pub fn new(feeds: Vec<String>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(15))
            .build()
            .expect("Failed to build RSS HTTP client");
        Self { client, feeds }
    }

    /// Poll every configured feed, newest entries first as served, and
    /// keep up to `max_articles` policy-relevant articles.
    pub async fn fetch(&self, max_articles: usize) -> Result<Vec<NewsArticle>> {
        let mut articles = Vec::new();
        let mut seen_links = HashSet::new();

        for feed_url in &self.feeds {
            if articles.len() >= max_articles {
                break;
            }
            match self.fetch_feed(feed_url).await {
                Ok(feed) => {
                    collect_articles(feed, &mut seen_links, max_articles, &mut articles)
                }
                Err(e) => {
                    warn!(feed_url, error = %e, "Failed to fetch RSS feed");
                }
            }
        }

        info!(articles = articles.len(), "news: poll complete");
        Ok(articles)
    }

    async fn fetch_feed(&self, feed_url: &str) -> Result<feed_rs::model::Feed> {
        let resp = self
            .client
            .get(feed_url)
            .header("User-Agent", "policypulse-ingest/0.1")
            .send()
            .await
            .context("News feed fetch failed")?;
        if !resp.status().is_success() {
            bail!("News feed returned {}", resp.status());
        }

        let bytes = resp.bytes().await.context("Failed to read news feed body")?;
        feed_rs::parser::parse(&bytes[..]).context("Failed to parse RSS/Atom feed")
    }
}

fn collect_articles(
    feed: feed_rs::model::Feed,
    seen_links: &mut HashSet<String>,
    max_articles: usize,
    articles: &mut Vec<NewsArticle>,
) {
    for entry in feed.entries {
        if articles.len() >= max_articles {
            break;
        }

        let title = entry.title.map(|t| t.content).unwrap_or_default();
        let link = entry
            .links
            .first()
            .map(|l| l.href.clone())
            .or_else(|| entry.id.starts_with("http").then(|| entry.id.clone()))
            .unwrap_or_default();
        let snippet = entry.summary.map(|t| t.content).unwrap_or_default();
        let body = entry.content.and_then(|c| c.body).unwrap_or_default();

        if link.is_empty() || seen_links.contains(&link) {
            continue;
        }

        // The relevance check prefers the snippet; the stored content
        // prefers the full body.
        let filter_text = if snippet.is_empty() { &body } else { &snippet };
        if !is_policy_relevant(&title, filter_text) {
            continue;
        }

        let pub_date = entry
            .published
            .or(entry.updated)
            .map(|dt| dt.with_timezone(&Utc))
            .unwrap_or_else(Utc::now);

        seen_links.insert(link.clone());
        let content = if body.is_empty() { snippet.clone() } else { body };
        articles.push(NewsArticle {
            title,
            link,
            pub_date,
            snippet,
            content,
        });
    }
}

fn is_policy_relevant(title: &str, content: &str) -> bool {
    let text = format!("{} {}", title, content).to_lowercase();
    POLICY_KEYWORDS.iter().any(|kw| text.contains(kw))
}
