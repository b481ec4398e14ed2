// Natural-key deduplication against the store, batched so a season of
// backfill never builds an unbounded IN list.

use std::collections::HashSet;

use anyhow::Result;

use crate::federal_register::RegisterDocument;
use crate::news::NewsArticle;
use crate::store::PolicyStore;

pub(crate) const DEDUP_BATCH_SIZE: usize = 50;

/// Drop documents whose register number is already stored. Order is
/// preserved; documents without a lookup hit pass through untouched.
pub async fn new_register_documents(
    store: &dyn PolicyStore,
    docs: Vec<RegisterDocument>,
) -> Result<Vec<RegisterDocument>> {
    if docs.is_empty() {
        return Ok(docs);
    }

    let mut known = HashSet::new();
    for batch in docs.chunks(DEDUP_BATCH_SIZE) {
        let numbers: Vec<String> = batch.iter().map(|d| d.document_number.clone()).collect();
        known.extend(store.register_numbers_present(&numbers).await?);
    }

    Ok(docs
        .into_iter()
        .filter(|d| !known.contains(&d.document_number))
        .collect())
}

/// Drop articles whose link is already stored as a source URL.
pub async fn new_articles(
    store: &dyn PolicyStore,
    articles: Vec<NewsArticle>,
) -> Result<Vec<NewsArticle>> {
    if articles.is_empty() {
        return Ok(articles);
    }

    let mut known = HashSet::new();
    for batch in articles.chunks(DEDUP_BATCH_SIZE) {
        let urls: Vec<String> = batch.iter().map(|a| a.link.clone()).collect();
        known.extend(store.source_urls_present(&urls).await?);
    }

    Ok(articles
        .into_iter()
        .filter(|a| !known.contains(&a.link))
        .collect())
}
