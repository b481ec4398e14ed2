use std::time::Duration;

use anyhow::{anyhow, Result};
use chrono::{NaiveDate, Utc};
use reqwest::header::ACCEPT;
use serde::{Deserialize, Deserializer};
use tracing::{debug, warn};

use policypulse_common::vocab::DEFAULT_DOCUMENT_TYPES;
use policypulse_common::ChangeType;

use crate::traits::PageProgress;

const FEDERAL_REGISTER_API_URL: &str = "https://www.federalregister.gov/api/v1";
const PER_PAGE: u32 = 100;
/// Courtesy delay between listing pages.
const PAGE_DELAY_MS: u64 = 200;

const LISTING_FIELDS: &[&str] = &[
    "title",
    "abstract",
    "document_number",
    "type",
    "subtype",
    "publication_date",
    "signing_date",
    "effective_on",
    "agencies",
    "citation",
    "html_url",
    "raw_text_url",
    "executive_order_number",
    "cfr_references",
];

/// Client for the Federal Register documents API.
pub struct FederalRegisterClient {
    http: reqwest::Client,
    base_url: String,
    types: Vec<String>,
}

impl FederalRegisterClient {
    pub fn new() -> Self {
        Self::with_base(FEDERAL_REGISTER_API_URL)
    }

    /// Honors FEDERAL_REGISTER_BASE_URL, for pointing at a staging host.
    pub fn from_env() -> Self {
        match std::env::var("FEDERAL_REGISTER_BASE_URL") {
            Ok(url) if !url.is_empty() => Self::with_base(&url),
            _ => Self::new(),
        }
    }

    fn with_base(url: &str) -> Self {
        Self {
            http: reqwest::Client::builder()
                .timeout(Duration::from_secs(30))
                .build()
                .expect("Failed to build Federal Register HTTP client"),
            base_url: url.trim_end_matches('/').to_string(),
            types: DEFAULT_DOCUMENT_TYPES.iter().map(|s| s.to_string()).collect(),
        }
    }

    pub fn with_base_url(mut self, url: &str) -> Self {
        self.base_url = url.trim_end_matches('/').to_string();
        self
    }

    /// Override the document-type filter (defaults to presidential
    /// documents, rules, proposed rules and notices).
    pub fn with_types(mut self, types: &[&str]) -> Self {
        self.types = types.iter().map(|s| s.to_string()).collect();
        self
    }

    fn listing_url(&self, gte: NaiveDate, lte: Option<NaiveDate>, page: Option<u32>) -> String {
        let mut query = url::form_urlencoded::Serializer::new(String::new());
        query.append_pair("conditions[publication_date][gte]", &gte.to_string());
        if let Some(lte) = lte {
            query.append_pair("conditions[publication_date][lte]", &lte.to_string());
        }
        for t in &self.types {
            query.append_pair("conditions[type][]", t);
        }
        query.append_pair("per_page", &PER_PAGE.to_string());
        if let Some(page) = page {
            query.append_pair("page", &page.to_string());
        }
        query.append_pair("order", "newest");
        for field in LISTING_FIELDS {
            query.append_pair("fields[]", field);
        }
        format!("{}/documents.json?{}", self.base_url, query.finish())
    }

    async fn get_listing(&self, url: &str, page: Option<u32>) -> Result<ListingPage> {
        debug!(url = %url, "Federal Register listing request");

        let response = self
            .http
            .get(url)
            .header(ACCEPT, "application/json")
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            return Err(match page {
                Some(page) => anyhow!("Federal Register API error on page {}: {}", page, status),
                None => anyhow!("Federal Register API error: {}", status),
            });
        }

        Ok(response.json().await?)
    }

    /// Fetch the first page of documents published in the trailing
    /// `days_back` days, newest first. One page is enough for the daily
    /// cadence; the bulk path walks pagination instead.
    pub async fn recent(&self, days_back: i64) -> Result<Vec<RegisterDocument>> {
        let start_date = Utc::now().date_naive() - chrono::Duration::days(days_back);
        let url = self.listing_url(start_date, None, None);
        let listing = self.get_listing(&url, None).await?;
        Ok(listing.results)
    }

    /// Walk every result page for a publication date range.
    ///
    /// The first page is authoritative: a failure there fails the
    /// fetch. A failure on a later page logs and returns what was
    /// fetched so far, so a long backfill keeps its progress.
    pub async fn range(
        &self,
        date_from: NaiveDate,
        date_to: Option<NaiveDate>,
        on_page: PageProgress<'_>,
    ) -> Result<Vec<RegisterDocument>> {
        let first = self
            .get_listing(&self.listing_url(date_from, date_to, Some(1)), None)
            .await?;
        let total_pages = first.total_pages.unwrap_or(1).max(1);
        let mut documents = first.results;
        on_page(1, total_pages);

        for page in 2..=total_pages {
            tokio::time::sleep(Duration::from_millis(PAGE_DELAY_MS)).await;

            let url = self.listing_url(date_from, date_to, Some(page));
            match self.get_listing(&url, Some(page)).await {
                Ok(listing) => {
                    documents.extend(listing.results);
                    on_page(page, total_pages);
                }
                Err(e) => {
                    warn!(page, error = %e, "Listing page fetch failed, keeping pages fetched so far");
                    break;
                }
            }
        }

        Ok(documents)
    }

    /// Fetch the full plain text of one document.
    pub async fn full_text(&self, raw_text_url: &str) -> Result<String> {
        let response = self.http.get(raw_text_url).send().await?;
        if !response.status().is_success() {
            return Err(anyhow!(
                "Failed to fetch document text: {}",
                response.status().as_u16()
            ));
        }
        Ok(response.text().await?)
    }
}

#[derive(Debug, Deserialize)]
struct ListingPage {
    #[serde(default)]
    results: Vec<RegisterDocument>,
    #[serde(default)]
    total_pages: Option<u32>,
}

// ---------------------------------------------------------------------------
// Documents
// ---------------------------------------------------------------------------

/// One document from the Federal Register listing API.
#[derive(Debug, Clone, Deserialize)]
pub struct RegisterDocument {
    pub document_number: String,
    pub title: String,
    #[serde(rename = "abstract", default)]
    pub abstract_text: Option<String>,
    #[serde(rename = "type")]
    pub doc_type: String,
    #[serde(default)]
    pub subtype: Option<String>,
    pub publication_date: NaiveDate,
    #[serde(default)]
    pub signing_date: Option<NaiveDate>,
    #[serde(default)]
    pub effective_on: Option<NaiveDate>,
    #[serde(default)]
    pub agencies: Vec<AgencyRef>,
    #[serde(default)]
    pub citation: Option<String>,
    pub html_url: String,
    #[serde(default)]
    pub raw_text_url: Option<String>,
    /// The API serves this as either a number or a numeric string.
    #[serde(default, deserialize_with = "executive_order_number")]
    pub executive_order_number: Option<i64>,
    #[serde(default)]
    pub cfr_references: Vec<CfrReference>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AgencyRef {
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CfrReference {
    pub title: i64,
    #[serde(default)]
    pub part: Option<i64>,
}

impl RegisterDocument {
    /// Map a listing type/subtype pair onto a change type. Accepts both
    /// the API codes and their long-form names, case-insensitively.
    pub fn change_type(&self) -> ChangeType {
        change_type_for(&self.doc_type, self.subtype.as_deref())
    }

    /// Abstract when present and non-empty, else the title. Used as
    /// prompt input when the full text is unavailable.
    pub fn fallback_text(&self) -> &str {
        self.abstract_text
            .as_deref()
            .filter(|s| !s.is_empty())
            .unwrap_or(&self.title)
    }

    pub fn agency_names(&self) -> Vec<String> {
        self.agencies
            .iter()
            .filter_map(|a| a.name.clone())
            .filter(|n| !n.is_empty())
            .collect()
    }

    /// CFR citations as display strings, e.g. "14 CFR 71". References
    /// without a part number are skipped.
    pub fn cfr_strings(&self) -> Vec<String> {
        self.cfr_references
            .iter()
            .filter_map(|r| r.part.map(|part| format!("{} CFR {}", r.title, part)))
            .collect()
    }
}

pub fn change_type_for(doc_type: &str, subtype: Option<&str>) -> ChangeType {
    let t = doc_type.to_uppercase();
    let s = subtype.map(|s| s.to_lowercase());
    match t.as_str() {
        "PRESDOCU" | "PRESIDENTIAL DOCUMENT" => match s.as_deref() {
            Some("executive_order") => ChangeType::ExecutiveOrder,
            Some("proclamation") => ChangeType::Proclamation,
            Some("memorandum") => ChangeType::Memorandum,
            _ => ChangeType::Other,
        },
        "RULE" => ChangeType::AgencyRule,
        "PRORULE" | "PROPOSED RULE" => ChangeType::AgencyProposedRule,
        "NOTICE" => ChangeType::AgencyNotice,
        _ => ChangeType::Other,
    }
}

fn executive_order_number<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum NumberOrText {
        Number(i64),
        Text(String),
    }

    Ok(match Option::<NumberOrText>::deserialize(deserializer)? {
        Some(NumberOrText::Number(n)) => Some(n),
        Some(NumberOrText::Text(s)) => s.trim().parse().ok(),
        None => None,
    })
}
