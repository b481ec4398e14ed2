//! Controlled vocabularies shared across ingestion and analysis.
//!
//! These lists are product data, not configuration. Matching against
//! them is always case-insensitive substring matching over lowercased
//! input, so every entry here must be lowercase (except the
//! demographic subcategory labels, which are stored verbatim).

use crate::types::DemographicCategory;

/// Terms that mark a news article as federal-policy coverage.
/// Checked against the lowercased title plus snippet.
pub const POLICY_KEYWORDS: &[&str] = &[
    "executive order",
    "white house",
    "congress",
    "senate",
    "house of representatives",
    "legislation",
    "federal register",
    "regulation",
    "rulemaking",
    "supreme court",
    "federal agency",
    "administration",
    "signed into law",
    "veto",
    "tariff",
    "immigration policy",
    "medicare",
    "medicaid",
    "federal budget",
    "appropriations",
    "nominee",
    "confirmation hearing",
    "department of",
];

/// Editorializing words a neutral summary must not contain. A summary
/// that trips this list is regenerated once with a correction prompt.
pub const LOADED_WORDS: &[&str] = &[
    "controversial",
    "historic",
    "unprecedented",
    "best",
    "worst",
    "dangerous",
    "radical",
    "extreme",
    "sweeping",
    "landmark",
    "devastating",
    "disastrous",
    "catastrophic",
    "draconian",
    "crackdown",
    "slammed",
    "blasted",
    "shocking",
    "outrageous",
    "alarming",
    "reckless",
    "scandalous",
];

/// Topic labels and the keywords that assign them, used when documents
/// are stored without an AI summary. A document matching none of these
/// is labeled "general".
pub const TOPIC_KEYWORDS: &[(&str, &[&str])] = &[
    (
        "immigration",
        &["immigration", "immigrant", "border", "visa", "asylum", "deportation", "refugee", "daca", "migrant"],
    ),
    ("trade", &["tariff", "trade", "import", "export", "customs", "commerce"]),
    (
        "healthcare",
        &["health", "medicare", "medicaid", "pharmaceutical", "drug pricing", "hospital", "medical"],
    ),
    (
        "environment",
        &["climate", "environmental", "emission", "pollution", "epa", "clean air", "clean water", "energy"],
    ),
    (
        "education",
        &["education", "student", "school", "university", "college", "loan forgiveness"],
    ),
    ("defense", &["defense", "military", "armed forces", "nato", "security", "veteran"]),
    ("economy", &["economic", "inflation", "tax", "fiscal", "budget", "debt", "treasury"]),
    ("labor", &["labor", "worker", "employment", "wage", "union", "workplace", "osha"]),
    ("housing", &["housing", "rent", "mortgage", "hud", "homelessness"]),
    (
        "technology",
        &["technology", "ai", "artificial intelligence", "cyber", "data privacy", "digital"],
    ),
    (
        "justice",
        &["justice", "crime", "law enforcement", "prison", "sentencing", "civil rights"],
    ),
    ("agriculture", &["agriculture", "farm", "usda", "food safety", "crop"]),
    (
        "transportation",
        &["transportation", "infrastructure", "highway", "aviation", "railroad"],
    ),
    (
        "foreign_policy",
        &["foreign policy", "diplomatic", "sanctions", "embassy", "international"],
    ),
    ("firearms", &["firearm", "gun", "atf", "second amendment"]),
    ("dei", &["diversity", "equity", "inclusion", "dei", "affirmative action"]),
];

/// Label topics for a document from its title and abstract.
pub fn topics_for(title: &str, abstract_text: Option<&str>) -> Vec<String> {
    let text = format!("{} {}", title, abstract_text.unwrap_or("")).to_lowercase();
    let found: Vec<String> = TOPIC_KEYWORDS
        .iter()
        .filter(|(_, keywords)| keywords.iter().any(|kw| text.contains(kw)))
        .map(|(topic, _)| (*topic).to_string())
        .collect();
    if found.is_empty() {
        vec!["general".to_string()]
    } else {
        found
    }
}

/// Politics feeds polled when NEWS_RSS_FEEDS is not set.
pub const DEFAULT_NEWS_FEEDS: &[&str] = &[
    "https://rss.nytimes.com/services/xml/rss/nyt/Politics.xml",
    "https://rss.politico.com/politics-news.xml",
    "https://thehill.com/feed/",
];

/// Federal Register document types fetched by default.
pub const DEFAULT_DOCUMENT_TYPES: &[&str] = &["PRESDOCU", "RULE", "PRORULE", "NOTICE"];

// ---------------------------------------------------------------------------
// Demographic matrix
// ---------------------------------------------------------------------------

const SEX: &[&str] = &["Men", "Women", "Non-binary"];

const MARITAL_STATUS: &[&str] = &["Single", "Married", "Divorced", "Widowed", "Domestic Partnership"];

const SEXUAL_ORIENTATION: &[&str] = &["Heterosexual", "Gay", "Lesbian", "Bisexual", "Other"];

const RELIGION: &[&str] = &[
    "Protestant",
    "Catholic",
    "Jewish",
    "Muslim",
    "Hindu",
    "Buddhist",
    "Unaffiliated",
    "Other",
];

const ETHNICITY: &[&str] = &[
    "White",
    "Black/African American",
    "Hispanic/Latino",
    "Asian",
    "Native American",
    "Pacific Islander",
    "Multiracial",
    "Other",
];

const SALARY_BRACKET: &[&str] = &[
    "Under $25k",
    "$25k-$50k",
    "$50k-$75k",
    "$75k-$100k",
    "$100k-$150k",
    "$150k-$250k",
    "Over $250k",
];

const POLITICAL_AFFILIATION: &[&str] = &[
    "Democrat",
    "Republican",
    "Independent",
    "Libertarian",
    "Green",
    "Other",
];

const US_STATES: &[&str] = &[
    "Alabama",
    "Alaska",
    "Arizona",
    "Arkansas",
    "California",
    "Colorado",
    "Connecticut",
    "Delaware",
    "District of Columbia",
    "Florida",
    "Georgia",
    "Hawaii",
    "Idaho",
    "Illinois",
    "Indiana",
    "Iowa",
    "Kansas",
    "Kentucky",
    "Louisiana",
    "Maine",
    "Maryland",
    "Massachusetts",
    "Michigan",
    "Minnesota",
    "Mississippi",
    "Missouri",
    "Montana",
    "Nebraska",
    "Nevada",
    "New Hampshire",
    "New Jersey",
    "New Mexico",
    "New York",
    "North Carolina",
    "North Dakota",
    "Ohio",
    "Oklahoma",
    "Oregon",
    "Pennsylvania",
    "Rhode Island",
    "South Carolina",
    "South Dakota",
    "Tennessee",
    "Texas",
    "Utah",
    "Vermont",
    "Virginia",
    "Washington",
    "West Virginia",
    "Wisconsin",
    "Wyoming",
];

/// The full subcategory list for a demographic category. Impact ratings
/// are scored against these labels verbatim.
pub fn subcategory_options(category: DemographicCategory) -> &'static [&'static str] {
    match category {
        DemographicCategory::Sex => SEX,
        DemographicCategory::MaritalStatus => MARITAL_STATUS,
        DemographicCategory::SexualOrientation => SEXUAL_ORIENTATION,
        DemographicCategory::Religion => RELIGION,
        DemographicCategory::Ethnicity => ETHNICITY,
        DemographicCategory::SalaryBracket => SALARY_BRACKET,
        DemographicCategory::UsState => US_STATES,
        DemographicCategory::PoliticalAffiliation => POLITICAL_AFFILIATION,
    }
}
