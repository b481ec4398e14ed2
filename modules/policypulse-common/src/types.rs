use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// What kind of government action a policy change records.
///
/// The wire names double as the storage encoding, so `as_str` and
/// `from_str_loose` must stay in sync with the serde renames.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ChangeType {
    ExecutiveOrder,
    Legislation,
    AgencyRule,
    AgencyProposedRule,
    AgencyNotice,
    Appointment,
    Proclamation,
    Memorandum,
    Other,
}

impl ChangeType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChangeType::ExecutiveOrder => "EXECUTIVE_ORDER",
            ChangeType::Legislation => "LEGISLATION",
            ChangeType::AgencyRule => "AGENCY_RULE",
            ChangeType::AgencyProposedRule => "AGENCY_PROPOSED_RULE",
            ChangeType::AgencyNotice => "AGENCY_NOTICE",
            ChangeType::Appointment => "APPOINTMENT",
            ChangeType::Proclamation => "PROCLAMATION",
            ChangeType::Memorandum => "MEMORANDUM",
            ChangeType::Other => "OTHER",
        }
    }

    /// Parse a stored or model-produced value, defaulting to `Other`.
    pub fn from_str_loose(s: &str) -> Self {
        match s.trim().to_uppercase().as_str() {
            "EXECUTIVE_ORDER" => ChangeType::ExecutiveOrder,
            "LEGISLATION" => ChangeType::Legislation,
            "AGENCY_RULE" => ChangeType::AgencyRule,
            "AGENCY_PROPOSED_RULE" => ChangeType::AgencyProposedRule,
            "AGENCY_NOTICE" => ChangeType::AgencyNotice,
            "APPOINTMENT" => ChangeType::Appointment,
            "PROCLAMATION" => ChangeType::Proclamation,
            "MEMORANDUM" => ChangeType::Memorandum,
            _ => ChangeType::Other,
        }
    }
}

impl std::fmt::Display for ChangeType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Lifecycle of a tracked policy change. Every ingested change starts
/// in `Tracking`; the later states are set by editorial tooling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ChangeStatus {
    #[default]
    Tracking,
    InEffect,
    PendingImplementation,
    Challenged,
    Blocked,
    Overturned,
}

impl ChangeStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChangeStatus::Tracking => "TRACKING",
            ChangeStatus::InEffect => "IN_EFFECT",
            ChangeStatus::PendingImplementation => "PENDING_IMPLEMENTATION",
            ChangeStatus::Challenged => "CHALLENGED",
            ChangeStatus::Blocked => "BLOCKED",
            ChangeStatus::Overturned => "OVERTURNED",
        }
    }

    pub fn from_str_loose(s: &str) -> Self {
        match s.trim().to_uppercase().as_str() {
            "IN_EFFECT" => ChangeStatus::InEffect,
            "PENDING_IMPLEMENTATION" => ChangeStatus::PendingImplementation,
            "CHALLENGED" => ChangeStatus::Challenged,
            "BLOCKED" => ChangeStatus::Blocked,
            "OVERTURNED" => ChangeStatus::Overturned,
            _ => ChangeStatus::Tracking,
        }
    }
}

impl std::fmt::Display for ChangeStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Where a policy change was discovered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SourceType {
    FederalRegister,
    ApNews,
}

impl SourceType {
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceType::FederalRegister => "FEDERAL_REGISTER",
            SourceType::ApNews => "AP_NEWS",
        }
    }

    pub fn from_str_loose(s: &str) -> Self {
        match s.trim().to_uppercase().as_str() {
            "AP_NEWS" => SourceType::ApNews,
            _ => SourceType::FederalRegister,
        }
    }
}

impl std::fmt::Display for SourceType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// The demographic axes impact ratings are scored along.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DemographicCategory {
    Sex,
    MaritalStatus,
    SexualOrientation,
    Religion,
    Ethnicity,
    SalaryBracket,
    UsState,
    PoliticalAffiliation,
}

impl DemographicCategory {
    pub const ALL: [DemographicCategory; 8] = [
        DemographicCategory::Sex,
        DemographicCategory::MaritalStatus,
        DemographicCategory::SexualOrientation,
        DemographicCategory::Religion,
        DemographicCategory::Ethnicity,
        DemographicCategory::SalaryBracket,
        DemographicCategory::UsState,
        DemographicCategory::PoliticalAffiliation,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            DemographicCategory::Sex => "SEX",
            DemographicCategory::MaritalStatus => "MARITAL_STATUS",
            DemographicCategory::SexualOrientation => "SEXUAL_ORIENTATION",
            DemographicCategory::Religion => "RELIGION",
            DemographicCategory::Ethnicity => "ETHNICITY",
            DemographicCategory::SalaryBracket => "SALARY_BRACKET",
            DemographicCategory::UsState => "US_STATE",
            DemographicCategory::PoliticalAffiliation => "POLITICAL_AFFILIATION",
        }
    }

    pub fn from_str_loose(s: &str) -> Option<Self> {
        match s.trim().to_uppercase().as_str() {
            "SEX" => Some(DemographicCategory::Sex),
            "MARITAL_STATUS" => Some(DemographicCategory::MaritalStatus),
            "SEXUAL_ORIENTATION" => Some(DemographicCategory::SexualOrientation),
            "RELIGION" => Some(DemographicCategory::Religion),
            "ETHNICITY" => Some(DemographicCategory::Ethnicity),
            "SALARY_BRACKET" => Some(DemographicCategory::SalaryBracket),
            "US_STATE" => Some(DemographicCategory::UsState),
            "POLITICAL_AFFILIATION" => Some(DemographicCategory::PoliticalAffiliation),
            _ => None,
        }
    }
}

impl std::fmt::Display for DemographicCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Kinds of scheduled events derived from or attached to policy changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EventType {
    Hearing,
    Deadline,
    Implementation,
    CourtDate,
    Vote,
    CommentPeriodEnd,
    Other,
}

impl EventType {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventType::Hearing => "HEARING",
            EventType::Deadline => "DEADLINE",
            EventType::Implementation => "IMPLEMENTATION",
            EventType::CourtDate => "COURT_DATE",
            EventType::Vote => "VOTE",
            EventType::CommentPeriodEnd => "COMMENT_PERIOD_END",
            EventType::Other => "OTHER",
        }
    }

    pub fn from_str_loose(s: &str) -> Self {
        match s.trim().to_uppercase().as_str() {
            "HEARING" => EventType::Hearing,
            "DEADLINE" => EventType::Deadline,
            "IMPLEMENTATION" => EventType::Implementation,
            "COURT_DATE" => EventType::CourtDate,
            "VOTE" => EventType::Vote,
            "COMMENT_PERIOD_END" => EventType::CommentPeriodEnd,
            _ => EventType::Other,
        }
    }
}

impl std::fmt::Display for EventType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Outcome of one ingestion run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RunStatus {
    Success,
    PartialFailure,
    Failure,
}

impl RunStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RunStatus::Success => "SUCCESS",
            RunStatus::PartialFailure => "PARTIAL_FAILURE",
            RunStatus::Failure => "FAILURE",
        }
    }

    pub fn from_str_loose(s: &str) -> Self {
        match s.trim().to_uppercase().as_str() {
            "SUCCESS" => RunStatus::Success,
            "PARTIAL_FAILURE" => RunStatus::PartialFailure,
            _ => RunStatus::Failure,
        }
    }
}

impl std::fmt::Display for RunStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Stored entities
// ---------------------------------------------------------------------------

/// One tracked government policy action, enriched with an AI summary.
///
/// `federal_register_number` and `source_url` are the natural keys used
/// for deduplication across runs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PolicyChange {
    pub id: Uuid,
    pub title: String,
    pub summary: String,
    pub raw_content: String,
    pub change_type: ChangeType,
    pub status: ChangeStatus,
    pub source_url: String,
    pub source_type: SourceType,
    pub federal_register_number: Option<String>,
    pub executive_order_number: Option<i64>,
    pub signing_date: Option<NaiveDate>,
    pub publication_date: Option<NaiveDate>,
    pub effective_date: Option<NaiveDate>,
    pub agencies: Vec<String>,
    pub topics: Vec<String>,
    pub cfr_references: Vec<String>,
    pub ai_provider: Option<String>,
    pub ai_model: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// A single demographic impact score for one policy change.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImpactRating {
    pub id: Uuid,
    pub policy_change_id: Uuid,
    pub category: DemographicCategory,
    pub subcategory: String,
    /// Integer in [-2, 2]; negative is adverse, positive is beneficial.
    pub score: i32,
    pub explanation: String,
    /// Model confidence in [0.0, 1.0].
    pub confidence: f32,
    pub ai_provider: String,
    pub ai_model: String,
    pub created_at: DateTime<Utc>,
}

/// A dated event derived from a policy change, such as a rule taking effect.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpcomingEvent {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub event_type: EventType,
    pub event_date: DateTime<Utc>,
    pub location: Option<String>,
    pub source_url: String,
    pub policy_change_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

/// Reader-facing roundup of one calendar day, at most one per date.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DailyDigest {
    pub id: Uuid,
    pub date: NaiveDate,
    pub headline: String,
    pub summary: String,
    pub ai_provider: String,
    pub ai_model: String,
    pub created_at: DateTime<Utc>,
}

/// One ordered item within a daily digest.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DigestEntry {
    pub id: Uuid,
    pub digest_id: Uuid,
    pub policy_change_id: Uuid,
    pub brief_summary: String,
    pub order_index: i32,
}

/// Audit record for one ingestion run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestionLog {
    pub id: Uuid,
    pub source: SourceType,
    pub status: RunStatus,
    pub documents_found: i32,
    pub documents_new: i32,
    pub error_message: Option<String>,
    pub duration_ms: i64,
    pub started_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}
