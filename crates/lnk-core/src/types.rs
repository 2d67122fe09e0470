//! Campaign, candidate, and attempt types shared across the workspace.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// A configured outreach campaign: targeting criteria plus pacing budget.
///
/// Owned exclusively by the campaign runner while a run is in progress;
/// status only changes through [`CampaignStatus::transition`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Campaign {
    /// ULID identifier (26 characters, Crockford Base32).
    pub id: String,

    pub name: String,

    /// Account this campaign dispatches from.
    pub account: String,

    #[serde(default)]
    pub criteria: TargetingCriteria,

    /// Hard ceiling on connection requests per window. Must be positive.
    pub daily_limit: u32,

    /// Optional note template; `{name}` is replaced with the candidate's
    /// first name at dispatch time.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message_template: Option<String>,

    #[serde(default)]
    pub status: CampaignStatus,

    /// Why the campaign is paused, when it is.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pause_reason: Option<PauseReason>,

    pub created_at: DateTime<Utc>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_run_at: Option<DateTime<Utc>>,
}

impl Campaign {
    pub fn new(name: &str, account: &str, criteria: TargetingCriteria, daily_limit: u32) -> Self {
        Self {
            id: ulid::Ulid::new().to_string(),
            name: name.to_string(),
            account: account.to_string(),
            criteria,
            daily_limit,
            message_template: None,
            status: CampaignStatus::Draft,
            pause_reason: None,
            created_at: Utc::now(),
            updated_at: None,
            last_run_at: None,
        }
    }

    /// Apply a lifecycle event, updating status and pause reason in place.
    pub fn apply_event(&mut self, event: StatusEvent) -> Result<(), AppError> {
        let next = self.status.transition(event)?;
        self.pause_reason = match event {
            StatusEvent::LimitReached => Some(PauseReason::DailyLimit),
            StatusEvent::BlockDetected => Some(PauseReason::Detection),
            StatusEvent::Cancel => Some(PauseReason::Manual),
            _ => None,
        };
        self.status = next;
        self.updated_at = Some(Utc::now());
        Ok(())
    }

    /// Whether a resume must be explicitly acknowledged by an operator.
    pub fn needs_review(&self) -> bool {
        self.status == CampaignStatus::Paused && self.pause_reason == Some(PauseReason::Detection)
    }
}

/// Targeting criteria compiled into a platform search query.
///
/// Codes (geo urn, industry/company/school ids) are opaque platform
/// identifiers, validated for shape only.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetingCriteria {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub keywords: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub geo_urn: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub industry_ids: Vec<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub company_ids: Vec<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub school_ids: Vec<String>,

    /// Connection degrees to include. Empty means the platform default
    /// (first + second).
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub network: Vec<NetworkDegree>,
}

/// Connection degree filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NetworkDegree {
    First,
    Second,
    Third,
}

impl NetworkDegree {
    /// Platform wire code for this degree.
    pub fn as_code(&self) -> &'static str {
        match self {
            Self::First => "F",
            Self::Second => "S",
            Self::Third => "O",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "F" => Some(Self::First),
            "S" => Some(Self::Second),
            "O" => Some(Self::Third),
            _ => None,
        }
    }
}

/// Campaign lifecycle status.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CampaignStatus {
    #[default]
    Draft,
    Active,
    Paused,
    Completed,
    Failed,
}

/// Events driving campaign status transitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusEvent {
    /// First start of a draft campaign.
    Start,
    /// Manual resume of a paused campaign.
    Resume,
    /// Candidate stream exhausted or per-run cap hit.
    Exhaust,
    /// Daily budget consumed; resumable next window.
    LimitReached,
    /// Block signal from the platform; requires manual review.
    BlockDetected,
    /// User-requested stop.
    Cancel,
    /// Unclassified fatal error; terminal.
    Fail,
}

impl CampaignStatus {
    /// Attempt a status transition driven by `event`.
    ///
    /// ```text
    ///   Draft  --Start---------> Active
    ///   Active --Exhaust-------> Completed
    ///   Active --LimitReached--> Paused
    ///   Active --BlockDetected-> Paused
    ///   Active --Cancel--------> Paused
    ///   Active --Fail----------> Failed
    ///   Paused --Resume--------> Active
    ///   Paused --Exhaust-------> Completed
    /// ```
    ///
    /// All other combinations are rejected; in particular there is no
    /// re-entry into Draft and no way out of Completed or Failed.
    pub fn transition(&self, event: StatusEvent) -> Result<CampaignStatus, AppError> {
        use CampaignStatus::*;
        use StatusEvent::*;
        match (self, event) {
            (Draft, Start) => Ok(Active),
            (Active, Exhaust) => Ok(Completed),
            (Active, LimitReached) => Ok(Paused),
            (Active, BlockDetected) => Ok(Paused),
            (Active, Cancel) => Ok(Paused),
            (Active, Fail) => Ok(Failed),
            (Paused, Resume) => Ok(Active),
            (Paused, Exhaust) => Ok(Completed),
            (from, event) => Err(AppError::InvalidTransition { from: *from, event }),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Active => "active",
            Self::Paused => "paused",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }
}

impl std::fmt::Display for CampaignStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Why a campaign sits in Paused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PauseReason {
    /// Daily budget consumed; auto-resumable next window.
    DailyLimit,
    /// Platform block signal; manual review required.
    Detection,
    /// Operator stop.
    Manual,
}

/// A profile discovered by a search scan. Immutable once extracted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Candidate {
    /// Stable platform identifier (profile slug).
    pub profile_id: String,

    pub profile_url: String,

    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub headline: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub company: Option<String>,
}

impl Candidate {
    /// Key used to guarantee one attempt per (campaign, candidate) pair.
    pub fn dedupe_key(&self) -> String {
        self.profile_id.to_ascii_lowercase()
    }

    /// First name, title-cased, for note templates.
    pub fn first_name(&self) -> String {
        let first = self.name.split_whitespace().next().unwrap_or("");
        let mut chars = first.chars();
        match chars.next() {
            Some(c) => c.to_uppercase().collect::<String>() + &chars.as_str().to_lowercase(),
            None => String::new(),
        }
    }
}

/// Extract the stable profile slug from a profile URL.
///
/// `https://platform.example/in/jane-doe-123?origin=SEARCH` → `jane-doe-123`.
pub fn profile_id_from_url(url: &str) -> Option<String> {
    let path = url.split('?').next()?;
    let idx = path.find("/in/")?;
    let slug = path[idx + 4..].trim_matches('/');
    if slug.is_empty() {
        None
    } else {
        Some(slug.to_string())
    }
}

/// One recorded dispatch for (campaign, candidate). Append-only.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectionAttempt {
    /// ULID identifier.
    pub id: String,

    pub campaign_id: String,

    pub candidate: Candidate,

    pub outcome: AttemptOutcome,

    /// Whether a personalized note was attached.
    #[serde(default)]
    pub note_sent: bool,

    pub at: DateTime<Utc>,
}

impl ConnectionAttempt {
    pub fn new(campaign_id: &str, candidate: Candidate, outcome: AttemptOutcome) -> Self {
        Self {
            id: ulid::Ulid::new().to_string(),
            campaign_id: campaign_id.to_string(),
            candidate,
            outcome,
            note_sent: false,
            at: Utc::now(),
        }
    }
}

/// Outcome of a single connection dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttemptOutcome {
    Sent,
    AlreadyConnected,
    Skipped,
    Failed,
    Blocked,
}

impl AttemptOutcome {
    /// Whether this outcome consumes the candidate's single attempt slot.
    pub fn is_terminal_for_candidate(&self) -> bool {
        !matches!(self, Self::Skipped)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Sent => "sent",
            Self::AlreadyConnected => "already_connected",
            Self::Skipped => "skipped",
            Self::Failed => "failed",
            Self::Blocked => "blocked",
        }
    }
}

impl std::fmt::Display for AttemptOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Scan resumption token, persisted by the caller alongside progress.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageCursor {
    /// Zero-based index of the next page to fetch.
    pub page: u32,

    /// Opaque platform continuation token, when the platform supplies one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
}

impl PageCursor {
    pub fn start() -> Self {
        Self::default()
    }
}

/// What a completed (or interrupted) run reports back to the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    pub sent: u32,
    pub failed: u32,
    pub skipped: u32,
    pub final_status: CampaignStatus,
}

#[cfg(test)]
#[path = "types_tests.rs"]
mod tests;
