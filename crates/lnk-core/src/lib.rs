//! Shared data model and error taxonomy for the outreach engine.

pub mod error;
pub mod types;

pub use error::AppError;
pub use types::{
    AttemptOutcome, Campaign, CampaignStatus, Candidate, ConnectionAttempt, NetworkDegree,
    PageCursor, PauseReason, RunSummary, StatusEvent, TargetingCriteria, profile_id_from_url,
};
