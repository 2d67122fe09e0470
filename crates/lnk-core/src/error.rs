use chrono::{DateTime, Utc};

use crate::types::{CampaignStatus, StatusEvent};

#[derive(thiserror::Error, Debug)]
pub enum AppError {
    #[error("Invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("No valid session for account '{0}': interactive login required")]
    AuthRequired(String),

    #[error("Session for account '{account}' locked by PID {pid}")]
    SessionLocked { account: String, pid: u32 },

    #[error("Daily limit of {limit} reached; window resets at {resets_at}")]
    DailyLimitExceeded {
        limit: u32,
        resets_at: DateTime<Utc>,
    },

    #[error("Automation blocked by platform signal: {marker}")]
    Blocked { marker: String },

    #[error("Campaign '{0}' was paused by a block signal and requires manual review before resume")]
    ReviewRequired(String),

    #[error("Invalid campaign transition: {from} + {event:?}")]
    InvalidTransition {
        from: CampaignStatus,
        event: StatusEvent,
    },

    #[error("Run cancelled")]
    Cancelled,

    #[error("Campaign '{0}' not found")]
    CampaignNotFound(String),
}

impl AppError {
    /// Validation error naming the offending field.
    pub fn validation(field: &str, reason: impl Into<String>) -> Self {
        Self::Validation {
            field: field.to_string(),
            reason: reason.into(),
        }
    }
}
