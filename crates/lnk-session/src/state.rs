//! Session metadata persisted next to the auth blob.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

pub const SESSION_SCHEMA_VERSION: u32 = 1;

/// Metadata for one account's persisted session.
///
/// The auth blob itself lives in a sibling file and is never parsed by
/// the core; this struct only tracks who it belongs to and whether it
/// can still be trusted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionState {
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,

    pub account: String,

    /// When the blob was last refreshed by an interactive login.
    pub last_login_at: DateTime<Utc>,

    /// Cleared when the platform rejects the session mid-run; a cleared
    /// flag forces `AuthRequired` on the next acquire.
    #[serde(default = "default_valid")]
    pub valid: bool,
}

fn default_schema_version() -> u32 {
    SESSION_SCHEMA_VERSION
}

fn default_valid() -> bool {
    true
}

impl SessionState {
    pub fn new(account: &str) -> Self {
        Self {
            schema_version: SESSION_SCHEMA_VERSION,
            account: account.to_string(),
            last_login_at: Utc::now(),
            valid: true,
        }
    }

    /// Whether the session can be used without a fresh login.
    pub fn is_usable(&self, expiry_hours: u64, now: DateTime<Utc>) -> bool {
        self.valid && now - self.last_login_at < Duration::hours(expiry_hours as i64)
    }
}
