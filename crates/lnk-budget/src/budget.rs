//! Persisted per-account counters for the current window.

use anyhow::{Context, Result};
use chrono::{DateTime, FixedOffset, Offset, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Per-account counters for the current window.
///
/// Counters are monotonic non-decreasing within a window and reset
/// exactly once at the window boundary. Persisted so a restart cannot
/// overshoot the ceiling.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateBudget {
    pub account: String,

    /// Actions committed since the last window reset.
    pub count_today: u32,

    /// When the current window ends and counters reset.
    pub window_reset_at: DateTime<Utc>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_action_at: Option<DateTime<Utc>>,
}

impl RateBudget {
    pub fn new(account: &str, now: DateTime<Utc>, utc_offset_minutes: i32) -> Self {
        Self {
            account: account.to_string(),
            count_today: 0,
            window_reset_at: next_window_boundary(now, utc_offset_minutes),
            last_action_at: None,
        }
    }

    /// Reset counters if `now` has crossed the window boundary.
    pub fn roll_window(&mut self, now: DateTime<Utc>, utc_offset_minutes: i32) {
        if now >= self.window_reset_at {
            debug!(
                account = %self.account,
                spent = self.count_today,
                "rate window rolled over"
            );
            self.count_today = 0;
            self.window_reset_at = next_window_boundary(now, utc_offset_minutes);
        }
    }

    /// Record one committed action.
    pub fn record(&mut self, now: DateTime<Utc>) {
        self.count_today = self.count_today.saturating_add(1);
        self.last_action_at = Some(now);
    }
}

/// Next local midnight for the account's configured UTC offset,
/// expressed in UTC.
pub fn next_window_boundary(now: DateTime<Utc>, utc_offset_minutes: i32) -> DateTime<Utc> {
    let offset = FixedOffset::east_opt(utc_offset_minutes * 60).unwrap_or_else(|| Utc.fix());
    let local = now.with_timezone(&offset);
    let next_midnight = local
        .date_naive()
        .succ_opt()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .and_then(|naive| offset.from_local_datetime(&naive).single());
    match next_midnight {
        Some(dt) => dt.with_timezone(&Utc),
        // Date arithmetic only fails at the far end of the calendar.
        None => now + chrono::Duration::hours(24),
    }
}

/// File-backed store for budgets: `{root}/budgets/{account}.toml`.
#[derive(Debug, Clone)]
pub struct BudgetStore {
    root: PathBuf,
}

impl BudgetStore {
    pub fn new(root: &Path) -> Self {
        Self {
            root: root.to_path_buf(),
        }
    }

    fn path(&self, account: &str) -> PathBuf {
        self.root.join("budgets").join(format!("{account}.toml"))
    }

    /// Load the persisted budget, or start a fresh one.
    pub fn load_or_new(
        &self,
        account: &str,
        now: DateTime<Utc>,
        utc_offset_minutes: i32,
    ) -> Result<RateBudget> {
        let path = self.path(account);
        if !path.exists() {
            return Ok(RateBudget::new(account, now, utc_offset_minutes));
        }
        let contents = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read budget: {}", path.display()))?;
        let budget = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse budget: {}", path.display()))?;
        Ok(budget)
    }

    pub fn save(&self, budget: &RateBudget) -> Result<()> {
        let dir = self.root.join("budgets");
        fs::create_dir_all(&dir)
            .with_context(|| format!("Failed to create budgets dir: {}", dir.display()))?;
        let path = self.path(&budget.account);
        let contents = toml::to_string_pretty(budget).context("Failed to serialize budget")?;
        fs::write(&path, contents)
            .with_context(|| format!("Failed to write budget: {}", path.display()))
    }
}
