//! Admission gate in front of every outbound action.
//!
//! `acquire` blocks until the account is eligible (window ceiling not
//! reached, pacing delay elapsed) or fails with a typed error; `commit`
//! records the action once the platform interaction has happened, so an
//! admission that never turned into an action does not consume budget.

use anyhow::Result;
use chrono::Utc;
use lnk_config::{AutomationSettings, CautionPolicy};
use lnk_core::AppError;
use rand::SeedableRng;
use rand::rngs::StdRng;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::budget::{BudgetStore, RateBudget};
use crate::pacing::{draw_jitter, eligible_at};

pub struct Scheduler {
    budget: RateBudget,
    store: BudgetStore,
    daily_limit: u32,
    min_delay: Duration,
    jitter_range: Duration,
    utc_offset_minutes: i32,
    caution_policy: CautionPolicy,
    caution_factor: u32,
    caution_raised: bool,
    rng: StdRng,
}

impl Scheduler {
    pub fn new(store: BudgetStore, budget: RateBudget, settings: &AutomationSettings) -> Self {
        Self::with_rng(store, budget, settings, StdRng::from_entropy())
    }

    /// Seeded variant for deterministic pacing in tests.
    pub fn with_rng(
        store: BudgetStore,
        budget: RateBudget,
        settings: &AutomationSettings,
        rng: StdRng,
    ) -> Self {
        Self {
            budget,
            store,
            daily_limit: settings.daily_limit,
            min_delay: settings.min_delay(),
            jitter_range: settings.jitter_range(),
            utc_offset_minutes: settings.utc_offset_minutes,
            caution_policy: settings.caution_policy,
            caution_factor: settings.caution_factor,
            caution_raised: false,
            rng,
        }
    }

    /// Actions still allowed in the current window.
    pub fn remaining(&self) -> u32 {
        self.daily_limit.saturating_sub(self.budget.count_today)
    }

    /// Stretch pacing after a soft warning. How long the stretch lasts
    /// depends on the configured policy.
    pub fn raise_caution(&mut self) {
        if !self.caution_raised {
            info!(
                factor = self.caution_factor,
                policy = ?self.caution_policy,
                "soft warning observed, stretching pacing"
            );
        }
        self.caution_raised = true;
    }

    fn factor(&self) -> u32 {
        if self.caution_raised {
            self.caution_factor
        } else {
            1
        }
    }

    /// Wait until the next action is admissible.
    ///
    /// Fails with `DailyLimitExceeded` once the window ceiling is
    /// reached and with `Cancelled` if the token fires first.
    pub async fn acquire(&mut self, cancel: &CancellationToken) -> Result<(), AppError> {
        if cancel.is_cancelled() {
            return Err(AppError::Cancelled);
        }

        let now = Utc::now();
        self.budget.roll_window(now, self.utc_offset_minutes);
        if self.budget.count_today >= self.daily_limit {
            return Err(AppError::DailyLimitExceeded {
                limit: self.daily_limit,
                resets_at: self.budget.window_reset_at,
            });
        }

        let factor = self.factor();
        let min_delay = self.min_delay * factor;
        let jitter = draw_jitter(&mut self.rng, self.jitter_range * factor);
        if let Some(at) = eligible_at(self.budget.last_action_at, min_delay, jitter)
            && at > now
        {
            let wait = (at - now).to_std().unwrap_or(Duration::ZERO);
            debug!(wait_ms = wait.as_millis() as u64, "pacing delay");
            tokio::select! {
                _ = cancel.cancelled() => return Err(AppError::Cancelled),
                _ = tokio::time::sleep(wait) => {}
            }
        }

        // A next-action policy spends its stretch on a single draw.
        if self.caution_raised && self.caution_policy == CautionPolicy::NextAction {
            self.caution_raised = false;
        }

        if cancel.is_cancelled() {
            return Err(AppError::Cancelled);
        }
        Ok(())
    }

    /// Record a completed action and persist the counters.
    pub fn commit(&mut self) -> Result<()> {
        self.budget.record(Utc::now());
        self.store.save(&self.budget)
    }
}

#[cfg(test)]
#[path = "scheduler_tests.rs"]
mod scheduler_tests;
