//! The campaign run loop.
//!
//! One runner drives one campaign for one account: scan candidates,
//! gate each dispatch through the rate scheduler, record every attempt
//! before moving on, and translate whatever ends the loop into a
//! campaign status transition. Progress (attempts, cursor, budget) is
//! persisted per candidate, so an interruption loses at most the
//! action in flight.

use std::collections::HashSet;
use std::path::Path;
use std::time::Duration;

use anyhow::Result;
use chrono::Utc;
use lnk_budget::{BudgetStore, Scheduler};
use lnk_config::Settings;
use lnk_core::{AppError, AttemptOutcome, Campaign, CampaignStatus, RunSummary, StatusEvent};
use lnk_scan::{PlatformClient, ProfileScanner, ScanConfig, ScanError};
use lnk_session::SessionStore;
use lnk_storage::Storage;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::dispatcher::ConnectionDispatcher;

#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    /// Acknowledge the manual-review flag on a detection-paused
    /// campaign. Resuming such a campaign without this fails.
    pub acknowledge_review: bool,

    /// Cap on platform actions for this run. The campaign completes
    /// when the cap is hit.
    pub max_actions: Option<u32>,
}

pub struct CampaignRunner<'a> {
    storage: &'a dyn Storage,
    client: &'a dyn PlatformClient,
    sessions: &'a SessionStore,
    settings: &'a Settings,
    budgets: BudgetStore,
}

/// How the run loop ended, before it is mapped onto the campaign FSM.
/// `event: None` means the loop aborted without advancing the campaign
/// (recoverable scan failure).
struct LoopEnd {
    sent: u32,
    failed: u32,
    skipped: u32,
    event: Option<StatusEvent>,
    /// The block marker showed the session no longer authenticates;
    /// it must be invalidated before release.
    auth_lost: bool,
}

impl<'a> CampaignRunner<'a> {
    pub fn new(
        storage: &'a dyn Storage,
        client: &'a dyn PlatformClient,
        sessions: &'a SessionStore,
        settings: &'a Settings,
        state_root: &Path,
    ) -> Self {
        Self {
            storage,
            client,
            sessions,
            settings,
            budgets: BudgetStore::new(state_root),
        }
    }

    /// Execute one run of a campaign until exhaustion, pause, or
    /// failure. Draft campaigns start; paused campaigns resume (with
    /// acknowledgment when a detection pause set the review flag);
    /// campaigns left Active by an interrupted run continue.
    pub async fn run(
        &self,
        campaign_id: &str,
        opts: &RunOptions,
        cancel: &CancellationToken,
    ) -> Result<RunSummary> {
        let mut campaign = self.storage.load_campaign(campaign_id)?;

        // Validate locally before any state changes: a campaign with
        // bad criteria never starts.
        let query = lnk_query::compile(&campaign.criteria)?;

        let entry_event = match campaign.status {
            CampaignStatus::Draft => Some(StatusEvent::Start),
            CampaignStatus::Paused => {
                if campaign.needs_review() && !opts.acknowledge_review {
                    return Err(AppError::ReviewRequired(campaign.id.clone()).into());
                }
                Some(StatusEvent::Resume)
            }
            CampaignStatus::Active => {
                warn!(campaign = %campaign.id, "resuming interrupted run");
                None
            }
            status => {
                return Err(AppError::validation(
                    "status",
                    format!("campaign is {status} and cannot run"),
                )
                .into());
            }
        };

        // A valid session is required before the campaign activates.
        let mut session = self.sessions.acquire(&campaign.account)?;
        info!(campaign = %campaign.id, account = %campaign.account, "run starting");

        if let Some(event) = entry_event {
            campaign.apply_event(event)?;
        }
        campaign.last_run_at = Some(Utc::now());
        self.storage.save_campaign(&campaign)?;

        let end = match self
            .run_loop(&campaign, &query.render(), opts, cancel)
            .await
        {
            Ok(end) => end,
            Err(e) => {
                // Unclassified failure: terminal.
                campaign.apply_event(StatusEvent::Fail)?;
                self.storage.save_campaign(&campaign)?;
                drop(session);
                return Err(e);
            }
        };

        if let Some(event) = end.event {
            campaign.apply_event(event)?;
        }
        if campaign.status == CampaignStatus::Completed {
            self.storage.clear_cursor(&campaign.id)?;
        }
        self.storage.save_campaign(&campaign)?;
        // An auth wall means the persisted blob is dead; the next
        // acquire must signal AuthRequired. Any other block leaves the
        // session intact for a later resume.
        if end.auth_lost {
            session.invalidate();
        }
        session.release()?;

        let summary = RunSummary {
            sent: end.sent,
            failed: end.failed,
            skipped: end.skipped,
            final_status: campaign.status,
        };
        info!(
            campaign = %campaign.id,
            sent = summary.sent,
            failed = summary.failed,
            skipped = summary.skipped,
            status = %summary.final_status,
            "run finished"
        );
        Ok(summary)
    }

    async fn run_loop(
        &self,
        campaign: &Campaign,
        query: &str,
        opts: &RunOptions,
        cancel: &CancellationToken,
    ) -> Result<LoopEnd> {
        // The campaign's own ceiling overrides the configured default.
        let mut auto = self.settings.automation.clone();
        auto.daily_limit = campaign.daily_limit;

        let budget = self.budgets.load_or_new(
            &campaign.account,
            Utc::now(),
            auto.utc_offset_minutes,
        )?;
        let mut scheduler = Scheduler::new(self.budgets.clone(), budget, &auto);

        let scan_config = ScanConfig {
            max_results: auto.search_limit as usize,
            max_pages: auto.max_pages,
            max_page_retries: auto.max_page_retries,
            backoff_base: Duration::from_millis(auto.backoff_base_ms),
        };
        let cursor = self.storage.load_cursor(&campaign.id)?.unwrap_or_default();
        let mut scanner = ProfileScanner::resume(self.client, query, scan_config, cursor);

        let dispatcher = ConnectionDispatcher::new(self.client, self.storage);
        // Candidates already contacted anywhere on the account are never
        // dispatched; candidates with any attempt row in this campaign
        // (including Skipped) are never logged twice.
        let known = self.storage.known_contacts(&campaign.account)?;
        let mut attempted: HashSet<String> = self
            .storage
            .load_attempts(&campaign.id)?
            .iter()
            .map(|attempt| attempt.candidate.dedupe_key())
            .collect();

        let mut sent = 0u32;
        let mut failed = 0u32;
        let mut skipped = 0u32;
        let mut actions = 0u32;
        let mut auth_lost = false;

        let event = loop {
            if let Some(cap) = opts.max_actions
                && actions >= cap
            {
                info!(campaign = %campaign.id, cap, "per-run action cap reached");
                break Some(StatusEvent::Exhaust);
            }

            let candidate = match scanner.next().await {
                Ok(Some(candidate)) => candidate,
                Ok(None) => break Some(StatusEvent::Exhaust),
                Err(ScanError::Blocked { marker }) => {
                    warn!(campaign = %campaign.id, marker = %marker, "scan blocked");
                    auth_lost = lnk_detect::is_auth_loss(&marker);
                    break Some(StatusEvent::BlockDetected);
                }
                Err(e @ ScanError::PageFailed { .. }) => {
                    // Partial scan: keep what was dispatched, leave the
                    // campaign Active and the cursor in place so a new
                    // run picks up where this one stopped.
                    warn!(campaign = %campaign.id, error = %e, "scan ended early");
                    self.storage.save_cursor(&campaign.id, scanner.cursor())?;
                    break None;
                }
            };

            if let Some(marker) = scanner.take_soft_warning() {
                warn!(campaign = %campaign.id, marker = %marker, "soft warning during scan");
                scheduler.raise_caution();
            }

            let key = candidate.dedupe_key();
            if attempted.contains(&key) {
                skipped += 1;
                continue;
            }
            if known.contains(&key) {
                dispatcher.record_skip(campaign, &candidate)?;
                skipped += 1;
                attempted.insert(key);
                continue;
            }

            match scheduler.acquire(cancel).await {
                Ok(()) => {}
                Err(AppError::DailyLimitExceeded { limit, resets_at }) => {
                    info!(
                        campaign = %campaign.id,
                        limit,
                        resets_at = %resets_at,
                        "daily budget spent"
                    );
                    self.storage.save_cursor(&campaign.id, scanner.cursor())?;
                    break Some(StatusEvent::LimitReached);
                }
                Err(AppError::Cancelled) => {
                    info!(campaign = %campaign.id, "cancelled");
                    self.storage.save_cursor(&campaign.id, scanner.cursor())?;
                    break Some(StatusEvent::Cancel);
                }
                Err(e) => return Err(e.into()),
            }

            let report = dispatcher.dispatch(campaign, &candidate).await?;
            scheduler.commit()?;
            actions += 1;

            if let Some(marker) = report.soft_warning {
                warn!(campaign = %campaign.id, marker = %marker, "soft warning on dispatch");
                scheduler.raise_caution();
            }

            match report.outcome {
                AttemptOutcome::Sent => {
                    sent += 1;
                    attempted.insert(key);
                }
                AttemptOutcome::AlreadyConnected | AttemptOutcome::Skipped => {
                    skipped += 1;
                    attempted.insert(key);
                }
                AttemptOutcome::Failed => {
                    failed += 1;
                    attempted.insert(key);
                }
                AttemptOutcome::Blocked => {
                    failed += 1;
                    if let Some(marker) = &report.blocked_marker {
                        auth_lost = lnk_detect::is_auth_loss(marker);
                    }
                    self.storage.save_cursor(&campaign.id, scanner.cursor())?;
                    break Some(StatusEvent::BlockDetected);
                }
            }

            self.storage.save_cursor(&campaign.id, scanner.cursor())?;
        };

        Ok(LoopEnd {
            sent,
            failed,
            skipped,
            event,
            auth_lost,
        })
    }
}
