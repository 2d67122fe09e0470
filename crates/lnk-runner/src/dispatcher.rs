//! Single-candidate dispatch: send the invite, classify the response,
//! record the attempt.

use anyhow::Result;
use lnk_core::{AttemptOutcome, Campaign, Candidate, ConnectionAttempt};
use lnk_detect::Verdict;
use lnk_scan::{ConnectStatus, PlatformClient};
use lnk_storage::Storage;
use tracing::{info, warn};

/// What one dispatch produced, after the attempt has been persisted.
#[derive(Debug)]
pub struct DispatchReport {
    pub outcome: AttemptOutcome,
    pub note_sent: bool,
    /// Soft-warning marker from the response, if any.
    pub soft_warning: Option<String>,
    /// Block marker from the response. The attempt is already recorded
    /// when this is set; the caller halts the loop.
    pub blocked_marker: Option<String>,
}

pub struct ConnectionDispatcher<'a> {
    client: &'a dyn PlatformClient,
    storage: &'a dyn Storage,
}

impl<'a> ConnectionDispatcher<'a> {
    pub fn new(client: &'a dyn PlatformClient, storage: &'a dyn Storage) -> Self {
        Self { client, storage }
    }

    /// Render a note template for a candidate. `{name}` expands to the
    /// candidate's first name.
    pub fn render_note(template: Option<&str>, candidate: &Candidate) -> Option<String> {
        template.map(|t| t.replace("{name}", &candidate.first_name()))
    }

    /// Persist a Skipped attempt for a candidate filtered out before
    /// dispatch (already contacted elsewhere on this account). No
    /// platform action happens and no budget is spent.
    pub fn record_skip(&self, campaign: &Campaign, candidate: &Candidate) -> Result<()> {
        info!(
            profile = %candidate.profile_id,
            "already contacted on this account, skipping"
        );
        let attempt =
            ConnectionAttempt::new(&campaign.id, candidate.clone(), AttemptOutcome::Skipped);
        self.storage.save_attempt(&attempt)
    }

    /// Send one invite and persist the resulting attempt. The attempt
    /// record is durable before this returns, whatever the outcome.
    pub async fn dispatch(
        &self,
        campaign: &Campaign,
        candidate: &Candidate,
    ) -> Result<DispatchReport> {
        let note = Self::render_note(campaign.message_template.as_deref(), candidate);

        let mut note_sent = false;
        let mut soft_warning = None;
        let mut blocked_marker = None;

        let outcome = match self.client.connect(candidate, note.as_deref()).await {
            Ok(response) => {
                let detection = lnk_detect::classify(
                    &response.meta.url,
                    &response.meta.body_excerpt,
                );
                match detection.verdict {
                    Verdict::Blocked => {
                        warn!(
                            profile = %candidate.profile_id,
                            marker = detection.marker(),
                            "block signal on connect response"
                        );
                        blocked_marker = Some(detection.marker().to_string());
                        AttemptOutcome::Blocked
                    }
                    verdict => {
                        if verdict == Verdict::SoftWarning {
                            soft_warning = Some(detection.marker().to_string());
                        }
                        match response.status {
                            ConnectStatus::Sent => {
                                note_sent = note.is_some();
                                info!(
                                    profile = %candidate.profile_id,
                                    note = note_sent,
                                    "invitation sent"
                                );
                                AttemptOutcome::Sent
                            }
                            ConnectStatus::AlreadyConnected => {
                                info!(
                                    profile = %candidate.profile_id,
                                    "already connected or pending"
                                );
                                AttemptOutcome::AlreadyConnected
                            }
                            ConnectStatus::Unreachable(reason) => {
                                warn!(
                                    profile = %candidate.profile_id,
                                    reason = %reason,
                                    "invite refused"
                                );
                                AttemptOutcome::Failed
                            }
                        }
                    }
                }
            }
            Err(e) => {
                warn!(profile = %candidate.profile_id, error = %e, "connect failed");
                AttemptOutcome::Failed
            }
        };

        let mut attempt =
            ConnectionAttempt::new(&campaign.id, candidate.clone(), outcome);
        attempt.note_sent = note_sent;
        self.storage.save_attempt(&attempt)?;

        Ok(DispatchReport {
            outcome,
            note_sent,
            soft_warning,
            blocked_marker,
        })
    }
}

#[cfg(test)]
#[path = "dispatcher_tests.rs"]
mod dispatcher_tests;
