use std::path::Path;

use anyhow::{Result, bail};
use lnk_config::Settings;
use lnk_core::CampaignStatus;
use lnk_runner::{CampaignRunner, RunOptions};
use lnk_session::SessionStore;
use lnk_storage::{FileStore, Storage};
use tokio_util::sync::CancellationToken;
use tracing::warn;

use crate::http_client::HttpPlatformClient;

pub async fn run(
    storage: &FileStore,
    sessions: &SessionStore,
    settings: &Settings,
    state_root: &Path,
    id: &str,
    opts: RunOptions,
) -> Result<()> {
    execute(storage, sessions, settings, state_root, id, opts).await
}

/// Resume a paused campaign. Refuses anything not actually paused, so
/// a typo'd id fails loudly instead of starting a draft.
pub async fn resume(
    storage: &FileStore,
    sessions: &SessionStore,
    settings: &Settings,
    state_root: &Path,
    id: &str,
    opts: RunOptions,
) -> Result<()> {
    let campaign = storage.load_campaign(id)?;
    if campaign.status != CampaignStatus::Paused {
        bail!("campaign {} is {}, not paused", campaign.id, campaign.status);
    }
    execute(storage, sessions, settings, state_root, id, opts).await
}

async fn execute(
    storage: &FileStore,
    sessions: &SessionStore,
    settings: &Settings,
    state_root: &Path,
    id: &str,
    opts: RunOptions,
) -> Result<()> {
    let campaign = storage.load_campaign(id)?;
    let blob = sessions.peek_blob(&campaign.account)?;
    let client = HttpPlatformClient::new(&settings.platform, &blob)?;

    let cancel = CancellationToken::new();
    {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                warn!("interrupt received, stopping after the action in flight");
                cancel.cancel();
            }
        });
    }

    let runner = CampaignRunner::new(storage, &client, sessions, settings, state_root);
    let summary = runner.run(id, &opts, &cancel).await?;

    println!(
        "Run finished: {} sent, {} failed, {} skipped.",
        summary.sent, summary.failed, summary.skipped
    );
    match summary.final_status {
        CampaignStatus::Completed => println!("Campaign completed."),
        CampaignStatus::Paused => {
            println!("Campaign paused; `linkup campaign show {id}` for details.")
        }
        CampaignStatus::Active => {
            println!("Run interrupted by scan failures; `linkup run {id}` to continue.")
        }
        status => println!("Campaign is now {status}."),
    }
    Ok(())
}
