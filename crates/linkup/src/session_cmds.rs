use std::path::Path;

use anyhow::{Context, Result};
use chrono::Utc;
use lnk_config::Settings;
use lnk_session::SessionStore;

pub fn import(sessions: &SessionStore, account: &str, file: &Path) -> Result<()> {
    let blob = std::fs::read(file)
        .with_context(|| format!("Failed to read blob file: {}", file.display()))?;
    sessions.import_blob(account, &blob)?;
    println!("Imported session for {account} ({} bytes)", blob.len());
    Ok(())
}

pub fn status(sessions: &SessionStore, settings: &Settings, account: &str) -> Result<()> {
    match sessions.status(account)? {
        None => println!("No session stored for {account}."),
        Some(state) => {
            let expiry_hours = settings.session.expiry_hours;
            if !state.valid {
                println!("Session for {account} was invalidated; log in again.");
            } else if state.is_usable(expiry_hours, Utc::now()) {
                let age = Utc::now() - state.last_login_at;
                let left = expiry_hours.saturating_sub(age.num_hours().max(0) as u64);
                println!("Session for {account} is fresh (about {left}h left).");
            } else {
                println!(
                    "Session for {account} is stale (older than {expiry_hours}h); log in again."
                );
            }
        }
    }
    Ok(())
}

pub fn clear(sessions: &SessionStore, account: &str) -> Result<()> {
    sessions.clear(account)?;
    println!("Cleared session for {account}.");
    Ok(())
}
