//! File layout under the state root:
//!
//! ```text
//! campaigns/{id}/campaign.toml    campaign record
//! campaigns/{id}/attempts.jsonl   append-only attempt log
//! campaigns/{id}/cursor.toml      resumable scan position
//! ```
//!
//! The attempt log is append-only and flushed per record, so a crash
//! mid-run loses at most the attempt being written, never a prior
//! one.

use std::collections::HashSet;
use std::fs::{self, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use lnk_core::{AppError, Campaign, ConnectionAttempt, PageCursor};
use tracing::warn;

/// Persistence contract for the campaign engine. Sync on purpose:
/// every operation is a small local file touch and callers hold no
/// locks across them.
pub trait Storage {
    fn save_campaign(&self, campaign: &Campaign) -> Result<()>;

    /// Fails with [`AppError::CampaignNotFound`] when no record exists.
    fn load_campaign(&self, id: &str) -> Result<Campaign>;

    fn list_campaigns(&self) -> Result<Vec<Campaign>>;

    /// Append one attempt to the campaign's log and flush it.
    fn save_attempt(&self, attempt: &ConnectionAttempt) -> Result<()>;

    fn load_attempts(&self, campaign_id: &str) -> Result<Vec<ConnectionAttempt>>;

    /// Dedupe keys of every profile the account has already spent an
    /// attempt on, across all of its campaigns.
    fn known_contacts(&self, account: &str) -> Result<HashSet<String>>;

    fn save_cursor(&self, campaign_id: &str, cursor: &PageCursor) -> Result<()>;

    fn load_cursor(&self, campaign_id: &str) -> Result<Option<PageCursor>>;

    fn clear_cursor(&self, campaign_id: &str) -> Result<()>;
}

#[derive(Debug, Clone)]
pub struct FileStore {
    root: PathBuf,
}

impl FileStore {
    pub fn new(root: &Path) -> Self {
        Self {
            root: root.to_path_buf(),
        }
    }

    fn campaigns_dir(&self) -> PathBuf {
        self.root.join("campaigns")
    }

    fn campaign_dir(&self, id: &str) -> PathBuf {
        self.campaigns_dir().join(id)
    }

    fn campaign_path(&self, id: &str) -> PathBuf {
        self.campaign_dir(id).join("campaign.toml")
    }

    fn attempts_path(&self, id: &str) -> PathBuf {
        self.campaign_dir(id).join("attempts.jsonl")
    }

    fn cursor_path(&self, id: &str) -> PathBuf {
        self.campaign_dir(id).join("cursor.toml")
    }
}

impl Storage for FileStore {
    fn save_campaign(&self, campaign: &Campaign) -> Result<()> {
        let dir = self.campaign_dir(&campaign.id);
        fs::create_dir_all(&dir)
            .with_context(|| format!("Failed to create campaign dir: {}", dir.display()))?;
        let contents =
            toml::to_string_pretty(campaign).context("Failed to serialize campaign")?;
        let path = self.campaign_path(&campaign.id);
        fs::write(&path, contents)
            .with_context(|| format!("Failed to write campaign: {}", path.display()))
    }

    fn load_campaign(&self, id: &str) -> Result<Campaign> {
        let path = self.campaign_path(id);
        if !path.exists() {
            return Err(AppError::CampaignNotFound(id.to_string()).into());
        }
        let contents = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read campaign: {}", path.display()))?;
        toml::from_str(&contents)
            .with_context(|| format!("Failed to parse campaign: {}", path.display()))
    }

    fn list_campaigns(&self) -> Result<Vec<Campaign>> {
        let dir = self.campaigns_dir();
        if !dir.exists() {
            return Ok(Vec::new());
        }
        let mut campaigns = Vec::new();
        for entry in fs::read_dir(&dir)
            .with_context(|| format!("Failed to read campaigns dir: {}", dir.display()))?
        {
            let entry = entry?;
            if !entry.path().is_dir() {
                continue;
            }
            let id = entry.file_name().to_string_lossy().to_string();
            match self.load_campaign(&id) {
                Ok(campaign) => campaigns.push(campaign),
                Err(e) => {
                    warn!(campaign_id = %id, error = %e, "skipping unreadable campaign");
                }
            }
        }
        campaigns.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(campaigns)
    }

    fn save_attempt(&self, attempt: &ConnectionAttempt) -> Result<()> {
        let dir = self.campaign_dir(&attempt.campaign_id);
        fs::create_dir_all(&dir)
            .with_context(|| format!("Failed to create campaign dir: {}", dir.display()))?;
        let path = self.attempts_path(&attempt.campaign_id);
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .with_context(|| format!("Failed to open attempt log: {}", path.display()))?;
        let line = serde_json::to_string(attempt).context("Failed to serialize attempt")?;
        writeln!(file, "{line}")
            .with_context(|| format!("Failed to append attempt: {}", path.display()))?;
        file.flush()
            .with_context(|| format!("Failed to flush attempt log: {}", path.display()))
    }

    fn load_attempts(&self, campaign_id: &str) -> Result<Vec<ConnectionAttempt>> {
        let path = self.attempts_path(campaign_id);
        if !path.exists() {
            return Ok(Vec::new());
        }
        let file = fs::File::open(&path)
            .with_context(|| format!("Failed to open attempt log: {}", path.display()))?;
        let mut attempts = Vec::new();
        for (n, line) in BufReader::new(file).lines().enumerate() {
            let line = line
                .with_context(|| format!("Failed to read attempt log: {}", path.display()))?;
            if line.trim().is_empty() {
                continue;
            }
            match serde_json::from_str(&line) {
                Ok(attempt) => attempts.push(attempt),
                // A torn final line from a crash is expected; anything
                // else is still not worth failing a run over.
                Err(e) => {
                    warn!(campaign_id, line = n + 1, error = %e, "skipping malformed attempt record");
                }
            }
        }
        Ok(attempts)
    }

    fn known_contacts(&self, account: &str) -> Result<HashSet<String>> {
        let mut known = HashSet::new();
        for campaign in self.list_campaigns()? {
            if campaign.account != account {
                continue;
            }
            for attempt in self.load_attempts(&campaign.id)? {
                if attempt.outcome.is_terminal_for_candidate() {
                    known.insert(attempt.candidate.dedupe_key());
                }
            }
        }
        Ok(known)
    }

    fn save_cursor(&self, campaign_id: &str, cursor: &PageCursor) -> Result<()> {
        let dir = self.campaign_dir(campaign_id);
        fs::create_dir_all(&dir)
            .with_context(|| format!("Failed to create campaign dir: {}", dir.display()))?;
        let contents = toml::to_string_pretty(cursor).context("Failed to serialize cursor")?;
        let path = self.cursor_path(campaign_id);
        fs::write(&path, contents)
            .with_context(|| format!("Failed to write cursor: {}", path.display()))
    }

    fn load_cursor(&self, campaign_id: &str) -> Result<Option<PageCursor>> {
        let path = self.cursor_path(campaign_id);
        if !path.exists() {
            return Ok(None);
        }
        let contents = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read cursor: {}", path.display()))?;
        let cursor = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse cursor: {}", path.display()))?;
        Ok(Some(cursor))
    }

    fn clear_cursor(&self, campaign_id: &str) -> Result<()> {
        let path = self.cursor_path(campaign_id);
        if path.exists() {
            fs::remove_file(&path)
                .with_context(|| format!("Failed to remove cursor: {}", path.display()))?;
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "store_tests.rs"]
mod store_tests;
