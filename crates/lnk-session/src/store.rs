//! Session acquire/persist/release against the on-disk store.

use anyhow::{Context, Result};
use chrono::Utc;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use lnk_core::AppError;
use lnk_lock::{AccountLock, LockError, acquire_account_lock};

use crate::state::SessionState;

const STATE_FILE_NAME: &str = "session.toml";
const BLOB_FILE_NAME: &str = "auth_blob.bin";

/// Get the default state root (`~/.local/state/linkup` on Linux).
pub fn default_state_root() -> Result<PathBuf> {
    let proj_dirs = directories::ProjectDirs::from("", "", "linkup")
        .context("Failed to determine project directories")?;

    // state_dir() is Linux-only; fall back to data_local_dir() elsewhere.
    let state_dir = proj_dirs
        .state_dir()
        .unwrap_or_else(|| proj_dirs.data_local_dir());

    Ok(state_dir.to_path_buf())
}

/// On-disk store of per-account sessions.
///
/// Layout: `{root}/accounts/{account}/session.toml` + `auth_blob.bin`,
/// with holder locks under `{root}/locks/`.
#[derive(Debug, Clone)]
pub struct SessionStore {
    root: PathBuf,
    expiry_hours: u64,
}

impl SessionStore {
    pub fn open(expiry_hours: u64) -> Result<Self> {
        Ok(Self {
            root: default_state_root()?,
            expiry_hours,
        })
    }

    /// Store rooted at an explicit directory (tests, custom setups).
    pub fn with_root(root: &Path, expiry_hours: u64) -> Self {
        Self {
            root: root.to_path_buf(),
            expiry_hours,
        }
    }

    fn account_dir(&self, account: &str) -> PathBuf {
        self.root.join("accounts").join(account)
    }

    /// Acquire the single-holder session for `account`.
    ///
    /// Fails with [`AppError::SessionLocked`] when another process holds
    /// the account (never queues), and with [`AppError::AuthRequired`]
    /// when no persisted blob exists, it has aged past the freshness
    /// window, or it was invalidated by a previous run.
    pub fn acquire(&self, account: &str) -> Result<SessionHandle> {
        let lock = match acquire_account_lock(&self.root, account, "session acquire") {
            Ok(lock) => lock,
            Err(err @ LockError::Held { .. }) => {
                let pid = err.holder_pid().unwrap_or(0);
                return Err(AppError::SessionLocked {
                    account: account.to_string(),
                    pid,
                }
                .into());
            }
            Err(LockError::HeldUnknown(_)) => {
                return Err(AppError::SessionLocked {
                    account: account.to_string(),
                    pid: 0,
                }
                .into());
            }
            Err(LockError::Io(err)) => return Err(err),
        };

        let dir = self.account_dir(account);
        let state = match load_state(&dir)? {
            Some(state) if state.is_usable(self.expiry_hours, Utc::now()) => state,
            Some(state) => {
                info!(
                    account,
                    last_login = %state.last_login_at,
                    valid = state.valid,
                    "persisted session is stale or invalidated"
                );
                return Err(AppError::AuthRequired(account.to_string()).into());
            }
            None => return Err(AppError::AuthRequired(account.to_string()).into()),
        };

        let blob_path = dir.join(BLOB_FILE_NAME);
        let blob = fs::read(&blob_path)
            .with_context(|| format!("Failed to read auth blob: {}", blob_path.display()))?;

        info!(account, blob_bytes = blob.len(), "session acquired");

        Ok(SessionHandle {
            state,
            blob,
            dir,
            _lock: lock,
        })
    }

    /// Record a fresh out-of-band login: store the opaque blob and stamp
    /// the metadata. The blob is never inspected.
    pub fn import_blob(&self, account: &str, blob: &[u8]) -> Result<()> {
        let dir = self.account_dir(account);
        fs::create_dir_all(&dir)
            .with_context(|| format!("Failed to create account dir: {}", dir.display()))?;

        fs::write(dir.join(BLOB_FILE_NAME), blob).context("Failed to write auth blob")?;
        save_state(&dir, &SessionState::new(account))?;
        info!(account, blob_bytes = blob.len(), "session blob imported");
        Ok(())
    }

    /// Peek at stored metadata without taking the holder lock.
    pub fn status(&self, account: &str) -> Result<Option<SessionState>> {
        load_state(&self.account_dir(account))
    }

    /// Read the stored blob without taking the holder lock. Fails with
    /// [`AppError::AuthRequired`] when no blob exists; exclusivity is
    /// still enforced by the later `acquire`.
    pub fn peek_blob(&self, account: &str) -> Result<Vec<u8>> {
        let blob_path = self.account_dir(account).join(BLOB_FILE_NAME);
        if !blob_path.exists() {
            return Err(AppError::AuthRequired(account.to_string()).into());
        }
        fs::read(&blob_path)
            .with_context(|| format!("Failed to read auth blob: {}", blob_path.display()))
    }

    /// Remove any persisted session for `account`.
    pub fn clear(&self, account: &str) -> Result<()> {
        let dir = self.account_dir(account);
        if dir.exists() {
            fs::remove_dir_all(&dir)
                .with_context(|| format!("Failed to clear session dir: {}", dir.display()))?;
            info!(account, "session cleared");
        }
        Ok(())
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

/// An acquired session: the opaque blob, its metadata, and the holder
/// lock. All network-facing operations take this handle explicitly.
#[derive(Debug)]
pub struct SessionHandle {
    state: SessionState,
    blob: Vec<u8>,
    dir: PathBuf,
    _lock: AccountLock,
}

impl SessionHandle {
    pub fn account(&self) -> &str {
        &self.state.account
    }

    /// The opaque auth blob. Treated as bytes end to end.
    pub fn blob(&self) -> &[u8] {
        &self.blob
    }

    pub fn is_valid(&self) -> bool {
        self.state.valid
    }

    /// Flag the session as rejected by the platform. The next acquire
    /// re-signals `AuthRequired`.
    pub fn invalidate(&mut self) {
        warn!(account = %self.state.account, "session invalidated");
        self.state.valid = false;
    }

    /// Replace the blob after the platform rotated session material.
    pub fn update_blob(&mut self, blob: Vec<u8>) {
        self.blob = blob;
    }

    /// Write blob and metadata durably.
    pub fn persist(&self) -> Result<()> {
        fs::create_dir_all(&self.dir)
            .with_context(|| format!("Failed to create account dir: {}", self.dir.display()))?;
        fs::write(self.dir.join(BLOB_FILE_NAME), &self.blob)
            .context("Failed to write auth blob")?;
        save_state(&self.dir, &self.state)
    }

    /// Persist, then release the holder lock.
    pub fn release(self) -> Result<()> {
        self.persist()
        // _lock dropped here, releasing flock.
    }
}

fn load_state(dir: &Path) -> Result<Option<SessionState>> {
    let path = dir.join(STATE_FILE_NAME);
    if !path.exists() {
        return Ok(None);
    }
    let contents = fs::read_to_string(&path)
        .with_context(|| format!("Failed to read session state: {}", path.display()))?;
    let state = toml::from_str(&contents)
        .with_context(|| format!("Failed to parse session state: {}", path.display()))?;
    Ok(Some(state))
}

fn save_state(dir: &Path, state: &SessionState) -> Result<()> {
    let path = dir.join(STATE_FILE_NAME);
    let contents = toml::to_string_pretty(state).context("Failed to serialize session state")?;
    fs::write(&path, contents)
        .with_context(|| format!("Failed to write session state: {}", path.display()))
}

#[cfg(test)]
#[path = "store_tests.rs"]
mod tests;
