//! Single-holder account locking using `flock(2)` directly.
//! Independent crate with no internal lnk dependencies.
//!
//! Exactly one process may drive a given account at a time: a second
//! acquire fails fast with the holder's PID instead of queuing. Raw
//! `libc::flock` is used instead of RAII lock wrappers to avoid the
//! self-referential struct problem: an RAII guard borrows the lock
//! owner, making it impossible to store both in the same struct without
//! lifetime gymnastics.
//!
//! By calling `flock(2)` directly, we only need to own the `File` (which
//! owns the fd). `Drop` calls `flock(fd, LOCK_UN)` to release.

use anyhow::Context;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs::{self, File, OpenOptions};
use std::io::{Read, Write};
use std::os::unix::io::AsRawFd;
use std::path::{Path, PathBuf};

/// Diagnostic information written to lock files.
#[derive(Debug, Serialize, Deserialize)]
struct LockDiagnostic {
    pid: u32,
    account: String,
    reason: String,
    acquired_at: DateTime<Utc>,
}

#[derive(thiserror::Error, Debug)]
pub enum LockError {
    /// Another process holds the account. Never queued; fail fast.
    #[error("account '{account}' locked by PID {pid} (reason: {reason}, acquired: {acquired_at})")]
    Held {
        account: String,
        pid: u32,
        reason: String,
        acquired_at: DateTime<Utc>,
    },

    /// Lock held but the diagnostic file could not be read back.
    #[error("account '{0}' is locked (unable to read diagnostic info)")]
    HeldUnknown(String),

    #[error(transparent)]
    Io(#[from] anyhow::Error),
}

impl LockError {
    /// PID of the current holder, when known.
    pub fn holder_pid(&self) -> Option<u32> {
        match self {
            Self::Held { pid, .. } => Some(*pid),
            _ => None,
        }
    }
}

/// Account lock guard backed by `flock(2)`.
///
/// Holds the open `File` whose fd carries the advisory lock.
/// On `Drop`, the lock is explicitly released via `flock(fd, LOCK_UN)`.
pub struct AccountLock {
    /// The open lock file. Closing it also releases flock, but we call
    /// `LOCK_UN` explicitly in `Drop` for deterministic release timing.
    file: File,
    lock_path: PathBuf,
}

impl std::fmt::Debug for AccountLock {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AccountLock")
            .field("lock_path", &self.lock_path)
            .finish()
    }
}

impl Drop for AccountLock {
    fn drop(&mut self) {
        let fd = self.file.as_raw_fd();
        // SAFETY: `fd` is a valid file descriptor owned by `self.file`.
        // `LOCK_UN` releases the advisory lock. If the call fails (which is
        // extremely unlikely for a valid fd), the lock will still be released
        // when the fd is closed moments later.
        unsafe {
            libc::flock(fd, libc::LOCK_UN);
        }
    }
}

impl AccountLock {
    pub fn lock_path(&self) -> &Path {
        &self.lock_path
    }
}

/// Acquire a non-blocking exclusive lock for an account.
///
/// Lock path: `{state_root}/locks/{account}.lock`
///
/// On success:
/// - Acquires exclusive advisory lock via `flock(2)` with `LOCK_NB`
/// - Writes diagnostic JSON (pid, account, reason, acquired_at) to the file
/// - Returns `AccountLock` guard that releases on drop
///
/// On contention, reads the existing diagnostic to report which PID
/// holds the account.
pub fn acquire_account_lock(
    state_root: &Path,
    account: &str,
    reason: &str,
) -> Result<AccountLock, LockError> {
    let locks_dir = state_root.join("locks");
    fs::create_dir_all(&locks_dir)
        .with_context(|| format!("Failed to create locks directory: {}", locks_dir.display()))?;

    let lock_path = locks_dir.join(format!("{}.lock", account));

    let file = OpenOptions::new()
        .read(true)
        .write(true)
        .create(true)
        .truncate(false)
        .open(&lock_path)
        .with_context(|| format!("Failed to open lock file: {}", lock_path.display()))?;

    let fd = file.as_raw_fd();

    // SAFETY: `fd` is a valid file descriptor from the `File` we just opened.
    // `LOCK_EX | LOCK_NB` requests an exclusive non-blocking lock.
    let ret = unsafe { libc::flock(fd, libc::LOCK_EX | libc::LOCK_NB) };

    if ret == 0 {
        let mut lock = AccountLock { file, lock_path };

        let diagnostic = LockDiagnostic {
            pid: std::process::id(),
            account: account.to_string(),
            reason: reason.to_string(),
            acquired_at: Utc::now(),
        };

        let json =
            serde_json::to_string(&diagnostic).context("Failed to serialize lock diagnostic")?;

        lock.file
            .set_len(0)
            .context("Failed to truncate lock file")?;
        lock.file
            .write_all(json.as_bytes())
            .context("Failed to write lock diagnostic")?;
        lock.file
            .flush()
            .context("Failed to flush lock file")
            .map_err(LockError::Io)?;

        Ok(lock)
    } else {
        // Held by another process; read its diagnostic for the error.
        let mut contents = String::new();
        let read_ok = File::open(&lock_path)
            .and_then(|mut f| f.read_to_string(&mut contents))
            .is_ok();

        if read_ok
            && let Ok(diag) = serde_json::from_str::<LockDiagnostic>(&contents)
        {
            Err(LockError::Held {
                account: account.to_string(),
                pid: diag.pid,
                reason: diag.reason,
                acquired_at: diag.acquired_at,
            })
        } else {
            Err(LockError::HeldUnknown(account.to_string()))
        }
    }
}
