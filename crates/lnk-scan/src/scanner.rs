//! Pull-based scanner over paged search results.
//!
//! The scanner owns the paging loop: retries with exponential backoff
//! on transient fetch failures, deduplicates profiles within the scan,
//! classifies every response for detection markers, and stops at the
//! configured result and page caps. Callers pull one candidate at a
//! time so a dispatch halt leaves the cursor resumable.

use std::collections::{HashSet, VecDeque};
use std::time::Duration;

use lnk_core::{Candidate, PageCursor};
use lnk_detect::Verdict;
use thiserror::Error;
use tracing::{debug, warn};

use crate::client::{PlatformClient, PlatformError};

#[derive(Debug, Clone)]
pub struct ScanConfig {
    /// Stop after yielding this many candidates.
    pub max_results: usize,
    /// Stop after fetching this many pages, regardless of results.
    pub max_pages: u32,
    /// Retries per page on transient fetch failures.
    pub max_page_retries: u32,
    /// Base for exponential backoff between retries.
    pub backoff_base: Duration,
}

#[derive(Debug, Error)]
pub enum ScanError {
    #[error("scan blocked by platform: {marker}")]
    Blocked { marker: String },
    #[error("page fetch failed after {attempts} attempts")]
    PageFailed {
        attempts: u32,
        #[source]
        source: PlatformError,
    },
}

/// A scan that ended early, carrying everything gathered so far plus a
/// cursor to resume from.
#[derive(Debug)]
pub struct PartialScan {
    pub candidates: Vec<Candidate>,
    pub pages_fetched: u32,
    pub cursor: PageCursor,
    pub error: ScanError,
}

pub struct ProfileScanner<'a> {
    client: &'a dyn PlatformClient,
    query: String,
    cursor: PageCursor,
    config: ScanConfig,
    seen: HashSet<String>,
    buffer: VecDeque<Candidate>,
    pages_fetched: u32,
    yielded: usize,
    exhausted: bool,
    soft_warning: Option<String>,
}

impl<'a> ProfileScanner<'a> {
    pub fn new(client: &'a dyn PlatformClient, query: &str, config: ScanConfig) -> Self {
        Self::resume(client, query, config, PageCursor::start())
    }

    /// Resume a scan from a previously persisted cursor.
    pub fn resume(
        client: &'a dyn PlatformClient,
        query: &str,
        config: ScanConfig,
        cursor: PageCursor,
    ) -> Self {
        Self {
            client,
            query: query.to_string(),
            cursor,
            config,
            seen: HashSet::new(),
            buffer: VecDeque::new(),
            pages_fetched: 0,
            yielded: 0,
            exhausted: false,
            soft_warning: None,
        }
    }

    /// Cursor for the page the scanner would fetch next.
    pub fn cursor(&self) -> &PageCursor {
        &self.cursor
    }

    pub fn pages_fetched(&self) -> u32 {
        self.pages_fetched
    }

    /// Soft-warning marker seen since the last call, if any.
    pub fn take_soft_warning(&mut self) -> Option<String> {
        self.soft_warning.take()
    }

    /// Yield the next unseen candidate, fetching pages as needed.
    /// `Ok(None)` means the scan finished cleanly (results exhausted or
    /// a cap reached).
    pub async fn next(&mut self) -> Result<Option<Candidate>, ScanError> {
        loop {
            if self.yielded >= self.config.max_results {
                return Ok(None);
            }
            if let Some(candidate) = self.buffer.pop_front() {
                self.yielded += 1;
                return Ok(Some(candidate));
            }
            if self.exhausted || self.pages_fetched >= self.config.max_pages {
                return Ok(None);
            }
            self.fetch_next_page().await?;
        }
    }

    /// Drain the scanner into a vector, up to `max` candidates. An
    /// early stop returns everything gathered so far alongside the
    /// error and resume cursor.
    pub async fn collect(&mut self, max: usize) -> Result<Vec<Candidate>, Box<PartialScan>> {
        let mut out = Vec::new();
        while out.len() < max {
            match self.next().await {
                Ok(Some(candidate)) => out.push(candidate),
                Ok(None) => break,
                Err(error) => {
                    return Err(Box::new(PartialScan {
                        candidates: out,
                        pages_fetched: self.pages_fetched,
                        cursor: self.cursor.clone(),
                        error,
                    }));
                }
            }
        }
        Ok(out)
    }

    async fn fetch_next_page(&mut self) -> Result<(), ScanError> {
        let mut attempt: u32 = 0;
        let page = loop {
            match self.client.fetch_page(&self.query, &self.cursor).await {
                Ok(page) => break page,
                Err(source) => {
                    attempt += 1;
                    if !source.is_transient() || attempt > self.config.max_page_retries {
                        return Err(ScanError::PageFailed {
                            attempts: attempt,
                            source,
                        });
                    }
                    let backoff = self.config.backoff_base * 2u32.pow(attempt - 1);
                    warn!(
                        page = self.cursor.page,
                        attempt,
                        backoff_ms = backoff.as_millis() as u64,
                        error = %source,
                        "page fetch failed, retrying"
                    );
                    tokio::time::sleep(backoff).await;
                }
            }
        };

        let detection = lnk_detect::classify(&page.meta.url, &page.meta.body_excerpt);
        match detection.verdict {
            Verdict::Blocked => {
                self.exhausted = true;
                return Err(ScanError::Blocked {
                    marker: detection.marker().to_string(),
                });
            }
            Verdict::SoftWarning => {
                self.soft_warning = Some(detection.marker().to_string());
            }
            Verdict::Normal => {}
        }

        self.pages_fetched += 1;
        let mut fresh = 0usize;
        for candidate in page.candidates {
            if self.seen.insert(candidate.dedupe_key()) {
                self.buffer.push_back(candidate);
                fresh += 1;
            }
        }
        debug!(
            page = self.cursor.page,
            fresh,
            buffered = self.buffer.len(),
            "page scanned"
        );
        match page.next {
            Some(next) => self.cursor = next,
            None => self.exhausted = true,
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "scanner_tests.rs"]
mod scanner_tests;
