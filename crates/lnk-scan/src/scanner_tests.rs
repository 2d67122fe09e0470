use super::*;
use crate::client::{ConnectResponse, PlatformClient, ResponseMeta, SearchPage};
use async_trait::async_trait;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU32, Ordering};

fn candidate(id: &str) -> Candidate {
    Candidate {
        profile_id: id.to_string(),
        profile_url: format!("https://example.com/in/{id}/"),
        name: id.to_string(),
        headline: None,
        location: None,
        company: None,
    }
}

fn page(ids: &[&str], next: Option<u32>) -> SearchPage {
    SearchPage {
        candidates: ids.iter().map(|id| candidate(id)).collect(),
        next: next.map(|page| PageCursor { page, token: None }),
        meta: ResponseMeta {
            url: "https://example.com/search/results/people/".into(),
            body_excerpt: "results".into(),
        },
    }
}

/// Scripted client: pops one fetch result per call.
struct ScriptedClient {
    script: Mutex<Vec<Result<SearchPage, PlatformError>>>,
    fetches: AtomicU32,
}

impl ScriptedClient {
    fn new(script: Vec<Result<SearchPage, PlatformError>>) -> Self {
        Self {
            script: Mutex::new(script),
            fetches: AtomicU32::new(0),
        }
    }

    fn fetch_count(&self) -> u32 {
        self.fetches.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PlatformClient for ScriptedClient {
    async fn fetch_page(
        &self,
        _query: &str,
        _cursor: &PageCursor,
    ) -> Result<SearchPage, PlatformError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        let mut script = self.script.lock().unwrap();
        if script.is_empty() {
            return Err(PlatformError::Io("script exhausted".into()));
        }
        script.remove(0)
    }

    async fn connect(
        &self,
        _candidate: &Candidate,
        _note: Option<&str>,
    ) -> Result<ConnectResponse, PlatformError> {
        unreachable!("scanner never connects")
    }
}

fn config() -> ScanConfig {
    ScanConfig {
        max_results: 100,
        max_pages: 10,
        max_page_retries: 3,
        backoff_base: Duration::from_millis(500),
    }
}

#[tokio::test]
async fn test_yields_across_pages_until_exhausted() {
    let client = ScriptedClient::new(vec![
        Ok(page(&["ann", "bob"], Some(1))),
        Ok(page(&["cam"], None)),
    ]);
    let mut scanner = ProfileScanner::new(&client, "keywords=rust", config());

    let mut ids = Vec::new();
    while let Some(c) = scanner.next().await.unwrap() {
        ids.push(c.profile_id);
    }
    assert_eq!(ids, vec!["ann", "bob", "cam"]);
    assert_eq!(scanner.pages_fetched(), 2);

    // Exhausted scanner keeps returning None.
    assert!(scanner.next().await.unwrap().is_none());
    assert_eq!(client.fetch_count(), 2);
}

#[tokio::test]
async fn test_dedupes_within_scan_case_insensitively() {
    let client = ScriptedClient::new(vec![
        Ok(page(&["ann", "bob"], Some(1))),
        Ok(page(&["Ann", "cam", "bob"], None)),
    ]);
    let mut scanner = ProfileScanner::new(&client, "keywords=rust", config());

    let collected = scanner.collect(100).await.unwrap();
    let ids: Vec<_> = collected.into_iter().map(|c| c.profile_id).collect();
    assert_eq!(ids, vec!["ann", "bob", "cam"]);
}

#[tokio::test]
async fn test_max_results_cap() {
    let client = ScriptedClient::new(vec![Ok(page(&["a", "b", "c", "d"], Some(1)))]);
    let mut cfg = config();
    cfg.max_results = 2;
    let mut scanner = ProfileScanner::new(&client, "keywords=rust", cfg);

    let collected = scanner.collect(100).await.unwrap();
    assert_eq!(collected.len(), 2);
    assert!(scanner.next().await.unwrap().is_none());
    assert_eq!(client.fetch_count(), 1);
}

#[tokio::test]
async fn test_max_pages_cap() {
    let client = ScriptedClient::new(vec![
        Ok(page(&["a"], Some(1))),
        Ok(page(&["b"], Some(2))),
        Ok(page(&["c"], Some(3))),
    ]);
    let mut cfg = config();
    cfg.max_pages = 2;
    let mut scanner = ProfileScanner::new(&client, "keywords=rust", cfg);

    let collected = scanner.collect(100).await.unwrap();
    assert_eq!(collected.len(), 2);
    assert_eq!(client.fetch_count(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_transient_failure_retried_with_backoff() {
    let client = ScriptedClient::new(vec![
        Err(PlatformError::Timeout),
        Err(PlatformError::Io("reset".into())),
        Ok(page(&["ann"], None)),
    ]);
    let mut scanner = ProfileScanner::new(&client, "keywords=rust", config());

    let start = tokio::time::Instant::now();
    let c = scanner.next().await.unwrap().unwrap();
    assert_eq!(c.profile_id, "ann");
    assert_eq!(client.fetch_count(), 3);
    // 500ms then 1000ms of backoff.
    assert!(start.elapsed() >= Duration::from_millis(1500));
}

#[tokio::test(start_paused = true)]
async fn test_retry_exhaustion_yields_partial_scan() {
    let client = ScriptedClient::new(vec![
        Ok(page(&["ann", "bob"], Some(1))),
        Ok(page(&["cam"], Some(2))),
        Ok(page(&["dee"], Some(3))),
        Err(PlatformError::Timeout),
        Err(PlatformError::Timeout),
        Err(PlatformError::Timeout),
        Err(PlatformError::Timeout),
    ]);
    let mut scanner = ProfileScanner::new(&client, "keywords=rust", config());

    let partial = scanner.collect(100).await.unwrap_err();
    let ids: Vec<_> = partial.candidates.iter().map(|c| &c.profile_id).collect();
    assert_eq!(ids, vec!["ann", "bob", "cam", "dee"]);
    assert_eq!(partial.pages_fetched, 3);
    // Resume cursor points at the page that kept failing.
    assert_eq!(partial.cursor.page, 3);
    assert!(matches!(
        partial.error,
        ScanError::PageFailed { attempts: 4, .. }
    ));
}

#[tokio::test(start_paused = true)]
async fn test_malformed_page_retried_then_recovers() {
    let client = ScriptedClient::new(vec![
        Err(PlatformError::MalformedPage("no results container".into())),
        Ok(page(&["ann"], None)),
    ]);
    let mut scanner = ProfileScanner::new(&client, "keywords=rust", config());

    let c = scanner.next().await.unwrap().unwrap();
    assert_eq!(c.profile_id, "ann");
    assert_eq!(client.fetch_count(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_persistently_malformed_page_exhausts_retries() {
    let client = ScriptedClient::new(vec![
        Err(PlatformError::MalformedPage("no results container".into())),
        Err(PlatformError::MalformedPage("no results container".into())),
        Err(PlatformError::MalformedPage("no results container".into())),
        Err(PlatformError::MalformedPage("no results container".into())),
    ]);
    let mut scanner = ProfileScanner::new(&client, "keywords=rust", config());

    let err = scanner.next().await.unwrap_err();
    assert!(matches!(err, ScanError::PageFailed { attempts: 4, .. }));
    assert_eq!(client.fetch_count(), 4);
}

#[tokio::test]
async fn test_blocked_page_halts_scan() {
    let mut blocked = page(&["ann"], Some(1));
    blocked.meta.url = "https://example.com/checkpoint/challenge".into();
    let client = ScriptedClient::new(vec![Ok(blocked)]);
    let mut scanner = ProfileScanner::new(&client, "keywords=rust", config());

    match scanner.next().await {
        Err(ScanError::Blocked { marker }) => {
            assert_eq!(marker, "/checkpoint/challenge");
        }
        other => panic!("expected blocked, got {other:?}"),
    }
    // No candidates from the blocked page leak through.
    assert!(scanner.next().await.unwrap().is_none());
}

#[tokio::test]
async fn test_soft_warning_surfaces_without_halting() {
    let mut soft = page(&["ann"], None);
    soft.meta.body_excerpt = "You're close to the weekly invitation limit".into();
    let client = ScriptedClient::new(vec![Ok(soft)]);
    let mut scanner = ProfileScanner::new(&client, "keywords=rust", config());

    let c = scanner.next().await.unwrap().unwrap();
    assert_eq!(c.profile_id, "ann");
    let marker = scanner.take_soft_warning();
    assert!(marker.is_some());
    // Consumed on read.
    assert!(scanner.take_soft_warning().is_none());
}

#[tokio::test]
async fn test_resume_skips_to_cursor() {
    let client = ScriptedClient::new(vec![Ok(page(&["eve"], None))]);
    let cursor = PageCursor {
        page: 3,
        token: Some("tok".into()),
    };
    let mut scanner = ProfileScanner::resume(&client, "keywords=rust", config(), cursor);

    assert_eq!(scanner.cursor().page, 3);
    let c = scanner.next().await.unwrap().unwrap();
    assert_eq!(c.profile_id, "eve");
}
