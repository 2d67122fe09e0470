use super::*;
use async_trait::async_trait;
use lnk_core::{PageCursor, TargetingCriteria};
use lnk_scan::{ConnectResponse, PlatformError, ResponseMeta, SearchPage};
use lnk_storage::FileStore;
use std::sync::Mutex;
use tempfile::tempdir;

fn candidate(id: &str, name: &str) -> Candidate {
    Candidate {
        profile_id: id.to_string(),
        profile_url: format!("https://example.com/in/{id}/"),
        name: name.to_string(),
        headline: None,
        location: None,
        company: None,
    }
}

fn campaign_with_note(note: Option<&str>) -> Campaign {
    let criteria = TargetingCriteria {
        keywords: Some("rust".into()),
        ..Default::default()
    };
    let mut c = Campaign::new("outreach", "alice", criteria, 10);
    c.message_template = note.map(str::to_string);
    c
}

struct ConnectClient {
    responses: Mutex<Vec<Result<ConnectResponse, PlatformError>>>,
    notes: Mutex<Vec<Option<String>>>,
}

impl ConnectClient {
    fn new(responses: Vec<Result<ConnectResponse, PlatformError>>) -> Self {
        Self {
            responses: Mutex::new(responses),
            notes: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl PlatformClient for ConnectClient {
    async fn fetch_page(
        &self,
        _query: &str,
        _cursor: &PageCursor,
    ) -> Result<SearchPage, PlatformError> {
        unreachable!("dispatcher never scans")
    }

    async fn connect(
        &self,
        _candidate: &Candidate,
        note: Option<&str>,
    ) -> Result<ConnectResponse, PlatformError> {
        self.notes.lock().unwrap().push(note.map(str::to_string));
        self.responses.lock().unwrap().remove(0)
    }
}

fn response(status: ConnectStatus) -> ConnectResponse {
    ConnectResponse {
        status,
        meta: ResponseMeta {
            url: "https://example.com/in/someone/".into(),
            body_excerpt: "ok".into(),
        },
    }
}

#[test]
fn test_render_note_replaces_first_name() {
    let c = candidate("ann-b", "ann blake");
    assert_eq!(
        ConnectionDispatcher::render_note(Some("Hi {name}, let's connect"), &c).as_deref(),
        Some("Hi Ann, let's connect")
    );
    assert!(ConnectionDispatcher::render_note(None, &c).is_none());
}

#[tokio::test]
async fn test_sent_with_note_is_recorded() {
    let dir = tempdir().unwrap();
    let store = FileStore::new(dir.path());
    let client = ConnectClient::new(vec![Ok(response(ConnectStatus::Sent))]);
    let dispatcher = ConnectionDispatcher::new(&client, &store);
    let campaign = campaign_with_note(Some("Hi {name}!"));

    let report = dispatcher
        .dispatch(&campaign, &candidate("ann", "Ann Blake"))
        .await
        .unwrap();
    assert_eq!(report.outcome, AttemptOutcome::Sent);
    assert!(report.note_sent);
    assert!(report.blocked_marker.is_none());

    let attempts = store.load_attempts(&campaign.id).unwrap();
    assert_eq!(attempts.len(), 1);
    assert_eq!(attempts[0].outcome, AttemptOutcome::Sent);
    assert!(attempts[0].note_sent);

    let notes = client.notes.lock().unwrap();
    assert_eq!(notes[0].as_deref(), Some("Hi Ann!"));
}

#[tokio::test]
async fn test_already_connected_is_recorded() {
    let dir = tempdir().unwrap();
    let store = FileStore::new(dir.path());
    let client = ConnectClient::new(vec![Ok(response(ConnectStatus::AlreadyConnected))]);
    let dispatcher = ConnectionDispatcher::new(&client, &store);
    let campaign = campaign_with_note(None);

    let report = dispatcher
        .dispatch(&campaign, &candidate("ann", "Ann"))
        .await
        .unwrap();
    assert_eq!(report.outcome, AttemptOutcome::AlreadyConnected);
    assert!(!report.note_sent);
}

#[tokio::test]
async fn test_refusal_and_transport_error_record_failed() {
    let dir = tempdir().unwrap();
    let store = FileStore::new(dir.path());
    let client = ConnectClient::new(vec![
        Ok(response(ConnectStatus::Unreachable("closed invites".into()))),
        Err(PlatformError::Timeout),
    ]);
    let dispatcher = ConnectionDispatcher::new(&client, &store);
    let campaign = campaign_with_note(None);

    for id in ["ann", "bob"] {
        let report = dispatcher
            .dispatch(&campaign, &candidate(id, id))
            .await
            .unwrap();
        assert_eq!(report.outcome, AttemptOutcome::Failed);
    }
    let attempts = store.load_attempts(&campaign.id).unwrap();
    assert_eq!(attempts.len(), 2);
}

#[tokio::test]
async fn test_blocked_response_recorded_before_halt() {
    let dir = tempdir().unwrap();
    let store = FileStore::new(dir.path());
    let mut resp = response(ConnectStatus::Sent);
    resp.meta.url = "https://example.com/checkpoint/challenge".into();
    let client = ConnectClient::new(vec![Ok(resp)]);
    let dispatcher = ConnectionDispatcher::new(&client, &store);
    let campaign = campaign_with_note(None);

    let report = dispatcher
        .dispatch(&campaign, &candidate("ann", "Ann"))
        .await
        .unwrap();
    assert_eq!(report.outcome, AttemptOutcome::Blocked);
    assert_eq!(report.blocked_marker.as_deref(), Some("/checkpoint/challenge"));

    // The blocked attempt is on disk before the report reaches the
    // caller.
    let attempts = store.load_attempts(&campaign.id).unwrap();
    assert_eq!(attempts.len(), 1);
    assert_eq!(attempts[0].outcome, AttemptOutcome::Blocked);
}

#[test]
fn test_record_skip_persists_without_platform_action() {
    let dir = tempdir().unwrap();
    let store = FileStore::new(dir.path());
    // No queued responses: any connect call panics.
    let client = ConnectClient::new(vec![]);
    let dispatcher = ConnectionDispatcher::new(&client, &store);
    let campaign = campaign_with_note(None);

    dispatcher
        .record_skip(&campaign, &candidate("ann", "Ann"))
        .unwrap();

    let attempts = store.load_attempts(&campaign.id).unwrap();
    assert_eq!(attempts.len(), 1);
    assert_eq!(attempts[0].outcome, AttemptOutcome::Skipped);
    assert!(!attempts[0].note_sent);
    assert!(client.notes.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_soft_warning_surfaced_with_outcome() {
    let dir = tempdir().unwrap();
    let store = FileStore::new(dir.path());
    let mut resp = response(ConnectStatus::Sent);
    resp.meta.body_excerpt = "You're close to the weekly invitation limit".into();
    let client = ConnectClient::new(vec![Ok(resp)]);
    let dispatcher = ConnectionDispatcher::new(&client, &store);
    let campaign = campaign_with_note(None);

    let report = dispatcher
        .dispatch(&campaign, &candidate("ann", "Ann"))
        .await
        .unwrap();
    assert_eq!(report.outcome, AttemptOutcome::Sent);
    assert!(report.soft_warning.is_some());
    assert!(report.blocked_marker.is_none());
}
