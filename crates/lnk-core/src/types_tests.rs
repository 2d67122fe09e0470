use super::*;

fn candidate(name: &str, slug: &str) -> Candidate {
    Candidate {
        profile_id: slug.to_string(),
        profile_url: format!("https://platform.example/in/{slug}"),
        name: name.to_string(),
        headline: None,
        location: None,
        company: None,
    }
}

#[test]
fn test_status_happy_path() {
    let mut status = CampaignStatus::Draft;
    status = status.transition(StatusEvent::Start).unwrap();
    assert_eq!(status, CampaignStatus::Active);
    status = status.transition(StatusEvent::Exhaust).unwrap();
    assert_eq!(status, CampaignStatus::Completed);
}

#[test]
fn test_status_pause_and_resume() {
    let active = CampaignStatus::Active;
    let paused = active.transition(StatusEvent::LimitReached).unwrap();
    assert_eq!(paused, CampaignStatus::Paused);
    assert_eq!(
        paused.transition(StatusEvent::Resume).unwrap(),
        CampaignStatus::Active
    );
    assert_eq!(
        paused.transition(StatusEvent::Exhaust).unwrap(),
        CampaignStatus::Completed
    );
}

#[test]
fn test_no_reentry_into_draft() {
    // No event leads anywhere back to Draft.
    for status in [
        CampaignStatus::Active,
        CampaignStatus::Paused,
        CampaignStatus::Completed,
        CampaignStatus::Failed,
    ] {
        for event in [
            StatusEvent::Start,
            StatusEvent::Resume,
            StatusEvent::Exhaust,
            StatusEvent::LimitReached,
            StatusEvent::BlockDetected,
            StatusEvent::Cancel,
            StatusEvent::Fail,
        ] {
            if let Ok(next) = status.transition(event) {
                assert_ne!(next, CampaignStatus::Draft);
            }
        }
    }
}

#[test]
fn test_terminal_states_reject_all_events() {
    for status in [CampaignStatus::Completed, CampaignStatus::Failed] {
        for event in [
            StatusEvent::Start,
            StatusEvent::Resume,
            StatusEvent::Exhaust,
            StatusEvent::Fail,
        ] {
            assert!(status.transition(event).is_err(), "{status} + {event:?}");
        }
    }
}

#[test]
fn test_apply_event_sets_pause_reason() {
    let mut campaign = Campaign::new("c", "alice", TargetingCriteria::default(), 20);
    campaign.apply_event(StatusEvent::Start).unwrap();
    campaign.apply_event(StatusEvent::BlockDetected).unwrap();
    assert_eq!(campaign.status, CampaignStatus::Paused);
    assert_eq!(campaign.pause_reason, Some(PauseReason::Detection));
    assert!(campaign.needs_review());
}

#[test]
fn test_apply_event_clears_pause_reason_on_resume() {
    let mut campaign = Campaign::new("c", "alice", TargetingCriteria::default(), 20);
    campaign.apply_event(StatusEvent::Start).unwrap();
    campaign.apply_event(StatusEvent::LimitReached).unwrap();
    assert!(!campaign.needs_review());
    campaign.apply_event(StatusEvent::Resume).unwrap();
    assert_eq!(campaign.status, CampaignStatus::Active);
    assert_eq!(campaign.pause_reason, None);
}

#[test]
fn test_profile_id_from_url() {
    assert_eq!(
        profile_id_from_url("https://platform.example/in/jane-doe-123?origin=SEARCH"),
        Some("jane-doe-123".to_string())
    );
    assert_eq!(
        profile_id_from_url("https://platform.example/in/jane-doe-123/"),
        Some("jane-doe-123".to_string())
    );
    assert_eq!(profile_id_from_url("https://platform.example/feed"), None);
    assert_eq!(profile_id_from_url("https://platform.example/in/"), None);
}

#[test]
fn test_dedupe_key_is_case_insensitive() {
    let c = candidate("Jane Doe", "Jane-Doe-123");
    assert_eq!(c.dedupe_key(), "jane-doe-123");
}

#[test]
fn test_first_name_title_case() {
    assert_eq!(candidate("jane doe", "x").first_name(), "Jane");
    assert_eq!(candidate("JANE", "x").first_name(), "Jane");
    assert_eq!(candidate("", "x").first_name(), "");
}

#[test]
fn test_network_degree_codes_round_trip() {
    for degree in [
        NetworkDegree::First,
        NetworkDegree::Second,
        NetworkDegree::Third,
    ] {
        assert_eq!(NetworkDegree::from_code(degree.as_code()), Some(degree));
    }
    assert_eq!(NetworkDegree::from_code("X"), None);
}

#[test]
fn test_outcome_terminality() {
    assert!(AttemptOutcome::Sent.is_terminal_for_candidate());
    assert!(AttemptOutcome::AlreadyConnected.is_terminal_for_candidate());
    assert!(AttemptOutcome::Failed.is_terminal_for_candidate());
    assert!(AttemptOutcome::Blocked.is_terminal_for_candidate());
    assert!(!AttemptOutcome::Skipped.is_terminal_for_candidate());
}

#[test]
fn test_attempt_serializes_with_snake_case_outcome() {
    let attempt = ConnectionAttempt::new("01CAMPAIGN", candidate("Jane", "jane"), AttemptOutcome::AlreadyConnected);
    let json = serde_json::to_string(&attempt).unwrap();
    assert!(json.contains("\"already_connected\""), "{json}");
}
