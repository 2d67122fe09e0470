use super::*;
use tempfile::tempdir;

fn settings() -> AutomationSettings {
    let mut s = AutomationSettings::default();
    s.daily_limit = 3;
    s.min_delay_secs = 30;
    s.jitter_secs = 0;
    s
}

fn scheduler_in(dir: &std::path::Path, settings: &AutomationSettings) -> Scheduler {
    let store = BudgetStore::new(dir);
    let budget = RateBudget::new("alice", Utc::now(), settings.utc_offset_minutes);
    Scheduler::with_rng(store, budget, settings, StdRng::seed_from_u64(1))
}

#[tokio::test(start_paused = true)]
async fn test_first_acquire_is_immediate() {
    let dir = tempdir().unwrap();
    let mut sched = scheduler_in(dir.path(), &settings());
    let cancel = CancellationToken::new();

    let start = tokio::time::Instant::now();
    sched.acquire(&cancel).await.unwrap();
    assert_eq!(start.elapsed(), Duration::ZERO);
}

#[tokio::test(start_paused = true)]
async fn test_acquire_waits_min_delay_after_commit() {
    let dir = tempdir().unwrap();
    let mut sched = scheduler_in(dir.path(), &settings());
    let cancel = CancellationToken::new();

    sched.acquire(&cancel).await.unwrap();
    sched.commit().unwrap();

    // The wait is derived from wall-clock stamps, so allow a little
    // slack below the nominal delay.
    let start = tokio::time::Instant::now();
    sched.acquire(&cancel).await.unwrap();
    assert!(start.elapsed() >= Duration::from_secs(29));
}

#[tokio::test(start_paused = true)]
async fn test_limit_exceeded_after_ceiling() {
    let dir = tempdir().unwrap();
    let mut sched = scheduler_in(dir.path(), &settings());
    let cancel = CancellationToken::new();

    for _ in 0..3 {
        sched.acquire(&cancel).await.unwrap();
        sched.commit().unwrap();
    }
    match sched.acquire(&cancel).await {
        Err(AppError::DailyLimitExceeded { limit, resets_at }) => {
            assert_eq!(limit, 3);
            assert!(resets_at > Utc::now());
        }
        other => panic!("expected limit error, got {other:?}"),
    }
    assert_eq!(sched.remaining(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_ceiling_survives_restart() {
    let dir = tempdir().unwrap();
    let cfg = settings();
    let cancel = CancellationToken::new();

    let mut sched = scheduler_in(dir.path(), &cfg);
    for _ in 0..3 {
        sched.acquire(&cancel).await.unwrap();
        sched.commit().unwrap();
    }
    drop(sched);

    // A fresh scheduler over the same store sees the spent budget.
    let store = BudgetStore::new(dir.path());
    let budget = store
        .load_or_new("alice", Utc::now(), cfg.utc_offset_minutes)
        .unwrap();
    let mut sched = Scheduler::with_rng(store, budget, &cfg, StdRng::seed_from_u64(2));
    assert!(matches!(
        sched.acquire(&cancel).await,
        Err(AppError::DailyLimitExceeded { .. })
    ));
}

#[tokio::test(start_paused = true)]
async fn test_window_rollover_restores_budget() {
    let dir = tempdir().unwrap();
    let cfg = settings();
    let store = BudgetStore::new(dir.path());
    let mut budget = RateBudget::new("alice", Utc::now(), 0);
    budget.count_today = 3;
    // Boundary already in the past: the next acquire must roll first.
    budget.window_reset_at = Utc::now() - chrono::Duration::hours(1);
    let mut sched = Scheduler::with_rng(store, budget, &cfg, StdRng::seed_from_u64(3));
    let cancel = CancellationToken::new();

    sched.acquire(&cancel).await.unwrap();
    assert_eq!(sched.remaining(), 3);
}

#[tokio::test(start_paused = true)]
async fn test_cancelled_before_acquire() {
    let dir = tempdir().unwrap();
    let mut sched = scheduler_in(dir.path(), &settings());
    let cancel = CancellationToken::new();
    cancel.cancel();

    assert!(matches!(
        sched.acquire(&cancel).await,
        Err(AppError::Cancelled)
    ));
}

#[tokio::test(start_paused = true)]
async fn test_cancelled_during_pacing_wait() {
    let dir = tempdir().unwrap();
    let mut sched = scheduler_in(dir.path(), &settings());
    let cancel = CancellationToken::new();

    sched.acquire(&cancel).await.unwrap();
    sched.commit().unwrap();

    let canceller = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_secs(1)).await;
        canceller.cancel();
    });

    let start = tokio::time::Instant::now();
    let result = sched.acquire(&cancel).await;
    assert!(matches!(result, Err(AppError::Cancelled)));
    assert!(start.elapsed() < Duration::from_secs(30));
}

#[tokio::test(start_paused = true)]
async fn test_caution_stretches_delay() {
    let dir = tempdir().unwrap();
    let mut cfg = settings();
    cfg.caution_factor = 2;
    cfg.caution_policy = CautionPolicy::RestOfRun;
    let mut sched = scheduler_in(dir.path(), &cfg);
    let cancel = CancellationToken::new();

    sched.acquire(&cancel).await.unwrap();
    sched.commit().unwrap();
    sched.raise_caution();

    let start = tokio::time::Instant::now();
    sched.acquire(&cancel).await.unwrap();
    assert!(start.elapsed() >= Duration::from_secs(59));
    sched.commit().unwrap();

    // Rest-of-run keeps the stretch for subsequent draws.
    let start = tokio::time::Instant::now();
    sched.acquire(&cancel).await.unwrap();
    assert!(start.elapsed() >= Duration::from_secs(59));
}

#[tokio::test(start_paused = true)]
async fn test_next_action_caution_spent_after_one_draw() {
    let dir = tempdir().unwrap();
    let mut cfg = settings();
    cfg.caution_factor = 4;
    cfg.caution_policy = CautionPolicy::NextAction;
    let mut sched = scheduler_in(dir.path(), &cfg);
    let cancel = CancellationToken::new();

    sched.acquire(&cancel).await.unwrap();
    sched.commit().unwrap();
    sched.raise_caution();

    let start = tokio::time::Instant::now();
    sched.acquire(&cancel).await.unwrap();
    assert!(start.elapsed() >= Duration::from_secs(119));
    sched.commit().unwrap();

    // Back to the base delay once the stretch is spent.
    let start = tokio::time::Instant::now();
    sched.acquire(&cancel).await.unwrap();
    let elapsed = start.elapsed();
    assert!(elapsed >= Duration::from_secs(29));
    assert!(elapsed < Duration::from_secs(119));
}
