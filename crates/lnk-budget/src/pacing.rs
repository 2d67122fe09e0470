//! Delay arithmetic for human-like pacing between actions.

use chrono::{DateTime, Duration as ChronoDuration, Utc};
use rand::Rng;
use std::time::Duration;

/// Earliest instant the next action may fire given the base delay plus
/// a jitter draw. With no prior action the caller is eligible now.
pub fn eligible_at(
    last_action_at: Option<DateTime<Utc>>,
    min_delay: Duration,
    jitter: Duration,
) -> Option<DateTime<Utc>> {
    let last = last_action_at?;
    let gap = min_delay + jitter;
    let gap = ChronoDuration::from_std(gap).unwrap_or_else(|_| ChronoDuration::hours(24));
    Some(last + gap)
}

/// Uniform jitter draw in `[0, range]` inclusive of zero.
pub fn draw_jitter<R: Rng>(rng: &mut R, range: Duration) -> Duration {
    let max = range.as_millis() as u64;
    if max == 0 {
        return Duration::ZERO;
    }
    Duration::from_millis(rng.gen_range(0..=max))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn test_no_prior_action_is_eligible_now() {
        assert!(eligible_at(None, Duration::from_secs(30), Duration::ZERO).is_none());
    }

    #[test]
    fn test_eligible_at_adds_delay_and_jitter() {
        let last: DateTime<Utc> = "2025-06-01T10:00:00Z".parse().unwrap();
        let at = eligible_at(
            Some(last),
            Duration::from_secs(30),
            Duration::from_secs(12),
        )
        .unwrap();
        assert_eq!(at, "2025-06-01T10:00:42Z".parse::<DateTime<Utc>>().unwrap());
    }

    #[test]
    fn test_jitter_within_range() {
        let mut rng = StdRng::seed_from_u64(7);
        let range = Duration::from_secs(60);
        for _ in 0..200 {
            let j = draw_jitter(&mut rng, range);
            assert!(j <= range);
        }
    }

    #[test]
    fn test_zero_range_draws_zero() {
        let mut rng = StdRng::seed_from_u64(7);
        assert_eq!(draw_jitter(&mut rng, Duration::ZERO), Duration::ZERO);
    }

    #[test]
    fn test_seeded_draws_are_deterministic() {
        let range = Duration::from_secs(60);
        let a: Vec<_> = {
            let mut rng = StdRng::seed_from_u64(42);
            (0..10).map(|_| draw_jitter(&mut rng, range)).collect()
        };
        let b: Vec<_> = {
            let mut rng = StdRng::seed_from_u64(42);
            (0..10).map(|_| draw_jitter(&mut rng, range)).collect()
        };
        assert_eq!(a, b);
    }
}
