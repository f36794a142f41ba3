use std::time::{Duration, Instant};

use dashmap::{mapref::entry::Entry, DashMap};

use super::TenantKey;

pub const DEFAULT_MIN_INTERVAL: Duration = Duration::from_millis(150);

/// Map size above which watermarks older than the interval are dropped.
const PRUNE_ABOVE: usize = 4096;

/// Per-tenant throttle: a call is accepted only if the previous accepted call
/// for the same key is at least `min_interval` old.
///
/// Process-local and best-effort; concurrent calls for one key may both pass.
/// A watermark older than `min_interval` can no longer reject anything, so
/// those are pruned once the map grows past [`PRUNE_ABOVE`] keys.
pub struct RateLimiter {
    min_interval: Duration,
    last_accepted: DashMap<TenantKey, Instant>,
    prune_above: usize,
}

impl RateLimiter {
    pub fn new(min_interval: Duration) -> Self {
        Self {
            min_interval,
            last_accepted: DashMap::new(),
            prune_above: PRUNE_ABOVE,
        }
    }

    pub fn check(&self, key: &TenantKey) -> bool {
        self.check_at(key, Instant::now())
    }

    /// Records `now` as the new watermark when the call is accepted.
    pub fn check_at(&self, key: &TenantKey, now: Instant) -> bool {
        match self.last_accepted.entry(key.clone()) {
            Entry::Occupied(mut prev) => {
                if now.saturating_duration_since(*prev.get()) < self.min_interval {
                    return false;
                }
                prev.insert(now);
            }
            Entry::Vacant(slot) => {
                slot.insert(now);
            }
        }
        // entry guard is released here; retain locks every shard
        if self.last_accepted.len() > self.prune_above {
            self.prune(now);
        }
        true
    }

    fn prune(&self, now: Instant) {
        let min_interval = self.min_interval;
        self.last_accepted
            .retain(|_, seen| now.saturating_duration_since(*seen) < min_interval);
    }
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new(DEFAULT_MIN_INTERVAL)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(s: &str) -> TenantKey {
        TenantKey::parse(s).unwrap()
    }

    #[test]
    fn second_call_inside_interval_is_rejected() {
        let limiter = RateLimiter::default();
        let k = key("tenant-aaaaaaaaaaaa");
        let t0 = Instant::now();
        assert!(limiter.check_at(&k, t0));
        assert!(!limiter.check_at(&k, t0 + Duration::from_millis(149)));
    }

    #[test]
    fn call_at_interval_is_accepted() {
        let limiter = RateLimiter::default();
        let k = key("tenant-aaaaaaaaaaaa");
        let t0 = Instant::now();
        assert!(limiter.check_at(&k, t0));
        assert!(limiter.check_at(&k, t0 + Duration::from_millis(150)));
        assert!(limiter.check_at(&k, t0 + Duration::from_millis(400)));
    }

    #[test]
    fn rejected_calls_do_not_move_the_watermark() {
        let limiter = RateLimiter::default();
        let k = key("tenant-aaaaaaaaaaaa");
        let t0 = Instant::now();
        assert!(limiter.check_at(&k, t0));
        assert!(!limiter.check_at(&k, t0 + Duration::from_millis(100)));
        assert!(limiter.check_at(&k, t0 + Duration::from_millis(160)));
    }

    #[test]
    fn tenants_are_throttled_independently() {
        let limiter = RateLimiter::default();
        let t0 = Instant::now();
        assert!(limiter.check_at(&key("tenant-aaaaaaaaaaaa"), t0));
        assert!(limiter.check_at(&key("tenant-bbbbbbbbbbbb"), t0));
    }

    #[test]
    fn stale_watermarks_are_evicted_past_the_threshold() {
        let mut limiter = RateLimiter::default();
        limiter.prune_above = 2;
        let t0 = Instant::now();
        assert!(limiter.check_at(&key("tenant-aaaaaaaaaaaa"), t0));
        assert!(limiter.check_at(&key("tenant-bbbbbbbbbbbb"), t0));
        assert_eq!(limiter.last_accepted.len(), 2);

        let later = t0 + Duration::from_secs(1);
        let fresh = key("tenant-cccccccccccc");
        assert!(limiter.check_at(&fresh, later));
        assert_eq!(limiter.last_accepted.len(), 1);
        assert!(limiter.last_accepted.contains_key(&fresh));

        // a recent watermark survives and still throttles
        assert!(limiter.check_at(&key("tenant-dddddddddddd"), later));
        assert!(limiter.check_at(&key("tenant-eeeeeeeeeeee"), later));
        assert!(!limiter.check_at(&fresh, later + Duration::from_millis(10)));
    }

    #[test]
    fn zero_interval_never_throttles() {
        let limiter = RateLimiter::new(Duration::ZERO);
        let k = key("tenant-aaaaaaaaaaaa");
        let t0 = Instant::now();
        assert!(limiter.check_at(&k, t0));
        assert!(limiter.check_at(&k, t0));
    }
}
