use dashmap::DashMap;
use std::net::IpAddr;
use std::time::{Duration, Instant};
use tracing::debug;

#[derive(Debug, Clone)]
struct Bucket {
    tokens: u32,
    last_refill: Instant,
}

/// Token bucket per client address.
#[derive(Debug)]
pub struct RateLimiter {
    buckets: DashMap<IpAddr, Bucket>,
    max_tokens: u32,
    refill_rate: Duration,
}

impl RateLimiter {
    /// Allow `per_minute` requests per address, refilled evenly over a minute.
    pub fn per_minute(per_minute: u32) -> Self {
        let per_minute = per_minute.max(1);
        Self::new_with_limits(per_minute, Duration::from_secs(60) / per_minute)
    }

    pub fn new_with_limits(max_tokens: u32, refill_rate: Duration) -> Self {
        Self {
            buckets: DashMap::new(),
            max_tokens: max_tokens.max(1),
            refill_rate: refill_rate.max(Duration::from_millis(1)),
        }
    }

    pub fn check_rate_limit(&self, addr: IpAddr) -> bool {
        self.check_rate_limit_at(addr, Instant::now())
    }

    pub fn check_rate_limit_at(&self, addr: IpAddr, now: Instant) -> bool {
        let mut bucket = self.buckets.entry(addr).or_insert_with(|| Bucket {
            tokens: self.max_tokens,
            last_refill: now,
        });

        self.refill_tokens(&mut bucket, now);

        if bucket.tokens > 0 {
            bucket.tokens -= 1;
            true
        } else {
            false
        }
    }

    fn refill_tokens(&self, bucket: &mut Bucket, now: Instant) {
        let time_passed = now.saturating_duration_since(bucket.last_refill);
        let tokens_to_add = time_passed.as_nanos() / self.refill_rate.as_nanos();

        if tokens_to_add > 0 {
            let tokens_to_add = u32::try_from(tokens_to_add).unwrap_or(u32::MAX);
            bucket.tokens = bucket.tokens.saturating_add(tokens_to_add).min(self.max_tokens);
            if bucket.tokens == self.max_tokens {
                bucket.last_refill = now;
            } else {
                // Keep the fractional remainder for the next refill
                bucket.last_refill += self.refill_rate * tokens_to_add;
            }
        }
    }

    pub fn remaining_tokens(&self, addr: IpAddr) -> u32 {
        match self.buckets.get_mut(&addr) {
            Some(mut bucket) => {
                self.refill_tokens(&mut bucket, Instant::now());
                bucket.tokens
            }
            None => self.max_tokens,
        }
    }

    pub fn tracked_clients(&self) -> usize {
        self.buckets.len()
    }

    /// Drop buckets that have refilled completely. A full bucket behaves
    /// exactly like a missing one, so this never changes a decision.
    pub fn prune_idle(&self) -> usize {
        self.prune_idle_at(Instant::now())
    }

    pub fn prune_idle_at(&self, now: Instant) -> usize {
        let before = self.buckets.len();
        self.buckets.retain(|_, bucket| {
            let idle = now.saturating_duration_since(bucket.last_refill);
            let missing = self.max_tokens.saturating_sub(bucket.tokens);
            match self.refill_rate.checked_mul(missing) {
                Some(refill_time) => idle < refill_time,
                None => true,
            }
        });
        let removed = before.saturating_sub(self.buckets.len());
        if removed > 0 {
            debug!("Pruned {} idle rate limit buckets", removed);
        }
        removed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::Ipv4Addr;

    const ALICE: IpAddr = IpAddr::V4(Ipv4Addr::new(10, 0, 0, 1));
    const BOB: IpAddr = IpAddr::V4(Ipv4Addr::new(10, 0, 0, 2));

    #[test]
    fn test_bucket_drains() {
        let limiter = RateLimiter::new_with_limits(3, Duration::from_secs(10));
        let now = Instant::now();

        assert!(limiter.check_rate_limit_at(ALICE, now));
        assert!(limiter.check_rate_limit_at(ALICE, now));
        assert!(limiter.check_rate_limit_at(ALICE, now));
        assert!(!limiter.check_rate_limit_at(ALICE, now));
    }

    #[test]
    fn test_clients_are_independent() {
        let limiter = RateLimiter::new_with_limits(1, Duration::from_secs(10));
        let now = Instant::now();

        assert!(limiter.check_rate_limit_at(ALICE, now));
        assert!(!limiter.check_rate_limit_at(ALICE, now));
        assert!(limiter.check_rate_limit_at(BOB, now));
        assert_eq!(limiter.tracked_clients(), 2);
    }

    #[test]
    fn test_refill() {
        let limiter = RateLimiter::new_with_limits(2, Duration::from_secs(1));
        let now = Instant::now();

        assert!(limiter.check_rate_limit_at(ALICE, now));
        assert!(limiter.check_rate_limit_at(ALICE, now));
        assert!(!limiter.check_rate_limit_at(ALICE, now));

        let later = now + Duration::from_millis(1500);
        assert!(limiter.check_rate_limit_at(ALICE, later));
        assert!(!limiter.check_rate_limit_at(ALICE, later));

        // Refill never exceeds the bucket size
        let much_later = now + Duration::from_secs(60);
        assert!(limiter.check_rate_limit_at(ALICE, much_later));
        assert!(limiter.check_rate_limit_at(ALICE, much_later));
        assert!(!limiter.check_rate_limit_at(ALICE, much_later));
    }

    #[test]
    fn test_prune_idle_buckets() {
        let limiter = RateLimiter::new_with_limits(2, Duration::from_secs(1));
        let now = Instant::now();

        assert!(limiter.check_rate_limit_at(ALICE, now));
        assert!(limiter.check_rate_limit_at(ALICE, now));
        assert!(limiter.check_rate_limit_at(BOB, now));
        assert_eq!(limiter.tracked_clients(), 2);

        // Nothing has refilled yet
        assert_eq!(limiter.prune_idle_at(now), 0);
        assert_eq!(limiter.tracked_clients(), 2);

        // BOB only needed one token back, ALICE still needs two
        let later = now + Duration::from_millis(1500);
        assert_eq!(limiter.prune_idle_at(later), 1);
        assert_eq!(limiter.tracked_clients(), 1);
        assert_eq!(limiter.remaining_tokens(BOB), 2);

        assert_eq!(limiter.prune_idle_at(now + Duration::from_secs(2)), 1);
        assert_eq!(limiter.tracked_clients(), 0);

        // A pruned client starts over with a full bucket
        assert!(limiter.check_rate_limit_at(ALICE, now + Duration::from_secs(2)));
        assert_eq!(limiter.tracked_clients(), 1);
    }

    #[test]
    fn test_per_minute() {
        let limiter = RateLimiter::per_minute(60);
        assert_eq!(limiter.remaining_tokens(ALICE), 60);
        assert!(limiter.check_rate_limit(ALICE));
        assert_eq!(limiter.remaining_tokens(ALICE), 59);
    }
}
