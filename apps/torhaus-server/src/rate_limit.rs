//! Fixed-window request limiter for the public endpoints.
//!
//! Scope is explicit: one instance lives in the app state, nothing is
//! module-global. Buckets are keyed by caller-chosen strings (the guest
//! email on the reservation endpoint).

use dashmap::DashMap;
use std::time::{Duration, Instant};

struct Bucket {
    count: u32,
    expires_at: Instant,
}

pub struct RateLimiter {
    buckets: DashMap<String, Bucket>,
    window: Duration,
    max: u32,
}

impl RateLimiter {
    pub fn new(window: Duration, max: u32) -> Self {
        Self {
            buckets: DashMap::new(),
            window,
            max,
        }
    }

    /// Returns whether the caller is still within its budget; counting the
    /// attempt is part of the check.
    pub fn check(&self, key: &str) -> bool {
        let now = Instant::now();
        let mut bucket = self.buckets.entry(key.to_string()).or_insert_with(|| Bucket {
            count: 0,
            expires_at: now + self.window,
        });

        if bucket.expires_at < now {
            bucket.count = 0;
            bucket.expires_at = now + self.window;
        }
        if bucket.count >= self.max {
            return false;
        }
        bucket.count += 1;
        true
    }
}
