use governor::{
    clock::{Clock, DefaultClock},
    state::keyed::DefaultKeyedStateStore,
    Quota, RateLimiter as GovernorRateLimiter,
};
use std::{num::NonZeroU32, sync::Arc, time::Duration};

type KeyedLimiter = GovernorRateLimiter<String, DefaultKeyedStateStore<String>, DefaultClock>;

/// Prune idle keys once the map grows past this many entries.
const PRUNE_THRESHOLD: usize = 10_000;

/// Per-client-IP limiter for login initiation.
///
/// Every initiation inserts a CSRF state, so this bounds how fast a single
/// client can grow the state store. A limit of zero disables limiting.
#[derive(Clone)]
pub struct LoginRateLimiter {
    limiter: Option<Arc<KeyedLimiter>>,
}

impl LoginRateLimiter {
    pub fn per_minute(max_attempts: u32) -> Self {
        let limiter = NonZeroU32::new(max_attempts)
            .map(|burst| Arc::new(GovernorRateLimiter::keyed(Quota::per_minute(burst))));
        Self { limiter }
    }

    pub fn disabled() -> Self {
        Self { limiter: None }
    }

    /// Returns Ok(()) if the request is allowed, Err(wait) if rate limited.
    pub fn check(&self, client_ip: &str) -> Result<(), Duration> {
        let Some(limiter) = &self.limiter else {
            return Ok(());
        };

        if limiter.len() > PRUNE_THRESHOLD {
            limiter.retain_recent();
        }

        limiter
            .check_key(&client_ip.to_string())
            .map_err(|negative| negative.wait_time_from(DefaultClock::default().now()))
    }
}

impl Default for LoginRateLimiter {
    fn default() -> Self {
        Self::per_minute(30)
    }
}
