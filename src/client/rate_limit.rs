use log::debug;
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;
use tokio::time::{sleep, Instant};

/// `requests` calls per `window`, with a burst of at most `requests`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Quota {
    pub requests: u32,
    pub window: Duration,
}

impl Quota {
    pub fn new(requests: u32, window: Duration) -> Self {
        Self {
            requests: requests.max(1),
            window,
        }
    }

    fn capacity(&self) -> f64 {
        self.requests as f64
    }

    fn refill_per_sec(&self) -> f64 {
        let secs = self.window.as_secs_f64();
        if secs <= 0.0 {
            f64::INFINITY
        } else {
            self.requests as f64 / secs
        }
    }
}

struct TokenBucket {
    tokens: f64,
    last_update: Instant,
}

impl TokenBucket {
    fn new(capacity: f64) -> Self {
        Self {
            tokens: capacity,
            last_update: Instant::now(),
        }
    }

    /// Take a token, or say how long until one is available.
    fn try_acquire(&mut self, quota: &Quota) -> Option<Duration> {
        let rate = quota.refill_per_sec();
        if rate.is_infinite() {
            return None;
        }

        let now = Instant::now();
        let elapsed = now.duration_since(self.last_update).as_secs_f64();

        self.tokens = (self.tokens + elapsed * rate).min(quota.capacity());
        self.last_update = now;

        if self.tokens >= 1.0 {
            self.tokens -= 1.0;
            None
        } else {
            Some(Duration::from_secs_f64((1.0 - self.tokens) / rate))
        }
    }
}

/// Token-bucket limiter keyed per external endpoint.
pub struct RateLimiter {
    default_quota: Quota,
    quotas: HashMap<String, Quota>,
    buckets: Mutex<HashMap<String, TokenBucket>>,
}

impl RateLimiter {
    pub fn new(default_quota: Quota) -> Self {
        Self {
            default_quota,
            quotas: HashMap::new(),
            buckets: Mutex::new(HashMap::new()),
        }
    }

    /// No limit at all.
    pub fn unlimited() -> Self {
        Self::new(Quota::new(u32::MAX, Duration::ZERO))
    }

    pub fn with_quota(mut self, key: impl Into<String>, quota: Quota) -> Self {
        self.quotas.insert(key.into(), quota);
        self
    }

    fn quota_for(&self, key: &str) -> Quota {
        self.quotas.get(key).copied().unwrap_or(self.default_quota)
    }

    /// Wait until a request against `key` is allowed.
    pub async fn acquire(&self, key: &str) {
        let quota = self.quota_for(key);

        loop {
            let wait = {
                let mut buckets = self.buckets.lock().unwrap_or_else(|e| e.into_inner());
                buckets
                    .entry(key.to_string())
                    .or_insert_with(|| TokenBucket::new(quota.capacity()))
                    .try_acquire(&quota)
            };

            match wait {
                None => return,
                Some(delay) => {
                    debug!("⏱️  Rate limit on {} — waiting {:?}", key, delay);
                    sleep(delay).await;
                }
            }
        }
    }
}
