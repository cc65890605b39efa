use std::time::{Duration, Instant};

/// Token bucket rate limiter.
/// Allows burst traffic up to capacity, then enforces a steady rate.
#[derive(Debug)]
pub struct TokenBucket {
    capacity: f64,
    tokens: f64,
    refill_rate: f64, // tokens per second
    last_refill: Instant,
}

impl TokenBucket {
    /// Create a new token bucket, initially full.
    ///
    /// # Arguments
    /// * `capacity` - Maximum number of tokens (burst size)
    /// * `refill_rate` - Tokens added per second (sustained rate)
    pub fn new(capacity: f64, refill_rate: f64) -> Self {
        Self::new_at(capacity, refill_rate, Instant::now())
    }

    pub fn new_at(capacity: f64, refill_rate: f64, now: Instant) -> Self {
        let capacity = capacity.max(1.0);
        Self { capacity, tokens: capacity, refill_rate, last_refill: now }
    }

    /// Bucket for a run: `None` when `rate` is zero, meaning unlimited.
    pub fn for_rate(rate: f64, burst: usize) -> Option<Self> {
        if rate > 0.0 {
            Some(Self::new(burst as f64, rate))
        } else {
            None
        }
    }

    fn refill_at(&mut self, now: Instant) {
        let elapsed = now.saturating_duration_since(self.last_refill).as_secs_f64();
        self.tokens = (self.tokens + elapsed * self.refill_rate).min(self.capacity);
        self.last_refill = now;
    }

    /// Try to consume a token. Returns true if allowed, false if rate limited
    pub fn try_consume(&mut self) -> bool {
        self.try_consume_at(Instant::now())
    }

    pub fn try_consume_at(&mut self, now: Instant) -> bool {
        self.refill_at(now);
        if self.tokens >= 1.0 {
            self.tokens -= 1.0;
            true
        } else {
            false
        }
    }

    /// Time until the next token is available; zero when one is banked.
    pub fn wait_time_at(&mut self, now: Instant) -> Duration {
        self.refill_at(now);
        if self.tokens >= 1.0 || self.refill_rate <= 0.0 {
            return Duration::ZERO;
        }
        Duration::from_secs_f64((1.0 - self.tokens) / self.refill_rate)
    }
}
