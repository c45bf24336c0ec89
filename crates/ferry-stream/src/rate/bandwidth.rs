use std::time::Duration;

use tokio::time::Instant;

/// Token bucket for bandwidth limiting.
///
/// One token is one byte. The bucket starts full and refills continuously at
/// `refill_rate` tokens per second up to `capacity`. It is owned by a single
/// transfer, so none of the methods synchronize.
#[derive(Debug)]
pub struct TokenBucket {
    tokens:      f64,
    capacity:    f64,
    refill_rate: f64,
    last_refill: Instant,
}

impl TokenBucket {
    /// Create a full bucket. Both values are clamped to at least 1.
    pub fn new(capacity: u64, refill_rate: u64) -> Self {
        let capacity = capacity.max(1) as f64;
        Self {
            tokens: capacity,
            capacity,
            refill_rate: refill_rate.max(1) as f64,
            last_refill: Instant::now(),
        }
    }

    pub fn capacity(&self) -> u64 { self.capacity as u64 }

    pub fn refill_rate(&self) -> u64 { self.refill_rate as u64 }

    fn refill(&mut self) {
        let now = Instant::now();
        let elapsed = now.duration_since(self.last_refill).as_secs_f64();
        self.tokens = (self.tokens + elapsed * self.refill_rate).min(self.capacity);
        self.last_refill = now;
    }

    /// Whole tokens currently available.
    pub fn available(&mut self) -> u64 {
        self.refill();
        self.tokens.floor() as u64
    }

    /// Spend `n` tokens. Spending more than available saturates at zero.
    pub fn consume(&mut self, n: u64) {
        self.refill();
        self.tokens = (self.tokens - n as f64).max(0.0);
    }

    /// Spend `n` tokens if they are all available right now.
    pub fn try_acquire(&mut self, n: u64) -> bool {
        if self.available() >= n {
            self.consume(n);
            true
        } else {
            false
        }
    }

    /// Time until at least `n` whole tokens are available.
    ///
    /// `n` is clamped to the capacity, so the wait is always finite.
    pub fn time_until(&mut self, n: u64) -> Duration {
        self.refill();
        let wanted = (n as f64).min(self.capacity);
        let deficit = wanted - self.tokens;
        if deficit <= 0.0 {
            return Duration::ZERO;
        }
        Duration::from_secs_f64(deficit / self.refill_rate)
    }

    /// Wait until `n` tokens (clamped to the capacity) are available, then spend them.
    pub async fn acquire(&mut self, n: u64) {
        let n = n.min(self.capacity());
        loop {
            if self.try_acquire(n) {
                return;
            }
            tokio::time::sleep(self.time_until(n)).await;
        }
    }
}
