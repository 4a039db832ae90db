use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::debug;

/// Leaky-bucket gate shared by every request going through one source.
///
/// Each call to [`RateLimiter::acquire`] reserves the next free slot and
/// sleeps until it opens, so concurrent callers are spaced `interval` apart
/// no matter how many tasks share the limiter.
#[derive(Debug)]
pub struct RateLimiter {
    interval: Duration,
    next_slot: Mutex<Option<Instant>>,
}

impl RateLimiter {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            next_slot: Mutex::new(None),
        }
    }

    /// `0` disables the gate.
    pub fn per_minute(requests_per_minute: u32) -> Self {
        if requests_per_minute == 0 {
            return Self::unlimited();
        }
        Self::new(Duration::from_secs(60) / requests_per_minute)
    }

    pub fn unlimited() -> Self {
        Self::new(Duration::ZERO)
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub async fn acquire(&self) {
        if self.interval.is_zero() {
            return;
        }

        let slot = {
            let mut next_slot = self.next_slot.lock().await;
            let now = Instant::now();
            let slot = match *next_slot {
                Some(next) if next > now => next,
                _ => now,
            };
            *next_slot = Some(slot + self.interval);
            slot
        };

        let now = Instant::now();
        if slot > now {
            debug!("Rate limited, waiting {:?}", slot - now);
            tokio::time::sleep_until(slot).await;
        }
    }
}
