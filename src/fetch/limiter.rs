use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, OwnedSemaphorePermit, Semaphore};
use tokio::time::Instant;

/// Process-wide politeness gate
///
/// Enforces two things for every outbound request:
/// - a concurrency ceiling (semaphore permits), and
/// - a minimum delay between the start of successive requests, measured
///   globally across all stages, not per host.
///
/// Cheap to clone; clones share the same budget.
#[derive(Clone)]
pub struct RateLimiter {
    semaphore: Arc<Semaphore>,
    last_start: Arc<Mutex<Option<Instant>>>,
    min_delay: Duration,
}

/// Permission to issue one request; holds a concurrency permit until drop
pub struct RequestSlot {
    _permit: Option<OwnedSemaphorePermit>,
}

impl RateLimiter {
    /// Creates a limiter with the given concurrency cap and inter-request
    /// delay
    pub fn new(concurrency_limit: u32, min_delay: Duration) -> Self {
        Self {
            semaphore: Arc::new(Semaphore::new(concurrency_limit as usize)),
            last_start: Arc::new(Mutex::new(None)),
            min_delay,
        }
    }

    /// Waits until a request may start, then returns its slot
    ///
    /// The delay lock is held across the sleep so concurrent acquirers
    /// space their starts out one after another instead of stampeding when
    /// the interval elapses.
    pub async fn acquire(&self) -> RequestSlot {
        // The semaphore is never closed; a slot without a permit can only
        // happen if that changes, and the delay gate below still applies.
        let permit = self.semaphore.clone().acquire_owned().await.ok();
        if permit.is_none() {
            tracing::error!("rate limiter semaphore closed, skipping concurrency cap");
        }

        let mut last = self.last_start.lock().await;
        if let Some(previous) = *last {
            let next_allowed = previous + self.min_delay;
            let now = Instant::now();
            if next_allowed > now {
                tokio::time::sleep_until(next_allowed).await;
            }
        }
        *last = Some(Instant::now());
        drop(last);

        RequestSlot { _permit: permit }
    }
}
