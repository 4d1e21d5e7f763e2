//! Rolling-window rate limiter shared by every outbound fetch.
//!
//! The limit is imposed by the remote weather service, so a single
//! `Arc<RateLimiter>` is shared across all concurrent jobs in the process.
//! Callers are never rejected; [`RateLimiter::acquire`] suspends them until a
//! permit frees up in the window.

use std::collections::VecDeque;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::{sleep, Instant};

/// Grants at most `max_calls` permits within any rolling `window`.
///
/// Keeps a timestamp log of recent grants, pruned on every acquisition. The
/// lock is never held across a sleep, so waiting callers do not block each
/// other from re-checking the window.
#[derive(Debug)]
pub struct RateLimiter {
    max_calls: usize,
    window: Duration,
    grants: Mutex<VecDeque<Instant>>,
}

impl RateLimiter {
    pub fn new(max_calls: usize, window: Duration) -> Self {
        Self {
            max_calls: max_calls.max(1),
            window,
            grants: Mutex::new(VecDeque::new()),
        }
    }

    /// Waits until a permit is available, then records the grant.
    ///
    /// With `max_calls` permits taken back-to-back, the next caller sleeps
    /// until the oldest grant ages out of the window.
    pub async fn acquire(&self) {
        loop {
            let wait = {
                let mut grants = self.grants.lock().await;
                let now = Instant::now();
                while let Some(oldest) = grants.front() {
                    if now.duration_since(*oldest) >= self.window {
                        grants.pop_front();
                    } else {
                        break;
                    }
                }
                if grants.len() < self.max_calls {
                    grants.push_back(now);
                    None
                } else if let Some(oldest) = grants.front().copied() {
                    Some(self.window - now.duration_since(oldest))
                } else {
                    grants.push_back(now);
                    None
                }
            };
            match wait {
                None => return,
                Some(delay) => sleep(delay).await,
            }
        }
    }
}
