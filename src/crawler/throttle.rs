//! Request pacing for the fetcher
//!
//! Two independent limits, both optional:
//! - a minimum delay between the starts of consecutive requests
//! - a budget of requests per sliding time window
//!
//! Callers wait in `acquire` until both limits allow another request. The
//! lock is held while waiting, so waiters are released one at a time in
//! arrival order.

use crate::config::CrawlerConfig;
use std::collections::VecDeque;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::{sleep_until, Instant};
use tracing::trace;

/// Shared request pacer
#[derive(Debug, Default)]
pub struct Throttle {
    delay: Duration,
    budget: Option<(usize, Duration)>,
    state: Mutex<ThrottleState>,
}

#[derive(Debug, Default)]
struct ThrottleState {
    last_request: Option<Instant>,
    /// Start times inside the current window, oldest first
    recent: VecDeque<Instant>,
}

impl Throttle {
    /// A throttle that never waits
    pub fn unlimited() -> Self {
        Self::default()
    }

    pub fn new(delay: Duration, budget: Option<(usize, Duration)>) -> Self {
        Self {
            delay,
            budget: budget.filter(|(max, window)| *max > 0 && !window.is_zero()),
            state: Mutex::new(ThrottleState::default()),
        }
    }

    pub fn from_config(config: &CrawlerConfig) -> Self {
        Self::new(
            Duration::from_millis(config.delay_ms),
            config
                .max_requests_per_window
                .map(|max| (max, Duration::from_secs(config.window_secs))),
        )
    }

    pub fn is_unlimited(&self) -> bool {
        self.delay.is_zero() && self.budget.is_none()
    }

    /// Waits until another request may start, then records it
    pub async fn acquire(&self) {
        if self.is_unlimited() {
            return;
        }

        let mut state = self.state.lock().await;

        if let Some((max, window)) = self.budget {
            prune(&mut state.recent, Instant::now(), window);
            if state.recent.len() >= max {
                if let Some(&oldest) = state.recent.front() {
                    let until = oldest + window;
                    let wait = until.saturating_duration_since(Instant::now());
                    trace!(wait_ms = wait.as_millis() as u64, "Request budget exhausted");
                    sleep_until(until).await;
                    prune(&mut state.recent, Instant::now(), window);
                }
            }
        }

        if let Some(last) = state.last_request {
            let until = last + self.delay;
            if until > Instant::now() {
                sleep_until(until).await;
            }
        }

        let now = Instant::now();
        state.last_request = Some(now);
        if self.budget.is_some() {
            state.recent.push_back(now);
        }
    }
}

fn prune(recent: &mut VecDeque<Instant>, now: Instant, window: Duration) {
    while recent
        .front()
        .is_some_and(|&start| now.saturating_duration_since(start) >= window)
    {
        recent.pop_front();
    }
}
