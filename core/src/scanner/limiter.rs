use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::{Instant, sleep_until};
use tracing::warn;

const WINDOW: Duration = Duration::from_secs(60);

/// Spaces probe starts at least `min_interval` apart and caps them per window.
#[derive(Debug)]
pub struct RateLimiter {
    min_interval: Duration,
    /// Zero disables the cap.
    max_per_window: u32,
    window: Duration,
    state: Mutex<LimiterState>,
}

#[derive(Debug)]
struct LimiterState {
    last: Option<Instant>,
    window_start: Instant,
    count: u32,
}

impl RateLimiter {
    pub fn new(min_interval: Duration, max_per_minute: u32) -> Self {
        Self::with_window(min_interval, max_per_minute, WINDOW)
    }

    pub(crate) fn with_window(min_interval: Duration, max_per_window: u32, window: Duration) -> Self {
        Self {
            min_interval,
            max_per_window,
            window,
            state: Mutex::new(LimiterState {
                last: None,
                window_start: Instant::now(),
                count: 0,
            }),
        }
    }

    /// Waits until another probe may start. Callers are served in order.
    pub async fn acquire(&self) {
        let mut state = self.state.lock().await;

        if let Some(last) = state.last {
            let next: Instant = last + self.min_interval;
            if next > Instant::now() {
                sleep_until(next).await;
            }
        }

        let now: Instant = Instant::now();
        if now.duration_since(state.window_start) >= self.window {
            state.window_start = now;
            state.count = 0;
        }

        if self.max_per_window > 0 && state.count >= self.max_per_window {
            warn!("Rate limit of {} probes reached, pausing", self.max_per_window);
            sleep_until(state.window_start + self.window).await;
            state.window_start = Instant::now();
            state.count = 0;
        }

        state.count += 1;
        state.last = Some(Instant::now());
    }
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝
