//! Weighted sliding window rate limiting.
//!
//! Approximates a rolling 60-second window with at most two
//! minute-aligned counters: the current minute (front) and, when
//! useful, the previous minute (back). Crossing into a new minute
//! weighs the old count by the fraction of the window it still
//! covers: `previous * (1 - elapsed_seconds/60) + current`. O(1)
//! state per limiter in exchange for an approximate count.

use std::sync::Mutex;
use std::time::{SystemTime, UNIX_EPOCH};

use axum::http::StatusCode;

use crate::chain::{ChainLink, PathParamChainLink};
use crate::http::request::DispatchRequest;
use crate::http::response::ResponseWriter;
use crate::observability::metrics;
use crate::routing::path::PathParams;

#[derive(Debug, Clone, Copy)]
struct MinuteBucket {
    count: u32,
    minute: u8,
}

#[derive(Default)]
struct WindowState {
    /// Most recent minute bucket.
    front: Option<MinuteBucket>,
    /// Previous minute bucket; present only while it still weighs on
    /// the window. Invariant: `back` is `Some` only when `front` is.
    back: Option<MinuteBucket>,
}

/// Sliding window limiter, usable as a link in either chain kind.
pub struct SlidingWindowLimiter {
    requests_per_minute: u32,
    reject_status: StatusCode,
    state: Mutex<WindowState>,
}

impl SlidingWindowLimiter {
    /// Create a limiter admitting `requests_per_minute` requests over
    /// the weighted window.
    pub fn new(requests_per_minute: u32) -> Self {
        Self {
            requests_per_minute,
            reject_status: StatusCode::OK,
            state: Mutex::new(WindowState::default()),
        }
    }

    /// Status sent on rejection. The default is 200 OK with a
    /// rejection body, matching the engine's historical behavior;
    /// most applications will want `StatusCode::TOO_MANY_REQUESTS`.
    pub fn with_reject_status(mut self, status: StatusCode) -> Self {
        self.reject_status = status;
        self
    }

    /// Atomic admission check against the wall clock.
    pub fn allow(&self) -> bool {
        let (minute, second) = wall_clock_minute();
        self.check_at(minute, second)
    }

    /// Admission decision for a given minute-of-hour and
    /// seconds-within-minute. Factored out of [`allow`](Self::allow)
    /// so the transitions are testable without a clock.
    fn check_at(&self, minute: u8, second: u8) -> bool {
        let mut state = self.state.lock().expect("sliding window mutex poisoned");
        let limit = f64::from(self.requests_per_minute);
        let elapsed = f64::from(second) / 60.0;

        let Some(front) = state.front else {
            state.front = Some(MinuteBucket { count: 1, minute });
            return true;
        };

        if front.minute == minute {
            // Still in the front bucket's minute; when a previous
            // bucket exists its weighted share counts first.
            if let Some(back) = state.back {
                let weighted = f64::from(back.count) * (1.0 - elapsed) + f64::from(front.count);
                if weighted > limit {
                    return false;
                }
            }
            if front.count + 1 > self.requests_per_minute {
                return false;
            }
            state.front = Some(MinuteBucket {
                count: front.count + 1,
                ..front
            });
            return true;
        }

        let previous_minute = if minute == 0 { 59 } else { minute - 1 };
        if front.minute == previous_minute {
            // Crossed into a fresh minute: the old front still weighs
            // on the window.
            let weighted = f64::from(front.count) * (1.0 - elapsed);
            if weighted > limit {
                return false;
            }
            state.back = Some(front);
            state.front = Some(MinuteBucket { count: 1, minute });
            return true;
        }

        // More than a minute of silence: the window is empty again.
        state.front = Some(MinuteBucket { count: 1, minute });
        state.back = None;
        true
    }

    fn reject(&self, w: &mut ResponseWriter) {
        metrics::record_rate_limited("sliding_window");
        w.set_status(self.reject_status);
        w.write_str("request rejected: rate limit exceeded\n");
    }
}

impl ChainLink for SlidingWindowLimiter {
    fn serve_next(&self, _req: &DispatchRequest, w: &mut ResponseWriter) -> bool {
        if self.allow() {
            true
        } else {
            self.reject(w);
            false
        }
    }
}

impl PathParamChainLink for SlidingWindowLimiter {
    fn serve_next(
        &self,
        _req: &DispatchRequest,
        w: &mut ResponseWriter,
        _params: &PathParams,
    ) -> bool {
        if self.allow() {
            true
        } else {
            self.reject(w);
            false
        }
    }
}

fn wall_clock_minute() -> (u8, u8) {
    let secs = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0);
    (((secs / 60) % 60) as u8, (secs % 60) as u8)
}
