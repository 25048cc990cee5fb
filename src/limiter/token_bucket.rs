//! Token bucket rate limiting.
//!
//! A bucket starts full at its capacity. Every admission takes one
//! token; an empty bucket rejects. A periodic refiller puts
//! `refill_amount` tokens back every `refill_interval`, capped at
//! capacity. The refiller is spawned lazily by the first admission
//! check and runs until [`TokenBucketLimiter::stop`] is called or the
//! process exits.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::http::StatusCode;
use tokio::sync::oneshot;

use crate::chain::{ChainLink, PathParamChainLink};
use crate::http::request::DispatchRequest;
use crate::http::response::ResponseWriter;
use crate::observability::metrics;
use crate::routing::path::PathParams;

struct BucketState {
    tokens: u32,
    refiller_started: bool,
}

struct Shared {
    state: Mutex<BucketState>,
    stop_tx: Mutex<Option<oneshot::Sender<()>>>,
}

/// Token bucket limiter, usable as a link in either chain kind.
///
/// Clones share the same bucket; keep a clone around to call
/// [`stop`](Self::stop) at teardown.
#[derive(Clone)]
pub struct TokenBucketLimiter {
    capacity: u32,
    refill_amount: u32,
    refill_interval: Duration,
    reject_status: StatusCode,
    shared: Arc<Shared>,
}

impl TokenBucketLimiter {
    /// Create a bucket holding `capacity` tokens that regains
    /// `refill_amount` tokens every `refill_interval` (capped at
    /// capacity).
    pub fn new(capacity: u32, refill_interval: Duration, refill_amount: u32) -> Self {
        Self {
            capacity,
            refill_amount,
            refill_interval,
            reject_status: StatusCode::OK,
            shared: Arc::new(Shared {
                state: Mutex::new(BucketState {
                    tokens: capacity,
                    refiller_started: false,
                }),
                stop_tx: Mutex::new(None),
            }),
        }
    }

    /// Status sent on rejection. The default is 200 OK with a
    /// rejection body, matching the engine's historical behavior;
    /// most applications will want `StatusCode::TOO_MANY_REQUESTS`.
    pub fn with_reject_status(mut self, status: StatusCode) -> Self {
        self.reject_status = status;
        self
    }

    /// Atomic admission check. Starts the refiller on first use; must
    /// be called from within a Tokio runtime.
    fn admit(&self) -> bool {
        let mut state = self.shared.state.lock().expect("token bucket mutex poisoned");
        if !state.refiller_started {
            state.refiller_started = true;
            self.spawn_refiller();
        }
        if state.tokens > 0 {
            state.tokens -= 1;
            true
        } else {
            false
        }
    }

    fn spawn_refiller(&self) {
        let (tx, mut rx) = oneshot::channel();
        *self.shared.stop_tx.lock().expect("token bucket mutex poisoned") = Some(tx);

        let shared = Arc::clone(&self.shared);
        let capacity = self.capacity;
        let amount = self.refill_amount;
        let period = self.refill_interval;
        tokio::spawn(async move {
            tracing::debug!(?period, "token bucket refiller started");
            let mut ticker = tokio::time::interval(period);
            // The first tick completes immediately; the first refill
            // must land one full interval after spawn.
            ticker.tick().await;
            loop {
                tokio::select! {
                    // A pending stop always wins over a due tick.
                    biased;
                    _ = &mut rx => break,
                    _ = ticker.tick() => {
                        let mut state = shared.state.lock().expect("token bucket mutex poisoned");
                        if state.tokens < capacity {
                            state.tokens = (state.tokens + amount).min(capacity);
                        }
                        tracing::debug!(tokens = state.tokens, "token bucket refilled");
                    }
                }
            }
            tracing::debug!("token bucket refiller stopped");
        });
    }

    /// Stop the periodic refiller. Without this the refiller runs for
    /// the lifetime of the process. Idempotent.
    pub fn stop(&self) {
        let sender = self.shared.stop_tx.lock().expect("token bucket mutex poisoned").take();
        if let Some(tx) = sender {
            let _ = tx.send(());
        }
    }

    fn reject(&self, w: &mut ResponseWriter) {
        metrics::record_rate_limited("token_bucket");
        w.set_status(self.reject_status);
        w.write_str("request rejected: token bucket exhausted\n");
    }
}

impl ChainLink for TokenBucketLimiter {
    fn serve_next(&self, _req: &DispatchRequest, w: &mut ResponseWriter) -> bool {
        if self.admit() {
            true
        } else {
            self.reject(w);
            false
        }
    }
}

impl PathParamChainLink for TokenBucketLimiter {
    fn serve_next(
        &self,
        _req: &DispatchRequest,
        w: &mut ResponseWriter,
        _params: &PathParams,
    ) -> bool {
        if self.admit() {
            true
        } else {
            self.reject(w);
            false
        }
    }
}
