//! Handler chains.
//!
//! # Data Flow
//! ```text
//! Matched route with a chain target
//!     → run_chain / run_param_chain
//!     → link 0 → link 1 → ... (each link: process, then continue?)
//!     → a link returning false stops the chain; it has written the
//!       response
//!     → all links returning true leaves the request unhandled and the
//!       dispatcher falls through to not-found
//! ```
//!
//! # Design Decisions
//! - One capability per link: process the request/response pair and
//!   report whether execution continues
//! - Two parallel chain kinds: plain, and path-parameter-carrying
//!   (bindings are passed to every link)
//! - Terminal links stop the chain after writing their response;
//!   rate-limiter links stop it on rejection

use std::sync::Arc;

use crate::http::request::DispatchRequest;
use crate::http::response::ResponseWriter;
use crate::routing::path::PathParams;

/// One step of a handler chain with authority to stop propagation.
pub trait ChainLink: Send + Sync {
    /// Process the request; return `true` to continue to the next
    /// link, `false` to stop the chain (the response must already be
    /// written).
    fn serve_next(&self, req: &DispatchRequest, w: &mut ResponseWriter) -> bool;
}

impl<F> ChainLink for F
where
    F: Fn(&DispatchRequest, &mut ResponseWriter) -> bool + Send + Sync,
{
    fn serve_next(&self, req: &DispatchRequest, w: &mut ResponseWriter) -> bool {
        self(req, w)
    }
}

/// One step of a path-parameter handler chain; receives the bindings
/// extracted from the matched template.
pub trait PathParamChainLink: Send + Sync {
    /// Process the request; return `true` to continue to the next
    /// link, `false` to stop the chain.
    fn serve_next(
        &self,
        req: &DispatchRequest,
        w: &mut ResponseWriter,
        params: &PathParams,
    ) -> bool;
}

impl<F> PathParamChainLink for F
where
    F: Fn(&DispatchRequest, &mut ResponseWriter, &PathParams) -> bool + Send + Sync,
{
    fn serve_next(
        &self,
        req: &DispatchRequest,
        w: &mut ResponseWriter,
        params: &PathParams,
    ) -> bool {
        self(req, w, params)
    }
}

/// How a chain run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChainOutcome {
    /// A link stopped the chain; the request is handled.
    Stopped,
    /// Every link continued; the request is unhandled.
    RanThrough,
}

/// Execute a plain chain in order, short-circuiting on the first link
/// that stops.
pub fn run_chain(
    links: &[Arc<dyn ChainLink>],
    req: &DispatchRequest,
    w: &mut ResponseWriter,
) -> ChainOutcome {
    for link in links {
        if !link.serve_next(req, w) {
            return ChainOutcome::Stopped;
        }
    }
    ChainOutcome::RanThrough
}

/// Execute a path-parameter chain in order, passing the bindings to
/// every link.
pub fn run_param_chain(
    links: &[Arc<dyn PathParamChainLink>],
    req: &DispatchRequest,
    w: &mut ResponseWriter,
    params: &PathParams,
) -> ChainOutcome {
    for link in links {
        if !link.serve_next(req, w, params) {
            return ChainOutcome::Stopped;
        }
    }
    ChainOutcome::RanThrough
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use axum::http::{HeaderMap, Method};

    use super::*;

    fn request(path: &str) -> DispatchRequest {
        DispatchRequest::new(Method::GET, path.to_string(), HeaderMap::new())
    }

    #[test]
    fn stop_short_circuits_remaining_links() {
        let first = Arc::new(AtomicUsize::new(0));
        let third = Arc::new(AtomicUsize::new(0));
        let first2 = Arc::clone(&first);
        let third2 = Arc::clone(&third);

        let links: Vec<Arc<dyn ChainLink>> = vec![
            Arc::new(move |_: &DispatchRequest, _: &mut ResponseWriter| {
                first2.fetch_add(1, Ordering::SeqCst);
                true
            }),
            Arc::new(|_: &DispatchRequest, w: &mut ResponseWriter| {
                w.write_str("stopped here");
                false
            }),
            Arc::new(move |_: &DispatchRequest, _: &mut ResponseWriter| {
                third2.fetch_add(1, Ordering::SeqCst);
                true
            }),
        ];

        let mut w = ResponseWriter::new();
        let outcome = run_chain(&links, &request("/chain"), &mut w);
        assert_eq!(outcome, ChainOutcome::Stopped);
        assert_eq!(first.load(Ordering::SeqCst), 1);
        assert_eq!(third.load(Ordering::SeqCst), 0, "links after the stop must not run");
        assert_eq!(w.body(), b"stopped here");
    }

    #[test]
    fn all_continue_reports_ran_through() {
        let links: Vec<Arc<dyn ChainLink>> = vec![
            Arc::new(|_: &DispatchRequest, _: &mut ResponseWriter| true),
            Arc::new(|_: &DispatchRequest, _: &mut ResponseWriter| true),
        ];
        let mut w = ResponseWriter::new();
        assert_eq!(run_chain(&links, &request("/x"), &mut w), ChainOutcome::RanThrough);
    }

    #[test]
    fn empty_chain_ran_through() {
        let mut w = ResponseWriter::new();
        assert_eq!(run_chain(&[], &request("/x"), &mut w), ChainOutcome::RanThrough);
    }

    #[test]
    fn param_chain_passes_bindings_to_every_link() {
        let mut params = PathParams::new();
        params.insert("id".to_string(), "42".to_string());

        let links: Vec<Arc<dyn PathParamChainLink>> = vec![
            Arc::new(|_: &DispatchRequest, w: &mut ResponseWriter, p: &PathParams| {
                w.write_str(&format!("first:{};", p["id"]));
                true
            }),
            Arc::new(|_: &DispatchRequest, w: &mut ResponseWriter, p: &PathParams| {
                w.write_str(&format!("second:{}", p["id"]));
                false
            }),
        ];

        let mut w = ResponseWriter::new();
        let outcome = run_param_chain(&links, &request("/y/42"), &mut w, &params);
        assert_eq!(outcome, ChainOutcome::Stopped);
        assert_eq!(w.body(), b"first:42;second:42");
    }
}
