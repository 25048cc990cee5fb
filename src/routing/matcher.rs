//! Route matching logic.
//!
//! # Responsibilities
//! - Try the three tables in fixed priority order:
//!   exact/glob, then path-parameter, then regex
//! - Extract path-parameter bindings from matched templates
//! - Gate matched routes on their accepted-method set
//!
//! # Design Decisions
//! - First hit in table order wins; tables are registration-ordered
//! - A structural match with a disallowed method is reported as
//!   not-found, identical to no match at all, and consumes the
//!   dispatch (later tables are not tried)
//! - Explicit NotFound rather than a silent default response

use glob::MatchOptions;

use crate::chain::{self, ChainOutcome};
use crate::http::request::DispatchRequest;
use crate::http::response::ResponseWriter;
use crate::routing::path::{self, PathParams, PathToken};
use crate::routing::registry::{ParamTarget, PatternRoute, Tables, Target};

/// Result of a dispatch attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// A handler ran and wrote the response.
    Handled,
    /// No route took the request; the caller must render the
    /// not-found fallback.
    NotFound,
}

/// A structurally-matched route, cloned out of the tables so handlers
/// run without holding the registry lock.
pub(crate) enum Matched {
    Plain(Target),
    Param(ParamTarget, PathParams),
}

/// Glob options matching path semantics: wildcards and character
/// classes never span a `/` separator.
fn glob_options() -> MatchOptions {
    MatchOptions {
        case_sensitive: true,
        require_literal_separator: true,
        require_literal_leading_dot: false,
    }
}

/// Find the first matching route for the request, in strategy order,
/// and gate it on the incoming method.
pub(crate) fn find(tables: &Tables, req: &DispatchRequest) -> Option<Matched> {
    // 1. exact / glob
    for route in &tables.pattern_routes {
        if pattern_matches(route, req.path()) {
            tracing::debug!(pattern = %route.pattern, path = %req.path(), "matched path expression route");
            if !method_allowed(&route.methods, req) {
                return None;
            }
            return Some(Matched::Plain(route.target.clone()));
        }
    }

    // 2. path parameter
    let actual = path::split_slash_tokens(req.path());
    for route in &tables.param_routes {
        if let Some(params) = match_template(&route.tokens, &actual) {
            tracing::debug!(pattern = %route.pattern, path = %req.path(), "matched path parameter route");
            if !method_allowed(&route.methods, req) {
                return None;
            }
            return Some(Matched::Param(route.target.clone(), params));
        }
    }

    // 3. regex
    for route in &tables.regex_routes {
        if route.regex.is_match(req.path()) {
            tracing::debug!(pattern = %route.pattern, path = %req.path(), "matched regex route");
            if !method_allowed(&route.methods, req) {
                return None;
            }
            return Some(Matched::Plain(route.target.clone()));
        }
    }

    None
}

/// Execute a matched target, or report not-found.
pub(crate) fn execute(
    matched: Option<Matched>,
    req: &DispatchRequest,
    w: &mut ResponseWriter,
) -> DispatchOutcome {
    match matched {
        None => DispatchOutcome::NotFound,
        Some(Matched::Plain(Target::Single(handler))) => {
            handler.handle(req, w);
            DispatchOutcome::Handled
        }
        Some(Matched::Plain(Target::Chain(links))) => {
            chain_outcome(chain::run_chain(&links, req, w), w)
        }
        Some(Matched::Param(ParamTarget::Single(handler), params)) => {
            handler.handle(req, w, &params);
            DispatchOutcome::Handled
        }
        Some(Matched::Param(ParamTarget::Chain(links), params)) => {
            chain_outcome(chain::run_param_chain(&links, req, w, &params), w)
        }
    }
}

/// A chain that runs through every link without stopping leaves the
/// request unhandled; whatever the links wrote is discarded.
fn chain_outcome(outcome: ChainOutcome, w: &mut ResponseWriter) -> DispatchOutcome {
    match outcome {
        ChainOutcome::Stopped => DispatchOutcome::Handled,
        ChainOutcome::RanThrough => {
            *w = ResponseWriter::new();
            DispatchOutcome::NotFound
        }
    }
}

fn method_allowed(methods: &[axum::http::Method], req: &DispatchRequest) -> bool {
    let allowed = methods.contains(req.method());
    if !allowed {
        tracing::debug!(method = %req.method(), path = %req.path(), "method not allowed for matched route");
    }
    allowed
}

fn pattern_matches(route: &PatternRoute, path: &str) -> bool {
    if route.pattern == path {
        return true;
    }
    match &route.glob {
        Some(glob) => glob.matches_with(path, glob_options()),
        None => false,
    }
}

/// Match an incoming token list against a template: equal token counts,
/// literals compared exactly, placeholders bound by name.
fn match_template(tokens: &[PathToken], actual: &[&str]) -> Option<PathParams> {
    if tokens.len() != actual.len() {
        return None;
    }
    let mut params = PathParams::new();
    for (token, part) in tokens.iter().zip(actual) {
        match token {
            PathToken::Literal(lit) => {
                if lit != part {
                    return None;
                }
            }
            PathToken::Placeholder(name) => {
                params.insert(name.clone(), (*part).to_string());
            }
        }
    }
    Some(params)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use axum::http::{HeaderMap, Method};

    use super::DispatchOutcome;
    use crate::chain::ChainLink;
    use crate::http::request::DispatchRequest;
    use crate::http::response::ResponseWriter;
    use crate::routing::registry::Router;

    fn request(method: Method, path: &str) -> DispatchRequest {
        DispatchRequest::new(method, path.to_string(), HeaderMap::new())
    }

    fn echo(tag: &'static str) -> impl Fn(&DispatchRequest, &mut ResponseWriter) {
        move |_req: &DispatchRequest, w: &mut ResponseWriter| w.write_str(tag)
    }

    fn dispatch(router: &Router, method: Method, path: &str) -> (DispatchOutcome, String) {
        let mut w = ResponseWriter::new();
        let outcome = router.dispatch(&request(method, path), &mut w);
        (outcome, String::from_utf8(w.body().to_vec()).unwrap())
    }

    #[test]
    fn exact_match_is_independent_of_registration_order() {
        for flip in [false, true] {
            let router = Router::new();
            if flip {
                router.add_handler("/beta", echo("beta"), &[]);
                router.add_handler("/alpha", echo("alpha"), &[]);
            } else {
                router.add_handler("/alpha", echo("alpha"), &[]);
                router.add_handler("/beta", echo("beta"), &[]);
            }
            assert_eq!(
                dispatch(&router, Method::GET, "/alpha"),
                (DispatchOutcome::Handled, "alpha".to_string())
            );
            assert_eq!(
                dispatch(&router, Method::GET, "/beta"),
                (DispatchOutcome::Handled, "beta".to_string())
            );
        }
    }

    #[test]
    fn glob_wildcard_does_not_span_separator() {
        let router = Router::new();
        router.add_handler("/files/*.txt", echo("file"), &[]);
        let (outcome, body) = dispatch(&router, Method::GET, "/files/notes.txt");
        assert_eq!((outcome, body.as_str()), (DispatchOutcome::Handled, "file"));
        let (outcome, _) = dispatch(&router, Method::GET, "/files/sub/notes.txt");
        assert_eq!(outcome, DispatchOutcome::NotFound);
    }

    #[test]
    fn glob_character_class_matches_single_segment() {
        let router = Router::new();
        router.add_handler("/item?/[0-9]", echo("item"), &[]);
        assert_eq!(dispatch(&router, Method::GET, "/item1/7").0, DispatchOutcome::Handled);
        assert_eq!(dispatch(&router, Method::GET, "/item1/x").0, DispatchOutcome::NotFound);
    }

    #[test]
    fn path_param_route_binds_by_name() {
        let router = Router::new();
        router.add_handler_path_param(
            "/hello5/:userId/test/{prodId}",
            |_req: &DispatchRequest, w: &mut ResponseWriter, params: &crate::routing::PathParams| {
                w.write_str(&format!(
                    "user={} prod={}",
                    params["userId"], params["prodId"]
                ));
            },
            &[Method::GET, Method::POST],
        );
        let (outcome, body) = dispatch(&router, Method::GET, "/hello5/42/test/99");
        assert_eq!(outcome, DispatchOutcome::Handled);
        assert_eq!(body, "user=42 prod=99");
    }

    #[test]
    fn token_count_mismatch_is_not_found() {
        let router = Router::new();
        router.add_handler_path_param(
            "/hello5/:userId/test/{prodId}",
            |_: &DispatchRequest, w: &mut ResponseWriter, _: &crate::routing::PathParams| {
                w.write_str("hit")
            },
            &[],
        );
        assert_eq!(
            dispatch(&router, Method::GET, "/hello5/42/test").0,
            DispatchOutcome::NotFound
        );
    }

    #[test]
    fn literal_mismatch_rejects_route_and_tries_next() {
        let router = Router::new();
        router.add_handler_path_param(
            "/users/:id/posts",
            |_: &DispatchRequest, w: &mut ResponseWriter, _: &crate::routing::PathParams| {
                w.write_str("posts")
            },
            &[],
        );
        router.add_handler_path_param(
            "/users/:id/likes",
            |_: &DispatchRequest, w: &mut ResponseWriter, _: &crate::routing::PathParams| {
                w.write_str("likes")
            },
            &[],
        );
        let (outcome, body) = dispatch(&router, Method::GET, "/users/7/likes");
        assert_eq!(outcome, DispatchOutcome::Handled);
        assert_eq!(body, "likes");
    }

    #[test]
    fn regex_route_is_case_insensitive() {
        let router = Router::new();
        router.add_handler_regex("/hello1/.*/12[34]$", echo("regex"), &[]);
        assert_eq!(
            dispatch(&router, Method::GET, "/HELLO1/abc/123").0,
            DispatchOutcome::Handled
        );
        assert_eq!(
            dispatch(&router, Method::GET, "/hello1/abc/125").0,
            DispatchOutcome::NotFound
        );
    }

    #[test]
    fn invalid_regex_registration_is_discarded() {
        let router = Router::new();
        router.add_handler_regex("/bad/(unclosed", echo("never"), &[]);
        assert_eq!(
            dispatch(&router, Method::GET, "/bad/(unclosed").0,
            DispatchOutcome::NotFound
        );
    }

    #[test]
    fn empty_method_list_defaults_to_get() {
        let router = Router::new();
        router.add_handler("/only-get", echo("ok"), &[]);
        assert_eq!(dispatch(&router, Method::GET, "/only-get").0, DispatchOutcome::Handled);
        assert_eq!(dispatch(&router, Method::POST, "/only-get").0, DispatchOutcome::NotFound);
    }

    #[test]
    fn unrecognized_methods_are_dropped() {
        let router = Router::new();
        let brew = Method::from_bytes(b"BREW").unwrap();
        router.add_handler("/mixed", echo("ok"), &[brew.clone(), Method::GET]);
        assert_eq!(dispatch(&router, Method::GET, "/mixed").0, DispatchOutcome::Handled);

        // Only unrecognized verbs: the whole registration is discarded.
        let router = Router::new();
        router.add_handler("/dropped", echo("never"), &[brew]);
        assert_eq!(dispatch(&router, Method::GET, "/dropped").0, DispatchOutcome::NotFound);
    }

    #[test]
    fn strategy_order_prefers_exact_over_regex() {
        let router = Router::new();
        router.add_handler_regex("/order/.*", echo("regex"), &[]);
        router.add_handler("/order/fixed", echo("exact"), &[]);
        let (_, body) = dispatch(&router, Method::GET, "/order/fixed");
        assert_eq!(body, "exact");
    }

    #[test]
    fn structural_match_with_wrong_method_consumes_dispatch() {
        // The regex table would also match, but the exact hit with a
        // disallowed verb already decided the outcome.
        let router = Router::new();
        router.add_handler("/consumed", echo("exact"), &[Method::GET]);
        router.add_handler_regex("/consumed", echo("regex"), &[Method::POST]);
        assert_eq!(
            dispatch(&router, Method::POST, "/consumed").0,
            DispatchOutcome::NotFound
        );
    }

    #[test]
    fn reregistering_a_pattern_replaces_the_route() {
        let router = Router::new();
        router.add_handler("/swap", echo("old"), &[]);
        router.add_handler("/swap", echo("new"), &[]);
        let (_, body) = dispatch(&router, Method::GET, "/swap");
        assert_eq!(body, "new");
    }

    #[test]
    fn chain_running_through_all_links_is_not_found() {
        let router = Router::new();
        let calls = Arc::new(AtomicUsize::new(0));
        let calls2 = Arc::clone(&calls);
        let passthrough = move |_: &DispatchRequest, w: &mut ResponseWriter| {
            calls2.fetch_add(1, Ordering::SeqCst);
            w.write_str("partial");
            true
        };
        router.add_chain_handler("/through", vec![Arc::new(passthrough) as Arc<dyn ChainLink>], &[]);
        let (outcome, body) = dispatch(&router, Method::GET, "/through");
        assert_eq!(outcome, DispatchOutcome::NotFound);
        assert!(body.is_empty(), "ran-through chain output must be discarded");
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn chain_stopping_link_handles_the_request() {
        let router = Router::new();
        let terminal = |_: &DispatchRequest, w: &mut ResponseWriter| {
            w.write_str("done");
            false
        };
        router.add_chain_handler("/stop", vec![Arc::new(terminal) as Arc<dyn ChainLink>], &[]);
        let (outcome, body) = dispatch(&router, Method::GET, "/stop");
        assert_eq!(outcome, DispatchOutcome::Handled);
        assert_eq!(body, "done");
    }
}
