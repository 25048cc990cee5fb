//! Route registration and storage.
//!
//! # Responsibilities
//! - Own the three route tables (exact/glob, path-parameter, regex)
//! - Filter registered HTTP methods against the recognized verb set
//! - Compile glob and regex patterns once, at registration
//! - Serialize registration (write lock) against dispatch (read lock)
//!
//! # Design Decisions
//! - The `Router` owns its lock and lifecycle; no global state
//! - Tables are ordered: first-registered wins among overlapping
//!   patterns, re-registering an identical pattern replaces in place
//! - Invalid registrations (bad regex, no recognized methods) are
//!   silently discarded, surfaced only at debug level

use std::sync::{Arc, RwLock};

use axum::http::Method;
use glob::Pattern;
use regex::{Regex, RegexBuilder};

use crate::chain::{ChainLink, PathParamChainLink};
use crate::http::request::DispatchRequest;
use crate::http::response::ResponseWriter;
use crate::routing::matcher::{self, DispatchOutcome};
use crate::routing::path::{self, PathParams, PathToken};

/// A terminal request handler.
pub trait Handler: Send + Sync {
    /// Process the request and write the response.
    fn handle(&self, req: &DispatchRequest, w: &mut ResponseWriter);
}

impl<F> Handler for F
where
    F: Fn(&DispatchRequest, &mut ResponseWriter) + Send + Sync,
{
    fn handle(&self, req: &DispatchRequest, w: &mut ResponseWriter) {
        self(req, w);
    }
}

/// A terminal handler for path-parameter routes; receives the bindings
/// extracted from the matched template.
pub trait PathParamHandler: Send + Sync {
    /// Process the request and write the response.
    fn handle(&self, req: &DispatchRequest, w: &mut ResponseWriter, params: &PathParams);
}

impl<F> PathParamHandler for F
where
    F: Fn(&DispatchRequest, &mut ResponseWriter, &PathParams) + Send + Sync,
{
    fn handle(&self, req: &DispatchRequest, w: &mut ResponseWriter, params: &PathParams) {
        self(req, w, params);
    }
}

/// What a matched plain route executes.
#[derive(Clone)]
pub(crate) enum Target {
    Single(Arc<dyn Handler>),
    Chain(Vec<Arc<dyn ChainLink>>),
}

/// What a matched path-parameter route executes.
#[derive(Clone)]
pub(crate) enum ParamTarget {
    Single(Arc<dyn PathParamHandler>),
    Chain(Vec<Arc<dyn PathParamChainLink>>),
}

pub(crate) struct PatternRoute {
    pub pattern: String,
    /// `None` when the pattern is not a valid glob; the route then
    /// matches by string equality only.
    pub glob: Option<Pattern>,
    pub methods: Vec<Method>,
    pub target: Target,
}

pub(crate) struct ParamRoute {
    pub pattern: String,
    pub tokens: Vec<PathToken>,
    pub methods: Vec<Method>,
    pub target: ParamTarget,
}

pub(crate) struct RegexRoute {
    pub pattern: String,
    pub regex: Regex,
    pub methods: Vec<Method>,
    pub target: Target,
}

#[derive(Default)]
pub(crate) struct Tables {
    pub pattern_routes: Vec<PatternRoute>,
    pub param_routes: Vec<ParamRoute>,
    pub regex_routes: Vec<RegexRoute>,
}

const RECOGNIZED_METHODS: [Method; 9] = [
    Method::GET,
    Method::HEAD,
    Method::POST,
    Method::PUT,
    Method::PATCH,
    Method::DELETE,
    Method::CONNECT,
    Method::OPTIONS,
    Method::TRACE,
];

/// Filter registered methods against the recognized set. An empty list
/// defaults to GET; a list that filters to empty discards the
/// registration entirely.
fn filter_methods(methods: &[Method]) -> Option<Vec<Method>> {
    if methods.is_empty() {
        return Some(vec![Method::GET]);
    }
    let verbs: Vec<Method> = methods
        .iter()
        .filter(|m| RECOGNIZED_METHODS.contains(m))
        .cloned()
        .collect();
    if verbs.is_empty() {
        None
    } else {
        Some(verbs)
    }
}

/// Route registry and dispatch entry point.
///
/// Registration is expected at startup but is safe at any time: writers
/// take the table lock exclusively, dispatch takes it shared and never
/// mutates. Matched handlers run after the lock is released.
pub struct Router {
    tables: RwLock<Tables>,
}

impl Router {
    /// Create an empty router.
    pub fn new() -> Self {
        Self {
            tables: RwLock::new(Tables::default()),
        }
    }

    /// Register a handler under an exact or glob pattern.
    ///
    /// Glob syntax supports `*`, `?` and character classes; none of
    /// them span a `/`. Among overlapping patterns the first-registered
    /// route wins.
    pub fn add_handler<H>(&self, pattern: &str, handler: H, methods: &[Method])
    where
        H: Handler + 'static,
    {
        self.insert_pattern_route(pattern, Target::Single(Arc::new(handler)), methods);
    }

    /// Register an ordered handler chain under an exact or glob pattern.
    pub fn add_chain_handler(
        &self,
        pattern: &str,
        chain: Vec<Arc<dyn ChainLink>>,
        methods: &[Method],
    ) {
        self.insert_pattern_route(pattern, Target::Chain(chain), methods);
    }

    /// Register a handler under a regex pattern, matched
    /// case-insensitively. A pattern that fails to compile discards the
    /// registration.
    pub fn add_handler_regex<H>(&self, pattern: &str, handler: H, methods: &[Method])
    where
        H: Handler + 'static,
    {
        self.insert_regex_route(pattern, Target::Single(Arc::new(handler)), methods);
    }

    /// Register an ordered handler chain under a regex pattern.
    pub fn add_chain_handler_regex(
        &self,
        pattern: &str,
        chain: Vec<Arc<dyn ChainLink>>,
        methods: &[Method],
    ) {
        self.insert_regex_route(pattern, Target::Chain(chain), methods);
    }

    /// Register a handler under a path-parameter template, e.g.
    /// `/users/:id` or `/users/{id}/orders`.
    pub fn add_handler_path_param<H>(&self, pattern: &str, handler: H, methods: &[Method])
    where
        H: PathParamHandler + 'static,
    {
        self.insert_param_route(pattern, ParamTarget::Single(Arc::new(handler)), methods);
    }

    /// Register an ordered handler chain under a path-parameter
    /// template; every link receives the extracted bindings.
    pub fn add_chain_handler_path_param(
        &self,
        pattern: &str,
        chain: Vec<Arc<dyn PathParamChainLink>>,
        methods: &[Method],
    ) {
        self.insert_param_route(pattern, ParamTarget::Chain(chain), methods);
    }

    /// Dispatch a request against the registered tables, writing the
    /// response through `w` on a hit.
    ///
    /// Returns [`DispatchOutcome::NotFound`] when no table matches,
    /// when a structural match disallows the method, or when a matched
    /// chain runs through all its links without stopping; the caller
    /// renders the not-found fallback.
    pub fn dispatch(&self, req: &DispatchRequest, w: &mut ResponseWriter) -> DispatchOutcome {
        let matched = {
            let tables = self.tables.read().expect("route registry lock poisoned");
            matcher::find(&tables, req)
        };
        matcher::execute(matched, req, w)
    }

    fn insert_pattern_route(&self, pattern: &str, target: Target, methods: &[Method]) {
        let Some(methods) = filter_methods(methods) else {
            tracing::debug!(pattern, "registration dropped: no recognized HTTP methods");
            return;
        };
        let glob = match Pattern::new(pattern) {
            Ok(p) => Some(p),
            Err(e) => {
                tracing::debug!(pattern, error = %e, "not a valid glob, exact matching only");
                None
            }
        };
        let route = PatternRoute {
            pattern: pattern.to_string(),
            glob,
            methods,
            target,
        };
        let mut tables = self.tables.write().expect("route registry lock poisoned");
        match tables.pattern_routes.iter_mut().find(|r| r.pattern == pattern) {
            Some(existing) => *existing = route,
            None => tables.pattern_routes.push(route),
        }
    }

    fn insert_regex_route(&self, pattern: &str, target: Target, methods: &[Method]) {
        let Some(methods) = filter_methods(methods) else {
            tracing::debug!(pattern, "registration dropped: no recognized HTTP methods");
            return;
        };
        let regex = match RegexBuilder::new(pattern).case_insensitive(true).build() {
            Ok(re) => re,
            Err(e) => {
                tracing::debug!(pattern, error = %e, "registration dropped: invalid regex");
                return;
            }
        };
        let route = RegexRoute {
            pattern: pattern.to_string(),
            regex,
            methods,
            target,
        };
        let mut tables = self.tables.write().expect("route registry lock poisoned");
        match tables.regex_routes.iter_mut().find(|r| r.pattern == pattern) {
            Some(existing) => *existing = route,
            None => tables.regex_routes.push(route),
        }
    }

    fn insert_param_route(&self, pattern: &str, target: ParamTarget, methods: &[Method]) {
        let Some(methods) = filter_methods(methods) else {
            tracing::debug!(pattern, "registration dropped: no recognized HTTP methods");
            return;
        };
        let route = ParamRoute {
            pattern: pattern.to_string(),
            tokens: path::parse_template(pattern),
            methods,
            target,
        };
        let mut tables = self.tables.write().expect("route registry lock poisoned");
        match tables.param_routes.iter_mut().find(|r| r.pattern == pattern) {
            Some(existing) => *existing = route,
            None => tables.param_routes.push(route),
        }
    }
}

impl Default for Router {
    fn default() -> Self {
        Self::new()
    }
}
