//! Rewrite rule storage and resolution.

use std::sync::RwLock;

use glob::{MatchOptions, Pattern};
use regex::Regex;

use crate::routing::path;

/// One source→target rewrite rule with its pre-compiled pattern forms.
struct RewriteRule {
    source: String,
    target: String,
    /// `None` when the source is not a valid glob.
    glob: Option<Pattern>,
    /// `None` when the source is not a valid regex.
    regex: Option<Regex>,
}

/// Registry of URL rewrite rules, applied before routing.
///
/// Rules are ordered by registration; among rules that would all match
/// a path, the first-registered one fires. Re-registering a source
/// replaces its rule in place.
pub struct RewriteTable {
    rules: RwLock<Vec<RewriteRule>>,
}

impl RewriteTable {
    /// Create an empty rewrite table.
    pub fn new() -> Self {
        Self {
            rules: RwLock::new(Vec::new()),
        }
    }

    /// Register a rewrite rule. Surrounding whitespace on both sides is
    /// trimmed; the strings are otherwise stored verbatim.
    ///
    /// The source may be an exact path, a glob, a path-parameter
    /// template (`/a/:id`, `/a/{id}`) or a regex with capture groups.
    /// The target may reference template placeholders by their exact
    /// token text, or capture groups as `$0`, `$1`, ...
    pub fn add_rule(&self, source: &str, target: &str) {
        let source = source.trim().to_string();
        let target = target.trim().to_string();
        let rule = RewriteRule {
            glob: Pattern::new(&source).ok(),
            regex: Regex::new(&source).ok(),
            source,
            target,
        };
        let mut rules = self.rules.write().expect("rewrite table lock poisoned");
        match rules.iter_mut().find(|r| r.source == rule.source) {
            Some(existing) => *existing = rule,
            None => rules.push(rule),
        }
    }

    /// Resolve a path against the table. Returns the rewritten target
    /// of the first matching rule, or the (trimmed) path unchanged.
    pub fn resolve(&self, incoming: &str) -> String {
        let incoming = incoming.trim();
        let rules = self.rules.read().expect("rewrite table lock poisoned");
        for rule in rules.iter() {
            if let Some(rewritten) = rule.apply(incoming) {
                tracing::debug!(source = %rule.source, from = %incoming, to = %rewritten, "rewrite rule fired");
                return rewritten;
            }
        }
        incoming.to_string()
    }
}

impl Default for RewriteTable {
    fn default() -> Self {
        Self::new()
    }
}

fn glob_options() -> MatchOptions {
    MatchOptions {
        case_sensitive: true,
        require_literal_separator: true,
        require_literal_leading_dot: false,
    }
}

impl RewriteRule {
    /// Try the sub-strategies in fixed order; `Some` carries the
    /// substituted target.
    fn apply(&self, incoming: &str) -> Option<String> {
        if self.source == incoming {
            return Some(self.target.clone());
        }
        if let Some(glob) = &self.glob {
            if glob.matches_with(incoming, glob_options()) {
                return Some(self.target.clone());
            }
        }
        if let Some(rewritten) = self.apply_template(incoming) {
            return Some(rewritten);
        }
        self.apply_regex(incoming)
    }

    /// Path-parameter match: equal token counts, literals equal,
    /// placeholders bind. Each placeholder occurrence in the target —
    /// including its delimiters — is replaced by the bound value.
    fn apply_template(&self, incoming: &str) -> Option<String> {
        let actual = path::split_slash_tokens(incoming);
        let source = path::split_slash_tokens(&self.source);
        if source.len() != actual.len() {
            return None;
        }
        let mut bindings: Vec<(&str, &str)> = Vec::new();
        for (token, part) in source.iter().copied().zip(actual.iter().copied()) {
            if path::is_placeholder(token) {
                bindings.push((token, part));
            } else if token != part {
                return None;
            }
        }
        let mut target = self.target.clone();
        for (token, value) in bindings {
            target = target.replace(token, value);
        }
        Some(target)
    }

    /// Regex match: `$0`, `$1`, ... in the target are replaced by the
    /// capture groups, highest index first so `$1` cannot corrupt
    /// `$10`.
    fn apply_regex(&self, incoming: &str) -> Option<String> {
        let regex = self.regex.as_ref()?;
        let caps = regex.captures(incoming)?;
        let mut target = self.target.clone();
        for index in (0..caps.len()).rev() {
            if let Some(group) = caps.get(index) {
                target = target.replace(&format!("${index}"), group.as_str());
            }
        }
        Some(target)
    }
}
