//! URL path tokenization and placeholder syntax.
//!
//! A path token is one `/`-delimited segment. Repeated separators
//! collapse, so `/a//b` and `/a/b` tokenize identically. A placeholder
//! token binds a variable segment and is written `{name}` or `:name`;
//! whitespace inside the delimiters is tolerated (`{ id }` binds `id`).

use std::collections::HashMap;

/// Path-parameter bindings extracted during matching, keyed by
/// placeholder name.
pub type PathParams = HashMap<String, String>;

/// One token of a registered path-parameter template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathToken {
    /// Must equal the incoming token exactly.
    Literal(String),
    /// Binds the incoming token under the placeholder name.
    Placeholder(String),
}

/// Split a path into its non-empty slash-delimited tokens.
pub fn split_slash_tokens(path: &str) -> Vec<&str> {
    path.split('/').filter(|token| !token.is_empty()).collect()
}

/// Parse a registered template into literal and placeholder tokens.
pub fn parse_template(pattern: &str) -> Vec<PathToken> {
    split_slash_tokens(pattern)
        .into_iter()
        .map(|token| match placeholder_name(token) {
            Some(name) => PathToken::Placeholder(name.to_string()),
            None => PathToken::Literal(token.to_string()),
        })
        .collect()
}

/// Returns the placeholder name if `token` uses `{name}` or `:name`
/// syntax. Names are word characters only; anything else is a literal.
pub fn placeholder_name(token: &str) -> Option<&str> {
    let inner = if let Some(rest) = token.strip_prefix(':') {
        rest
    } else if let Some(rest) = token.strip_prefix('{') {
        rest.strip_suffix('}')?
    } else {
        return None;
    };
    let name = inner.trim();
    let word = !name.is_empty() && name.chars().all(|c| c.is_alphanumeric() || c == '_');
    word.then_some(name)
}

/// Whether `token` is a placeholder under either syntax.
pub fn is_placeholder(token: &str) -> bool {
    placeholder_name(token).is_some()
}
