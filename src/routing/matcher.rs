//! Route matching logic.
//!
//! # Responsibilities
//! - Match the request path against a compiled regular expression
//! - Match the request method against an optional allow-list
//! - Extract named capture groups as path variables
//!
//! # Design Decisions
//! - Patterns are compiled once, at registration
//! - Path matching is an unanchored regex search; anchor with `^`/`$`
//! - Empty method list = any method (wildcard)

use std::collections::HashMap;

use axum::http::Method;
use regex::Regex;

use crate::routing::RouteError;

/// Trait for matching requests against conditions.
pub trait Matcher: Send + Sync + std::fmt::Debug {
    /// Returns true if the request method and path satisfy this condition.
    fn matches(&self, method: &Method, path: &str) -> bool;
}

/// Matches the request path against a regular expression.
#[derive(Debug, Clone)]
pub struct PathMatcher {
    regex: Regex,
}

impl PathMatcher {
    /// Compile `pattern`. Fails on malformed expressions.
    pub fn new(pattern: &str) -> Result<Self, RouteError> {
        let regex = Regex::new(pattern).map_err(|source| RouteError::InvalidPattern {
            pattern: pattern.to_string(),
            source,
        })?;
        Ok(Self { regex })
    }

    pub fn pattern(&self) -> &str {
        self.regex.as_str()
    }

    /// Named capture groups of `path`, if it matches.
    pub fn captures(&self, path: &str) -> PathVars {
        let mut vars = HashMap::new();
        if let Some(caps) = self.regex.captures(path) {
            for name in self.regex.capture_names().flatten() {
                if let Some(value) = caps.name(name) {
                    vars.insert(name.to_string(), value.as_str().to_string());
                }
            }
        }
        PathVars(vars)
    }
}

impl Matcher for PathMatcher {
    fn matches(&self, _method: &Method, path: &str) -> bool {
        self.regex.is_match(path)
    }
}

/// Matches the request method against an allow-list.
#[derive(Debug, Clone, Default)]
pub struct MethodMatcher {
    methods: Vec<Method>,
}

impl MethodMatcher {
    pub fn new(methods: impl IntoIterator<Item = Method>) -> Self {
        Self {
            methods: methods.into_iter().collect(),
        }
    }

    pub fn methods(&self) -> &[Method] {
        &self.methods
    }
}

impl Matcher for MethodMatcher {
    fn matches(&self, method: &Method, _path: &str) -> bool {
        self.methods.is_empty() || self.methods.contains(method)
    }
}

/// Named path segments captured by the matched route pattern.
///
/// Inserted into the request extensions by the router.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PathVars(HashMap<String, String>);

impl PathVars {
    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.get(name).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_path_matcher() {
        let matcher = PathMatcher::new("^/h2").unwrap();
        assert!(matcher.matches(&Method::GET, "/h2"));
        assert!(matcher.matches(&Method::GET, "/h2x"));
        assert!(!matcher.matches(&Method::GET, "/x/h2"));
    }

    #[test]
    fn test_path_matcher_is_unanchored() {
        let matcher = PathMatcher::new("/static/.*").unwrap();
        assert!(matcher.matches(&Method::GET, "/static/app.css"));
        assert!(matcher.matches(&Method::GET, "/v1/static/app.css"));
    }

    #[test]
    fn test_invalid_pattern() {
        let err = PathMatcher::new("^/(unclosed").unwrap_err();
        assert!(matches!(err, RouteError::InvalidPattern { ref pattern, .. } if pattern == "^/(unclosed"));
    }

    #[test]
    fn test_method_matcher() {
        let any = MethodMatcher::default();
        assert!(any.matches(&Method::DELETE, "/"));

        let matcher = MethodMatcher::new([Method::GET, Method::POST]);
        assert!(matcher.matches(&Method::GET, "/"));
        assert!(matcher.matches(&Method::POST, "/"));
        assert!(!matcher.matches(&Method::PUT, "/"));
    }

    #[test]
    fn test_captures() {
        let matcher = PathMatcher::new(r"/name/(?P<name>\w+)/id/(?P<id>\d+)").unwrap();
        let vars = matcher.captures("/name/go/id/60");
        assert_eq!(vars.get("name"), Some("go"));
        assert_eq!(vars.get("id"), Some("60"));
        assert_eq!(vars.len(), 2);
    }

    #[test]
    fn test_captures_without_match() {
        let matcher = PathMatcher::new(r"^/name/(?P<name>\w+)$").unwrap();
        assert!(matcher.captures("/other").is_empty());
    }
}
