//! A single pattern/method/pipe binding.

use std::sync::Arc;

use axum::http::Method;

use crate::pipeline::Pipe;
use crate::routing::{Matcher, MethodMatcher, PathMatcher, PathVars, RouteError};

/// A registered route.
#[derive(Debug, Clone)]
pub struct Route {
    path: PathMatcher,
    methods: MethodMatcher,
    pipe: Arc<Pipe>,
}

impl Route {
    pub(crate) fn new(pattern: &str, pipe: Arc<Pipe>) -> Result<Self, RouteError> {
        Ok(Self {
            path: PathMatcher::new(pattern)?,
            methods: MethodMatcher::default(),
            pipe,
        })
    }

    /// Restrict this route to the given methods, replacing any previous list.
    ///
    /// An empty list accepts every method.
    pub fn methods(&mut self, methods: impl IntoIterator<Item = Method>) -> &mut Self {
        self.methods = MethodMatcher::new(methods);
        self
    }

    pub fn pattern(&self) -> &str {
        self.path.pattern()
    }

    pub fn allowed_methods(&self) -> &[Method] {
        self.methods.methods()
    }

    pub fn pipe(&self) -> &Arc<Pipe> {
        &self.pipe
    }

    /// Returns true if both the path and the method match.
    pub fn matches(&self, method: &Method, path: &str) -> bool {
        self.path.matches(method, path) && self.methods.matches(method, path)
    }

    pub fn vars(&self, path: &str) -> PathVars {
        self.path.captures(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_methods_replace() {
        let mut route = Route::new("^/h1$", Arc::new(Pipe::new())).unwrap();
        route.methods([Method::GET, Method::POST]);
        route.methods([Method::PUT]);

        assert_eq!(route.allowed_methods(), &[Method::PUT]);
        assert!(route.matches(&Method::PUT, "/h1"));
        assert!(!route.matches(&Method::GET, "/h1"));
    }

    #[test]
    fn test_requires_path_and_method() {
        let mut route = Route::new("^/h1$", Arc::new(Pipe::new())).unwrap();
        route.methods([Method::GET]);

        assert!(route.matches(&Method::GET, "/h1"));
        assert!(!route.matches(&Method::GET, "/h1/x"));
        assert!(!route.matches(&Method::POST, "/h1"));
    }
}
