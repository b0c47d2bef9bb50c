//! Route lookup and dispatch.
//!
//! # Responsibilities
//! - Store compiled routes in registration order
//! - Select the first route whose pattern and method match
//! - Fall back to the default pipe, or `404 page not found`
//!
//! # Design Decisions
//! - Mutated only through `&mut self` during setup; shared via `Arc` while
//!   serving, so dispatch needs no locking
//! - O(n) scan over routes (acceptable for typical route counts)

use std::sync::Arc;

use axum::http::{Method, Request, StatusCode};
use axum::response::{IntoResponse, Response};
use bytes::Bytes;
use tracing::{debug, Instrument};

use crate::observability::metrics;
use crate::pipeline::Pipe;
use crate::routing::{Route, RouteError};

/// Ordered collection of routes plus a default pipe.
#[derive(Debug, Default, Clone)]
pub struct Router {
    routes: Vec<Route>,
    default: Option<Arc<Pipe>>,
}

impl Router {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `pipe` for paths matching the regular expression `pattern`.
    ///
    /// Routes are tried in registration order, so specific patterns must be
    /// registered before general ones. The returned route can be restricted
    /// to some methods with [`Route::methods`].
    pub fn route(
        &mut self,
        pattern: &str,
        pipe: impl Into<Arc<Pipe>>,
    ) -> Result<&mut Route, RouteError> {
        let route = Route::new(pattern, pipe.into())?;
        debug!(pattern = %pattern, "Route registered");
        self.routes.push(route);
        let index = self.routes.len() - 1;
        Ok(&mut self.routes[index])
    }

    /// Set the pipe used when no route matches.
    pub fn set_default(&mut self, pipe: impl Into<Arc<Pipe>>) {
        self.default = Some(pipe.into());
    }

    /// Number of registered routes.
    pub fn route_count(&self) -> usize {
        self.routes.len()
    }

    /// The first route matching `method` and `path`.
    pub fn find(&self, method: &Method, path: &str) -> Option<&Route> {
        self.routes.iter().find(|route| route.matches(method, path))
    }

    /// Route `req` to its pipe and return the response the pipe produced.
    pub async fn dispatch(&self, mut req: Request<Bytes>) -> Response {
        let method = req.method().clone();
        let path = req.uri().path().to_string();

        match self.find(&method, &path) {
            Some(route) => {
                debug!(
                    method = %method,
                    path = %path,
                    pattern = route.pattern(),
                    "Route matched"
                );
                metrics::record_request(route.pattern());

                req.extensions_mut().insert(route.vars(&path));
                let span = tracing::debug_span!("pipe", pattern = route.pattern());
                route.pipe().execute(&req).instrument(span).await
            }
            None => {
                metrics::record_request(metrics::DEFAULT_ROUTE_LABEL);
                match &self.default {
                    Some(pipe) => {
                        debug!(method = %method, path = %path, "No route matched, using default");
                        let span = tracing::debug_span!("pipe", pattern = "default");
                        pipe.execute(&req).instrument(span).await
                    }
                    None => {
                        debug!(method = %method, path = %path, "No route matched");
                        not_found()
                    }
                }
            }
        }
    }
}

fn not_found() -> Response {
    (StatusCode::NOT_FOUND, "404 page not found\n").into_response()
}
