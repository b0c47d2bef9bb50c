//! Tower service adapter.
//!
//! Lets any `tower::Service` producing HTTP responses (for example
//! `tower_http::services::ServeDir`) take part in a pipe. The service's
//! response is committed into the sink, so the pipe terminates after it.
//!
//! The response body is buffered in full before it is committed. Bodies
//! larger than [`ServiceHandler::max_body_bytes`] are refused with `500`.

use async_trait::async_trait;
use axum::body::{Body, HttpBody};
use axum::http::uri::PathAndQuery;
use axum::http::{Request, Response, StatusCode, Uri};
use bytes::Bytes;
use tower::{Service, ServiceExt};
use tower_http::services::ServeDir;

use crate::pipeline::{BoxError, Handler, ResponseSink};

/// Default cap on buffered response bodies (16 MiB).
pub const DEFAULT_MAX_BODY_BYTES: usize = 16 * 1024 * 1024;

/// Handler backed by a tower service.
#[derive(Debug, Clone)]
pub struct ServiceHandler<S> {
    service: S,
    strip_prefix: Option<String>,
    max_body_bytes: usize,
}

impl<S> ServiceHandler<S> {
    pub fn new(service: S) -> Self {
        Self {
            service,
            strip_prefix: None,
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
        }
    }

    /// Largest response body the handler buffers.
    pub fn max_body_bytes(mut self, limit: usize) -> Self {
        self.max_body_bytes = limit;
        self
    }

    /// Remove `prefix` from the request path before calling the service.
    pub fn strip_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.strip_prefix = Some(prefix.into());
        self
    }

    fn forward_request(&self, req: &Request<Bytes>) -> Option<Request<Body>> {
        let uri = match &self.strip_prefix {
            Some(prefix) => strip_uri_prefix(req.uri(), prefix)?,
            None => req.uri().clone(),
        };

        let mut out = Request::new(Body::from(req.body().clone()));
        *out.method_mut() = req.method().clone();
        *out.uri_mut() = uri;
        *out.version_mut() = req.version();
        *out.headers_mut() = req.headers().clone();
        *out.extensions_mut() = req.extensions().clone();
        Some(out)
    }
}

/// Serve files below `dir` for paths under `prefix`.
///
/// Files are read into memory whole; pair with [`ServiceHandler::max_body_bytes`]
/// to bound the memory a single request can take.
pub fn static_files(prefix: &str, dir: &str) -> ServiceHandler<ServeDir> {
    ServiceHandler::new(ServeDir::new(dir)).strip_prefix(prefix)
}

#[async_trait]
impl<S, B> Handler for ServiceHandler<S>
where
    S: Service<Request<Body>, Response = Response<B>> + Clone + Send + Sync + 'static,
    S::Future: Send,
    S::Error: Into<BoxError>,
    B: HttpBody<Data = Bytes> + Send + 'static,
    B::Error: Into<BoxError>,
{
    async fn handle(&self, sink: &mut ResponseSink, req: &Request<Bytes>) {
        let Some(forward) = self.forward_request(req) else {
            sink.error(StatusCode::NOT_FOUND, "404 page not found");
            return;
        };

        let response = match self.service.clone().oneshot(forward).await {
            Ok(response) => response,
            Err(err) => {
                sink.error(StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error");
                sink.register_error(err);
                return;
            }
        };

        let (parts, body) = response.into_parts();
        let bytes = match axum::body::to_bytes(Body::new(body), self.max_body_bytes).await {
            Ok(bytes) => bytes,
            Err(err) => {
                tracing::warn!(
                    path = %req.uri().path(),
                    limit = self.max_body_bytes,
                    error = %err,
                    "Failed to buffer service response"
                );
                sink.error(StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error");
                sink.register_error(err);
                return;
            }
        };

        for (name, value) in parts.headers.iter() {
            sink.headers_mut().append(name.clone(), value.clone());
        }
        sink.write_header(parts.status);
        sink.write(bytes);
    }
}

fn strip_uri_prefix(uri: &Uri, prefix: &str) -> Option<Uri> {
    let prefix = prefix.trim_end_matches('/');
    let rest = uri.path().strip_prefix(prefix)?;
    if !rest.is_empty() && !rest.starts_with('/') {
        return None;
    }
    let path = if rest.is_empty() { "/" } else { rest };

    let path_and_query = match uri.query() {
        Some(query) => format!("{path}?{query}"),
        None => path.to_string(),
    };
    let mut parts = uri.clone().into_parts();
    parts.path_and_query = Some(path_and_query.parse::<PathAndQuery>().ok()?);
    Uri::from_parts(parts).ok()
}
