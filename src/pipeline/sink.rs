//! Response sink handed to every handler of a pipe.
//!
//! # Responsibilities
//! - Buffer the response (status, headers, body) produced by the chain
//! - Flip the bound context's `terminated` flag on status commit
//! - Expose the error side channel of the bound context
//! - Carry per-request extensions from one handler to the next
//!
//! # Design Decisions
//! - Writing body bytes without an explicit status commits `200 OK` but does
//!   not terminate the chain; only `write_header` terminates
//! - Headers are frozen at commit time; later changes are not sent
//! - A second status commit is ignored (and logged), termination stays set

use std::fmt;

use axum::body::Body;
use axum::http::header::{CONTENT_TYPE, X_CONTENT_TYPE_OPTIONS};
use axum::http::{Extensions, HeaderMap, HeaderValue, StatusCode};
use axum::response::Response;
use bytes::{Bytes, BytesMut};

use crate::pipeline::{BoxError, PipeContext};

/// Per-request response writer bound to a [`PipeContext`].
#[derive(Debug, Default)]
pub struct ResponseSink {
    ctx: PipeContext,
    status: Option<StatusCode>,
    headers: HeaderMap,
    sent_headers: Option<HeaderMap>,
    body: BytesMut,
    extensions: Extensions,
}

impl ResponseSink {
    /// Create a sink bound to a fresh context.
    pub fn new() -> Self {
        Self::default()
    }

    /// Headers that will be sent when the status is committed.
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn headers_mut(&mut self) -> &mut HeaderMap {
        &mut self.headers
    }

    /// Commit the response status and headers.
    ///
    /// This terminates the pipe: later handlers only run if they are mandatory.
    pub fn write_header(&mut self, status: StatusCode) {
        self.ctx.terminate();

        if let Some(current) = self.status {
            tracing::warn!(
                current = %current,
                ignored = %status,
                "Superfluous write_header call"
            );
            return;
        }
        self.commit(status);
    }

    /// Append bytes to the response body, committing `200 OK` if no status
    /// was written yet.
    pub fn write(&mut self, data: impl AsRef<[u8]>) {
        if self.status.is_none() {
            self.commit(StatusCode::OK);
        }
        self.body.extend_from_slice(data.as_ref());
    }

    /// Reply with a plain-text error message and the given status.
    pub fn error(&mut self, status: StatusCode, message: &str) {
        self.headers.insert(
            CONTENT_TYPE,
            HeaderValue::from_static("text/plain; charset=utf-8"),
        );
        self.headers
            .insert(X_CONTENT_TYPE_OPTIONS, HeaderValue::from_static("nosniff"));
        self.write_header(status);
        self.write(message);
        self.write("\n");
    }

    fn commit(&mut self, status: StatusCode) {
        self.status = Some(status);
        self.sent_headers = Some(self.headers.clone());
    }

    /// The committed status, if any.
    pub fn status(&self) -> Option<StatusCode> {
        self.status
    }

    pub fn is_committed(&self) -> bool {
        self.status.is_some()
    }

    pub fn is_terminated(&self) -> bool {
        self.ctx.is_terminated()
    }

    /// Record an advisory error for handlers later in the chain.
    pub fn register_error(&mut self, err: impl Into<BoxError>) {
        self.ctx.push_error(err.into());
    }

    /// Errors registered so far during this request.
    pub fn errors(&self) -> &[BoxError] {
        self.ctx.errors()
    }

    pub fn context(&self) -> &PipeContext {
        &self.ctx
    }

    /// Request-scoped values handlers hand to each other.
    pub fn extensions(&self) -> &Extensions {
        &self.extensions
    }

    pub fn extensions_mut(&mut self) -> &mut Extensions {
        &mut self.extensions
    }

    /// Body bytes written so far.
    pub fn body(&self) -> &[u8] {
        &self.body
    }

    /// Build the HTTP response the chain produced.
    pub fn into_response(self) -> Response {
        let headers = self.sent_headers.unwrap_or(self.headers);
        let mut response = Response::new(Body::from(Bytes::from(self.body)));
        *response.status_mut() = self.status.unwrap_or(StatusCode::OK);
        *response.headers_mut() = headers;
        response
    }
}

impl fmt::Write for ResponseSink {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        self.write(s);
        Ok(())
    }
}

/// Register `err` on `sink` if there is one bound; otherwise do nothing.
pub fn register_error(sink: Option<&mut ResponseSink>, err: impl Into<BoxError>) {
    if let Some(sink) = sink {
        sink.register_error(err);
    }
}

/// Errors registered on `sink`, or an empty slice when no sink is bound.
pub fn errors(sink: Option<&ResponseSink>) -> &[BoxError] {
    sink.map(ResponseSink::errors).unwrap_or(&[])
}
