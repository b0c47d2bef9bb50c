//! Pipe executor.
//!
//! A [`Pipe`] is an ordered chain of handlers. Every execution gets its own
//! [`ResponseSink`] (and with it its own context); handlers are called in
//! registration order until one commits a status, after which only
//! mandatory handlers still run.

use std::fmt;
use std::sync::Arc;

use axum::http::Request;
use axum::response::Response;
use bytes::Bytes;
use tracing::trace;

use crate::observability::metrics;
use crate::pipeline::{BoxedHandler, Handler, ResponseSink};

/// An ordered chain of handlers bound to one route.
#[derive(Clone, Default)]
pub struct Pipe {
    handlers: Vec<BoxedHandler>,
    name: Option<String>,
}

impl Pipe {
    /// Creates an empty pipe.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets a name used in logs.
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Appends a handler. Handlers run in the order they are added.
    pub fn handler<H: Handler + 'static>(mut self, handler: H) -> Self {
        self.handlers.push(Arc::new(handler));
        self
    }

    /// Appends an already shared handler.
    pub fn handler_boxed(mut self, handler: BoxedHandler) -> Self {
        self.handlers.push(handler);
        self
    }

    /// Appends `handler` if present; an absent handler is left out of the chain.
    pub fn maybe<H: Handler + 'static>(self, handler: Option<H>) -> Self {
        match handler {
            Some(h) => self.handler(h),
            None => {
                trace!(pipe = self.label(), "Absent handler left out of pipe");
                self
            }
        }
    }

    /// Number of handlers in this pipe.
    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    pub fn get_name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    fn label(&self) -> &str {
        self.name.as_deref().unwrap_or("unnamed")
    }

    /// Runs the chain for `req` and returns the finished sink.
    pub async fn run(&self, req: &Request<Bytes>) -> ResponseSink {
        let mut sink = ResponseSink::new();

        for (index, handler) in self.handlers.iter().enumerate() {
            if sink.is_terminated() && !handler.is_mandatory() {
                trace!(
                    pipe = self.label(),
                    handler_index = index,
                    "Pipe terminated, skipping handler"
                );
                metrics::record_skipped_handler();
                continue;
            }

            trace!(
                pipe = self.label(),
                handler_index = index,
                mandatory = handler.is_mandatory(),
                "Executing handler"
            );
            handler.handle(&mut sink, req).await;
        }

        sink
    }

    /// Runs the chain for `req` and builds its response.
    pub async fn execute(&self, req: &Request<Bytes>) -> Response {
        self.run(req).await.into_response()
    }
}

impl fmt::Debug for Pipe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pipe")
            .field("name", &self.name)
            .field("handler_count", &self.handlers.len())
            .finish()
    }
}
