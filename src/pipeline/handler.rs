//! The handler capability and its adapters.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use axum::http::Request;
use bytes::Bytes;

use crate::pipeline::ResponseSink;

/// A step of a pipe.
///
/// Handlers are registered once and shared by every request routed to their
/// pipe, so any state they hold must tolerate concurrent calls.
#[async_trait]
pub trait Handler: Send + Sync {
    /// Process the exchange. Committing a status through `sink` terminates
    /// the rest of the pipe for non-mandatory handlers.
    async fn handle(&self, sink: &mut ResponseSink, req: &Request<Bytes>);

    /// Mandatory handlers run even after the pipe has been terminated.
    fn is_mandatory(&self) -> bool {
        false
    }
}

/// A type-erased, shareable handler.
pub type BoxedHandler = Arc<dyn Handler>;

#[async_trait]
impl<H> Handler for Arc<H>
where
    H: Handler + ?Sized,
{
    async fn handle(&self, sink: &mut ResponseSink, req: &Request<Bytes>) {
        (**self).handle(sink, req).await
    }

    fn is_mandatory(&self) -> bool {
        (**self).is_mandatory()
    }
}

/// Wrapper that marks a handler as mandatory.
///
/// Built by [`mandatory`]. The wrapped handler is left untouched, so the same
/// instance can be mandatory in one pipe and optional in another.
#[derive(Debug, Clone)]
pub struct Mandatory<H> {
    inner: H,
}

impl<H> Mandatory<H> {
    /// The wrapped handler.
    pub fn inner(&self) -> &H {
        &self.inner
    }
}

#[async_trait]
impl<H: Handler> Handler for Mandatory<H> {
    async fn handle(&self, sink: &mut ResponseSink, req: &Request<Bytes>) {
        self.inner.handle(sink, req).await
    }

    fn is_mandatory(&self) -> bool {
        true
    }
}

/// Mark `handler` as mandatory.
///
/// Marking twice is the same as marking once.
pub fn mandatory<H: Handler>(handler: H) -> Mandatory<H> {
    Mandatory { inner: handler }
}

/// Adapter turning a plain closure into a non-mandatory [`Handler`].
pub struct FnHandler<F> {
    f: F,
}

impl<F> fmt::Debug for FnHandler<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnHandler").finish_non_exhaustive()
    }
}

/// Wrap a synchronous closure as a handler.
///
/// ```rust,ignore
/// let hello = handler_fn(|w, _req| w.write("hello"));
/// ```
pub fn handler_fn<F>(f: F) -> FnHandler<F>
where
    F: Fn(&mut ResponseSink, &Request<Bytes>) + Send + Sync + 'static,
{
    FnHandler { f }
}

#[async_trait]
impl<F> Handler for FnHandler<F>
where
    F: Fn(&mut ResponseSink, &Request<Bytes>) + Send + Sync,
{
    async fn handle(&self, sink: &mut ResponseSink, req: &Request<Bytes>) {
        (self.f)(sink, req)
    }
}
