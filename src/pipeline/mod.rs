//! Handler pipelines.
//!
//! # Data Flow
//! ```text
//! Matched request (from routing)
//!     → pipe.rs (fresh ResponseSink + PipeContext per request)
//!     → handler.rs (each Handler invoked in registration order)
//!     → sink.rs (first status commit flips `terminated`)
//!     → remaining non-mandatory handlers skipped
//!     → sink converted into the HTTP response
//! ```
//!
//! # Design Decisions
//! - Termination is only ever a side effect of committing the response status
//! - Mandatory handlers run even after termination
//! - Errors registered by handlers are advisory and request-scoped
//! - The context lives inside the sink, so every handler of a chain sees the
//!   same one and nothing leaks between requests

pub mod context;
pub mod handler;
pub mod pipe;
pub mod sink;

pub use context::PipeContext;
pub use handler::{handler_fn, mandatory, BoxedHandler, FnHandler, Handler, Mandatory};
pub use pipe::Pipe;
pub use sink::{errors, register_error, ResponseSink};

/// Error type handlers register through the sink.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;
