//! Pipe-based HTTP request multiplexer.
//!
//! # Architecture Overview
//!
//! ```text
//!     Client Request
//!     ──────────────▶ http (axum + tower-http layers)
//!                         │  body buffered into Request<Bytes>
//!                         ▼
//!                     routing::Router ── first match in registration order
//!                         │              (else default pipe, else 404)
//!                         ▼
//!                     pipeline::Pipe
//!                         handler → handler → ... → mandatory log
//!                         │  each writes into one ResponseSink
//!                         ▼
//!     Client Response ◀── ResponseSink::into_response
//! ```
//!
//! A handler that commits a status terminates the pipe. Later handlers are
//! skipped unless wrapped with [`mandatory`]. Errors registered along the
//! way stay visible to every later handler of the same request.

// Core subsystems
pub mod pipeline;
pub mod routing;

// Built-in handlers and the demo application
pub mod app;
pub mod handlers;

// Transport and cross-cutting concerns
pub mod config;
pub mod http;
pub mod lifecycle;
pub mod observability;

pub use config::ServerConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
pub use pipeline::{handler_fn, mandatory, Handler, Pipe, ResponseSink};
pub use routing::Router;
