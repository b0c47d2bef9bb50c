//! HTTP transport subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (axum/hyper, tower layers)
//!     → request.rs (request ID assigned and propagated)
//!     → body buffered up to the configured limit
//!     → routing::Router::dispatch
//!     → pipe response sent to client
//! ```

pub mod request;
pub mod server;

pub use request::{UuidRequestId, X_REQUEST_ID};
pub use server::HttpServer;
