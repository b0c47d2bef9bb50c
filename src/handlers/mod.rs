//! Built-in handlers.
//!
//! Ordinary [`Handler`](crate::pipeline::Handler) implementations that plug
//! into pipes like any user handler:
//!
//! - basic.rs: HTTP basic authentication (terminates with 401)
//! - sessions.rs: session cookie issuing (never terminates)
//! - log.rs: access log line + registered errors (usually mandatory)
//! - service.rs: tower service adapter, static file serving

pub mod basic;
pub mod log;
pub mod service;
pub mod sessions;

pub use basic::{AuthError, BasicAuth};
pub use log::{LogFormatError, LogHandler};
pub use service::{static_files, ServiceHandler};
pub use sessions::{SessionError, SessionId, Sessions};
