//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming request (method, path)
//!     → router.rs (walk routes in registration order)
//!     → route.rs / matcher.rs (regex path + method allow-list)
//!     → first match: its Pipe; none: default Pipe or 404
//!
//! Route registration (at startup):
//!     pattern
//!     → compile regex (malformed = fatal)
//!     → append Route (registration order = match order)
//!     → optional .methods(..) on the returned route
//!     → Router frozen behind Arc before serving
//! ```
//!
//! # Design Decisions
//! - Routes are compiled at registration, immutable while serving
//! - First match wins; no specificity ranking
//! - A method mismatch means "no match": the scan continues

pub mod matcher;
pub mod route;
pub mod router;

pub use matcher::{Matcher, MethodMatcher, PathMatcher, PathVars};
pub use route::Route;
pub use router::Router;

/// Errors raised while registering routes.
#[derive(Debug, thiserror::Error)]
pub enum RouteError {
    /// The route pattern is not a valid regular expression.
    #[error("invalid route pattern `{pattern}`: {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },
}
