//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! routing / pipeline produce:
//!     → logging.rs (structured tracing events)
//!     → metrics.rs (dispatch and skip counters)
//!
//! Consumers:
//!     → stdout (pretty or JSON)
//!     → Prometheus scrape endpoint (optional)
//! ```
//!
//! # Design Decisions
//! - Structured fields on every event, never preformatted strings
//! - Metric updates are no-ops until a recorder is installed

pub mod logging;
pub mod metrics;
