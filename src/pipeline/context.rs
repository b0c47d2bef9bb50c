//! Per-request pipeline state.

use crate::pipeline::BoxError;

/// State shared by every handler of one pipe execution.
///
/// `terminated` only moves from `false` to `true` and `errors` only grows.
/// A new context is created for every request.
#[derive(Debug, Default)]
pub struct PipeContext {
    terminated: bool,
    errors: Vec<BoxError>,
}

impl PipeContext {
    /// Create an empty, non-terminated context.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true once the response status has been committed.
    pub fn is_terminated(&self) -> bool {
        self.terminated
    }

    pub(crate) fn terminate(&mut self) {
        self.terminated = true;
    }

    pub(crate) fn push_error(&mut self, err: BoxError) {
        self.errors.push(err);
    }

    /// Errors registered so far, in registration order.
    pub fn errors(&self) -> &[BoxError] {
        &self.errors
    }
}
