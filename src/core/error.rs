// ============================================================================
// ripple-signals - Error Taxonomy
// Per-task failure isolation routed through a single handler channel
// ============================================================================
//
// A failing reactive computation never halts the rest of the graph: the
// scheduler catches each failure at the task boundary, forwards it to the
// active handler, and keeps draining. There is exactly one active handler
// per scheduler context; installing a new one discards the previous one.
// With no handler installed, failures are logged via `tracing::error!`.
// ============================================================================

use thiserror::Error;

// =============================================================================
// TYPE ALIASES
// =============================================================================

/// Error produced by a user-supplied task action, effect body, or
/// computed recomputation.
pub type TaskError = Box<dyn std::error::Error>;

/// The scheduler's error handler. One active handler per context.
pub type ErrorHandler = Box<dyn FnMut(SchedulerError)>;

// =============================================================================
// SCHEDULER ERROR
// =============================================================================

/// A failure observed by the scheduler while driving the reactive graph.
///
/// Each variant identifies *where* in the lifecycle the failure surfaced;
/// the underlying cause is the wrapped [`TaskError`].
#[derive(Error, Debug)]
pub enum SchedulerError {
    /// A task action failed synchronously during a drain.
    #[error("scheduled task failed")]
    Task(#[source] TaskError),

    /// A task's deferred result failed after the drain had moved on.
    #[error("deferred task result failed")]
    Deferred(#[source] TaskError),

    /// An effect body failed during a run or re-run.
    #[error("effect run failed")]
    Effect(#[source] TaskError),

    /// A computed's recomputation failed inside a scheduled notification.
    /// The computed keeps its previous value.
    #[error("computed recomputation failed")]
    Recompute(#[source] TaskError),
}

impl SchedulerError {
    /// The underlying cause supplied by user code.
    pub fn cause(&self) -> &(dyn std::error::Error + 'static) {
        match self {
            Self::Task(e) | Self::Deferred(e) | Self::Effect(e) | Self::Recompute(e) => &**e,
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::fmt;

    #[derive(Debug)]
    struct Boom;

    impl fmt::Display for Boom {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(f, "boom")
        }
    }

    impl std::error::Error for Boom {}

    #[test]
    fn display_names_the_lifecycle_stage() {
        let err = SchedulerError::Task(Box::new(Boom));
        assert_eq!(err.to_string(), "scheduled task failed");

        let err = SchedulerError::Deferred(Box::new(Boom));
        assert_eq!(err.to_string(), "deferred task result failed");
    }

    #[test]
    fn cause_exposes_the_user_error() {
        let err = SchedulerError::Effect(Box::new(Boom));
        assert_eq!(err.cause().to_string(), "boom");
    }

    #[test]
    fn source_chain_reaches_the_user_error() {
        use std::error::Error;

        let err = SchedulerError::Recompute(Box::new(Boom));
        let source = err.source().expect("has a source");
        assert_eq!(source.to_string(), "boom");
    }
}
