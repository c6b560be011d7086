// ============================================================================
// ripple-signals - Scheduler Module
// Thread-local default context and the free-function surface
// ============================================================================
//
// Most callers never hold a SchedulerContext directly: signals created via
// `signal()` ride the thread-local default instance, and the free functions
// below delegate to it. Code that wants an isolated scheduler (tests,
// embedders running several independent graphs) constructs its own context
// with `SchedulerContext::new()` and uses the `*_in` constructors.
// ============================================================================

pub mod context;
pub mod task;

pub use context::{SchedulerContext, SchedulerState};
pub use task::{pending, IntoTaskOutcome, PendingRun, TaskHandle, TaskId, TaskOutcome};

use std::rc::Rc;

use crate::core::error::SchedulerError;

thread_local! {
    /// The thread-local default scheduler context.
    static SCHEDULER: Rc<SchedulerContext> = SchedulerContext::new();
}

/// Run a closure with the thread-local default scheduler context.
pub fn with_scheduler<R>(f: impl FnOnce(&Rc<SchedulerContext>) -> R) -> R {
    SCHEDULER.with(f)
}

/// A handle to the thread-local default scheduler context.
pub fn default_scheduler() -> Rc<SchedulerContext> {
    SCHEDULER.with(Rc::clone)
}

// =============================================================================
// CONVENIENCE FUNCTIONS
// =============================================================================

/// Enqueue a task on the default scheduler. See [`SchedulerContext::enqueue`].
pub fn enqueue_task<R>(action: impl FnOnce() -> R + 'static) -> TaskHandle
where
    R: IntoTaskOutcome,
{
    with_scheduler(|ctx| ctx.enqueue(action))
}

/// Cancel a task enqueued on any scheduler. Returns true if the task was
/// still pending. Equivalent to `handle.cancel()`.
pub fn cancel_task(handle: &TaskHandle) -> bool {
    handle.cancel()
}

/// Install the default scheduler's error handler, discarding the previous
/// one. See [`SchedulerContext::on_error`].
pub fn on_scheduler_error(handler: impl FnMut(SchedulerError) + 'static) {
    with_scheduler(|ctx| ctx.on_error(handler));
}

/// Drive one deferred tick of the default scheduler: drains the queue if a
/// flush was scheduled, polls pending deferred results otherwise.
pub fn tick() {
    with_scheduler(|ctx| ctx.tick());
}

/// Forced synchronous drain of the default scheduler.
pub fn flush_sync() {
    with_scheduler(|ctx| ctx.flush_sync());
}

/// Test-only hard reset of the default scheduler's queue state. Does not
/// touch the error handler registration.
pub fn reset_scheduler() {
    with_scheduler(|ctx| ctx.reset());
}

/// Read-only snapshot of the default scheduler's state. Diagnostics and
/// tests only.
pub fn scheduler_state() -> SchedulerState {
    with_scheduler(|ctx| ctx.state())
}

// =============================================================================
// TESTS
// =============================================================================
