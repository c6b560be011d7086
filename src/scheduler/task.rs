// ============================================================================
// ripple-signals - Tasks
// Queue entries, handles, and action outcomes
// ============================================================================

use std::future::Future;
use std::pin::Pin;
use std::rc::Weak;

use crate::core::error::TaskError;
use crate::scheduler::context::SchedulerContext;

// =============================================================================
// TASK ID
// =============================================================================

/// Identifier of a queued task, unique per scheduler context.
pub type TaskId = u64;

// =============================================================================
// OUTCOMES
// =============================================================================

/// A deferred task result. The drain loop never waits for one: it is adopted
/// into the scheduler's pending pool and polled (with a no-op waker) at the
/// end of each flush and tick. A failure is routed to the error handler as
/// `SchedulerError::Deferred`.
pub type PendingRun = Pin<Box<dyn Future<Output = Result<(), TaskError>>>>;

/// Box a future as a [`PendingRun`].
pub fn pending(fut: impl Future<Output = Result<(), TaskError>> + 'static) -> PendingRun {
    Box::pin(fut)
}

/// What a task action produced.
pub enum TaskOutcome {
    /// The action completed synchronously.
    Done,
    /// The action started deferred work; its failure, if any, will surface
    /// through the error handler when the pending pool is polled.
    Pending(PendingRun),
    /// The action failed synchronously. Routed to the error handler; the
    /// drain continues with the next task.
    Failed(TaskError),
}

/// Conversion into [`TaskOutcome`], so plain `()`-returning closures,
/// `Result`-returning closures, and future-spawning closures can all be
/// enqueued without wrapping.
pub trait IntoTaskOutcome {
    fn into_task_outcome(self) -> TaskOutcome;
}

impl IntoTaskOutcome for () {
    fn into_task_outcome(self) -> TaskOutcome {
        TaskOutcome::Done
    }
}

impl IntoTaskOutcome for TaskOutcome {
    fn into_task_outcome(self) -> TaskOutcome {
        self
    }
}

impl IntoTaskOutcome for Result<(), TaskError> {
    fn into_task_outcome(self) -> TaskOutcome {
        match self {
            Ok(()) => TaskOutcome::Done,
            Err(e) => TaskOutcome::Failed(e),
        }
    }
}

impl IntoTaskOutcome for PendingRun {
    fn into_task_outcome(self) -> TaskOutcome {
        TaskOutcome::Pending(self)
    }
}

// =============================================================================
// TASK
// =============================================================================

/// Boxed task action, stored in the queue until consumed or canceled.
pub(crate) type TaskAction = Box<dyn FnOnce() -> TaskOutcome>;

/// One queued unit of work. Lives only inside a scheduler's queue: created by
/// `enqueue`, consumed by the drain, or emptied by `cancel`.
pub(crate) struct Task {
    pub(crate) id: TaskId,
    pub(crate) canceled: bool,
    /// Taken (set to None) when the task is consumed or canceled.
    pub(crate) action: Option<TaskAction>,
}

// =============================================================================
// TASK HANDLE
// =============================================================================

/// Cancellable handle to a queued task.
///
/// Holds only the task id and a weak reference to its scheduler, so handles
/// can outlive both the task and the context.
#[derive(Clone)]
pub struct TaskHandle {
    pub(crate) id: TaskId,
    pub(crate) scheduler: Weak<SchedulerContext>,
}

impl TaskHandle {
    /// The id of the task this handle refers to.
    pub fn id(&self) -> TaskId {
        self.id
    }

    /// Cancel the task if it has not run yet. Returns true if a pending task
    /// was actually canceled; false if it already ran, was already canceled,
    /// or its scheduler is gone.
    pub fn cancel(&self) -> bool {
        match self.scheduler.upgrade() {
            Some(ctx) => ctx.cancel(self),
            None => false,
        }
    }
}

impl std::fmt::Debug for TaskHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TaskHandle").field("id", &self.id).finish()
    }
}

// =============================================================================
// TESTS
// =============================================================================
