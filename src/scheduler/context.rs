// ============================================================================
// ripple-signals - Scheduler Context
// Ordered, deferred, cancelable execution of queued actions
// ============================================================================
//
// The scheduler state is an explicit, Rc-shared object rather than a hidden
// module-level singleton: signals, computeds, and effects carry a reference
// to the context their notifications ride on. A thread-local default
// instance (see scheduler/mod.rs) backs the free-function surface; isolated
// contexts can be constructed freely, which is how the tests get a clean
// scheduler without cross-talk.
//
// The drain walks the queue by an advancing index cursor over a growable
// buffer, not an iterator snapshot, so tasks enqueued by a running task are
// executed in the same pass. The buffer is cleared only once a pass fully
// drains.
// ============================================================================

use std::cell::{Cell, RefCell};
use std::rc::Rc;
use std::task::{Context, Poll, Waker};

use tracing::{error, trace};

use crate::core::error::{ErrorHandler, SchedulerError};
use crate::scheduler::task::{IntoTaskOutcome, PendingRun, Task, TaskHandle, TaskId, TaskOutcome};

/// Upper bound on tasks executed in a single flush. An effect that keeps
/// rescheduling itself would otherwise spin the drain forever.
const MAX_FLUSH_TASKS: usize = 100_000;

// =============================================================================
// SCHEDULER STATE SNAPSHOT
// =============================================================================

/// Read-only snapshot of a scheduler's queue state.
///
/// Diagnostics and tests only - production logic must not branch on it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchedulerState {
    /// Ids of tasks still sitting in the queue buffer (including entries the
    /// current drain has already consumed; the buffer is cleared at the end
    /// of a fully drained pass).
    pub queued: Vec<TaskId>,
    /// Whether a drain is currently in progress.
    pub flushing: bool,
    /// The drain cursor position.
    pub index: usize,
}

// =============================================================================
// SCHEDULER CONTEXT
// =============================================================================

/// A single-threaded, cooperative task scheduler.
///
/// Owns the deferred task queue, the drain cursor, the pending pool for
/// deferred task results, and the error handler. All mutation happens
/// synchronously inside `enqueue`, `cancel`, and the flush path.
pub struct SchedulerContext {
    queue: RefCell<Vec<Task>>,
    index: Cell<usize>,
    flushing: Cell<bool>,
    /// Set when an enqueue happens while idle; consumed by `tick`.
    flush_scheduled: Cell<bool>,
    next_task_id: Cell<TaskId>,
    /// Deferred task results, polled at the end of each flush and tick.
    pending: RefCell<Vec<PendingRun>>,
    /// None means the default handler (tracing::error!).
    error_handler: RefCell<Option<ErrorHandler>>,
}

impl SchedulerContext {
    /// Create a fresh, isolated scheduler context.
    pub fn new() -> Rc<Self> {
        Rc::new(Self {
            queue: RefCell::new(Vec::new()),
            index: Cell::new(0),
            flushing: Cell::new(false),
            flush_scheduled: Cell::new(false),
            next_task_id: Cell::new(1),
            pending: RefCell::new(Vec::new()),
            error_handler: RefCell::new(None),
        })
    }

    // =========================================================================
    // ENQUEUE / CANCEL
    // =========================================================================

    /// Append a task to the queue. If no flush is in progress or scheduled,
    /// one is scheduled for the next tick.
    ///
    /// The action may return `()`, a `TaskOutcome`, a `Result<(), TaskError>`,
    /// or a `PendingRun` (see [`IntoTaskOutcome`]).
    pub fn enqueue<R>(self: &Rc<Self>, action: impl FnOnce() -> R + 'static) -> TaskHandle
    where
        R: IntoTaskOutcome,
    {
        let id = self.next_task_id.get();
        self.next_task_id.set(id + 1);

        self.queue.borrow_mut().push(Task {
            id,
            canceled: false,
            action: Some(Box::new(move || action().into_task_outcome())),
        });

        if !self.flushing.get() && !self.flush_scheduled.replace(true) {
            trace!(task = id, "flush scheduled for next tick");
        }

        TaskHandle {
            id,
            scheduler: Rc::downgrade(self),
        }
    }

    /// Cancel a queued task. The cancellation check happens immediately
    /// before invocation, so this is valid any time before the task's turn.
    /// After the task has run it is a no-op returning false.
    pub fn cancel(&self, handle: &TaskHandle) -> bool {
        // Drop the action outside the borrow: user closures may own resources
        // whose Drop touches this scheduler.
        let action = {
            let mut queue = self.queue.borrow_mut();
            match queue.iter_mut().find(|t| t.id == handle.id && !t.canceled) {
                Some(task) => {
                    task.canceled = true;
                    task.action.take()
                }
                None => None,
            }
        };

        match action {
            Some(_) => {
                trace!(task = handle.id, "task canceled");
                true
            }
            None => false,
        }
    }

    // =========================================================================
    // FLUSH
    // =========================================================================

    /// Synchronous forced drain: run every eligible queued task now,
    /// including tasks enqueued during this same drain. Re-entrant calls
    /// while a drain is in progress are no-ops.
    ///
    /// # Panics
    ///
    /// Panics if a single flush executes more than `MAX_FLUSH_TASKS` tasks,
    /// which indicates an effect that continuously reschedules itself.
    pub fn flush_sync(&self) {
        if self.flushing.replace(true) {
            return;
        }
        self.flush_scheduled.set(false);

        let mut executed = 0usize;
        loop {
            // Take the next task's parts out of the queue, then release the
            // borrow before running anything: the action may enqueue.
            let next = {
                let mut queue = self.queue.borrow_mut();
                let i = self.index.get();
                if i >= queue.len() {
                    None
                } else {
                    let task = &mut queue[i];
                    Some((task.canceled, task.action.take()))
                }
            };

            let Some((canceled, action)) = next else {
                break;
            };
            self.index.set(self.index.get() + 1);

            if canceled {
                continue;
            }
            let Some(action) = action else {
                continue;
            };

            executed += 1;
            if executed > MAX_FLUSH_TASKS {
                self.flushing.set(false);
                panic!(
                    "flush executed more than {MAX_FLUSH_TASKS} tasks in one drain; \
                     an effect is likely writing to a signal it depends on without \
                     a convergence guard"
                );
            }

            match action() {
                TaskOutcome::Done => {}
                TaskOutcome::Pending(fut) => self.adopt_pending(fut),
                TaskOutcome::Failed(err) => self.report(SchedulerError::Task(err)),
            }
        }

        self.queue.borrow_mut().clear();
        self.index.set(0);
        self.flushing.set(false);
        trace!(tasks = executed, "flush complete");

        self.poll_pending();
    }

    /// The deferred-tick handler. There is no host event loop in Rust, so the
    /// embedder calls this once per turn of its own loop: it drains the queue
    /// if an enqueue scheduled a flush, and otherwise just polls the pending
    /// pool for deferred task results.
    pub fn tick(&self) {
        if self.flush_scheduled.get() {
            self.flush_sync();
        } else {
            self.poll_pending();
        }
    }

    /// Whether an enqueue has scheduled a flush that has not run yet.
    pub fn flush_pending(&self) -> bool {
        self.flush_scheduled.get()
    }

    // =========================================================================
    // PENDING POOL
    // =========================================================================

    /// Adopt a deferred task result. It will be polled with a no-op waker at
    /// the end of each flush and on each tick; the drain never waits for it.
    pub fn adopt_pending(&self, fut: PendingRun) {
        self.pending.borrow_mut().push(fut);
    }

    fn poll_pending(&self) {
        if self.pending.borrow().is_empty() {
            return;
        }

        // Take the pool out so a polled future can adopt new pending work
        // without hitting a borrow conflict.
        let mut pool = self.pending.take();
        let mut cx = Context::from_waker(Waker::noop());

        pool.retain_mut(|fut| match fut.as_mut().poll(&mut cx) {
            Poll::Pending => true,
            Poll::Ready(Ok(())) => false,
            Poll::Ready(Err(err)) => {
                self.report(SchedulerError::Deferred(err));
                false
            }
        });

        self.pending.borrow_mut().extend(pool);
    }

    // =========================================================================
    // ERROR ROUTING
    // =========================================================================

    /// Install the error handler, discarding any previously installed one.
    /// There is exactly one active handler per context.
    pub fn on_error(&self, handler: impl FnMut(SchedulerError) + 'static) {
        *self.error_handler.borrow_mut() = Some(Box::new(handler));
    }

    /// Route a failure to the active handler, or log it if none is installed.
    ///
    /// The handler is taken out for the duration of the call so it may itself
    /// install a replacement; the old handler is restored only if it didn't.
    pub fn report(&self, err: SchedulerError) {
        let taken = self.error_handler.borrow_mut().take();
        match taken {
            Some(mut handler) => {
                handler(err);
                let mut slot = self.error_handler.borrow_mut();
                if slot.is_none() {
                    *slot = Some(handler);
                }
            }
            None => {
                error!(error = %err, cause = %err.cause(), "unhandled reactive failure");
            }
        }
    }

    // =========================================================================
    // INTROSPECTION (tests/diagnostics only)
    // =========================================================================

    /// Snapshot of the queue buffer, flushing flag, and drain cursor.
    pub fn state(&self) -> SchedulerState {
        SchedulerState {
            queued: self.queue.borrow().iter().map(|t| t.id).collect(),
            flushing: self.flushing.get(),
            index: self.index.get(),
        }
    }

    /// Hard reset of queue, cursor, flags, and pending pool. Does not touch
    /// the error handler registration. Test-only.
    pub fn reset(&self) {
        self.queue.borrow_mut().clear();
        self.index.set(0);
        self.flushing.set(false);
        self.flush_scheduled.set(false);
        self.pending.borrow_mut().clear();
    }
}

// =============================================================================
// TESTS
// =============================================================================
