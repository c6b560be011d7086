// ============================================================================
// ripple-signals - Effect Primitive
// Side effects with a run/cleanup lifecycle, re-run on dependency change
// ============================================================================
//
// State machine: Active -> (re-run)* -> Disposed. Construction subscribes to
// every source and then runs the body once, synchronously - a fresh effect
// has observable results before the caller's next line. Each source
// notification (delivered as a deferred task) re-runs the body: the previous
// cleanup runs first, then the body, and whatever it returns becomes the new
// cleanup. Notifications are not coalesced, so an effect with two
// dependencies that both changed before a flush re-runs once per triggering
// notification.
//
// The body may hand back deferred work (a PendingRun). The engine does not
// await it; the scheduler's pending pool polls it and routes a failure to
// the error handler, exactly like an asynchronous task failure.
// ============================================================================

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use tracing::debug;

use crate::core::error::{SchedulerError, TaskError};
use crate::core::types::{CleanupFn, Observable, Unsubscribe};
use crate::primitives::computed::scheduler_of;
use crate::scheduler::context::SchedulerContext;
use crate::scheduler::task::PendingRun;

// =============================================================================
// EFFECT OUTCOME
// =============================================================================

/// What one effect run produced.
pub enum EffectOutcome {
    /// Nothing to pair with this run.
    Done,
    /// A cleanup to invoke before the next run and once more on disposal.
    Cleanup(CleanupFn),
    /// Deferred work; its eventual failure reaches the scheduler's error
    /// handler. Any cleanup must be managed by the caller (e.g. by closing
    /// over mutable state), not by the effect engine.
    Pending(PendingRun),
    /// The run failed. Routed to the scheduler's error handler.
    Failed(TaskError),
}

/// Conversion into [`EffectOutcome`], so effect bodies can return `()`,
/// an optional cleanup, a bare cleanup, a `Result`, or deferred work.
pub trait IntoEffectOutcome {
    fn into_effect_outcome(self) -> EffectOutcome;
}

impl IntoEffectOutcome for () {
    fn into_effect_outcome(self) -> EffectOutcome {
        EffectOutcome::Done
    }
}

impl IntoEffectOutcome for EffectOutcome {
    fn into_effect_outcome(self) -> EffectOutcome {
        self
    }
}

impl IntoEffectOutcome for CleanupFn {
    fn into_effect_outcome(self) -> EffectOutcome {
        EffectOutcome::Cleanup(self)
    }
}

impl IntoEffectOutcome for Option<CleanupFn> {
    fn into_effect_outcome(self) -> EffectOutcome {
        match self {
            Some(cleanup) => EffectOutcome::Cleanup(cleanup),
            None => EffectOutcome::Done,
        }
    }
}

impl IntoEffectOutcome for Result<(), TaskError> {
    fn into_effect_outcome(self) -> EffectOutcome {
        match self {
            Ok(()) => EffectOutcome::Done,
            Err(e) => EffectOutcome::Failed(e),
        }
    }
}

impl IntoEffectOutcome for PendingRun {
    fn into_effect_outcome(self) -> EffectOutcome {
        EffectOutcome::Pending(self)
    }
}

/// Boxed effect body.
pub type EffectFn = Box<dyn FnMut() -> EffectOutcome>;

// =============================================================================
// EFFECT INNER
// =============================================================================

struct EffectInner {
    func: RefCell<EffectFn>,
    /// Cleanup from the last run; taken before the next run and on disposal.
    cleanup: RefCell<Option<CleanupFn>>,
    /// Unsubscribe handles for every source; emptied on disposal.
    links: RefCell<Vec<Unsubscribe>>,
    disposed: Cell<bool>,
    scheduler: Rc<SchedulerContext>,
}

impl EffectInner {
    /// One run of the body: previous cleanup first, then the body, then file
    /// the outcome. No-op once disposed, which also covers notifications
    /// that were already in flight when `dispose` ran.
    fn run(&self) {
        if self.disposed.get() {
            return;
        }

        // Take the cleanup out before calling it; it may touch this effect.
        let previous = self.cleanup.borrow_mut().take();
        if let Some(cleanup) = previous {
            cleanup();
        }

        let outcome = (self.func.borrow_mut())();
        match outcome {
            EffectOutcome::Done => {}
            EffectOutcome::Cleanup(cleanup) => {
                *self.cleanup.borrow_mut() = Some(cleanup);
            }
            EffectOutcome::Pending(fut) => self.scheduler.adopt_pending(fut),
            EffectOutcome::Failed(err) => self.scheduler.report(SchedulerError::Effect(err)),
        }
    }

    /// Idempotent teardown: last cleanup once, detach from all sources,
    /// mark disposed.
    fn dispose(&self) {
        if self.disposed.replace(true) {
            return;
        }

        let last = self.cleanup.borrow_mut().take();
        if let Some(cleanup) = last {
            cleanup();
        }
        let links = std::mem::take(&mut *self.links.borrow_mut());
        for unsubscribe in links {
            unsubscribe();
        }
        debug!("effect disposed");
    }
}

impl Drop for EffectInner {
    fn drop(&mut self) {
        self.dispose();
    }
}

// =============================================================================
// EFFECT - The public handle
// =============================================================================

/// Handle to a running effect. Disposing it - explicitly or by dropping the
/// last handle - runs the final cleanup and detaches from every source.
///
/// # Example
///
/// ```
/// use ripple_signals::{effect, signal, flush_sync};
/// use std::cell::Cell;
/// use std::rc::Rc;
///
/// let count = signal(0);
/// let runs = Rc::new(Cell::new(0));
///
/// let fx = {
///     let (c, runs) = (count.clone(), runs.clone());
///     effect(&[&count], move || {
///         let _ = c.get();
///         runs.set(runs.get() + 1);
///     })
/// };
///
/// // One synchronous initial run, before any flush.
/// assert_eq!(runs.get(), 1);
///
/// count.set(1);
/// flush_sync();
/// assert_eq!(runs.get(), 2);
///
/// fx.dispose();
/// count.set(2);
/// flush_sync();
/// assert_eq!(runs.get(), 2);
/// ```
pub struct Effect {
    inner: Rc<EffectInner>,
}

impl Effect {
    /// Dispose the effect: run the last cleanup (once), unsubscribe from
    /// every source, and ignore any notification still in flight. No-op if
    /// already disposed.
    pub fn dispose(&self) {
        self.inner.dispose();
    }

    /// Whether the effect has been disposed.
    pub fn is_disposed(&self) -> bool {
        self.inner.disposed.get()
    }
}

impl Clone for Effect {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

// =============================================================================
// EFFECT CREATION FUNCTIONS
// =============================================================================

/// Create an effect on an explicit scheduler context.
///
/// Subscribes to every source, then performs one synchronous initial run.
pub fn effect_in<R>(
    scheduler: Rc<SchedulerContext>,
    sources: &[&dyn Observable],
    mut f: impl FnMut() -> R + 'static,
) -> Effect
where
    R: IntoEffectOutcome,
{
    let inner = Rc::new(EffectInner {
        func: RefCell::new(Box::new(move || f().into_effect_outcome())),
        cleanup: RefCell::new(None),
        links: RefCell::new(Vec::new()),
        disposed: Cell::new(false),
        scheduler,
    });

    {
        let mut links = inner.links.borrow_mut();
        for source in sources {
            let weak = Rc::downgrade(&inner);
            links.push(source.on_change(Box::new(move || {
                if let Some(inner) = weak.upgrade() {
                    inner.run();
                }
            })));
        }
    }

    // Initial run is synchronous: the effect reflects the current dependency
    // values before this function returns.
    inner.run();

    Effect { inner }
}

/// Create an effect over explicit sources. Lives on the first source's
/// scheduler, or the thread-local default when there are no sources.
///
/// The body may return `()`, `Option<CleanupFn>`, a bare cleanup, a
/// `Result<(), TaskError>`, or a [`PendingRun`] - see [`IntoEffectOutcome`].
pub fn effect<R>(sources: &[&dyn Observable], f: impl FnMut() -> R + 'static) -> Effect
where
    R: IntoEffectOutcome,
{
    effect_in(scheduler_of(sources), sources, f)
}

/// Create an effect whose body returns an optional cleanup, run before each
/// re-run and once more on disposal.
///
/// # Example
///
/// ```
/// use ripple_signals::{effect_with_cleanup, signal, flush_sync, CleanupFn};
/// use std::cell::Cell;
/// use std::rc::Rc;
///
/// let conn = signal("a");
/// let closed = Rc::new(Cell::new(0));
///
/// let fx = {
///     let closed = closed.clone();
///     effect_with_cleanup(&[&conn], move || {
///         let closed = closed.clone();
///         Some(Box::new(move || closed.set(closed.get() + 1)) as CleanupFn)
///     })
/// };
///
/// conn.set("b");
/// flush_sync(); // re-run: previous cleanup fires first
/// assert_eq!(closed.get(), 1);
///
/// fx.dispose(); // final cleanup
/// assert_eq!(closed.get(), 2);
/// ```
pub fn effect_with_cleanup(
    sources: &[&dyn Observable],
    f: impl FnMut() -> Option<CleanupFn> + 'static,
) -> Effect {
    effect(sources, f)
}

// =============================================================================
// TESTS
// =============================================================================
