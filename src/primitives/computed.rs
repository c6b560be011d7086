// ============================================================================
// ripple-signals - Computed Primitive
// A read-only cell derived from explicit source signals
// ============================================================================
//
// A computed is signal-shaped: it owns an internal Signal<T> cell and exposes
// only the reading half of its surface. Construction seeds the cell by
// invoking the compute function synchronously, so a fresh computed is
// immediately readable with a correct value - no flush needed.
//
// Each source notification re-invokes the compute function and pushes the
// result through the cell's normal write path. The cell's equality check is
// the second suppression layer: a source change whose recomputation yields
// the same derived value is absorbed here and never forwarded downstream.
// ============================================================================

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use tracing::debug;

use crate::core::equality::{equals, EqualsFn};
use crate::core::error::{SchedulerError, TaskError};
use crate::core::types::{Observable, Unsubscribe};
use crate::primitives::signal::Signal;
use crate::scheduler::context::SchedulerContext;
use crate::scheduler::default_scheduler;

// =============================================================================
// COMPUTED INNER
// =============================================================================

struct ComputedInner<T: 'static> {
    /// The derived value, exposed read-only. Its equality check is the
    /// second suppression layer.
    cell: Signal<T>,
    compute: Box<dyn Fn() -> Result<T, TaskError>>,
    /// Unsubscribe handles for every source; emptied on destroy.
    links: RefCell<Vec<Unsubscribe>>,
    destroyed: Cell<bool>,
}

impl<T: Clone + 'static> ComputedInner<T> {
    /// Recompute in response to a source notification. Runs inside a
    /// scheduled task; a failure is routed to the scheduler error handler
    /// and the previous value is retained.
    fn refresh(&self) {
        if self.destroyed.get() {
            return;
        }
        match (self.compute)() {
            // The cell's write path suppresses unchanged results.
            Ok(value) => {
                self.cell.set(value);
            }
            Err(err) => {
                self.cell.scheduler().report(SchedulerError::Recompute(err));
            }
        }
    }

    fn destroy(&self) {
        if self.destroyed.replace(true) {
            return;
        }
        // Detach from every source before clearing our own subscribers, so
        // no upstream signal is left holding a subscription to us.
        let links = std::mem::take(&mut *self.links.borrow_mut());
        for unsubscribe in links {
            unsubscribe();
        }
        self.cell.destroy();
        debug!("computed destroyed");
    }
}

impl<T: 'static> Drop for ComputedInner<T> {
    fn drop(&mut self) {
        if self.destroyed.get() {
            return;
        }
        // Detach from sources; the cell and its subscriber set are dropped
        // with us, so only the upstream side needs explicit cleanup.
        let links = std::mem::take(&mut *self.links.borrow_mut());
        for unsubscribe in links {
            unsubscribe();
        }
        self.cell.destroy();
    }
}

// =============================================================================
// COMPUTED<T> - The public handle
// =============================================================================

/// A read-only signal whose value is derived from explicit source signals.
///
/// Exposes the reading subset of the [`Signal`] contract: `get`, `with`,
/// `subscribe`, `destroy`. Dropping the last handle destroys it.
///
/// # Example
///
/// ```
/// use ripple_signals::{computed, signal};
///
/// let a = signal(1);
/// let b = signal(2);
///
/// let sum = {
///     let (a2, b2) = (a.clone(), b.clone());
///     computed(&[&a, &b], move || a2.get() + b2.get())
/// };
///
/// // Seeded synchronously, readable before any flush.
/// assert_eq!(sum.get(), 3);
/// ```
pub struct Computed<T: 'static> {
    inner: Rc<ComputedInner<T>>,
}

impl<T: 'static> Clone for Computed<T> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<T: Clone + 'static> Computed<T> {
    /// Create a computed on an explicit scheduler context. Seeds the value
    /// synchronously; a seed failure propagates to the caller.
    pub fn try_new_in(
        scheduler: Rc<SchedulerContext>,
        sources: &[&dyn Observable],
        equals: EqualsFn<T>,
        compute: impl Fn() -> Result<T, TaskError> + 'static,
    ) -> Result<Self, TaskError> {
        let seed = compute()?;
        let inner = Rc::new(ComputedInner {
            cell: Signal::with_equals_in(scheduler, seed, equals),
            compute: Box::new(compute),
            links: RefCell::new(Vec::new()),
            destroyed: Cell::new(false),
        });

        let mut links = inner.links.borrow_mut();
        for source in sources {
            let weak = Rc::downgrade(&inner);
            links.push(source.on_change(Box::new(move || {
                if let Some(inner) = weak.upgrade() {
                    inner.refresh();
                }
            })));
        }
        drop(links);

        Ok(Self { inner })
    }

    /// Get the current derived value (cloning).
    pub fn get(&self) -> T {
        self.inner.cell.get()
    }

    /// Access the current derived value with a closure.
    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        self.inner.cell.with(f)
    }

    /// Subscribe to changes of the derived value. Only recomputations that
    /// actually change the value reach subscribers.
    pub fn subscribe(&self, f: impl Fn(&T) + 'static) -> Unsubscribe {
        self.inner.cell.subscribe(f)
    }

    /// Destroy the computed: unsubscribes from every source, then clears
    /// its own subscribers. Idempotent.
    pub fn destroy(&self) {
        self.inner.destroy();
    }

    /// Whether `destroy()` has been called.
    pub fn is_destroyed(&self) -> bool {
        self.inner.destroyed.get()
    }

    /// Number of downstream subscribers. Diagnostics/tests only.
    pub fn subscriber_count(&self) -> usize {
        self.inner.cell.subscriber_count()
    }
}

impl<T: std::fmt::Debug + Clone + 'static> std::fmt::Debug for Computed<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Computed").field("value", &self.get()).finish()
    }
}

// =============================================================================
// OBSERVABLE
// =============================================================================

impl<T: Clone + 'static> Observable for Computed<T> {
    fn on_change(&self, notify: Box<dyn Fn()>) -> Unsubscribe {
        self.inner.cell.subscribe(move |_| notify())
    }

    fn scheduler(&self) -> Rc<SchedulerContext> {
        self.inner.cell.scheduler()
    }
}

// =============================================================================
// COMPUTED CREATION FUNCTIONS
// =============================================================================

/// The scheduler a dependent of `sources` should live on: the first source's
/// context, or the thread-local default when there are no sources.
pub(crate) fn scheduler_of(sources: &[&dyn Observable]) -> Rc<SchedulerContext> {
    match sources.first() {
        Some(source) => source.scheduler(),
        None => default_scheduler(),
    }
}

/// Create a computed cell from explicit sources and a pure derivation.
///
/// # Example
///
/// ```
/// use ripple_signals::{computed, signal, flush_sync};
///
/// let count = signal(1);
/// let even = {
///     let c = count.clone();
///     computed(&[&count], move || c.get() % 2 == 0)
/// };
/// assert!(!even.get());
///
/// count.set(3); // still odd: recomputes, but forwards nothing
/// flush_sync();
/// assert!(!even.get());
/// ```
pub fn computed<T>(sources: &[&dyn Observable], compute: impl Fn() -> T + 'static) -> Computed<T>
where
    T: PartialEq + Clone + 'static,
{
    match Computed::try_new_in(scheduler_of(sources), sources, equals, move || Ok(compute())) {
        Ok(c) => c,
        // The compute function is infallible; the seed cannot fail.
        Err(_) => unreachable!("infallible compute failed"),
    }
}

/// Create a computed with a custom equality rule for the suppression layer.
pub fn computed_with_equals<T>(
    sources: &[&dyn Observable],
    equals: EqualsFn<T>,
    compute: impl Fn() -> T + 'static,
) -> Computed<T>
where
    T: Clone + 'static,
{
    match Computed::try_new_in(scheduler_of(sources), sources, equals, move || Ok(compute())) {
        Ok(c) => c,
        Err(_) => unreachable!("infallible compute failed"),
    }
}

/// Create a computed whose derivation can fail.
///
/// Seeding is synchronous, so a failure during construction propagates to
/// the caller. A failure during a scheduled recomputation is routed to the
/// scheduler's error handler and the previous value is retained.
pub fn try_computed<T>(
    sources: &[&dyn Observable],
    compute: impl Fn() -> Result<T, TaskError> + 'static,
) -> Result<Computed<T>, TaskError>
where
    T: PartialEq + Clone + 'static,
{
    Computed::try_new_in(scheduler_of(sources), sources, equals, compute)
}

// =============================================================================
// TESTS
// =============================================================================
