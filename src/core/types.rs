// ============================================================================
// ripple-signals - Shared Types
// Type aliases and the type-erased dependency seam
// ============================================================================
//
// Computeds and effects hold heterogeneous source lists: a Signal<i32> and a
// Computed<String> must sit in the same Vec. Dependency wiring never needs
// the value type T - a source only has to deliver "something changed" pings
// and name the scheduler its notifications ride on. Observable captures
// exactly that, so concrete Signal<T>/Computed<T> stay fully typed while the
// graph plumbing is erased.
// ============================================================================

use std::rc::Rc;

use crate::scheduler::context::SchedulerContext;

// =============================================================================
// TYPE ALIASES
// =============================================================================

/// Removes a subscription when called. Calling it after the source was
/// destroyed is a safe no-op.
pub type Unsubscribe = Box<dyn FnOnce()>;

/// Cleanup function returned by an effect body; runs before the next re-run
/// and once more on disposal.
pub type CleanupFn = Box<dyn FnOnce()>;

// =============================================================================
// OBSERVABLE
// =============================================================================

/// A type-erased reactive source that computeds and effects can depend on.
///
/// Implemented by `Signal<T>` and `Computed<T>`. The `notify` callback is
/// value-less: dependents close over their typed sources and re-read them
/// when pinged, so notifications always observe the then-current value.
pub trait Observable {
    /// Register a change listener. The listener is invoked from a scheduled
    /// notification task, never synchronously from the write.
    fn on_change(&self, notify: Box<dyn Fn()>) -> Unsubscribe;

    /// The scheduler this source enqueues its notifications on. Dependents
    /// adopt it so a graph built on an isolated context stays on it.
    fn scheduler(&self) -> Rc<SchedulerContext>;
}
