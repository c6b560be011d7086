// ============================================================================
// ripple-signals - Signal Primitive
// The core writable reactive cell
// ============================================================================
//
// A write goes through exactly one path: compare against the current value
// with the signal's equality function, store if different, and enqueue one
// notification task per currently registered subscriber. Delivery is always
// deferred - the subscriber runs on the next flush, reads the then-current
// value, and re-checks its own membership first, so unsubscribing or
// destroying the signal after a write is always safe.
//
// Deliberately NOT coalesced: N distinct-valued writes before a flush enqueue
// N notifications per subscriber, all of which observe the final value. That
// refire behavior is part of the observable contract; do not "fix" it.
// ============================================================================

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use tracing::debug;

use crate::core::equality::{equals, never_equals, safe_equals_f32, safe_equals_f64, EqualsFn};
use crate::core::types::{Observable, Unsubscribe};
use crate::scheduler::context::SchedulerContext;
use crate::scheduler::default_scheduler;

// =============================================================================
// SIGNAL INNER
// =============================================================================

pub(crate) type SubscriberId = u64;

/// The shared cell behind a `Signal<T>` handle.
pub(crate) struct SignalInner<T> {
    value: RefCell<T>,
    equals: EqualsFn<T>,
    subscribers: RefCell<Vec<(SubscriberId, Rc<dyn Fn(&T)>)>>,
    next_subscriber_id: Cell<SubscriberId>,
    destroyed: Cell<bool>,
    scheduler: Rc<SchedulerContext>,
}

impl<T: Clone + 'static> SignalInner<T> {
    /// The single write path. Computes the next value, suppresses the write
    /// entirely if it compares equal, otherwise stores and notifies.
    fn write(self: &Rc<Self>, f: impl FnOnce(&T) -> T) -> bool {
        if self.destroyed.get() {
            return false;
        }

        let next = {
            let current = self.value.borrow();
            f(&current)
        };

        {
            let current = self.value.borrow();
            if (self.equals)(&current, &next) {
                return false;
            }
        }

        *self.value.borrow_mut() = next;
        self.notify_all();
        true
    }

    /// Enqueue one notification task per currently registered subscriber.
    /// Each task captures only (weak cell, subscriber id); the value is read
    /// at execution time.
    fn notify_all(self: &Rc<Self>) {
        let ids: Vec<SubscriberId> = self.subscribers.borrow().iter().map(|(id, _)| *id).collect();
        for id in ids {
            let weak = Rc::downgrade(self);
            self.scheduler.enqueue(move || {
                if let Some(inner) = weak.upgrade() {
                    inner.deliver(id);
                }
            });
        }
    }

    /// Run one enqueued notification. Membership is checked now, not at
    /// enqueue time, so a subscriber removed in the meantime is skipped.
    fn deliver(&self, id: SubscriberId) {
        if self.destroyed.get() {
            return;
        }

        // Clone the callback out and release the borrow before invoking it:
        // the subscriber may write this same signal.
        let callback = self
            .subscribers
            .borrow()
            .iter()
            .find(|(sid, _)| *sid == id)
            .map(|(_, f)| f.clone());

        let Some(callback) = callback else {
            return;
        };

        let value = self.value.borrow().clone();
        callback(&value);
    }
}

// =============================================================================
// SIGNAL<T> - The public signal handle
// =============================================================================

/// A mutable reactive cell holding one value and a set of subscribers that
/// are notified, asynchronously via the scheduler, on every value-changing
/// write.
///
/// # Example
///
/// ```
/// use ripple_signals::{signal, flush_sync};
/// use std::cell::Cell;
/// use std::rc::Rc;
///
/// let count = signal(0);
/// let seen = Rc::new(Cell::new(-1));
///
/// let seen2 = seen.clone();
/// let _unsub = count.subscribe(move |v| seen2.set(*v));
///
/// count.set(5);
/// assert_eq!(seen.get(), -1); // delivery is deferred
///
/// flush_sync();
/// assert_eq!(seen.get(), 5);
/// ```
pub struct Signal<T> {
    inner: Rc<SignalInner<T>>,
}

impl<T> Clone for Signal<T> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<T: Clone + 'static> Signal<T> {
    /// Create a signal on the given scheduler context.
    pub fn new_in(scheduler: Rc<SchedulerContext>, value: T) -> Self
    where
        T: PartialEq,
    {
        Self::with_equals_in(scheduler, value, equals)
    }

    /// Create a signal with a custom equality function on the given
    /// scheduler context.
    pub fn with_equals_in(scheduler: Rc<SchedulerContext>, value: T, equals: EqualsFn<T>) -> Self {
        Self {
            inner: Rc::new(SignalInner {
                value: RefCell::new(value),
                equals,
                subscribers: RefCell::new(Vec::new()),
                next_subscriber_id: Cell::new(1),
                destroyed: Cell::new(false),
                scheduler,
            }),
        }
    }

    /// Get the current value (cloning). Synchronous, no side effects.
    pub fn get(&self) -> T {
        self.inner.value.borrow().clone()
    }

    /// Access the current value with a closure, avoiding the clone.
    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        f(&self.inner.value.borrow())
    }

    /// Replace the value. Returns true if the value actually changed; an
    /// equal write is a complete no-op (no store, no notifications).
    pub fn set(&self, value: T) -> bool {
        self.inner.write(|_| value)
    }

    /// Compute the next value from the current one. Same suppression rule as
    /// [`set`](Self::set).
    ///
    /// # Example
    ///
    /// ```
    /// use ripple_signals::signal;
    ///
    /// let count = signal(10);
    /// assert!(count.update(|n| n + 5));
    /// assert_eq!(count.get(), 15);
    ///
    /// // Producing the same value is a no-op.
    /// assert!(!count.update(|n| *n));
    /// ```
    pub fn update(&self, f: impl FnOnce(&T) -> T) -> bool {
        self.inner.write(f)
    }
}

impl<T: 'static> Signal<T> {
    /// Register a subscriber, returning a closure that removes it.
    ///
    /// Unsubscribing does not cancel notifications already enqueued for this
    /// subscriber; those no-op when they find the membership gone at
    /// execution time.
    pub fn subscribe(&self, f: impl Fn(&T) + 'static) -> Unsubscribe {
        if self.inner.destroyed.get() {
            return Box::new(|| {});
        }

        let id = self.inner.next_subscriber_id.get();
        self.inner.next_subscriber_id.set(id + 1);
        self.inner.subscribers.borrow_mut().push((id, Rc::new(f)));

        let weak = Rc::downgrade(&self.inner);
        Box::new(move || {
            if let Some(inner) = weak.upgrade() {
                inner.subscribers.borrow_mut().retain(|(sid, _)| *sid != id);
            }
        })
    }

    /// Destroy the signal: clears the subscriber set and turns all further
    /// writes into no-ops. Notifications already enqueued silently no-op.
    /// Reading remains valid.
    pub fn destroy(&self) {
        if self.inner.destroyed.replace(true) {
            return;
        }
        self.inner.subscribers.borrow_mut().clear();
        debug!("signal destroyed");
    }

    /// Whether `destroy()` has been called.
    pub fn is_destroyed(&self) -> bool {
        self.inner.destroyed.get()
    }

    /// Number of currently registered subscribers. Diagnostics/tests only.
    pub fn subscriber_count(&self) -> usize {
        self.inner.subscribers.borrow().len()
    }
}

impl<T: std::fmt::Debug + Clone + 'static> std::fmt::Debug for Signal<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Signal").field("value", &self.get()).finish()
    }
}

// =============================================================================
// OBSERVABLE
// =============================================================================

impl<T: Clone + 'static> Observable for Signal<T> {
    fn on_change(&self, notify: Box<dyn Fn()>) -> Unsubscribe {
        self.subscribe(move |_| notify())
    }

    fn scheduler(&self) -> Rc<SchedulerContext> {
        self.inner.scheduler.clone()
    }
}

// =============================================================================
// SIGNAL CREATION FUNCTIONS
// =============================================================================

/// Create a reactive signal on the thread-local default scheduler.
///
/// # Example
///
/// ```
/// use ripple_signals::signal;
///
/// let count = signal(0);
/// count.set(42);
/// assert_eq!(count.get(), 42);
/// ```
pub fn signal<T>(value: T) -> Signal<T>
where
    T: PartialEq + Clone + 'static,
{
    Signal::new_in(default_scheduler(), value)
}

/// Create a signal with a custom equality function.
///
/// # Example
///
/// ```
/// use ripple_signals::signal_with_equals;
///
/// // A signal that never suppresses: every write "changes".
/// let s = signal_with_equals(0, |_, _| false);
/// assert!(s.set(0));
/// ```
pub fn signal_with_equals<T>(value: T, equals: EqualsFn<T>) -> Signal<T>
where
    T: Clone + 'static,
{
    Signal::with_equals_in(default_scheduler(), value, equals)
}

/// Create a signal that treats every write as a change, for values mutated
/// in place or without a meaningful `PartialEq`.
pub fn forced_signal<T>(value: T) -> Signal<T>
where
    T: Clone + 'static,
{
    Signal::with_equals_in(default_scheduler(), value, never_equals)
}

/// Create an `f64` signal with NaN-safe equality (NaN == NaN holds, so a
/// signal stuck at NaN does not notify on every NaN write).
pub fn signal_f64(value: f64) -> Signal<f64> {
    Signal::with_equals_in(default_scheduler(), value, safe_equals_f64)
}

/// Create an `f32` signal with NaN-safe equality.
pub fn signal_f32(value: f32) -> Signal<f32> {
    Signal::with_equals_in(default_scheduler(), value, safe_equals_f32)
}

// =============================================================================
// TESTS
// =============================================================================
