// ============================================================================
// ripple-signals - Deferred-Propagation Reactive Signals for Rust
// ============================================================================
//
// A reactive state core built around an explicit cooperative scheduler:
// writes never notify inline. Changing a signal enqueues one task per
// subscriber, and the embedder drains the queue with `tick()` (or forces it
// with `flush_sync()`). Signals are mutable cells with equality suppression,
// computeds derive values from explicit sources with a second suppression
// layer, and effects pair each run with an optional cleanup.
// ============================================================================

pub mod core;
pub mod primitives;
pub mod scheduler;

// Re-export core items at crate root for ergonomic access
pub use crate::core::equality::{
    always_equals, equals, never_equals, safe_equals_f32, safe_equals_f64, EqualsFn,
};
pub use crate::core::error::{ErrorHandler, SchedulerError, TaskError};
pub use crate::core::types::{CleanupFn, Observable, Unsubscribe};

// Re-export primitives at crate root
pub use primitives::computed::{computed, computed_with_equals, try_computed, Computed};
pub use primitives::effect::{
    effect, effect_in, effect_with_cleanup, Effect, EffectFn, EffectOutcome, IntoEffectOutcome,
};
pub use primitives::signal::{
    forced_signal, signal, signal_f32, signal_f64, signal_with_equals, Signal,
};

// Re-export the scheduler surface
pub use scheduler::context::{SchedulerContext, SchedulerState};
pub use scheduler::task::{pending, IntoTaskOutcome, PendingRun, TaskHandle, TaskId, TaskOutcome};
pub use scheduler::{
    cancel_task, default_scheduler, enqueue_task, flush_sync, on_scheduler_error, reset_scheduler,
    scheduler_state, tick, with_scheduler,
};

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::{Cell, RefCell};
    use std::rc::Rc;

    // =========================================================================
    // End-to-end propagation scenarios on a private context
    // =========================================================================

    #[test]
    fn write_propagates_through_computed_to_effect_in_one_flush() {
        let ctx = SchedulerContext::new();
        let base = Signal::new_in(ctx.clone(), 2);
        let squared = {
            let b = base.clone();
            Computed::try_new_in(ctx.clone(), &[&base], equals, move || Ok(b.get() * b.get()))
                .unwrap()
        };

        let seen = Rc::new(RefCell::new(Vec::new()));
        let _fx = {
            let (sq, seen) = (squared.clone(), seen.clone());
            effect_in(ctx.clone(), &[&squared], move || {
                seen.borrow_mut().push(sq.get());
            })
        };
        assert_eq!(*seen.borrow(), vec![4]);

        base.set(3);
        // Nothing moves until the drain.
        assert_eq!(squared.get(), 4);
        assert_eq!(*seen.borrow(), vec![4]);

        ctx.flush_sync();
        assert_eq!(squared.get(), 9);
        assert_eq!(*seen.borrow(), vec![4, 9]);
    }

    #[test]
    fn suppressed_computed_does_not_wake_downstream_effect() {
        let ctx = SchedulerContext::new();
        let n = Signal::new_in(ctx.clone(), 1);
        let parity = {
            let n2 = n.clone();
            Computed::try_new_in(ctx.clone(), &[&n], equals, move || Ok(n2.get() % 2)).unwrap()
        };

        let runs = Rc::new(Cell::new(0));
        let _fx = {
            let (p, runs) = (parity.clone(), runs.clone());
            effect_in(ctx.clone(), &[&parity], move || {
                let _ = p.get();
                runs.set(runs.get() + 1);
            })
        };
        assert_eq!(runs.get(), 1);

        n.set(3); // parity recomputes to 1, unchanged
        ctx.flush_sync();
        assert_eq!(runs.get(), 1);

        n.set(4); // parity flips to 0
        ctx.flush_sync();
        assert_eq!(runs.get(), 2);
    }

    #[test]
    fn every_notification_reads_the_final_value() {
        let ctx = SchedulerContext::new();
        let s = Signal::new_in(ctx.clone(), 0);

        let seen = Rc::new(RefCell::new(Vec::new()));
        let _unsub = {
            let seen = seen.clone();
            s.subscribe(move |v: &i32| seen.borrow_mut().push(*v))
        };

        s.set(1);
        s.set(2);
        s.set(3);
        ctx.flush_sync();

        // Three distinct writes, three notifications, all observing the
        // value that was current when the queue drained.
        assert_eq!(*seen.borrow(), vec![3, 3, 3]);
    }

    #[test]
    fn task_failure_reaches_the_installed_handler_and_drain_continues() {
        let ctx = SchedulerContext::new();
        let seen = Rc::new(RefCell::new(Vec::new()));
        {
            let seen = seen.clone();
            ctx.on_error(move |err| seen.borrow_mut().push(err.to_string()));
        }

        let ran = Rc::new(Cell::new(false));
        let _bad = ctx.enqueue(|| -> Result<(), TaskError> { Err("boom".into()) });
        let _ok = {
            let ran = ran.clone();
            ctx.enqueue(move || ran.set(true))
        };
        ctx.flush_sync();

        assert_eq!(*seen.borrow(), vec!["scheduled task failed"]);
        assert!(ran.get());
    }

    #[test]
    fn thread_local_scheduler_drives_the_free_function_api() {
        reset_scheduler();

        let price = signal(10);
        let qty = signal(3);
        let total = {
            let (p, q) = (price.clone(), qty.clone());
            computed(&[&price, &qty], move || p.get() * q.get())
        };

        let log = Rc::new(RefCell::new(Vec::new()));
        let _fx = {
            let (t, log) = (total.clone(), log.clone());
            effect(&[&total], move || log.borrow_mut().push(t.get()))
        };

        price.set(20);
        qty.set(1);
        flush_sync();

        // Two source notifications, two recomputes; the first already sees
        // both pending writes applied when the drain reaches it.
        assert_eq!(total.get(), 20);
        assert_eq!(log.borrow().first(), Some(&30));
        assert_eq!(log.borrow().last(), Some(&20));

        reset_scheduler();
    }
}
