use pretty_assertions::assert_eq;
use ripple_signals::{pending, SchedulerContext, SchedulerState, TaskError, TaskOutcome};
use std::cell::{Cell, RefCell};
use std::rc::Rc;

#[test]
fn tasks_drain_in_enqueue_order() {
    let ctx = SchedulerContext::new();
    let order = Rc::new(RefCell::new(Vec::new()));

    for label in ["first", "second", "third"] {
        let order = order.clone();
        ctx.enqueue(move || order.borrow_mut().push(label));
    }
    ctx.flush_sync();

    assert_eq!(*order.borrow(), vec!["first", "second", "third"]);
}

#[test]
fn tick_is_a_noop_until_something_is_queued() {
    let ctx = SchedulerContext::new();
    let ran = Rc::new(Cell::new(false));

    ctx.tick(); // nothing scheduled

    {
        let ran = ran.clone();
        ctx.enqueue(move || ran.set(true));
    }
    assert!(!ran.get());

    ctx.tick();
    assert!(ran.get());
}

#[test]
fn canceled_task_is_skipped_but_order_is_kept() {
    let ctx = SchedulerContext::new();
    let order = Rc::new(RefCell::new(Vec::new()));

    let _a = {
        let order = order.clone();
        ctx.enqueue(move || order.borrow_mut().push("a"))
    };
    let b = {
        let order = order.clone();
        ctx.enqueue(move || order.borrow_mut().push("b"))
    };
    let _c = {
        let order = order.clone();
        ctx.enqueue(move || order.borrow_mut().push("c"))
    };

    assert!(b.cancel());
    assert!(!b.cancel(), "second cancel reports nothing to do");
    ctx.flush_sync();

    assert_eq!(*order.borrow(), vec!["a", "c"]);
}

#[test]
fn cancel_during_the_drain_stops_a_later_task() {
    let ctx = SchedulerContext::new();

    let ran2 = Rc::new(Cell::new(false));
    let handle_slot: Rc<RefCell<Option<ripple_signals::TaskHandle>>> =
        Rc::new(RefCell::new(None));
    {
        let slot = handle_slot.clone();
        ctx.enqueue(move || {
            if let Some(h) = slot.borrow().as_ref() {
                h.cancel();
            }
        });
    }
    let later = {
        let ran2 = ran2.clone();
        ctx.enqueue(move || ran2.set(true))
    };
    *handle_slot.borrow_mut() = Some(later);

    ctx.flush_sync();
    assert!(!ran2.get());
}

#[test]
fn tasks_enqueued_while_draining_run_in_the_same_drain() {
    let ctx = SchedulerContext::new();
    let order = Rc::new(RefCell::new(Vec::new()));

    {
        let (ctx2, order) = (ctx.clone(), order.clone());
        ctx.enqueue(move || {
            order.borrow_mut().push(1);
            let order = order.clone();
            ctx2.enqueue(move || order.borrow_mut().push(2));
        });
    }
    ctx.flush_sync();

    assert_eq!(*order.borrow(), vec![1, 2]);
}

#[test]
fn failing_task_routes_to_handler_and_later_tasks_still_run() {
    let ctx = SchedulerContext::new();
    let errors = Rc::new(RefCell::new(Vec::new()));
    {
        let errors = errors.clone();
        ctx.on_error(move |err| errors.borrow_mut().push(err.to_string()));
    }

    let survived = Rc::new(Cell::new(false));
    ctx.enqueue(|| -> Result<(), TaskError> { Err("exploded".into()) });
    {
        let survived = survived.clone();
        ctx.enqueue(move || survived.set(true));
    }
    ctx.flush_sync();

    assert_eq!(*errors.borrow(), vec!["scheduled task failed"]);
    assert!(survived.get());
}

#[test]
fn explicit_failed_outcome_is_reported() {
    let ctx = SchedulerContext::new();
    let errors = Rc::new(Cell::new(0));
    {
        let errors = errors.clone();
        ctx.on_error(move |_| errors.set(errors.get() + 1));
    }

    ctx.enqueue(|| TaskOutcome::Failed("direct".into()));
    ctx.flush_sync();
    assert_eq!(errors.get(), 1);
}

#[test]
fn deferred_task_result_is_polled_across_ticks() {
    let ctx = SchedulerContext::new();
    let finished = Rc::new(Cell::new(false));

    {
        let finished = finished.clone();
        ctx.enqueue(move || {
            pending(async move {
                finished.set(true);
                Ok(())
            })
        });
    }

    ctx.flush_sync();
    assert!(finished.get(), "an immediately-ready future completes in the same drain");
}

#[test]
fn deferred_failure_is_reported_as_deferred() {
    let ctx = SchedulerContext::new();
    let errors = Rc::new(RefCell::new(Vec::new()));
    {
        let errors = errors.clone();
        ctx.on_error(move |err| errors.borrow_mut().push(err.to_string()));
    }

    ctx.enqueue(|| pending(async { Err("late failure".into()) }));
    ctx.flush_sync();

    assert_eq!(*errors.borrow(), vec!["deferred task result failed"]);
}

#[test]
fn state_snapshot_reflects_queue_and_drain_progress() {
    let ctx = SchedulerContext::new();
    assert_eq!(
        ctx.state(),
        SchedulerState {
            queued: vec![],
            flushing: false,
            index: 0
        }
    );

    let a = ctx.enqueue(|| ());
    let b = ctx.enqueue(|| ());
    let state = ctx.state();
    assert_eq!(state.queued, vec![a.id(), b.id()]);
    assert!(!state.flushing);

    ctx.flush_sync();
    assert_eq!(ctx.state().queued, Vec::<ripple_signals::TaskId>::new());
}

#[test]
fn reset_drops_queued_work_without_running_it() {
    let ctx = SchedulerContext::new();
    let ran = Rc::new(Cell::new(false));
    {
        let ran = ran.clone();
        ctx.enqueue(move || ran.set(true));
    }

    ctx.reset();
    ctx.flush_sync();

    assert!(!ran.get());
    assert_eq!(ctx.state().queued.len(), 0);
}

#[test]
fn reset_keeps_the_error_handler() {
    let ctx = SchedulerContext::new();
    let errors = Rc::new(Cell::new(0));
    {
        let errors = errors.clone();
        ctx.on_error(move |_| errors.set(errors.get() + 1));
    }

    ctx.reset();
    ctx.enqueue(|| -> Result<(), TaskError> { Err("after reset".into()) });
    ctx.flush_sync();

    assert_eq!(errors.get(), 1);
}
