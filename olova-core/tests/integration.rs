//! Integration Tests for Reactive System
//!
//! These tests verify that signals, memos, and effects work together correctly.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use olova_core::reactive::{Effect, Memo, ReactiveContext, Signal};
use olova_core::{batch, set_effect, set_effect_with_cleanup, set_memo, set_signal, untrack};

/// Writes re-run subscribers immediately, once per write.
#[test]
fn effect_logs_every_write() {
    let (count, set_count) = set_signal(0);
    let log = Rc::new(RefCell::new(Vec::new()));

    let l = log.clone();
    set_effect(move || l.borrow_mut().push(count.get()));

    set_count.set(1);
    set_count.set(2);

    assert_eq!(*log.borrow(), vec![0, 1, 2]);
}

/// Inside a batch each affected effect runs once, after the batch.
#[test]
fn batch_coalesces_writes() {
    let (count, set_count) = set_signal(0);
    let log = Rc::new(RefCell::new(Vec::new()));

    let l = log.clone();
    set_effect(move || l.borrow_mut().push(count.get()));

    batch(|| {
        set_count.set(1);
        set_count.set(2);
    });

    assert_eq!(*log.borrow(), vec![0, 2]);
}

/// Test that reading a signal outside a computation does not subscribe.
#[test]
fn untracked_read_does_not_subscribe() {
    let signal = Signal::new(1);
    assert_eq!(signal.get(), 1);
    assert_eq!(signal.subscriber_count(), 0);

    let runs = Rc::new(Cell::new(0));
    let r = runs.clone();
    let s = signal.clone();
    set_effect(move || {
        r.set(r.get() + 1);
        untrack(|| s.get());
    });

    signal.set(2);
    assert_eq!(runs.get(), 1);
    assert_eq!(signal.subscriber_count(), 0);
}

/// Test that an effect records exactly the signals it read.
#[test]
fn effect_dependencies_match_reads() {
    let a = Signal::new(1);
    let b = Signal::new(2);
    let unread = Signal::new(3);

    let (a2, b2) = (a.clone(), b.clone());
    let effect = Effect::new(move || {
        let _ = a2.get() + b2.get();
    });

    assert_eq!(effect.run_count(), 1);
    assert_eq!(effect.dependencies(), vec![a.id(), b.id()]);
    assert!(!unread.is_subscribed(&effect));
}

/// Subscribers re-run in the order they subscribed.
#[test]
fn subscribers_run_in_registration_order() {
    let signal = Signal::new(0);
    let order = Rc::new(RefCell::new(Vec::new()));

    for name in ["e1", "e2"] {
        let s = signal.clone();
        let o = order.clone();
        set_effect(move || {
            s.get();
            o.borrow_mut().push(name);
        });
    }
    order.borrow_mut().clear();

    signal.set(1);
    assert_eq!(*order.borrow(), vec!["e1", "e2"]);
}

/// A memo computes once per dependency change however often it is read.
#[test]
fn memo_computes_once_per_change() {
    let (a, set_a) = set_signal(1);
    let (b, set_b) = set_signal(2);
    let calls = Rc::new(Cell::new(0));

    let c = calls.clone();
    let sum = set_memo(move || {
        c.set(c.get() + 1);
        a.get() + b.get()
    });

    for _ in 0..5 {
        assert_eq!(sum.get(), 3);
    }
    assert_eq!(calls.get(), 1);

    set_a.set(10);
    for _ in 0..5 {
        assert_eq!(sum.get(), 12);
    }
    assert_eq!(calls.get(), 2);

    set_b.set(0);
    assert_eq!(sum.get(), 10);
    assert_eq!(calls.get(), 3);
}

/// Test that memos can depend on other memos.
#[test]
fn memo_chain() {
    let base = Signal::new(2);
    let b = base.clone();
    let doubled = Memo::new(move || b.get() * 2);
    let d = doubled.clone();
    let quadrupled = Memo::new(move || d.get() * 2);

    assert_eq!(quadrupled.get(), 8);
    base.set(5);
    assert_eq!(doubled.get(), 10);
    assert_eq!(quadrupled.get(), 20);
}

/// An unchanged memo value does not wake its readers.
#[test]
fn memo_equality_suppresses_downstream_runs() {
    let (n, set_n) = set_signal(2);
    let parity = set_memo(move || n.get() % 2);
    let runs = Rc::new(Cell::new(0));

    let r = runs.clone();
    set_effect(move || {
        parity.get();
        r.set(r.get() + 1);
    });

    set_n.set(4);
    assert_eq!(runs.get(), 1);
    set_n.set(5);
    assert_eq!(runs.get(), 2);
}

/// An effect reading a signal and a memo of it runs twice per plain write
/// and once per batched write.
#[test]
fn diamond_reader_runs_once_per_batch() {
    let (count, set_count) = set_signal(1);
    let c = count.clone();
    let doubled = set_memo(move || c.get() * 2);
    let log = Rc::new(RefCell::new(Vec::new()));

    let l = log.clone();
    set_effect(move || l.borrow_mut().push((count.get(), doubled.get())));

    set_count.set(2);
    assert_eq!(*log.borrow(), vec![(1, 2), (2, 4), (2, 4)]);

    batch(|| set_count.set(3));
    assert_eq!(*log.borrow(), vec![(1, 2), (2, 4), (2, 4), (3, 6)]);
}

/// Switching branches drops subscriptions that are no longer read.
#[test]
fn branch_switch_drops_stale_dependencies() {
    let flag = Signal::new(true);
    let left = Signal::new("left");
    let right = Signal::new("right");
    let seen = Rc::new(RefCell::new(Vec::new()));

    let (f, l, r, s) = (flag.clone(), left.clone(), right.clone(), seen.clone());
    let effect = Effect::new(move || {
        let value = if f.get() { l.get() } else { r.get() };
        s.borrow_mut().push(value);
    });
    assert!(left.is_subscribed(&effect));
    assert!(!right.is_subscribed(&effect));

    flag.set(false);
    assert!(!left.is_subscribed(&effect));
    assert!(right.is_subscribed(&effect));

    left.set("ignored");
    assert_eq!(*seen.borrow(), vec!["left", "right"]);
}

/// Cleanups run before each re-run and once on disposal.
#[test]
fn cleanup_runs_before_rerun_and_on_dispose() {
    let (count, set_count) = set_signal(0);
    let log = Rc::new(RefCell::new(Vec::new()));

    let owner = olova_core::reactive::Owner::new();
    let l = log.clone();
    owner.run(|| {
        set_effect_with_cleanup(move || {
            let value = count.get();
            l.borrow_mut().push(format!("run {value}"));
            let l = l.clone();
            move || l.borrow_mut().push(format!("cleanup {value}"))
        });
    });

    set_count.set(1);
    owner.dispose();
    set_count.set(2);

    assert_eq!(
        *log.borrow(),
        vec!["run 0", "cleanup 0", "run 1", "cleanup 1"]
    );
}

/// Nested effects restore the outer tracking context.
#[test]
fn nested_effects_restore_context() {
    let outer_signal = Signal::new(0);
    let inner_signal = Signal::new(0);
    let inner_runs = Rc::new(Cell::new(0));

    let (o, i, runs) = (outer_signal.clone(), inner_signal.clone(), inner_runs.clone());
    let outer = Effect::new(move || {
        let i = i.clone();
        let runs = runs.clone();
        Effect::new(move || {
            i.get();
            runs.set(runs.get() + 1);
        });
        o.get();
    });

    assert_eq!(ReactiveContext::depth(), 0);
    assert!(outer_signal.is_subscribed(&outer));
    assert!(!inner_signal.is_subscribed(&outer));

    inner_signal.set(1);
    assert_eq!(inner_runs.get(), 2);

    // Re-running the outer effect disposes the inner one it created.
    outer_signal.set(1);
    inner_signal.set(2);
    assert_eq!(inner_runs.get(), 4);
}
