mod common;
use crate::common::{init_tracing, with_timeout};

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::time::Instant;

use aldev::lifecycle::Lifecycle;

#[tokio::test(start_paused = true)]
async fn outer_scope_is_cancelled_exactly_after_the_grace_period() {
    init_tracing();

    let lifecycle = Lifecycle::new(200, None);
    let watcher = {
        let lifecycle = lifecycle.clone();
        tokio::spawn(async move {
            lifecycle.done().await;
            Instant::now()
        })
    };

    let start = Instant::now();
    lifecycle.cancel_all().await;
    let done_at = with_timeout(watcher).await.unwrap();

    let elapsed = done_at - start;
    assert!(elapsed >= Duration::from_millis(200), "{elapsed:?}");
    assert!(elapsed <= Duration::from_millis(210), "{elapsed:?}");
}

#[tokio::test(start_paused = true)]
async fn the_loop_scope_is_cancelled_before_the_grace_period_starts() {
    init_tracing();

    let lifecycle = Lifecycle::new(200, None);
    let scope = lifecycle.loop_context();
    let observed = tokio::spawn(async move {
        scope.cancelled().await;
        Instant::now()
    });

    let start = Instant::now();
    lifecycle.cancel_all().await;

    let observed_at = with_timeout(observed).await.unwrap();
    assert!(observed_at - start < Duration::from_millis(200));
}

#[tokio::test(start_paused = true)]
async fn on_stop_runs_once_under_concurrent_cancellation() {
    init_tracing();

    let calls = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&calls);
    let lifecycle = Lifecycle::new(
        30,
        Some(Box::new(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        })),
    );

    let handles: Vec<_> = (0..4)
        .map(|_| {
            let lifecycle = lifecycle.clone();
            tokio::spawn(async move { lifecycle.cancel_all().await })
        })
        .collect();
    for handle in handles {
        with_timeout(handle).await.unwrap();
    }

    // Every caller returns only once the outer scope is done.
    assert!(lifecycle.is_cancelled());
    assert_eq!(calls.load(Ordering::SeqCst), 1);

    lifecycle.cancel_all().await;
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn restarts_hand_out_fresh_scopes_and_cancel_the_old_ones() {
    init_tracing();

    let lifecycle = Lifecycle::new(0, None);
    let mut previous = lifecycle.loop_context();

    for expected in 1..=5 {
        let next = lifecycle.restart_loop().unwrap();
        assert!(previous.is_cancelled());
        assert!(!next.is_cancelled());
        assert_eq!(next.generation(), Some(expected));
        previous = next;
    }

    assert!(!lifecycle.is_cancelled());
    assert!(!lifecycle.is_stopping());
}

#[tokio::test(start_paused = true)]
async fn a_stopping_lifecycle_refuses_restarts_and_keeps_its_scope_cancelled() {
    init_tracing();

    let lifecycle = Lifecycle::new(50, None);
    let stopper = {
        let lifecycle = lifecycle.clone();
        tokio::spawn(async move { lifecycle.cancel_all().await })
    };

    // Let the stop begin, but not finish.
    tokio::time::sleep(Duration::from_millis(10)).await;
    assert!(lifecycle.is_stopping());
    assert!(!lifecycle.is_cancelled());

    assert!(lifecycle.restart_loop().is_none());
    assert!(lifecycle.loop_context().is_cancelled());

    with_timeout(stopper).await.unwrap();
    assert!(lifecycle.is_cancelled());
}
