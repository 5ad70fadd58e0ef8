//! Presentation process supervision

use notification_router::dispatcher::{SPAWN_FAILED_EXIT_CODE, TERMINATED_EXIT_CODE};
use notification_router::{CommandLine, DispatchOutcome, Dispatcher};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

#[tokio::test]
async fn test_timeout_terminates_and_reports_once() {
    let calls = Arc::new(AtomicUsize::new(0));
    let codes = calls.clone();

    let started = Instant::now();
    let outcome = Dispatcher::new(Duration::from_millis(200))
        .run(&CommandLine::new("sleep", ["5"]), move |outcome| {
            assert_eq!(outcome.code(), TERMINATED_EXIT_CODE);
            codes.fetch_add(1, Ordering::SeqCst);
        })
        .await;

    assert_eq!(outcome, DispatchOutcome::Terminated);
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert!(started.elapsed() < Duration::from_secs(4));
}

#[tokio::test]
async fn test_exit_status_is_reported() {
    let outcome = Dispatcher::new(Duration::from_secs(5))
        .run(&CommandLine::new("sh", ["-c", "exit 3"]), |_| {})
        .await;
    assert_eq!(outcome, DispatchOutcome::Exited(3));
    assert!(!outcome.is_dismissed());
}

#[tokio::test]
async fn test_zero_exit_is_dismissal() {
    let outcome = Dispatcher::new(Duration::from_secs(5))
        .run(&CommandLine::new("true", Vec::<String>::new()), |_| {})
        .await;
    assert!(outcome.is_dismissed());
}

#[tokio::test]
async fn test_spawn_failure_still_calls_back() {
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = calls.clone();

    let outcome = Dispatcher::new(Duration::from_secs(1))
        .run(
            &CommandLine::new("surely-not-a-real-binary-xyz", Vec::<String>::new()),
            move |outcome| {
                assert_eq!(outcome.code(), SPAWN_FAILED_EXIT_CODE);
                counter.fetch_add(1, Ordering::SeqCst);
            },
        )
        .await;

    assert_eq!(outcome, DispatchOutcome::SpawnFailed);
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_spawned_dispatch_delivers_outcome() {
    let rx = Dispatcher::new(Duration::from_secs(5)).spawn(CommandLine::new("sh", ["-c", "exit 7"]));
    assert_eq!(rx.await.unwrap(), DispatchOutcome::Exited(7));
}
