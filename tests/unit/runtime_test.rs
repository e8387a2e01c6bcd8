//! Tests for tokio spawner utilities

use sync_scheduler::core::SchedulerError;
use sync_scheduler::runtime::TokioSpawner;

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_tokio_spawner_spawn() {
    let spawner = TokioSpawner::new(tokio::runtime::Handle::current());

    let (tx, rx) = tokio::sync::oneshot::channel();
    spawner.spawn(async move {
        tx.send(123).unwrap();
    });

    let result = rx.await.expect("oneshot result");
    assert_eq!(result, 123);
}

#[tokio::test]
async fn test_current_spawner_returns_join_handle() {
    let spawner = TokioSpawner::current().unwrap();
    let value = spawner.spawn(async { 7 }).await.unwrap();
    assert_eq!(value, 7);
}

#[test]
fn test_current_outside_runtime() {
    assert!(matches!(
        TokioSpawner::current(),
        Err(SchedulerError::NoRuntime)
    ));
}
