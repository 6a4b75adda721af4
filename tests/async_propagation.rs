// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Ambient context propagation across `.await`, spawned tasks and threads.

use std::sync::Arc;
use std::time::Duration;

use opcontext::context::{self, AmbientContextStore};
use opcontext::{
    ContextStore, DependencyTelemetry, InMemoryChannel, RequestTelemetry, TelemetryClient,
    TelemetryConfiguration,
};

fn memory_client() -> (TelemetryClient, Arc<InMemoryChannel>) {
    let channel = Arc::new(InMemoryChannel::new());
    let client = TelemetryClient::new(TelemetryConfiguration::default().with_channel(channel.clone()));
    (client, channel)
}

// ============================================================================
// Await points
// ============================================================================

#[tokio::test]
async fn test_snapshot_survives_await() {
    let (client, _channel) = memory_client();

    context::scope(async move {
        let operation = client.start_operation::<RequestTelemetry>(Some("r"));
        tokio::time::sleep(Duration::from_millis(1)).await;
        tokio::task::yield_now().await;

        let snapshot = client.current_context().unwrap();
        assert_eq!(Some(snapshot.parent_operation_id()), operation.id());
    })
    .await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_snapshot_follows_task_across_workers() {
    let (client, channel) = memory_client();

    let handle = context::spawn(async move {
        let request = client.start_operation::<RequestTelemetry>(Some("r"));
        for _ in 0..16 {
            tokio::task::yield_now().await;
        }
        let call = client.start_operation::<DependencyTelemetry>(Some("d"));
        assert_eq!(call.telemetry().operation.parent_id.as_deref(), request.id());
    });
    handle.await.unwrap();

    assert_eq!(channel.len(), 2);
}

// ============================================================================
// Fork and copy
// ============================================================================

#[tokio::test]
async fn test_spawned_child_inherits_but_does_not_leak() {
    let (client, channel) = memory_client();

    context::scope(async move {
        let parent = client.start_operation::<RequestTelemetry>(Some("Parent"));
        let parent_id = parent.id().map(str::to_string);

        let child_client = client.clone();
        let child_parent_id = parent_id.clone();
        context::spawn(async move {
            let inherited = child_client.current_context().unwrap();
            assert_eq!(Some(inherited.parent_operation_id().to_string()), child_parent_id);

            let call = child_client.start_operation::<DependencyTelemetry>(Some("Call"));
            assert_eq!(call.telemetry().operation.parent_id, child_parent_id);
            assert_eq!(call.telemetry().operation.root_name.as_deref(), Some("Parent"));

            // Leave a snapshot behind on purpose; it must stay in this task.
            std::mem::forget(call);
        })
        .await
        .unwrap();

        let current = client.current_context().unwrap();
        assert_eq!(Some(current.parent_operation_id().to_string()), parent_id);
        drop(parent);
        assert!(client.current_context().is_none());
    })
    .await;

    assert_eq!(channel.len(), 1);
}

#[tokio::test]
async fn test_child_scope_starts_from_fork_point() {
    let (client, _channel) = memory_client();

    context::scope(async move {
        let before = context::scope(async { context::current() });
        let operation = client.start_operation::<RequestTelemetry>(Some("r"));
        let after = context::scope(async { context::current() });

        assert!(before.await.is_none());
        assert_eq!(
            after.await.unwrap().parent_operation_id(),
            operation.id().unwrap()
        );
    })
    .await;
}

#[tokio::test]
async fn test_concurrent_scopes_do_not_observe_each_other() {
    let (client, channel) = memory_client();

    let tasks: Vec<_> = (0..8)
        .map(|n| {
            let client = client.clone();
            context::spawn(async move {
                let name = format!("Request-{}", n);
                let request = client.start_operation::<RequestTelemetry>(Some(name.as_str()));
                for _ in 0..4 {
                    tokio::task::yield_now().await;
                    let snapshot = client.current_context().unwrap();
                    assert_eq!(Some(snapshot.parent_operation_id()), request.id());
                    assert_eq!(snapshot.operation_name(), name);
                }
                let call = client.start_operation::<DependencyTelemetry>(Some("Call"));
                tokio::task::yield_now().await;
                assert_eq!(call.telemetry().operation.parent_id.as_deref(), request.id());
                assert_eq!(call.telemetry().operation.root_name.as_deref(), Some(name.as_str()));
            })
        })
        .collect();

    for task in tasks {
        task.await.unwrap();
    }

    assert_eq!(channel.len(), 16);
    assert_eq!(client.metrics().snapshot().unwound_skips, 0);
}

#[tokio::test]
async fn test_track_operation_runs_in_own_scope() {
    let (client, channel) = memory_client();
    let inner = client.clone();

    let status = client
        .track_operation::<RequestTelemetry, _>("OuterRequest", async move {
            let _call = inner.start_operation::<DependencyTelemetry>(Some("DependentCall"));
            tokio::task::yield_now().await;
            200
        })
        .await;

    assert_eq!(status, 200);
    let items = channel.items();
    assert_eq!(items.len(), 2);
    assert_eq!(items[0].operation().parent_id, items[1].operation().id);
    assert!(AmbientContextStore.get().is_none());
}

// ============================================================================
// Unscoped tasks
// ============================================================================

#[tokio::test]
async fn test_unscoped_tasks_on_one_worker_stay_isolated() {
    let (client, channel) = memory_client();
    let (release, parked) = tokio::sync::oneshot::channel::<()>();
    let (started, ready) = tokio::sync::oneshot::channel::<()>();

    let first_client = client.clone();
    let first = tokio::spawn(async move {
        let request = first_client.start_operation::<RequestTelemetry>(Some("TaskA"));
        let _ = started.send(());
        let _ = parked.await;
        drop(request);
    });

    ready.await.unwrap();
    let second_client = client.clone();
    let second = tokio::spawn(async move {
        assert!(second_client.current_context().is_none());
        let call = second_client.start_operation::<DependencyTelemetry>(Some("TaskB"));
        let operation = call.telemetry().operation.clone();
        drop(call);
        operation
    });

    let operation = second.await.unwrap();
    assert!(operation.parent_id.is_none());
    assert_eq!(operation.root_name.as_deref(), Some("TaskB"));
    assert_eq!(operation.root_id, operation.id);

    release.send(()).unwrap();
    first.await.unwrap();

    assert_eq!(channel.len(), 2);
    assert!(client.current_context().is_none());
    assert_eq!(client.metrics().snapshot().unscoped_starts, 2);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_unscoped_task_across_workers_publishes_nothing() {
    let (client, channel) = memory_client();
    let metrics_client = client.clone();

    let handle = tokio::spawn(async move {
        let request = client.start_operation::<RequestTelemetry>(Some("r"));
        assert!(request.context().is_none());
        for _ in 0..16 {
            tokio::task::yield_now().await;
            assert!(client.current_context().is_none());
        }
        let call = client.start_operation::<DependencyTelemetry>(Some("d"));
        assert!(call.telemetry().operation.parent_id.is_none());
        assert_eq!(call.telemetry().operation.root_id, call.telemetry().operation.id);
    });
    handle.await.unwrap();

    assert_eq!(channel.len(), 2);
    let snapshot = metrics_client.metrics().snapshot();
    assert_eq!(snapshot.unscoped_starts, 2);
    assert_eq!(snapshot.unwound_skips, 0);
}

// ============================================================================
// Threads
// ============================================================================

#[test]
fn test_new_thread_starts_empty() {
    let (client, _channel) = memory_client();
    let _operation = client.start_operation::<RequestTelemetry>(Some("r"));

    let seen = std::thread::spawn(|| AmbientContextStore.get().is_none())
        .join()
        .unwrap();
    assert!(seen);
}

#[test]
fn test_sync_scope_carries_snapshot_to_thread() {
    let (client, channel) = memory_client();
    let operation = client.start_operation::<RequestTelemetry>(Some("r"));
    let snapshot = context::current();
    let worker_client = client.clone();

    let parent_id = std::thread::spawn(move || {
        context::sync_scope(snapshot, || {
            let call = worker_client.start_operation::<DependencyTelemetry>(Some("d"));
            call.telemetry().operation.parent_id.clone()
        })
    })
    .join()
    .unwrap();

    assert_eq!(parent_id.as_deref(), operation.id());
    assert_eq!(
        AmbientContextStore.get().unwrap().parent_operation_id(),
        operation.id().unwrap()
    );
    drop(operation);
    assert_eq!(channel.len(), 2);
}
