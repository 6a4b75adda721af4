// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Ambient snapshot slot that follows a logical call tree.
//!
//! Async code runs inside a task-local slot established by [`scope`] or
//! [`spawn`]. The slot travels with the future across `.await` points and
//! worker threads. Plain synchronous code that never entered a scope falls
//! back to a per-thread slot.
//!
//! Inside a tokio runtime there is no fallback. Tasks share worker threads,
//! so a per-thread slot would be visible to unrelated tasks. Unscoped code
//! running on a runtime reads `None` and its writes are dropped; see
//! [`is_available`].
//!
//! Forking copies: a child scope starts with the parent's value at fork time,
//! and nothing the child saves is visible to the parent afterwards.

use std::cell::RefCell;
use std::future::Future;

use tokio::runtime::Handle;
use tokio::task::JoinHandle;

use super::snapshot::SharedSnapshot;

tokio::task_local! {
    static TASK_SLOT: RefCell<Option<SharedSnapshot>>;
}

thread_local! {
    static THREAD_SLOT: RefCell<Option<SharedSnapshot>> = const { RefCell::new(None) };
}

/// Read the ambient snapshot of the current logical context.
pub fn current() -> Option<SharedSnapshot> {
    match TASK_SLOT.try_with(|slot| slot.borrow().clone()) {
        Ok(snapshot) => snapshot,
        Err(_) if in_runtime() => None,
        Err(_) => THREAD_SLOT.with(|slot| slot.borrow().clone()),
    }
}

/// Replace the ambient snapshot of the current logical context.
///
/// Returns `false` when the write was dropped because the caller is an
/// unscoped task on a tokio runtime.
pub(crate) fn replace(snapshot: Option<SharedSnapshot>) -> bool {
    let in_task = TASK_SLOT
        .try_with(|slot| *slot.borrow_mut() = snapshot.clone())
        .is_ok();
    if in_task {
        return true;
    }
    if in_runtime() {
        return false;
    }
    THREAD_SLOT.with(|slot| *slot.borrow_mut() = snapshot);
    true
}

/// Whether the caller runs inside a task-local scope.
pub fn is_scoped() -> bool {
    TASK_SLOT.try_with(|_| ()).is_ok()
}

/// Whether the ambient slot can hold a value for the caller.
///
/// True inside a scope, and for plain threads with no tokio runtime entered.
/// False for unscoped code on a runtime, including `spawn_blocking` closures;
/// wrap those in [`scope`], [`spawn`] or [`sync_scope`].
pub fn is_available() -> bool {
    is_scoped() || !in_runtime()
}

fn in_runtime() -> bool {
    Handle::try_current().is_ok()
}

/// Run `fut` in a child scope seeded with the caller's current snapshot.
///
/// The snapshot is read when `scope` is called, not when the future is first
/// polled.
pub fn scope<F>(fut: F) -> impl Future<Output = F::Output>
where
    F: Future,
{
    scope_with(current(), fut)
}

/// Run `fut` in a child scope seeded with an explicit snapshot.
pub fn scope_with<F>(snapshot: Option<SharedSnapshot>, fut: F) -> impl Future<Output = F::Output>
where
    F: Future,
{
    TASK_SLOT.scope(RefCell::new(snapshot), fut)
}

/// Run a synchronous closure in a child scope seeded with `snapshot`.
///
/// Use this to carry context onto a freshly spawned OS thread:
///
/// ```rust,ignore
/// let snapshot = opcontext::context::current();
/// std::thread::spawn(move || {
///     opcontext::context::sync_scope(snapshot, || do_work())
/// });
/// ```
pub fn sync_scope<R>(snapshot: Option<SharedSnapshot>, f: impl FnOnce() -> R) -> R {
    TASK_SLOT.sync_scope(RefCell::new(snapshot), f)
}

/// Spawn a tokio task that inherits the caller's current snapshot.
pub fn spawn<F>(fut: F) -> JoinHandle<F::Output>
where
    F: Future + Send + 'static,
    F::Output: Send + 'static,
{
    tokio::spawn(scope(fut))
}
