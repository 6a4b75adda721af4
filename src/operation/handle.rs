// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Operation handle: the start and stop protocol.

use std::fmt;
use std::time::Instant;

use tracing::{debug, info_span, warn, Span};

use crate::client::TelemetryClient;
use crate::context::{OperationContextSnapshot, SharedSnapshot};
use crate::ids::short_id;
use crate::items::{is_unset, OperationTelemetry};

/// Lifecycle of an [`OperationHandle`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationState {
    /// Being set up; nothing has been published yet.
    Created,
    /// Its snapshot is published and the item is waiting to be sent.
    Active,
    /// Stopped. Terminal.
    Completed,
}

/// A started operation.
///
/// The handle owns the telemetry item, remembers the snapshot that was
/// current before it started, and restores it when the operation stops.
/// Stopping happens through [`OperationHandle::stop`],
/// [`TelemetryClient::stop_operation`] or by dropping the handle, whichever
/// comes first; later attempts are no-ops.
///
/// The published snapshot carries this item's own name; operations nested
/// directly under it adopt that name as their root name.
///
/// Stopping restores the captured parent only while the store still holds a
/// snapshot at least as deep as this one. If an ancestor stopped first, the
/// store is already shallower (or empty) and is left alone. The depth check
/// cannot tell chains apart: after A and B start and A stops, a new chain D,E
/// reaches depth 2 again, and a late stop of B then writes A's stale snapshot
/// over E. The store still converges once D and E stop.
///
/// When the store cannot hold a value for the caller (an unscoped task on a
/// tokio runtime with the ambient store), nothing is published or restored;
/// the item is still timed and sent.
///
/// Callers must let every handle stop. A handle leaked with `mem::forget`
/// never sends its item and leaves its snapshot in the store until something
/// else overwrites it.
#[must_use = "an operation stops as soon as its handle is dropped"]
pub struct OperationHandle<T: OperationTelemetry> {
    telemetry: T,
    parent: Option<SharedSnapshot>,
    published: Option<SharedSnapshot>,
    client: TelemetryClient,
    span: Span,
    started: Instant,
    state: OperationState,
}

impl<T: OperationTelemetry> OperationHandle<T> {
    /// Run the start protocol for `telemetry` and publish its snapshot.
    pub(crate) fn begin(client: TelemetryClient, telemetry: T, name: Option<&str>) -> Self {
        let store = client.store().clone();
        let parent = store.get();

        let mut handle = Self {
            telemetry,
            parent,
            published: None,
            client,
            span: Span::none(),
            started: Instant::now(),
            state: OperationState::Created,
        };
        handle.telemetry.start();

        if handle.telemetry.name().is_none() {
            if let Some(name) = name.filter(|name| !name.is_empty()) {
                handle.telemetry.set_name(name.to_string());
            }
        }

        handle
            .client
            .initialize_with(&mut handle.telemetry, handle.parent.as_deref());

        let id_format = handle.client.configuration().id_format();
        let item_name = handle.telemetry.name().map(str::to_string);
        let operation = handle.telemetry.operation_mut();
        if is_unset(&operation.id) {
            operation.id = Some(id_format.generate());
        }
        let id = operation.id.clone().unwrap_or_default();
        if is_unset(&operation.root_id) {
            operation.root_id = Some(id.clone());
        }
        if is_unset(&operation.root_name) {
            operation.root_name = item_name.clone();
        }
        let root_id = operation.root_id.clone().unwrap_or_default();
        let parent_id = operation.parent_id.clone();

        let depth = handle.parent.as_ref().map_or(1, |parent| parent.depth() + 1);
        if store.is_available() {
            let published = OperationContextSnapshot::at_depth(
                id.as_str(),
                root_id.as_str(),
                item_name.clone().unwrap_or_default(),
                depth,
            )
            .into_shared();
            store.save(Some(published.clone()));
            handle.published = Some(published);
        } else {
            warn!(
                id = short_id(&id),
                "no context scope in this task, operation not published; \
                 run it inside context::scope or context::spawn"
            );
            handle.client.metrics().record_unscoped_start();
        }

        handle.span = info_span!(
            "operation",
            operation_name = item_name.as_deref().unwrap_or(""),
            operation_id = %id,
            parent_id = parent_id.as_deref().unwrap_or(""),
            root_id = %root_id,
            duration_ms = tracing::field::Empty,
        );
        debug!(parent: &handle.span, depth, id = short_id(&id), "operation started");

        handle.state = OperationState::Active;
        handle.client.metrics().record_start();
        handle
    }

    /// Stop the operation. Does nothing if it already stopped.
    pub fn stop(&mut self) {
        self.complete();
    }

    pub fn telemetry(&self) -> &T {
        &self.telemetry
    }

    /// Mutable access to the item, e.g. to record a response code before stop.
    pub fn telemetry_mut(&mut self) -> &mut T {
        &mut self.telemetry
    }

    /// Operation id of the item.
    pub fn id(&self) -> Option<&str> {
        self.telemetry.id()
    }

    /// Snapshot that was current when this operation started.
    pub fn parent_context(&self) -> Option<&SharedSnapshot> {
        self.parent.as_ref()
    }

    /// Snapshot this operation published, if the store accepted one.
    pub fn context(&self) -> Option<&SharedSnapshot> {
        self.published.as_ref()
    }

    pub fn state(&self) -> OperationState {
        self.state
    }

    pub fn is_completed(&self) -> bool {
        self.state == OperationState::Completed
    }

    /// The `operation` span, for instrumenting futures run under this
    /// operation.
    pub fn span(&self) -> &Span {
        &self.span
    }

    fn complete(&mut self) {
        let previous = std::mem::replace(&mut self.state, OperationState::Completed);
        if previous != OperationState::Active {
            return;
        }

        self.restore_parent();

        let elapsed = self.started.elapsed();
        self.telemetry.stop(elapsed);
        let duration = self.telemetry.duration().unwrap_or(elapsed);
        self.span
            .record("duration_ms", duration.as_secs_f64() * 1000.0);
        debug!(parent: &self.span, "operation completed");

        let metrics = self.client.metrics();
        metrics.record_completion(self.telemetry.name(), duration);
        self.client.track(self.telemetry.clone());
    }

    /// Put the captured parent snapshot back, unless the chain was already
    /// unwound past this operation by an ancestor that stopped first.
    fn restore_parent(&self) {
        let Some(published) = &self.published else {
            return;
        };

        let store = self.client.store();
        let unwound = match store.get() {
            Some(current) => current.depth() < published.depth(),
            None => true,
        };

        if unwound {
            debug!(
                parent: &self.span,
                depth = published.depth(),
                "context already unwound past this operation, store left unchanged"
            );
            self.client.metrics().record_unwound_skip();
        } else {
            store.save(self.parent.clone());
        }
    }
}

impl<T: OperationTelemetry> Drop for OperationHandle<T> {
    fn drop(&mut self) {
        self.complete();
    }
}

impl<T: OperationTelemetry> fmt::Debug for OperationHandle<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OperationHandle")
            .field("telemetry", &self.telemetry)
            .field("parent", &self.parent)
            .field("published", &self.published)
            .field("state", &self.state)
            .finish()
    }
}
