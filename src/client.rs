// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Telemetry client and its configuration.

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use tracing::{warn, Instrument};

use crate::channel::{NullChannel, TelemetryChannel};
use crate::config::ResolvedSettings;
use crate::context::{
    self, AmbientContextStore, ContextStore, OperationContextSnapshot, SharedSnapshot,
};
use crate::diagnostics::ClientMetrics;
use crate::error::OperationError;
use crate::ids::IdFormat;
use crate::initializer::{OperationCorrelationInitializer, TelemetryInitializer};
use crate::items::{OperationTelemetry, Telemetry, TelemetryItem};
use crate::operation::OperationHandle;

/// Collaborators a [`TelemetryClient`] works with.
///
/// The default configuration uses the ambient store, discards sent items,
/// and runs the [`OperationCorrelationInitializer`].
#[derive(Clone)]
pub struct TelemetryConfiguration {
    store: Arc<dyn ContextStore>,
    channel: Arc<dyn TelemetryChannel>,
    initializers: Vec<Arc<dyn TelemetryInitializer>>,
    id_format: IdFormat,
}

impl Default for TelemetryConfiguration {
    fn default() -> Self {
        Self {
            store: Arc::new(AmbientContextStore),
            channel: Arc::new(NullChannel),
            initializers: vec![Arc::new(OperationCorrelationInitializer)],
            id_format: IdFormat::default(),
        }
    }
}

impl TelemetryConfiguration {
    /// Build a configuration from resolved settings.
    pub fn from_settings(settings: &ResolvedSettings) -> Self {
        let mut configuration = Self::default()
            .with_store(settings.store.build())
            .with_channel(settings.channel.build())
            .with_id_format(settings.id_format);
        if !settings.correlation {
            configuration = configuration.without_initializers();
        }
        configuration
    }

    pub fn with_store(mut self, store: Arc<dyn ContextStore>) -> Self {
        self.store = store;
        self
    }

    pub fn with_channel(mut self, channel: Arc<dyn TelemetryChannel>) -> Self {
        self.channel = channel;
        self
    }

    /// Append an initializer; initializers run in insertion order.
    pub fn with_initializer(mut self, initializer: Arc<dyn TelemetryInitializer>) -> Self {
        self.initializers.push(initializer);
        self
    }

    /// Remove every initializer, including the built-in correlation one.
    pub fn without_initializers(mut self) -> Self {
        self.initializers.clear();
        self
    }

    pub fn with_id_format(mut self, id_format: IdFormat) -> Self {
        self.id_format = id_format;
        self
    }

    pub fn store(&self) -> &Arc<dyn ContextStore> {
        &self.store
    }

    pub fn channel(&self) -> &Arc<dyn TelemetryChannel> {
        &self.channel
    }

    pub fn id_format(&self) -> IdFormat {
        self.id_format
    }
}

impl fmt::Debug for TelemetryConfiguration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TelemetryConfiguration")
            .field("store", &self.store)
            .field("initializers", &self.initializers.len())
            .field("id_format", &self.id_format)
            .finish()
    }
}

struct ClientInner {
    configuration: TelemetryConfiguration,
    metrics: ClientMetrics,
}

/// Starts and stops correlated operations and submits their items.
///
/// Cheap to clone; clones share configuration and metrics.
#[derive(Clone)]
pub struct TelemetryClient {
    inner: Arc<ClientInner>,
}

impl TelemetryClient {
    pub fn new(configuration: TelemetryConfiguration) -> Self {
        Self {
            inner: Arc::new(ClientInner {
                configuration,
                metrics: ClientMetrics::new(),
            }),
        }
    }

    pub fn configuration(&self) -> &TelemetryConfiguration {
        &self.inner.configuration
    }

    pub fn metrics(&self) -> &ClientMetrics {
        &self.inner.metrics
    }

    pub fn store(&self) -> &Arc<dyn ContextStore> {
        self.inner.configuration.store()
    }

    /// Snapshot of the operation currently active for the caller.
    pub fn current_context(&self) -> Option<SharedSnapshot> {
        self.store().get()
    }

    /// Run the configured initializers against `item` using the current
    /// ambient snapshot.
    pub fn initialize(&self, item: &mut dyn Telemetry) {
        let ambient = self.store().get();
        self.initialize_with(item, ambient.as_deref());
    }

    pub(crate) fn initialize_with(
        &self,
        item: &mut dyn Telemetry,
        ambient: Option<&OperationContextSnapshot>,
    ) {
        for initializer in &self.inner.configuration.initializers {
            initializer.initialize(item, ambient);
        }
    }

    /// Hand a finished item to the channel.
    pub fn track(&self, item: impl Into<TelemetryItem>) {
        self.inner.metrics.record_submit();
        self.inner.configuration.channel.send(item.into());
    }

    pub fn flush(&self) {
        self.inner.configuration.channel.flush();
    }

    /// Start an operation with a fresh item of type `T`.
    pub fn start_operation<T>(&self, name: Option<&str>) -> OperationHandle<T>
    where
        T: OperationTelemetry + Default,
    {
        OperationHandle::begin(self.clone(), T::default(), name)
    }

    /// Start an operation with explicit ids that take priority over ambient
    /// and generated ones.
    pub fn start_operation_with_ids<T>(
        &self,
        name: Option<&str>,
        operation_id: Option<&str>,
        parent_operation_id: Option<&str>,
    ) -> OperationHandle<T>
    where
        T: OperationTelemetry + Default,
    {
        let mut item = T::default();
        let operation = item.operation_mut();
        if let Some(id) = operation_id {
            operation.id = Some(id.to_string());
        }
        if let Some(parent_id) = parent_operation_id {
            operation.parent_id = Some(parent_id.to_string());
        }
        OperationHandle::begin(self.clone(), item, name)
    }

    /// Start an operation around a caller-built item.
    ///
    /// Fails with [`OperationError::InvalidArgument`] when `item` is `None`.
    pub fn start_operation_with_item<T>(
        &self,
        item: Option<T>,
    ) -> Result<OperationHandle<T>, OperationError>
    where
        T: OperationTelemetry,
    {
        let item = item.ok_or_else(|| {
            OperationError::invalid_argument("operation telemetry cannot be absent")
        })?;
        Ok(OperationHandle::begin(self.clone(), item, None))
    }

    /// Stop an operation. A missing handle is logged and otherwise ignored.
    pub fn stop_operation<T>(&self, operation: Option<&mut OperationHandle<T>>)
    where
        T: OperationTelemetry,
    {
        match operation {
            Some(operation) => operation.stop(),
            None => {
                self.inner.metrics.record_null_stop();
                warn!("stop_operation called without an operation, nothing to stop");
            }
        }
    }

    /// Run `fut` as a named operation in its own context scope.
    ///
    /// The operation starts when the returned future is first polled and stops
    /// when `fut` completes. Operations started inside `fut` nest under it.
    pub fn track_operation<T, F>(&self, name: &str, fut: F) -> impl Future<Output = F::Output>
    where
        T: OperationTelemetry + Default,
        F: Future,
    {
        let client = self.clone();
        let name = name.to_string();
        context::scope(async move {
            let mut operation = client.start_operation::<T>(Some(&name));
            let output = fut.instrument(operation.span().clone()).await;
            operation.stop();
            output
        })
    }
}

impl fmt::Debug for TelemetryClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TelemetryClient")
            .field("configuration", &self.inner.configuration)
            .finish()
    }
}
