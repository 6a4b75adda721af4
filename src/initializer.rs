// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Telemetry initializers.
//!
//! An initializer runs once per started operation, before the client assigns
//! any ids of its own. Initializers only fill fields that are still unset, so
//! running one twice leaves the item unchanged.

use crate::context::OperationContextSnapshot;
use crate::items::{OperationContext, Telemetry};

/// Hook that decorates an item as it is started.
pub trait TelemetryInitializer: Send + Sync {
    /// Populate fields on `item`. `ambient` is the snapshot that was current
    /// when the operation started.
    fn initialize(&self, item: &mut dyn Telemetry, ambient: Option<&OperationContextSnapshot>);
}

impl<F> TelemetryInitializer for F
where
    F: Fn(&mut dyn Telemetry, Option<&OperationContextSnapshot>) + Send + Sync,
{
    fn initialize(&self, item: &mut dyn Telemetry, ambient: Option<&OperationContextSnapshot>) {
        self(item, ambient)
    }
}

/// Copies the ambient correlation ids onto the item.
///
/// - `parent_id` from the snapshot's parent operation id
/// - `root_id` from the snapshot's root operation id
/// - `root_name` from the snapshot's operation name
#[derive(Debug, Clone, Copy, Default)]
pub struct OperationCorrelationInitializer;

impl TelemetryInitializer for OperationCorrelationInitializer {
    fn initialize(&self, item: &mut dyn Telemetry, ambient: Option<&OperationContextSnapshot>) {
        let Some(ambient) = ambient else {
            return;
        };

        let operation = item.operation_mut();
        OperationContext::fill(&mut operation.parent_id, ambient.parent_operation_id());
        OperationContext::fill(&mut operation.root_id, ambient.root_operation_id());
        OperationContext::fill(&mut operation.root_name, ambient.operation_name());
    }
}
