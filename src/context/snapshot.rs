// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Immutable correlation snapshot published by a running operation.

use std::sync::Arc;

use serde::Serialize;

/// Shared handle to a published snapshot.
pub type SharedSnapshot = Arc<OperationContextSnapshot>;

/// "What operation is currently active" for one logical execution context.
///
/// A snapshot is never mutated after it is published. Starting a nested
/// operation replaces the ambient snapshot with a new one; the previous
/// snapshot is remembered by the operation handle, not by the snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OperationContextSnapshot {
    parent_operation_id: String,
    root_operation_id: String,
    operation_name: String,
    #[serde(skip)]
    depth: usize,
}

impl OperationContextSnapshot {
    /// Create a snapshot for an operation at the top of a chain.
    pub fn new(
        parent_operation_id: impl Into<String>,
        root_operation_id: impl Into<String>,
        operation_name: impl Into<String>,
    ) -> Self {
        Self::at_depth(parent_operation_id, root_operation_id, operation_name, 1)
    }

    pub(crate) fn at_depth(
        parent_operation_id: impl Into<String>,
        root_operation_id: impl Into<String>,
        operation_name: impl Into<String>,
        depth: usize,
    ) -> Self {
        Self {
            parent_operation_id: parent_operation_id.into(),
            root_operation_id: root_operation_id.into(),
            operation_name: operation_name.into(),
            depth,
        }
    }

    /// Id of the operation most recently started and not yet stopped.
    ///
    /// Operations started next use this as their parent id.
    pub fn parent_operation_id(&self) -> &str {
        &self.parent_operation_id
    }

    /// Id of the outermost operation of the chain.
    pub fn root_operation_id(&self) -> &str {
        &self.root_operation_id
    }

    /// Name of the operation that published the snapshot.
    pub fn operation_name(&self) -> &str {
        &self.operation_name
    }

    /// Nesting level of the publishing operation (1 for a chain root).
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Wrap into a shared snapshot.
    pub fn into_shared(self) -> SharedSnapshot {
        Arc::new(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_is_root_depth() {
        let snapshot = OperationContextSnapshot::new("a", "a", "OuterRequest");
        assert_eq!(snapshot.parent_operation_id(), "a");
        assert_eq!(snapshot.root_operation_id(), "a");
        assert_eq!(snapshot.operation_name(), "OuterRequest");
        assert_eq!(snapshot.depth(), 1);
    }

    #[test]
    fn test_serialize_omits_depth() {
        let snapshot = OperationContextSnapshot::at_depth("b", "a", "OuterRequest", 2);
        let json = serde_json::to_value(&snapshot).unwrap();
        assert_eq!(json["parentOperationId"], "b");
        assert_eq!(json["rootOperationId"], "a");
        assert_eq!(json["operationName"], "OuterRequest");
        assert!(json.get("depth").is_none());
    }
}
