// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Incoming request telemetry.

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{impl_operation_telemetry, OperationContext};

/// An operation triggered by an incoming request.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RequestTelemetry {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime<Utc>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration: Option<Duration>,

    pub operation: OperationContext,

    /// Request URL
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_code: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub success: Option<bool>,
}

impl RequestTelemetry {
    /// Create a named request item.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Default::default()
        }
    }

    /// Set an explicit operation id.
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.operation.id = Some(id.into());
        self
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    pub fn with_response_code(mut self, code: impl Into<String>) -> Self {
        self.response_code = Some(code.into());
        self
    }

    pub fn with_success(mut self, success: bool) -> Self {
        self.success = Some(success);
        self
    }
}

impl_operation_telemetry!(RequestTelemetry);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::items::OperationTelemetry;

    #[test]
    fn test_builder() {
        let request = RequestTelemetry::new("GET /orders")
            .with_id("1")
            .with_url("https://example.test/orders")
            .with_response_code("200")
            .with_success(true);

        assert_eq!(request.name.as_deref(), Some("GET /orders"));
        assert_eq!(request.id(), Some("1"));
        assert_eq!(request.response_code.as_deref(), Some("200"));
        assert_eq!(request.success, Some(true));
    }

    #[test]
    fn test_default_is_unstarted() {
        let request = RequestTelemetry::default();
        assert!(request.timestamp.is_none());
        assert!(request.duration().is_none());
        assert!(request.id().is_none());
    }

    #[test]
    fn test_deserialize_partial() {
        let request: RequestTelemetry =
            serde_json::from_str(r#"{"name": "GET /", "operation": {"parentId": "p"}}"#).unwrap();
        assert_eq!(request.name.as_deref(), Some("GET /"));
        assert_eq!(request.operation.parent_id.as_deref(), Some("p"));
        assert!(request.url.is_none());
    }
}
