// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Telemetry item types carried by operations.
//!
//! Items are plain data. The only fields this crate manages on them are the
//! correlation fields in [`OperationContext`], the timestamp, the name, and
//! the duration; everything else is filled in by the caller.

mod dependency;
mod request;

use std::fmt;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub use dependency::DependencyTelemetry;
pub use request::RequestTelemetry;

/// Correlation fields of a telemetry item.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OperationContext {
    /// Id of the operation this item describes.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    /// Id of the operation that was active when this one started.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<String>,

    /// Id of the first operation of the chain.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub root_id: Option<String>,

    /// Name of the first operation of the chain.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub root_name: Option<String>,
}

impl OperationContext {
    /// Set `field` to `value` unless it already holds a non-empty value.
    pub(crate) fn fill(field: &mut Option<String>, value: &str) {
        if is_unset(field) && !value.is_empty() {
            *field = Some(value.to_string());
        }
    }
}

/// True when an optional string field is missing or empty.
pub fn is_unset(field: &Option<String>) -> bool {
    field.as_deref().map_or(true, str::is_empty)
}

/// Common surface of every telemetry item.
///
/// Object safe so initializers can work on `&mut dyn Telemetry`.
pub trait Telemetry: Send + Sync + fmt::Debug {
    /// When the item was started, if it has been.
    fn timestamp(&self) -> Option<DateTime<Utc>>;

    fn set_timestamp(&mut self, timestamp: DateTime<Utc>);

    /// Item name, if any.
    fn name(&self) -> Option<&str>;

    fn operation(&self) -> &OperationContext;

    fn operation_mut(&mut self) -> &mut OperationContext;
}

/// A telemetry item that describes a timed operation.
pub trait OperationTelemetry: Telemetry + Clone + Into<TelemetryItem> + 'static {
    fn set_name(&mut self, name: String);

    fn duration(&self) -> Option<Duration>;

    fn set_duration(&mut self, duration: Duration);

    /// The operation id of this item.
    fn id(&self) -> Option<&str> {
        self.operation().id.as_deref()
    }

    /// Mark the item as started now unless a timestamp is already present.
    fn start(&mut self) {
        if self.timestamp().is_none() {
            self.set_timestamp(Utc::now());
        }
    }

    /// Record the elapsed time unless a duration is already present.
    fn stop(&mut self, elapsed: Duration) {
        if self.duration().is_none() {
            self.set_duration(elapsed);
        }
    }
}

macro_rules! impl_operation_telemetry {
    ($ty:ty) => {
        impl $crate::items::Telemetry for $ty {
            fn timestamp(&self) -> Option<chrono::DateTime<chrono::Utc>> {
                self.timestamp
            }

            fn set_timestamp(&mut self, timestamp: chrono::DateTime<chrono::Utc>) {
                self.timestamp = Some(timestamp);
            }

            fn name(&self) -> Option<&str> {
                self.name.as_deref().filter(|name| !name.is_empty())
            }

            fn operation(&self) -> &$crate::items::OperationContext {
                &self.operation
            }

            fn operation_mut(&mut self) -> &mut $crate::items::OperationContext {
                &mut self.operation
            }
        }

        impl $crate::items::OperationTelemetry for $ty {
            fn set_name(&mut self, name: String) {
                self.name = Some(name);
            }

            fn duration(&self) -> Option<std::time::Duration> {
                self.duration
            }

            fn set_duration(&mut self, duration: std::time::Duration) {
                self.duration = Some(duration);
            }
        }
    };
}

pub(crate) use impl_operation_telemetry;

/// A finished item as handed to a channel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum TelemetryItem {
    Request(RequestTelemetry),
    Dependency(DependencyTelemetry),
}

impl TelemetryItem {
    /// Short kind label, as used in the serialized `kind` tag.
    pub fn kind(&self) -> &'static str {
        match self {
            TelemetryItem::Request(_) => "request",
            TelemetryItem::Dependency(_) => "dependency",
        }
    }

    pub fn name(&self) -> Option<&str> {
        self.as_telemetry().name()
    }

    pub fn operation(&self) -> &OperationContext {
        self.as_telemetry().operation()
    }

    pub fn duration(&self) -> Option<Duration> {
        match self {
            TelemetryItem::Request(item) => item.duration,
            TelemetryItem::Dependency(item) => item.duration,
        }
    }

    pub fn as_request(&self) -> Option<&RequestTelemetry> {
        match self {
            TelemetryItem::Request(item) => Some(item),
            _ => None,
        }
    }

    pub fn as_dependency(&self) -> Option<&DependencyTelemetry> {
        match self {
            TelemetryItem::Dependency(item) => Some(item),
            _ => None,
        }
    }

    fn as_telemetry(&self) -> &dyn Telemetry {
        match self {
            TelemetryItem::Request(item) => item,
            TelemetryItem::Dependency(item) => item,
        }
    }
}

impl From<RequestTelemetry> for TelemetryItem {
    fn from(item: RequestTelemetry) -> Self {
        TelemetryItem::Request(item)
    }
}

impl From<DependencyTelemetry> for TelemetryItem {
    fn from(item: DependencyTelemetry) -> Self {
        TelemetryItem::Dependency(item)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fill_respects_existing_value() {
        let mut field = Some("explicit".to_string());
        OperationContext::fill(&mut field, "ambient");
        assert_eq!(field.as_deref(), Some("explicit"));
    }

    #[test]
    fn test_fill_replaces_empty_value() {
        let mut field = Some(String::new());
        OperationContext::fill(&mut field, "ambient");
        assert_eq!(field.as_deref(), Some("ambient"));

        let mut field = None;
        OperationContext::fill(&mut field, "");
        assert!(field.is_none());
    }

    #[test]
    fn test_start_keeps_existing_timestamp() {
        let earlier = Utc::now() - chrono::Duration::seconds(60);
        let mut item = RequestTelemetry::default();
        item.set_timestamp(earlier);
        item.start();
        assert_eq!(item.timestamp(), Some(earlier));
    }

    #[test]
    fn test_stop_keeps_existing_duration() {
        let mut item = DependencyTelemetry::default();
        item.set_duration(Duration::from_millis(5));
        item.stop(Duration::from_secs(1));
        assert_eq!(item.duration(), Some(Duration::from_millis(5)));
    }

    #[test]
    fn test_empty_name_reads_as_unset() {
        let item = RequestTelemetry {
            name: Some(String::new()),
            ..Default::default()
        };
        assert!(Telemetry::name(&item).is_none());
    }

    #[test]
    fn test_item_serializes_with_kind_tag() {
        let item: TelemetryItem = RequestTelemetry::new("GET /").with_id("1").into();
        let json = serde_json::to_value(&item).unwrap();
        assert_eq!(json["kind"], "request");
        assert_eq!(json["name"], "GET /");
        assert_eq!(json["operation"]["id"], "1");
        assert!(json["operation"].get("parentId").is_none());

        let parsed: TelemetryItem = serde_json::from_value(json).unwrap();
        assert_eq!(parsed, item);
    }

    #[test]
    fn test_item_accessors() {
        let item: TelemetryItem = DependencyTelemetry::new("SELECT").into();
        assert_eq!(item.kind(), "dependency");
        assert_eq!(item.name(), Some("SELECT"));
        assert!(item.as_dependency().is_some());
        assert!(item.as_request().is_none());
    }
}
