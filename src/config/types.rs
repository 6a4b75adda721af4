// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Configuration type definitions.
//!
//! [`ClientSettings`] is what a config file contains (every field optional);
//! [`ResolvedSettings`] is the merged result with every value filled in.

use serde::{Deserialize, Serialize};

use crate::channel::ChannelKind;
use crate::context::StoreKind;
use crate::ids::IdFormat;

/// Default log level when neither config nor CLI sets one.
pub const DEFAULT_LOG_LEVEL: &str = "info";

/// Settings as read from a JSON or YAML config file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientSettings {
    /// Context store backing (ambient, scoped)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub store: Option<StoreKind>,

    /// Where finished items go (log, none)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub channel: Option<ChannelKind>,

    /// Format of generated operation ids (uuid, hex)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id_format: Option<IdFormat>,

    /// Whether to copy ambient correlation ids onto new items
    #[serde(skip_serializing_if = "Option::is_none")]
    pub correlation: Option<bool>,

    /// Log level for the opcontext binary
    #[serde(skip_serializing_if = "Option::is_none")]
    pub log_level: Option<String>,
}

/// Fully resolved settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedSettings {
    pub store: StoreKind,
    pub channel: ChannelKind,
    pub id_format: IdFormat,
    pub correlation: bool,
    pub log_level: String,
}

impl Default for ResolvedSettings {
    fn default() -> Self {
        Self {
            store: StoreKind::default(),
            channel: ChannelKind::default(),
            id_format: IdFormat::default(),
            correlation: true,
            log_level: DEFAULT_LOG_LEVEL.to_string(),
        }
    }
}

impl From<&ResolvedSettings> for ClientSettings {
    fn from(resolved: &ResolvedSettings) -> Self {
        Self {
            store: Some(resolved.store),
            channel: Some(resolved.channel),
            id_format: Some(resolved.id_format),
            correlation: Some(resolved.correlation),
            log_level: Some(resolved.log_level.clone()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_settings_camel_case() {
        let settings: ClientSettings =
            serde_json::from_str(r#"{"idFormat": "hex", "logLevel": "debug"}"#).unwrap();
        assert_eq!(settings.id_format, Some(IdFormat::Hex));
        assert_eq!(settings.log_level.as_deref(), Some("debug"));
        assert!(settings.store.is_none());
    }

    #[test]
    fn test_client_settings_skip_none() {
        let json = serde_json::to_string(&ClientSettings::default()).unwrap();
        assert_eq!(json, "{}");
    }

    #[test]
    fn test_resolved_defaults() {
        let resolved = ResolvedSettings::default();
        assert_eq!(resolved.store, StoreKind::Ambient);
        assert_eq!(resolved.channel, ChannelKind::Log);
        assert!(resolved.correlation);
        assert_eq!(resolved.log_level, "info");
    }

    #[test]
    fn test_unknown_store_rejected() {
        let result: Result<ClientSettings, _> = serde_json::from_str(r#"{"store": "redis"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_client_settings_from_resolved() {
        let settings = ClientSettings::from(&ResolvedSettings::default());
        assert_eq!(settings.store, Some(StoreKind::Ambient));
        assert_eq!(settings.correlation, Some(true));
        assert_eq!(settings.log_level.as_deref(), Some("info"));
    }
}
