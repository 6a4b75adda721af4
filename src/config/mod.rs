// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Configuration module for opcontext.
//!
//! Settings come from several sources:
//! - Global config: ~/.opcontext/config.json
//! - Workspace config: .opcontext.json, .opcontext.yaml, or opcontext.config.json
//! - CLI options (which also read `OPCONTEXT_*` environment variables)
//!
//! Precedence is CLI > workspace > global > defaults.

mod loader;
mod types;

pub use loader::{
    get_global_config_dir, get_global_config_path, load_global_settings, load_settings_file,
    load_workspace_settings, save_workspace_settings, CONFIG_FILES, GLOBAL_CONFIG_DIR,
    GLOBAL_CONFIG_FILE,
};
pub use types::{ClientSettings, ResolvedSettings, DEFAULT_LOG_LEVEL};

use std::path::Path;

use crate::diagnostics::parse_level;
use crate::error::ConfigError;

/// Load and merge every settings source for a workspace.
pub fn load_settings(
    workspace_root: &Path,
    overrides: ClientSettings,
) -> Result<ResolvedSettings, ConfigError> {
    let global = load_global_settings()?;
    let workspace = load_workspace_settings(workspace_root)?;
    merge_settings(global, workspace, overrides)
}

/// Merge settings layers, later layers winning field by field.
pub fn merge_settings(
    global: Option<ClientSettings>,
    workspace: Option<ClientSettings>,
    overrides: ClientSettings,
) -> Result<ResolvedSettings, ConfigError> {
    let mut resolved = ResolvedSettings::default();

    for layer in [global, workspace, Some(overrides)].into_iter().flatten() {
        if let Some(store) = layer.store {
            resolved.store = store;
        }
        if let Some(channel) = layer.channel {
            resolved.channel = channel;
        }
        if let Some(id_format) = layer.id_format {
            resolved.id_format = id_format;
        }
        if let Some(correlation) = layer.correlation {
            resolved.correlation = correlation;
        }
        if let Some(log_level) = layer.log_level {
            resolved.log_level = log_level;
        }
    }

    parse_level(&resolved.log_level)?;
    Ok(resolved)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channel::ChannelKind;
    use crate::context::StoreKind;
    use crate::ids::IdFormat;
    use tempfile::TempDir;

    #[test]
    fn test_merge_defaults() {
        let resolved = merge_settings(None, None, ClientSettings::default()).unwrap();
        assert_eq!(resolved, ResolvedSettings::default());
    }

    #[test]
    fn test_merge_precedence() {
        let global = ClientSettings {
            channel: Some(ChannelKind::None),
            id_format: Some(IdFormat::Hex),
            log_level: Some("debug".to_string()),
            ..Default::default()
        };
        let workspace = ClientSettings {
            id_format: Some(IdFormat::Uuid),
            store: Some(StoreKind::Scoped),
            ..Default::default()
        };
        let overrides = ClientSettings {
            store: Some(StoreKind::Ambient),
            ..Default::default()
        };

        let resolved = merge_settings(Some(global), Some(workspace), overrides).unwrap();
        assert_eq!(resolved.channel, ChannelKind::None);
        assert_eq!(resolved.id_format, IdFormat::Uuid);
        assert_eq!(resolved.store, StoreKind::Ambient);
        assert_eq!(resolved.log_level, "debug");
    }

    #[test]
    fn test_merge_rejects_bad_level() {
        let overrides = ClientSettings {
            log_level: Some("chatty".to_string()),
            ..Default::default()
        };
        let err = merge_settings(None, None, overrides).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { .. }));
    }

    #[test]
    fn test_load_settings_with_workspace_file() {
        let temp = TempDir::new().unwrap();
        std::fs::write(
            temp.path().join(".opcontext.json"),
            r#"{"correlation": false}"#,
        )
        .unwrap();

        let overrides = ClientSettings {
            id_format: Some(IdFormat::Hex),
            ..Default::default()
        };
        let resolved = load_settings(temp.path(), overrides).unwrap();
        assert!(!resolved.correlation);
        assert_eq!(resolved.id_format, IdFormat::Hex);
    }
}
