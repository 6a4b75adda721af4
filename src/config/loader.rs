// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Configuration loading from files.

use std::path::{Path, PathBuf};

use crate::error::ConfigError;

use super::types::ClientSettings;

/// Workspace config file names to search for (in order).
pub const CONFIG_FILES: &[&str] = &[".opcontext.json", ".opcontext.yaml", "opcontext.config.json"];

/// Global config directory name.
pub const GLOBAL_CONFIG_DIR: &str = ".opcontext";

/// Global config file name.
pub const GLOBAL_CONFIG_FILE: &str = "config.json";

/// Get the global config directory path.
pub fn get_global_config_dir() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(GLOBAL_CONFIG_DIR))
}

/// Get the global config file path.
pub fn get_global_config_path() -> Option<PathBuf> {
    get_global_config_dir().map(|dir| dir.join(GLOBAL_CONFIG_FILE))
}

/// Load global settings from ~/.opcontext/config.json.
pub fn load_global_settings() -> Result<Option<ClientSettings>, ConfigError> {
    let path = match get_global_config_path() {
        Some(p) => p,
        None => return Ok(None),
    };

    if !path.exists() {
        return Ok(None);
    }

    load_settings_file(&path).map(Some)
}

/// Load workspace settings from the first config file found in `workspace_root`.
pub fn load_workspace_settings(workspace_root: &Path) -> Result<Option<ClientSettings>, ConfigError> {
    for filename in CONFIG_FILES {
        let path = workspace_root.join(filename);
        if path.exists() {
            return load_settings_file(&path).map(Some);
        }
    }
    Ok(None)
}

/// Load a settings file (JSON or YAML, chosen by extension).
pub fn load_settings_file(path: &Path) -> Result<ClientSettings, ConfigError> {
    let content = std::fs::read_to_string(path)?;

    let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("");

    match extension.to_lowercase().as_str() {
        "yaml" | "yml" => serde_yaml::from_str(&content).map_err(ConfigError::from),
        _ => serde_json::from_str(&content).map_err(ConfigError::from),
    }
}

/// Write settings to `<workspace_root>/.opcontext.json`.
pub fn save_workspace_settings(
    workspace_root: &Path,
    settings: &ClientSettings,
) -> Result<PathBuf, ConfigError> {
    let path = workspace_root.join(CONFIG_FILES[0]);
    let content = serde_json::to_string_pretty(settings)?;
    std::fs::write(&path, content)?;
    Ok(path)
}
