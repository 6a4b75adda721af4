// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Operation id generation.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ConfigError;

/// Textual format used for freshly generated operation ids.
///
/// Ids supplied by the caller are never reformatted; this only governs ids
/// the client has to make up itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IdFormat {
    /// Hyphenated UUID, e.g. `550e8400-e29b-41d4-a716-446655440000`.
    #[default]
    Uuid,
    /// 32 lowercase hex characters, W3C trace-id sized.
    Hex,
}

impl IdFormat {
    /// Generate a new globally unique operation id.
    pub fn generate(&self) -> String {
        let id = Uuid::new_v4();
        match self {
            IdFormat::Uuid => id.hyphenated().to_string(),
            IdFormat::Hex => id.simple().to_string(),
        }
    }
}

impl fmt::Display for IdFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IdFormat::Uuid => write!(f, "uuid"),
            IdFormat::Hex => write!(f, "hex"),
        }
    }
}

impl FromStr for IdFormat {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "uuid" => Ok(IdFormat::Uuid),
            "hex" => Ok(IdFormat::Hex),
            other => Err(ConfigError::invalid_value(
                "idFormat",
                format!("unknown id format '{}'", other),
            )),
        }
    }
}

/// Short representation of an id for log lines (first 8 characters).
pub fn short_id(id: &str) -> &str {
    match id.char_indices().nth(8) {
        Some((idx, _)) => &id[..idx],
        None => id,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_is_unique() {
        let a = IdFormat::Uuid.generate();
        let b = IdFormat::Uuid.generate();
        assert_ne!(a, b);
    }

    #[test]
    fn test_uuid_format() {
        let id = IdFormat::Uuid.generate();
        assert_eq!(id.len(), 36);
        assert!(Uuid::parse_str(&id).is_ok());
    }

    #[test]
    fn test_hex_format() {
        let id = IdFormat::Hex.generate();
        assert_eq!(id.len(), 32);
        assert!(id.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
    }

    #[test]
    fn test_from_str() {
        assert_eq!("UUID".parse::<IdFormat>().unwrap(), IdFormat::Uuid);
        assert_eq!("hex".parse::<IdFormat>().unwrap(), IdFormat::Hex);
        assert!("base64".parse::<IdFormat>().is_err());
    }

    #[test]
    fn test_serde() {
        let json = serde_json::to_string(&IdFormat::Hex).unwrap();
        assert_eq!(json, "\"hex\"");
        let parsed: IdFormat = serde_json::from_str("\"uuid\"").unwrap();
        assert_eq!(parsed, IdFormat::Uuid);
    }

    #[test]
    fn test_short_id() {
        assert_eq!(short_id("550e8400-e29b-41d4"), "550e8400");
        assert_eq!(short_id("ROOT"), "ROOT");
    }
}
