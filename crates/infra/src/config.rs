//! Configuration loading and representation.
//!
//! A [`SessionConfig`] decides the behaviours the tracking layer leaves open: what a
//! commit does with objects added and removed inside the same unit of work, and what
//! happens when the same identity is added twice.

use core::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const ENV_TRANSIENT_REMOVAL: &str = "CHANGESET_TRANSIENT_REMOVAL";
pub const ENV_DUPLICATE_ADD: &str = "CHANGESET_DUPLICATE_ADD";
pub const ENV_LOG_OPERATIONS: &str = "CHANGESET_LOG_OPERATIONS";

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid value '{value}' for {name}")]
    InvalidValue { name: &'static str, value: String },

    #[error("malformed configuration: {0}")]
    Malformed(String),
}

/// Commit behaviour for an object that was added and then removed before any commit.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransientRemoval {
    /// The object never reaches the committer.
    #[default]
    Discard,
    /// A single delete is emitted, as for any removed object.
    Delete,
    /// An insert followed by a delete, both at the removal's position.
    InsertThenDelete,
}

impl FromStr for TransientRemoval {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "discard" => Ok(Self::Discard),
            "delete" => Ok(Self::Delete),
            "insert_then_delete" => Ok(Self::InsertThenDelete),
            _ => Err(ConfigError::InvalidValue {
                name: ENV_TRANSIENT_REMOVAL,
                value: s.to_string(),
            }),
        }
    }
}

/// Behaviour of `add` when the identity is already tracked.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DuplicateAdd {
    /// Fail with `ChangeSetError::DuplicateIdentity`.
    #[default]
    Reject,
    /// The later object supersedes a still-new earlier one. Tracked objects that already
    /// exist in the store are never superseded.
    Replace,
}

impl FromStr for DuplicateAdd {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "reject" => Ok(Self::Reject),
            "replace" => Ok(Self::Replace),
            _ => Err(ConfigError::InvalidValue {
                name: ENV_DUPLICATE_ADD,
                value: s.to_string(),
            }),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    pub transient_removal: TransientRemoval,
    pub duplicate_add: DuplicateAdd,
    /// Log every planned operation at `debug` level during commit.
    pub log_operations: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            transient_removal: TransientRemoval::default(),
            duplicate_add: DuplicateAdd::default(),
            log_operations: true,
        }
    }
}

impl SessionConfig {
    /// Defaults overridden by `CHANGESET_*` environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        serde_json::from_str(json).map_err(|e| ConfigError::Malformed(e.to_string()))
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Some(v) = lookup(ENV_TRANSIENT_REMOVAL) {
            config.transient_removal = v.parse()?;
        }
        if let Some(v) = lookup(ENV_DUPLICATE_ADD) {
            config.duplicate_add = v.parse()?;
        }
        if let Some(v) = lookup(ENV_LOG_OPERATIONS) {
            config.log_operations = match v.trim().to_ascii_lowercase().as_str() {
                "1" | "true" | "yes" => true,
                "0" | "false" | "no" => false,
                _ => {
                    return Err(ConfigError::InvalidValue {
                        name: ENV_LOG_OPERATIONS,
                        value: v,
                    });
                }
            };
        }

        Ok(config)
    }

    pub fn with_transient_removal(mut self, policy: TransientRemoval) -> Self {
        self.transient_removal = policy;
        self
    }

    pub fn with_duplicate_add(mut self, policy: DuplicateAdd) -> Self {
        self.duplicate_add = policy;
        self
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn defaults_discard_transients_and_reject_duplicates() {
        let config = SessionConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config, SessionConfig::default());
        assert_eq!(config.transient_removal, TransientRemoval::Discard);
        assert_eq!(config.duplicate_add, DuplicateAdd::Reject);
    }

    #[test]
    fn reads_overrides_from_environment() {
        let config = SessionConfig::from_lookup(lookup(&[
            (ENV_TRANSIENT_REMOVAL, "Insert_Then_Delete"),
            (ENV_DUPLICATE_ADD, "replace"),
            (ENV_LOG_OPERATIONS, "no"),
        ]))
        .unwrap();

        assert_eq!(config.transient_removal, TransientRemoval::InsertThenDelete);
        assert_eq!(config.duplicate_add, DuplicateAdd::Replace);
        assert!(!config.log_operations);
    }

    #[test]
    fn rejects_unknown_values() {
        let err = SessionConfig::from_lookup(lookup(&[(ENV_TRANSIENT_REMOVAL, "maybe")]))
            .unwrap_err();
        assert_eq!(
            err,
            ConfigError::InvalidValue {
                name: ENV_TRANSIENT_REMOVAL,
                value: "maybe".to_string()
            }
        );
    }

    #[test]
    fn parses_partial_json() {
        let config = SessionConfig::from_json(r#"{"transient_removal":"delete"}"#).unwrap();
        assert_eq!(config.transient_removal, TransientRemoval::Delete);
        assert_eq!(config.duplicate_add, DuplicateAdd::Reject);
        assert!(config.log_operations);

        assert!(matches!(
            SessionConfig::from_json("{"),
            Err(ConfigError::Malformed(_))
        ));
    }
}
