//! Runtime configuration.
//!
//! Loaded from an optional JSON file; every key falls back to its default
//! so a partial file is valid.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::db::AssignmentPolicy;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Input length and size limits enforced by the API layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Limits {
    pub max_task_title_length: usize,
    pub max_task_description_length: usize,
    pub max_project_name_length: usize,
    pub max_project_members: usize,
    pub max_username_length: usize,
}

impl Default for Limits {
    fn default() -> Self {
        Limits {
            max_task_title_length: 200,
            max_task_description_length: 2000,
            max_project_name_length: 100,
            max_project_members: 50,
            max_username_length: 100,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NotificationSettings {
    pub smtp_enabled: bool,
    pub smtp_host: String,
    pub smtp_port: u16,
    pub sender: String,
}

impl Default for NotificationSettings {
    fn default() -> Self {
        NotificationSettings {
            smtp_enabled: true,
            smtp_host: "smtp.example.com".to_string(),
            smtp_port: 587,
            sender: "noreply@example.com".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub limits: Limits,
    pub notifications: NotificationSettings,
    pub assignment_policy: AssignmentPolicy,
}

impl Config {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json(&raw).map_err(|source| ConfigError::Parse {
            path: path.display().to_string(),
            source,
        })
    }

    pub fn from_json(raw: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_partial_config_uses_defaults() {
        let cfg = Config::from_json(
            r#"{"limits": {"max_project_members": 3}, "assignment_policy": "move-back-reference"}"#,
        )
        .unwrap();
        assert_eq!(cfg.limits.max_project_members, 3);
        assert_eq!(cfg.limits.max_task_title_length, 200);
        assert!(cfg.notifications.smtp_enabled);
        assert_eq!(cfg.assignment_policy, AssignmentPolicy::MoveBackReference);
    }

    #[test]
    fn test_empty_object_is_default() {
        assert_eq!(Config::from_json("{}").unwrap(), Config::default());
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"notifications": {{"smtp_enabled": false}}}}"#).unwrap();
        let cfg = Config::load(file.path()).unwrap();
        assert!(!cfg.notifications.smtp_enabled);
        assert_eq!(cfg.notifications.smtp_port, 587);
    }

    #[test]
    fn test_load_errors() {
        let missing = Config::load(Path::new("/definitely/not/here.json"));
        assert!(matches!(missing, Err(ConfigError::Read { .. })));

        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "not json").unwrap();
        assert!(matches!(Config::load(file.path()), Err(ConfigError::Parse { .. })));
    }
}
