use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::errors::EditorError;

pub const DEFAULT_CONFIG_NAME: &str = "procflow.config.json";

/// Editor configuration file format
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EditorConfig {
    /// Undo history depth (0 = unlimited)
    #[serde(default = "default_max_undo_levels")]
    pub max_undo_levels: usize,

    /// Check the reference-count invariant after every unit
    #[serde(default = "default_verify_invariants")]
    pub verify_invariants: bool,

    /// Seed for generated ids; derived from the document name when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id_seed: Option<String>,
}

fn default_max_undo_levels() -> usize {
    100
}

fn default_verify_invariants() -> bool {
    true
}

impl EditorConfig {
    /// Load config from a directory
    pub fn load(dir: impl AsRef<Path>) -> Result<Self, EditorError> {
        let config_path = dir.as_ref().join(DEFAULT_CONFIG_NAME);

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            let config: EditorConfig = serde_json::from_str(&content)?;
            Ok(config)
        } else {
            // Return default config if none exists
            Ok(EditorConfig::default())
        }
    }
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            max_undo_levels: default_max_undo_levels(),
            verify_invariants: default_verify_invariants(),
            id_seed: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_config() {
        let json = r#"{
            "maxUndoLevels": 20,
            "verifyInvariants": false,
            "idSeed": "fixed"
        }"#;

        let config: EditorConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.max_undo_levels, 20);
        assert!(!config.verify_invariants);
        assert_eq!(config.id_seed.as_deref(), Some("fixed"));
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let config: EditorConfig = serde_json::from_str(r#"{ "idSeed": "x" }"#).unwrap();
        assert_eq!(config.max_undo_levels, 100);
        assert!(config.verify_invariants);
    }

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = std::env::temp_dir().join("procflow-config-missing");
        let config = EditorConfig::load(&dir).unwrap();
        assert_eq!(config, EditorConfig::default());
    }

    #[test]
    fn test_load_from_directory() {
        let dir = std::env::temp_dir().join(format!("procflow-config-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join(DEFAULT_CONFIG_NAME), r#"{ "maxUndoLevels": 3 }"#).unwrap();

        let config = EditorConfig::load(&dir).unwrap();
        assert_eq!(config.max_undo_levels, 3);

        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_malformed_file_is_config_error() {
        let dir = std::env::temp_dir().join(format!("procflow-config-bad-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join(DEFAULT_CONFIG_NAME), "{ not json").unwrap();

        let err = EditorConfig::load(&dir).unwrap_err();
        assert_eq!(err.reason_code(), "config");

        std::fs::remove_dir_all(&dir).unwrap();
    }
}
