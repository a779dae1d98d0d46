use crate::error::{RuntimeError, RuntimeResult};
use anticipate_path::PathConfig;
use anticipate_simulator::SimulatorConfig;
use anticipate_vdom::ValidationConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const DEFAULT_CONFIG_NAME: &str = "anticipate.config.json";

/// Engine configuration file format
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EngineConfig {
    /// Sibling slot allocation
    #[serde(default)]
    pub paths: PathConfig,

    /// Tree limits checked before every reconciliation
    #[serde(default)]
    pub validation: ValidationConfig,

    /// Conditional path simulation bounds
    #[serde(default)]
    pub simulation: SimulatorConfig,
}

impl EngineConfig {
    /// Load config from a directory, falling back to defaults when the
    /// file does not exist
    pub fn load(dir: impl AsRef<Path>) -> RuntimeResult<Self> {
        let config_path = dir.as_ref().join(DEFAULT_CONFIG_NAME);
        if config_path.exists() {
            Self::from_file(&config_path)
        } else {
            Ok(Self::default())
        }
    }

    pub fn from_file(path: &Path) -> RuntimeResult<Self> {
        let content = std::fs::read_to_string(path)?;
        serde_json::from_str(&content).map_err(|e| RuntimeError::Config {
            path: PathBuf::from(path),
            reason: e.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_config() {
        let json = r#"{
            "paths": { "gap": 1024 },
            "validation": { "maxDepth": 12, "maxNodes": 500 },
            "simulation": { "maxBindings": 8, "includeSiblingBindings": false }
        }"#;

        let config: EngineConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.paths.gap, 1024);
        assert_eq!(config.paths.rebalance_floor, 16);
        assert_eq!(config.validation.max_depth, 12);
        assert_eq!(config.validation.max_nodes, 500);
        assert_eq!(config.validation.max_children, 1_000);
        assert_eq!(config.simulation.max_bindings, 8);
        assert!(!config.simulation.include_sibling_bindings);
    }

    #[test]
    fn test_default_config() {
        let config: EngineConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config, EngineConfig::default());
        assert_eq!(config.simulation.max_bindings, 20);
        assert!(config.simulation.include_sibling_bindings);
    }

    #[test]
    fn test_load_missing_file_uses_defaults() {
        let dir = std::env::temp_dir().join("anticipate-config-missing");
        let config = EngineConfig::load(&dir).unwrap();
        assert_eq!(config, EngineConfig::default());
    }

    #[test]
    fn test_load_reports_bad_json() {
        let dir = std::env::temp_dir().join(format!("anticipate-config-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join(DEFAULT_CONFIG_NAME), "{ not json").unwrap();

        let result = EngineConfig::load(&dir);
        assert!(matches!(result, Err(RuntimeError::Config { .. })));

        std::fs::remove_dir_all(&dir).unwrap();
    }
}
