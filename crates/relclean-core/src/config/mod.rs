//! Configuration management

use crate::error::{CleanupError, Result};
use crate::registry::ServiceRegistry;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Environment variable naming an alternative config file
pub const CONFIG_ENV: &str = "RELCLEAN_CONFIG";

/// Environment variable overriding the database path
pub const DATABASE_ENV: &str = "RELCLEAN_DB";

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// SQLite database to clean up
    #[serde(default)]
    pub database: Option<PathBuf>,

    /// Schema metadata file
    #[serde(default)]
    pub schema: Option<PathBuf>,

    /// Run services without writing unless told otherwise
    #[serde(default = "default_dry_run")]
    pub dry_run: bool,

    /// User recorded on execution logs
    #[serde(default)]
    pub user_id: Option<i64>,

    /// Extra localization catalogs, consulted before the built-in one
    #[serde(default)]
    pub localization_paths: Vec<PathBuf>,

    /// Per-service flags, applied onto the registry
    #[serde(default)]
    pub services: HashMap<String, ServiceSettings>,

    #[serde(default)]
    pub history: HistoryConfig,
}

/// Overrides for one registered service; unset flags keep their registered value
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ServiceSettings {
    #[serde(default)]
    pub enabled: Option<bool>,
    #[serde(default)]
    pub scheduler_task: Option<bool>,
    #[serde(default)]
    pub toolbar: Option<bool>,
}

/// Execution log retention
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryConfig {
    #[serde(default = "default_retention_days")]
    pub retention_days: u32,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            retention_days: default_retention_days(),
        }
    }
}

fn default_dry_run() -> bool {
    true
}

fn default_retention_days() -> u32 {
    30
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database: None,
            schema: None,
            dry_run: default_dry_run(),
            user_id: None,
            localization_paths: Vec::new(),
            services: HashMap::new(),
            history: HistoryConfig::default(),
        }
    }
}

impl Config {
    /// Load config from `RELCLEAN_CONFIG` or the default path
    pub fn load() -> Result<Self> {
        match std::env::var_os(CONFIG_ENV) {
            Some(path) => Self::load_from(PathBuf::from(path)),
            None => {
                let path = Self::default_path();
                if path.exists() {
                    Self::load_from(path)
                } else {
                    Ok(Config::default())
                }
            }
        }
    }

    /// Load config from an explicit file, which must exist
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            CleanupError::Config(format!("cannot read {}: {}", path.display(), e))
        })?;
        let config: Config = serde_yaml::from_str(&content)?;
        Ok(config)
    }

    /// Save config to default path
    pub fn save(&self) -> Result<()> {
        let path = Self::default_path();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = serde_yaml::to_string(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Get default config path
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(crate::CONFIG_DIR_NAME)
            .join("config.yml")
    }

    /// Database path: `RELCLEAN_DB`, then the config, then the cache default
    pub fn database_path(&self) -> PathBuf {
        std::env::var_os(DATABASE_ENV)
            .map(PathBuf::from)
            .or_else(|| self.database.clone())
            .unwrap_or_else(crate::db::Database::default_path)
    }

    /// Apply the per-service flags; naming an unregistered service is an error
    pub fn apply_to(&self, registry: &mut ServiceRegistry) -> Result<()> {
        for (identifier, settings) in &self.services {
            if let Some(enabled) = settings.enabled {
                registry.set_enabled(identifier, enabled)?;
            }
            if let Some(scheduler_task) = settings.scheduler_task {
                registry.set_scheduler_task(identifier, scheduler_task)?;
            }
            if let Some(toolbar) = settings.toolbar {
                registry.set_toolbar(identifier, toolbar)?;
            }
            if registry.get(identifier).is_none() {
                return Err(CleanupError::NotRegistered(identifier.clone()));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config: Config = serde_yaml::from_str("{}").unwrap();
        assert!(config.dry_run);
        assert_eq!(config.history.retention_days, 30);
        assert!(config.services.is_empty());
    }

    #[test]
    fn test_parse_full_config() {
        let yaml = r#"
database: /var/lib/site.sqlite
schema: schema.yml
dry_run: false
user_id: 3
localization_paths: [custom.yml]
services:
  missingRelations:
    scheduler_task: false
history:
  retention_days: 7
"#;
        let config: Config = serde_yaml::from_str(yaml).unwrap();
        assert!(!config.dry_run);
        assert_eq!(config.user_id, Some(3));
        assert_eq!(config.history.retention_days, 7);

        let mut registry = ServiceRegistry::with_defaults();
        config.apply_to(&mut registry).unwrap();
        assert_eq!(registry.scheduler_services(), vec!["corruptRelations"]);
        assert!(registry.get("missingRelations").unwrap().options.enabled);
    }

    #[test]
    fn test_unknown_service_in_config() {
        let config: Config = serde_yaml::from_str("services:\n  lostFiles: {}\n").unwrap();
        let mut registry = ServiceRegistry::with_defaults();
        assert!(matches!(
            config.apply_to(&mut registry),
            Err(CleanupError::NotRegistered(_))
        ));
    }

    #[test]
    fn test_load_from_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = Config::load_from(dir.path().join("absent.yml")).unwrap_err();
        assert!(matches!(err, CleanupError::Config(_)));
    }
}
