//! Configuration loading and database path resolution.
//!
//! Precedence: command-line flag (or its environment variable), then the
//! TOML config file, then platform defaults from `directories`.

use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use serde::Deserialize;
use thiserror::Error;

pub const DEFAULT_CREATED_BY: &str = "unassigned";
const CONFIG_FILE_NAME: &str = "config.toml";
const DB_FILE_NAME: &str = "groups.sqlite";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("unable to resolve {0} directory")]
    NoProjectDir(&'static str),
    #[error("failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse config {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AppConfig {
    pub db_path: Option<PathBuf>,
    pub created_by: String,
    pub customer_id: Option<String>,
    pub log_level: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            db_path: None,
            created_by: DEFAULT_CREATED_BY.to_string(),
            customer_id: None,
            log_level: "info".to_string(),
        }
    }
}

fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("com", "metergroups", "meter-groups")
}

pub fn default_config_path() -> Option<PathBuf> {
    project_dirs().map(|dirs| dirs.config_dir().join(CONFIG_FILE_NAME))
}

pub fn default_db_path() -> Result<PathBuf, ConfigError> {
    let dirs = project_dirs().ok_or(ConfigError::NoProjectDir("data"))?;
    Ok(dirs.data_local_dir().join(DB_FILE_NAME))
}

impl AppConfig {
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// An explicit path must exist; the default location is optional.
    pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(path) = explicit {
            return Self::from_file(path);
        }
        match default_config_path() {
            Some(path) if path.exists() => Self::from_file(&path),
            _ => Ok(Self::default()),
        }
    }

    pub fn resolve_db_path(&self, cli_db: Option<&Path>) -> Result<PathBuf, ConfigError> {
        if let Some(path) = cli_db {
            return Ok(path.to_path_buf());
        }
        if let Some(path) = &self.db_path {
            return Ok(path.clone());
        }
        default_db_path()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_file_keeps_defaults() {
        let config: AppConfig =
            toml::from_str("created_by = \"ops@example.com\"").expect("should parse config");

        assert_eq!(config.created_by, "ops@example.com");
        assert_eq!(config.log_level, "info");
        assert_eq!(config.db_path, None);
    }

    #[test]
    fn unknown_keys_are_rejected() {
        assert!(toml::from_str::<AppConfig>("colour = \"blue\"").is_err());
    }

    #[test]
    fn cli_path_wins_over_config() {
        let config = AppConfig {
            db_path: Some(PathBuf::from("/from/config.sqlite")),
            ..AppConfig::default()
        };

        let from_cli = config
            .resolve_db_path(Some(Path::new("/from/cli.sqlite")))
            .expect("should resolve");
        let from_config = config.resolve_db_path(None).expect("should resolve");

        assert_eq!(from_cli, PathBuf::from("/from/cli.sqlite"));
        assert_eq!(from_config, PathBuf::from("/from/config.sqlite"));
    }
}
