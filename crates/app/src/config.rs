use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

pub const CONFIG_FILE: &str = "cartola.toml";
const DATABASE_FILE: &str = "cartola.db";

/// Rows shown in the `preview` part of a scan.
pub const DEFAULT_PREVIEW_ROWS: usize = 20;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// SQLite file; defaults to the platform data directory.
    pub database_path: Option<PathBuf>,
    /// `tracing` filter used when `RUST_LOG` is not set.
    pub log_filter: String,
    pub preview_rows: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_path: None,
            log_filter: "info".to_string(),
            preview_rows: DEFAULT_PREVIEW_ROWS,
        }
    }
}

impl Config {
    pub fn database_path(&self) -> Result<PathBuf> {
        match &self.database_path {
            Some(path) => Ok(path.clone()),
            None => Ok(project_dirs()?.data_dir().join(DATABASE_FILE)),
        }
    }
}

fn project_dirs() -> Result<ProjectDirs> {
    ProjectDirs::from("cl", "cartola", "cartola").context("could not determine home directory")
}

pub fn default_config_path() -> Result<PathBuf> {
    Ok(project_dirs()?.config_dir().join(CONFIG_FILE))
}

/// Read `path`, or fall back to defaults when the file does not exist.
pub fn load_config(path: &Path) -> Result<Config> {
    if !path.exists() {
        return Ok(Config::default());
    }
    let s = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    toml::from_str(&s).with_context(|| format!("parse {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn missing_file_gives_defaults() {
        let dir = TempDir::new().unwrap();
        let cfg = load_config(&dir.path().join(CONFIG_FILE)).unwrap();
        assert_eq!(cfg, Config::default());
        assert_eq!(cfg.preview_rows, 20);
        assert_eq!(cfg.log_filter, "info");
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(CONFIG_FILE);
        fs::write(&path, "database_path = \"/tmp/ledger.db\"\npreview_rows = 5\n").unwrap();

        let cfg = load_config(&path).unwrap();
        assert_eq!(cfg.database_path, Some(PathBuf::from("/tmp/ledger.db")));
        assert_eq!(cfg.preview_rows, 5);
        assert_eq!(cfg.log_filter, "info");
        assert_eq!(cfg.database_path().unwrap(), PathBuf::from("/tmp/ledger.db"));
    }

    #[test]
    fn malformed_file_is_an_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(CONFIG_FILE);
        fs::write(&path, "preview_rows = \"many\"").unwrap();
        assert!(load_config(&path).is_err());
    }
}
