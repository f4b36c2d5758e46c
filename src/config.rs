//! Configuration file loading.
//!
//! The config is a TOML file with an `[engine]` table:
//!
//! ```toml
//! [engine]
//! max_depth = 64
//! max_range_cells = 100000
//! ```
//!
//! Missing keys keep their defaults. Without `--config`, the file is looked
//! up as `config.toml` in the platform config directory and silently skipped
//! when absent.

use std::fs;
use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use serde::Deserialize;
use sheetcalc_engine::engine::EngineConfig;
use tracing::debug;

use crate::error::{Result, SheetcalcError};

#[derive(Debug, Default, Deserialize, PartialEq)]
#[serde(default)]
pub struct AppConfig {
    pub engine: EngineConfig,
}

impl AppConfig {
    pub fn from_toml(path: &Path, content: &str) -> Result<AppConfig> {
        toml::from_str(content).map_err(|source| SheetcalcError::Config {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn load(path: &Path) -> Result<AppConfig> {
        let content = fs::read_to_string(path).map_err(|source| SheetcalcError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        AppConfig::from_toml(path, &content)
    }

    /// Load the explicit file if given, else the user's config file if one
    /// exists, else defaults.
    pub fn resolve(explicit: Option<&Path>) -> Result<AppConfig> {
        if let Some(path) = explicit {
            return AppConfig::load(path);
        }
        match default_config_path() {
            Some(path) if path.exists() => {
                debug!(path = %path.display(), "loading user config");
                AppConfig::load(&path)
            }
            _ => Ok(AppConfig::default()),
        }
    }
}

fn default_config_path() -> Option<PathBuf> {
    let proj = ProjectDirs::from("", "", "sheetcalc")?;
    let mut path = proj.config_dir().to_path_buf();
    path.push("config.toml");
    Some(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_config_is_default() {
        let config = AppConfig::from_toml(Path::new("empty.toml"), "").unwrap();
        assert_eq!(config, AppConfig::default());
    }

    #[test]
    fn test_partial_engine_table() {
        let config =
            AppConfig::from_toml(Path::new("c.toml"), "[engine]\nmax_depth = 12\n").unwrap();
        assert_eq!(config.engine.max_depth, 12);
        assert_eq!(
            config.engine.max_range_cells,
            EngineConfig::default().max_range_cells
        );
    }

    #[test]
    fn test_bad_config_names_the_file() {
        let err = AppConfig::from_toml(Path::new("bad.toml"), "[engine]\nmax_depth = \"x\"\n")
            .unwrap_err();
        assert!(err.to_string().contains("bad.toml"));
    }

    #[test]
    fn test_missing_explicit_file_is_an_error() {
        let err = AppConfig::resolve(Some(Path::new("/nonexistent/sheetcalc.toml"))).unwrap_err();
        assert!(matches!(err, SheetcalcError::Io { .. }));
    }
}
