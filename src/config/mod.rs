//! Configuration loading for rfcindex.

use std::path::PathBuf;

use anyhow::Context;
use directories::{BaseDirs, ProjectDirs};
use serde::Deserialize;

use crate::storage::mirror::MirrorTree;
use crate::storage::sqlite::DB_FILENAME;

/// Environment variable naming an alternative config file.
pub const CONFIG_ENV: &str = "RFCINDEX_CONFIG";

/// Top-level configuration loaded from config.toml.
#[derive(Debug, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub data: DataConfig,
}

/// Where the mirror, index and database live.
#[derive(Debug, Deserialize)]
pub struct DataConfig {
    /// Mirror root.
    #[serde(default = "default_data_dir")]
    pub dir: String,

    /// Database file; defaults to `rfc-index.sqlite3` under `dir`.
    #[serde(default)]
    pub database: Option<String>,

    /// XML index; defaults to `rfc/rfc-index.xml` under `dir`.
    #[serde(default)]
    pub index: Option<String>,
}

fn default_data_dir() -> String {
    ProjectDirs::from("", "", "rfcindex").map_or_else(
        || "~/.local/share/rfcindex".to_string(),
        |dirs| dirs.data_dir().to_string_lossy().into_owned(),
    )
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            dir: default_data_dir(),
            database: None,
            index: None,
        }
    }
}

impl Config {
    /// Load config from `$RFCINDEX_CONFIG` or ~/.config/rfcindex/config.toml,
    /// or return defaults if neither exists.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load() -> anyhow::Result<Self> {
        if let Some(path) = Self::config_path() {
            if path.exists() {
                let contents = std::fs::read_to_string(&path)
                    .with_context(|| format!("Failed to read {}", path.display()))?;
                let config: Config = toml::from_str(&contents)
                    .with_context(|| format!("Invalid config {}", path.display()))?;
                return Ok(config);
            }
        }

        Ok(Config::default())
    }

    #[must_use]
    pub fn config_path() -> Option<PathBuf> {
        if let Some(path) = std::env::var_os(CONFIG_ENV) {
            return Some(PathBuf::from(path));
        }
        ProjectDirs::from("", "", "rfcindex").map(|dirs| dirs.config_dir().join("config.toml"))
    }

    #[must_use]
    pub fn data_dir(&self) -> PathBuf {
        expand_tilde(&self.data.dir)
    }

    #[must_use]
    pub fn mirror(&self) -> MirrorTree {
        MirrorTree::new(self.data_dir())
    }

    #[must_use]
    pub fn database_path(&self) -> PathBuf {
        match &self.data.database {
            Some(path) => expand_tilde(path),
            None => self.data_dir().join(DB_FILENAME),
        }
    }

    #[must_use]
    pub fn index_path(&self) -> PathBuf {
        match &self.data.index {
            Some(path) => expand_tilde(path),
            None => self.mirror().index_path(),
        }
    }
}

/// Expand ~ to the user's home directory.
#[must_use]
pub fn expand_tilde(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/") {
        if let Some(base_dirs) = BaseDirs::new() {
            return base_dirs.home_dir().join(rest);
        }
    }
    PathBuf::from(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(toml_text: &str) -> Config {
        toml::from_str(toml_text).unwrap()
    }

    #[test]
    fn paths_default_under_data_dir() {
        let config = parse("[data]\ndir = \"/srv/rfc\"\n");
        assert_eq!(config.data_dir(), PathBuf::from("/srv/rfc"));
        assert_eq!(
            config.database_path(),
            PathBuf::from("/srv/rfc/rfc-index.sqlite3")
        );
        assert_eq!(
            config.index_path(),
            PathBuf::from("/srv/rfc/rfc/rfc-index.xml")
        );
    }

    #[test]
    fn explicit_paths_win() {
        let config = parse(
            "[data]\ndir = \"/srv/rfc\"\ndatabase = \"/tmp/x.db\"\nindex = \"/tmp/i.xml\"\n",
        );
        assert_eq!(config.database_path(), PathBuf::from("/tmp/x.db"));
        assert_eq!(config.index_path(), PathBuf::from("/tmp/i.xml"));
    }

    #[test]
    fn empty_file_uses_defaults() {
        let config = parse("");
        assert_eq!(config.data.dir, default_data_dir());
        assert!(config.data.database.is_none());
    }

    #[test]
    fn tilde_expansion() {
        let expanded = expand_tilde("~/rfc");
        if BaseDirs::new().is_some() {
            assert!(!expanded.starts_with("~"));
            assert!(expanded.ends_with("rfc"));
        }
        assert_eq!(expand_tilde("/abs/~/x"), PathBuf::from("/abs/~/x"));
    }
}
