//! Configuration management for the CLI.
//!
//! ```toml
//! data_dir = "/var/lib/altgraph"
//!
//! [settings]
//! color = true
//! format = "table"
//!
//! [refresh]
//! feed_url = "https://example.com/alts.json"
//!
//! [quarantine]
//! enabled = true
//! seed_identities = ["Spigey"]
//! ```

use crate::error::{CliError, Result};
use altgraph_refresh::{QuarantineConfig, RefreshConfig};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Name of the config file looked up inside the data directory
pub const CONFIG_FILE: &str = "altgraph.toml";
/// Identity snapshot file name
pub const SNAPSHOT_FILE: &str = "alts_data.json";
/// Geolocation cache file name
pub const GEO_CACHE_FILE: &str = "ip_geo_data.json";
/// Override rules file name
pub const OVERRIDES_FILE: &str = "alts_overrides.json";

/// CLI configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Directory holding the snapshot, geo cache and overrides
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    /// Display settings
    #[serde(default)]
    pub settings: Settings,

    /// Refresh cycle settings
    #[serde(default)]
    pub refresh: RefreshConfig,

    /// Quarantine policy
    #[serde(default)]
    pub quarantine: QuarantineConfig,
}

/// Global CLI settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Enable colored output
    #[serde(default = "default_true")]
    pub color: bool,

    /// Default output format
    #[serde(default = "default_format")]
    pub format: OutputFormat,
}

/// Output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Table format
    Table,
    /// JSON format
    Json,
    /// Quiet (minimal) format
    Quiet,
}

impl Config {
    /// Load configuration
    ///
    /// An explicit `path` must exist. Otherwise `<data_dir>/altgraph.toml` is
    /// read when present, and defaults are used when it is not. A
    /// `data_dir` override always wins over the file's `data_dir`.
    pub fn load(path: Option<&Path>, data_dir: Option<PathBuf>) -> Result<Self> {
        let mut config = match path {
            Some(path) => {
                if !path.exists() {
                    return Err(CliError::Config(format!(
                        "Config file {} does not exist",
                        path.display()
                    )));
                }
                Self::from_toml(&fs::read_to_string(path)?)?
            }
            None => {
                let dir = data_dir.clone().unwrap_or_else(default_data_dir);
                let candidate = dir.join(CONFIG_FILE);
                if candidate.exists() {
                    tracing::debug!("Loading config from {}", candidate.display());
                    Self::from_toml(&fs::read_to_string(&candidate)?)?
                } else {
                    Self::default()
                }
            }
        };

        if let Some(dir) = data_dir {
            config.data_dir = dir;
        }
        config.validate()?;
        Ok(config)
    }

    /// Parse from TOML text
    pub fn from_toml(text: &str) -> Result<Self> {
        Ok(toml::from_str(text)?)
    }

    /// Serialize to TOML text
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self)
            .map_err(|e| CliError::Config(format!("Failed to serialize config: {}", e)))
    }

    /// Check the refresh and quarantine sections
    pub fn validate(&self) -> Result<()> {
        self.refresh.validate()?;
        self.quarantine.validate()?;
        Ok(())
    }

    /// Path of the identity snapshot
    pub fn snapshot_path(&self) -> PathBuf {
        self.data_dir.join(SNAPSHOT_FILE)
    }

    /// Path of the geolocation cache
    pub fn geo_cache_path(&self) -> PathBuf {
        self.data_dir.join(GEO_CACHE_FILE)
    }

    /// Path of the override rules
    pub fn overrides_path(&self) -> PathBuf {
        self.data_dir.join(OVERRIDES_FILE)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            settings: Settings::default(),
            refresh: RefreshConfig::default(),
            quarantine: QuarantineConfig::default(),
        }
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            color: true,
            format: OutputFormat::Table,
        }
    }
}

fn default_data_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("altgraph")
}

fn default_true() -> bool {
    true
}

fn default_format() -> OutputFormat {
    OutputFormat::Table
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert!(config.data_dir.ends_with("altgraph"));
        assert!(config.settings.color);
        assert_eq!(config.settings.format, OutputFormat::Table);
        assert!(!config.quarantine.enabled);
    }

    #[test]
    fn test_sections_parse() {
        let config = Config::from_toml(
            r#"
            data_dir = "/tmp/alts"

            [settings]
            format = "json"

            [refresh]
            feed_url = "https://example.com/alts.json"
            interval_minutes = 15

            [quarantine]
            enabled = true
            seed_identities = ["Spigey"]
            trusted_ips = ["193.32.248.162"]
            "#,
        )
        .unwrap();

        assert_eq!(config.data_dir, PathBuf::from("/tmp/alts"));
        assert_eq!(config.settings.format, OutputFormat::Json);
        assert!(config.settings.color);
        assert_eq!(config.refresh.interval_minutes, 15);
        assert_eq!(config.refresh.lookups_per_refresh, 3);
        assert!(config.quarantine.seed().is_some());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_data_dir_file_used_when_present() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join(CONFIG_FILE),
            "[refresh]\nfeed_url = \"https://example.com/feed\"\n",
        )
        .unwrap();

        let config = Config::load(None, Some(dir.path().to_path_buf())).unwrap();
        assert_eq!(config.refresh.feed_url, "https://example.com/feed");
        assert_eq!(config.data_dir, dir.path());
        assert_eq!(config.snapshot_path(), dir.path().join(SNAPSHOT_FILE));
    }

    #[test]
    fn test_missing_data_dir_file_uses_defaults() {
        let dir = TempDir::new().unwrap();
        let config = Config::load(None, Some(dir.path().to_path_buf())).unwrap();
        assert!(config.refresh.feed_url.is_empty());
    }

    #[test]
    fn test_missing_explicit_file_is_error() {
        let dir = TempDir::new().unwrap();
        let result = Config::load(Some(&dir.path().join("nope.toml")), None);
        assert!(matches!(result, Err(CliError::Config(_))));
    }

    #[test]
    fn test_invalid_section_rejected() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("bad.toml");
        fs::write(&path, "[quarantine]\ntrusted_ips = [\"not-an-ip\"]\n").unwrap();
        assert!(matches!(
            Config::load(Some(&path), None),
            Err(CliError::Refresh(_))
        ));
    }

    #[test]
    fn test_toml_round_trip_keeps_data_dir() {
        let config = Config {
            data_dir: PathBuf::from("/srv/altgraph"),
            ..Default::default()
        };
        let text = config.to_toml().unwrap();
        assert_eq!(Config::from_toml(&text).unwrap().data_dir, config.data_dir);
    }
}
