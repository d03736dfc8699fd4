//! Configuration loading and root folder resolution

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Environment variable overriding the root folder
pub const ENV_ROOT_FOLDER: &str = "ALTDIR_ROOT";
/// Environment variable overriding the database file path
pub const ENV_DATABASE_PATH: &str = "ALTDIR_DATABASE";
/// Environment variable overriding the keyword dictionary path
pub const ENV_DICTIONARY_PATH: &str = "ALTDIR_DICTIONARY";

/// Database file name inside the root folder
pub const DATABASE_FILE_NAME: &str = "altdir.db";

/// Contents of `config.toml`
///
/// Every field is optional; missing values fall through to environment
/// variables or compiled defaults.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TomlConfig {
    pub root_folder: Option<PathBuf>,
    pub database_path: Option<PathBuf>,
    pub dictionary_path: Option<PathBuf>,
    /// Status given to newly created alternatives ("pending", "approved", "rejected")
    pub default_status: Option<String>,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub scoring: ScoringConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// tracing level filter used when RUST_LOG is unset
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Range used when synthesizing health scores for new alternatives
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoringConfig {
    #[serde(default = "default_health_min")]
    pub health_min: i64,
    #[serde(default = "default_health_max")]
    pub health_max: i64,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            health_min: default_health_min(),
            health_max: default_health_max(),
        }
    }
}

fn default_health_min() -> i64 {
    50
}

fn default_health_max() -> i64 {
    80
}

impl ScoringConfig {
    /// Health scores live in 0..=100; the configured sub-range must fit inside.
    pub fn validate(&self) -> Result<()> {
        if self.health_min < 0 || self.health_max > 100 {
            return Err(Error::Config(format!(
                "scoring range {}..={} must lie within 0..=100",
                self.health_min, self.health_max
            )));
        }
        if self.health_min > self.health_max {
            return Err(Error::Config(format!(
                "scoring.health_min ({}) exceeds scoring.health_max ({})",
                self.health_min, self.health_max
            )));
        }
        Ok(())
    }
}

/// Load and parse a TOML config file
pub fn load_toml_config(path: &Path) -> Result<TomlConfig> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| Error::Config(format!("Read {} failed: {}", path.display(), e)))?;
    let config: TomlConfig = toml::from_str(&content)
        .map_err(|e| Error::Config(format!("Parse {} failed: {}", path.display(), e)))?;
    config.scoring.validate()?;
    Ok(config)
}

/// Load the config file if one exists
///
/// An explicitly requested path must exist. Without one, the platform default
/// location is tried and a missing file yields the default configuration.
pub fn load_config(explicit: Option<&Path>) -> Result<TomlConfig> {
    if let Some(path) = explicit {
        return load_toml_config(path);
    }

    match default_config_path() {
        Some(path) if path.exists() => load_toml_config(&path),
        _ => Ok(TomlConfig::default()),
    }
}

/// Default configuration file path for the platform
///
/// `~/.config/altdir/config.toml` on Linux, the equivalent per-user config
/// directory elsewhere.
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("altdir").join("config.toml"))
}

/// Root folder resolution priority order:
/// 1. Command-line argument (highest priority)
/// 2. Environment variable
/// 3. TOML config file
/// 4. OS-dependent compiled default (fallback)
pub fn resolve_root_folder(cli_arg: Option<&Path>, config: &TomlConfig) -> PathBuf {
    if let Some(path) = cli_arg {
        return path.to_path_buf();
    }

    if let Ok(path) = std::env::var(ENV_ROOT_FOLDER) {
        if !path.trim().is_empty() {
            return PathBuf::from(path);
        }
    }

    if let Some(path) = &config.root_folder {
        return path.clone();
    }

    get_default_root_folder()
}

/// Database path resolution, same priority order as the root folder.
/// The fallback is `altdir.db` inside the resolved root folder.
pub fn resolve_database_path(
    cli_arg: Option<&Path>,
    config: &TomlConfig,
    root_folder: &Path,
) -> PathBuf {
    if let Some(path) = cli_arg {
        return path.to_path_buf();
    }

    if let Ok(path) = std::env::var(ENV_DATABASE_PATH) {
        if !path.trim().is_empty() {
            return PathBuf::from(path);
        }
    }

    if let Some(path) = &config.database_path {
        return path.clone();
    }

    root_folder.join(DATABASE_FILE_NAME)
}

/// Get OS-dependent default root folder path
fn get_default_root_folder() -> PathBuf {
    if cfg!(target_os = "linux") {
        // ~/.local/share/altdir (or /var/lib/altdir for system-wide)
        dirs::data_local_dir()
            .map(|d| d.join("altdir"))
            .unwrap_or_else(|| PathBuf::from("/var/lib/altdir"))
    } else if cfg!(target_os = "macos") {
        // ~/Library/Application Support/altdir
        dirs::data_dir()
            .map(|d| d.join("altdir"))
            .unwrap_or_else(|| PathBuf::from("/Library/Application Support/altdir"))
    } else if cfg!(target_os = "windows") {
        // %LOCALAPPDATA%\altdir
        dirs::data_local_dir()
            .map(|d| d.join("altdir"))
            .unwrap_or_else(|| PathBuf::from("C:\\ProgramData\\altdir"))
    } else {
        PathBuf::from("./altdir_data")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scoring_defaults_are_valid() {
        let scoring = ScoringConfig::default();
        assert_eq!(scoring.health_min, 50);
        assert_eq!(scoring.health_max, 80);
        assert!(scoring.validate().is_ok());
    }

    #[test]
    fn test_scoring_rejects_inverted_range() {
        let scoring = ScoringConfig {
            health_min: 90,
            health_max: 60,
        };
        assert!(matches!(scoring.validate(), Err(Error::Config(_))));
    }

    #[test]
    fn test_scoring_rejects_out_of_bounds() {
        let scoring = ScoringConfig {
            health_min: 10,
            health_max: 120,
        };
        assert!(scoring.validate().is_err());
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config: TomlConfig = toml::from_str(
            r#"
            database_path = "/srv/altdir/catalog.db"

            [scoring]
            health_max = 70
            "#,
        )
        .unwrap();

        assert_eq!(
            config.database_path,
            Some(PathBuf::from("/srv/altdir/catalog.db"))
        );
        assert_eq!(config.scoring.health_min, 50);
        assert_eq!(config.scoring.health_max, 70);
        assert_eq!(config.logging.level, "info");
        assert!(config.root_folder.is_none());
    }
}
