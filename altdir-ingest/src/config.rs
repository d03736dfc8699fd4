//! Settings resolution for altdir-ingest
//!
//! Every path follows the same priority: CLI argument → ENV → TOML → default.
//! The source that won is logged so a surprising database or dictionary can
//! be traced back to where it came from.

use altdir_common::config::{
    resolve_database_path, resolve_root_folder, ScoringConfig, TomlConfig, ENV_DATABASE_PATH,
    ENV_DICTIONARY_PATH, ENV_ROOT_FOLDER,
};
use altdir_common::db::AlternativeStatus;
use altdir_common::{Error, Result};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::{info, warn};

use crate::pipeline::KeywordDictionary;

/// Dictionary location used when nothing else is configured
pub const DEFAULT_DICTIONARY_PATH: &str = "data/keyword_dictionary.toml";

/// Command-line overrides, all optional
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub root_folder: Option<PathBuf>,
    pub database_path: Option<PathBuf>,
    pub dictionary_path: Option<PathBuf>,
}

/// Where a resolved value came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettingSource {
    CommandLine,
    Environment,
    TomlFile,
    Default,
}

impl SettingSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            SettingSource::CommandLine => "command line",
            SettingSource::Environment => "environment",
            SettingSource::TomlFile => "TOML config",
            SettingSource::Default => "default",
        }
    }
}

/// Fully resolved settings for one invocation
#[derive(Debug, Clone)]
pub struct IngestSettings {
    pub database_path: PathBuf,
    pub dictionary_path: PathBuf,
    pub dictionary_source: SettingSource,
    pub default_status: AlternativeStatus,
    pub scoring: ScoringConfig,
}

impl IngestSettings {
    pub fn resolve(cli: &CliOverrides, config: &TomlConfig) -> Result<Self> {
        let root_folder = resolve_root_folder(cli.root_folder.as_deref(), config);
        let database_path =
            resolve_database_path(cli.database_path.as_deref(), config, &root_folder);
        let (dictionary_path, dictionary_source) =
            resolve_dictionary_path(cli.dictionary_path.as_deref(), config);

        let default_status = match config.default_status.as_deref() {
            Some(value) => AlternativeStatus::from_str(value.trim()).map_err(|_| {
                Error::Config(format!(
                    "default_status '{}' is not one of pending, approved, rejected",
                    value
                ))
            })?,
            None => AlternativeStatus::Approved,
        };

        config.scoring.validate()?;

        info!(
            root_folder = %root_folder.display(),
            source = source_of(cli.root_folder.is_some(), ENV_ROOT_FOLDER, config.root_folder.is_some()).as_str(),
            "Root folder resolved"
        );
        info!(
            database = %database_path.display(),
            source = source_of(cli.database_path.is_some(), ENV_DATABASE_PATH, config.database_path.is_some()).as_str(),
            "Database path resolved"
        );
        info!(
            dictionary = %dictionary_path.display(),
            source = dictionary_source.as_str(),
            "Keyword dictionary path resolved"
        );

        Ok(Self {
            database_path,
            dictionary_path,
            dictionary_source,
            default_status,
            scoring: config.scoring,
        })
    }

    /// Load the keyword dictionary
    ///
    /// A configured path must exist. The compiled default may be absent, in
    /// which case an empty dictionary is used and no categories are inferred.
    pub fn load_dictionary(&self) -> Result<KeywordDictionary> {
        if self.dictionary_source == SettingSource::Default && !self.dictionary_path.exists() {
            warn!(
                path = %self.dictionary_path.display(),
                "Keyword dictionary not found; continuing without category inference"
            );
            return Ok(KeywordDictionary::default());
        }

        let dictionary = KeywordDictionary::load(&self.dictionary_path)?;
        info!(
            keywords = dictionary.len(),
            categories = dictionary.categories().len(),
            "Keyword dictionary loaded"
        );
        Ok(dictionary)
    }
}

/// Dictionary path resolution, same priority order as the root folder
pub fn resolve_dictionary_path(
    cli_arg: Option<&Path>,
    config: &TomlConfig,
) -> (PathBuf, SettingSource) {
    if let Some(path) = cli_arg {
        return (path.to_path_buf(), SettingSource::CommandLine);
    }

    if let Ok(path) = std::env::var(ENV_DICTIONARY_PATH) {
        if !path.trim().is_empty() {
            return (PathBuf::from(path), SettingSource::Environment);
        }
    }

    if let Some(path) = &config.dictionary_path {
        return (path.clone(), SettingSource::TomlFile);
    }

    (PathBuf::from(DEFAULT_DICTIONARY_PATH), SettingSource::Default)
}

fn source_of(cli: bool, env_var: &str, toml: bool) -> SettingSource {
    if cli {
        SettingSource::CommandLine
    } else if std::env::var(env_var).map(|v| !v.trim().is_empty()).unwrap_or(false) {
        SettingSource::Environment
    } else if toml {
        SettingSource::TomlFile
    } else {
        SettingSource::Default
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    #[serial]
    fn test_dictionary_path_priority() {
        std::env::remove_var(ENV_DICTIONARY_PATH);
        let mut config = TomlConfig::default();

        let (path, source) = resolve_dictionary_path(None, &config);
        assert_eq!(path, PathBuf::from(DEFAULT_DICTIONARY_PATH));
        assert_eq!(source, SettingSource::Default);

        config.dictionary_path = Some(PathBuf::from("/etc/altdir/keywords.toml"));
        let (_, source) = resolve_dictionary_path(None, &config);
        assert_eq!(source, SettingSource::TomlFile);

        std::env::set_var(ENV_DICTIONARY_PATH, "/tmp/env-keywords.toml");
        let (path, source) = resolve_dictionary_path(None, &config);
        assert_eq!(path, PathBuf::from("/tmp/env-keywords.toml"));
        assert_eq!(source, SettingSource::Environment);

        let (path, source) =
            resolve_dictionary_path(Some(Path::new("cli-keywords.toml")), &config);
        assert_eq!(path, PathBuf::from("cli-keywords.toml"));
        assert_eq!(source, SettingSource::CommandLine);

        std::env::remove_var(ENV_DICTIONARY_PATH);
    }

    #[test]
    #[serial]
    fn test_default_status_from_toml() {
        let config = TomlConfig {
            default_status: Some("pending".to_string()),
            ..Default::default()
        };
        let settings = IngestSettings::resolve(&CliOverrides::default(), &config).unwrap();
        assert_eq!(settings.default_status, AlternativeStatus::Pending);

        let config = TomlConfig {
            default_status: Some("published".to_string()),
            ..Default::default()
        };
        let err = IngestSettings::resolve(&CliOverrides::default(), &config).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    #[serial]
    fn test_missing_default_dictionary_is_empty() {
        std::env::remove_var(ENV_DICTIONARY_PATH);
        let dir = tempfile::tempdir().unwrap();
        let settings = IngestSettings {
            database_path: dir.path().join("altdir.db"),
            dictionary_path: dir.path().join("missing.toml"),
            dictionary_source: SettingSource::Default,
            default_status: AlternativeStatus::Approved,
            scoring: ScoringConfig::default(),
        };
        assert!(settings.load_dictionary().unwrap().is_empty());

        let configured = IngestSettings {
            dictionary_source: SettingSource::TomlFile,
            ..settings
        };
        assert!(configured.load_dictionary().is_err());
    }
}
