//! Root folder and database path resolution
//!
//! These tests mutate process environment variables and run serially.

use altdir_common::config::{
    load_config, load_toml_config, resolve_database_path, resolve_root_folder, TomlConfig,
    DATABASE_FILE_NAME, ENV_DATABASE_PATH, ENV_ROOT_FOLDER,
};
use serial_test::serial;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

fn clear_env() {
    std::env::remove_var(ENV_ROOT_FOLDER);
    std::env::remove_var(ENV_DATABASE_PATH);
}

#[test]
#[serial]
fn test_root_folder_priority() {
    clear_env();
    let config = TomlConfig {
        root_folder: Some(PathBuf::from("/from/toml")),
        ..Default::default()
    };

    assert_eq!(resolve_root_folder(None, &config), PathBuf::from("/from/toml"));

    std::env::set_var(ENV_ROOT_FOLDER, "/from/env");
    assert_eq!(resolve_root_folder(None, &config), PathBuf::from("/from/env"));

    assert_eq!(
        resolve_root_folder(Some(Path::new("/from/cli")), &config),
        PathBuf::from("/from/cli")
    );

    clear_env();
}

#[test]
#[serial]
fn test_blank_env_is_ignored() {
    clear_env();
    std::env::set_var(ENV_ROOT_FOLDER, "   ");

    let config = TomlConfig {
        root_folder: Some(PathBuf::from("/from/toml")),
        ..Default::default()
    };
    assert_eq!(resolve_root_folder(None, &config), PathBuf::from("/from/toml"));

    clear_env();
}

#[test]
#[serial]
fn test_database_defaults_into_root_folder() {
    clear_env();
    let config = TomlConfig::default();
    let root = Path::new("/srv/altdir");

    assert_eq!(
        resolve_database_path(None, &config, root),
        root.join(DATABASE_FILE_NAME)
    );

    std::env::set_var(ENV_DATABASE_PATH, "/tmp/env.db");
    assert_eq!(
        resolve_database_path(None, &config, root),
        PathBuf::from("/tmp/env.db")
    );

    clear_env();
}

#[test]
fn test_load_toml_config_file() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("config.toml");
    std::fs::write(
        &path,
        r#"
root_folder = "/srv/altdir"
default_status = "pending"

[logging]
level = "debug"

[scoring]
health_min = 40
health_max = 60
"#,
    )
    .unwrap();

    let config = load_config(Some(path.as_path())).unwrap();
    assert_eq!(config.root_folder, Some(PathBuf::from("/srv/altdir")));
    assert_eq!(config.default_status.as_deref(), Some("pending"));
    assert_eq!(config.logging.level, "debug");
    assert_eq!(config.scoring.health_min, 40);
}

#[test]
fn test_invalid_scoring_range_rejected() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("config.toml");
    std::fs::write(&path, "[scoring]\nhealth_min = 90\nhealth_max = 10\n").unwrap();

    assert!(load_toml_config(&path).is_err());
}

#[test]
fn test_explicit_missing_config_is_error() {
    let temp_dir = TempDir::new().unwrap();
    assert!(load_config(Some(temp_dir.path().join("absent.toml").as_path())).is_err());
}
