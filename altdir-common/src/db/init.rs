//! Database initialization
//!
//! Creates the catalog database on first run and brings the schema up to date
//! on every start. All statements are idempotent.

use crate::Result;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;
use tracing::{debug, info};

/// Upper bound on total retry time for a locked write (milliseconds)
pub const SETTING_MAX_LOCK_WAIT_MS: &str = "ingest_max_lock_wait_ms";
/// SQLite busy_timeout applied to every pooled connection (milliseconds)
pub const SETTING_BUSY_TIMEOUT_MS: &str = "ingest_busy_timeout_ms";

const DEFAULT_MAX_LOCK_WAIT_MS: i64 = 5000;
const DEFAULT_BUSY_TIMEOUT_MS: i64 = 250;

/// Initialize database connection and create tables if needed
pub async fn init_database(db_path: &Path) -> Result<SqlitePool> {
    let newly_created = !db_path.exists();

    // Create parent directory if it doesn't exist
    if let Some(parent) = db_path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let options = SqliteConnectOptions::new()
        .filename(db_path)
        .create_if_missing(true)
        .foreign_keys(true)
        // WAL lets concurrent batch runs read while one of them writes
        .journal_mode(SqliteJournalMode::Wal)
        .busy_timeout(Duration::from_millis(DEFAULT_BUSY_TIMEOUT_MS as u64));

    // Schema work happens on a single bootstrap connection so the configured
    // busy timeout can be read before the real pool is built.
    let bootstrap = SqlitePoolOptions::new()
        .max_connections(1)
        .connect_with(options.clone())
        .await?;

    if newly_created {
        info!("Initialized new database: {}", db_path.display());
    } else {
        info!("Opened existing database: {}", db_path.display());
    }

    create_schema(&bootstrap).await?;
    let busy_timeout_ms =
        get_setting_i64(&bootstrap, SETTING_BUSY_TIMEOUT_MS, DEFAULT_BUSY_TIMEOUT_MS).await?;
    bootstrap.close().await;

    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect_with(options.busy_timeout(Duration::from_millis(busy_timeout_ms.max(0) as u64)))
        .await?;

    info!("Database busy timeout set to {} ms", busy_timeout_ms);

    Ok(pool)
}

/// Initialize a private in-memory database
///
/// The pool is pinned to one connection that never expires; every SQLite
/// in-memory connection is its own database.
pub async fn init_memory_database() -> Result<SqlitePool> {
    let options = SqliteConnectOptions::from_str("sqlite::memory:")?.foreign_keys(true);

    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .min_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect_with(options)
        .await?;

    create_schema(&pool).await?;

    Ok(pool)
}

/// Create every table and index, then seed default settings
pub async fn create_schema(pool: &SqlitePool) -> Result<()> {
    create_settings_table(pool).await?;
    create_categories_table(pool).await?;
    create_proprietary_software_table(pool).await?;
    create_alternatives_table(pool).await?;

    // Linking tables
    create_alternative_categories_table(pool).await?;
    create_alternative_replaces_table(pool).await?;

    create_ingest_runs_table(pool).await?;

    init_default_settings(pool).await?;

    debug!("Catalog schema up to date");
    Ok(())
}

/// Create the settings table
///
/// Stores operational key-value pairs that apply to every process sharing
/// the database file.
pub async fn create_settings_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS settings (
            key TEXT PRIMARY KEY,
            value TEXT,
            updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

pub async fn create_categories_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS categories (
            guid TEXT PRIMARY KEY,
            name TEXT NOT NULL CHECK (length(trim(name)) > 0),
            slug TEXT NOT NULL UNIQUE CHECK (length(slug) > 0),
            description TEXT,
            created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
            updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE UNIQUE INDEX IF NOT EXISTS idx_categories_name_nocase ON categories(name COLLATE NOCASE)",
    )
    .execute(pool)
    .await?;

    Ok(())
}

pub async fn create_proprietary_software_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS proprietary_software (
            guid TEXT PRIMARY KEY,
            name TEXT NOT NULL CHECK (length(trim(name)) > 0),
            slug TEXT NOT NULL UNIQUE CHECK (length(slug) > 0),
            description TEXT NOT NULL DEFAULT '',
            website TEXT NOT NULL DEFAULT '',
            created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
            updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE UNIQUE INDEX IF NOT EXISTS idx_proprietary_software_name_nocase ON proprietary_software(name COLLATE NOCASE)",
    )
    .execute(pool)
    .await?;

    Ok(())
}

pub async fn create_alternatives_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS alternatives (
            guid TEXT PRIMARY KEY,
            name TEXT NOT NULL CHECK (length(trim(name)) > 0),
            slug TEXT NOT NULL UNIQUE CHECK (length(slug) > 0),
            description TEXT NOT NULL CHECK (length(trim(description)) > 0),
            short_description TEXT,
            long_description TEXT,
            website TEXT NOT NULL CHECK (length(trim(website)) > 0),
            source_repository_url TEXT,
            license TEXT,
            is_self_hosted INTEGER NOT NULL DEFAULT 0,
            health_score INTEGER NOT NULL CHECK (health_score BETWEEN 0 AND 100),
            vote_score INTEGER NOT NULL DEFAULT 0 CHECK (vote_score >= 0),
            status TEXT NOT NULL DEFAULT 'pending'
                CHECK (status IN ('pending', 'approved', 'rejected')),
            created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
            updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE UNIQUE INDEX IF NOT EXISTS idx_alternatives_name_nocase ON alternatives(name COLLATE NOCASE)",
    )
    .execute(pool)
    .await?;

    // Dashboard reads filter by status
    sqlx::query("CREATE INDEX IF NOT EXISTS idx_alternatives_status ON alternatives(status)")
        .execute(pool)
        .await?;

    Ok(())
}

pub async fn create_alternative_categories_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS alternative_categories (
            alternative_id TEXT NOT NULL REFERENCES alternatives(guid) ON DELETE CASCADE,
            category_id TEXT NOT NULL REFERENCES categories(guid) ON DELETE CASCADE,
            position INTEGER NOT NULL CHECK (position BETWEEN 0 AND 4),
            PRIMARY KEY (alternative_id, category_id),
            UNIQUE (alternative_id, position)
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

pub async fn create_alternative_replaces_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS alternative_replaces (
            alternative_id TEXT NOT NULL REFERENCES alternatives(guid) ON DELETE CASCADE,
            proprietary_id TEXT NOT NULL REFERENCES proprietary_software(guid) ON DELETE CASCADE,
            PRIMARY KEY (alternative_id, proprietary_id)
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

pub async fn create_ingest_runs_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS ingest_runs (
            run_id TEXT PRIMARY KEY,
            batch_name TEXT NOT NULL,
            state TEXT NOT NULL,
            summary TEXT,
            error TEXT,
            started_at TEXT NOT NULL,
            ended_at TEXT
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

/// Initialize or update default settings
///
/// Ensures every required setting exists and resets NULL values to defaults.
async fn init_default_settings(pool: &SqlitePool) -> Result<()> {
    ensure_setting(pool, SETTING_MAX_LOCK_WAIT_MS, &DEFAULT_MAX_LOCK_WAIT_MS.to_string()).await?;
    ensure_setting(pool, SETTING_BUSY_TIMEOUT_MS, &DEFAULT_BUSY_TIMEOUT_MS.to_string()).await?;
    Ok(())
}

/// Insert a setting if missing, or repair it if NULL
async fn ensure_setting(pool: &SqlitePool, key: &str, default_value: &str) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO settings (key, value) VALUES (?, ?)
        ON CONFLICT(key) DO UPDATE SET
            value = excluded.value,
            updated_at = CURRENT_TIMESTAMP
        WHERE settings.value IS NULL
        "#,
    )
    .bind(key)
    .bind(default_value)
    .execute(pool)
    .await?;

    Ok(())
}

/// Read an integer setting, falling back to `default` when absent or unparsable
pub async fn get_setting_i64(pool: &SqlitePool, key: &str, default: i64) -> Result<i64> {
    let value: Option<Option<String>> =
        sqlx::query_scalar("SELECT value FROM settings WHERE key = ?")
            .bind(key)
            .fetch_optional(pool)
            .await?;

    Ok(value
        .flatten()
        .and_then(|v| v.trim().parse::<i64>().ok())
        .unwrap_or(default))
}

/// Maximum total lock-retry time for a single write
pub async fn max_lock_wait_ms(pool: &SqlitePool) -> Result<u64> {
    let value = get_setting_i64(pool, SETTING_MAX_LOCK_WAIT_MS, DEFAULT_MAX_LOCK_WAIT_MS).await?;
    Ok(value.max(0) as u64)
}
