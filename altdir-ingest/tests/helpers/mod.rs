//! Test Helper Utilities
//!
//! Shared fixtures for altdir-ingest integration tests

#![allow(dead_code)]

use anyhow::Result;
use sqlx::SqlitePool;
use std::sync::Arc;
use tempfile::TempDir;

use altdir_common::db::init_database;
use altdir_ingest::models::{AlternativeCandidate, ProprietaryCandidate};
use altdir_ingest::pipeline::{BatchExecutor, ExecutorOptions, FixedScoreSynthesizer, KeywordDictionary};

pub const TEST_DICTIONARY: &str = r#"
[[category]]
slug = "office-suites"
name = "Office Suites"

[[category]]
slug = "communication"
name = "Communication"

[[category]]
slug = "developer-tools"
name = "Developer Tools"

[[category]]
slug = "databases"
name = "Databases"

[[category]]
slug = "self-hosted"
name = "Self-Hosted"

[[category]]
slug = "design"
name = "Design"

[[category]]
slug = "security"
name = "Security"

[keywords]
"office" = ["office-suites"]
"chat" = ["communication"]
"git" = ["developer-tools", "self-hosted"]
"database" = ["databases", "developer-tools"]
"graphics" = ["design"]
"vpn" = ["security"]
"quantum" = ["quantum-computing"]
"#;

/// Create a temporary file-backed catalog
///
/// Returns (TempDir, SqlitePool) - TempDir must be kept alive for duration of test
pub async fn create_test_db() -> Result<(TempDir, SqlitePool)> {
    let temp_dir = TempDir::new()?;
    let pool = init_database(&temp_dir.path().join("altdir_test.db")).await?;
    Ok((temp_dir, pool))
}

pub fn test_dictionary() -> Arc<KeywordDictionary> {
    Arc::new(KeywordDictionary::from_toml_str(TEST_DICTIONARY).expect("test dictionary parses"))
}

/// Executor with fixed scores that seeds the test dictionary's categories
pub fn create_test_executor(pool: &SqlitePool) -> BatchExecutor<FixedScoreSynthesizer> {
    BatchExecutor::new(
        pool.clone(),
        test_dictionary(),
        FixedScoreSynthesizer {
            health_score: 65,
            vote_score: 10,
        },
        ExecutorOptions {
            seed_categories: true,
            max_lock_wait_ms: Some(5000),
            ..Default::default()
        },
    )
}

pub fn proprietary(name: &str) -> ProprietaryCandidate {
    ProprietaryCandidate {
        name: name.to_string(),
        description: format!("{} (commercial)", name),
        website: format!("https://{}.example.com", name.to_lowercase().replace(' ', "")),
        ..Default::default()
    }
}

pub fn alternative(name: &str, keywords: &[&str], alternative_to: &[&str]) -> AlternativeCandidate {
    AlternativeCandidate {
        name: name.to_string(),
        description: format!("{} is open source", name),
        website: "https://example.org".to_string(),
        category_keywords: keywords.iter().map(|k| k.to_string()).collect(),
        alternative_to: alternative_to.iter().map(|s| s.to_string()).collect(),
        ..Default::default()
    }
}

pub async fn count_rows(pool: &SqlitePool, table: &str) -> i64 {
    sqlx::query_scalar(&format!("SELECT COUNT(*) FROM {}", table))
        .fetch_one(pool)
        .await
        .unwrap()
}
