//! Alternative database operations

use altdir_common::db::{sql_timestamp, Alternative, AlternativeStatus, MAX_CATEGORIES};
use altdir_common::{Error, Result};
use chrono::{DateTime, Utc};
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

use super::parse_guid;
use crate::models::candidate::non_blank;
use crate::models::AlternativeCandidate;
use crate::pipeline::scoring::Scores;

/// Alternative about to be inserted, with its resolved links
#[derive(Debug, Clone)]
pub struct NewAlternative {
    pub guid: Uuid,
    pub name: String,
    pub slug: String,
    pub description: String,
    pub short_description: Option<String>,
    pub long_description: Option<String>,
    pub website: String,
    pub source_repository_url: Option<String>,
    pub license: Option<String>,
    pub is_self_hosted: bool,
    pub health_score: i64,
    pub vote_score: i64,
    pub status: AlternativeStatus,
    /// Category ids in inferred order
    pub category_ids: Vec<Uuid>,
    pub alternative_to: Vec<Uuid>,
}

impl NewAlternative {
    pub fn from_candidate(
        candidate: &AlternativeCandidate,
        slug: String,
        scores: Scores,
        status: AlternativeStatus,
        category_ids: Vec<Uuid>,
        alternative_to: Vec<Uuid>,
    ) -> Self {
        Self {
            guid: Uuid::new_v4(),
            name: candidate.name.trim().to_string(),
            slug,
            description: candidate.description.trim().to_string(),
            short_description: non_blank(&candidate.short_description),
            long_description: non_blank(&candidate.long_description),
            website: candidate.website.trim().to_string(),
            source_repository_url: non_blank(&candidate.source_repository_url),
            license: non_blank(&candidate.license),
            is_self_hosted: candidate.is_self_hosted,
            health_score: scores.health_score,
            vote_score: scores.vote_score,
            status,
            category_ids,
            alternative_to,
        }
    }
}

/// Insert an alternative with its category and replacement links
///
/// One transaction: either the alternative and all its links are committed,
/// or nothing is. Fails on slug or name conflict.
pub async fn insert_alternative(pool: &SqlitePool, record: &NewAlternative) -> Result<Uuid> {
    if record.category_ids.len() > MAX_CATEGORIES {
        return Err(Error::InvalidInput(format!(
            "{} categories exceeds the limit of {}",
            record.category_ids.len(),
            MAX_CATEGORIES
        )));
    }

    let guid = record.guid.to_string();
    let now = sql_timestamp(Utc::now());

    let mut tx = pool.begin().await?;

    sqlx::query(
        r#"
        INSERT INTO alternatives (
            guid, name, slug, description, short_description, long_description,
            website, source_repository_url, license, is_self_hosted,
            health_score, vote_score, status, created_at, updated_at
        ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&guid)
    .bind(&record.name)
    .bind(&record.slug)
    .bind(&record.description)
    .bind(&record.short_description)
    .bind(&record.long_description)
    .bind(&record.website)
    .bind(&record.source_repository_url)
    .bind(&record.license)
    .bind(record.is_self_hosted)
    .bind(record.health_score)
    .bind(record.vote_score)
    .bind(record.status.as_str())
    .bind(&now)
    .bind(&now)
    .execute(&mut *tx)
    .await?;

    for (position, category_id) in record.category_ids.iter().enumerate() {
        sqlx::query(
            "INSERT INTO alternative_categories (alternative_id, category_id, position) VALUES (?, ?, ?)",
        )
        .bind(&guid)
        .bind(category_id.to_string())
        .bind(position as i64)
        .execute(&mut *tx)
        .await?;
    }

    for proprietary_id in &record.alternative_to {
        sqlx::query(
            "INSERT OR IGNORE INTO alternative_replaces (alternative_id, proprietary_id) VALUES (?, ?)",
        )
        .bind(&guid)
        .bind(proprietary_id.to_string())
        .execute(&mut *tx)
        .await?;
    }

    tx.commit().await?;

    Ok(record.guid)
}

/// Load alternative by slug, including ordered categories and replaced products
pub async fn load_alternative_by_slug(pool: &SqlitePool, slug: &str) -> Result<Option<Alternative>> {
    let row = sqlx::query(
        r#"
        SELECT guid, name, slug, description, short_description, long_description,
               website, source_repository_url, license, is_self_hosted,
               health_score, vote_score, status, created_at, updated_at
        FROM alternatives
        WHERE slug = ?
        "#,
    )
    .bind(slug)
    .fetch_optional(pool)
    .await?;

    let row = match row {
        Some(row) => row,
        None => return Ok(None),
    };

    let guid_str: String = row.get("guid");
    let guid = parse_guid(&guid_str)?;
    let status: String = row.get("status");
    let created_at: DateTime<Utc> = row.try_get("created_at")?;
    let updated_at: DateTime<Utc> = row.try_get("updated_at")?;

    let categories = load_linked_ids(
        pool,
        "SELECT category_id FROM alternative_categories WHERE alternative_id = ? ORDER BY position",
        &guid_str,
    )
    .await?;
    let alternative_to = load_linked_ids(
        pool,
        "SELECT proprietary_id FROM alternative_replaces WHERE alternative_id = ? ORDER BY rowid",
        &guid_str,
    )
    .await?;

    Ok(Some(Alternative {
        guid,
        name: row.get("name"),
        slug: row.get("slug"),
        description: row.get("description"),
        short_description: row.get("short_description"),
        long_description: row.get("long_description"),
        website: row.get("website"),
        source_repository_url: row.get("source_repository_url"),
        license: row.get("license"),
        is_self_hosted: row.get("is_self_hosted"),
        health_score: row.get("health_score"),
        vote_score: row.get("vote_score"),
        status: status.parse()?,
        categories,
        alternative_to,
        created_at,
        updated_at,
    }))
}

/// Number of alternatives in the catalog
pub async fn count_alternatives(pool: &SqlitePool) -> Result<i64> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM alternatives")
        .fetch_one(pool)
        .await?;
    Ok(count)
}

async fn load_linked_ids(pool: &SqlitePool, query: &str, alternative_id: &str) -> Result<Vec<Uuid>> {
    let ids: Vec<String> = sqlx::query_scalar(query)
        .bind(alternative_id)
        .fetch_all(pool)
        .await?;

    ids.iter().map(|id| parse_guid(id)).collect()
}
