//! Proprietary software database operations

use altdir_common::db::{sql_timestamp, ProprietarySoftware};
use altdir_common::Result;
use chrono::Utc;
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

use super::parse_guid;
use crate::models::ProprietaryCandidate;
use crate::pipeline::identity::CandidateIdentity;

/// Proprietary product about to be inserted
#[derive(Debug, Clone)]
pub struct NewProprietarySoftware {
    pub guid: Uuid,
    pub name: String,
    pub slug: String,
    pub description: String,
    pub website: String,
}

impl NewProprietarySoftware {
    pub fn from_candidate(candidate: &ProprietaryCandidate) -> Self {
        Self {
            guid: Uuid::new_v4(),
            name: candidate.name.trim().to_string(),
            slug: candidate.slug(),
            description: candidate.description.trim().to_string(),
            website: candidate.website.trim().to_string(),
        }
    }
}

/// Insert a proprietary product; fails on slug or name conflict
pub async fn insert_proprietary(pool: &SqlitePool, record: &NewProprietarySoftware) -> Result<Uuid> {
    let now = sql_timestamp(Utc::now());

    sqlx::query(
        r#"
        INSERT INTO proprietary_software (
            guid, name, slug, description, website, created_at, updated_at
        ) VALUES (?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(record.guid.to_string())
    .bind(&record.name)
    .bind(&record.slug)
    .bind(&record.description)
    .bind(&record.website)
    .bind(&now)
    .bind(&now)
    .execute(pool)
    .await?;

    Ok(record.guid)
}

/// Load proprietary product by slug
pub async fn load_proprietary_by_slug(
    pool: &SqlitePool,
    slug: &str,
) -> Result<Option<ProprietarySoftware>> {
    let row = sqlx::query(
        r#"
        SELECT guid, name, slug, description, website
        FROM proprietary_software
        WHERE slug = ?
        "#,
    )
    .bind(slug)
    .fetch_optional(pool)
    .await?;

    match row {
        Some(row) => {
            let guid: String = row.get("guid");
            Ok(Some(ProprietarySoftware {
                guid: parse_guid(&guid)?,
                name: row.get("name"),
                slug: row.get("slug"),
                description: row.get("description"),
                website: row.get("website"),
            }))
        }
        None => Ok(None),
    }
}

/// Slugs of the proprietary products an alternative replaces, sorted
pub async fn load_replaced_slugs_for(pool: &SqlitePool, alternative_id: Uuid) -> Result<Vec<String>> {
    let slugs = sqlx::query_scalar(
        r#"
        SELECT p.slug
        FROM alternative_replaces ar
        JOIN proprietary_software p ON p.guid = ar.proprietary_id
        WHERE ar.alternative_id = ?
        ORDER BY p.slug
        "#,
    )
    .bind(alternative_id.to_string())
    .fetch_all(pool)
    .await?;

    Ok(slugs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use altdir_common::db::init_memory_database;

    #[tokio::test]
    async fn test_save_and_load_proprietary() {
        let pool = init_memory_database().await.unwrap();

        let candidate = ProprietaryCandidate {
            name: " Microsoft Teams ".to_string(),
            slug: None,
            description: "Team chat and meetings".to_string(),
            website: "https://teams.microsoft.com".to_string(),
        };
        let record = NewProprietarySoftware::from_candidate(&candidate);
        insert_proprietary(&pool, &record).await.unwrap();

        let loaded = load_proprietary_by_slug(&pool, "microsoft-teams")
            .await
            .unwrap()
            .expect("Proprietary software not found");
        assert_eq!(loaded.guid, record.guid);
        assert_eq!(loaded.name, "Microsoft Teams");
        assert_eq!(loaded.website, "https://teams.microsoft.com");
    }

    #[tokio::test]
    async fn test_duplicate_slug_is_unique_violation() {
        let pool = init_memory_database().await.unwrap();

        let first = NewProprietarySoftware::from_candidate(&ProprietaryCandidate {
            name: "Zoom".to_string(),
            ..Default::default()
        });
        let second = NewProprietarySoftware::from_candidate(&ProprietaryCandidate {
            name: "Zoom Meetings".to_string(),
            slug: Some("zoom".to_string()),
            ..Default::default()
        });

        insert_proprietary(&pool, &first).await.unwrap();
        let err = insert_proprietary(&pool, &second).await.unwrap_err();
        assert!(err.is_unique_violation());
        assert!(!err.is_connectivity_loss());
    }
}
