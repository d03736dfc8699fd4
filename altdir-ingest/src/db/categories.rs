//! Category database operations

use altdir_common::db::{sql_timestamp, Category};
use altdir_common::Result;
use chrono::Utc;
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

use super::parse_guid;

/// Category about to be inserted
#[derive(Debug, Clone)]
pub struct NewCategory {
    pub guid: Uuid,
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
}

impl NewCategory {
    pub fn new(name: String, slug: String, description: Option<String>) -> Self {
        Self {
            guid: Uuid::new_v4(),
            name,
            slug,
            description,
        }
    }
}

/// Insert a category; fails on slug or name conflict
pub async fn insert_category(pool: &SqlitePool, category: &NewCategory) -> Result<Uuid> {
    let now = sql_timestamp(Utc::now());

    sqlx::query(
        r#"
        INSERT INTO categories (guid, name, slug, description, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(category.guid.to_string())
    .bind(&category.name)
    .bind(&category.slug)
    .bind(&category.description)
    .bind(&now)
    .bind(&now)
    .execute(pool)
    .await?;

    Ok(category.guid)
}

/// Load category by slug
pub async fn load_category_by_slug(pool: &SqlitePool, slug: &str) -> Result<Option<Category>> {
    let row = sqlx::query("SELECT guid, name, slug, description FROM categories WHERE slug = ?")
        .bind(slug)
        .fetch_optional(pool)
        .await?;

    match row {
        Some(row) => {
            let guid: String = row.get("guid");
            Ok(Some(Category {
                guid: parse_guid(&guid)?,
                name: row.get("name"),
                slug: row.get("slug"),
                description: row.get("description"),
            }))
        }
        None => Ok(None),
    }
}

/// Slugs of an alternative's categories, in stored order
pub async fn load_category_slugs_for(pool: &SqlitePool, alternative_id: Uuid) -> Result<Vec<String>> {
    let slugs = sqlx::query_scalar(
        r#"
        SELECT c.slug
        FROM alternative_categories ac
        JOIN categories c ON c.guid = ac.category_id
        WHERE ac.alternative_id = ?
        ORDER BY ac.position
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
    async fn test_save_and_load_category() {
        let pool = init_memory_database().await.unwrap();

        let category = NewCategory::new(
            "Project Management".to_string(),
            "project-management".to_string(),
            Some("Boards, issues and roadmaps".to_string()),
        );
        insert_category(&pool, &category).await.unwrap();

        let loaded = load_category_by_slug(&pool, "project-management")
            .await
            .unwrap()
            .expect("Category not found");
        assert_eq!(loaded.guid, category.guid);
        assert_eq!(loaded.name, "Project Management");
        assert_eq!(loaded.description.as_deref(), Some("Boards, issues and roadmaps"));
    }

    #[tokio::test]
    async fn test_duplicate_category_name_is_unique_violation() {
        let pool = init_memory_database().await.unwrap();

        insert_category(&pool, &NewCategory::new("Wiki".into(), "wiki".into(), None))
            .await
            .unwrap();
        let err = insert_category(&pool, &NewCategory::new("WIKI".into(), "wikis".into(), None))
            .await
            .unwrap_err();

        assert!(err.is_unique_violation());
    }
}
