//! Category seeding
//!
//! Creates the categories the keyword dictionary declares. Existing categories
//! are left exactly as they are.

use altdir_common::Result;
use sqlx::SqlitePool;
use tracing::{error, info};

use crate::db::categories::{insert_category, NewCategory};
use crate::models::{EntityKind, ItemRecord, SkipReason};
use crate::utils::retry_on_lock;

use super::identity::{resolve_existing, CandidateIdentity};
use super::taxonomy::KeywordDictionary;

/// Ensure every category seed of the dictionary exists
///
/// Returns one trail entry per seed. Only a lost store connection is an
/// error; anything else fails that seed alone.
pub async fn seed_categories(
    pool: &SqlitePool,
    dictionary: &KeywordDictionary,
    max_wait_ms: u64,
) -> Result<Vec<ItemRecord>> {
    let mut items = Vec::with_capacity(dictionary.categories().len());

    for seed in dictionary.categories() {
        let name = seed.name.trim();
        let slug = seed.slug();

        if name.is_empty() || slug.is_empty() {
            error!(category = %seed.name, "Category seed has no usable name");
            items.push(ItemRecord::failed(
                EntityKind::Category,
                &seed.name,
                &slug,
                "category seed needs a name with letters or digits".to_string(),
            ));
            continue;
        }

        match resolve_existing(pool, EntityKind::Category, seed).await {
            Ok(Some(existing)) => {
                items.push(
                    ItemRecord::skipped(EntityKind::Category, name, &slug, SkipReason::AlreadyExists)
                        .with_detail(existing.slug),
                );
                continue;
            }
            Ok(None) => {}
            Err(err) if err.is_connectivity_loss() => return Err(err),
            Err(err) => {
                error!(category = name, error = %err, "Category lookup failed");
                items.push(ItemRecord::failed(EntityKind::Category, name, &slug, err.to_string()));
                continue;
            }
        }

        let record = NewCategory::new(
            name.to_string(),
            slug.clone(),
            seed.description.as_deref().map(str::trim).map(str::to_string),
        );

        match retry_on_lock("create category", max_wait_ms, || insert_category(pool, &record)).await {
            Ok(_) => {
                info!(category = name, slug = %slug, "Created category");
                items.push(ItemRecord::created(EntityKind::Category, name, &slug));
            }
            Err(err) if err.is_unique_violation() => {
                items.push(ItemRecord::skipped(
                    EntityKind::Category,
                    name,
                    &slug,
                    SkipReason::ConcurrentDuplicate,
                ));
            }
            Err(err) if err.is_connectivity_loss() => return Err(err),
            Err(err) => {
                error!(category = name, error = %err, "Failed to create category");
                items.push(ItemRecord::failed(EntityKind::Category, name, &slug, err.to_string()));
            }
        }
    }

    Ok(items)
}
