//! Relationship linking
//!
//! A [`SlugIndex`] is a process-local snapshot of slug → guid for one entity
//! collection. The executor loads it, lets a phase mutate the store, then
//! reloads it, so references made later in a batch see records created earlier
//! in the same batch.

use altdir_common::Result;
use sqlx::{Row, SqlitePool};
use std::collections::HashMap;
use tracing::debug;
use uuid::Uuid;

use crate::db::parse_guid;
use crate::models::EntityKind;

use super::identity::canonical_slug;

/// References that resolved, and those that were dropped
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Linked {
    /// Resolved ids in reference order, without duplicates
    pub ids: Vec<Uuid>,
    /// Normalized slugs with no matching record
    pub unresolved: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct SlugIndex {
    kind: EntityKind,
    ids: HashMap<String, Uuid>,
}

impl SlugIndex {
    /// Snapshot the current slugs of one collection
    pub async fn load(pool: &SqlitePool, kind: EntityKind) -> Result<Self> {
        let query = format!("SELECT slug, guid FROM {}", kind.table());
        let rows = sqlx::query(&query).fetch_all(pool).await?;

        let mut ids = HashMap::with_capacity(rows.len());
        for row in rows {
            let slug: String = row.get("slug");
            let guid: String = row.get("guid");
            ids.insert(slug, parse_guid(&guid)?);
        }

        debug!(entity = kind.as_str(), entries = ids.len(), "Slug index loaded");
        Ok(Self { kind, ids })
    }

    pub fn from_pairs<I>(kind: EntityKind, pairs: I) -> Self
    where
        I: IntoIterator<Item = (String, Uuid)>,
    {
        Self {
            kind,
            ids: pairs.into_iter().collect(),
        }
    }

    pub fn kind(&self) -> EntityKind {
        self.kind
    }

    pub fn get(&self, slug: &str) -> Option<Uuid> {
        self.ids.get(&canonical_slug(slug)).copied()
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Resolve references, dropping the ones that do not exist
    ///
    /// A missing reference never fails the owning record.
    pub fn link<S: AsRef<str>>(&self, slugs: &[S]) -> Linked {
        let mut linked = Linked::default();

        for reference in slugs {
            let slug = canonical_slug(reference.as_ref());
            match self.ids.get(&slug) {
                Some(id) => {
                    if !linked.ids.contains(id) {
                        linked.ids.push(*id);
                    }
                }
                None => {
                    debug!(
                        entity = self.kind.as_str(),
                        reference = reference.as_ref(),
                        "Dropping unresolved reference"
                    );
                    if !linked.unresolved.contains(&slug) {
                        linked.unresolved.push(slug);
                    }
                }
            }
        }

        linked
    }
}
