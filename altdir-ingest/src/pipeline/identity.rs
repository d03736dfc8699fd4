//! Identity resolution
//!
//! Decides whether a candidate already exists in the catalog. A record
//! matches when its slug equals the candidate's canonical slug, or its name
//! equals the candidate's name ignoring ASCII case.

use altdir_common::Result;
use sqlx::{Row, SqlitePool};
use tracing::warn;
use uuid::Uuid;

use crate::db::parse_guid;
use crate::models::EntityKind;

/// Canonical slug for a display name
///
/// Lowercases, collapses every run of characters outside `[a-z0-9]` into one
/// hyphen and strips hyphens at both ends. `"Acme DB!!"`, `"acme-db"` and
/// `"ACME_DB"` all become `"acme-db"`.
pub fn canonical_slug(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    let mut pending_hyphen = false;

    for ch in name.chars() {
        let c = ch.to_ascii_lowercase();
        if c.is_ascii_lowercase() || c.is_ascii_digit() {
            if pending_hyphen && !slug.is_empty() {
                slug.push('-');
            }
            pending_hyphen = false;
            slug.push(c);
        } else {
            pending_hyphen = true;
        }
    }

    slug
}

/// Escape a literal for use as a SQL `LIKE` pattern with `ESCAPE '\'`
///
/// `%` and `_` would otherwise match arbitrary text.
pub fn escape_like_pattern(literal: &str) -> String {
    let mut escaped = String::with_capacity(literal.len());
    for ch in literal.chars() {
        if matches!(ch, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped
}

/// Identity-bearing part of anything the loader can create
pub trait CandidateIdentity {
    /// Display name as supplied by the curator
    fn name(&self) -> &str;

    /// Curator-supplied slug, if any
    fn explicit_slug(&self) -> Option<&str> {
        None
    }

    /// Slug the record is stored under
    fn slug(&self) -> String {
        match self.explicit_slug() {
            Some(slug) if !canonical_slug(slug).is_empty() => canonical_slug(slug),
            _ => canonical_slug(self.name()),
        }
    }
}

/// Minimal view of a record that already exists
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExistingRecord {
    pub guid: Uuid,
    pub name: String,
    pub slug: String,
}

/// Find the existing record a candidate corresponds to
///
/// Returns at most one record. When several historical near-duplicates match,
/// the oldest (by `created_at`, then insertion order) wins and a warning lists
/// the others.
pub async fn resolve_existing<C>(
    pool: &SqlitePool,
    kind: EntityKind,
    candidate: &C,
) -> Result<Option<ExistingRecord>>
where
    C: CandidateIdentity + ?Sized,
{
    let name = candidate.name().trim();
    let name_slug = canonical_slug(name);
    let stored_slug = candidate.slug();

    let query = format!(
        r#"
        SELECT guid, name, slug
        FROM {}
        WHERE slug = ? OR slug = ? OR name LIKE ? ESCAPE '\'
        ORDER BY created_at, rowid
        "#,
        kind.table()
    );

    let rows = sqlx::query(&query)
        .bind(&name_slug)
        .bind(&stored_slug)
        .bind(escape_like_pattern(name))
        .fetch_all(pool)
        .await?;

    let mut matches = Vec::with_capacity(rows.len());
    for row in rows {
        let guid: String = row.get("guid");
        matches.push(ExistingRecord {
            guid: parse_guid(&guid)?,
            name: row.get("name"),
            slug: row.get("slug"),
        });
    }

    if matches.len() > 1 {
        let slugs: Vec<&str> = matches.iter().map(|m| m.slug.as_str()).collect();
        warn!(
            entity = kind.as_str(),
            candidate = name,
            matches = ?slugs,
            "Ambiguous identity match, treating '{}' as canonical",
            matches[0].slug
        );
    }

    Ok(matches.into_iter().next())
}
