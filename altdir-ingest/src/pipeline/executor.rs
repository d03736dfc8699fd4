//! Batch upsert executor
//!
//! Runs one batch through the catalog in two sequential phases:
//!
//! 1. **Proprietary phase** - create every proprietary product that does not
//!    resolve to an existing record. Afterwards the slug indexes are reloaded
//!    so the next phase sees this batch's creates.
//! 2. **Alternative phase** - for every alternative that does not resolve,
//!    infer categories, link replaced products, synthesize scores and persist.
//!
//! Existing records are never modified. A lost store connection aborts the
//! batch; every other problem is confined to the candidate that caused it.

use altdir_common::db::{max_lock_wait_ms, AlternativeStatus};
use altdir_common::{Error, Result};
use sqlx::SqlitePool;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

use crate::db::alternatives::{insert_alternative, NewAlternative};
use crate::db::proprietary::{insert_proprietary, NewProprietarySoftware};
use crate::db::runs;
use crate::models::{
    AlternativeCandidate, Batch, EntityKind, ItemRecord, ProprietaryCandidate, RunSummary,
    SkipReason,
};
use crate::utils::retry_on_lock;

use super::identity::{resolve_existing, CandidateIdentity};
use super::linker::SlugIndex;
use super::scoring::{RandomScoreSynthesizer, ScoreSynthesizer};
use super::seeding::seed_categories;
use super::taxonomy::KeywordDictionary;

/// Knobs for one executor
#[derive(Debug, Clone)]
pub struct ExecutorOptions {
    /// Status for created alternatives whose candidate names none
    pub default_status: AlternativeStatus,
    /// Create the dictionary's categories before the proprietary phase
    pub seed_categories: bool,
    /// Overrides the `ingest_max_lock_wait_ms` setting
    pub max_lock_wait_ms: Option<u64>,
}

impl Default for ExecutorOptions {
    fn default() -> Self {
        Self {
            default_status: AlternativeStatus::Approved,
            seed_categories: false,
            max_lock_wait_ms: None,
        }
    }
}

/// Slug indexes rebuilt after the proprietary phase
struct PhaseIndexes {
    proprietary: SlugIndex,
    categories: SlugIndex,
}

pub struct BatchExecutor<S = RandomScoreSynthesizer> {
    pool: SqlitePool,
    dictionary: Arc<KeywordDictionary>,
    synthesizer: S,
    options: ExecutorOptions,
}

impl<S: ScoreSynthesizer> BatchExecutor<S> {
    pub fn new(
        pool: SqlitePool,
        dictionary: Arc<KeywordDictionary>,
        synthesizer: S,
        options: ExecutorOptions,
    ) -> Self {
        Self {
            pool,
            dictionary,
            synthesizer,
            options,
        }
    }

    /// Run one batch and record it in `ingest_runs`
    ///
    /// Returns the summary, or the fatal error that aborted the run. Creates
    /// committed before an abort stay committed; re-running the batch skips them.
    pub async fn run(&mut self, batch: &Batch) -> Result<RunSummary> {
        let batch_name = batch.display_name().to_string();
        let max_wait_ms = match self.options.max_lock_wait_ms {
            Some(ms) => ms,
            None => max_lock_wait_ms(&self.pool).await?,
        };

        info!(
            batch = %batch_name,
            proprietary = batch.proprietary.len(),
            alternatives = batch.alternatives.len(),
            "Starting batch"
        );

        let run_id = runs::start_run(&self.pool, &batch_name, max_wait_ms).await?;
        let mut summary = RunSummary::new(batch_name.clone());

        match self.execute(batch, max_wait_ms, &mut summary).await {
            Ok(()) => {
                if let Err(err) = runs::finish_run(&self.pool, run_id, &summary, max_wait_ms).await {
                    warn!(batch = %batch_name, error = %err, "Could not record completed run");
                }
                info!(
                    batch = %batch_name,
                    proprietary_created = summary.proprietary_created,
                    alternatives_created = summary.alternatives_created,
                    alternatives_skipped = summary.alternatives_skipped,
                    alternatives_failed = summary.alternatives_failed,
                    "Batch complete"
                );
                Ok(summary)
            }
            Err(err) => {
                error!(
                    batch = %batch_name,
                    error = %err,
                    processed = summary.items.len(),
                    "Batch aborted; earlier creates remain committed"
                );
                if let Err(record_err) =
                    runs::abort_run(&self.pool, run_id, &err.to_string(), max_wait_ms).await
                {
                    warn!(batch = %batch_name, error = %record_err, "Could not record aborted run");
                }
                Err(err)
            }
        }
    }

    async fn execute(&mut self, batch: &Batch, max_wait_ms: u64, summary: &mut RunSummary) -> Result<()> {
        if self.options.seed_categories {
            for item in seed_categories(&self.pool, &self.dictionary, max_wait_ms).await? {
                summary.record(item);
            }
        }

        for candidate in &batch.proprietary {
            let item = self.process_proprietary(candidate, max_wait_ms).await?;
            summary.record(item);
        }

        // Reload after the proprietary phase: alternatives may reference
        // products created a moment ago in this same batch.
        let indexes = PhaseIndexes {
            proprietary: SlugIndex::load(&self.pool, EntityKind::Proprietary).await?,
            categories: SlugIndex::load(&self.pool, EntityKind::Category).await?,
        };

        for candidate in &batch.alternatives {
            let item = self
                .process_alternative(candidate, &indexes, max_wait_ms)
                .await?;
            summary.record(item);
        }

        Ok(())
    }

    async fn process_proprietary(
        &mut self,
        candidate: &ProprietaryCandidate,
        max_wait_ms: u64,
    ) -> Result<ItemRecord> {
        let kind = EntityKind::Proprietary;
        let slug = candidate.slug();

        if let Err(err) = candidate.validate() {
            return Ok(failed(kind, &candidate.name, &slug, err));
        }

        match resolve_existing(&self.pool, kind, candidate).await {
            Ok(Some(existing)) => {
                debug!(name = %candidate.name, existing = %existing.slug, "Proprietary software already exists");
                return Ok(
                    ItemRecord::skipped(kind, &candidate.name, &slug, SkipReason::AlreadyExists)
                        .with_detail(existing.slug),
                );
            }
            Ok(None) => {}
            Err(err) => return triage(kind, &candidate.name, &slug, err),
        }

        let record = NewProprietarySoftware::from_candidate(candidate);
        let outcome = retry_on_lock("create proprietary software", max_wait_ms, || {
            insert_proprietary(&self.pool, &record)
        })
        .await;

        match outcome {
            Ok(_) => {
                info!(name = %record.name, slug = %record.slug, "Created proprietary software");
                Ok(ItemRecord::created(kind, &record.name, &record.slug))
            }
            Err(err) => triage(kind, &candidate.name, &slug, err),
        }
    }

    async fn process_alternative(
        &mut self,
        candidate: &AlternativeCandidate,
        indexes: &PhaseIndexes,
        max_wait_ms: u64,
    ) -> Result<ItemRecord> {
        let kind = EntityKind::Alternative;
        let slug = candidate.slug();

        if let Err(err) = candidate.validate() {
            return Ok(failed(kind, &candidate.name, &slug, err));
        }

        match resolve_existing(&self.pool, kind, candidate).await {
            Ok(Some(existing)) => {
                debug!(name = %candidate.name, existing = %existing.slug, "Alternative already exists");
                return Ok(
                    ItemRecord::skipped(kind, &candidate.name, &slug, SkipReason::AlreadyExists)
                        .with_detail(existing.slug),
                );
            }
            Ok(None) => {}
            Err(err) => return triage(kind, &candidate.name, &slug, err),
        }

        let category_slugs = self.dictionary.infer_categories(&candidate.category_keywords);
        let categories = indexes.categories.link(&category_slugs);
        let replaces = indexes.proprietary.link(&candidate.alternative_to);
        let scores = self.synthesizer.synthesize(candidate.supplied_scores());

        let mut dropped = Vec::new();
        if !categories.unresolved.is_empty() {
            dropped.push(format!("unknown categories: {}", categories.unresolved.join(", ")));
        }
        if !replaces.unresolved.is_empty() {
            dropped.push(format!("unknown proprietary software: {}", replaces.unresolved.join(", ")));
        }
        if !dropped.is_empty() {
            warn!(name = %candidate.name, dropped = %dropped.join("; "), "Dropping unresolved references");
        }

        let record = NewAlternative::from_candidate(
            candidate,
            slug.clone(),
            scores,
            candidate.status.unwrap_or(self.options.default_status),
            categories.ids,
            replaces.ids,
        );

        let outcome = retry_on_lock("create alternative", max_wait_ms, || {
            insert_alternative(&self.pool, &record)
        })
        .await;

        match outcome {
            Ok(_) => {
                info!(
                    name = %record.name,
                    slug = %record.slug,
                    categories = record.category_ids.len(),
                    alternative_to = record.alternative_to.len(),
                    health_score = record.health_score,
                    "Created alternative"
                );
                let item = ItemRecord::created(kind, &record.name, &record.slug);
                if dropped.is_empty() {
                    Ok(item)
                } else {
                    Ok(item.with_detail(format!("dropped {}", dropped.join("; "))))
                }
            }
            Err(err) => triage(kind, &candidate.name, &slug, err),
        }
    }
}

/// Sort a per-candidate error into skipped, failed or fatal
fn triage(kind: EntityKind, name: &str, slug: &str, err: Error) -> Result<ItemRecord> {
    if err.is_connectivity_loss() {
        return Err(err);
    }

    if err.is_unique_violation() {
        info!(
            entity = kind.as_str(),
            name,
            slug,
            "Created concurrently by another run, skipping"
        );
        return Ok(ItemRecord::skipped(kind, name, slug, SkipReason::ConcurrentDuplicate));
    }

    Ok(failed(kind, name, slug, err))
}

fn failed(kind: EntityKind, name: &str, slug: &str, err: Error) -> ItemRecord {
    error!(entity = kind.as_str(), name, error = %err, "Candidate failed");
    ItemRecord::failed(kind, name, slug, err.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_triage_classification() {
        let fatal = triage(
            EntityKind::Alternative,
            "Gitea",
            "gitea",
            Error::Database(sqlx::Error::PoolTimedOut),
        );
        assert!(fatal.is_err());

        let invalid = triage(
            EntityKind::Alternative,
            "Gitea",
            "gitea",
            Error::InvalidInput("missing required field 'website'".to_string()),
        )
        .unwrap();
        assert_eq!(invalid.outcome, crate::models::ItemOutcome::Failed);
        assert_eq!(
            invalid.detail.as_deref(),
            Some("Invalid input: missing required field 'website'")
        );
    }

    #[test]
    fn test_default_options() {
        let options = ExecutorOptions::default();
        assert_eq!(options.default_status, AlternativeStatus::Approved);
        assert!(!options.seed_categories);
        assert!(options.max_lock_wait_ms.is_none());
    }

    #[tokio::test]
    async fn test_unique_violation_counts_as_concurrent_skip() {
        use crate::models::ItemOutcome;
        use crate::pipeline::scoring::Scores;
        use altdir_common::db::init_memory_database;

        let pool = init_memory_database().await.unwrap();
        let candidate = AlternativeCandidate {
            name: "Gitea".to_string(),
            description: "Self-hosted git service".to_string(),
            website: "https://about.gitea.com".to_string(),
            ..Default::default()
        };
        let scores = Scores {
            health_score: 70,
            vote_score: 3,
        };
        let record = |status| {
            let slug = "gitea".to_string();
            NewAlternative::from_candidate(&candidate, slug, scores, status, vec![], vec![])
        };

        insert_alternative(&pool, &record(AlternativeStatus::Approved))
            .await
            .unwrap();
        // Another run got there between resolution and insert
        let err = insert_alternative(&pool, &record(AlternativeStatus::Pending))
            .await
            .unwrap_err();

        let item = triage(EntityKind::Alternative, "Gitea", "gitea", err).unwrap();
        assert_eq!(
            item.outcome,
            ItemOutcome::Skipped(SkipReason::ConcurrentDuplicate)
        );

        let mut summary = RunSummary::new("race");
        summary.record(item);
        assert_eq!(summary.alternatives_skipped, 1);
        assert_eq!(summary.alternatives_failed, 0);
        assert!(!summary.has_failures());
    }

    #[tokio::test]
    async fn test_unreadable_store_is_fatal() {
        use sqlx::Connection;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("overwritten.db");
        std::fs::write(&path, vec![0x5au8; 16384]).unwrap();

        let result = async {
            let mut conn =
                sqlx::SqliteConnection::connect(&format!("sqlite://{}", path.display())).await?;
            sqlx::query("INSERT INTO alternatives (guid) VALUES ('x')")
                .execute(&mut conn)
                .await?;
            Ok::<(), sqlx::Error>(())
        }
        .await;
        let err = Error::from(result.unwrap_err());

        let outcome = triage(EntityKind::Alternative, "Gitea", "gitea", err);
        assert!(outcome.unwrap_err().is_connectivity_loss());
    }
}
