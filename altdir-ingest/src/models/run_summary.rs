//! Batch run results
//!
//! Counts per outcome plus a per-item trail, rendered as a human-readable
//! summary or serialized as JSON.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::EntityKind;

/// Why a candidate was not created
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    /// Identity resolution found the record before any write
    AlreadyExists,
    /// The write lost a race on a unique index against another run
    ConcurrentDuplicate,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemOutcome {
    Created,
    Skipped(SkipReason),
    Failed,
}

/// One line of the per-item trail
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemRecord {
    pub kind: EntityKind,
    pub name: String,
    pub slug: String,
    pub outcome: ItemOutcome,
    /// Error message for failures, matched slug for skips, dropped references for creates
    pub detail: Option<String>,
}

impl ItemRecord {
    pub fn created(kind: EntityKind, name: &str, slug: &str) -> Self {
        Self::new(kind, name, slug, ItemOutcome::Created, None)
    }

    pub fn skipped(kind: EntityKind, name: &str, slug: &str, reason: SkipReason) -> Self {
        Self::new(kind, name, slug, ItemOutcome::Skipped(reason), None)
    }

    pub fn failed(kind: EntityKind, name: &str, slug: &str, message: String) -> Self {
        Self::new(kind, name, slug, ItemOutcome::Failed, Some(message))
    }

    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }

    fn new(
        kind: EntityKind,
        name: &str,
        slug: &str,
        outcome: ItemOutcome,
        detail: Option<String>,
    ) -> Self {
        Self {
            kind,
            name: name.to_string(),
            slug: slug.to_string(),
            outcome,
            detail,
        }
    }
}

/// Result of running one batch
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunSummary {
    pub batch_name: String,
    pub categories_created: usize,
    pub proprietary_created: usize,
    pub proprietary_skipped: usize,
    pub proprietary_failed: usize,
    pub alternatives_created: usize,
    pub alternatives_skipped: usize,
    pub alternatives_failed: usize,
    pub items: Vec<ItemRecord>,
}

impl RunSummary {
    pub fn new(batch_name: impl Into<String>) -> Self {
        Self {
            batch_name: batch_name.into(),
            ..Default::default()
        }
    }

    /// Append an item and bump the matching counter
    ///
    /// Category items are counted only through `categories_created`.
    pub fn record(&mut self, item: ItemRecord) {
        match (item.kind, item.outcome) {
            (EntityKind::Category, ItemOutcome::Created) => self.categories_created += 1,
            (EntityKind::Category, _) => {}
            (EntityKind::Proprietary, ItemOutcome::Created) => self.proprietary_created += 1,
            (EntityKind::Proprietary, ItemOutcome::Skipped(_)) => self.proprietary_skipped += 1,
            (EntityKind::Proprietary, ItemOutcome::Failed) => self.proprietary_failed += 1,
            (EntityKind::Alternative, ItemOutcome::Created) => self.alternatives_created += 1,
            (EntityKind::Alternative, ItemOutcome::Skipped(_)) => self.alternatives_skipped += 1,
            (EntityKind::Alternative, ItemOutcome::Failed) => self.alternatives_failed += 1,
        }
        self.items.push(item);
    }

    pub fn total_created(&self) -> usize {
        self.categories_created + self.proprietary_created + self.alternatives_created
    }

    pub fn has_failures(&self) -> bool {
        self.proprietary_failed > 0 || self.alternatives_failed > 0
    }

    pub fn failures(&self) -> impl Iterator<Item = &ItemRecord> {
        self.items
            .iter()
            .filter(|item| item.outcome == ItemOutcome::Failed)
    }
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Batch '{}'", self.batch_name)?;
        if self.categories_created > 0 {
            writeln!(f, "  categories created:    {}", self.categories_created)?;
        }
        writeln!(
            f,
            "  proprietary software:  {} created, {} skipped, {} failed",
            self.proprietary_created, self.proprietary_skipped, self.proprietary_failed
        )?;
        writeln!(
            f,
            "  alternatives:          {} created, {} skipped, {} failed",
            self.alternatives_created, self.alternatives_skipped, self.alternatives_failed
        )?;

        for item in self.failures() {
            writeln!(
                f,
                "  FAILED {} '{}': {}",
                item.kind.as_str(),
                item.name,
                item.detail.as_deref().unwrap_or("unknown error")
            )?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_updates_counters() {
        let mut summary = RunSummary::new("office-suites");
        summary.record(ItemRecord::created(EntityKind::Proprietary, "Microsoft Word", "microsoft-word"));
        summary.record(ItemRecord::created(EntityKind::Alternative, "LibreOffice", "libreoffice"));
        summary.record(ItemRecord::skipped(
            EntityKind::Alternative,
            "OnlyOffice",
            "onlyoffice",
            SkipReason::AlreadyExists,
        ));
        summary.record(ItemRecord::skipped(
            EntityKind::Alternative,
            "Calligra",
            "calligra",
            SkipReason::ConcurrentDuplicate,
        ));
        summary.record(ItemRecord::failed(
            EntityKind::Alternative,
            "Broken",
            "broken",
            "missing required field 'website'".to_string(),
        ));

        assert_eq!(summary.proprietary_created, 1);
        assert_eq!(summary.alternatives_created, 1);
        assert_eq!(summary.alternatives_skipped, 2);
        assert_eq!(summary.alternatives_failed, 1);
        assert_eq!(summary.items.len(), 5);
        assert_eq!(summary.total_created(), 2);
        assert!(summary.has_failures());
    }

    #[test]
    fn test_display_lists_failures() {
        let mut summary = RunSummary::new("dev-tools");
        summary.record(ItemRecord::failed(
            EntityKind::Alternative,
            "Nameless",
            "nameless",
            "missing required field 'description'".to_string(),
        ));

        let text = summary.to_string();
        assert!(text.contains("Batch 'dev-tools'"));
        assert!(text.contains("0 created, 0 skipped, 1 failed"));
        assert!(text.contains("FAILED alternative 'Nameless': missing required field 'description'"));
        assert!(!text.contains("categories created"));
    }

    #[test]
    fn test_summary_serializes_outcomes() {
        let mut summary = RunSummary::new("json");
        summary.record(ItemRecord::skipped(
            EntityKind::Proprietary,
            "Slack",
            "slack",
            SkipReason::AlreadyExists,
        ));

        let value = serde_json::to_value(&summary).unwrap();
        assert_eq!(value["proprietary_skipped"], 1);
        assert_eq!(value["items"][0]["kind"], "proprietary");
        assert_eq!(value["items"][0]["outcome"]["skipped"], "already_exists");
    }
}
