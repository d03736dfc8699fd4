//! Data models for batch ingestion

pub mod candidate;
pub mod run_summary;

pub use candidate::{AlternativeCandidate, Batch, ProprietaryCandidate};
pub use run_summary::{ItemOutcome, ItemRecord, RunSummary, SkipReason};

use serde::{Deserialize, Serialize};

/// The three catalog entity collections
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Category,
    Proprietary,
    Alternative,
}

impl EntityKind {
    /// Backing table name
    pub fn table(&self) -> &'static str {
        match self {
            EntityKind::Category => "categories",
            EntityKind::Proprietary => "proprietary_software",
            EntityKind::Alternative => "alternatives",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            EntityKind::Category => "category",
            EntityKind::Proprietary => "proprietary",
            EntityKind::Alternative => "alternative",
        }
    }
}
