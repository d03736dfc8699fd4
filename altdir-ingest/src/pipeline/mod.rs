//! Catalog reconciliation pipeline
//!
//! Leaves first: identity resolution, taxonomy inference, relationship
//! linking and score synthesis. The executor drives them over a batch.

pub mod executor;
pub mod identity;
pub mod linker;
pub mod scoring;
pub mod seeding;
pub mod taxonomy;

pub use executor::{BatchExecutor, ExecutorOptions};
pub use identity::{canonical_slug, resolve_existing, CandidateIdentity, ExistingRecord};
pub use linker::{Linked, SlugIndex};
pub use scoring::{
    FixedScoreSynthesizer, RandomScoreSynthesizer, ScoreSynthesizer, Scores, SuppliedScores,
};
pub use seeding::seed_categories;
pub use taxonomy::{CategorySeed, KeywordDictionary};
