//! altdir-ingest library interface
//!
//! Merges curated batches of proprietary products and open-source alternatives
//! into the catalog database without creating duplicates.

pub mod config;
pub mod db;
pub mod models;
pub mod pipeline;
pub mod utils;

pub use crate::models::{Batch, ItemOutcome, ItemRecord, RunSummary, SkipReason};
pub use crate::pipeline::{BatchExecutor, ExecutorOptions, KeywordDictionary};
