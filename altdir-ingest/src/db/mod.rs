//! Catalog persistence for the loader
//!
//! Inserts only. The loader never updates an existing record.

pub mod alternatives;
pub mod categories;
pub mod proprietary;
pub mod runs;

use altdir_common::{Error, Result};
use uuid::Uuid;

/// Parse a TEXT guid column
pub fn parse_guid(value: &str) -> Result<Uuid> {
    Uuid::parse_str(value)
        .map_err(|e| Error::Internal(format!("Corrupt guid '{}': {}", value, e)))
}
