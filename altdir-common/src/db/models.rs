//! Catalog entity models
//!
//! These are the persisted shapes shared by the loader and by any reader of
//! the catalog (dashboard, exports).

use crate::{Error, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Maximum number of categories an alternative may belong to
pub const MAX_CATEGORIES: usize = 5;

/// Stored timestamp text, identical to SQLite's `CURRENT_TIMESTAMP`
///
/// Rows written by the loader and rows written by plain SQL defaults must
/// sort together under `ORDER BY created_at`.
pub const SQL_TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Format a UTC instant for a `created_at` / `updated_at` column
pub fn sql_timestamp(at: DateTime<Utc>) -> String {
    at.format(SQL_TIMESTAMP_FORMAT).to_string()
}

/// Taxonomy node. Referenced by alternatives, never mutated by the loader.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub guid: Uuid,
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
}

/// Commercial product that open-source alternatives replace
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProprietarySoftware {
    pub guid: Uuid,
    pub name: String,
    pub slug: String,
    pub description: String,
    pub website: String,
}

/// Moderation status of an alternative
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlternativeStatus {
    #[default]
    Pending,
    Approved,
    Rejected,
}

impl AlternativeStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AlternativeStatus::Pending => "pending",
            AlternativeStatus::Approved => "approved",
            AlternativeStatus::Rejected => "rejected",
        }
    }
}

impl fmt::Display for AlternativeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AlternativeStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pending" => Ok(AlternativeStatus::Pending),
            "approved" => Ok(AlternativeStatus::Approved),
            "rejected" => Ok(AlternativeStatus::Rejected),
            other => Err(Error::InvalidInput(format!(
                "unknown alternative status '{}' (expected pending, approved or rejected)",
                other
            ))),
        }
    }
}

/// Open-source alternative, with its ordered categories and replaced products
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Alternative {
    pub guid: Uuid,
    pub name: String,
    pub slug: String,
    pub description: String,
    pub short_description: Option<String>,
    pub long_description: Option<String>,
    pub website: String,
    pub source_repository_url: Option<String>,
    pub license: Option<String>,
    pub is_self_hosted: bool,
    /// 0..=100
    pub health_score: i64,
    pub vote_score: i64,
    pub status: AlternativeStatus,
    /// Category ids in first-inferred order, at most [`MAX_CATEGORIES`]
    pub categories: Vec<Uuid>,
    pub alternative_to: Vec<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_parsing_is_case_insensitive() {
        assert_eq!(
            "Approved".parse::<AlternativeStatus>().unwrap(),
            AlternativeStatus::Approved
        );
        assert_eq!(
            " rejected ".parse::<AlternativeStatus>().unwrap(),
            AlternativeStatus::Rejected
        );
        assert!("archived".parse::<AlternativeStatus>().is_err());
    }

    #[test]
    fn test_status_serializes_lowercase() {
        let json = serde_json::to_string(&AlternativeStatus::Pending).unwrap();
        assert_eq!(json, "\"pending\"");
        assert_eq!(AlternativeStatus::default(), AlternativeStatus::Pending);
    }
}
