//! Batch input records
//!
//! A batch is a JSON document with two ordered lists of candidates. Fields a
//! curator may leave out default to empty so that a missing value fails one
//! candidate at validation time instead of rejecting the whole file.

use altdir_common::db::AlternativeStatus;
use altdir_common::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::pipeline::identity::CandidateIdentity;
use crate::pipeline::scoring::SuppliedScores;

/// One curated batch
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Batch {
    /// Label recorded with the run; defaults to the file stem
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub proprietary: Vec<ProprietaryCandidate>,
    #[serde(default)]
    pub alternatives: Vec<AlternativeCandidate>,
}

impl Batch {
    pub fn from_json_str(json: &str) -> Result<Self> {
        serde_json::from_str(json)
            .map_err(|e| Error::InvalidInput(format!("Malformed batch: {}", e)))
    }

    /// Read a batch file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let mut batch = Self::from_json_str(&content).map_err(|e| {
            Error::InvalidInput(format!("{}: {}", path.display(), e))
        })?;

        if batch.name.is_none() {
            batch.name = path
                .file_stem()
                .map(|stem| stem.to_string_lossy().into_owned());
        }

        Ok(batch)
    }

    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or("unnamed batch")
    }

    pub fn len(&self) -> usize {
        self.proprietary.len() + self.alternatives.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Proposed proprietary product
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProprietaryCandidate {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub slug: Option<String>,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub website: String,
}

impl ProprietaryCandidate {
    pub fn validate(&self) -> Result<()> {
        require_text("name", &self.name)?;
        require_slug(&self.slug())
    }
}

impl CandidateIdentity for ProprietaryCandidate {
    fn name(&self) -> &str {
        &self.name
    }

    fn explicit_slug(&self) -> Option<&str> {
        self.slug.as_deref()
    }
}

/// Proposed open-source alternative
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AlternativeCandidate {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub slug: Option<String>,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub short_description: Option<String>,
    #[serde(default)]
    pub long_description: Option<String>,
    #[serde(default)]
    pub website: String,
    #[serde(default)]
    pub source_repository_url: Option<String>,
    #[serde(default)]
    pub license: Option<String>,
    #[serde(default)]
    pub is_self_hosted: bool,
    /// Free-text hints fed to taxonomy inference, most telling first
    #[serde(default)]
    pub category_keywords: Vec<String>,
    /// Slugs of the proprietary products this replaces
    #[serde(default)]
    pub alternative_to: Vec<String>,
    #[serde(default)]
    pub health_score: Option<i64>,
    #[serde(default)]
    pub vote_score: Option<i64>,
    #[serde(default)]
    pub status: Option<AlternativeStatus>,
}

impl AlternativeCandidate {
    pub fn validate(&self) -> Result<()> {
        require_text("name", &self.name)?;
        require_slug(&self.slug())?;
        require_text("description", &self.description)?;
        require_text("website", &self.website)?;

        if let Some(score) = self.health_score {
            if !(0..=100).contains(&score) {
                return Err(Error::InvalidInput(format!(
                    "health_score {} outside 0..=100",
                    score
                )));
            }
        }

        if let Some(score) = self.vote_score {
            if score < 0 {
                return Err(Error::InvalidInput(format!("vote_score {} is negative", score)));
            }
        }

        Ok(())
    }

    pub fn supplied_scores(&self) -> SuppliedScores {
        SuppliedScores {
            health_score: self.health_score,
            vote_score: self.vote_score,
        }
    }
}

impl CandidateIdentity for AlternativeCandidate {
    fn name(&self) -> &str {
        &self.name
    }

    fn explicit_slug(&self) -> Option<&str> {
        self.slug.as_deref()
    }
}

fn require_text(field: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(Error::InvalidInput(format!("missing required field '{}'", field)));
    }
    Ok(())
}

fn require_slug(slug: &str) -> Result<()> {
    if slug.is_empty() {
        return Err(Error::InvalidInput(
            "name has no letters or digits to build a slug from".to_string(),
        ));
    }
    Ok(())
}

/// Trim optional text, mapping blank to None
pub(crate) fn non_blank(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}
