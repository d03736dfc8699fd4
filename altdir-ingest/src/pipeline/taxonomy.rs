//! Keyword → category inference
//!
//! Maps the free-text keyword hints of a candidate onto category slugs through
//! a static, curator-maintained dictionary. Nothing is learned at runtime: the
//! dictionary is a version-controlled TOML file.
//!
//! ```toml
//! [[category]]
//! slug = "databases"
//! name = "Databases"
//! description = "Relational, document and key-value stores"
//!
//! [keywords]
//! "database" = ["databases", "developer-tools"]
//! ```

use altdir_common::db::MAX_CATEGORIES;
use altdir_common::{Error, Result};
use serde::Deserialize;
use std::collections::{HashMap, HashSet};
use std::path::Path;
use tracing::{debug, warn};

use super::identity::{canonical_slug, CandidateIdentity};

/// Category declared by the dictionary, created by the seeding step
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CategorySeed {
    #[serde(default)]
    pub slug: Option<String>,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
}

impl CandidateIdentity for CategorySeed {
    fn name(&self) -> &str {
        &self.name
    }

    fn explicit_slug(&self) -> Option<&str> {
        self.slug.as_deref()
    }
}

#[derive(Debug, Deserialize)]
struct DictionaryFile {
    #[serde(default, rename = "category")]
    categories: Vec<CategorySeed>,
    /// Kept in file order so case-colliding keywords merge predictably
    #[serde(default)]
    keywords: toml::Table,
}

/// Lowercased keyword → ordered category slugs (most relevant first)
#[derive(Debug, Clone, Default)]
pub struct KeywordDictionary {
    mappings: HashMap<String, Vec<String>>,
    categories: Vec<CategorySeed>,
}

impl KeywordDictionary {
    /// Load the dictionary file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::Config(format!("Read keyword dictionary {} failed: {}", path.display(), e))
        })?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let file: DictionaryFile = toml::from_str(content)
            .map_err(|e| Error::Config(format!("Parse keyword dictionary failed: {}", e)))?;

        let mut entries: Vec<(String, Vec<String>)> = Vec::with_capacity(file.keywords.len());
        for (keyword, value) in file.keywords {
            let targets = value.try_into::<Vec<String>>().map_err(|e| {
                Error::Config(format!("Keyword '{}' must map to a list of slugs: {}", keyword, e))
            })?;
            entries.push((keyword, targets));
        }

        let dictionary = Self::from_entries(entries)?.with_categories(file.categories);
        dictionary.warn_on_undeclared_targets();
        Ok(dictionary)
    }

    /// Build from (keyword, slugs) pairs
    ///
    /// Keywords are trimmed and lowercased; keywords that collide after
    /// normalization are merged in iteration order. Target slugs go through
    /// [`canonical_slug`].
    pub fn from_entries<I, K, S>(entries: I) -> Result<Self>
    where
        I: IntoIterator<Item = (K, Vec<S>)>,
        K: AsRef<str>,
        S: AsRef<str>,
    {
        let mut mappings: HashMap<String, Vec<String>> = HashMap::new();

        for (keyword, slugs) in entries {
            let key = keyword.as_ref().trim().to_lowercase();
            if key.is_empty() {
                return Err(Error::Config("keyword dictionary has an empty keyword".to_string()));
            }

            let targets = mappings.entry(key).or_default();
            for slug in slugs {
                let slug = canonical_slug(slug.as_ref());
                if !slug.is_empty() && !targets.contains(&slug) {
                    targets.push(slug);
                }
            }
        }

        Ok(Self {
            mappings,
            categories: Vec::new(),
        })
    }

    pub fn with_categories(mut self, categories: Vec<CategorySeed>) -> Self {
        self.categories = categories;
        self
    }

    /// Declared category seeds, in file order
    pub fn categories(&self) -> &[CategorySeed] {
        &self.categories
    }

    /// Category slugs mapped from one keyword (empty if unknown)
    pub fn lookup(&self, keyword: &str) -> &[String] {
        self.mappings
            .get(&keyword.trim().to_lowercase())
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn len(&self) -> usize {
        self.mappings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mappings.is_empty()
    }

    /// Infer up to [`MAX_CATEGORIES`] distinct category slugs
    ///
    /// Keywords are visited in order and each contributes its mapped slugs not
    /// yet selected, in dictionary order. Unknown keywords contribute nothing;
    /// an empty result is valid.
    pub fn infer_categories<S: AsRef<str>>(&self, keywords: &[S]) -> Vec<String> {
        let mut selected: Vec<String> = Vec::with_capacity(MAX_CATEGORIES);

        'keywords: for keyword in keywords {
            let keyword = keyword.as_ref();
            let targets = self.lookup(keyword);
            if targets.is_empty() {
                debug!(keyword, "No dictionary entry for keyword");
                continue;
            }

            for slug in targets {
                if selected.len() == MAX_CATEGORIES {
                    break 'keywords;
                }
                if !selected.contains(slug) {
                    selected.push(slug.clone());
                }
            }
        }

        selected
    }

    fn warn_on_undeclared_targets(&self) {
        if self.categories.is_empty() {
            return;
        }

        let declared: HashSet<String> = self.categories.iter().map(|c| c.slug()).collect();
        let mut undeclared: Vec<&str> = self
            .mappings
            .values()
            .flatten()
            .filter(|slug| !declared.contains(*slug))
            .map(String::as_str)
            .collect();
        undeclared.sort_unstable();
        undeclared.dedup();

        if !undeclared.is_empty() {
            warn!(
                slugs = ?undeclared,
                "Keyword dictionary maps to categories it does not declare"
            );
        }
    }
}
