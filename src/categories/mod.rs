//! Category Registry
//!
//! Loads the `Parent -> {id, subcategories}` folder mapping once per run,
//! exposes the flattened vocabulary offered to the classifier, and resolves a
//! category path to the folder a file should be filed into.

pub mod recommendations;

pub use recommendations::RecommendationLog;

use crate::ai::types::{OTHER_CATEGORY, UNCATEGORIZED_CATEGORY};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::Path;

/// One top-level category and its optional subfolders
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CategoryEntry {
    pub id: String,
    #[serde(default)]
    pub subcategories: BTreeMap<String, String>,
}

/// Shape of the category configuration file
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CategoryTree {
    #[serde(default)]
    pub mappings: BTreeMap<String, CategoryEntry>,
}

impl CategoryTree {
    /// Read the mapping file; any failure yields an empty tree
    pub fn load(path: &Path) -> Self {
        let loaded = fs::read_to_string(path)
            .map_err(|e| format!("Failed to read {}: {}", path.display(), e))
            .and_then(|text| {
                serde_json::from_str::<CategoryTree>(&text)
                    .map_err(|e| format!("Failed to parse {}: {}", path.display(), e))
            });

        match loaded {
            Ok(tree) => tree,
            Err(e) => {
                tracing::error!("Error loading category config: {}", e);
                Self::default()
            }
        }
    }
}

pub struct CategoryRegistry {
    tree: CategoryTree,
    recommendations: RecommendationLog,
}

impl CategoryRegistry {
    pub fn new(tree: CategoryTree, recommendations: RecommendationLog) -> Self {
        Self {
            tree,
            recommendations,
        }
    }

    /// Load from the configured file. Never fails: a missing or broken file
    /// leaves nothing resolvable.
    pub fn load(config_path: &Path, recommendations: RecommendationLog) -> Self {
        let tree = CategoryTree::load(config_path);
        tracing::info!("Loaded {} top-level categories.", tree.mappings.len());
        Self::new(tree, recommendations)
    }

    pub fn is_empty(&self) -> bool {
        self.tree.mappings.is_empty()
    }

    pub fn recommendations(&self) -> &RecommendationLog {
        &self.recommendations
    }

    /// Every `Parent` and `Parent/Sub`, plus `Other`, sorted and deduplicated
    pub fn list_categories(&self) -> Vec<String> {
        let mut categories = BTreeSet::new();
        categories.insert(OTHER_CATEGORY.to_string());
        for (parent, entry) in &self.tree.mappings {
            categories.insert(parent.clone());
            for sub in entry.subcategories.keys() {
                categories.insert(format!("{}/{}", parent, sub));
            }
        }
        categories.into_iter().collect()
    }

    /// Vocabulary as passed verbatim into the classifier instructions
    pub fn prompt_string(&self) -> String {
        self.list_categories().join(", ")
    }

    /// Folder id for a category path, or `None` meaning "do not move".
    ///
    /// An unknown parent is recorded as a recommendation and yields `None`.
    /// An unknown subcategory under a known parent is recorded and falls back
    /// to the parent's folder.
    pub fn resolve(&mut self, category_path: &str) -> Option<String> {
        let category_path = category_path.trim();
        if category_path.is_empty()
            || category_path == OTHER_CATEGORY
            || category_path == UNCATEGORIZED_CATEGORY
        {
            return None;
        }

        let mut parts = category_path.split('/').map(str::trim);
        let parent_name = parts.next().unwrap_or_default();
        let sub_name = parts.next().filter(|s| !s.is_empty());

        let Some(parent) = self.tree.mappings.get(parent_name) else {
            self.recommendations.record(category_path);
            return None;
        };
        let parent_id = parent.id.clone();

        let Some(sub_name) = sub_name else {
            return Some(parent_id);
        };

        if let Some(sub_id) = parent.subcategories.get(sub_name) {
            return Some(sub_id.clone());
        }

        self.recommendations
            .record(&format!("{}/{}", parent_name, sub_name));
        Some(parent_id)
    }
}
