//! Category paths the registry could not resolve exactly, with occurrence counts.
//!
//! Each record is a read-modify-write of the backing file so counts written by
//! an earlier run (or edited by hand) are never clobbered.

use crate::utils::atomic_write;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

pub struct RecommendationLog {
    path: Option<PathBuf>,
    counts: BTreeMap<String, u64>,
}

impl RecommendationLog {
    /// Log kept in memory only
    pub fn in_memory() -> Self {
        Self {
            path: None,
            counts: BTreeMap::new(),
        }
    }

    /// Log backed by a JSON file of `{categoryPath: count}`
    pub fn open(path: &Path) -> Self {
        let counts = read_counts(path).unwrap_or_else(|e| {
            tracing::error!("Error loading recommendations: {}", e);
            BTreeMap::new()
        });
        Self {
            path: Some(path.to_path_buf()),
            counts,
        }
    }

    /// Count one more occurrence of `category_path`
    pub fn record(&mut self, category_path: &str) {
        tracing::info!("  [Recommendation] No folder for category: {}", category_path);

        if let Some(path) = &self.path {
            match read_counts(path) {
                Ok(on_disk) => self.counts = on_disk,
                Err(e) => tracing::warn!("Re-reading recommendations failed: {}", e),
            }
        }

        *self.counts.entry(category_path.to_string()).or_insert(0) += 1;

        if let Some(path) = &self.path {
            if let Err(e) = atomic_write(path, &self.counts) {
                tracing::error!("Error saving recommendation: {}", e);
            }
        }
    }

    pub fn count(&self, category_path: &str) -> u64 {
        self.counts.get(category_path).copied().unwrap_or(0)
    }

    pub fn entries(&self) -> &BTreeMap<String, u64> {
        &self.counts
    }
}

fn read_counts(path: &Path) -> Result<BTreeMap<String, u64>, String> {
    if !path.exists() {
        return Ok(BTreeMap::new());
    }
    let text = fs::read_to_string(path)
        .map_err(|e| format!("Failed to read {}: {}", path.display(), e))?;
    serde_json::from_str(&text).map_err(|e| format!("Failed to parse {}: {}", path.display(), e))
}
