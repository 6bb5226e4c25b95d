//! Classification cache
//!
//! Maps a store file id to the record it was classified as, so a file is sent
//! to the model at most once over the lifetime of the cache file. The whole map
//! is rewritten after every insert.

use super::json_parser::record_from_value;
use super::types::ClassificationResult;
use crate::utils::atomic_write;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

pub struct ClassificationCache {
    path: Option<PathBuf>,
    entries: BTreeMap<String, ClassificationResult>,
}

impl ClassificationCache {
    /// Cache that never touches disk
    pub fn in_memory() -> Self {
        Self {
            path: None,
            entries: BTreeMap::new(),
        }
    }

    /// Open the cache file, starting empty if it is missing or unreadable
    pub fn open(path: &Path) -> Self {
        let entries = match Self::read_entries(path) {
            Ok(entries) => {
                tracing::info!("Loaded {} entries from classification cache.", entries.len());
                entries
            }
            Err(e) => {
                tracing::error!("Error loading classification cache: {}", e);
                BTreeMap::new()
            }
        };

        Self {
            path: Some(path.to_path_buf()),
            entries,
        }
    }

    fn read_entries(path: &Path) -> Result<BTreeMap<String, ClassificationResult>, String> {
        if !path.exists() {
            return Ok(BTreeMap::new());
        }

        let text = fs::read_to_string(path)
            .map_err(|e| format!("Failed to read {}: {}", path.display(), e))?;
        let raw: BTreeMap<String, serde_json::Value> = serde_json::from_str(&text)
            .map_err(|e| format!("Failed to parse {}: {}", path.display(), e))?;

        let mut entries = BTreeMap::new();
        for (file_id, value) in raw {
            match record_from_value(&value) {
                Ok(record) => {
                    entries.insert(file_id, record);
                }
                Err(e) => tracing::warn!("Dropping cache entry {}: {}", file_id, e),
            }
        }
        Ok(entries)
    }

    pub fn get(&self, file_id: &str) -> Option<&ClassificationResult> {
        self.entries.get(file_id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Store a record and flush the cache file immediately.
    ///
    /// Re-inserting an identical record is a no-op. Write failures are logged;
    /// the in-memory entry is kept either way.
    pub fn insert(&mut self, file_id: &str, record: ClassificationResult) {
        if self.entries.get(file_id) == Some(&record) {
            return;
        }
        self.entries.insert(file_id.to_string(), record);

        if let Some(path) = &self.path {
            if let Err(e) = atomic_write(path, &self.entries) {
                tracing::error!("Error saving classification cache: {}", e);
            }
        }
    }
}
