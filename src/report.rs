//! Run Reporter
//!
//! Per-run counters and the append-only audit trail of every rename, move
//! and move recommendation.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Instant;
use uuid::Uuid;

/// Counters for the current run only
#[derive(Debug)]
pub struct RunStats {
    pub processed: usize,
    pub moved: usize,
    pub renamed: usize,
    pub errors: usize,
    /// Files with no content, and canonical names skipped in maintenance
    pub skipped: usize,
    started: Instant,
}

impl Default for RunStats {
    fn default() -> Self {
        Self {
            processed: 0,
            moved: 0,
            renamed: 0,
            errors: 0,
            skipped: 0,
            started: Instant::now(),
        }
    }
}

impl RunStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn elapsed_secs(&self) -> u64 {
        self.started.elapsed().as_secs()
    }

    /// Human-readable summary emitted at the end of a run
    pub fn summary(&self) -> String {
        format!(
            "Run completed in {}s. Processed: {}, Moved: {}, Renamed: {}, Errors: {}.",
            self.elapsed_secs(),
            self.processed,
            self.moved,
            self.renamed,
            self.errors
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AuditAction {
    #[serde(rename = "Auto-Rename")]
    AutoRename,
    #[serde(rename = "Auto-Move")]
    AutoMove,
    #[serde(rename = "Recommend-Move")]
    RecommendMove,
    #[serde(rename = "Maintenance-Rename")]
    MaintenanceRename,
}

/// One line of the audit log
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditEntry {
    pub timestamp: DateTime<Utc>,
    pub run_id: Uuid,
    pub file_id: String,
    pub original_name: String,
    pub new_name: String,
    pub target_folder_id: Option<String>,
    pub target_folder_path: String,
    pub action: AuditAction,
}

/// What happened to a file, before the log stamps it
#[derive(Debug, Clone)]
pub struct AuditEvent<'a> {
    pub file_id: &'a str,
    pub original_name: &'a str,
    pub new_name: &'a str,
    pub target_folder_id: Option<&'a str>,
    pub target_folder_path: &'a str,
    pub action: AuditAction,
}

/// JSON-lines audit log. Entries are also kept in memory for the run.
pub struct AuditLog {
    path: Option<PathBuf>,
    run_id: Uuid,
    entries: Vec<AuditEntry>,
}

impl AuditLog {
    pub fn in_memory() -> Self {
        Self {
            path: None,
            run_id: Uuid::new_v4(),
            entries: Vec::new(),
        }
    }

    pub fn open(path: &Path) -> Self {
        Self {
            path: Some(path.to_path_buf()),
            ..Self::in_memory()
        }
    }

    pub fn run_id(&self) -> Uuid {
        self.run_id
    }

    pub fn entries(&self) -> &[AuditEntry] {
        &self.entries
    }

    /// Append an entry. Write failures are logged and never fail the run.
    pub fn record(&mut self, event: AuditEvent<'_>) {
        let entry = AuditEntry {
            timestamp: Utc::now(),
            run_id: self.run_id,
            file_id: event.file_id.to_string(),
            original_name: event.original_name.to_string(),
            new_name: event.new_name.to_string(),
            target_folder_id: event.target_folder_id.map(String::from),
            target_folder_path: event.target_folder_path.to_string(),
            action: event.action,
        };

        if let Some(path) = &self.path {
            if let Err(e) = append_line(path, &entry) {
                tracing::error!("  [Log Error] Failed to write audit entry: {}", e);
            }
        }
        self.entries.push(entry);
    }
}

fn append_line(path: &Path, entry: &AuditEntry) -> Result<(), String> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .map_err(|e| format!("Failed to create {}: {}", parent.display(), e))?;
    }
    let line = serde_json::to_string(entry).map_err(|e| format!("Failed to serialize: {}", e))?;
    let mut file = OpenOptions::new()
        .append(true)
        .create(true)
        .open(path)
        .map_err(|e| format!("Failed to open {}: {}", path.display(), e))?;
    writeln!(file, "{}", line).map_err(|e| format!("Failed to write {}: {}", path.display(), e))
}
