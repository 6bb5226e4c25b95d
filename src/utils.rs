//! Small filesystem helpers shared by the on-disk state files

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::Path;

/// Atomically write JSON to a file
pub fn atomic_write<T: serde::Serialize>(path: &Path, data: &T) -> Result<(), String> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)
                .map_err(|e| format!("Failed to create {}: {}", parent.display(), e))?;
        }
    }

    // Write to temporary file first
    let temp_path = path.with_extension("tmp");

    let file =
        File::create(&temp_path).map_err(|e| format!("Failed to create temp file: {}", e))?;

    let mut writer = BufWriter::new(file);

    serde_json::to_writer_pretty(&mut writer, data)
        .map_err(|e| format!("Failed to serialize: {}", e))?;

    writer
        .flush()
        .map_err(|e| format!("Failed to flush: {}", e))?;

    // Sync to disk
    writer
        .get_ref()
        .sync_all()
        .map_err(|e| format!("Failed to sync: {}", e))?;

    // Atomic rename
    fs::rename(&temp_path, path).map_err(|e| format!("Failed to rename: {}", e))?;

    Ok(())
}
