//! Settings for a sorter run
//!
//! Everything lives under one base directory: `DRIVE_SORTER_HOME`, or
//! `<config dir>/drive-sorter`. An optional `settings.json` there overrides
//! the defaults below; relative paths in it resolve against the base directory.

use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

const APP_DIR: &str = "drive-sorter";
const SETTINGS_FILENAME: &str = "settings.json";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("could not determine a configuration directory; set DRIVE_SORTER_HOME")]
    NoConfigDir,
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("invalid setting `{0}`: {1}")]
    Invalid(&'static str, String),
}

/// Classifier endpoint and payload limits
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ClassifierSettings {
    pub model: String,
    pub base_url: String,
    pub timeout_secs: u64,
    /// Plain-text payloads are cut to this many bytes before sending
    pub max_text_bytes: usize,
}

impl Default for ClassifierSettings {
    fn default() -> Self {
        Self {
            model: "gemini-2.0-flash".to_string(),
            base_url: "https://generativelanguage.googleapis.com".to_string(),
            timeout_secs: 120,
            max_text_bytes: 100 * 1024,
        }
    }
}

/// Work-hours heuristic used in the context hint.
///
/// A fixed UTC offset, not a timezone: daylight saving is ignored.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TimeContextSettings {
    pub utc_offset_hours: i32,
    pub work_start_hour: u32,
    pub work_end_hour: u32,
}

impl Default for TimeContextSettings {
    fn default() -> Self {
        Self {
            utc_offset_hours: -5,
            work_start_hour: 8,
            work_end_hour: 18,
        }
    }
}

/// Categories and entity tags assigned by the filename shortcuts
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RuleSettings {
    pub voice_summary_suffix: String,
    pub voice_transcript_suffix: String,
    pub voice_summary_category: String,
    pub voice_transcript_category: String,
    pub voice_export_entity: String,
    pub journal_marker: String,
    pub journal_category: String,
    pub journal_entity: String,
    pub note_prefix_category: String,
    pub note_prefix_entity: String,
}

impl Default for RuleSettings {
    fn default() -> Self {
        Self {
            voice_summary_suffix: "summary.txt".to_string(),
            voice_transcript_suffix: "transcript.txt".to_string(),
            voice_summary_category: "PKM/Plaud".to_string(),
            voice_transcript_category: "PKM/Plaud/Transcripts".to_string(),
            voice_export_entity: "Plaud_Export".to_string(),
            journal_marker: " - Journal - ".to_string(),
            journal_category: "PKM/Gemini".to_string(),
            journal_entity: "Journal".to_string(),
            note_prefix_category: "PKM/Plaud".to_string(),
            note_prefix_entity: "Plaud_Note".to_string(),
        }
    }
}

/// Raw shape of `settings.json`
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct SettingsFile {
    inbox_folder_id: Option<String>,
    category_config: Option<PathBuf>,
    cache_path: Option<PathBuf>,
    recommendations_path: Option<PathBuf>,
    audit_log_path: Option<PathBuf>,
    log_dir: Option<PathBuf>,
    drive_token_path: Option<PathBuf>,
    classifier: ClassifierSettings,
    time_context: TimeContextSettings,
    rules: RuleSettings,
}

/// Resolved settings for one run
#[derive(Debug, Clone)]
pub struct Settings {
    pub base_dir: PathBuf,
    pub inbox_folder_id: String,
    pub category_config: PathBuf,
    pub cache_path: PathBuf,
    pub recommendations_path: PathBuf,
    pub audit_log_path: PathBuf,
    pub log_dir: PathBuf,
    pub drive_token_path: PathBuf,
    pub classifier: ClassifierSettings,
    pub time_context: TimeContextSettings,
    pub rules: RuleSettings,
}

impl Settings {
    /// Base directory for configuration artifacts
    pub fn base_dir() -> Result<PathBuf, ConfigError> {
        if let Ok(home) = std::env::var("DRIVE_SORTER_HOME") {
            if !home.trim().is_empty() {
                return Ok(PathBuf::from(home));
            }
        }
        dirs::config_dir()
            .map(|dir| dir.join(APP_DIR))
            .ok_or(ConfigError::NoConfigDir)
    }

    /// Load settings from the base directory and apply environment overrides
    pub fn load() -> Result<Self, ConfigError> {
        let base_dir = Self::base_dir()?;
        let mut settings = Self::load_from(&base_dir)?;

        if let Ok(inbox) = std::env::var("DRIVE_SORTER_INBOX_ID") {
            settings.inbox_folder_id = inbox;
        }
        if let Ok(model) = std::env::var("DRIVE_SORTER_MODEL") {
            settings.classifier.model = model;
        }

        settings.validate()?;
        Ok(settings)
    }

    /// Load settings rooted at `base_dir` without consulting the environment
    pub fn load_from(base_dir: &Path) -> Result<Self, ConfigError> {
        let path = base_dir.join(SETTINGS_FILENAME);
        let file = if path.exists() {
            let text = fs::read_to_string(&path).map_err(|source| ConfigError::Read {
                path: path.clone(),
                source,
            })?;
            serde_json::from_str::<SettingsFile>(&text)
                .map_err(|source| ConfigError::Parse { path, source })?
        } else {
            tracing::debug!("No {} in {}, using defaults", SETTINGS_FILENAME, base_dir.display());
            SettingsFile::default()
        };

        let resolve = |value: Option<PathBuf>, default: &str| -> PathBuf {
            let p = value.unwrap_or_else(|| PathBuf::from(default));
            if p.is_absolute() {
                p
            } else {
                base_dir.join(p)
            }
        };

        Ok(Self {
            base_dir: base_dir.to_path_buf(),
            inbox_folder_id: file.inbox_folder_id.unwrap_or_default(),
            category_config: resolve(file.category_config, "folder_config.json"),
            cache_path: resolve(file.cache_path, "classification_cache.json"),
            recommendations_path: resolve(file.recommendations_path, "category_recommendations.json"),
            audit_log_path: resolve(file.audit_log_path, "logs/activity.jsonl"),
            log_dir: resolve(file.log_dir, "logs"),
            drive_token_path: resolve(file.drive_token_path, "token_full_drive.json"),
            classifier: file.classifier,
            time_context: file.time_context,
            rules: file.rules,
        })
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.inbox_folder_id.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "inbox_folder_id",
                "set it in settings.json or DRIVE_SORTER_INBOX_ID".to_string(),
            ));
        }
        if !(-12..=14).contains(&self.time_context.utc_offset_hours) {
            return Err(ConfigError::Invalid(
                "time_context.utc_offset_hours",
                self.time_context.utc_offset_hours.to_string(),
            ));
        }
        if self.time_context.work_start_hour >= self.time_context.work_end_hour
            || self.time_context.work_end_hour > 24
        {
            return Err(ConfigError::Invalid(
                "time_context",
                "work_start_hour must be before work_end_hour".to_string(),
            ));
        }
        Ok(())
    }
}
