//! Filename rules that classify without calling the model.
//!
//! Every rule answers with `High` confidence.

use super::types::{ClassificationResult, Confidence, PLACEHOLDER_DATE};
use crate::config::RuleSettings;
use crate::naming::split_extension;
use once_cell::sync::Lazy;
use regex::Regex;

/// `MM-DD ` prefix used by personal voice notes
static NOTE_PREFIX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\d{2}-\d{2})\s").expect("valid note prefix pattern"));

fn file_stem(file_name: &str) -> String {
    split_extension(file_name).0.to_string()
}

/// Rules checked before the cache: voice-note exports, then journal entries
pub fn match_filename_rule(file_name: &str, rules: &RuleSettings) -> Option<ClassificationResult> {
    voice_export(file_name, rules).or_else(|| journal_entry(file_name, rules))
}

fn voice_export(file_name: &str, rules: &RuleSettings) -> Option<ClassificationResult> {
    let lower = file_name.to_lowercase();
    let category = if lower.ends_with(&rules.voice_transcript_suffix.to_lowercase()) {
        &rules.voice_transcript_category
    } else if lower.ends_with(&rules.voice_summary_suffix.to_lowercase()) {
        &rules.voice_summary_category
    } else {
        return None;
    };

    tracing::info!("  [Rule] Voice note export: {}", file_name);
    Some(ClassificationResult {
        doc_date: Some(PLACEHOLDER_DATE.to_string()),
        entity: rules.voice_export_entity.clone(),
        category: category.clone(),
        summary: file_stem(file_name),
        confidence: Confidence::High,
    })
}

fn journal_entry(file_name: &str, rules: &RuleSettings) -> Option<ClassificationResult> {
    if !file_name.contains(&rules.journal_marker) {
        return None;
    }

    tracing::info!("  [Rule] Journal entry: {}", file_name);
    let parts: Vec<&str> = file_name.split(" - ").collect();
    let (doc_date, summary) = if parts.len() >= 3 {
        (parts[0].trim().to_string(), file_stem(parts[2].trim()))
    } else {
        (PLACEHOLDER_DATE.to_string(), file_name.to_string())
    };

    Some(ClassificationResult {
        doc_date: Some(doc_date),
        entity: rules.journal_entity.clone(),
        category: rules.journal_category.clone(),
        summary,
        confidence: Confidence::High,
    })
}

/// Rule checked after the cache: `MM-DD ` prefixed notes, dated in `year`
pub fn match_note_prefix(
    file_name: &str,
    year: i32,
    rules: &RuleSettings,
) -> Option<ClassificationResult> {
    let caps = NOTE_PREFIX.captures(file_name)?;

    tracing::info!("  [Rule] Dated personal note: {}", file_name);
    Some(ClassificationResult {
        doc_date: Some(format!("{:04}-{}", year, &caps[1])),
        entity: rules.note_prefix_entity.clone(),
        category: rules.note_prefix_category.clone(),
        summary: file_stem(file_name),
        confidence: Confidence::High,
    })
}
