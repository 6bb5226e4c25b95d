//! Classifier Adapter
//!
//! Wraps the external [`Classifier`] with everything that decides whether it is
//! called at all and what its answer means:
//!
//! 1. Filename rules (voice-note exports, journal entries)
//! 2. Cache lookup by file id
//! 3. `MM-DD ` note prefix rule
//! 4. Content-type gate (unsupported formats never reach the model)
//! 5. Model call, permissive parse, cache write
//!
//! Rule answers are cached exactly like model answers. Failures are returned as
//! [`Classification::Failed`] and never cached, so the next run retries them.

use super::cache::ClassificationCache;
use super::classifier::Classifier;
use super::json_parser::parse_classification;
use super::prompts::build_classification_prompt;
use super::shortcuts::{match_filename_rule, match_note_prefix};
use super::types::{Classification, ClassificationResult, FailureKind};
use crate::config::RuleSettings;
use chrono::{DateTime, Datelike, Utc};
use std::path::Path;
use std::sync::Arc;

const PLAIN_TEXT: &str = "text/plain";

/// Content types sent to the model as plain text
const TEXT_TYPES: &[&str] = &[
    "text/plain",
    "text/csv",
    "text/markdown",
    "text/html",
    "application/json",
];

/// Extensions trusted as text when the declared type says nothing
const TEXT_EXTENSIONS: &[&str] = &["txt", "csv", "md", "log"];

/// Everything the adapter needs to classify one file
#[derive(Debug, Clone)]
pub struct ClassifyRequest<'a> {
    pub content: &'a [u8],
    pub content_type: &'a str,
    pub file_name: &'a str,
    /// Comma-joined category vocabulary
    pub categories: &'a str,
    pub context_hint: &'a str,
    pub file_id: Option<&'a str>,
    pub created_time: Option<DateTime<Utc>>,
}

/// Map a declared content type to one the model accepts, or `None` if unsupported
pub fn supported_mime(content_type: &str, file_name: &str) -> Option<String> {
    let mime = content_type.trim().to_lowercase();

    if mime.contains("pdf") {
        return Some("application/pdf".to_string());
    }
    if mime.starts_with("image/") {
        return Some(mime);
    }
    if TEXT_TYPES.iter().any(|t| mime.contains(t)) {
        return Some(PLAIN_TEXT.to_string());
    }
    if mime == "application/octet-stream" || !mime.contains('/') {
        let ext = Path::new(file_name)
            .extension()
            .map(|e| e.to_string_lossy().to_lowercase());
        if ext.is_some_and(|e| TEXT_EXTENSIONS.contains(&e.as_str())) {
            return Some(PLAIN_TEXT.to_string());
        }
    }
    None
}

pub struct ClassifierAdapter {
    classifier: Arc<dyn Classifier>,
    cache: ClassificationCache,
    rules: RuleSettings,
    max_text_bytes: usize,
}

impl ClassifierAdapter {
    pub fn new(
        classifier: Arc<dyn Classifier>,
        cache: ClassificationCache,
        rules: RuleSettings,
        max_text_bytes: usize,
    ) -> Self {
        Self {
            classifier,
            cache,
            rules,
            max_text_bytes,
        }
    }

    pub fn cache(&self) -> &ClassificationCache {
        &self.cache
    }

    fn remember(&mut self, file_id: Option<&str>, record: &ClassificationResult) {
        if let Some(id) = file_id {
            self.cache.insert(id, record.clone());
        }
    }

    pub async fn classify(&mut self, request: &ClassifyRequest<'_>) -> Classification {
        if let Some(record) = match_filename_rule(request.file_name, &self.rules) {
            self.remember(request.file_id, &record);
            return Classification::Classified(record);
        }

        if let Some(hit) = request.file_id.and_then(|id| self.cache.get(id)) {
            tracing::debug!("  [Cache] {}", request.file_name);
            return Classification::Classified(hit.clone());
        }

        let year = request
            .created_time
            .map(|t| t.year())
            .unwrap_or_else(|| Utc::now().year());
        if let Some(record) = match_note_prefix(request.file_name, year, &self.rules) {
            self.remember(request.file_id, &record);
            return Classification::Classified(record);
        }

        let Some(ai_mime) = supported_mime(request.content_type, request.file_name) else {
            tracing::warn!(
                "  [Skip] Unsupported file type for AI: {} ({})",
                request.file_name,
                request.content_type
            );
            return Classification::Failed(FailureKind::UnsupportedFormat);
        };

        let mut payload = request.content;
        if ai_mime == PLAIN_TEXT && payload.len() > self.max_text_bytes {
            tracing::info!(
                "  [Info] Truncating large text file ({} bytes) to {} bytes.",
                payload.len(),
                self.max_text_bytes
            );
            payload = &payload[..self.max_text_bytes];
        }

        let prompt = build_classification_prompt(request.context_hint, request.categories);
        tracing::info!(
            "  Sending to classifier as {} (Original: {})...",
            ai_mime,
            request.content_type
        );

        let text = match self.classifier.generate(&prompt, payload, &ai_mime).await {
            Ok(text) => text,
            Err(e) => {
                tracing::error!("  Classifier error for {}: {}", request.file_name, e);
                return Classification::Failed(FailureKind::ClassifierError);
            }
        };

        match parse_classification(&text) {
            Ok(record) => {
                self.remember(request.file_id, &record);
                Classification::Classified(record)
            }
            Err(e) => {
                tracing::error!("    [JSON Error] {}: {}. Raw text: {}", request.file_name, e, text);
                Classification::Failed(FailureKind::ClassifierError)
            }
        }
    }
}
