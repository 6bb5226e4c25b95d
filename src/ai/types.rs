//! Shared types for the classification pipeline

use serde::{Deserialize, Serialize};
use std::fmt;

/// Date written by the classifier (or a rule) when no date is known
pub const PLACEHOLDER_DATE: &str = "0000-00-00";

/// Category that is never filed anywhere
pub const OTHER_CATEGORY: &str = "Other";

/// Category reported when classification failed
pub const UNCATEGORIZED_CATEGORY: &str = "Uncategorized";

/// Three-level confidence reported by the classifier.
///
/// Only `High` ever allows a file to be moved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Confidence {
    High,
    Medium,
    Low,
}

impl Confidence {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::High => "High",
            Self::Medium => "Medium",
            Self::Low => "Low",
        }
    }

    /// Lenient parse; anything unrecognised counts as `Low`
    pub fn parse(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "high" => Self::High,
            "medium" | "med" => Self::Medium,
            _ => Self::Low,
        }
    }

    pub fn is_high(&self) -> bool {
        matches!(self, Self::High)
    }
}

impl fmt::Display for Confidence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Structured record returned by the classifier (or a filename rule).
///
/// Serialized with the same snake_case keys the cache file has always used.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassificationResult {
    /// Document date as `YYYY-MM-DD`, if the classifier found one
    #[serde(default)]
    pub doc_date: Option<String>,

    /// Vendor, person or organization the document is about
    pub entity: String,

    /// Category path, `Parent` or `Parent/Sub`
    pub category: String,

    /// Very short description of the document
    pub summary: String,

    pub confidence: Confidence,
}

/// Why a file could not be classified
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// Request, transport or response-parsing failure
    ClassifierError,
    /// Content type the classifier cannot consume; no call was made
    UnsupportedFormat,
}

impl FailureKind {
    /// Marker used in logs and in the legacy record form
    pub fn marker(&self) -> &'static str {
        match self {
            Self::ClassifierError => "AI_Error",
            Self::UnsupportedFormat => "Unsupported_Format",
        }
    }

    fn category(&self) -> &'static str {
        match self {
            Self::ClassifierError => UNCATEGORIZED_CATEGORY,
            Self::UnsupportedFormat => OTHER_CATEGORY,
        }
    }
}

/// Outcome of classifying one file
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Classification {
    Classified(ClassificationResult),
    Failed(FailureKind),
}

impl Classification {
    pub fn category(&self) -> &str {
        match self {
            Self::Classified(result) => &result.category,
            Self::Failed(kind) => kind.category(),
        }
    }

    pub fn confidence(&self) -> Confidence {
        match self {
            Self::Classified(result) => result.confidence,
            Self::Failed(_) => Confidence::Low,
        }
    }

    pub fn summary(&self) -> &str {
        match self {
            Self::Classified(result) => &result.summary,
            Self::Failed(kind) => kind.marker(),
        }
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, Self::Failed(_))
    }

    /// Flatten into the fixed-shape record, rendering failures as the sentinel record
    pub fn to_record(&self) -> ClassificationResult {
        match self {
            Self::Classified(result) => result.clone(),
            Self::Failed(kind) => ClassificationResult {
                doc_date: Some(PLACEHOLDER_DATE.to_string()),
                entity: "Unknown".to_string(),
                category: kind.category().to_string(),
                summary: kind.marker().to_string(),
                confidence: Confidence::Low,
            },
        }
    }
}
