//! Naming Policy
//!
//! Derives the canonical `{date} - {entity} - {summary}{ext}` name for a
//! classified file. The same grammar is what [`is_canonical_name`] accepts, so
//! a file renamed here is recognised as done on the next run.

use crate::ai::types::{Classification, ClassificationResult, PLACEHOLDER_DATE};
use chrono::{DateTime, NaiveDate, Utc};
use once_cell::sync::Lazy;
use regex::Regex;

const NO_DATE_SUFFIX: &str = "_(NoDate)";

static CANONICAL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d{4}-\d{2}-\d{2} - .* - .*\.\w+$").expect("valid canonical pattern"));

static DATE_IN_NAME: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\d{4}-\d{2}-\d{2}").expect("valid date pattern"));

static DATE_PREFIX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d{4}-\d{2}-\d{2}\s*-?\s*").expect("valid date prefix pattern"));

/// True when `name` already follows the canonical grammar with a real date
pub fn is_canonical_name(name: &str) -> bool {
    CANONICAL.is_match(name) && !name.starts_with(PLACEHOLDER_DATE)
}

/// Split `name` into stem and extension (with its dot). Leading dots belong
/// to the stem, so `.env` has no extension.
pub fn split_extension(name: &str) -> (&str, &str) {
    let leading = name.len() - name.trim_start_matches('.').len();
    match name[leading..].rfind('.') {
        Some(pos) => name.split_at(leading + pos),
        None => (name, ""),
    }
}

/// Calendar-valid `YYYY-MM-DD`
fn valid_date(candidate: &str) -> Option<String> {
    if candidate == PLACEHOLDER_DATE {
        return None;
    }
    NaiveDate::parse_from_str(candidate, "%Y-%m-%d")
        .ok()
        .map(|d| d.format("%Y-%m-%d").to_string())
}

/// First usable date: classifier date, then a date in the filename, then the
/// creation date.
fn resolve_date(
    doc_date: Option<&str>,
    original_name: &str,
    created: Option<DateTime<Utc>>,
) -> Option<String> {
    doc_date
        .map(str::trim)
        .and_then(valid_date)
        .or_else(|| {
            DATE_IN_NAME
                .find_iter(original_name)
                .find_map(|m| valid_date(m.as_str()))
        })
        .or_else(|| created.map(|c| c.format("%Y-%m-%d").to_string()))
}

/// Keep letters, digits, space, `_` and `-`; whitespace runs become `_`
fn sanitize(value: &str, fallback: &str) -> String {
    let kept: String = value
        .chars()
        .filter(|c| c.is_alphanumeric() || matches!(c, ' ' | '_' | '-'))
        .collect();
    let joined = kept.split_whitespace().collect::<Vec<_>>().join("_");
    if joined.is_empty() {
        fallback.to_string()
    } else {
        joined
    }
}

fn standard_name(result: &ClassificationResult, original_name: &str, created: Option<DateTime<Utc>>) -> String {
    let (_, ext) = split_extension(original_name);
    let entity = sanitize(&result.entity, "Unknown");
    let mut summary = sanitize(&result.summary, "Doc");

    let date = match resolve_date(result.doc_date.as_deref(), original_name, created) {
        Some(date) => date,
        None => {
            summary.push_str(NO_DATE_SUFFIX);
            PLACEHOLDER_DATE.to_string()
        }
    };

    format!("{} - {} - {}{}", date, entity, summary, ext)
}

/// Failed classifications keep the original name's content, minus any date
/// prefix an earlier run put there.
fn preserved_name(original_name: &str, created: Option<DateTime<Utc>>) -> String {
    let (stem, ext) = split_extension(original_name);
    let stripped = DATE_PREFIX.replace(stem, "");
    let stem = if stripped.trim().is_empty() {
        stem
    } else {
        stripped.trim()
    };

    let date = resolve_date(None, original_name, created).unwrap_or_else(|| PLACEHOLDER_DATE.to_string());
    format!("{} - {}{}", date, stem, ext)
}

/// Canonical name for a file given how it was classified
pub fn canonical_name(
    classification: &Classification,
    original_name: &str,
    created: Option<DateTime<Utc>>,
) -> String {
    match classification {
        Classification::Classified(result) => standard_name(result, original_name, created),
        Classification::Failed(_) => preserved_name(original_name, created),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::types::{Confidence, FailureKind};
    use chrono::TimeZone;

    fn classified(doc_date: Option<&str>, entity: &str, summary: &str) -> Classification {
        Classification::Classified(ClassificationResult {
            doc_date: doc_date.map(String::from),
            entity: entity.to_string(),
            category: "Work".to_string(),
            summary: summary.to_string(),
            confidence: Confidence::High,
        })
    }

    fn created() -> Option<DateTime<Utc>> {
        Some(Utc.with_ymd_and_hms(2024, 3, 5, 14, 30, 0).unwrap())
    }

    #[test]
    fn test_standard_template() {
        let name = canonical_name(
            &classified(Some("2024-01-10"), "DISA", "Security Review"),
            "meeting.txt",
            created(),
        );
        assert_eq!(name, "2024-01-10 - DISA - Security_Review.txt");
        assert!(is_canonical_name(&name));
    }

    #[test]
    fn test_sanitizes_entity_and_summary() {
        let name = canonical_name(
            &classified(Some("2024-01-10"), "AT&T / Mobile", "Bill: March  (final)"),
            "bill.pdf",
            None,
        );
        assert_eq!(name, "2024-01-10 - ATT_Mobile - Bill_March_final.pdf");
    }

    #[test]
    fn test_empty_fields_fall_back() {
        let name = canonical_name(&classified(Some("2024-01-10"), "!!", ""), "x.pdf", None);
        assert_eq!(name, "2024-01-10 - Unknown - Doc.pdf");
    }

    #[test]
    fn test_date_fallback_order() {
        // Placeholder date falls through to the filename
        let name = canonical_name(
            &classified(Some("0000-00-00"), "Chase", "Statement"),
            "scan 2023-11-02.pdf",
            created(),
        );
        assert!(name.starts_with("2023-11-02 - "));

        // Invalid calendar dates are skipped
        let name = canonical_name(
            &classified(Some("2024-13-45"), "Chase", "Statement"),
            "scan 2023-02-30 then 2023-03-01.pdf",
            created(),
        );
        assert!(name.starts_with("2023-03-01 - "));

        // Then the creation date
        let name = canonical_name(&classified(None, "Chase", "Statement"), "scan.pdf", created());
        assert!(name.starts_with("2024-03-05 - "));
    }

    #[test]
    fn test_no_date_marker() {
        let name = canonical_name(&classified(None, "Chase", "Statement"), "scan.pdf", None);
        assert_eq!(name, "0000-00-00 - Chase - Statement_(NoDate).pdf");
        assert!(!is_canonical_name(&name));
    }

    #[test]
    fn test_failure_preserves_original_content() {
        let failed = Classification::Failed(FailureKind::ClassifierError);

        let name = canonical_name(&failed, "Quarterly board minutes.docx", created());
        assert_eq!(name, "2024-03-05 - Quarterly board minutes.docx");

        // A prefix from an earlier failed run is not compounded
        let again = canonical_name(&failed, &name, created());
        assert_eq!(again, name);

        let name = canonical_name(&failed, "0000-00-00 - Lease draft.pdf", None);
        assert_eq!(name, "0000-00-00 - Lease draft.pdf");
    }

    #[test]
    fn test_failure_with_only_a_date_keeps_stem() {
        let failed = Classification::Failed(FailureKind::UnsupportedFormat);
        let name = canonical_name(&failed, "2024-02-01.bin", None);
        assert_eq!(name, "2024-02-01 - 2024-02-01.bin");
    }

    #[test]
    fn test_canonical_predicate() {
        assert!(is_canonical_name("2024-01-10 - DISA - Security_Review.txt"));
        assert!(is_canonical_name("2024-01-10 - A - B - C.pdf"));
        assert!(!is_canonical_name("0000-00-00 - DISA - Security_Review.txt"));
        assert!(!is_canonical_name("2024-01-10 - Notes.txt"));
        assert!(!is_canonical_name("2024-01-10 - DISA - Security_Review"));
        assert!(!is_canonical_name("meeting.txt"));
    }

    #[test]
    fn test_split_extension() {
        assert_eq!(split_extension("report.final.pdf"), ("report.final", ".pdf"));
        assert_eq!(split_extension("README"), ("README", ""));
        assert_eq!(split_extension(".env"), (".env", ""));
        assert_eq!(split_extension("..hidden.txt"), ("..hidden", ".txt"));
    }
}
