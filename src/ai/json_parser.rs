//! Permissive parsing of classifier responses
//!
//! The classifier is asked for a bare JSON object but is not guaranteed to
//! return one. Handles:
//! - ```json code blocks
//! - Plain ``` code blocks
//! - Prose before or after the JSON
//! - A list of records (the first element is used)

use super::types::{ClassificationResult, Confidence, UNCATEGORIZED_CATEGORY};
use serde_json::Value;

/// Why a response could not be turned into a record
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ParseError {
    #[error("no JSON-like structure found")]
    NoJson,
    #[error("empty JSON list returned")]
    EmptyList,
    #[error("expected a JSON object, got {0}")]
    NotAnObject(&'static str),
    #[error("malformed JSON: {0}")]
    Malformed(String),
}

/// Strip a markdown code fence if the text contains one
pub fn strip_code_fence(text: &str) -> &str {
    if let Some(start) = text.find("```json") {
        let json_start = start + 7;
        if let Some(end) = text[json_start..].find("```") {
            return text[json_start..json_start + end].trim();
        }
    }

    if let Some(start) = text.find("```") {
        let block_start = start + 3;
        let content_start = text[block_start..]
            .find('\n')
            .map(|i| block_start + i + 1)
            .unwrap_or(block_start);
        if let Some(end) = text[content_start..].find("```") {
            return text[content_start..content_start + end].trim();
        }
    }

    text.trim()
}

/// Decode the first complete JSON value at the start of `text`
fn decode_first(text: &str) -> Option<Result<Value, String>> {
    serde_json::Deserializer::from_str(text)
        .into_iter::<Value>()
        .next()
        .map(|result| result.map_err(|e| e.to_string()))
}

/// Decode the first JSON record in `text`.
///
/// A list is accepted when it opens before any `{` and its first element is
/// an object; bracketed prose such as `[1]` is skipped. Otherwise decoding
/// starts at the first `{` and anything after the value is ignored. If that
/// fails, the widest `{ ... }` slice is tried as a last resort.
pub fn extract_first_value(text: &str) -> Result<Value, ParseError> {
    let open_brace = text.find('{');
    let mut first_error = None;

    let leading_bracket = text
        .find('[')
        .filter(|bracket| open_brace.map_or(true, |brace| *bracket < brace));
    if let Some(bracket) = leading_bracket {
        match decode_first(&text[bracket..]) {
            Some(Ok(Value::Array(items)))
                if open_brace.is_none() || items.first().is_some_and(Value::is_object) =>
            {
                return Ok(Value::Array(items));
            }
            Some(Err(e)) => first_error = Some(e),
            _ => {}
        }
    }

    let Some(open) = open_brace else {
        return Err(first_error.map_or(ParseError::NoJson, ParseError::Malformed));
    };
    match decode_first(&text[open..]) {
        Some(Ok(value)) => return Ok(value),
        Some(Err(e)) => first_error = Some(e),
        None => {}
    }

    match text.rfind('}') {
        Some(close) if open < close => {
            serde_json::from_str(&text[open..=close]).map_err(|e| ParseError::Malformed(e.to_string()))
        }
        _ => Err(first_error.map_or(ParseError::NoJson, ParseError::Malformed)),
    }
}

/// Parse a raw classifier response into a record
pub fn parse_classification(text: &str) -> Result<ClassificationResult, ParseError> {
    let mut value = extract_first_value(strip_code_fence(text))?;

    if let Value::Array(items) = value {
        value = items.into_iter().next().ok_or(ParseError::EmptyList)?;
    }

    record_from_value(&value)
}

/// Build a record from a decoded JSON value, filling gaps with neutral defaults
pub fn record_from_value(value: &Value) -> Result<ClassificationResult, ParseError> {
    let object = match value {
        Value::Object(map) => map,
        Value::Array(_) => return Err(ParseError::NotAnObject("array")),
        Value::String(_) => return Err(ParseError::NotAnObject("string")),
        Value::Number(_) => return Err(ParseError::NotAnObject("number")),
        Value::Bool(_) => return Err(ParseError::NotAnObject("bool")),
        Value::Null => return Err(ParseError::NotAnObject("null")),
    };

    let text_field = |key: &str| -> Option<String> {
        match object.get(key) {
            Some(Value::String(s)) if !s.trim().is_empty() => Some(s.trim().to_string()),
            Some(Value::Number(n)) => Some(n.to_string()),
            _ => None,
        }
    };

    Ok(ClassificationResult {
        doc_date: text_field("doc_date"),
        entity: text_field("entity").unwrap_or_else(|| "Unknown".to_string()),
        category: text_field("category").unwrap_or_else(|| UNCATEGORIZED_CATEGORY.to_string()),
        summary: text_field("summary").unwrap_or_else(|| "Doc".to_string()),
        confidence: text_field("confidence")
            .map(|c| Confidence::parse(&c))
            .unwrap_or(Confidence::Low),
    })
}
