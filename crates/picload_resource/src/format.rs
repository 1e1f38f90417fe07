//! Supported image format predicate.
//!
//! A source is supported when it ends, case-insensitively, in one of
//! [`SUPPORTED_EXTENSIONS`] and has at least one character before the
//! extension. Matching runs on the whole source string, so a query string
//! after the extension makes the source unsupported.

use serde_json::Value;

use crate::error::FormatError;

/// Extensions accepted by [`supported_format`], including the leading dot.
pub const SUPPORTED_EXTENSIONS: [&str; 4] = [".gif", ".png", ".jpg", ".jpeg"];

/// Returns `true` if `source` names a supported image format.
#[must_use]
pub fn supported_format(source: &str) -> bool {
    SUPPORTED_EXTENSIONS.iter().any(|ext| {
        let Some(split) = source.len().checked_sub(ext.len()) else {
            return false;
        };
        split > 0
            && source.is_char_boundary(split)
            && source[split..].eq_ignore_ascii_case(ext)
    })
}

/// Checks a dynamically typed value against the format predicate.
///
/// # Errors
///
/// Returns [`FormatError::NotAString`] when `value` is not a JSON string.
pub fn check_format(value: &Value) -> Result<bool, FormatError> {
    match value {
        Value::String(source) => Ok(supported_format(source)),
        other => Err(FormatError::NotAString {
            found: json_type_name(other),
        }),
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
