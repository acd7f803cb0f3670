//! Field extraction from untyped API documents.
//!
//! StackExchange items arrive as loosely shaped JSON objects, so each field
//! is pulled out under an explicit policy: required fields error when absent
//! or null, optional fields fall back to a caller-chosen default, and a
//! present field of the wrong shape is always an error.

use chrono::{DateTime, Utc};
use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("MissingField: {field}")]
    MissingField { field: &'static str },

    #[error("WrongType: {field} is not a {expected}")]
    WrongType {
        field: &'static str,
        expected: &'static str,
    },

    #[error("InvalidTimestamp: {field} = {value}")]
    InvalidTimestamp { field: &'static str, value: i64 },
}

/// Text that must be present and non-null.
pub fn required_text(item: &Value, field: &'static str) -> Result<String, ExtractError> {
    match item.get(field) {
        None | Some(Value::Null) => Err(ExtractError::MissingField { field }),
        Some(Value::String(text)) => Ok(text.clone()),
        Some(_) => Err(ExtractError::WrongType {
            field,
            expected: "string",
        }),
    }
}

/// Text with a fallback: absent or null yields `default`.
pub fn text_or(item: &Value, field: &'static str, default: &str) -> Result<String, ExtractError> {
    match item.get(field) {
        None | Some(Value::Null) => Ok(default.to_string()),
        Some(Value::String(text)) => Ok(text.clone()),
        Some(_) => Err(ExtractError::WrongType {
            field,
            expected: "string",
        }),
    }
}

/// Optional seconds-since-epoch field; absent or null means the event never
/// happened, so the caller gets `None` rather than a zero-value timestamp.
pub fn epoch_seconds(
    item: &Value,
    field: &'static str,
) -> Result<Option<DateTime<Utc>>, ExtractError> {
    let value = match item.get(field) {
        None | Some(Value::Null) => return Ok(None),
        Some(value) => value,
    };

    let seconds = value.as_i64().ok_or(ExtractError::WrongType {
        field,
        expected: "integer",
    })?;
    let timestamp = DateTime::from_timestamp(seconds, 0)
        .ok_or(ExtractError::InvalidTimestamp { field, value: seconds })?;

    Ok(Some(timestamp))
}

/// A sequence that must be present, such as the `items` array of a response
/// document.
pub fn required_sequence<'a>(
    item: &'a Value,
    field: &'static str,
) -> Result<&'a Vec<Value>, ExtractError> {
    match item.get(field) {
        None | Some(Value::Null) => Err(ExtractError::MissingField { field }),
        Some(Value::Array(values)) => Ok(values),
        Some(_) => Err(ExtractError::WrongType {
            field,
            expected: "array",
        }),
    }
}

/// A sequence that may be absent, such as the nested `answers` list.
pub fn optional_sequence<'a>(
    item: &'a Value,
    field: &'static str,
) -> Result<Option<&'a Vec<Value>>, ExtractError> {
    match item.get(field) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Array(values)) => Ok(Some(values)),
        Some(_) => Err(ExtractError::WrongType {
            field,
            expected: "array",
        }),
    }
}
