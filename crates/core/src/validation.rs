//! Field-level validation toolkit.
//!
//! Validators in this workspace are pure functions of the shape
//! `fn(&serde_json::Value) -> Result<Normalized, FieldErrors>`. Malformed input
//! is the expected failure mode, so nothing here panics or short-circuits on
//! the first problem: every rule is checked and reported in schema order.

use serde::Serialize;
use serde_json::{Map, Value};

/// A single failed rule on a single field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

/// Ordered list of field errors for one candidate record.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FieldErrors(Vec<FieldError>);

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.0.push(FieldError {
            field: field.into(),
            message: message.into(),
        });
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Message of the first failed rule (what single-record endpoints report).
    pub fn first_message(&self) -> Option<&str> {
        self.0.first().map(|e| e.message.as_str())
    }

    pub fn messages(&self) -> Vec<String> {
        self.0.iter().map(|e| e.message.clone()).collect()
    }

    pub fn has_field(&self, field: &str) -> bool {
        self.0.iter().any(|e| e.field == field)
    }
}

impl core::fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let mut first = true;
        for e in &self.0 {
            if !first {
                f.write_str("; ")?;
            }
            f.write_str(&e.message)?;
            first = false;
        }
        Ok(())
    }
}

/// Raw shape of a field in a candidate object.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FieldValue<'a> {
    Missing,
    Text(&'a str),
    /// Present but not a string (including `null`).
    Other(&'a Value),
}

pub fn field<'a>(obj: &'a Map<String, Value>, key: &str) -> FieldValue<'a> {
    match obj.get(key) {
        None => FieldValue::Missing,
        Some(Value::String(s)) => FieldValue::Text(s.as_str()),
        Some(other) => FieldValue::Other(other),
    }
}

/// Messages for a required, non-empty text field.
#[derive(Debug, Clone, Copy)]
pub struct TextMessages {
    /// Value is present but not text.
    pub base: &'static str,
    /// Value is text but blank.
    pub empty: &'static str,
    /// Value is absent.
    pub required: &'static str,
}

/// Read a required text field, trimming it. Records a failure and returns
/// `None` when the rule does not hold.
pub fn required_text(
    obj: &Map<String, Value>,
    key: &str,
    messages: &TextMessages,
    errors: &mut FieldErrors,
) -> Option<String> {
    match field(obj, key) {
        FieldValue::Missing => {
            errors.push(key, messages.required);
            None
        }
        FieldValue::Other(_) => {
            errors.push(key, messages.base);
            None
        }
        FieldValue::Text(s) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                errors.push(key, messages.empty);
                None
            } else {
                Some(trimmed.to_string())
            }
        }
    }
}

/// Record a `"<key>" is not allowed` failure for every key outside `allowed`.
pub fn reject_unknown_keys(obj: &Map<String, Value>, allowed: &[&str], errors: &mut FieldErrors) {
    for key in obj.keys() {
        if !allowed.contains(&key.as_str()) {
            errors.push(key.as_str(), format!("\"{key}\" is not allowed"));
        }
    }
}

/// Borrow the candidate as a JSON object, or fail with a single error.
pub fn as_object(value: &Value) -> Result<&Map<String, Value>, FieldErrors> {
    match value {
        Value::Object(map) => Ok(map),
        _ => {
            let mut errors = FieldErrors::new();
            errors.push("value", "\"value\" must be of type object");
            Err(errors)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const NAME: TextMessages = TextMessages {
        base: "name should be a type of text",
        empty: "name cannot be empty",
        required: "name is required",
    };

    #[test]
    fn required_text_distinguishes_missing_blank_and_wrong_type() {
        let candidate = json!({ "a": "  ", "b": 42, "c": null });
        let obj = candidate.as_object().unwrap();
        let mut errors = FieldErrors::new();

        assert_eq!(required_text(obj, "a", &NAME, &mut errors), None);
        assert_eq!(required_text(obj, "b", &NAME, &mut errors), None);
        assert_eq!(required_text(obj, "c", &NAME, &mut errors), None);
        assert_eq!(required_text(obj, "d", &NAME, &mut errors), None);

        assert_eq!(
            errors.messages(),
            vec![
                "name cannot be empty",
                "name should be a type of text",
                "name should be a type of text",
                "name is required",
            ]
        );
    }

    #[test]
    fn required_text_trims() {
        let candidate = json!({ "a": "  Carrot " });
        let mut errors = FieldErrors::new();
        let v = required_text(candidate.as_object().unwrap(), "a", &NAME, &mut errors);
        assert_eq!(v.as_deref(), Some("Carrot"));
        assert!(errors.is_empty());
    }

    #[test]
    fn unknown_keys_are_reported_by_name() {
        let candidate = json!({ "name": "x", "_id": "abc" });
        let mut errors = FieldErrors::new();
        reject_unknown_keys(candidate.as_object().unwrap(), &["name"], &mut errors);
        assert_eq!(errors.first_message(), Some("\"_id\" is not allowed"));
    }

    #[test]
    fn non_object_candidate_is_a_single_error() {
        let errors = as_object(&json!([1, 2])).unwrap_err();
        assert_eq!(errors.len(), 1);
    }
}
