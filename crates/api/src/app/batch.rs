//! Bookkeeping for the `createMany` endpoints.
//!
//! Every submitted record ends up in exactly one bucket: inserted, rejected
//! (failed validation) or skipped (duplicate of a stored record or of an
//! earlier record in the same batch).

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use serde_json::{Map, Value, json};

use greengrocer_core::FieldErrors;

use crate::app::errors::ApiError;

pub const ALREADY_STORED: &str = "already exists";
pub const REPEATED_IN_BATCH: &str = "duplicate within batch";

/// Unpack the request body as a non-empty array of candidate records.
pub fn records(body: Value) -> Result<Vec<Value>, ApiError> {
    match body {
        Value::Array(records) if !records.is_empty() => Ok(records),
        _ => Err(ApiError::message(StatusCode::BAD_REQUEST, "No data received")),
    }
}

/// Messages and field names used by one batch endpoint.
#[derive(Debug, Clone, Copy)]
pub struct BatchLabels {
    /// Key holding the original record in `errors`/`skipped` entries.
    pub record: &'static str,
    /// Key holding the inserted records on success.
    pub inserted: &'static str,
    pub created: &'static str,
    pub nothing_new: &'static str,
}

#[derive(Debug)]
pub struct BatchReport {
    labels: BatchLabels,
    submitted: usize,
    errors: Vec<Value>,
    skipped: Vec<Value>,
}

impl BatchReport {
    pub fn new(labels: BatchLabels, submitted: usize) -> Self {
        Self {
            labels,
            submitted,
            errors: Vec::new(),
            skipped: Vec::new(),
        }
    }

    pub fn reject(&mut self, record: Value, errors: FieldErrors) {
        let mut entry = Map::new();
        entry.insert(self.labels.record.to_string(), record);
        entry.insert("errors".to_string(), json!(errors.messages()));
        self.errors.push(Value::Object(entry));
    }

    pub fn skip(&mut self, record: Value, reason: &str) {
        let mut entry = Map::new();
        entry.insert(self.labels.record.to_string(), record);
        entry.insert("reason".to_string(), json!(reason));
        self.skipped.push(Value::Object(entry));
    }

    pub fn rejected(&self) -> usize {
        self.errors.len()
    }

    pub fn skipped(&self) -> usize {
        self.skipped.len()
    }

    /// 400 when not a single record passed validation.
    pub fn ensure_some_valid(&self) -> Result<(), Response> {
        if !self.errors.is_empty() && self.errors.len() == self.submitted {
            return Err((
                StatusCode::BAD_REQUEST,
                Json(json!({ "message": "Error in data received", "errors": self.errors })),
            )
                .into_response());
        }
        Ok(())
    }

    /// 201 response when nothing needed inserting.
    pub fn nothing_new(self) -> Response {
        (
            StatusCode::CREATED,
            Json(json!({
                "message": self.labels.nothing_new,
                "errors": self.errors,
                "skipped": self.skipped,
            })),
        )
            .into_response()
    }

    /// 201 response listing what was inserted.
    pub fn created<T: Serialize>(self, inserted: Vec<T>) -> Response {
        let mut body = Map::new();
        body.insert("message".to_string(), json!(self.labels.created));
        body.insert(self.labels.inserted.to_string(), json!(inserted));
        body.insert("errors".to_string(), Value::Array(self.errors));
        body.insert("skipped".to_string(), Value::Array(self.skipped));
        (StatusCode::CREATED, Json(Value::Object(body))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const LABELS: BatchLabels = BatchLabels {
        record: "veg",
        inserted: "vegArray",
        created: "Vegetable created successfully",
        nothing_new: "Vegetable already exists!",
    };

    fn field_errors(msg: &str) -> FieldErrors {
        let mut e = FieldErrors::new();
        e.push("name", msg);
        e
    }

    #[test]
    fn non_array_or_empty_body_is_no_data() {
        for body in [json!([]), json!({}), json!("x"), Value::Null] {
            let err = records(body).unwrap_err();
            assert_eq!(err.to_string(), "No data received");
            assert_eq!(err.status(), StatusCode::BAD_REQUEST);
        }
        assert_eq!(records(json!([1, 2])).unwrap().len(), 2);
    }

    #[test]
    fn all_rejected_is_400() {
        let mut report = BatchReport::new(LABELS, 2);
        report.reject(json!({}), field_errors("name is required"));
        assert!(report.ensure_some_valid().is_ok());
        report.reject(json!({}), field_errors("name is required"));
        let resp = report.ensure_some_valid().unwrap_err();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn skipped_records_do_not_count_as_rejected() {
        let mut report = BatchReport::new(LABELS, 2);
        report.skip(json!({ "name": "Leek" }), ALREADY_STORED);
        report.reject(json!({}), field_errors("name is required"));
        assert!(report.ensure_some_valid().is_ok());
        assert_eq!((report.rejected(), report.skipped()), (1, 1));
    }
}
