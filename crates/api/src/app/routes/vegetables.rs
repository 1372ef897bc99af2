//! Vegetable inventory. These routes are open; no token is checked.

use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Extension, Path},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{delete, get, post, put},
    Json, Router,
};
use serde_json::{json, Value};

use greengrocer_core::ItemId;
use greengrocer_infra::{Filter, FindOptions, Stored};
use greengrocer_inventory::{Vegetable, validate_vegetable};

use crate::app::batch::{self, BatchLabels, BatchReport};
use crate::app::errors::ApiError;
use crate::app::services::AppServices;

pub fn router() -> Router {
    Router::new()
        .route("/allItems", get(all_items))
        .route("/create", post(create_vegetable))
        .route("/createMany", post(create_many))
        .route("/update/:id", put(update_vegetable))
        .route("/delete/:id", delete(delete_vegetable))
}

const LABELS: BatchLabels = BatchLabels {
    record: "veg",
    inserted: "vegArray",
    created: "Vegetable created successfully",
    nothing_new: "Vegetable already exists!",
};

fn parse_id(raw: &str) -> Result<ItemId, ApiError> {
    raw.parse().map_err(|_| ApiError::bad_request("Invalid item id"))
}

/// Matches stored items equal to `veg` on every field.
fn same_item(veg: &Vegetable) -> Filter {
    Filter::Eq(vec![
        ("name", json!(veg.name)),
        ("color", json!(veg.color.as_str())),
        ("price", json!(veg.price)),
    ])
}

pub async fn all_items(
    Extension(services): Extension<Arc<AppServices>>,
) -> Result<Json<Vec<Stored<Vegetable>>>, ApiError> {
    let items = services
        .vegetables
        .find(&FindOptions::default())
        .await
        .map_err(ApiError::store("Error fetching vegetables data"))?;
    Ok(Json(items))
}

pub async fn create_vegetable(
    Extension(services): Extension<Arc<AppServices>>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<Response, ApiError> {
    let Json(body) = body?;
    let veg = validate_vegetable(&body)?;

    let saved = services
        .vegetables
        .insert_one(veg)
        .await
        .map_err(ApiError::store("Error inserting vegetables data"))?;

    tracing::info!(item_id = %saved.id, name = %saved.document.name, "vegetable created");
    Ok((
        StatusCode::CREATED,
        Json(json!({ "message": "Vegetable data created successfully", "savedVegetable": saved })),
    )
        .into_response())
}

pub async fn create_many(
    Extension(services): Extension<Arc<AppServices>>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<Response, ApiError> {
    let Json(body) = body?;
    let records = batch::records(body)?;
    let mut report = BatchReport::new(LABELS, records.len());
    let mut fresh: Vec<Vegetable> = Vec::new();

    for record in records {
        let veg = match validate_vegetable(&record) {
            Ok(veg) => veg,
            Err(errors) => {
                report.reject(record, errors);
                continue;
            }
        };

        if fresh.iter().any(|f| f.is_duplicate_of(&veg)) {
            report.skip(record, batch::REPEATED_IN_BATCH);
            continue;
        }
        let existing = services
            .vegetables
            .find_one(&same_item(&veg))
            .await
            .map_err(ApiError::store("Error inserting vegetables data"))?;
        if existing.is_some() {
            report.skip(record, batch::ALREADY_STORED);
        } else {
            fresh.push(veg);
        }
    }

    if let Err(resp) = report.ensure_some_valid() {
        return Ok(resp);
    }
    if fresh.is_empty() {
        return Ok(report.nothing_new());
    }

    let inserted = services
        .vegetables
        .insert_many(fresh)
        .await
        .map_err(ApiError::store("Error inserting vegetables data"))?;

    tracing::info!(
        inserted = inserted.len(),
        rejected = report.rejected(),
        skipped = report.skipped(),
        "vegetable batch processed"
    );
    Ok(report.created(inserted))
}

pub async fn update_vegetable(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<Response, ApiError> {
    let Json(body) = body?;
    let veg = validate_vegetable(&body)?;
    let id = parse_id(&id)?;

    // Every field is required, so the validated payload replaces the item.
    let updated = services
        .vegetables
        .update_by_id(id, veg)
        .await
        .map_err(ApiError::store("Error updating vegetables data"))?
        .ok_or_else(|| ApiError::not_found("Item not found"))?;

    Ok((
        StatusCode::CREATED,
        Json(json!({ "message": "Vegetable updated successfully", "updatedVegetable": updated })),
    )
        .into_response())
}

pub async fn delete_vegetable(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> Result<Response, ApiError> {
    let id = parse_id(&id)?;
    let removed = services
        .vegetables
        .delete_by_id(id)
        .await
        .map_err(ApiError::store("Error deleting vegetables data"))?
        .ok_or_else(|| ApiError::not_found("Vegetable not found"))?;

    tracing::info!(item_id = %id, "vegetable deleted");
    Ok((
        StatusCode::CREATED,
        Json(json!({ "message": "Vegetable deleted successfully", "vegetableByIdDel": removed })),
    )
        .into_response())
}

#[cfg(test)]
mod tests {
    use super::*;
    use greengrocer_inventory::HexColor;

    #[test]
    fn same_item_filter_matches_float_price_of_stored_document() {
        let veg = Vegetable {
            name: "Leek".into(),
            color: HexColor::parse("#0f0").unwrap(),
            price: 3.0,
        };
        let stored = serde_json::to_value(&veg).unwrap();
        assert!(same_item(&veg).matches(&stored));

        let dearer = json!({ "name": "Leek", "color": "#0f0", "price": 3.5 });
        assert!(!same_item(&veg).matches(&dearer));
    }

    #[test]
    fn malformed_item_id_is_bad_request() {
        let err = parse_id("not-a-uuid").unwrap_err();
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
        assert_eq!(err.to_string(), "Invalid item id");
    }
}
