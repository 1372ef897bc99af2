//! User management. Every route here sits behind the Admin role gate.

use std::sync::Arc;

use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Extension, Path, Query,
    },
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{delete, get, post, put},
    Json, Router,
};
use serde_json::{json, Value};

use greengrocer_auth::{NewUser, UserAccount, validate_new_user, validate_user_update};
use greengrocer_core::UserId;
use greengrocer_infra::{Filter, FindOptions, Page, Sort};

use crate::app::batch::{self, BatchLabels, BatchReport};
use crate::app::dto::{self, ListQuery, PageResponse, UserView};
use crate::app::errors::ApiError;
use crate::app::listing;
use crate::app::services::AppServices;
use crate::context::PrincipalContext;

pub fn router() -> Router {
    Router::new()
        .route("/userList", get(user_list))
        .route("/create", post(create_user))
        .route("/createMany", post(create_many))
        .route("/update/:id", put(update_user))
        .route("/delete/:id", delete(delete_user))
        .route("/sortAndPagination", get(sort_and_pagination))
        .route("/searchAndPagination", get(search_and_pagination))
        .route("/sortSearchPagination", get(sort_search_pagination))
}

const EMAIL_EXISTS: &str = "Email already exists";

const LABELS: BatchLabels = BatchLabels {
    record: "user",
    inserted: "userArray",
    created: "Users created successfully",
    nothing_new: "Users already exists!",
};

fn parse_id(raw: &str) -> Result<UserId, ApiError> {
    raw.parse().map_err(|_| ApiError::bad_request("Invalid user id"))
}

fn by_email(email: &str) -> Filter {
    Filter::eq("email", email)
}

pub async fn user_list(Extension(services): Extension<Arc<AppServices>>) -> Result<Json<Vec<UserView>>, ApiError> {
    let users = services
        .users
        .find(&FindOptions::default())
        .await
        .map_err(ApiError::store("Error fetching users list"))?;
    Ok(Json(dto::user_views(users)))
}

pub async fn create_user(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<Response, ApiError> {
    let Json(body) = body?;
    let new_user = validate_new_user(&body, &services.free_domains)?;

    let existing = services
        .users
        .find_one(&by_email(new_user.email.as_str()))
        .await
        .map_err(ApiError::store("Error inserting user data"))?;
    if existing.is_some() {
        return Err(ApiError::bad_request(EMAIL_EXISTS));
    }

    let hash = services.hash_password(new_user.password.clone()).await?;
    let saved = match services.users.insert_one(UserAccount::from_new(new_user, hash)).await {
        Ok(saved) => saved,
        Err(e) if e.is_duplicate() => return Err(ApiError::bad_request(EMAIL_EXISTS)),
        Err(e) => return Err(ApiError::store("Error inserting user data")(e)),
    };

    tracing::info!(user_id = %saved.id, by = %principal.user_id(), by_role = %principal.role(), "user created");
    Ok((
        StatusCode::CREATED,
        Json(json!({ "message": "User created successfully", "savedUser": UserView::from(saved) })),
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
    let mut fresh: Vec<NewUser> = Vec::new();

    for record in records {
        let user = match validate_new_user(&record, &services.free_domains) {
            Ok(user) => user,
            Err(errors) => {
                report.reject(record, errors);
                continue;
            }
        };

        if fresh.iter().any(|f| f.email == user.email) {
            report.skip(record, batch::REPEATED_IN_BATCH);
            continue;
        }
        let existing = services
            .users
            .find_one(&by_email(user.email.as_str()))
            .await
            .map_err(ApiError::store("Error inserting users"))?;
        if existing.is_some() {
            report.skip(record, batch::ALREADY_STORED);
        } else {
            fresh.push(user);
        }
    }

    if let Err(resp) = report.ensure_some_valid() {
        return Ok(resp);
    }
    if fresh.is_empty() {
        return Ok(report.nothing_new());
    }

    let mut accounts = Vec::with_capacity(fresh.len());
    for user in fresh {
        let hash = services.hash_password(user.password.clone()).await?;
        accounts.push(UserAccount::from_new(user, hash));
    }

    let inserted = services
        .users
        .insert_many(accounts)
        .await
        .map_err(ApiError::store("Error inserting users"))?;

    tracing::info!(
        inserted = inserted.len(),
        rejected = report.rejected(),
        skipped = report.skipped(),
        "user batch processed"
    );
    Ok(report.created(dto::user_views(inserted)))
}

pub async fn update_user(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<Response, ApiError> {
    let Json(body) = body?;
    let update = validate_user_update(&body, &services.free_domains)?;
    let id = parse_id(&id)?;

    let Some(stored) = services
        .users
        .get(id)
        .await
        .map_err(ApiError::store("Error updating user data"))?
    else {
        return Err(ApiError::not_found("User not found"));
    };

    let owner = services
        .users
        .find_one(&by_email(update.email.as_str()))
        .await
        .map_err(ApiError::store("Error updating user data"))?;
    if owner.is_some_and(|o| o.id != id) {
        return Err(ApiError::bad_request(EMAIL_EXISTS));
    }

    let new_hash = match &update.password {
        Some(password) => Some(services.hash_password(password.clone()).await?),
        None => None,
    };
    let mut account = stored.document;
    account.apply_update(update, new_hash);

    let updated = match services.users.update_by_id(id, account).await {
        Ok(Some(updated)) => updated,
        Ok(None) => return Err(ApiError::not_found("User not found")),
        Err(e) if e.is_duplicate() => return Err(ApiError::bad_request(EMAIL_EXISTS)),
        Err(e) => return Err(ApiError::store("Error updating user data")(e)),
    };

    Ok((
        StatusCode::CREATED,
        Json(json!({ "message": "User data updated successfully", "updatedUser": UserView::from(updated) })),
    )
        .into_response())
}

pub async fn delete_user(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
) -> Result<Response, ApiError> {
    let id = parse_id(&id)?;
    let removed = services
        .users
        .delete_by_id(id)
        .await
        .map_err(ApiError::store("Error deleting user data"))?;
    if removed.is_none() {
        return Err(ApiError::not_found("User not found"));
    }

    tracing::info!(user_id = %id, by = %principal.user_id(), by_role = %principal.role(), "user deleted");
    Ok((StatusCode::CREATED, Json(json!({ "message": "User deleted successfully" }))).into_response())
}

async fn fetch_page(
    services: &AppServices,
    filter: Filter,
    sort: Option<Sort>,
    page: Page,
    context: &'static str,
) -> Result<Json<PageResponse<UserView>>, ApiError> {
    let total = services.users.count(&filter).await.map_err(ApiError::store(context))?;
    let users = services
        .users
        .find(&FindOptions::filter(filter).sorted(sort).page(page))
        .await
        .map_err(ApiError::store(context))?;

    Ok(Json(PageResponse {
        page: page.page,
        limit: page.limit,
        total,
        total_pages: page.total_pages(total),
        data: dto::user_views(users),
    }))
}

/// Sorted page of all users; an unknown `sortBy` is a client error.
pub async fn sort_and_pagination(
    Extension(services): Extension<Arc<AppServices>>,
    query: Result<Query<ListQuery>, QueryRejection>,
) -> Result<Json<PageResponse<UserView>>, ApiError> {
    let Query(query) = query?;
    let page = listing::page(&query)?;
    let sort = listing::user_sort(&query).ok_or_else(|| ApiError::bad_request("Invalid sortBy field"))?;
    fetch_page(&services, Filter::All, Some(sort), page, "Error fetching users").await
}

/// Unsorted page of users matching `search`.
pub async fn search_and_pagination(
    Extension(services): Extension<Arc<AppServices>>,
    query: Result<Query<ListQuery>, QueryRejection>,
) -> Result<Json<PageResponse<UserView>>, ApiError> {
    let Query(query) = query?;
    let page = listing::page(&query)?;
    let filter = listing::user_search(listing::search_text(&query));
    fetch_page(&services, filter, None, page, "Error searching users").await
}

/// Search plus sort. Unlike `sort_and_pagination`, an unusable sort is
/// dropped rather than rejected.
pub async fn sort_search_pagination(
    Extension(services): Extension<Arc<AppServices>>,
    query: Result<Query<ListQuery>, QueryRejection>,
) -> Result<Json<PageResponse<UserView>>, ApiError> {
    let Query(query) = query?;
    let page = listing::page(&query)?;
    let search = listing::search_text(&query);

    let sort = match listing::user_sort(&query) {
        Some(sort) if search != "profilePicture" => Some(sort),
        _ => {
            tracing::warn!(sort_by = ?query.sort_by, search, "invalid sortBy field or search field; sort dropped");
            None
        }
    };

    fetch_page(&services, listing::user_search(search), sort, page, "Error fetching users").await
}
