//! Query-string handling for the paginated user listings.

use greengrocer_infra::{Filter, Page, Sort, SortOrder};

use crate::app::dto::ListQuery;
use crate::app::errors::ApiError;

pub const SORTABLE_USER_FIELDS: &[&str] = &["firstName", "lastName", "email", "userType"];
pub const SEARCHABLE_USER_FIELDS: &[&str] = &["firstName", "lastName", "email", "userType"];

const DEFAULT_SORT_FIELD: &str = "firstName";

/// Page request from `page`/`limit` (defaults 1 and 10).
pub fn page(query: &ListQuery) -> Result<Page, ApiError> {
    let defaults = Page::default();
    let parse = |raw: &Option<String>, default: u64| match raw.as_deref().map(str::trim) {
        None | Some("") => Some(default),
        Some(v) => v.parse::<u64>().ok(),
    };

    parse(&query.page, defaults.page)
        .zip(parse(&query.limit, defaults.limit))
        .and_then(|(page, limit)| Page::new(page, limit))
        .ok_or_else(|| ApiError::bad_request("Invalid pagination parameters"))
}

/// Requested sort, or `None` when `sortBy` is not an allowed field.
pub fn user_sort(query: &ListQuery) -> Option<Sort> {
    let requested = query.sort_by.as_deref().unwrap_or(DEFAULT_SORT_FIELD);
    let field = SORTABLE_USER_FIELDS.iter().find(|f| **f == requested).copied()?;
    Some(Sort {
        field,
        order: SortOrder::parse(query.sort_order.as_deref().unwrap_or("asc")),
    })
}

pub fn search_text(query: &ListQuery) -> &str {
    query.search.as_deref().unwrap_or("")
}

/// Case-insensitive substring search over the user text fields. An empty
/// search selects everything.
pub fn user_search(search: &str) -> Filter {
    if search.is_empty() {
        Filter::All
    } else {
        Filter::Contains {
            fields: SEARCHABLE_USER_FIELDS,
            needle: search.to_string(),
        }
    }
}
