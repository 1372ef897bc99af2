use serde::{Deserialize, Serialize};

use greengrocer_auth::{Role, UserAccount};
use greengrocer_core::UserId;
use greengrocer_infra::Stored;

// -------------------------
// Request DTOs
// -------------------------

/// Query string of the paginated user listings. Everything is kept as raw
/// text so malformed numbers are reported by the handler, not the extractor.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListQuery {
    pub page: Option<String>,
    pub limit: Option<String>,
    pub sort_by: Option<String>,
    pub sort_order: Option<String>,
    pub search: Option<String>,
}

// -------------------------
// Response DTOs
// -------------------------

/// Public projection of a stored user: never carries the password digest.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserView {
    #[serde(rename = "_id")]
    pub id: UserId,
    pub first_name: String,
    pub last_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub profile_picture: Option<String>,
    pub user_type: Role,
    pub email: String,
}

impl From<Stored<UserAccount>> for UserView {
    fn from(stored: Stored<UserAccount>) -> Self {
        let user = stored.document;
        Self {
            id: stored.id,
            first_name: user.first_name,
            last_name: user.last_name,
            profile_picture: user.profile_picture,
            user_type: user.user_type,
            email: user.email,
        }
    }
}

pub fn user_views(stored: Vec<Stored<UserAccount>>) -> Vec<UserView> {
    stored.into_iter().map(UserView::from).collect()
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageResponse<T> {
    pub page: u64,
    pub limit: u64,
    pub total: u64,
    pub total_pages: u64,
    pub data: Vec<T>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_view_drops_the_digest() {
        let stored = Stored::new(
            UserId::new(),
            UserAccount {
                first_name: "Jane".into(),
                last_name: "Doe".into(),
                profile_picture: None,
                user_type: Role::Admin,
                email: "jane@acme.com".into(),
                password_hash: "$argon2id$secret".into(),
            },
        );
        let v = serde_json::to_value(UserView::from(stored)).unwrap();
        assert!(v.get("password").is_none());
        assert!(v.get("_id").is_some());
        assert_eq!(v["userType"], "Admin");
    }

    #[test]
    fn page_response_uses_camel_case() {
        let page = PageResponse::<u8> {
            page: 2,
            limit: 5,
            total: 12,
            total_pages: 3,
            data: vec![],
        };
        let v = serde_json::to_value(page).unwrap();
        assert_eq!(v["totalPages"], 3);
    }
}
