//! Collection bindings for the domain records.

use greengrocer_auth::UserAccount;
use greengrocer_core::{ItemId, UserId};
use greengrocer_inventory::Vegetable;

use crate::store::Document;

impl Document for UserAccount {
    type Id = UserId;
    const COLLECTION: &'static str = "users";
    const UNIQUE_FIELDS: &'static [&'static str] = &["email"];
}

impl Document for Vegetable {
    type Id = ItemId;
    const COLLECTION: &'static str = "vegetables";
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{DocumentStore, Filter, InMemoryDocumentStore};
    use greengrocer_auth::Role;

    fn account(email: &str) -> UserAccount {
        UserAccount {
            first_name: "Jane".into(),
            last_name: "Doe".into(),
            profile_picture: None,
            user_type: Role::Manager,
            email: email.into(),
            password_hash: "$argon2id$digest".into(),
        }
    }

    #[tokio::test]
    async fn user_email_is_unique() {
        let store = InMemoryDocumentStore::<UserAccount>::new();
        store.insert_one(account("jane@acme.com")).await.unwrap();
        let err = store.insert_one(account("jane@acme.com")).await.unwrap_err();
        assert!(err.is_duplicate());
    }

    #[tokio::test]
    async fn users_are_found_by_email() {
        let store = InMemoryDocumentStore::<UserAccount>::new();
        let saved = store.insert_one(account("jane@acme.com")).await.unwrap();
        let found = store
            .find_one(&Filter::eq("email", "jane@acme.com"))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(found.id, saved.id);
    }
}
