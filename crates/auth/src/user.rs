//! User account model and its validation rules.
//!
//! Validation is a pure function of the submitted JSON and the free-email
//! domain set. It never hashes anything: the plain password of a validated
//! [`NewUser`] is handed to [`crate::PasswordHasher`] by the caller, and only
//! the digest ends up on a stored [`UserAccount`].

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use url::Url;

use greengrocer_core::validation::{self, FieldValue, TextMessages};
use greengrocer_core::FieldErrors;

use crate::{FreeEmailDomains, Role, WorkEmail};

// ─────────────────────────────────────────────────────────────────────────────
// Model
// ─────────────────────────────────────────────────────────────────────────────

/// Stored user account document.
///
/// `password` holds the Argon2 digest, never the plain secret. This type is
/// the storage shape; HTTP responses use a projection without the digest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserAccount {
    pub first_name: String,
    pub last_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile_picture: Option<String>,
    pub user_type: Role,
    pub email: String,
    #[serde(rename = "password")]
    pub password_hash: String,
}

impl UserAccount {
    pub fn from_new(user: NewUser, password_hash: String) -> Self {
        Self {
            first_name: user.first_name,
            last_name: user.last_name,
            profile_picture: user.profile_picture,
            user_type: user.user_type,
            email: user.email.into_inner(),
            password_hash,
        }
    }

    /// Field-by-field merge of a validated update.
    ///
    /// `new_password_hash` is only `Some` when the update carried a password;
    /// otherwise the stored digest is kept as is.
    pub fn apply_update(&mut self, update: UserUpdate, new_password_hash: Option<String>) {
        self.first_name = update.first_name;
        self.last_name = update.last_name;
        if update.profile_picture.is_some() {
            self.profile_picture = update.profile_picture;
        }
        self.user_type = update.user_type;
        self.email = update.email.into_inner();
        if let Some(hash) = new_password_hash {
            self.password_hash = hash;
        }
    }
}

/// A validated account creation request (plain password, not yet hashed).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewUser {
    pub first_name: String,
    pub last_name: String,
    pub profile_picture: Option<String>,
    pub user_type: Role,
    pub email: WorkEmail,
    pub password: String,
}

/// A validated account update; the password is optional.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserUpdate {
    pub first_name: String,
    pub last_name: String,
    pub profile_picture: Option<String>,
    pub user_type: Role,
    pub email: WorkEmail,
    pub password: Option<String>,
}

// ─────────────────────────────────────────────────────────────────────────────
// Validation
// ─────────────────────────────────────────────────────────────────────────────

const FIELDS: [&str; 6] = [
    "firstName",
    "lastName",
    "profilePicture",
    "userType",
    "email",
    "password",
];

const FIRST_NAME: TextMessages = TextMessages {
    base: "First name should be a type of text",
    empty: "First name cannot be empty",
    required: "First name is required",
};

const LAST_NAME: TextMessages = TextMessages {
    base: "Last name should be a type of text",
    empty: "Last name cannot be empty",
    required: "Last name is required",
};

pub const PASSWORD_MIN_LENGTH: usize = 8;
pub const PASSWORD_TOO_SHORT: &str = "Password should have a minimum length of 8";
pub const PASSWORD_TOO_WEAK: &str = "Passwords should be a minimum of 8 letters with a combination of at least one number, one special character, and one Capital letter.";

/// Each pattern must match independently.
static PASSWORD_RULES: LazyLock<[Regex; 4]> = LazyLock::new(|| {
    [
        r"[0-9]",
        r#"[!@#$%^&*(),.?":{}|<>]"#,
        r"[A-Z]",
        r"[a-z]",
    ]
    .map(|p| Regex::new(p).expect("password pattern is valid"))
});

/// Validate a signup / admin-create payload.
pub fn validate_new_user(candidate: &Value, free_domains: &FreeEmailDomains) -> Result<NewUser, FieldErrors> {
    let fields = validate_fields(candidate, free_domains, true)?;
    match fields.password {
        Some(password) => Ok(NewUser {
            first_name: fields.first_name,
            last_name: fields.last_name,
            profile_picture: fields.profile_picture,
            user_type: fields.user_type,
            email: fields.email,
            password,
        }),
        None => {
            let mut errors = FieldErrors::new();
            errors.push("password", "Password is required");
            Err(errors)
        }
    }
}

/// Validate an admin update payload. Same rules as creation, except the
/// password may be omitted.
pub fn validate_user_update(candidate: &Value, free_domains: &FreeEmailDomains) -> Result<UserUpdate, FieldErrors> {
    let fields = validate_fields(candidate, free_domains, false)?;
    Ok(UserUpdate {
        first_name: fields.first_name,
        last_name: fields.last_name,
        profile_picture: fields.profile_picture,
        user_type: fields.user_type,
        email: fields.email,
        password: fields.password,
    })
}

struct ValidFields {
    first_name: String,
    last_name: String,
    profile_picture: Option<String>,
    user_type: Role,
    email: WorkEmail,
    password: Option<String>,
}

fn validate_fields(
    candidate: &Value,
    free_domains: &FreeEmailDomains,
    password_required: bool,
) -> Result<ValidFields, FieldErrors> {
    let obj = validation::as_object(candidate)?;
    let mut errors = FieldErrors::new();

    let first_name = validation::required_text(obj, "firstName", &FIRST_NAME, &mut errors);
    let last_name = validation::required_text(obj, "lastName", &LAST_NAME, &mut errors);
    let profile_picture = check_profile_picture(obj, &mut errors);
    let user_type = check_user_type(obj, &mut errors);
    let email = check_email(obj, free_domains, &mut errors);
    let password = check_password(obj, password_required, &mut errors);
    validation::reject_unknown_keys(obj, &FIELDS, &mut errors);

    match (first_name, last_name, profile_picture, user_type, email, password) {
        (Some(first_name), Some(last_name), Some(profile_picture), Some(user_type), Some(email), Some(password))
            if errors.is_empty() =>
        {
            Ok(ValidFields {
                first_name,
                last_name,
                profile_picture,
                user_type,
                email,
                password,
            })
        }
        _ => Err(errors),
    }
}

/// `Some(None)` when absent, `Some(Some(uri))` when valid, `None` on failure.
fn check_profile_picture(obj: &Map<String, Value>, errors: &mut FieldErrors) -> Option<Option<String>> {
    match validation::field(obj, "profilePicture") {
        FieldValue::Missing => Some(None),
        FieldValue::Other(_) => {
            errors.push("profilePicture", "\"profilePicture\" must be a string");
            None
        }
        FieldValue::Text(s) => {
            let s = s.trim();
            if s.is_empty() {
                errors.push("profilePicture", "\"profilePicture\" is not allowed to be empty");
                None
            } else if Url::parse(s).is_err() {
                errors.push("profilePicture", "\"profilePicture\" must be a valid uri");
                None
            } else {
                Some(Some(s.to_string()))
            }
        }
    }
}

fn check_user_type(obj: &Map<String, Value>, errors: &mut FieldErrors) -> Option<Role> {
    match validation::field(obj, "userType") {
        FieldValue::Missing => {
            errors.push("userType", "User type is required");
            None
        }
        FieldValue::Other(_) => {
            errors.push("userType", "User type must be a string");
            None
        }
        FieldValue::Text("") => {
            errors.push("userType", "User type is required");
            None
        }
        FieldValue::Text(s) => {
            let role = Role::parse(s);
            if role.is_none() {
                errors.push("userType", "User type must be either \"Admin\" or \"Manager\"");
            }
            role
        }
    }
}

fn check_email(obj: &Map<String, Value>, free_domains: &FreeEmailDomains, errors: &mut FieldErrors) -> Option<WorkEmail> {
    match validation::field(obj, "email") {
        FieldValue::Missing => {
            errors.push("email", "Email is required");
            None
        }
        FieldValue::Other(_) => {
            errors.push("email", "Email should be a type of text");
            None
        }
        FieldValue::Text(s) if s.trim().is_empty() => {
            errors.push("email", "Email cannot be empty");
            None
        }
        FieldValue::Text(s) => match WorkEmail::parse(s, free_domains) {
            Ok(email) => Some(email),
            Err(message) => {
                errors.push("email", message);
                None
            }
        },
    }
}

/// `Some(None)` only when the password is optional and absent.
fn check_password(obj: &Map<String, Value>, required: bool, errors: &mut FieldErrors) -> Option<Option<String>> {
    match validation::field(obj, "password") {
        FieldValue::Missing if required => {
            errors.push("password", "Password is required");
            None
        }
        FieldValue::Missing => Some(None),
        FieldValue::Other(_) => {
            errors.push("password", "Password should be a type of text");
            None
        }
        FieldValue::Text("") => {
            errors.push("password", "Password cannot be empty");
            None
        }
        FieldValue::Text(s) => {
            let before = errors.len();
            if s.chars().count() < PASSWORD_MIN_LENGTH {
                errors.push("password", PASSWORD_TOO_SHORT);
            }
            if !PASSWORD_RULES.iter().all(|rule| rule.is_match(s)) {
                errors.push("password", PASSWORD_TOO_WEAK);
            }
            (errors.len() == before).then(|| Some(s.to_string()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn domains() -> FreeEmailDomains {
        FreeEmailDomains::bundled()
    }

    fn candidate() -> Value {
        json!({
            "firstName": "Jane",
            "lastName": "Doe",
            "userType": "Admin",
            "email": "jane@acme-produce.com",
            "password": "Abcdef1!"
        })
    }

    fn with(field: &str, value: Value) -> Value {
        let mut c = candidate();
        c[field] = value;
        c
    }

    fn without(field: &str) -> Value {
        let mut c = candidate();
        c.as_object_mut().unwrap().remove(field);
        c
    }

    #[test]
    fn valid_user_is_normalized() {
        let c = with("firstName", json!("  Jane "));
        let user = validate_new_user(&c, &domains()).unwrap();
        assert_eq!(user.first_name, "Jane");
        assert_eq!(user.user_type, Role::Admin);
        assert_eq!(user.email.as_str(), "jane@acme-produce.com");
        assert_eq!(user.profile_picture, None);
    }

    #[test]
    fn free_email_fails_with_work_email_message() {
        let err = validate_new_user(&with("email", json!("jane@gmail.com")), &domains()).unwrap_err();
        assert_eq!(err.first_message(), Some(crate::email::FREE_EMAIL));
    }

    #[test]
    fn password_rules() {
        let weak = validate_new_user(&with("password", json!("abcdefg1")), &domains()).unwrap_err();
        assert_eq!(weak.messages(), vec![PASSWORD_TOO_WEAK]);

        let short = validate_new_user(&with("password", json!("Ab1!")), &domains()).unwrap_err();
        assert_eq!(short.messages(), vec![PASSWORD_TOO_SHORT]);

        assert!(validate_new_user(&with("password", json!("Abcdef1!")), &domains()).is_ok());
    }

    #[test]
    fn each_password_pattern_is_required() {
        for pw in ["ABCDEF1!", "abcdef1!", "Abcdefg!", "Abcdefg1"] {
            let err = validate_new_user(&with("password", json!(pw)), &domains()).unwrap_err();
            assert_eq!(err.first_message(), Some(PASSWORD_TOO_WEAK), "{pw}");
        }
    }

    #[test]
    fn only_ascii_digits_count_as_a_number() {
        let err = validate_new_user(&with("password", json!("Abcdefg\u{0661}!")), &domains()).unwrap_err();
        assert_eq!(err.first_message(), Some(PASSWORD_TOO_WEAK));
    }

    #[test]
    fn role_must_be_exact() {
        let err = validate_new_user(&with("userType", json!("admin")), &domains()).unwrap_err();
        assert!(err.has_field("userType"));
        assert!(validate_new_user(&with("userType", json!("Manager")), &domains()).is_ok());
    }

    #[test]
    fn profile_picture_must_be_a_uri() {
        let err = validate_new_user(&with("profilePicture", json!("not a uri")), &domains()).unwrap_err();
        assert_eq!(err.first_message(), Some("\"profilePicture\" must be a valid uri"));

        let ok = validate_new_user(&with("profilePicture", json!("https://cdn.acme.com/jane.png")), &domains()).unwrap();
        assert_eq!(ok.profile_picture.as_deref(), Some("https://cdn.acme.com/jane.png"));
    }

    #[test]
    fn every_failure_is_reported_in_schema_order() {
        let c = json!({ "lastName": "", "email": "nope", "extra": 1 });
        let err = validate_new_user(&c, &domains()).unwrap_err();
        assert_eq!(
            err.messages(),
            vec![
                "First name is required",
                "Last name cannot be empty",
                "User type is required",
                "Email must be a valid email address",
                "Password is required",
                "\"extra\" is not allowed",
            ]
        );
    }

    #[test]
    fn update_allows_missing_password() {
        let update = validate_user_update(&without("password"), &domains()).unwrap();
        assert_eq!(update.password, None);
        assert!(validate_new_user(&without("password"), &domains()).is_err());
    }

    #[test]
    fn update_still_checks_a_supplied_password() {
        assert!(validate_user_update(&with("password", json!("weak")), &domains()).is_err());
    }

    #[test]
    fn apply_update_keeps_hash_without_new_password() {
        let new = validate_new_user(&candidate(), &domains()).unwrap();
        let mut account = UserAccount::from_new(new, "$argon2id$old".to_string());

        let update = validate_user_update(&with("firstName", json!("Janet")), &domains()).unwrap();
        let update = UserUpdate { password: None, ..update };
        account.apply_update(update, None);
        assert_eq!(account.first_name, "Janet");
        assert_eq!(account.password_hash, "$argon2id$old");

        let update = validate_user_update(&candidate(), &domains()).unwrap();
        account.apply_update(update, Some("$argon2id$new".to_string()));
        assert_eq!(account.password_hash, "$argon2id$new");
    }

    #[test]
    fn stored_shape_uses_wire_names() {
        let new = validate_new_user(&candidate(), &domains()).unwrap();
        let account = UserAccount::from_new(new, "digest".to_string());
        let v = serde_json::to_value(&account).unwrap();
        assert_eq!(v["firstName"], "Jane");
        assert_eq!(v["userType"], "Admin");
        assert_eq!(v["password"], "digest");
        assert!(v.get("profilePicture").is_none());
    }

    #[test]
    fn non_object_is_rejected() {
        assert!(validate_new_user(&json!("jane"), &domains()).is_err());
    }

    mod proptest_tests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #![proptest_config(ProptestConfig {
                cases: 256,
                ..ProptestConfig::default()
            })]

            /// Property: a free-email domain always fails with the work-email
            /// message, whatever the other fields look like.
            #[test]
            fn free_domain_always_rejected(
                local in "[a-z0-9]{1,8}(\\.[a-z0-9]{1,8}){0,2}",
                domain in prop::sample::select(vec!["gmail.com", "yahoo.com", "hotmail.com", "outlook.com", "icloud.com"]),
                first in prop::option::of("[A-Za-z]{0,8}"),
                password in "[ -~]{0,12}",
            ) {
                let mut c = json!({
                    "lastName": "Doe",
                    "userType": "Manager",
                    "email": format!("{local}@{domain}"),
                    "password": password,
                });
                if let Some(first) = first {
                    c["firstName"] = json!(first);
                }

                let err = validate_new_user(&c, &FreeEmailDomains::bundled()).unwrap_err();
                prop_assert!(err.messages().iter().any(|m| m == crate::email::FREE_EMAIL));
            }
        }
    }
}
