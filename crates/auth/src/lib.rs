//! `greengrocer-auth` — authentication/authorization boundary and the user
//! account domain.
//!
//! This crate is intentionally decoupled from HTTP and storage: token
//! verification, password hashing, role gating and user validation are all
//! plain functions/values that the API layer composes.

pub mod authorize;
pub mod claims;
pub mod email;
pub mod password;
pub mod principal;
pub mod roles;
pub mod token;
pub mod user;

pub use authorize::{authorize, AuthzError};
pub use claims::{JwtClaims, TokenValidationError, validate_claims};
pub use email::{FreeEmailDomains, WorkEmail};
pub use password::{HashCost, PasswordError, PasswordHasher};
pub use principal::Principal;
pub use roles::Role;
pub use token::{TokenError, TokenIssuer, TOKEN_TTL};
pub use user::{NewUser, UserAccount, UserUpdate, validate_new_user, validate_user_update};
