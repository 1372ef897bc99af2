//! `greengrocer-core` — domain foundation building blocks.
//!
//! This crate contains **pure domain** primitives (no infrastructure concerns):
//! identifiers, the domain error model and the field-level validation toolkit
//! shared by the user and inventory validators.

pub mod error;
pub mod id;
pub mod validation;
pub mod value_object;

pub use error::DomainError;
pub use id::{ItemId, UserId};
pub use validation::{FieldError, FieldErrors, FieldValue, TextMessages};
pub use value_object::ValueObject;
