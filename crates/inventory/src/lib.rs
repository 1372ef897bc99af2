//! Vegetable inventory domain.
//!
//! Business rules only (no IO, no HTTP, no storage): the stored item shape
//! and the validator that produces it from submitted JSON.

pub mod item;

pub use item::{HexColor, Vegetable, validate_vegetable};
