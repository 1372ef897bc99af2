//! Value object trait: equality by value, not identity.

/// Marker trait for value objects.
///
/// Value objects are immutable and compared by their attribute values. In
/// this crate family they are only ever produced by a successful validation,
/// so holding one is proof that its rule was checked (e.g. a `HexColor` is
/// always a well-formed `#rgb`/`#rrggbb` string).
pub trait ValueObject: Clone + PartialEq + core::fmt::Debug {}
