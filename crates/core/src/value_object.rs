//! Value object trait: equality by value, not identity.
//!
//! Value objects have **no identity**; they are defined entirely by their
//! attribute values. A `Price` of 10.00 equals any other `Price` of 10.00, and a
//! `Slug` is just its text. Constructors validate, so a value object that exists
//! is always well-formed.

/// Marker trait for value objects.
///
/// Value objects are immutable and compared by value. To "modify" one, build
/// a new one.
pub trait ValueObject: Clone + PartialEq + core::fmt::Debug {}
