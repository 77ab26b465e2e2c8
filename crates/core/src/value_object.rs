//! Value object trait: equality by value, not identity.
//!
//! `Money { cents: 1250 }` is a value object; a `Customer` with an id is an
//! entity. Value objects are immutable: "changing" one means building a new one.

/// Marker trait for value objects.
pub trait ValueObject: Clone + PartialEq + core::fmt::Debug {}
