//! `counterpos-core` — domain foundation building blocks.
//!
//! This crate contains **pure domain** primitives (no infrastructure concerns):
//! the aggregate contract, the error model, money, identifiers and the name
//! normalization used for duplicate detection.

pub mod aggregate;
pub mod entity;
pub mod error;
pub mod id;
pub mod money;
pub mod text;
pub mod value_object;

pub use aggregate::{Aggregate, AggregateRoot};
pub use entity::Entity;
pub use error::{DomainError, DomainResult};
pub use id::SessionId;
pub use money::Money;
pub use text::{normalize_name, same_name};
pub use value_object::ValueObject;
