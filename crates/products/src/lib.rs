//! Products domain module.
//!
//! Business rules for the product catalog and the pricing-by-type rule,
//! implemented as deterministic domain logic (no IO, no HTTP, no storage).

pub mod catalog;
pub mod product;

pub use catalog::{
    Catalog, CatalogCommand, CatalogEvent, ProductRegistered, ProductRemoved, ProductRestocked,
    ProductUpdated, RegisterProduct, RemoveProduct, RestockProduct, StockLine, StockWithdrawn,
    UpdateProduct, WithdrawStock, Withdrawal,
};
pub use product::{GRAMS_PER_KILOGRAM, LOT_SIZE, Product, ProductId, ProductKind};
