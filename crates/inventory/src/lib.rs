//! Inventory reports.
//!
//! Read-only views over the product catalog: performance levels, the shelf
//! layout, the name tag cloud and the low-stock list.

pub mod performance;
pub mod shelves;
pub mod tags;

pub use performance::{PerformanceLevel, ProductPerformance, low_stock, performance};
pub use shelves::{AISLES, EMPTY_SLOT, SHELVES_PER_AISLE, ShelfSlot, shelf_matrix};
pub use tags::tag_cloud;
