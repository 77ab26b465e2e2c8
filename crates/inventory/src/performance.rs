use serde::{Deserialize, Serialize};

use counterpos_core::Money;
use counterpos_products::{GRAMS_PER_KILOGRAM, Product, ProductId, ProductKind};

/// Stock classification of a product.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PerformanceLevel {
    Low,
    Medium,
    High,
}

impl PerformanceLevel {
    pub const LOW_BELOW: u32 = 10;
    pub const HIGH_ABOVE: u32 = 50;

    /// `< 10` low, `10..=50` medium, `> 50` high.
    pub fn from_level(level: u32) -> Self {
        if level < Self::LOW_BELOW {
            PerformanceLevel::Low
        } else if level <= Self::HIGH_ABOVE {
            PerformanceLevel::Medium
        } else {
            PerformanceLevel::High
        }
    }
}

/// Read model: one row of the performance report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductPerformance {
    pub product_id: ProductId,
    pub name: String,
    pub kind: ProductKind,
    /// Items, or whole kilograms for weight products.
    pub stock_level: u32,
    pub stock_label: String,
    pub level: PerformanceLevel,
    /// Stock valued at the current price. `None` if it overflows.
    pub stock_value: Option<Money>,
}

impl ProductPerformance {
    pub fn of(product: &Product) -> Self {
        let stock_level = product.stock_level();
        Self {
            product_id: product.id,
            name: product.name.clone(),
            kind: product.kind,
            stock_level,
            stock_label: product.stock_label(),
            level: PerformanceLevel::from_level(stock_level),
            stock_value: stock_value(product),
        }
    }
}

fn stock_value(product: &Product) -> Option<Money> {
    match product.kind {
        ProductKind::Weight => product
            .price
            .scaled(i64::from(product.stock), i64::from(GRAMS_PER_KILOGRAM)),
        ProductKind::Unit | ProductKind::Lot => product.price.checked_mul(i64::from(product.stock)),
    }
}

/// Performance rows in catalog order.
pub fn performance(products: &[Product]) -> Vec<ProductPerformance> {
    products.iter().map(ProductPerformance::of).collect()
}

/// Products whose stock level is below `threshold`, lowest first.
pub fn low_stock(products: &[Product], threshold: u32) -> Vec<ProductPerformance> {
    let mut rows: Vec<_> = products
        .iter()
        .filter(|p| p.stock_level() < threshold)
        .map(ProductPerformance::of)
        .collect();
    rows.sort_by_key(|r| (r.stock_level, r.product_id));
    rows
}
