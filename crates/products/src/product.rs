use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use counterpos_core::{DomainError, Entity, Money, record_id};

record_id!(
    /// Product identifier (sequential, as shown in the product sheet).
    ProductId,
    "ProductId"
);

/// Items per lot for lot-priced products.
pub const LOT_SIZE: u32 = 30;

/// Weight quantities and stock are kept in grams.
pub const GRAMS_PER_KILOGRAM: u32 = 1000;

/// How a product is priced and counted.
///
/// | kind     | price is per | quantity in | stock in |
/// |----------|--------------|-------------|----------|
/// | `Unit`   | item         | items       | items    |
/// | `Weight` | kilogram     | grams       | grams    |
/// | `Lot`    | item         | lots        | items    |
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProductKind {
    Unit,
    Weight,
    Lot,
}

impl ProductKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ProductKind::Unit => "unit",
            ProductKind::Weight => "weight",
            ProductKind::Lot => "lot",
        }
    }

    /// Price of `quantity` (in this kind's quantity measure) at `price`.
    ///
    /// Weight prices are per kilogram and rounded half-up to the cent.
    /// Returns `None` on overflow.
    pub fn line_total(self, price: Money, quantity: u32) -> Option<Money> {
        match self {
            ProductKind::Unit => price.checked_mul(i64::from(quantity)),
            ProductKind::Weight => price.scaled(i64::from(quantity), i64::from(GRAMS_PER_KILOGRAM)),
            ProductKind::Lot => price.checked_mul(i64::from(quantity) * i64::from(LOT_SIZE)),
        }
    }

    /// Stock consumed by selling `quantity`.
    pub fn stock_needed(self, quantity: u32) -> Option<u32> {
        match self {
            ProductKind::Unit | ProductKind::Weight => Some(quantity),
            ProductKind::Lot => quantity.checked_mul(LOT_SIZE),
        }
    }

    /// Human label for a quantity (`"3 un"`, `"1.250 kg"`, `"2 lots"`).
    pub fn quantity_label(self, quantity: u32) -> String {
        match self {
            ProductKind::Unit => format!("{quantity} un"),
            ProductKind::Weight => format!(
                "{}.{:03} kg",
                quantity / GRAMS_PER_KILOGRAM,
                quantity % GRAMS_PER_KILOGRAM
            ),
            ProductKind::Lot if quantity == 1 => "1 lot".to_string(),
            ProductKind::Lot => format!("{quantity} lots"),
        }
    }

    /// Label for an amount in stock measure (lot stock counts loose items).
    pub fn stock_units_label(self, units: u32) -> String {
        match self {
            ProductKind::Lot => format!("{units} un"),
            kind => kind.quantity_label(units),
        }
    }
}

impl core::fmt::Display for ProductKind {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl core::str::FromStr for ProductKind {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "unit" => Ok(ProductKind::Unit),
            "weight" => Ok(ProductKind::Weight),
            "lot" => Ok(ProductKind::Lot),
            other => Err(DomainError::validation(format!(
                "product type must be one of: unit, weight, lot (got '{other}')"
            ))),
        }
    }
}

/// A product row of the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub kind: ProductKind,
    /// Per item, per kilogram or per item-in-lot depending on `kind`.
    pub price: Money,
    /// Items, or grams for weight products.
    pub stock: u32,
    pub created_on: NaiveDate,
}

impl Entity for Product {
    type Id = ProductId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

impl Product {
    pub fn line_total(&self, quantity: u32) -> Option<Money> {
        self.kind.line_total(self.price, quantity)
    }

    /// Whether `quantity` (in the kind's quantity measure) can be served from stock.
    pub fn can_supply(&self, quantity: u32) -> bool {
        self.kind
            .stock_needed(quantity)
            .is_some_and(|needed| needed <= self.stock)
    }

    /// Stock in counting units: items, or whole kilograms for weight products.
    pub fn stock_level(&self) -> u32 {
        match self.kind {
            ProductKind::Weight => self.stock / GRAMS_PER_KILOGRAM,
            ProductKind::Unit | ProductKind::Lot => self.stock,
        }
    }

    pub fn stock_label(&self) -> String {
        self.kind.stock_units_label(self.stock)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn product(kind: ProductKind, price: i64, stock: u32) -> Product {
        Product {
            id: ProductId::new(1),
            name: "Test".to_string(),
            kind,
            price: Money::from_cents(price),
            stock,
            created_on: NaiveDate::from_ymd_opt(2026, 10, 1).unwrap(),
        }
    }

    #[test]
    fn unit_price_times_quantity() {
        assert_eq!(
            ProductKind::Unit.line_total(Money::from_cents(350), 4),
            Some(Money::from_cents(1400))
        );
    }

    #[test]
    fn weight_price_is_per_kilogram() {
        // 1.250 kg at 40.00/kg = 50.00
        assert_eq!(
            ProductKind::Weight.line_total(Money::from_cents(4000), 1250),
            Some(Money::from_cents(5000))
        );
        // 125 g at 39.90/kg = 4.9875 => 4.99
        assert_eq!(
            ProductKind::Weight.line_total(Money::from_cents(3990), 125),
            Some(Money::from_cents(499))
        );
    }

    #[test]
    fn lot_price_uses_thirty_unit_multiplier() {
        // 2 lots of 30 at 0.50 each = 30.00
        assert_eq!(
            ProductKind::Lot.line_total(Money::from_cents(50), 2),
            Some(Money::from_cents(3000))
        );
        assert_eq!(ProductKind::Lot.stock_needed(2), Some(60));
    }

    #[test]
    fn supply_check_respects_lot_size() {
        let eggs = product(ProductKind::Lot, 50, 59);
        assert!(eggs.can_supply(1));
        assert!(!eggs.can_supply(2));
    }

    #[test]
    fn stock_level_uses_whole_kilograms_for_weight() {
        assert_eq!(product(ProductKind::Weight, 100, 12_750).stock_level(), 12);
        assert_eq!(product(ProductKind::Unit, 100, 12).stock_level(), 12);
    }

    #[test]
    fn kinds_parse_case_insensitively() {
        assert_eq!("Weight".parse::<ProductKind>().unwrap(), ProductKind::Weight);
        assert!(matches!("dozen".parse::<ProductKind>(), Err(DomainError::Validation(_))));
    }

    #[test]
    fn quantity_labels() {
        assert_eq!(ProductKind::Weight.quantity_label(1250), "1.250 kg");
        assert_eq!(ProductKind::Lot.quantity_label(1), "1 lot");
        assert_eq!(ProductKind::Unit.quantity_label(3), "3 un");
    }
}
