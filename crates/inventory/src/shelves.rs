use serde::{Deserialize, Serialize};

use counterpos_products::{Product, ProductId};

pub const AISLES: usize = 3;
pub const SHELVES_PER_AISLE: usize = 3;

/// Label of a slot with no product.
pub const EMPTY_SLOT: &str = "Empty";

/// One position of the shelf layout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShelfSlot {
    /// 1-based.
    pub aisle: usize,
    /// 1-based.
    pub shelf: usize,
    pub product_id: Option<ProductId>,
    pub label: String,
    pub quantity: Option<String>,
}

/// Lay products out aisle by aisle, shelf by shelf, in the given order.
///
/// Products beyond the nine slots are left off the matrix.
pub fn shelf_matrix(products: &[Product]) -> Vec<Vec<ShelfSlot>> {
    let mut placed = products.iter();

    (1..=AISLES)
        .map(|aisle| {
            (1..=SHELVES_PER_AISLE)
                .map(|shelf| match placed.next() {
                    Some(p) => ShelfSlot {
                        aisle,
                        shelf,
                        product_id: Some(p.id),
                        label: p.name.clone(),
                        quantity: Some(p.stock_label()),
                    },
                    None => ShelfSlot {
                        aisle,
                        shelf,
                        product_id: None,
                        label: EMPTY_SLOT.to_string(),
                        quantity: None,
                    },
                })
                .collect()
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use counterpos_core::Money;
    use counterpos_products::ProductKind;

    fn products(n: u32) -> Vec<Product> {
        (1..=n)
            .map(|id| Product {
                id: ProductId::new(id),
                name: format!("P{id}"),
                kind: ProductKind::Unit,
                price: Money::from_cents(100),
                stock: id,
                created_on: NaiveDate::from_ymd_opt(2026, 10, 1).unwrap(),
            })
            .collect()
    }

    #[test]
    fn fills_aisles_in_order_and_marks_empty_slots() {
        let matrix = shelf_matrix(&products(4));

        assert_eq!(matrix.len(), AISLES);
        assert!(matrix.iter().all(|a| a.len() == SHELVES_PER_AISLE));
        assert_eq!(matrix[0][2].label, "P3");
        assert_eq!(matrix[1][0].label, "P4");
        assert_eq!(matrix[1][0].quantity.as_deref(), Some("4 un"));
        assert_eq!(matrix[1][1].label, EMPTY_SLOT);
        assert!(matrix[2][2].quantity.is_none());
    }

    #[test]
    fn extra_products_do_not_fit() {
        let matrix = shelf_matrix(&products(12));
        assert_eq!(matrix[2][2].label, "P9");
    }
}
