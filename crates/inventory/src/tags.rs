use std::collections::BTreeMap;

use counterpos_core::normalize_name;
use counterpos_products::Product;

/// Unique product names, sorted by their normalized form.
///
/// Names that differ only in case or accents collapse to the first one seen.
pub fn tag_cloud(products: &[Product]) -> Vec<String> {
    let mut tags: BTreeMap<String, String> = BTreeMap::new();
    for p in products {
        tags.entry(normalize_name(&p.name))
            .or_insert_with(|| p.name.trim().to_string());
    }
    tags.into_values().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use counterpos_core::Money;
    use counterpos_products::{ProductId, ProductKind};

    fn named(id: u32, name: &str) -> Product {
        Product {
            id: ProductId::new(id),
            name: name.to_string(),
            kind: ProductKind::Unit,
            price: Money::from_cents(100),
            stock: 1,
            created_on: NaiveDate::from_ymd_opt(2026, 10, 1).unwrap(),
        }
    }

    #[test]
    fn dedups_accent_and_case_variants() {
        let products = vec![
            named(1, "Pão"),
            named(2, "Açúcar"),
            named(3, "PAO"),
            named(4, "Café"),
        ];

        assert_eq!(tag_cloud(&products), vec!["Açúcar", "Café", "Pão"]);
    }

    #[test]
    fn empty_catalog_has_no_tags() {
        assert!(tag_cloud(&[]).is_empty());
    }
}
