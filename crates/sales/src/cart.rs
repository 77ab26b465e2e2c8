use serde::{Deserialize, Serialize};

use counterpos_core::{DomainError, Money};
use counterpos_products::{Product, ProductId, ProductKind, StockLine};

use crate::sale::CustomerRef;

/// A product line in a cart, priced at the time it was added.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartItem {
    pub product_id: ProductId,
    pub product_name: String,
    pub kind: ProductKind,
    /// Items, grams or lots depending on `kind`.
    pub quantity: u32,
    pub unit_price: Money,
    pub line_total: Money,
}

/// The working cart of one session.
///
/// Not persisted. Stock is checked when lines are added and again, against
/// the live catalog, at checkout.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cart {
    customer: Option<CustomerRef>,
    items: Vec<CartItem>,
}

impl Cart {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn customer(&self) -> Option<&CustomerRef> {
        self.customer.as_ref()
    }

    pub fn set_customer(&mut self, customer: Option<CustomerRef>) {
        self.customer = customer;
    }

    pub fn items(&self) -> &[CartItem] {
        &self.items
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Add `quantity` of `product`, merging with an existing line.
    ///
    /// The merged quantity must still fit in the product's stock. The line
    /// is repriced at the product's current price.
    pub fn add(&mut self, product: &Product, quantity: u32) -> Result<&CartItem, DomainError> {
        if quantity == 0 {
            return Err(DomainError::validation("quantity must be positive"));
        }

        let position = self.items.iter().position(|i| i.product_id == product.id);
        let already = position.map_or(0, |idx| self.items[idx].quantity);
        let merged = already
            .checked_add(quantity)
            .ok_or_else(|| DomainError::validation("quantity is too large"))?;

        if !product.can_supply(merged) {
            return Err(DomainError::invariant(format!(
                "insufficient stock for '{}': requested {}, available {}",
                product.name,
                product.kind.quantity_label(merged),
                product.stock_label()
            )));
        }

        let line_total = product
            .line_total(merged)
            .ok_or_else(|| DomainError::validation("quantity is too large"))?;

        let item = CartItem {
            product_id: product.id,
            product_name: product.name.clone(),
            kind: product.kind,
            quantity: merged,
            unit_price: product.price,
            line_total,
        };

        let idx = match position {
            Some(idx) => {
                self.items[idx] = item;
                idx
            }
            None => {
                self.items.push(item);
                self.items.len() - 1
            }
        };
        Ok(&self.items[idx])
    }

    pub fn remove(&mut self, product_id: ProductId) -> Result<CartItem, DomainError> {
        let idx = self
            .items
            .iter()
            .position(|i| i.product_id == product_id)
            .ok_or_else(|| DomainError::not_found(format!("product {product_id} in cart")))?;
        Ok(self.items.remove(idx))
    }

    /// Empties the cart, customer included.
    pub fn clear(&mut self) {
        self.items.clear();
        self.customer = None;
    }

    pub fn total(&self) -> Money {
        self.items.iter().map(|i| i.line_total).sum()
    }

    pub fn stock_lines(&self) -> Vec<StockLine> {
        self.items
            .iter()
            .map(|i| StockLine {
                product_id: i.product_id,
                quantity: i.quantity,
            })
            .collect()
    }
}
