use std::collections::BTreeMap;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use counterpos_core::{Aggregate, AggregateRoot, DomainError, Money, same_name};
use counterpos_events::Event;

use crate::product::{Product, ProductId, ProductKind};

static CATALOG_ID: &str = "products.catalog";

/// Aggregate root: the product catalog (one product sheet).
///
/// Name uniqueness is a catalog-wide rule, so the whole sheet is the
/// consistency boundary.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Catalog {
    products: Vec<Product>,
    version: u64,
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild a catalog from persisted rows.
    pub fn from_products(mut products: Vec<Product>) -> Self {
        products.sort_by_key(|p| p.id);
        Self {
            products,
            version: 0,
        }
    }

    /// Products in id order.
    pub fn products(&self) -> &[Product] {
        &self.products
    }

    pub fn get(&self, id: ProductId) -> Option<&Product> {
        self.products.iter().find(|p| p.id == id)
    }

    pub fn find_by_name(&self, name: &str) -> Option<&Product> {
        self.products.iter().find(|p| same_name(&p.name, name))
    }

    pub fn next_id(&self) -> Result<ProductId, DomainError> {
        ProductId::after(self.products.iter().map(|p| p.id).max())
    }

    fn get_mut(&mut self, id: ProductId) -> Option<&mut Product> {
        self.products.iter_mut().find(|p| p.id == id)
    }
}

impl AggregateRoot for Catalog {
    type Id = &'static str;

    fn id(&self) -> &Self::Id {
        &CATALOG_ID
    }

    fn version(&self) -> u64 {
        self.version
    }
}

/// Command: RegisterProduct.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegisterProduct {
    pub name: String,
    pub kind: ProductKind,
    pub price: Money,
    pub stock: u32,
    pub occurred_at: NaiveDateTime,
}

/// Command: UpdateProduct. `None` fields stay unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateProduct {
    pub product_id: ProductId,
    pub name: Option<String>,
    pub kind: Option<ProductKind>,
    pub price: Option<Money>,
    pub occurred_at: NaiveDateTime,
}

/// Command: RestockProduct.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RestockProduct {
    pub product_id: ProductId,
    /// Items, or grams for weight products.
    pub quantity: u32,
    pub occurred_at: NaiveDateTime,
}

/// Command: RemoveProduct.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoveProduct {
    pub product_id: ProductId,
    pub occurred_at: NaiveDateTime,
}

/// A quantity sold, in the product kind's quantity measure (lots for lot products).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockLine {
    pub product_id: ProductId,
    pub quantity: u32,
}

/// Command: WithdrawStock (checkout). All lines succeed or none do.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WithdrawStock {
    pub lines: Vec<StockLine>,
    pub occurred_at: NaiveDateTime,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum CatalogCommand {
    RegisterProduct(RegisterProduct),
    UpdateProduct(UpdateProduct),
    RestockProduct(RestockProduct),
    RemoveProduct(RemoveProduct),
    WithdrawStock(WithdrawStock),
}

/// Event: ProductRegistered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductRegistered {
    pub product: Product,
    pub occurred_at: NaiveDateTime,
}

/// Event: ProductUpdated (carries the resulting values).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductUpdated {
    pub product_id: ProductId,
    pub name: String,
    pub kind: ProductKind,
    pub price: Money,
    pub occurred_at: NaiveDateTime,
}

/// Event: ProductRestocked.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductRestocked {
    pub product_id: ProductId,
    pub name: String,
    pub quantity: u32,
    pub stock_after: u32,
    pub occurred_at: NaiveDateTime,
}

/// Event: ProductRemoved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductRemoved {
    pub product_id: ProductId,
    pub name: String,
    pub occurred_at: NaiveDateTime,
}

/// Stock taken out of one product, in stock measure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Withdrawal {
    pub product_id: ProductId,
    pub name: String,
    pub stock_units: u32,
    pub stock_after: u32,
}

/// Event: StockWithdrawn.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockWithdrawn {
    pub withdrawals: Vec<Withdrawal>,
    pub occurred_at: NaiveDateTime,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum CatalogEvent {
    ProductRegistered(ProductRegistered),
    ProductUpdated(ProductUpdated),
    ProductRestocked(ProductRestocked),
    ProductRemoved(ProductRemoved),
    StockWithdrawn(StockWithdrawn),
}

impl Event for CatalogEvent {
    fn event_type(&self) -> &'static str {
        match self {
            CatalogEvent::ProductRegistered(_) => "products.product.registered",
            CatalogEvent::ProductUpdated(_) => "products.product.updated",
            CatalogEvent::ProductRestocked(_) => "products.product.restocked",
            CatalogEvent::ProductRemoved(_) => "products.product.removed",
            CatalogEvent::StockWithdrawn(_) => "products.stock.withdrawn",
        }
    }

    fn version(&self) -> u32 {
        1
    }

    fn occurred_at(&self) -> NaiveDateTime {
        match self {
            CatalogEvent::ProductRegistered(e) => e.occurred_at,
            CatalogEvent::ProductUpdated(e) => e.occurred_at,
            CatalogEvent::ProductRestocked(e) => e.occurred_at,
            CatalogEvent::ProductRemoved(e) => e.occurred_at,
            CatalogEvent::StockWithdrawn(e) => e.occurred_at,
        }
    }

    fn summary(&self) -> String {
        match self {
            CatalogEvent::ProductRegistered(e) => format!(
                "Registered product: {} (ID: {}, {}, price {})",
                e.product.name, e.product.id, e.product.kind, e.product.price
            ),
            CatalogEvent::ProductUpdated(e) => format!(
                "Updated product: {} (ID: {}, {}, price {})",
                e.name, e.product_id, e.kind, e.price
            ),
            CatalogEvent::ProductRestocked(e) => format!(
                "Restocked product: {} (ID: {}) +{} -> {}",
                e.name, e.product_id, e.quantity, e.stock_after
            ),
            CatalogEvent::ProductRemoved(e) => {
                format!("Removed product: {} (ID: {})", e.name, e.product_id)
            }
            CatalogEvent::StockWithdrawn(e) => {
                let parts = e
                    .withdrawals
                    .iter()
                    .map(|w| format!("{} -{}", w.name, w.stock_units))
                    .collect::<Vec<_>>();
                format!("Withdrew stock: {}", parts.join(", "))
            }
        }
    }
}

impl Aggregate for Catalog {
    type Command = CatalogCommand;
    type Event = CatalogEvent;
    type Error = DomainError;

    fn apply(&mut self, event: &Self::Event) {
        match event {
            CatalogEvent::ProductRegistered(e) => {
                self.products.push(e.product.clone());
                self.products.sort_by_key(|p| p.id);
            }
            CatalogEvent::ProductUpdated(e) => {
                if let Some(p) = self.get_mut(e.product_id) {
                    p.name = e.name.clone();
                    p.kind = e.kind;
                    p.price = e.price;
                }
            }
            CatalogEvent::ProductRestocked(e) => {
                if let Some(p) = self.get_mut(e.product_id) {
                    p.stock = e.stock_after;
                }
            }
            CatalogEvent::ProductRemoved(e) => {
                self.products.retain(|p| p.id != e.product_id);
            }
            CatalogEvent::StockWithdrawn(e) => {
                for w in &e.withdrawals {
                    if let Some(p) = self.get_mut(w.product_id) {
                        p.stock = w.stock_after;
                    }
                }
            }
        }

        self.version += 1;
    }

    fn handle(&self, command: &Self::Command) -> Result<Vec<Self::Event>, Self::Error> {
        match command {
            CatalogCommand::RegisterProduct(cmd) => self.handle_register(cmd),
            CatalogCommand::UpdateProduct(cmd) => self.handle_update(cmd),
            CatalogCommand::RestockProduct(cmd) => self.handle_restock(cmd),
            CatalogCommand::RemoveProduct(cmd) => self.handle_remove(cmd),
            CatalogCommand::WithdrawStock(cmd) => self.handle_withdraw(cmd),
        }
    }
}

impl Catalog {
    fn require(&self, id: ProductId) -> Result<&Product, DomainError> {
        self.get(id)
            .ok_or_else(|| DomainError::not_found(format!("product {id}")))
    }

    fn ensure_unique_name(&self, name: &str, except: Option<ProductId>) -> Result<(), DomainError> {
        let taken = self
            .products
            .iter()
            .any(|p| Some(p.id) != except && same_name(&p.name, name));
        if taken {
            return Err(DomainError::conflict(format!(
                "product '{name}' is already registered"
            )));
        }
        Ok(())
    }

    fn handle_register(&self, cmd: &RegisterProduct) -> Result<Vec<CatalogEvent>, DomainError> {
        let name = valid_name(&cmd.name)?;
        ensure_positive_price(cmd.price)?;
        self.ensure_unique_name(&name, None)?;

        Ok(vec![CatalogEvent::ProductRegistered(ProductRegistered {
            product: Product {
                id: self.next_id()?,
                name,
                kind: cmd.kind,
                price: cmd.price,
                stock: cmd.stock,
                created_on: cmd.occurred_at.date(),
            },
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_update(&self, cmd: &UpdateProduct) -> Result<Vec<CatalogEvent>, DomainError> {
        let current = self.require(cmd.product_id)?;

        let name = match &cmd.name {
            Some(name) => {
                let name = valid_name(name)?;
                self.ensure_unique_name(&name, Some(current.id))?;
                name
            }
            None => current.name.clone(),
        };

        let price = match cmd.price {
            Some(price) => {
                ensure_positive_price(price)?;
                price
            }
            None => current.price,
        };

        let kind = cmd.kind.unwrap_or(current.kind);
        if kind != current.kind && current.stock > 0 {
            return Err(DomainError::invariant(format!(
                "cannot change the type of '{}' while {} is in stock",
                current.name,
                current.stock_label()
            )));
        }

        if name == current.name && kind == current.kind && price == current.price {
            return Ok(vec![]);
        }

        Ok(vec![CatalogEvent::ProductUpdated(ProductUpdated {
            product_id: current.id,
            name,
            kind,
            price,
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_restock(&self, cmd: &RestockProduct) -> Result<Vec<CatalogEvent>, DomainError> {
        let product = self.require(cmd.product_id)?;

        if cmd.quantity == 0 {
            return Err(DomainError::validation("restock quantity must be positive"));
        }

        let stock_after = product
            .stock
            .checked_add(cmd.quantity)
            .ok_or_else(|| DomainError::validation("restock quantity is too large"))?;

        Ok(vec![CatalogEvent::ProductRestocked(ProductRestocked {
            product_id: product.id,
            name: product.name.clone(),
            quantity: cmd.quantity,
            stock_after,
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_remove(&self, cmd: &RemoveProduct) -> Result<Vec<CatalogEvent>, DomainError> {
        let product = self.require(cmd.product_id)?;

        Ok(vec![CatalogEvent::ProductRemoved(ProductRemoved {
            product_id: product.id,
            name: product.name.clone(),
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_withdraw(&self, cmd: &WithdrawStock) -> Result<Vec<CatalogEvent>, DomainError> {
        if cmd.lines.is_empty() {
            return Err(DomainError::validation("nothing to withdraw"));
        }

        // Sum per product first so two lines of the same product are checked together.
        let mut needed: BTreeMap<ProductId, u32> = BTreeMap::new();
        for line in &cmd.lines {
            let product = self.require(line.product_id)?;
            if line.quantity == 0 {
                return Err(DomainError::validation(format!(
                    "quantity for '{}' must be positive",
                    product.name
                )));
            }
            let units = product
                .kind
                .stock_needed(line.quantity)
                .ok_or_else(|| DomainError::validation("quantity is too large"))?;
            let entry = needed.entry(product.id).or_insert(0);
            *entry = entry
                .checked_add(units)
                .ok_or_else(|| DomainError::validation("quantity is too large"))?;
        }

        let mut withdrawals = Vec::with_capacity(needed.len());
        for (id, units) in needed {
            let product = self.require(id)?;
            if units > product.stock {
                return Err(DomainError::invariant(format!(
                    "insufficient stock for '{}': requested {}, available {}",
                    product.name,
                    product.kind.stock_units_label(units),
                    product.stock_label()
                )));
            }
            withdrawals.push(Withdrawal {
                product_id: id,
                name: product.name.clone(),
                stock_units: units,
                stock_after: product.stock - units,
            });
        }

        Ok(vec![CatalogEvent::StockWithdrawn(StockWithdrawn {
            withdrawals,
            occurred_at: cmd.occurred_at,
        })])
    }
}

fn valid_name(name: &str) -> Result<String, DomainError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(DomainError::validation("name cannot be empty"));
    }
    Ok(name.to_string())
}

fn ensure_positive_price(price: Money) -> Result<(), DomainError> {
    if !price.is_positive() {
        return Err(DomainError::validation("price must be positive"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use counterpos_events::execute;

    fn test_time() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 10, 16)
            .unwrap()
            .and_hms_opt(9, 30, 0)
            .unwrap()
    }

    fn register(name: &str, kind: ProductKind, price: i64, stock: u32) -> CatalogCommand {
        CatalogCommand::RegisterProduct(RegisterProduct {
            name: name.to_string(),
            kind,
            price: Money::from_cents(price),
            stock,
            occurred_at: test_time(),
        })
    }

    fn seeded() -> Catalog {
        let mut catalog = Catalog::new();
        execute(&mut catalog, &register("Pão Francês", ProductKind::Unit, 75, 100)).unwrap();
        execute(&mut catalog, &register("Queijo Minas", ProductKind::Weight, 4990, 3000)).unwrap();
        execute(&mut catalog, &register("Ovos", ProductKind::Lot, 60, 90)).unwrap();
        catalog
    }

    fn withdraw(lines: &[(u32, u32)]) -> CatalogCommand {
        CatalogCommand::WithdrawStock(WithdrawStock {
            lines: lines
                .iter()
                .map(|&(id, quantity)| StockLine {
                    product_id: ProductId::new(id),
                    quantity,
                })
                .collect(),
            occurred_at: test_time(),
        })
    }

    #[test]
    fn register_assigns_sequential_ids() {
        let catalog = seeded();
        let ids: Vec<u32> = catalog.products().iter().map(|p| p.id.get()).collect();
        assert_eq!(ids, vec![1, 2, 3]);
        assert_eq!(catalog.version(), 3);
    }

    #[test]
    fn register_after_removal_continues_after_highest_id() {
        let mut catalog = seeded();
        execute(
            &mut catalog,
            &CatalogCommand::RemoveProduct(RemoveProduct {
                product_id: ProductId::new(2),
                occurred_at: test_time(),
            }),
        )
        .unwrap();

        execute(&mut catalog, &register("Sonho", ProductKind::Unit, 450, 12)).unwrap();
        assert_eq!(catalog.find_by_name("sonho").unwrap().id, ProductId::new(4));
    }

    #[test]
    fn register_fails_once_product_ids_run_out() {
        let catalog = Catalog::from_products(vec![Product {
            id: ProductId::new(u32::MAX),
            name: "Broa".into(),
            kind: ProductKind::Unit,
            price: Money::from_cents(300),
            stock: 4,
            created_on: test_time().date(),
        }]);

        let err = catalog
            .handle(&register("Sonho", ProductKind::Unit, 450, 12))
            .unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)), "{err:?}");
        assert_eq!(catalog.products().len(), 1);
    }

    #[test]
    fn register_rejects_duplicate_names_ignoring_case_and_accents() {
        let catalog = seeded();
        let err = catalog
            .handle(&register("  pao   FRANCES ", ProductKind::Unit, 80, 10))
            .unwrap_err();
        assert!(matches!(err, DomainError::Conflict(_)));
    }

    #[test]
    fn register_rejects_empty_name_and_non_positive_price() {
        let catalog = Catalog::new();
        let err = catalog
            .handle(&register("   ", ProductKind::Unit, 100, 1))
            .unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));

        let err = catalog
            .handle(&register("Broa", ProductKind::Unit, 0, 1))
            .unwrap_err();
        assert!(matches!(err, DomainError::Validation(msg) if msg.contains("price")));
    }

    #[test]
    fn update_keeps_own_name_and_rejects_someone_elses() {
        let catalog = seeded();
        let own = CatalogCommand::UpdateProduct(UpdateProduct {
            product_id: ProductId::new(1),
            name: Some("PÃO FRANCÊS".to_string()),
            kind: None,
            price: Some(Money::from_cents(80)),
            occurred_at: test_time(),
        });
        assert_eq!(catalog.handle(&own).unwrap().len(), 1);

        let clash = CatalogCommand::UpdateProduct(UpdateProduct {
            product_id: ProductId::new(1),
            name: Some("ovos".to_string()),
            kind: None,
            price: None,
            occurred_at: test_time(),
        });
        assert!(matches!(catalog.handle(&clash), Err(DomainError::Conflict(_))));
    }

    #[test]
    fn update_without_changes_emits_nothing() {
        let catalog = seeded();
        let cmd = CatalogCommand::UpdateProduct(UpdateProduct {
            product_id: ProductId::new(3),
            name: None,
            kind: None,
            price: None,
            occurred_at: test_time(),
        });
        assert!(catalog.handle(&cmd).unwrap().is_empty());
    }

    #[test]
    fn kind_change_requires_empty_stock() {
        let catalog = seeded();
        let cmd = CatalogCommand::UpdateProduct(UpdateProduct {
            product_id: ProductId::new(2),
            name: None,
            kind: Some(ProductKind::Unit),
            price: None,
            occurred_at: test_time(),
        });
        assert!(matches!(
            catalog.handle(&cmd),
            Err(DomainError::InvariantViolation(_))
        ));
    }

    #[test]
    fn restock_adds_to_stock() {
        let mut catalog = seeded();
        execute(
            &mut catalog,
            &CatalogCommand::RestockProduct(RestockProduct {
                product_id: ProductId::new(1),
                quantity: 50,
                occurred_at: test_time(),
            }),
        )
        .unwrap();
        assert_eq!(catalog.get(ProductId::new(1)).unwrap().stock, 150);
    }

    #[test]
    fn restock_rejects_zero_and_unknown_products() {
        let catalog = seeded();
        let zero = CatalogCommand::RestockProduct(RestockProduct {
            product_id: ProductId::new(1),
            quantity: 0,
            occurred_at: test_time(),
        });
        assert!(matches!(catalog.handle(&zero), Err(DomainError::Validation(_))));

        let unknown = CatalogCommand::RestockProduct(RestockProduct {
            product_id: ProductId::new(99),
            quantity: 1,
            occurred_at: test_time(),
        });
        assert!(matches!(catalog.handle(&unknown), Err(DomainError::NotFound(_))));
    }

    #[test]
    fn withdraw_converts_lots_to_items() {
        let mut catalog = seeded();
        execute(&mut catalog, &withdraw(&[(3, 2), (2, 750)])).unwrap();

        assert_eq!(catalog.get(ProductId::new(3)).unwrap().stock, 30);
        assert_eq!(catalog.get(ProductId::new(2)).unwrap().stock, 2250);
    }

    #[test]
    fn withdraw_is_all_or_nothing() {
        let catalog = seeded();
        let err = catalog.handle(&withdraw(&[(1, 10), (3, 4)])).unwrap_err();
        assert!(matches!(err, DomainError::InvariantViolation(msg) if msg.contains("Ovos")));
        assert_eq!(catalog.get(ProductId::new(1)).unwrap().stock, 100);
    }

    #[test]
    fn withdraw_sums_repeated_lines_of_one_product() {
        let catalog = seeded();
        let err = catalog.handle(&withdraw(&[(1, 60), (1, 60)])).unwrap_err();
        assert!(matches!(err, DomainError::InvariantViolation(_)));
    }

    #[test]
    fn summaries_name_the_product() {
        let catalog = Catalog::new();
        let events = catalog
            .handle(&register("Baguete", ProductKind::Unit, 900, 5))
            .unwrap();
        assert_eq!(events[0].event_type(), "products.product.registered");
        assert_eq!(
            events[0].summary(),
            "Registered product: Baguete (ID: 1, unit, price 9.00)"
        );
    }

    #[cfg(test)]
    mod proptest_tests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #![proptest_config(ProptestConfig {
                cases: 256,
                ..ProptestConfig::default()
            })]

            /// Property: handle() never mutates the catalog.
            #[test]
            fn handle_is_pure(quantity in 0u32..200, id in 1u32..5) {
                let catalog = seeded();
                let before = catalog.clone();

                let first = catalog.handle(&withdraw(&[(id, quantity)]));
                let second = catalog.handle(&withdraw(&[(id, quantity)]));

                prop_assert_eq!(&catalog, &before);
                prop_assert_eq!(first, second);
            }

            /// Property: no sequence of withdrawals drives stock below zero
            /// or changes the total of stock + withdrawn units.
            #[test]
            fn stock_is_conserved(quantities in prop::collection::vec(1u32..40, 1..20)) {
                let mut catalog = seeded();
                let mut withdrawn: u64 = 0;

                for q in quantities {
                    if let Ok(events) = execute(&mut catalog, &withdraw(&[(1, q)])) {
                        for e in events {
                            if let CatalogEvent::StockWithdrawn(w) = e {
                                withdrawn += w.withdrawals.iter().map(|w| u64::from(w.stock_units)).sum::<u64>();
                            }
                        }
                    }
                }

                let left = u64::from(catalog.get(ProductId::new(1)).unwrap().stock);
                prop_assert_eq!(left + withdrawn, 100);
            }
        }
    }
}
