//! Integration tests for the till pipeline.
//!
//! Tests: Cart → Checkout → Catalog + Ledger → EventBus → Activity log
//!
//! Verifies:
//! - Checkout withdraws stock and records the order together, or not at all
//! - The working ledger rolls over to history when the day changes
//! - Cash closing and the monthly report read what checkout recorded
//! - Workbook-backed stores survive a restart

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::thread;
    use std::time::Duration;

    use chrono::{NaiveDate, NaiveDateTime};

    use counterpos_accounting::{ClosingStatus, ExpenseCategory, Month};
    use counterpos_core::{Money, SessionId};
    use counterpos_events::InMemoryEventBus;
    use counterpos_products::{Catalog, ProductId, ProductKind};
    use counterpos_sales::{MethodTotals, PaymentMethod};

    use crate::activity_log::ActivityLog;
    use crate::clock::FixedClock;
    use crate::command_dispatcher::{DispatchError, Envelope};
    use crate::pos::{
        CashCount, CustomerChanges, NewCustomer, NewExpense, NewProduct, PointOfSale,
        ProductChanges, Stores,
    };
    use crate::store::{AggregateStore, InMemoryAggregateStore, StoreError};
    use crate::workers::spawn_activity_logger;

    type Bus = Arc<InMemoryEventBus<Envelope>>;

    fn at(day: u32, hour: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 10, day)
            .unwrap()
            .and_hms_opt(hour, 0, 0)
            .unwrap()
    }

    fn till_with(stores: Stores) -> (PointOfSale<Bus>, Arc<FixedClock>) {
        let clock = Arc::new(FixedClock::new(at(16, 9)));
        let bus: Bus = Arc::new(InMemoryEventBus::new());
        (PointOfSale::new(bus, stores, clock.clone()), clock)
    }

    fn till() -> (PointOfSale<Bus>, Arc<FixedClock>) {
        till_with(Stores::in_memory())
    }

    fn product(
        till: &PointOfSale<Bus>,
        name: &str,
        kind: ProductKind,
        price: i64,
        stock: u32,
    ) -> ProductId {
        till.register_product(NewProduct {
            name: name.to_string(),
            kind,
            price: Money::from_cents(price),
            stock,
        })
        .unwrap()
        .id
    }

    #[test]
    fn checkout_records_rows_and_withdraws_stock() {
        let (till, _) = till();
        let bread = product(&till, "Bread", ProductKind::Unit, 250, 10);
        let cheese = product(&till, "Cheese", ProductKind::Weight, 4990, 2000);
        let eggs = product(&till, "Eggs", ProductKind::Lot, 60, 90);
        let session = SessionId::new();

        till.add_to_cart(session, bread, 2).unwrap();
        till.add_to_cart(session, cheese, 250).unwrap();
        let cart = till.add_to_cart(session, eggs, 2).unwrap();
        assert_eq!(cart.total(), Money::from_cents(500 + 1248 + 3600));

        let receipt = till.checkout(session, PaymentMethod::Cash).unwrap();

        assert_eq!(receipt.total, Money::from_cents(5348));
        assert_eq!(receipt.lines.len(), 3);
        assert!(receipt.lines.iter().all(|r| r.order_id == receipt.order_id));
        assert_eq!(receipt.customer_name, "Walk-in");
        assert_eq!(till.product(bread).unwrap().stock, 8);
        assert_eq!(till.product(cheese).unwrap().stock, 1750);
        assert_eq!(till.product(eggs).unwrap().stock, 30);
        assert_eq!(till.sales_today().unwrap().len(), 3);
        assert!(till.cart(session).unwrap().is_empty());
    }

    #[test]
    fn checkout_rejects_an_empty_cart() {
        let (till, _) = till();
        let err = till.checkout(SessionId::new(), PaymentMethod::Cash).unwrap_err();
        assert!(matches!(err, DispatchError::Validation(_)), "{err:?}");
    }

    #[test]
    fn checkout_is_all_or_nothing_when_stock_ran_out() {
        let (till, _) = till();
        let bread = product(&till, "Bread", ProductKind::Unit, 250, 10);
        let milk = product(&till, "Milk", ProductKind::Unit, 400, 10);
        let (first, second) = (SessionId::new(), SessionId::new());

        till.add_to_cart(first, bread, 6).unwrap();
        till.add_to_cart(second, milk, 1).unwrap();
        till.add_to_cart(second, bread, 6).unwrap();
        till.checkout(first, PaymentMethod::Debit).unwrap();

        let err = till.checkout(second, PaymentMethod::Cash).unwrap_err();

        assert!(matches!(err, DispatchError::InvariantViolation(_)), "{err:?}");
        assert_eq!(till.product(bread).unwrap().stock, 4);
        assert_eq!(till.product(milk).unwrap().stock, 10);
        assert_eq!(till.sales_today().unwrap().len(), 1);
        assert_eq!(till.cart(second).unwrap().items().len(), 2);
    }

    /// A catalog store that takes its time, like a workbook on a slow disk.
    struct SlowCatalog(InMemoryAggregateStore<Catalog>);

    impl AggregateStore<Catalog> for SlowCatalog {
        fn load(&self) -> Result<Catalog, StoreError> {
            thread::sleep(Duration::from_millis(50));
            self.0.load()
        }

        fn save(&self, aggregate: &Catalog) -> Result<(), StoreError> {
            thread::sleep(Duration::from_millis(50));
            self.0.save(aggregate)
        }
    }

    #[test]
    fn concurrent_checkouts_of_one_cart_record_one_order() {
        let (till, _) = till_with(Stores {
            catalog: Arc::new(SlowCatalog(InMemoryAggregateStore::new(Catalog::new()))),
            ..Stores::in_memory()
        });
        let bread = product(&till, "Bread", ProductKind::Unit, 250, 10);
        let session = SessionId::new();
        till.add_to_cart(session, bread, 3).unwrap();

        let results: Vec<_> = thread::scope(|scope| {
            let handles: Vec<_> = (0..2)
                .map(|_| scope.spawn(|| till.checkout(session, PaymentMethod::Cash)))
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });

        assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
        let err = results.into_iter().find_map(Result::err).unwrap();
        assert!(
            matches!(&err, DispatchError::Validation(msg) if msg == "the cart is empty"),
            "{err:?}"
        );
        assert_eq!(till.product(bread).unwrap().stock, 7);
        assert_eq!(till.sales_today().unwrap().len(), 1);
        assert!(till.cart(session).unwrap().is_empty());
    }

    #[test]
    fn checkout_uses_current_prices() {
        let (till, _) = till();
        let bread = product(&till, "Bread", ProductKind::Unit, 250, 10);
        let session = SessionId::new();
        till.add_to_cart(session, bread, 2).unwrap();

        till.update_product(
            bread,
            ProductChanges {
                price: Some(Money::from_cents(300)),
                ..ProductChanges::default()
            },
        )
        .unwrap();
        let receipt = till.checkout(session, PaymentMethod::Cash).unwrap();

        assert_eq!(receipt.total, Money::from_cents(600));
    }

    #[test]
    fn on_account_sales_are_settled_later() {
        let (till, clock) = till();
        let bread = product(&till, "Bread", ProductKind::Unit, 250, 10);
        let ana = till
            .register_customer(NewCustomer {
                name: "Ana".into(),
                phone: Some("555-0101".into()),
                ..NewCustomer::default()
            })
            .unwrap();
        let session = SessionId::new();
        till.add_to_cart(session, bread, 4).unwrap();

        let err = till.checkout(session, PaymentMethod::OnAccount).unwrap_err();
        assert!(matches!(err, DispatchError::Validation(_)), "{err:?}");

        till.set_cart_customer(session, Some(ana.id)).unwrap();
        let receipt = till.checkout(session, PaymentMethod::OnAccount).unwrap();
        let sale_id = receipt.lines[0].sale_id;
        assert_eq!(receipt.customer_name, "Ana");
        assert!(receipt.lines[0].paid_on.is_none());

        let day_one = till.daily_summary(None).unwrap();
        assert_eq!(day_one.pending, Money::from_cents(1000));
        assert_eq!(day_one.received.total(), Money::ZERO);

        clock.set(at(17, 10));
        assert!(till.sales_today().unwrap().is_empty());
        assert_eq!(till.sales_on(at(16, 0).date()).unwrap().len(), 1);

        let settled = till.settle_sale(sale_id, PaymentMethod::Transfer).unwrap();
        assert_eq!(settled.paid_on, Some(at(17, 0).date()));
        assert_eq!(settled.date, at(16, 0).date());

        let day_two = till.daily_summary(None).unwrap();
        assert_eq!(day_two.sales, 0);
        assert_eq!(day_two.received.transfer, Money::from_cents(1000));

        let err = till.settle_sale(sale_id, PaymentMethod::Cash).unwrap_err();
        assert!(matches!(err, DispatchError::Conflict(_)), "{err:?}");
    }

    #[test]
    fn removed_customer_blocks_checkout() {
        let (till, _) = till();
        let bread = product(&till, "Bread", ProductKind::Unit, 250, 10);
        let ana = till
            .register_customer(NewCustomer {
                name: "Ana".into(),
                ..NewCustomer::default()
            })
            .unwrap();
        let session = SessionId::new();
        till.add_to_cart(session, bread, 1).unwrap();
        till.set_cart_customer(session, Some(ana.id)).unwrap();

        till.remove_customer(ana.id).unwrap();
        let err = till.checkout(session, PaymentMethod::Cash).unwrap_err();

        assert!(matches!(err, DispatchError::NotFound(_)), "{err:?}");
        assert_eq!(till.product(bread).unwrap().stock, 10);
    }

    #[test]
    fn customer_updates_merge_contact_fields() {
        let (till, _) = till();
        let ana = till
            .register_customer(NewCustomer {
                name: "Ana".into(),
                phone: Some("555-0101".into()),
                email: Some("ana@example.com".into()),
                notes: None,
            })
            .unwrap();

        let updated = till
            .update_customer(
                ana.id,
                CustomerChanges {
                    phone: Some(String::new()),
                    ..CustomerChanges::default()
                },
            )
            .unwrap();

        assert_eq!(updated.contact.phone, None);
        assert_eq!(updated.contact.email.as_deref(), Some("ana@example.com"));
    }

    #[test]
    fn cash_closing_compares_against_recorded_payments() {
        let (till, clock) = till();
        let bread = product(&till, "Bread", ProductKind::Unit, 500, 10);
        let session = SessionId::new();
        till.add_to_cart(session, bread, 2).unwrap();
        till.checkout(session, PaymentMethod::Cash).unwrap();
        till.add_to_cart(session, bread, 1).unwrap();
        till.checkout(session, PaymentMethod::Debit).unwrap();

        clock.set(at(16, 19));
        let closing = till
            .close_cash(CashCount {
                opening_float: Money::from_cents(10_000),
                reported: MethodTotals {
                    cash: Money::from_cents(10_900),
                    debit: Money::from_cents(500),
                    ..MethodTotals::default()
                },
                ..CashCount::default()
            })
            .unwrap();

        assert_eq!(closing.expected.cash, Money::from_cents(11_000));
        assert_eq!(closing.expected.debit, Money::from_cents(500));
        assert_eq!(closing.total_difference(), Money::from_cents(-100));
        assert_eq!(closing.status(), ClosingStatus::Shortfall);

        let err = till.close_cash(CashCount::default()).unwrap_err();
        assert!(matches!(err, DispatchError::Conflict(_)), "{err:?}");
        assert_eq!(till.closing(at(16, 0).date()).unwrap(), closing);
        assert!(matches!(
            till.closing(at(15, 0).date()),
            Err(DispatchError::NotFound(_))
        ));
    }

    #[test]
    fn monthly_export_replaces_the_month() {
        let (till, clock) = till();
        let bread = product(&till, "Bread", ProductKind::Unit, 1000, 10);
        let session = SessionId::new();
        till.add_to_cart(session, bread, 3).unwrap();
        till.checkout(session, PaymentMethod::Credit).unwrap();
        till.record_expense(NewExpense {
            date: None,
            category: ExpenseCategory::Fixed,
            description: "Rent".into(),
            amount: Money::from_cents(1200),
        })
        .unwrap();

        let october = Month::new(2026, 10).unwrap();
        let first = till.export_monthly(Some(october)).unwrap();
        assert_eq!(first.gross, Money::from_cents(3000));
        assert_eq!(first.net, Money::from_cents(1800));
        assert_eq!(first.top_product.as_deref(), Some("Bread"));

        clock.set(at(31, 20));
        till.record_expense(NewExpense {
            date: None,
            category: ExpenseCategory::Variable,
            description: "Bags".into(),
            amount: Money::from_cents(300),
        })
        .unwrap();
        let second = till.export_monthly(None).unwrap();

        assert_eq!(second.net, Money::from_cents(1500));
        let exported = till.exported_reports().unwrap();
        assert_eq!(exported.len(), 1);
        assert_eq!(exported[0], second);
        assert_eq!(till.expenses(Some(october)).unwrap().len(), 2);
    }

    #[test]
    fn inventory_reports_follow_the_catalog() {
        let (till, _) = till();
        let till = till.with_low_stock_threshold(5);
        product(&till, "Bread", ProductKind::Unit, 250, 3);
        product(&till, "Milk", ProductKind::Unit, 400, 60);

        assert_eq!(till.low_stock(None).unwrap().len(), 1);
        assert_eq!(till.low_stock(Some(100)).unwrap().len(), 2);
        assert_eq!(till.tags().unwrap(), vec!["Bread".to_string(), "Milk".to_string()]);
        assert_eq!(till.shelves().unwrap().len(), 3);
        assert_eq!(till.performance().unwrap().len(), 2);
    }

    #[test]
    fn committed_events_reach_the_activity_log() {
        let dir = tempfile::tempdir().unwrap();
        let (till, _) = till();
        let log = Arc::new(ActivityLog::new(dir.path().join("activity.log")));
        let worker = spawn_activity_logger(till.bus(), Arc::clone(&log)).unwrap();

        let bread = product(&till, "Bread", ProductKind::Unit, 250, 10);
        till.restock_product(bread, 5).unwrap();
        let _ = till.restock_product(ProductId::new(99), 5).unwrap_err();
        worker.shutdown();

        let lines = log.tail(10).unwrap();
        assert_eq!(lines.len(), 2, "{lines:?}");
        assert!(lines[0].starts_with("[2026-10-16 09:00:00] "));
        assert!(lines[0].contains("Bread"));
    }

    #[test]
    fn workbooks_survive_a_restart() {
        let dir = tempfile::tempdir().unwrap();
        let session = SessionId::new();
        {
            let (till, _) = till_with(Stores::workbooks(dir.path()));
            let bread = product(&till, "Bread", ProductKind::Unit, 250, 10);
            till.add_to_cart(session, bread, 3).unwrap();
            till.checkout(session, PaymentMethod::Cash).unwrap();
        }

        let (till, clock) = till_with(Stores::workbooks(dir.path()));
        assert_eq!(till.products().unwrap()[0].stock, 7);
        assert_eq!(till.sales_today().unwrap().len(), 1);

        clock.set(at(17, 8));
        assert!(till.sales_today().unwrap().is_empty());
        assert_eq!(till.sales_on(at(16, 0).date()).unwrap().len(), 1);
    }
}
