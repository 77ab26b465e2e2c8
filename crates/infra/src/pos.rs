//! The till: every operation the HTTP surface exposes, wired to the
//! workbooks through the command dispatcher.
//!
//! Every ledger access rolls the working day over first, so the `Ledger`
//! sheet never holds more than one business day.

use std::path::Path;
use std::sync::Arc;

use chrono::{NaiveDate, NaiveDateTime};
use serde::Serialize;
use tracing::info;

use counterpos_accounting::{
    CashBook, CashBookCommand, CashClosing, CloseCash, ExpenseBook, ExpenseBookCommand,
    ExpenseBookEvent, ExpenseCategory, ExpenseId, ExpenseRecord, ExportReport, Month,
    MonthlyReport, MonthlyRollup, RecordExpense, RemoveExpense, ReportBook, ReportBookCommand,
    expected_totals,
};
use counterpos_core::{Money, SessionId};
use counterpos_events::EventBus;
use counterpos_inventory::{
    ProductPerformance, ShelfSlot, low_stock, performance, shelf_matrix, tag_cloud,
};
use counterpos_parties::{
    ContactInfo, Customer, CustomerDirectory, CustomerId, DirectoryCommand, DirectoryEvent,
    RegisterCustomer, RemoveCustomer, UpdateCustomer,
};
use counterpos_products::{
    Catalog, CatalogCommand, CatalogEvent, Product, ProductId, ProductKind, RegisterProduct,
    RemoveProduct, RestockProduct, UpdateProduct, WithdrawStock,
};
use counterpos_sales::{
    Cart, CustomerRef, DailySummary, LedgerCommand, LedgerEvent, MethodTotals, OrderId,
    OrderLine, PaymentMethod, RecordOrder, RollOver, SaleId, SaleRecord, SalesLedger, SettleSale,
};

use crate::carts::CartRegistry;
use crate::clock::Clock;
use crate::command_dispatcher::{CommandDispatcher, DispatchError, Envelope, UnitOfWork};
use crate::config::DEFAULT_LOW_STOCK_THRESHOLD;
use crate::store::{AggregateStore, InMemoryAggregateStore};
use crate::workbook::{
    CashWorkbook, CatalogWorkbook, CustomerWorkbook, ExpenseWorkbook, ReportWorkbook,
    SalesWorkbook,
};

pub const CATALOG: &str = "products.catalog";
pub const CUSTOMERS: &str = "parties.customers";
pub const LEDGER: &str = "sales.ledger";
pub const EXPENSES: &str = "accounting.expenses";
pub const CASH: &str = "accounting.cash";
pub const REPORTS: &str = "accounting.reports";

/// One store per aggregate.
#[derive(Clone)]
pub struct Stores {
    pub catalog: Arc<dyn AggregateStore<Catalog>>,
    pub customers: Arc<dyn AggregateStore<CustomerDirectory>>,
    pub sales: Arc<dyn AggregateStore<SalesLedger>>,
    pub expenses: Arc<dyn AggregateStore<ExpenseBook>>,
    pub cash: Arc<dyn AggregateStore<CashBook>>,
    pub reports: Arc<dyn AggregateStore<ReportBook>>,
}

impl Stores {
    /// The xlsx workbooks under `dir`.
    pub fn workbooks(dir: &Path) -> Self {
        Self {
            catalog: Arc::new(CatalogWorkbook::in_dir(dir)),
            customers: Arc::new(CustomerWorkbook::in_dir(dir)),
            sales: Arc::new(SalesWorkbook::in_dir(dir)),
            expenses: Arc::new(ExpenseWorkbook::in_dir(dir)),
            cash: Arc::new(CashWorkbook::in_dir(dir)),
            reports: Arc::new(ReportWorkbook::in_dir(dir)),
        }
    }

    /// Empty in-memory stores.
    pub fn in_memory() -> Self {
        Self {
            catalog: Arc::new(InMemoryAggregateStore::new(Catalog::new())),
            customers: Arc::new(InMemoryAggregateStore::new(CustomerDirectory::new())),
            sales: Arc::new(InMemoryAggregateStore::new(SalesLedger::new())),
            expenses: Arc::new(InMemoryAggregateStore::new(ExpenseBook::new())),
            cash: Arc::new(InMemoryAggregateStore::new(CashBook::new())),
            reports: Arc::new(InMemoryAggregateStore::new(ReportBook::new())),
        }
    }
}

impl core::fmt::Debug for Stores {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Stores").finish_non_exhaustive()
    }
}

#[derive(Debug, Clone)]
pub struct NewProduct {
    pub name: String,
    pub kind: ProductKind,
    pub price: Money,
    pub stock: u32,
}

/// Fields left `None` keep their value.
#[derive(Debug, Clone, Default)]
pub struct ProductChanges {
    pub name: Option<String>,
    pub kind: Option<ProductKind>,
    pub price: Option<Money>,
}

#[derive(Debug, Clone, Default)]
pub struct NewCustomer {
    pub name: String,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub notes: Option<String>,
}

/// Fields left `None` keep their value; a blank string clears an optional one.
#[derive(Debug, Clone, Default)]
pub struct CustomerChanges {
    pub name: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone)]
pub struct NewExpense {
    /// Defaults to today.
    pub date: Option<NaiveDate>,
    pub category: ExpenseCategory,
    pub description: String,
    pub amount: Money,
}

/// What the cashier counted at the end of the day.
#[derive(Debug, Clone, Default)]
pub struct CashCount {
    /// Defaults to today.
    pub date: Option<NaiveDate>,
    pub opening_float: Money,
    pub reported: MethodTotals,
    pub notes: Option<String>,
}

/// Result of a checkout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Receipt {
    pub order_id: OrderId,
    pub customer_name: String,
    pub payment_method: PaymentMethod,
    pub lines: Vec<SaleRecord>,
    pub total: Money,
    pub recorded_at: NaiveDateTime,
}

/// The point-of-sale service.
pub struct PointOfSale<B> {
    dispatcher: CommandDispatcher<B>,
    stores: Stores,
    carts: CartRegistry,
    clock: Arc<dyn Clock>,
    low_stock_threshold: u32,
}

impl<B> core::fmt::Debug for PointOfSale<B> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("PointOfSale")
            .field("stores", &self.stores)
            .field("clock", &self.clock)
            .field("low_stock_threshold", &self.low_stock_threshold)
            .finish_non_exhaustive()
    }
}

impl<B> PointOfSale<B>
where
    B: EventBus<Envelope>,
{
    pub fn new(bus: B, stores: Stores, clock: Arc<dyn Clock>) -> Self {
        Self {
            dispatcher: CommandDispatcher::new(bus),
            stores,
            carts: CartRegistry::new(),
            clock,
            low_stock_threshold: DEFAULT_LOW_STOCK_THRESHOLD,
        }
    }

    pub fn with_low_stock_threshold(mut self, threshold: u32) -> Self {
        self.low_stock_threshold = threshold;
        self
    }

    pub fn bus(&self) -> &B {
        self.dispatcher.bus()
    }

    pub fn clock(&self) -> &dyn Clock {
        self.clock.as_ref()
    }

    // ---- products -------------------------------------------------------

    pub fn register_product(&self, new: NewProduct) -> Result<Product, DispatchError> {
        let cmd = CatalogCommand::RegisterProduct(RegisterProduct {
            name: new.name,
            kind: new.kind,
            price: new.price,
            stock: new.stock,
            occurred_at: self.clock.now(),
        });
        let (_, events) = self
            .dispatcher
            .dispatch::<Catalog, _>(&*self.stores.catalog, CATALOG, &cmd)?;
        events
            .into_iter()
            .find_map(|e| match e {
                CatalogEvent::ProductRegistered(e) => Some(e.product),
                _ => None,
            })
            .ok_or_else(|| DispatchError::InvariantViolation("no product was registered".into()))
    }

    pub fn update_product(
        &self,
        product_id: ProductId,
        changes: ProductChanges,
    ) -> Result<Product, DispatchError> {
        let cmd = CatalogCommand::UpdateProduct(UpdateProduct {
            product_id,
            name: changes.name,
            kind: changes.kind,
            price: changes.price,
            occurred_at: self.clock.now(),
        });
        let (catalog, _) = self
            .dispatcher
            .dispatch::<Catalog, _>(&*self.stores.catalog, CATALOG, &cmd)?;
        product_in(&catalog, product_id)
    }

    pub fn restock_product(
        &self,
        product_id: ProductId,
        quantity: u32,
    ) -> Result<Product, DispatchError> {
        let cmd = CatalogCommand::RestockProduct(RestockProduct {
            product_id,
            quantity,
            occurred_at: self.clock.now(),
        });
        let (catalog, _) = self
            .dispatcher
            .dispatch::<Catalog, _>(&*self.stores.catalog, CATALOG, &cmd)?;
        product_in(&catalog, product_id)
    }

    /// Returns the removed product.
    pub fn remove_product(&self, product_id: ProductId) -> Result<Product, DispatchError> {
        let mut uow = self.dispatcher.begin()?;
        let mut catalog: Catalog = uow.load(&*self.stores.catalog)?;
        let removed = product_in(&catalog, product_id)?;
        uow.execute(
            &mut catalog,
            CATALOG,
            &CatalogCommand::RemoveProduct(RemoveProduct {
                product_id,
                occurred_at: self.clock.now(),
            }),
        )?;
        uow.stage(&*self.stores.catalog, catalog);
        uow.commit()?;
        Ok(removed)
    }

    pub fn products(&self) -> Result<Vec<Product>, DispatchError> {
        Ok(self.catalog()?.products().to_vec())
    }

    pub fn product(&self, product_id: ProductId) -> Result<Product, DispatchError> {
        product_in(&self.catalog()?, product_id)
    }

    fn catalog(&self) -> Result<Catalog, DispatchError> {
        self.dispatcher.read(&*self.stores.catalog)
    }

    // ---- customers ------------------------------------------------------

    pub fn register_customer(&self, new: NewCustomer) -> Result<Customer, DispatchError> {
        let cmd = DirectoryCommand::RegisterCustomer(RegisterCustomer {
            name: new.name,
            contact: Some(ContactInfo {
                phone: new.phone,
                email: new.email,
            }),
            notes: new.notes,
            occurred_at: self.clock.now(),
        });
        let (_, events) = self
            .dispatcher
            .dispatch::<CustomerDirectory, _>(&*self.stores.customers, CUSTOMERS, &cmd)?;
        events
            .into_iter()
            .find_map(|e| match e {
                DirectoryEvent::CustomerRegistered(e) => Some(e.customer),
                _ => None,
            })
            .ok_or_else(|| DispatchError::InvariantViolation("no customer was registered".into()))
    }

    pub fn update_customer(
        &self,
        customer_id: CustomerId,
        changes: CustomerChanges,
    ) -> Result<Customer, DispatchError> {
        let mut uow = self.dispatcher.begin()?;
        let mut directory: CustomerDirectory = uow.load(&*self.stores.customers)?;
        let current = customer_in(&directory, customer_id)?;

        let contact = (changes.phone.is_some() || changes.email.is_some()).then(|| ContactInfo {
            phone: changes.phone.or(current.contact.phone),
            email: changes.email.or(current.contact.email),
        });
        uow.execute(
            &mut directory,
            CUSTOMERS,
            &DirectoryCommand::UpdateCustomer(UpdateCustomer {
                customer_id,
                name: changes.name,
                contact,
                notes: changes.notes,
                occurred_at: self.clock.now(),
            }),
        )?;

        let updated = customer_in(&directory, customer_id)?;
        uow.stage(&*self.stores.customers, directory);
        uow.commit()?;
        Ok(updated)
    }

    /// Returns the removed customer. Past sales keep the customer's name.
    pub fn remove_customer(&self, customer_id: CustomerId) -> Result<Customer, DispatchError> {
        let mut uow = self.dispatcher.begin()?;
        let mut directory: CustomerDirectory = uow.load(&*self.stores.customers)?;
        let removed = customer_in(&directory, customer_id)?;
        uow.execute(
            &mut directory,
            CUSTOMERS,
            &DirectoryCommand::RemoveCustomer(RemoveCustomer {
                customer_id,
                occurred_at: self.clock.now(),
            }),
        )?;
        uow.stage(&*self.stores.customers, directory);
        uow.commit()?;
        Ok(removed)
    }

    pub fn customers(&self) -> Result<Vec<Customer>, DispatchError> {
        let directory: CustomerDirectory = self.dispatcher.read(&*self.stores.customers)?;
        Ok(directory.customers().to_vec())
    }

    pub fn customer(&self, customer_id: CustomerId) -> Result<Customer, DispatchError> {
        let directory: CustomerDirectory = self.dispatcher.read(&*self.stores.customers)?;
        customer_in(&directory, customer_id)
    }

    // ---- cart -----------------------------------------------------------

    pub fn cart(&self, session: SessionId) -> Result<Cart, DispatchError> {
        self.carts.get(session)
    }

    pub fn add_to_cart(
        &self,
        session: SessionId,
        product_id: ProductId,
        quantity: u32,
    ) -> Result<Cart, DispatchError> {
        let product = self.product(product_id)?;
        self.carts.update(session, |cart| {
            cart.add(&product, quantity)?;
            Ok(cart.clone())
        })
    }

    pub fn remove_from_cart(
        &self,
        session: SessionId,
        product_id: ProductId,
    ) -> Result<Cart, DispatchError> {
        self.carts.update(session, |cart| {
            cart.remove(product_id)?;
            Ok(cart.clone())
        })
    }

    pub fn clear_cart(&self, session: SessionId) -> Result<(), DispatchError> {
        self.carts.clear(session)
    }

    /// Attach a customer to the cart, or detach with `None`.
    pub fn set_cart_customer(
        &self,
        session: SessionId,
        customer_id: Option<CustomerId>,
    ) -> Result<Cart, DispatchError> {
        let customer = customer_id
            .map(|id| self.customer(id).map(|c| customer_ref(&c)))
            .transpose()?;
        self.carts.update(session, |cart| {
            cart.set_customer(customer);
            Ok(cart.clone())
        })
    }

    /// Turn the session's cart into an order.
    ///
    /// Stock withdrawal and the ledger rows are decided together and written
    /// together; the cart is cleared only after both workbooks were saved.
    pub fn checkout(
        &self,
        session: SessionId,
        payment_method: PaymentMethod,
    ) -> Result<Receipt, DispatchError> {
        let mut uow = self.dispatcher.begin()?;
        let cart = self.carts.get(session)?;
        if cart.is_empty() {
            return Err(DispatchError::Validation("the cart is empty".into()));
        }
        let now = self.clock.now();

        let mut catalog: Catalog = uow.load(&*self.stores.catalog)?;
        let directory: CustomerDirectory = uow.load(&*self.stores.customers)?;

        let customer = cart
            .customer()
            .map(|c| customer_in(&directory, c.id).map(|c| customer_ref(&c)))
            .transpose()?;

        let mut lines = Vec::with_capacity(cart.items().len());
        for item in cart.items() {
            let product = product_in(&catalog, item.product_id)?;
            if product.kind != item.kind {
                return Err(DispatchError::Conflict(format!(
                    "'{}' changed type since it was added to the cart",
                    product.name
                )));
            }
            lines.push(OrderLine {
                product_id: product.id,
                product_name: product.name,
                kind: product.kind,
                quantity: item.quantity,
                unit_price: product.price,
            });
        }

        let (mut ledger, _) = self.rolled_ledger(&mut uow, now)?;
        uow.execute(
            &mut catalog,
            CATALOG,
            &CatalogCommand::WithdrawStock(WithdrawStock {
                lines: cart.stock_lines(),
                occurred_at: now,
            }),
        )?;
        let events = uow.execute(
            &mut ledger,
            LEDGER,
            &LedgerCommand::RecordOrder(RecordOrder {
                customer,
                lines,
                payment_method,
                occurred_at: now,
            }),
        )?;
        let recorded = events
            .into_iter()
            .find_map(|e| match e {
                LedgerEvent::OrderRecorded(e) => Some(e),
                _ => None,
            })
            .ok_or_else(|| DispatchError::InvariantViolation("no order was recorded".into()))?;

        uow.stage(&*self.stores.catalog, catalog);
        uow.stage(&*self.stores.sales, ledger);
        // The cart is read and cleared under the write lock, so a second
        // checkout of the same session finds it empty.
        uow.commit_then(|| self.carts.clear(session))?;

        let total = recorded.total();
        info!(
            order_id = %recorded.order_id,
            lines = recorded.records.len(),
            total = %total,
            "checkout completed"
        );

        Ok(Receipt {
            order_id: recorded.order_id,
            customer_name: recorded
                .records
                .first()
                .map(|r| r.customer_name.clone())
                .unwrap_or_default(),
            payment_method,
            lines: recorded.records,
            total,
            recorded_at: now,
        })
    }

    // ---- sales ----------------------------------------------------------

    /// Load the ledger inside `uow` and roll it over to `now`'s date.
    ///
    /// The flag tells whether the rollover moved rows (the ledger must then
    /// be staged even if nothing else changes it).
    fn rolled_ledger(
        &self,
        uow: &mut UnitOfWork<'_, B>,
        now: NaiveDateTime,
    ) -> Result<(SalesLedger, bool), DispatchError> {
        let mut ledger: SalesLedger = uow.load(&*self.stores.sales)?;
        let archived = uow.execute(
            &mut ledger,
            LEDGER,
            &LedgerCommand::RollOver(RollOver {
                today: now.date(),
                occurred_at: now,
            }),
        )?;
        Ok((ledger, !archived.is_empty()))
    }

    /// The ledger after rollover, persisted when the rollover moved rows.
    fn ledger(&self) -> Result<SalesLedger, DispatchError> {
        let now = self.clock.now();
        let (ledger, _) = self.dispatcher.dispatch::<SalesLedger, _>(
            &*self.stores.sales,
            LEDGER,
            &LedgerCommand::RollOver(RollOver {
                today: now.date(),
                occurred_at: now,
            }),
        )?;
        Ok(ledger)
    }

    /// Rows of the working ledger (today's sales).
    pub fn sales_today(&self) -> Result<Vec<SaleRecord>, DispatchError> {
        Ok(self.ledger()?.today().to_vec())
    }

    /// Rows sold on `date`, from the ledger or the history.
    pub fn sales_on(&self, date: NaiveDate) -> Result<Vec<SaleRecord>, DispatchError> {
        Ok(self.ledger()?.sold_on(date).into_iter().cloned().collect())
    }

    /// Summary of `date` (default today).
    pub fn daily_summary(&self, date: Option<NaiveDate>) -> Result<DailySummary, DispatchError> {
        let date = date.unwrap_or_else(|| self.clock.today());
        Ok(DailySummary::for_date(self.ledger()?.all(), date))
    }

    /// Pay off an on-account sale.
    pub fn settle_sale(
        &self,
        sale_id: SaleId,
        payment_method: PaymentMethod,
    ) -> Result<SaleRecord, DispatchError> {
        let now = self.clock.now();
        let mut uow = self.dispatcher.begin()?;
        let (mut ledger, _) = self.rolled_ledger(&mut uow, now)?;
        uow.execute(
            &mut ledger,
            LEDGER,
            &LedgerCommand::SettleSale(SettleSale {
                sale_id,
                payment_method,
                occurred_at: now,
            }),
        )?;

        let settled = ledger
            .find(sale_id)
            .cloned()
            .ok_or_else(|| DispatchError::NotFound(format!("sale {sale_id}")))?;
        uow.stage(&*self.stores.sales, ledger);
        uow.commit()?;
        Ok(settled)
    }

    // ---- cash -----------------------------------------------------------

    /// Close the cash for a day. Expected amounts come from that day's
    /// recorded payments.
    pub fn close_cash(&self, count: CashCount) -> Result<CashClosing, DispatchError> {
        let now = self.clock.now();
        let date = count.date.unwrap_or(now.date());

        let mut uow = self.dispatcher.begin()?;
        let (ledger, rolled) = self.rolled_ledger(&mut uow, now)?;
        let summary = DailySummary::for_date(ledger.all(), date);

        let mut book: CashBook = uow.load(&*self.stores.cash)?;
        uow.execute(
            &mut book,
            CASH,
            &CashBookCommand::CloseCash(CloseCash {
                date,
                opening_float: count.opening_float,
                expected: expected_totals(count.opening_float, &summary),
                reported: count.reported,
                notes: count.notes,
                closed_at: now,
            }),
        )?;

        let closing = book
            .get(date)
            .cloned()
            .ok_or_else(|| DispatchError::NotFound(format!("closing for {date}")))?;
        if rolled {
            uow.stage(&*self.stores.sales, ledger);
        }
        uow.stage(&*self.stores.cash, book);
        uow.commit()?;

        info!(
            date = %date,
            status = closing.status().as_str(),
            difference = %closing.total_difference(),
            "cash closed"
        );
        Ok(closing)
    }

    pub fn closings(&self) -> Result<Vec<CashClosing>, DispatchError> {
        let book: CashBook = self.dispatcher.read(&*self.stores.cash)?;
        Ok(book.closings().to_vec())
    }

    pub fn closing(&self, date: NaiveDate) -> Result<CashClosing, DispatchError> {
        let book: CashBook = self.dispatcher.read(&*self.stores.cash)?;
        book.get(date)
            .cloned()
            .ok_or_else(|| DispatchError::NotFound(format!("closing for {date}")))
    }

    // ---- expenses -------------------------------------------------------

    pub fn record_expense(&self, new: NewExpense) -> Result<ExpenseRecord, DispatchError> {
        let now = self.clock.now();
        let cmd = ExpenseBookCommand::RecordExpense(RecordExpense {
            date: new.date.unwrap_or(now.date()),
            category: new.category,
            description: new.description,
            amount: new.amount,
            occurred_at: now,
        });
        let (_, events) = self
            .dispatcher
            .dispatch::<ExpenseBook, _>(&*self.stores.expenses, EXPENSES, &cmd)?;
        events
            .into_iter()
            .find_map(|e| match e {
                ExpenseBookEvent::ExpenseRecorded(e) => Some(e.expense),
                _ => None,
            })
            .ok_or_else(|| DispatchError::InvariantViolation("no expense was recorded".into()))
    }

    /// Expenses of `month`, or all of them.
    pub fn expenses(&self, month: Option<Month>) -> Result<Vec<ExpenseRecord>, DispatchError> {
        let book: ExpenseBook = self.dispatcher.read(&*self.stores.expenses)?;
        Ok(match month {
            Some(month) => book.in_month(month).into_iter().cloned().collect(),
            None => book.expenses().to_vec(),
        })
    }

    /// Returns the removed expense.
    pub fn remove_expense(&self, expense_id: ExpenseId) -> Result<ExpenseRecord, DispatchError> {
        let mut uow = self.dispatcher.begin()?;
        let mut book: ExpenseBook = uow.load(&*self.stores.expenses)?;
        let removed = book
            .get(expense_id)
            .cloned()
            .ok_or_else(|| DispatchError::NotFound(format!("expense {expense_id}")))?;
        uow.execute(
            &mut book,
            EXPENSES,
            &ExpenseBookCommand::RemoveExpense(RemoveExpense {
                expense_id,
                occurred_at: self.clock.now(),
            }),
        )?;
        uow.stage(&*self.stores.expenses, book);
        uow.commit()?;
        Ok(removed)
    }

    // ---- reports --------------------------------------------------------

    /// Rollup of `month` (default: the current month).
    pub fn monthly_rollup(&self, month: Option<Month>) -> Result<MonthlyRollup, DispatchError> {
        let month = month.unwrap_or_else(|| Month::of(self.clock.today()));
        let ledger = self.ledger()?;
        let expenses: ExpenseBook = self.dispatcher.read(&*self.stores.expenses)?;
        let cash: CashBook = self.dispatcher.read(&*self.stores.cash)?;
        Ok(MonthlyRollup::compute(
            month,
            ledger.all(),
            expenses.expenses(),
            cash.closings(),
        ))
    }

    /// Compute the rollup of `month` and archive it in the reports workbook.
    pub fn export_monthly(&self, month: Option<Month>) -> Result<MonthlyReport, DispatchError> {
        let now = self.clock.now();
        let month = month.unwrap_or_else(|| Month::of(now.date()));

        let mut uow = self.dispatcher.begin()?;
        let (ledger, rolled) = self.rolled_ledger(&mut uow, now)?;
        let expenses: ExpenseBook = uow.load(&*self.stores.expenses)?;
        let cash: CashBook = uow.load(&*self.stores.cash)?;
        let mut book: ReportBook = uow.load(&*self.stores.reports)?;

        let rollup =
            MonthlyRollup::compute(month, ledger.all(), expenses.expenses(), cash.closings());
        let report = MonthlyReport::from_rollup(&rollup, now);
        uow.execute(
            &mut book,
            REPORTS,
            &ReportBookCommand::ExportReport(ExportReport {
                report: report.clone(),
            }),
        )?;

        if rolled {
            uow.stage(&*self.stores.sales, ledger);
        }
        uow.stage(&*self.stores.reports, book);
        uow.commit()?;

        info!(month = %month, net = %report.net, "monthly report exported");
        Ok(report)
    }

    /// Every exported report, oldest month first.
    pub fn exported_reports(&self) -> Result<Vec<MonthlyReport>, DispatchError> {
        let book: ReportBook = self.dispatcher.read(&*self.stores.reports)?;
        Ok(book.reports().to_vec())
    }

    // ---- inventory ------------------------------------------------------

    pub fn performance(&self) -> Result<Vec<ProductPerformance>, DispatchError> {
        Ok(performance(self.catalog()?.products()))
    }

    pub fn shelves(&self) -> Result<Vec<Vec<ShelfSlot>>, DispatchError> {
        Ok(shelf_matrix(self.catalog()?.products()))
    }

    pub fn tags(&self) -> Result<Vec<String>, DispatchError> {
        Ok(tag_cloud(self.catalog()?.products()))
    }

    /// Products under `threshold` (default: the configured one), lowest first.
    pub fn low_stock(
        &self,
        threshold: Option<u32>,
    ) -> Result<Vec<ProductPerformance>, DispatchError> {
        let threshold = threshold.unwrap_or(self.low_stock_threshold);
        Ok(low_stock(self.catalog()?.products(), threshold))
    }
}

fn product_in(catalog: &Catalog, product_id: ProductId) -> Result<Product, DispatchError> {
    catalog
        .get(product_id)
        .cloned()
        .ok_or_else(|| DispatchError::NotFound(format!("product {product_id}")))
}

fn customer_in(
    directory: &CustomerDirectory,
    customer_id: CustomerId,
) -> Result<Customer, DispatchError> {
    directory
        .get(customer_id)
        .cloned()
        .ok_or_else(|| DispatchError::NotFound(format!("customer {customer_id}")))
}

fn customer_ref(customer: &Customer) -> CustomerRef {
    CustomerRef {
        id: customer.id,
        name: customer.name.clone(),
    }
}
