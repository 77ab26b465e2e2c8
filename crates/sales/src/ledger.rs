use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use counterpos_core::{Aggregate, AggregateRoot, DomainError, Money};
use counterpos_events::Event;
use counterpos_products::{ProductId, ProductKind};

use crate::sale::{CustomerRef, OrderId, PaymentMethod, SaleId, SaleRecord, WALK_IN};

static LEDGER_ID: &str = "sales.ledger";

/// Aggregate root: the sales workbook.
///
/// `today` is the working ledger and only ever holds rows of one business
/// day; older rows live in `history`. Sale and order ids are unique across
/// both.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SalesLedger {
    today: Vec<SaleRecord>,
    history: Vec<SaleRecord>,
    version: u64,
}

impl SalesLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild from the persisted ledger and history sheets.
    pub fn from_rows(today: Vec<SaleRecord>, history: Vec<SaleRecord>) -> Self {
        Self {
            today,
            history,
            version: 0,
        }
    }

    /// Rows of the working ledger.
    pub fn today(&self) -> &[SaleRecord] {
        &self.today
    }

    pub fn history(&self) -> &[SaleRecord] {
        &self.history
    }

    /// History first, then the working ledger.
    pub fn all(&self) -> impl Iterator<Item = &SaleRecord> {
        self.history.iter().chain(self.today.iter())
    }

    pub fn find(&self, sale_id: SaleId) -> Option<&SaleRecord> {
        self.all().find(|r| r.sale_id == sale_id)
    }

    /// Rows sold on `date`, wherever they are stored.
    pub fn sold_on(&self, date: NaiveDate) -> Vec<&SaleRecord> {
        self.all().filter(|r| r.date == date).collect()
    }

    /// Rows of one order, in line order.
    pub fn order(&self, order_id: OrderId) -> Vec<&SaleRecord> {
        self.all().filter(|r| r.order_id == order_id).collect()
    }

    pub fn next_sale_id(&self) -> Result<SaleId, DomainError> {
        SaleId::after(self.all().map(|r| r.sale_id).max())
    }

    pub fn next_order_id(&self) -> Result<OrderId, DomainError> {
        OrderId::after(self.all().map(|r| r.order_id).max())
    }

    fn get_mut(&mut self, sale_id: SaleId) -> Option<&mut SaleRecord> {
        self.history
            .iter_mut()
            .chain(self.today.iter_mut())
            .find(|r| r.sale_id == sale_id)
    }
}

impl AggregateRoot for SalesLedger {
    type Id = &'static str;

    fn id(&self) -> &Self::Id {
        &LEDGER_ID
    }

    fn version(&self) -> u64 {
        self.version
    }
}

/// Command: RollOver. Archive every working row dated before `today`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RollOver {
    pub today: NaiveDate,
    pub occurred_at: NaiveDateTime,
}

/// A priced line of an order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderLine {
    pub product_id: ProductId,
    pub product_name: String,
    pub kind: ProductKind,
    pub quantity: u32,
    pub unit_price: Money,
}

/// Command: RecordOrder (checkout of one cart).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordOrder {
    pub customer: Option<CustomerRef>,
    pub lines: Vec<OrderLine>,
    pub payment_method: PaymentMethod,
    pub occurred_at: NaiveDateTime,
}

/// Command: SettleSale. Pays off an on-account row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SettleSale {
    pub sale_id: SaleId,
    pub payment_method: PaymentMethod,
    pub occurred_at: NaiveDateTime,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum LedgerCommand {
    RollOver(RollOver),
    RecordOrder(RecordOrder),
    SettleSale(SettleSale),
}

/// Event: DayArchived. Rows dated before `before` moved to history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DayArchived {
    pub before: NaiveDate,
    pub rows: usize,
    pub occurred_at: NaiveDateTime,
}

/// Event: OrderRecorded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderRecorded {
    pub order_id: OrderId,
    pub records: Vec<SaleRecord>,
    pub occurred_at: NaiveDateTime,
}

impl OrderRecorded {
    pub fn total(&self) -> Money {
        self.records.iter().map(|r| r.total).sum()
    }
}

/// Event: SaleSettled.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaleSettled {
    pub sale_id: SaleId,
    pub customer_name: String,
    pub total: Money,
    pub payment_method: PaymentMethod,
    pub paid_on: NaiveDate,
    pub occurred_at: NaiveDateTime,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum LedgerEvent {
    DayArchived(DayArchived),
    OrderRecorded(OrderRecorded),
    SaleSettled(SaleSettled),
}

impl Event for LedgerEvent {
    fn event_type(&self) -> &'static str {
        match self {
            LedgerEvent::DayArchived(_) => "sales.ledger.archived",
            LedgerEvent::OrderRecorded(_) => "sales.order.recorded",
            LedgerEvent::SaleSettled(_) => "sales.sale.settled",
        }
    }

    fn version(&self) -> u32 {
        1
    }

    fn occurred_at(&self) -> NaiveDateTime {
        match self {
            LedgerEvent::DayArchived(e) => e.occurred_at,
            LedgerEvent::OrderRecorded(e) => e.occurred_at,
            LedgerEvent::SaleSettled(e) => e.occurred_at,
        }
    }

    fn summary(&self) -> String {
        match self {
            LedgerEvent::DayArchived(e) => format!(
                "Archived {} sale row(s) dated before {}",
                e.rows, e.before
            ),
            LedgerEvent::OrderRecorded(e) => {
                let (customer, method) = e
                    .records
                    .first()
                    .map(|r| (r.customer_name.as_str(), r.payment_method.as_str()))
                    .unwrap_or((WALK_IN, ""));
                format!(
                    "Recorded sale: order {} for {} ({} line(s), total {}, {})",
                    e.order_id,
                    customer,
                    e.records.len(),
                    e.total(),
                    method
                )
            }
            LedgerEvent::SaleSettled(e) => format!(
                "Settled sale {} for {} ({}, {})",
                e.sale_id, e.customer_name, e.total, e.payment_method
            ),
        }
    }
}

impl Aggregate for SalesLedger {
    type Command = LedgerCommand;
    type Event = LedgerEvent;
    type Error = DomainError;

    fn apply(&mut self, event: &Self::Event) {
        match event {
            LedgerEvent::DayArchived(e) => {
                let (archived, kept): (Vec<_>, Vec<_>) = std::mem::take(&mut self.today)
                    .into_iter()
                    .partition(|r| r.date < e.before);
                self.history.extend(archived);
                self.today = kept;
            }
            LedgerEvent::OrderRecorded(e) => {
                self.today.extend(e.records.iter().cloned());
            }
            LedgerEvent::SaleSettled(e) => {
                if let Some(r) = self.get_mut(e.sale_id) {
                    r.payment_method = e.payment_method;
                    r.paid_on = Some(e.paid_on);
                }
            }
        }

        self.version += 1;
    }

    fn handle(&self, command: &Self::Command) -> Result<Vec<Self::Event>, Self::Error> {
        match command {
            LedgerCommand::RollOver(cmd) => Ok(self.handle_roll_over(cmd)),
            LedgerCommand::RecordOrder(cmd) => self.handle_record_order(cmd),
            LedgerCommand::SettleSale(cmd) => self.handle_settle(cmd),
        }
    }
}

impl SalesLedger {
    fn handle_roll_over(&self, cmd: &RollOver) -> Vec<LedgerEvent> {
        let rows = self.today.iter().filter(|r| r.date < cmd.today).count();
        if rows == 0 {
            return vec![];
        }

        vec![LedgerEvent::DayArchived(DayArchived {
            before: cmd.today,
            rows,
            occurred_at: cmd.occurred_at,
        })]
    }

    fn handle_record_order(&self, cmd: &RecordOrder) -> Result<Vec<LedgerEvent>, DomainError> {
        if cmd.lines.is_empty() {
            return Err(DomainError::validation("an order needs at least one line"));
        }
        if cmd.payment_method == PaymentMethod::OnAccount && cmd.customer.is_none() {
            return Err(DomainError::validation(
                "on_account sales need a customer",
            ));
        }

        let date = cmd.occurred_at.date();
        if let Some(stale) = self.today.iter().find(|r| r.date != date) {
            return Err(DomainError::invariant(format!(
                "the working ledger still holds sales from {}; roll it over first",
                stale.date
            )));
        }

        let order_id = self.next_order_id()?;
        let mut next_sale_id = Some(self.next_sale_id()?);
        let paid_on = cmd.payment_method.is_paid().then_some(date);
        let (customer_id, customer_name) = match &cmd.customer {
            Some(c) => (Some(c.id), c.name.clone()),
            None => (None, WALK_IN.to_string()),
        };

        let mut records = Vec::with_capacity(cmd.lines.len());
        for line in &cmd.lines {
            if line.quantity == 0 {
                return Err(DomainError::validation(format!(
                    "quantity for '{}' must be positive",
                    line.product_name
                )));
            }
            if !line.unit_price.is_positive() {
                return Err(DomainError::validation(format!(
                    "price for '{}' must be positive",
                    line.product_name
                )));
            }
            let total = line
                .kind
                .line_total(line.unit_price, line.quantity)
                .ok_or_else(|| DomainError::validation("line total is too large"))?;

            let sale_id = next_sale_id
                .ok_or_else(|| DomainError::validation("no SaleId values are left"))?;
            records.push(SaleRecord {
                sale_id,
                order_id,
                date,
                time: cmd.occurred_at.time(),
                customer_id,
                customer_name: customer_name.clone(),
                product_id: line.product_id,
                product_name: line.product_name.clone(),
                kind: line.kind,
                quantity: line.quantity,
                unit_price: line.unit_price,
                total,
                payment_method: cmd.payment_method,
                paid_on,
            });
            next_sale_id = sale_id.next();
        }

        Ok(vec![LedgerEvent::OrderRecorded(OrderRecorded {
            order_id,
            records,
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_settle(&self, cmd: &SettleSale) -> Result<Vec<LedgerEvent>, DomainError> {
        let sale = self
            .find(cmd.sale_id)
            .ok_or_else(|| DomainError::not_found(format!("sale {}", cmd.sale_id)))?;

        if sale.is_paid() {
            return Err(DomainError::conflict(format!(
                "sale {} is already paid",
                sale.sale_id
            )));
        }
        if !cmd.payment_method.is_paid() {
            return Err(DomainError::validation(
                "a sale must be settled with cash, debit, credit or transfer",
            ));
        }

        Ok(vec![LedgerEvent::SaleSettled(SaleSettled {
            sale_id: sale.sale_id,
            customer_name: sale.customer_name.clone(),
            total: sale.total,
            payment_method: cmd.payment_method,
            paid_on: cmd.occurred_at.date(),
            occurred_at: cmd.occurred_at,
        })])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use counterpos_events::execute;
    use counterpos_parties::CustomerId;

    fn at(day: u32, hour: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 10, day)
            .unwrap()
            .and_hms_opt(hour, 0, 0)
            .unwrap()
    }

    fn line(id: u32, kind: ProductKind, quantity: u32, price: i64) -> OrderLine {
        OrderLine {
            product_id: ProductId::new(id),
            product_name: format!("P{id}"),
            kind,
            quantity,
            unit_price: Money::from_cents(price),
        }
    }

    fn ana() -> CustomerRef {
        CustomerRef {
            id: CustomerId::new(7),
            name: "Ana".into(),
        }
    }

    fn record(
        customer: Option<CustomerRef>,
        lines: Vec<OrderLine>,
        payment_method: PaymentMethod,
        occurred_at: NaiveDateTime,
    ) -> LedgerCommand {
        LedgerCommand::RecordOrder(RecordOrder {
            customer,
            lines,
            payment_method,
            occurred_at,
        })
    }

    fn roll_over(day: u32) -> LedgerCommand {
        LedgerCommand::RollOver(RollOver {
            today: at(day, 0).date(),
            occurred_at: at(day, 8),
        })
    }

    #[test]
    fn record_order_writes_one_row_per_line() {
        let mut ledger = SalesLedger::new();
        let cmd = record(
            None,
            vec![
                line(1, ProductKind::Unit, 3, 75),
                line(2, ProductKind::Weight, 500, 4990),
                line(3, ProductKind::Lot, 2, 60),
            ],
            PaymentMethod::Cash,
            at(16, 10),
        );

        let events = execute(&mut ledger, &cmd).unwrap();
        let LedgerEvent::OrderRecorded(recorded) = &events[0] else {
            panic!("expected OrderRecorded");
        };

        assert_eq!(recorded.order_id, OrderId::new(1));
        assert_eq!(ledger.today().len(), 3);
        let ids: Vec<u32> = ledger.today().iter().map(|r| r.sale_id.get()).collect();
        assert_eq!(ids, vec![1, 2, 3]);
        assert!(ledger.today().iter().all(|r| r.order_id == OrderId::new(1)));
        assert!(ledger.today().iter().all(|r| r.customer_name == WALK_IN));
        assert_eq!(ledger.today()[1].total, Money::from_cents(2495));
        assert_eq!(ledger.today()[2].total, Money::from_cents(3600));
        assert_eq!(recorded.total(), Money::from_cents(225 + 2495 + 3600));
        assert_eq!(ledger.today()[0].paid_on, Some(at(16, 0).date()));
    }

    #[test]
    fn rejects_empty_orders_and_anonymous_tabs() {
        let ledger = SalesLedger::new();

        let err = ledger
            .handle(&record(None, vec![], PaymentMethod::Cash, at(16, 10)))
            .unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));

        let err = ledger
            .handle(&record(
                None,
                vec![line(1, ProductKind::Unit, 1, 100)],
                PaymentMethod::OnAccount,
                at(16, 10),
            ))
            .unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[test]
    fn rejects_non_positive_lines() {
        let ledger = SalesLedger::new();
        for bad in [line(1, ProductKind::Unit, 0, 100), line(1, ProductKind::Unit, 1, 0)] {
            let err = ledger
                .handle(&record(None, vec![bad], PaymentMethod::Cash, at(16, 10)))
                .unwrap_err();
            assert!(matches!(err, DomainError::Validation(_)));
        }
    }

    #[test]
    fn on_account_rows_are_unpaid_until_settled() {
        let mut ledger = SalesLedger::new();
        execute(
            &mut ledger,
            &record(
                Some(ana()),
                vec![line(1, ProductKind::Unit, 2, 500)],
                PaymentMethod::OnAccount,
                at(15, 10),
            ),
        )
        .unwrap();

        let row = &ledger.today()[0];
        assert_eq!(row.customer_id, Some(CustomerId::new(7)));
        assert!(row.paid_on.is_none());

        execute(&mut ledger, &roll_over(16)).unwrap();
        assert!(ledger.today().is_empty());
        assert_eq!(ledger.history().len(), 1);

        let settle = LedgerCommand::SettleSale(SettleSale {
            sale_id: SaleId::new(1),
            payment_method: PaymentMethod::Debit,
            occurred_at: at(16, 11),
        });
        execute(&mut ledger, &settle).unwrap();

        let row = ledger.find(SaleId::new(1)).unwrap();
        assert_eq!(row.payment_method, PaymentMethod::Debit);
        assert_eq!(row.paid_on, Some(at(16, 0).date()));
        assert_eq!(row.date, at(15, 0).date());

        let err = ledger.handle(&settle).unwrap_err();
        assert!(matches!(err, DomainError::Conflict(_)));
    }

    #[test]
    fn settle_requires_a_paid_method_and_an_existing_sale() {
        let mut ledger = SalesLedger::new();
        execute(
            &mut ledger,
            &record(
                Some(ana()),
                vec![line(1, ProductKind::Unit, 1, 500)],
                PaymentMethod::OnAccount,
                at(16, 10),
            ),
        )
        .unwrap();

        let err = ledger
            .handle(&LedgerCommand::SettleSale(SettleSale {
                sale_id: SaleId::new(1),
                payment_method: PaymentMethod::OnAccount,
                occurred_at: at(16, 11),
            }))
            .unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));

        let err = ledger
            .handle(&LedgerCommand::SettleSale(SettleSale {
                sale_id: SaleId::new(99),
                payment_method: PaymentMethod::Cash,
                occurred_at: at(16, 11),
            }))
            .unwrap_err();
        assert!(matches!(err, DomainError::NotFound(_)));
    }

    #[test]
    fn roll_over_is_a_no_op_for_the_current_day() {
        let mut ledger = SalesLedger::new();
        execute(
            &mut ledger,
            &record(None, vec![line(1, ProductKind::Unit, 1, 100)], PaymentMethod::Cash, at(16, 9)),
        )
        .unwrap();

        assert!(ledger.handle(&roll_over(16)).unwrap().is_empty());
        assert_eq!(ledger.today().len(), 1);
    }

    #[test]
    fn recording_on_a_new_day_requires_roll_over() {
        let mut ledger = SalesLedger::new();
        execute(
            &mut ledger,
            &record(None, vec![line(1, ProductKind::Unit, 1, 100)], PaymentMethod::Cash, at(15, 9)),
        )
        .unwrap();

        let next_day = record(
            None,
            vec![line(1, ProductKind::Unit, 1, 100)],
            PaymentMethod::Cash,
            at(16, 9),
        );
        assert!(matches!(
            ledger.handle(&next_day),
            Err(DomainError::InvariantViolation(_))
        ));

        execute(&mut ledger, &roll_over(16)).unwrap();
        execute(&mut ledger, &next_day).unwrap();

        assert_eq!(ledger.today().len(), 1);
        assert_eq!(ledger.today()[0].sale_id, SaleId::new(2));
        assert_eq!(ledger.today()[0].order_id, OrderId::new(2));
        assert_eq!(ledger.sold_on(at(15, 0).date()).len(), 1);
    }

    mod proptest_tests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #![proptest_config(ProptestConfig { cases: 64, .. ProptestConfig::default() })]

            #[test]
            fn sale_ids_stay_unique_across_days(orders in proptest::collection::vec((1u32..4, 1usize..4), 1..12)) {
                let mut ledger = SalesLedger::new();
                for (day, lines) in orders.iter().scan(1u32, |day, &(step, lines)| {
                    *day += step % 2;
                    Some((*day, lines))
                }) {
                    execute(&mut ledger, &roll_over(day)).unwrap();
                    let lines = (0..lines)
                        .map(|i| line(i as u32 + 1, ProductKind::Unit, 1, 100))
                        .collect();
                    execute(&mut ledger, &record(None, lines, PaymentMethod::Cash, at(day, 12))).unwrap();
                }

                let mut ids: Vec<SaleId> = ledger.all().map(|r| r.sale_id).collect();
                let total = ids.len();
                ids.sort();
                ids.dedup();
                prop_assert_eq!(ids.len(), total);

                let newest = ledger.today().first().map(|r| r.date);
                prop_assert!(ledger.today().iter().all(|r| Some(r.date) == newest));
            }
        }
    }
}
