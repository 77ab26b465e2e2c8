use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use counterpos_core::{Aggregate, AggregateRoot, DomainError, Money};
use counterpos_events::Event;
use counterpos_sales::{DailySummary, MethodTotals};

static CASH_BOOK_ID: &str = "accounting.cash";

/// Outcome of a closing, from the total difference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClosingStatus {
    Balanced,
    Surplus,
    Shortfall,
}

impl ClosingStatus {
    pub fn from_difference(difference: Money) -> Self {
        if difference.is_positive() {
            ClosingStatus::Surplus
        } else if difference.is_negative() {
            ClosingStatus::Shortfall
        } else {
            ClosingStatus::Balanced
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ClosingStatus::Balanced => "balanced",
            ClosingStatus::Surplus => "surplus",
            ClosingStatus::Shortfall => "shortfall",
        }
    }
}

/// The end-of-day reconciliation of one business date.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CashClosing {
    pub date: NaiveDate,
    pub opening_float: Money,
    /// Cash includes the opening float.
    pub expected: MethodTotals,
    pub reported: MethodTotals,
    pub notes: Option<String>,
    pub closed_at: NaiveDateTime,
}

impl CashClosing {
    /// Per method `reported - expected`.
    pub fn difference(&self) -> MethodTotals {
        self.reported.difference(&self.expected)
    }

    pub fn total_difference(&self) -> Money {
        self.difference().total()
    }

    pub fn status(&self) -> ClosingStatus {
        ClosingStatus::from_difference(self.total_difference())
    }
}

/// What the drawer and terminals should show at close: the opening float
/// plus cash received, and every other method as received.
pub fn expected_totals(opening_float: Money, day: &DailySummary) -> MethodTotals {
    MethodTotals {
        cash: opening_float + day.received.cash,
        ..day.received
    }
}

/// Aggregate root: the cash closings sheet.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CashBook {
    closings: Vec<CashClosing>,
    version: u64,
}

impl CashBook {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_closings(mut closings: Vec<CashClosing>) -> Self {
        closings.sort_by_key(|c| c.date);
        Self {
            closings,
            version: 0,
        }
    }

    /// Closings by date.
    pub fn closings(&self) -> &[CashClosing] {
        &self.closings
    }

    pub fn get(&self, date: NaiveDate) -> Option<&CashClosing> {
        self.closings.iter().find(|c| c.date == date)
    }
}

impl AggregateRoot for CashBook {
    type Id = &'static str;

    fn id(&self) -> &Self::Id {
        &CASH_BOOK_ID
    }

    fn version(&self) -> u64 {
        self.version
    }
}

/// Command: CloseCash.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CloseCash {
    pub date: NaiveDate,
    pub opening_float: Money,
    pub expected: MethodTotals,
    pub reported: MethodTotals,
    pub notes: Option<String>,
    pub closed_at: NaiveDateTime,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum CashBookCommand {
    CloseCash(CloseCash),
}

/// Event: CashClosed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CashClosed {
    pub closing: CashClosing,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum CashBookEvent {
    CashClosed(CashClosed),
}

impl Event for CashBookEvent {
    fn event_type(&self) -> &'static str {
        match self {
            CashBookEvent::CashClosed(_) => "accounting.cash.closed",
        }
    }

    fn version(&self) -> u32 {
        1
    }

    fn occurred_at(&self) -> NaiveDateTime {
        match self {
            CashBookEvent::CashClosed(e) => e.closing.closed_at,
        }
    }

    fn summary(&self) -> String {
        match self {
            CashBookEvent::CashClosed(e) => format!(
                "Closed cash for {}: {} (difference {})",
                e.closing.date,
                e.closing.status().as_str(),
                e.closing.total_difference()
            ),
        }
    }
}

impl Aggregate for CashBook {
    type Command = CashBookCommand;
    type Event = CashBookEvent;
    type Error = DomainError;

    fn apply(&mut self, event: &Self::Event) {
        match event {
            CashBookEvent::CashClosed(e) => {
                self.closings.push(e.closing.clone());
                self.closings.sort_by_key(|c| c.date);
            }
        }

        self.version += 1;
    }

    fn handle(&self, command: &Self::Command) -> Result<Vec<Self::Event>, Self::Error> {
        match command {
            CashBookCommand::CloseCash(cmd) => self.handle_close(cmd),
        }
    }
}

impl CashBook {
    fn handle_close(&self, cmd: &CloseCash) -> Result<Vec<CashBookEvent>, DomainError> {
        if cmd.date > cmd.closed_at.date() {
            return Err(DomainError::validation(format!(
                "cannot close a future date ({})",
                cmd.date
            )));
        }
        if self.get(cmd.date).is_some() {
            return Err(DomainError::conflict(format!(
                "cash for {} is already closed",
                cmd.date
            )));
        }
        if cmd.opening_float.is_negative() {
            return Err(DomainError::validation("opening float cannot be negative"));
        }
        if cmd.reported.any_negative() {
            return Err(DomainError::validation("reported amounts cannot be negative"));
        }

        let notes = cmd
            .notes
            .as_deref()
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .map(str::to_string);

        Ok(vec![CashBookEvent::CashClosed(CashClosed {
            closing: CashClosing {
                date: cmd.date,
                opening_float: cmd.opening_float,
                expected: cmd.expected,
                reported: cmd.reported,
                notes,
                closed_at: cmd.closed_at,
            },
        })])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use counterpos_events::execute;
    use counterpos_sales::PaymentMethod;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, d).unwrap()
    }

    fn totals(cash: i64, debit: i64) -> MethodTotals {
        MethodTotals {
            cash: Money::from_cents(cash),
            debit: Money::from_cents(debit),
            ..MethodTotals::default()
        }
    }

    fn close(d: u32, expected: MethodTotals, reported: MethodTotals) -> CashBookCommand {
        CashBookCommand::CloseCash(CloseCash {
            date: day(d),
            opening_float: Money::from_cents(10_000),
            expected,
            reported,
            notes: Some("  ".into()),
            closed_at: day(16).and_hms_opt(19, 0, 0).unwrap(),
        })
    }

    #[test]
    fn expected_cash_includes_the_opening_float() {
        let mut received = MethodTotals::default();
        received.add(PaymentMethod::Cash, Money::from_cents(4_500));
        received.add(PaymentMethod::Credit, Money::from_cents(2_000));
        let summary = DailySummary {
            date: day(16),
            sales: 3,
            orders: 2,
            gross: Money::from_cents(6_500),
            pending: Money::ZERO,
            received,
        };

        let expected = expected_totals(Money::from_cents(10_000), &summary);
        assert_eq!(expected.cash, Money::from_cents(14_500));
        assert_eq!(expected.credit, Money::from_cents(2_000));
    }

    #[test]
    fn closing_reports_differences_and_status() {
        let mut book = CashBook::new();
        execute(&mut book, &close(16, totals(14_500, 900), totals(14_000, 900))).unwrap();

        let closing = book.get(day(16)).unwrap();
        assert_eq!(closing.difference().cash, Money::from_cents(-500));
        assert_eq!(closing.status(), ClosingStatus::Shortfall);
        assert!(closing.notes.is_none());

        let balanced = CashClosing {
            reported: closing.expected,
            ..closing.clone()
        };
        assert_eq!(balanced.status(), ClosingStatus::Balanced);
        let surplus = CashClosing {
            reported: totals(15_000, 900),
            ..closing.clone()
        };
        assert_eq!(surplus.status(), ClosingStatus::Surplus);
    }

    #[test]
    fn one_closing_per_date() {
        let mut book = CashBook::new();
        execute(&mut book, &close(15, totals(0, 0), totals(0, 0))).unwrap();

        let err = book.handle(&close(15, totals(0, 0), totals(0, 0))).unwrap_err();
        assert!(matches!(err, DomainError::Conflict(_)));
    }

    #[test]
    fn rejects_future_dates_and_negative_reports() {
        let book = CashBook::new();

        let err = book.handle(&close(17, totals(0, 0), totals(0, 0))).unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));

        let err = book.handle(&close(16, totals(0, 0), totals(-1, 0))).unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }
}
