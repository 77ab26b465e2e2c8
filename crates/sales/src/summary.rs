use std::collections::BTreeSet;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use counterpos_core::Money;

use crate::sale::{PaymentMethod, SaleRecord};

/// Amounts per paid method.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MethodTotals {
    pub cash: Money,
    pub debit: Money,
    pub credit: Money,
    pub transfer: Money,
}

impl MethodTotals {
    /// Amount for `method`; always zero for `on_account`.
    pub fn get(&self, method: PaymentMethod) -> Money {
        match method {
            PaymentMethod::Cash => self.cash,
            PaymentMethod::Debit => self.debit,
            PaymentMethod::Credit => self.credit,
            PaymentMethod::Transfer => self.transfer,
            PaymentMethod::OnAccount => Money::ZERO,
        }
    }

    /// Adds `amount` under `method`. `on_account` amounts are ignored.
    pub fn add(&mut self, method: PaymentMethod, amount: Money) {
        let slot = match method {
            PaymentMethod::Cash => &mut self.cash,
            PaymentMethod::Debit => &mut self.debit,
            PaymentMethod::Credit => &mut self.credit,
            PaymentMethod::Transfer => &mut self.transfer,
            PaymentMethod::OnAccount => return,
        };
        *slot = *slot + amount;
    }

    pub fn total(&self) -> Money {
        self.cash + self.debit + self.credit + self.transfer
    }

    pub fn iter(&self) -> impl Iterator<Item = (PaymentMethod, Money)> + '_ {
        PaymentMethod::PAID.into_iter().map(|m| (m, self.get(m)))
    }

    /// Per-method `self - other`.
    pub fn difference(&self, other: &MethodTotals) -> MethodTotals {
        MethodTotals {
            cash: self.cash - other.cash,
            debit: self.debit - other.debit,
            credit: self.credit - other.credit,
            transfer: self.transfer - other.transfer,
        }
    }

    pub fn any_negative(&self) -> bool {
        self.iter().any(|(_, m)| m.is_negative())
    }
}

/// One business day of sales, as shown at the counter and used by cash closing.
///
/// Sales are attributed by sale date; receipts by `paid_on`, so a tab settled
/// today counts as received today even though it was sold earlier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailySummary {
    pub date: NaiveDate,
    pub sales: usize,
    pub orders: usize,
    pub gross: Money,
    /// On-account amounts sold on `date` that are still unpaid.
    pub pending: Money,
    pub received: MethodTotals,
}

impl DailySummary {
    pub fn for_date<'a>(rows: impl IntoIterator<Item = &'a SaleRecord>, date: NaiveDate) -> Self {
        let mut summary = DailySummary {
            date,
            sales: 0,
            orders: 0,
            gross: Money::ZERO,
            pending: Money::ZERO,
            received: MethodTotals::default(),
        };
        let mut orders = BTreeSet::new();

        for row in rows {
            if row.date == date {
                summary.sales += 1;
                orders.insert(row.order_id);
                summary.gross = summary.gross + row.total;
                if !row.is_paid() {
                    summary.pending = summary.pending + row.total;
                }
            }
            if row.paid_on == Some(date) {
                summary.received.add(row.payment_method, row.total);
            }
        }

        summary.orders = orders.len();
        summary
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveTime;
    use counterpos_products::{ProductId, ProductKind};

    use crate::sale::{OrderId, SaleId, WALK_IN};

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, d).unwrap()
    }

    fn row(
        sale: u32,
        order: u32,
        date: NaiveDate,
        total: i64,
        method: PaymentMethod,
        paid_on: Option<NaiveDate>,
    ) -> SaleRecord {
        SaleRecord {
            sale_id: SaleId::new(sale),
            order_id: OrderId::new(order),
            date,
            time: NaiveTime::from_hms_opt(10, 0, 0).unwrap(),
            customer_id: None,
            customer_name: WALK_IN.into(),
            product_id: ProductId::new(1),
            product_name: "P1".into(),
            kind: ProductKind::Unit,
            quantity: 1,
            unit_price: Money::from_cents(total),
            total: Money::from_cents(total),
            payment_method: method,
            paid_on,
        }
    }

    #[test]
    fn summarizes_sales_and_receipts_of_a_day() {
        let rows = vec![
            row(1, 1, day(15), 900, PaymentMethod::Debit, Some(day(16))),
            row(2, 2, day(16), 1000, PaymentMethod::Cash, Some(day(16))),
            row(3, 2, day(16), 500, PaymentMethod::Cash, Some(day(16))),
            row(4, 3, day(16), 700, PaymentMethod::OnAccount, None),
            row(5, 4, day(16), 300, PaymentMethod::Transfer, Some(day(16))),
        ];

        let summary = DailySummary::for_date(&rows, day(16));

        assert_eq!(summary.sales, 4);
        assert_eq!(summary.orders, 3);
        assert_eq!(summary.gross, Money::from_cents(2500));
        assert_eq!(summary.pending, Money::from_cents(700));
        assert_eq!(summary.received.cash, Money::from_cents(1500));
        assert_eq!(summary.received.debit, Money::from_cents(900));
        assert_eq!(summary.received.transfer, Money::from_cents(300));
        assert_eq!(summary.received.total(), Money::from_cents(2700));
    }

    #[test]
    fn method_totals_ignore_on_account_and_diff_per_method() {
        let mut reported = MethodTotals::default();
        reported.add(PaymentMethod::Cash, Money::from_cents(1000));
        reported.add(PaymentMethod::OnAccount, Money::from_cents(999));

        let mut expected = MethodTotals::default();
        expected.add(PaymentMethod::Cash, Money::from_cents(1200));

        let diff = reported.difference(&expected);
        assert_eq!(diff.cash, Money::from_cents(-200));
        assert_eq!(reported.total(), Money::from_cents(1000));
        assert!(diff.any_negative());
    }
}
