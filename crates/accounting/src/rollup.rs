use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use counterpos_core::Money;
use counterpos_products::{ProductId, ProductKind};
use counterpos_sales::{MethodTotals, SaleRecord};

use crate::cash::CashClosing;
use crate::expenses::{ExpenseCategory, ExpenseRecord};
use crate::month::Month;

/// How many products the ranking keeps.
pub const TOP_PRODUCTS: usize = 5;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KindTotal {
    pub kind: ProductKind,
    pub sales: usize,
    pub total: Money,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductRevenue {
    pub product_id: ProductId,
    pub name: String,
    pub sales: usize,
    pub revenue: Money,
}

/// Read model: the month's sales, receipts, expenses and closings.
///
/// Sales count by sale date; receipts by `paid_on`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonthlyRollup {
    pub month: Month,
    pub sales: usize,
    pub orders: usize,
    pub gross: Money,
    pub received: MethodTotals,
    pub received_total: Money,
    /// Sold this month on account and still unpaid.
    pub pending: Money,
    pub by_kind: Vec<KindTotal>,
    pub top_products: Vec<ProductRevenue>,
    pub fixed_expenses: Money,
    pub variable_expenses: Money,
    pub total_expenses: Money,
    /// `received_total - total_expenses`.
    pub net: Money,
    pub closings: usize,
    pub closing_difference: Money,
}

impl MonthlyRollup {
    pub fn compute<'a>(
        month: Month,
        sales: impl IntoIterator<Item = &'a SaleRecord>,
        expenses: impl IntoIterator<Item = &'a ExpenseRecord>,
        closings: impl IntoIterator<Item = &'a CashClosing>,
    ) -> Self {
        let mut count = 0;
        let mut orders = BTreeSet::new();
        let mut gross = Money::ZERO;
        let mut pending = Money::ZERO;
        let mut received = MethodTotals::default();
        let mut kinds: BTreeMap<&'static str, KindTotal> = BTreeMap::new();
        let mut products: BTreeMap<ProductId, ProductRevenue> = BTreeMap::new();

        for row in sales {
            if row.paid_on.is_some_and(|d| month.contains(d)) {
                received.add(row.payment_method, row.total);
            }
            if !month.contains(row.date) {
                continue;
            }

            count += 1;
            orders.insert(row.order_id);
            gross = gross + row.total;
            if !row.is_paid() {
                pending = pending + row.total;
            }

            let kind = kinds.entry(row.kind.as_str()).or_insert(KindTotal {
                kind: row.kind,
                sales: 0,
                total: Money::ZERO,
            });
            kind.sales += 1;
            kind.total = kind.total + row.total;

            let product = products
                .entry(row.product_id)
                .or_insert_with(|| ProductRevenue {
                    product_id: row.product_id,
                    name: row.product_name.clone(),
                    sales: 0,
                    revenue: Money::ZERO,
                });
            product.sales += 1;
            product.revenue = product.revenue + row.total;
        }

        let by_kind = [ProductKind::Unit, ProductKind::Weight, ProductKind::Lot]
            .into_iter()
            .map(|k| {
                kinds.remove(k.as_str()).unwrap_or(KindTotal {
                    kind: k,
                    sales: 0,
                    total: Money::ZERO,
                })
            })
            .collect();

        let mut top_products: Vec<ProductRevenue> = products.into_values().collect();
        top_products.sort_by(|a, b| {
            b.revenue
                .cmp(&a.revenue)
                .then_with(|| a.product_id.cmp(&b.product_id))
        });
        top_products.truncate(TOP_PRODUCTS);

        let mut fixed_expenses = Money::ZERO;
        let mut variable_expenses = Money::ZERO;
        for e in expenses.into_iter().filter(|e| month.contains(e.date)) {
            match e.category {
                ExpenseCategory::Fixed => fixed_expenses = fixed_expenses + e.amount,
                ExpenseCategory::Variable => variable_expenses = variable_expenses + e.amount,
            }
        }
        let total_expenses = fixed_expenses + variable_expenses;

        let mut closing_count = 0;
        let mut closing_difference = Money::ZERO;
        for c in closings.into_iter().filter(|c| month.contains(c.date)) {
            closing_count += 1;
            closing_difference = closing_difference + c.total_difference();
        }

        let received_total = received.total();
        MonthlyRollup {
            month,
            sales: count,
            orders: orders.len(),
            gross,
            received,
            received_total,
            pending,
            by_kind,
            top_products,
            fixed_expenses,
            variable_expenses,
            total_expenses,
            net: received_total - total_expenses,
            closings: closing_count,
            closing_difference,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, NaiveTime};
    use counterpos_sales::{OrderId, PaymentMethod, SaleId, WALK_IN};
    use proptest::prelude::*;

    use crate::expenses::ExpenseId;

    fn date(m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, m, d).unwrap()
    }

    fn sale(
        id: u32,
        product: u32,
        kind: ProductKind,
        sold: NaiveDate,
        cents: i64,
        method: PaymentMethod,
        paid_on: Option<NaiveDate>,
    ) -> SaleRecord {
        SaleRecord {
            sale_id: SaleId::new(id),
            order_id: OrderId::new(id),
            date: sold,
            time: NaiveTime::from_hms_opt(12, 0, 0).unwrap(),
            customer_id: None,
            customer_name: WALK_IN.into(),
            product_id: ProductId::new(product),
            product_name: format!("P{product}"),
            kind,
            quantity: 1,
            unit_price: Money::from_cents(cents),
            total: Money::from_cents(cents),
            payment_method: method,
            paid_on,
        }
    }

    fn expense(id: u32, on: NaiveDate, category: ExpenseCategory, cents: i64) -> ExpenseRecord {
        ExpenseRecord {
            id: ExpenseId::new(id),
            date: on,
            category,
            description: format!("E{id}"),
            amount: Money::from_cents(cents),
        }
    }

    #[test]
    fn rolls_up_a_month() {
        let october = Month::new(2026, 10).unwrap();
        let sales = vec![
            // Sold in September, settled in October: received, not gross.
            sale(1, 1, ProductKind::Unit, date(9, 30), 400, PaymentMethod::Cash, Some(date(10, 1))),
            sale(2, 1, ProductKind::Unit, date(10, 2), 1_000, PaymentMethod::Cash, Some(date(10, 2))),
            sale(3, 2, ProductKind::Weight, date(10, 2), 2_500, PaymentMethod::Debit, Some(date(10, 2))),
            sale(4, 3, ProductKind::Lot, date(10, 5), 1_800, PaymentMethod::OnAccount, None),
            sale(5, 2, ProductKind::Weight, date(11, 1), 9_999, PaymentMethod::Cash, Some(date(11, 1))),
        ];
        let expenses = vec![
            expense(1, date(10, 1), ExpenseCategory::Fixed, 1_000),
            expense(2, date(10, 9), ExpenseCategory::Variable, 300),
            expense(3, date(9, 9), ExpenseCategory::Variable, 5_000),
        ];

        let rollup = MonthlyRollup::compute(october, &sales, &expenses, &[]);

        assert_eq!(rollup.sales, 3);
        assert_eq!(rollup.orders, 3);
        assert_eq!(rollup.gross, Money::from_cents(5_300));
        assert_eq!(rollup.received.cash, Money::from_cents(1_400));
        assert_eq!(rollup.received.debit, Money::from_cents(2_500));
        assert_eq!(rollup.received_total, Money::from_cents(3_900));
        assert_eq!(rollup.pending, Money::from_cents(1_800));
        assert_eq!(rollup.total_expenses, Money::from_cents(1_300));
        assert_eq!(rollup.net, Money::from_cents(2_600));

        let kinds: Vec<(ProductKind, i64)> = rollup
            .by_kind
            .iter()
            .map(|k| (k.kind, k.total.cents()))
            .collect();
        assert_eq!(
            kinds,
            vec![
                (ProductKind::Unit, 1_000),
                (ProductKind::Weight, 2_500),
                (ProductKind::Lot, 1_800)
            ]
        );
        let top: Vec<u32> = rollup.top_products.iter().map(|p| p.product_id.get()).collect();
        assert_eq!(top, vec![2, 3, 1]);
    }

    #[test]
    fn top_products_keep_five() {
        let sales: Vec<SaleRecord> = (1..=8)
            .map(|i| sale(i, i, ProductKind::Unit, date(10, 3), i64::from(i) * 100, PaymentMethod::Cash, Some(date(10, 3))))
            .collect();

        let rollup = MonthlyRollup::compute(Month::new(2026, 10).unwrap(), &sales, &[], &[]);
        let top: Vec<u32> = rollup.top_products.iter().map(|p| p.product_id.get()).collect();
        assert_eq!(top, vec![8, 7, 6, 5, 4]);
    }

    proptest! {
        #![proptest_config(ProptestConfig {
            cases: 128,
            ..ProptestConfig::default()
        })]

        /// With every sale paid (or left pending) in its own month, gross splits
        /// exactly into product types and into received plus pending.
        #[test]
        fn kind_totals_add_up_to_gross(
            rows in prop::collection::vec((0u8..3, 1i64..100_000, 0u8..5, 1u32..28), 0..40)
        ) {
            let kinds = [ProductKind::Unit, ProductKind::Weight, ProductKind::Lot];
            let sales: Vec<SaleRecord> = rows
                .iter()
                .enumerate()
                .map(|(i, &(k, cents, m, d))| {
                    let method = [
                        PaymentMethod::Cash,
                        PaymentMethod::Debit,
                        PaymentMethod::Credit,
                        PaymentMethod::Transfer,
                        PaymentMethod::OnAccount,
                    ][m as usize];
                    let sold = date(10, d);
                    let paid_on = method.is_paid().then_some(sold);
                    sale(i as u32 + 1, i as u32 % 7 + 1, kinds[k as usize], sold, cents, method, paid_on)
                })
                .collect();

            let rollup = MonthlyRollup::compute(Month::new(2026, 10).unwrap(), &sales, &[], &[]);

            let by_kind: Money = rollup.by_kind.iter().map(|k| k.total).sum();
            prop_assert_eq!(by_kind, rollup.gross);
            prop_assert_eq!(rollup.received_total + rollup.pending, rollup.gross);
            prop_assert!(rollup.top_products.len() <= TOP_PRODUCTS);
        }
    }
}
