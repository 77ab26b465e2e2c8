use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use counterpos_core::{Aggregate, AggregateRoot, DomainError, Money};
use counterpos_events::Event;
use counterpos_products::ProductKind;
use counterpos_sales::MethodTotals;

use crate::month::Month;
use crate::rollup::MonthlyRollup;

static REPORT_BOOK_ID: &str = "accounting.reports";

/// Flat snapshot of a monthly rollup, as archived in the reports workbook.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonthlyReport {
    pub month: Month,
    pub sales: usize,
    pub orders: usize,
    pub gross: Money,
    pub received: MethodTotals,
    pub pending: Money,
    pub unit_total: Money,
    pub weight_total: Money,
    pub lot_total: Money,
    pub top_product: Option<String>,
    pub fixed_expenses: Money,
    pub variable_expenses: Money,
    pub net: Money,
    pub closings: usize,
    pub closing_difference: Money,
    pub exported_at: NaiveDateTime,
}

impl MonthlyReport {
    pub fn from_rollup(rollup: &MonthlyRollup, exported_at: NaiveDateTime) -> Self {
        let kind_total = |kind: ProductKind| {
            rollup
                .by_kind
                .iter()
                .find(|k| k.kind == kind)
                .map_or(Money::ZERO, |k| k.total)
        };

        Self {
            month: rollup.month,
            sales: rollup.sales,
            orders: rollup.orders,
            gross: rollup.gross,
            received: rollup.received,
            pending: rollup.pending,
            unit_total: kind_total(ProductKind::Unit),
            weight_total: kind_total(ProductKind::Weight),
            lot_total: kind_total(ProductKind::Lot),
            top_product: rollup.top_products.first().map(|p| p.name.clone()),
            fixed_expenses: rollup.fixed_expenses,
            variable_expenses: rollup.variable_expenses,
            net: rollup.net,
            closings: rollup.closings,
            closing_difference: rollup.closing_difference,
            exported_at,
        }
    }

    pub fn total_expenses(&self) -> Money {
        self.fixed_expenses + self.variable_expenses
    }
}

/// Aggregate root: the archive of exported monthly reports, one per month.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ReportBook {
    reports: Vec<MonthlyReport>,
    version: u64,
}

impl ReportBook {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_reports(mut reports: Vec<MonthlyReport>) -> Self {
        reports.sort_by_key(|r| r.month);
        Self {
            reports,
            version: 0,
        }
    }

    pub fn reports(&self) -> &[MonthlyReport] {
        &self.reports
    }

    pub fn get(&self, month: Month) -> Option<&MonthlyReport> {
        self.reports.iter().find(|r| r.month == month)
    }
}

impl AggregateRoot for ReportBook {
    type Id = &'static str;

    fn id(&self) -> &Self::Id {
        &REPORT_BOOK_ID
    }

    fn version(&self) -> u64 {
        self.version
    }
}

/// Command: ExportReport. Replaces any earlier export of the same month.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportReport {
    pub report: MonthlyReport,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReportBookCommand {
    ExportReport(ExportReport),
}

/// Event: ReportExported.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportExported {
    pub report: MonthlyReport,
    pub replaced: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReportBookEvent {
    ReportExported(ReportExported),
}

impl Event for ReportBookEvent {
    fn event_type(&self) -> &'static str {
        match self {
            ReportBookEvent::ReportExported(_) => "accounting.report.exported",
        }
    }

    fn version(&self) -> u32 {
        1
    }

    fn occurred_at(&self) -> NaiveDateTime {
        match self {
            ReportBookEvent::ReportExported(e) => e.report.exported_at,
        }
    }

    fn summary(&self) -> String {
        match self {
            ReportBookEvent::ReportExported(e) => format!(
                "{} monthly report {} (net {})",
                if e.replaced { "Re-exported" } else { "Exported" },
                e.report.month,
                e.report.net
            ),
        }
    }
}

impl Aggregate for ReportBook {
    type Command = ReportBookCommand;
    type Event = ReportBookEvent;
    type Error = DomainError;

    fn apply(&mut self, event: &Self::Event) {
        match event {
            ReportBookEvent::ReportExported(e) => {
                self.reports.retain(|r| r.month != e.report.month);
                self.reports.push(e.report.clone());
                self.reports.sort_by_key(|r| r.month);
            }
        }

        self.version += 1;
    }

    fn handle(&self, command: &Self::Command) -> Result<Vec<Self::Event>, Self::Error> {
        match command {
            ReportBookCommand::ExportReport(cmd) => Ok(vec![ReportBookEvent::ReportExported(
                ReportExported {
                    report: cmd.report.clone(),
                    replaced: self.get(cmd.report.month).is_some(),
                },
            )]),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use counterpos_events::execute;

    fn export(month: u32, day: u32) -> ReportBookCommand {
        let month = Month::new(2026, month).unwrap();
        let rollup = MonthlyRollup::compute(month, &[], &[], &[]);
        ReportBookCommand::ExportReport(ExportReport {
            report: MonthlyReport::from_rollup(
                &rollup,
                NaiveDate::from_ymd_opt(2026, 11, day)
                    .unwrap()
                    .and_hms_opt(8, 0, 0)
                    .unwrap(),
            ),
        })
    }

    #[test]
    fn re_export_replaces_the_month() {
        let mut book = ReportBook::new();
        execute(&mut book, &export(10, 1)).unwrap();
        execute(&mut book, &export(9, 1)).unwrap();
        let events = execute(&mut book, &export(10, 2)).unwrap();

        let ReportBookEvent::ReportExported(e) = &events[0];
        assert!(e.replaced);
        assert_eq!(book.reports().len(), 2);
        assert_eq!(book.reports()[0].month, Month::new(2026, 9).unwrap());
        assert_eq!(
            book.get(Month::new(2026, 10).unwrap()).unwrap().exported_at.date(),
            NaiveDate::from_ymd_opt(2026, 11, 2).unwrap()
        );
    }

    #[test]
    fn empty_month_has_no_top_product() {
        let ReportBookCommand::ExportReport(cmd) = export(10, 1);
        assert!(cmd.report.top_product.is_none());
        assert_eq!(cmd.report.total_expenses(), Money::ZERO);
    }
}
