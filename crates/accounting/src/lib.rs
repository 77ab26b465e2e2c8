//! Accounting module: expenses, daily cash closing, the monthly rollup and
//! its exported reports.
//!
//! Pure domain logic only: no IO, no HTTP, no persistence concerns.

pub mod cash;
pub mod expenses;
pub mod month;
pub mod reports;
pub mod rollup;

pub use cash::{
    CashBook, CashBookCommand, CashBookEvent, CashClosed, CashClosing, CloseCash, ClosingStatus,
    expected_totals,
};
pub use expenses::{
    ExpenseBook, ExpenseBookCommand, ExpenseBookEvent, ExpenseCategory, ExpenseId,
    ExpenseRecord, ExpenseRecorded, ExpenseRemoved, RecordExpense, RemoveExpense,
};
pub use month::Month;
pub use reports::{
    ExportReport, MonthlyReport, ReportBook, ReportBookCommand, ReportBookEvent, ReportExported,
};
pub use rollup::{KindTotal, MonthlyRollup, ProductRevenue, TOP_PRODUCTS};
