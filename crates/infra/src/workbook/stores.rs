//! One store per workbook file.

use std::path::{Path, PathBuf};

use counterpos_accounting::{CashBook, ExpenseBook, ReportBook};
use counterpos_parties::CustomerDirectory;
use counterpos_products::Catalog;
use counterpos_sales::SalesLedger;

use super::{Sheet, read_rows, write_workbook};
use crate::store::{AggregateStore, StoreError};

pub const PRODUCTS_FILE: &str = "products.xlsx";
pub const CUSTOMERS_FILE: &str = "customers.xlsx";
pub const SALES_FILE: &str = "sales.xlsx";
pub const EXPENSES_FILE: &str = "expenses.xlsx";
pub const CASH_FILE: &str = "cash.xlsx";
pub const REPORTS_FILE: &str = "reports.xlsx";

/// `products.xlsx`, sheet `Products`.
#[derive(Debug, Clone)]
pub struct CatalogWorkbook {
    path: PathBuf,
}

impl CatalogWorkbook {
    pub const SHEET: &'static str = "Products";

    pub fn in_dir(dir: &Path) -> Self {
        Self {
            path: dir.join(PRODUCTS_FILE),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl AggregateStore<Catalog> for CatalogWorkbook {
    fn load(&self) -> Result<Catalog, StoreError> {
        Ok(Catalog::from_products(read_rows(&self.path, Self::SHEET)?))
    }

    fn save(&self, catalog: &Catalog) -> Result<(), StoreError> {
        write_workbook(&self.path, &[Sheet::of(Self::SHEET, catalog.products())])
    }
}

/// `customers.xlsx`, sheet `Customers`.
#[derive(Debug, Clone)]
pub struct CustomerWorkbook {
    path: PathBuf,
}

impl CustomerWorkbook {
    pub const SHEET: &'static str = "Customers";

    pub fn in_dir(dir: &Path) -> Self {
        Self {
            path: dir.join(CUSTOMERS_FILE),
        }
    }
}

impl AggregateStore<CustomerDirectory> for CustomerWorkbook {
    fn load(&self) -> Result<CustomerDirectory, StoreError> {
        Ok(CustomerDirectory::from_customers(read_rows(
            &self.path,
            Self::SHEET,
        )?))
    }

    fn save(&self, directory: &CustomerDirectory) -> Result<(), StoreError> {
        write_workbook(
            &self.path,
            &[Sheet::of(Self::SHEET, directory.customers())],
        )
    }
}

/// `sales.xlsx`: the working day in `Ledger`, everything older in `History`.
#[derive(Debug, Clone)]
pub struct SalesWorkbook {
    path: PathBuf,
}

impl SalesWorkbook {
    pub const LEDGER_SHEET: &'static str = "Ledger";
    pub const HISTORY_SHEET: &'static str = "History";

    pub fn in_dir(dir: &Path) -> Self {
        Self {
            path: dir.join(SALES_FILE),
        }
    }
}

impl AggregateStore<SalesLedger> for SalesWorkbook {
    fn load(&self) -> Result<SalesLedger, StoreError> {
        let today = read_rows(&self.path, Self::LEDGER_SHEET)?;
        let history = read_rows(&self.path, Self::HISTORY_SHEET)?;
        Ok(SalesLedger::from_rows(today, history))
    }

    fn save(&self, ledger: &SalesLedger) -> Result<(), StoreError> {
        write_workbook(
            &self.path,
            &[
                Sheet::of(Self::LEDGER_SHEET, ledger.today()),
                Sheet::of(Self::HISTORY_SHEET, ledger.history()),
            ],
        )
    }
}

/// `expenses.xlsx`, sheet `Expenses`.
#[derive(Debug, Clone)]
pub struct ExpenseWorkbook {
    path: PathBuf,
}

impl ExpenseWorkbook {
    pub const SHEET: &'static str = "Expenses";

    pub fn in_dir(dir: &Path) -> Self {
        Self {
            path: dir.join(EXPENSES_FILE),
        }
    }
}

impl AggregateStore<ExpenseBook> for ExpenseWorkbook {
    fn load(&self) -> Result<ExpenseBook, StoreError> {
        Ok(ExpenseBook::from_expenses(read_rows(&self.path, Self::SHEET)?))
    }

    fn save(&self, book: &ExpenseBook) -> Result<(), StoreError> {
        write_workbook(&self.path, &[Sheet::of(Self::SHEET, book.expenses())])
    }
}

/// `cash.xlsx`, sheet `Closings`.
#[derive(Debug, Clone)]
pub struct CashWorkbook {
    path: PathBuf,
}

impl CashWorkbook {
    pub const SHEET: &'static str = "Closings";

    pub fn in_dir(dir: &Path) -> Self {
        Self {
            path: dir.join(CASH_FILE),
        }
    }
}

impl AggregateStore<CashBook> for CashWorkbook {
    fn load(&self) -> Result<CashBook, StoreError> {
        Ok(CashBook::from_closings(read_rows(&self.path, Self::SHEET)?))
    }

    fn save(&self, book: &CashBook) -> Result<(), StoreError> {
        write_workbook(&self.path, &[Sheet::of(Self::SHEET, book.closings())])
    }
}

/// `reports.xlsx`, sheet `Monthly`.
#[derive(Debug, Clone)]
pub struct ReportWorkbook {
    path: PathBuf,
}

impl ReportWorkbook {
    pub const SHEET: &'static str = "Monthly";

    pub fn in_dir(dir: &Path) -> Self {
        Self {
            path: dir.join(REPORTS_FILE),
        }
    }
}

impl AggregateStore<ReportBook> for ReportWorkbook {
    fn load(&self) -> Result<ReportBook, StoreError> {
        Ok(ReportBook::from_reports(read_rows(&self.path, Self::SHEET)?))
    }

    fn save(&self, book: &ReportBook) -> Result<(), StoreError> {
        write_workbook(&self.path, &[Sheet::of(Self::SHEET, book.reports())])
    }
}
