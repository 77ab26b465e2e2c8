//! Spreadsheet persistence.
//!
//! Each workbook is read with `calamine` and rewritten wholesale with
//! `rust_xlsxwriter`. Row 1 holds headers and cells are located by header
//! name, so columns may be reordered by hand. Writes go to a temporary file
//! in the target directory which is then renamed over the target.

pub mod rows;
pub mod stores;

use std::collections::HashMap;
use std::fs;
use std::io::Write;
use std::path::Path;

use calamine::{Data, Reader, Xlsx, open_workbook};
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use rust_xlsxwriter::{Format, Workbook, XlsxError};

use counterpos_core::Money;

use crate::store::StoreError;

pub use stores::{
    CASH_FILE, CUSTOMERS_FILE, CashWorkbook, CatalogWorkbook, CustomerWorkbook, EXPENSES_FILE,
    ExpenseWorkbook, PRODUCTS_FILE, REPORTS_FILE, ReportWorkbook, SALES_FILE, SalesWorkbook,
};

pub const DATE_FORMAT: &str = "%Y-%m-%d";
pub const TIME_FORMAT: &str = "%H:%M:%S";
pub const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// A value written to a sheet.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Empty,
    Text(String),
    Number(f64),
}

impl From<&str> for Cell {
    fn from(value: &str) -> Self {
        Cell::Text(value.to_string())
    }
}

impl From<String> for Cell {
    fn from(value: String) -> Self {
        Cell::Text(value)
    }
}

impl From<u32> for Cell {
    fn from(value: u32) -> Self {
        Cell::Number(f64::from(value))
    }
}

impl From<usize> for Cell {
    fn from(value: usize) -> Self {
        Cell::Number(value as f64)
    }
}

impl From<Money> for Cell {
    fn from(value: Money) -> Self {
        Cell::Number(value.to_decimal())
    }
}

impl From<NaiveDate> for Cell {
    fn from(value: NaiveDate) -> Self {
        Cell::Text(value.format(DATE_FORMAT).to_string())
    }
}

impl From<NaiveTime> for Cell {
    fn from(value: NaiveTime) -> Self {
        Cell::Text(value.format(TIME_FORMAT).to_string())
    }
}

impl From<NaiveDateTime> for Cell {
    fn from(value: NaiveDateTime) -> Self {
        Cell::Text(value.format(DATETIME_FORMAT).to_string())
    }
}

impl<T: Into<Cell>> From<Option<T>> for Cell {
    fn from(value: Option<T>) -> Self {
        value.map_or(Cell::Empty, Into::into)
    }
}

/// A record stored as one sheet row.
pub trait SheetRow: Sized {
    /// Column headers, in write order.
    const HEADERS: &'static [&'static str];

    /// Cells in `HEADERS` order.
    fn to_cells(&self) -> Vec<Cell>;

    fn from_row(row: &RowReader<'_>) -> Result<Self, String>;
}

static EMPTY: Data = Data::Empty;

/// Header-addressed view of one data row.
#[derive(Debug)]
pub struct RowReader<'a> {
    columns: &'a HashMap<String, usize>,
    cells: &'a [Data],
}

impl<'a> RowReader<'a> {
    pub fn new(columns: &'a HashMap<String, usize>, cells: &'a [Data]) -> Self {
        Self { columns, cells }
    }

    fn cell(&self, column: &str) -> Result<&Data, String> {
        let idx = self
            .columns
            .get(column)
            .ok_or_else(|| format!("missing column '{column}'"))?;
        Ok(self.cells.get(*idx).unwrap_or(&EMPTY))
    }

    /// Cell text, or `None` when blank or when the column is absent.
    pub fn opt_text(&self, column: &str) -> Result<Option<String>, String> {
        if !self.columns.contains_key(column) {
            return Ok(None);
        }
        let text = match self.cell(column)? {
            Data::Empty => return Ok(None),
            Data::String(s) | Data::DateTimeIso(s) | Data::DurationIso(s) => s.trim().to_string(),
            Data::Int(n) => n.to_string(),
            Data::Float(f) if f.fract() == 0.0 && f.abs() < 1e15 => format!("{}", *f as i64),
            Data::Float(f) => f.to_string(),
            Data::Bool(b) => b.to_string(),
            other => return Err(format!("column '{column}' holds an unsupported value ({other:?})")),
        };
        Ok(Some(text).filter(|t| !t.is_empty()))
    }

    pub fn text(&self, column: &str) -> Result<String, String> {
        self.cell(column)?;
        self.opt_text(column)?
            .ok_or_else(|| format!("column '{column}' is empty"))
    }

    pub fn opt_number(&self, column: &str) -> Result<Option<f64>, String> {
        if !self.columns.contains_key(column) {
            return Ok(None);
        }
        match self.cell(column)? {
            Data::Empty => Ok(None),
            Data::Int(n) => Ok(Some(*n as f64)),
            Data::Float(f) => Ok(Some(*f)),
            Data::String(s) if s.trim().is_empty() => Ok(None),
            Data::String(s) => s
                .trim()
                .replace(',', ".")
                .parse()
                .map(Some)
                .map_err(|_| format!("column '{column}' is not a number ('{s}')")),
            other => Err(format!("column '{column}' is not a number ({other:?})")),
        }
    }

    pub fn number(&self, column: &str) -> Result<f64, String> {
        self.cell(column)?;
        self.opt_number(column)?
            .ok_or_else(|| format!("column '{column}' is empty"))
    }

    pub fn opt_count(&self, column: &str) -> Result<Option<u32>, String> {
        match self.opt_number(column)? {
            None => Ok(None),
            Some(n) if n.fract() == 0.0 && (0.0..=f64::from(u32::MAX)).contains(&n) => {
                Ok(Some(n as u32))
            }
            Some(n) => Err(format!("column '{column}' must be a whole non-negative number ({n})")),
        }
    }

    pub fn count(&self, column: &str) -> Result<u32, String> {
        self.cell(column)?;
        self.opt_count(column)?
            .ok_or_else(|| format!("column '{column}' is empty"))
    }

    pub fn money(&self, column: &str) -> Result<Money, String> {
        let amount = self.number(column)?;
        Money::from_decimal(amount).ok_or_else(|| format!("column '{column}' is out of range"))
    }

    pub fn parse<T>(&self, column: &str) -> Result<T, String>
    where
        T: core::str::FromStr,
        T::Err: core::fmt::Display,
    {
        self.text(column)?
            .parse()
            .map_err(|e| format!("column '{column}': {e}"))
    }

    pub fn opt_date(&self, column: &str) -> Result<Option<NaiveDate>, String> {
        self.opt_text(column)?
            .map(|raw| {
                let day = raw.get(..10).unwrap_or(&raw);
                NaiveDate::parse_from_str(day, DATE_FORMAT)
                    .map_err(|_| format!("column '{column}' is not a YYYY-MM-DD date ('{raw}')"))
            })
            .transpose()
    }

    pub fn date(&self, column: &str) -> Result<NaiveDate, String> {
        self.cell(column)?;
        self.opt_date(column)?
            .ok_or_else(|| format!("column '{column}' is empty"))
    }

    pub fn time(&self, column: &str) -> Result<NaiveTime, String> {
        let raw = self.text(column)?;
        NaiveTime::parse_from_str(&raw, TIME_FORMAT)
            .map_err(|_| format!("column '{column}' is not a HH:MM:SS time ('{raw}')"))
    }

    pub fn datetime(&self, column: &str) -> Result<NaiveDateTime, String> {
        let raw = self.text(column)?;
        NaiveDateTime::parse_from_str(&raw, DATETIME_FORMAT)
            .or_else(|_| NaiveDateTime::parse_from_str(&raw, "%Y-%m-%dT%H:%M:%S"))
            .map_err(|_| format!("column '{column}' is not a timestamp ('{raw}')"))
    }
}

/// Read every data row of `sheet`. A missing file or sheet reads as empty.
pub fn read_rows<R: SheetRow>(path: &Path, sheet: &str) -> Result<Vec<R>, StoreError> {
    if !path.exists() {
        return Ok(vec![]);
    }

    let read_error = |message: String| StoreError::Read {
        path: path.to_path_buf(),
        message,
    };

    let mut workbook: Xlsx<_> = open_workbook(path).map_err(|e| read_error(format!("{e}")))?;
    if !workbook.sheet_names().iter().any(|name| name == sheet) {
        return Ok(vec![]);
    }
    let range = workbook
        .worksheet_range(sheet)
        .map_err(|e| read_error(format!("{e}")))?;

    let first_row = range.start().map_or(0, |(row, _)| row as usize);
    let mut rows = range.rows();
    let Some(header) = rows.next() else {
        return Ok(vec![]);
    };
    let columns: HashMap<String, usize> = header
        .iter()
        .enumerate()
        .filter_map(|(idx, cell)| match cell {
            Data::String(s) => Some((s.trim().to_lowercase(), idx)),
            _ => None,
        })
        .collect();

    let mut records = Vec::new();
    for (offset, cells) in rows.enumerate() {
        if cells.iter().all(is_blank) {
            continue;
        }
        let reader = RowReader::new(&columns, cells);
        let record = R::from_row(&reader).map_err(|message| StoreError::Malformed {
            sheet: sheet.to_string(),
            // 1-based, counting the header row.
            row: first_row + offset + 2,
            message,
        })?;
        records.push(record);
    }

    Ok(records)
}

fn is_blank(cell: &Data) -> bool {
    match cell {
        Data::Empty => true,
        Data::String(s) => s.trim().is_empty(),
        _ => false,
    }
}

/// One sheet to write.
#[derive(Debug, Clone)]
pub struct Sheet {
    name: String,
    headers: &'static [&'static str],
    rows: Vec<Vec<Cell>>,
}

impl Sheet {
    pub fn of<'r, R>(name: &str, records: impl IntoIterator<Item = &'r R>) -> Self
    where
        R: SheetRow + 'r,
    {
        Self {
            name: name.to_string(),
            headers: R::HEADERS,
            rows: records.into_iter().map(SheetRow::to_cells).collect(),
        }
    }
}

/// Replace `path` with a workbook holding `sheets`, in order.
pub fn write_workbook(path: &Path, sheets: &[Sheet]) -> Result<(), StoreError> {
    let write_error = |message: String| StoreError::Write {
        path: path.to_path_buf(),
        message,
    };
    let xlsx_error = |e: XlsxError| write_error(e.to_string());

    let mut workbook = Workbook::new();
    let bold = Format::new().set_bold();

    for sheet in sheets {
        let worksheet = workbook.add_worksheet();
        worksheet.set_name(sheet.name.as_str()).map_err(xlsx_error)?;

        for (col, header) in sheet.headers.iter().enumerate() {
            worksheet
                .write_string_with_format(0, col as u16, *header, &bold)
                .map_err(xlsx_error)?;
        }

        for (idx, cells) in sheet.rows.iter().enumerate() {
            let row = u32::try_from(idx + 1)
                .map_err(|_| write_error(format!("sheet '{}' has too many rows", sheet.name)))?;
            for (col, cell) in cells.iter().enumerate() {
                let col = col as u16;
                match cell {
                    Cell::Empty => {}
                    Cell::Text(text) => {
                        worksheet
                            .write_string(row, col, text.as_str())
                            .map_err(xlsx_error)?;
                    }
                    Cell::Number(n) => {
                        worksheet.write_number(row, col, *n).map_err(xlsx_error)?;
                    }
                }
            }
        }
    }

    let bytes = workbook.save_to_buffer().map_err(xlsx_error)?;

    let dir = match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        _ => Path::new("."),
    };
    fs::create_dir_all(dir).map_err(|e| write_error(e.to_string()))?;

    let mut tmp = tempfile::NamedTempFile::new_in(dir).map_err(|e| write_error(e.to_string()))?;
    tmp.write_all(&bytes).map_err(|e| write_error(e.to_string()))?;
    tmp.as_file()
        .sync_all()
        .map_err(|e| write_error(e.to_string()))?;
    tmp.persist(path).map_err(|e| write_error(e.error.to_string()))?;

    tracing::debug!(path = %path.display(), sheets = sheets.len(), "workbook written");
    Ok(())
}
