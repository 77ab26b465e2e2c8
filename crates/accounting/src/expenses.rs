use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use counterpos_core::{Aggregate, AggregateRoot, DomainError, Entity, Money, record_id};
use counterpos_events::Event;

use crate::month::Month;

static EXPENSE_BOOK_ID: &str = "accounting.expenses";

record_id!(ExpenseId, "ExpenseId");

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExpenseCategory {
    /// Rent, salaries and other recurring costs.
    Fixed,
    Variable,
}

impl ExpenseCategory {
    pub fn as_str(self) -> &'static str {
        match self {
            ExpenseCategory::Fixed => "fixed",
            ExpenseCategory::Variable => "variable",
        }
    }
}

impl core::fmt::Display for ExpenseCategory {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl core::str::FromStr for ExpenseCategory {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "fixed" => Ok(ExpenseCategory::Fixed),
            "variable" => Ok(ExpenseCategory::Variable),
            other => Err(DomainError::validation(format!(
                "expense category must be 'fixed' or 'variable' (got '{other}')"
            ))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExpenseRecord {
    pub id: ExpenseId,
    pub date: NaiveDate,
    pub category: ExpenseCategory,
    pub description: String,
    pub amount: Money,
}

impl Entity for ExpenseRecord {
    type Id = ExpenseId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

/// Aggregate root: the expenses sheet.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ExpenseBook {
    expenses: Vec<ExpenseRecord>,
    version: u64,
}

impl ExpenseBook {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_expenses(mut expenses: Vec<ExpenseRecord>) -> Self {
        expenses.sort_by_key(|e| e.id);
        Self {
            expenses,
            version: 0,
        }
    }

    pub fn expenses(&self) -> &[ExpenseRecord] {
        &self.expenses
    }

    pub fn get(&self, id: ExpenseId) -> Option<&ExpenseRecord> {
        self.expenses.iter().find(|e| e.id == id)
    }

    /// Expenses dated in `month`, by date.
    pub fn in_month(&self, month: Month) -> Vec<&ExpenseRecord> {
        let mut rows: Vec<_> = self
            .expenses
            .iter()
            .filter(|e| month.contains(e.date))
            .collect();
        rows.sort_by_key(|e| (e.date, e.id));
        rows
    }

    pub fn next_id(&self) -> Result<ExpenseId, DomainError> {
        ExpenseId::after(self.expenses.iter().map(|e| e.id).max())
    }
}

impl AggregateRoot for ExpenseBook {
    type Id = &'static str;

    fn id(&self) -> &Self::Id {
        &EXPENSE_BOOK_ID
    }

    fn version(&self) -> u64 {
        self.version
    }
}

/// Command: RecordExpense.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordExpense {
    pub date: NaiveDate,
    pub category: ExpenseCategory,
    pub description: String,
    pub amount: Money,
    pub occurred_at: NaiveDateTime,
}

/// Command: RemoveExpense.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoveExpense {
    pub expense_id: ExpenseId,
    pub occurred_at: NaiveDateTime,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExpenseBookCommand {
    RecordExpense(RecordExpense),
    RemoveExpense(RemoveExpense),
}

/// Event: ExpenseRecorded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExpenseRecorded {
    pub expense: ExpenseRecord,
    pub occurred_at: NaiveDateTime,
}

/// Event: ExpenseRemoved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExpenseRemoved {
    pub expense_id: ExpenseId,
    pub description: String,
    pub amount: Money,
    pub occurred_at: NaiveDateTime,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExpenseBookEvent {
    ExpenseRecorded(ExpenseRecorded),
    ExpenseRemoved(ExpenseRemoved),
}

impl Event for ExpenseBookEvent {
    fn event_type(&self) -> &'static str {
        match self {
            ExpenseBookEvent::ExpenseRecorded(_) => "accounting.expense.recorded",
            ExpenseBookEvent::ExpenseRemoved(_) => "accounting.expense.removed",
        }
    }

    fn version(&self) -> u32 {
        1
    }

    fn occurred_at(&self) -> NaiveDateTime {
        match self {
            ExpenseBookEvent::ExpenseRecorded(e) => e.occurred_at,
            ExpenseBookEvent::ExpenseRemoved(e) => e.occurred_at,
        }
    }

    fn summary(&self) -> String {
        match self {
            ExpenseBookEvent::ExpenseRecorded(e) => format!(
                "Recorded {} expense: {} ({}, ID: {})",
                e.expense.category, e.expense.description, e.expense.amount, e.expense.id
            ),
            ExpenseBookEvent::ExpenseRemoved(e) => format!(
                "Removed expense: {} ({}, ID: {})",
                e.description, e.amount, e.expense_id
            ),
        }
    }
}

impl Aggregate for ExpenseBook {
    type Command = ExpenseBookCommand;
    type Event = ExpenseBookEvent;
    type Error = DomainError;

    fn apply(&mut self, event: &Self::Event) {
        match event {
            ExpenseBookEvent::ExpenseRecorded(e) => {
                self.expenses.push(e.expense.clone());
            }
            ExpenseBookEvent::ExpenseRemoved(e) => {
                self.expenses.retain(|x| x.id != e.expense_id);
            }
        }

        self.version += 1;
    }

    fn handle(&self, command: &Self::Command) -> Result<Vec<Self::Event>, Self::Error> {
        match command {
            ExpenseBookCommand::RecordExpense(cmd) => self.handle_record(cmd),
            ExpenseBookCommand::RemoveExpense(cmd) => self.handle_remove(cmd),
        }
    }
}

impl ExpenseBook {
    fn handle_record(&self, cmd: &RecordExpense) -> Result<Vec<ExpenseBookEvent>, DomainError> {
        let description = cmd.description.trim();
        if description.is_empty() {
            return Err(DomainError::validation("expense description cannot be empty"));
        }
        if !cmd.amount.is_positive() {
            return Err(DomainError::validation("expense amount must be positive"));
        }

        Ok(vec![ExpenseBookEvent::ExpenseRecorded(ExpenseRecorded {
            expense: ExpenseRecord {
                id: self.next_id()?,
                date: cmd.date,
                category: cmd.category,
                description: description.to_string(),
                amount: cmd.amount,
            },
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_remove(&self, cmd: &RemoveExpense) -> Result<Vec<ExpenseBookEvent>, DomainError> {
        let expense = self
            .get(cmd.expense_id)
            .ok_or_else(|| DomainError::not_found(format!("expense {}", cmd.expense_id)))?;

        Ok(vec![ExpenseBookEvent::ExpenseRemoved(ExpenseRemoved {
            expense_id: expense.id,
            description: expense.description.clone(),
            amount: expense.amount,
            occurred_at: cmd.occurred_at,
        })])
    }
}
