//! Sales domain module.
//!
//! The per-session cart, the daily sales ledger (with its history) and the
//! daily summary used by cash closing. Deterministic domain logic only.

pub mod cart;
pub mod ledger;
pub mod sale;
pub mod summary;

pub use cart::{Cart, CartItem};
pub use ledger::{
    DayArchived, LedgerCommand, LedgerEvent, OrderLine, OrderRecorded, RecordOrder, RollOver,
    SaleSettled, SalesLedger, SettleSale,
};
pub use sale::{CustomerRef, OrderId, PaymentMethod, SaleId, SaleRecord, WALK_IN};
pub use summary::{DailySummary, MethodTotals};
