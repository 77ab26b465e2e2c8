//! Infrastructure layer: workbooks, dispatch, carts, config, workers.

pub mod activity_log;
pub mod carts;
pub mod clock;
pub mod command_dispatcher;
pub mod config;
pub mod pos;
pub mod store;
pub mod workbook;
pub mod workers;

mod integration_tests;

pub use activity_log::ActivityLog;
pub use carts::CartRegistry;
pub use clock::{Clock, FixedClock, SystemClock};
pub use command_dispatcher::{CommandDispatcher, DispatchError, Envelope, UnitOfWork};
pub use config::{Config, ConfigError};
pub use pos::{
    CashCount, CustomerChanges, NewCustomer, NewExpense, NewProduct, PointOfSale, ProductChanges,
    Receipt, Stores,
};
pub use store::{AggregateStore, InMemoryAggregateStore, StoreError};
