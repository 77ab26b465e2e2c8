//! Customers domain module.
//!
//! Business rules for the customer directory, implemented purely as
//! deterministic domain logic (no IO, no HTTP, no storage).

pub mod customer;
pub mod directory;

pub use customer::{ContactInfo, Customer, CustomerId};
pub use directory::{
    CustomerDirectory, CustomerRegistered, CustomerRemoved, CustomerUpdated, DirectoryCommand,
    DirectoryEvent, RegisterCustomer, RemoveCustomer, UpdateCustomer,
};
