use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use counterpos_core::{Aggregate, AggregateRoot, DomainError, same_name};
use counterpos_events::Event;

use crate::customer::{ContactInfo, Customer, CustomerId, non_blank};

static DIRECTORY_ID: &str = "parties.customers";

/// Aggregate root: the customer directory (one customer sheet).
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CustomerDirectory {
    customers: Vec<Customer>,
    version: u64,
}

impl CustomerDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild the directory from persisted rows.
    pub fn from_customers(mut customers: Vec<Customer>) -> Self {
        customers.sort_by_key(|c| c.id);
        Self {
            customers,
            version: 0,
        }
    }

    pub fn customers(&self) -> &[Customer] {
        &self.customers
    }

    pub fn get(&self, id: CustomerId) -> Option<&Customer> {
        self.customers.iter().find(|c| c.id == id)
    }

    pub fn next_id(&self) -> Result<CustomerId, DomainError> {
        CustomerId::after(self.customers.iter().map(|c| c.id).max())
    }
}

impl AggregateRoot for CustomerDirectory {
    type Id = &'static str;

    fn id(&self) -> &Self::Id {
        &DIRECTORY_ID
    }

    fn version(&self) -> u64 {
        self.version
    }
}

/// Command: RegisterCustomer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegisterCustomer {
    pub name: String,
    pub contact: Option<ContactInfo>,
    pub notes: Option<String>,
    pub occurred_at: NaiveDateTime,
}

/// Command: UpdateCustomer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateCustomer {
    pub customer_id: CustomerId,
    /// Optional new name (if None, keep existing).
    pub name: Option<String>,
    /// Optional new contact info (replaces the whole record when present).
    pub contact: Option<ContactInfo>,
    /// Optional new notes; a blank string clears them.
    pub notes: Option<String>,
    pub occurred_at: NaiveDateTime,
}

/// Command: RemoveCustomer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoveCustomer {
    pub customer_id: CustomerId,
    pub occurred_at: NaiveDateTime,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum DirectoryCommand {
    RegisterCustomer(RegisterCustomer),
    UpdateCustomer(UpdateCustomer),
    RemoveCustomer(RemoveCustomer),
}

/// Event: CustomerRegistered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomerRegistered {
    pub customer: Customer,
    pub occurred_at: NaiveDateTime,
}

/// Event: CustomerUpdated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomerUpdated {
    pub customer_id: CustomerId,
    pub name: String,
    pub contact: ContactInfo,
    pub notes: Option<String>,
    pub occurred_at: NaiveDateTime,
}

/// Event: CustomerRemoved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomerRemoved {
    pub customer_id: CustomerId,
    pub name: String,
    pub occurred_at: NaiveDateTime,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum DirectoryEvent {
    CustomerRegistered(CustomerRegistered),
    CustomerUpdated(CustomerUpdated),
    CustomerRemoved(CustomerRemoved),
}

impl Event for DirectoryEvent {
    fn event_type(&self) -> &'static str {
        match self {
            DirectoryEvent::CustomerRegistered(_) => "parties.customer.registered",
            DirectoryEvent::CustomerUpdated(_) => "parties.customer.updated",
            DirectoryEvent::CustomerRemoved(_) => "parties.customer.removed",
        }
    }

    fn version(&self) -> u32 {
        1
    }

    fn occurred_at(&self) -> NaiveDateTime {
        match self {
            DirectoryEvent::CustomerRegistered(e) => e.occurred_at,
            DirectoryEvent::CustomerUpdated(e) => e.occurred_at,
            DirectoryEvent::CustomerRemoved(e) => e.occurred_at,
        }
    }

    fn summary(&self) -> String {
        match self {
            DirectoryEvent::CustomerRegistered(e) => format!(
                "Registered customer: {} (ID: {})",
                e.customer.name, e.customer.id
            ),
            DirectoryEvent::CustomerUpdated(e) => {
                format!("Updated customer: {} (ID: {})", e.name, e.customer_id)
            }
            DirectoryEvent::CustomerRemoved(e) => {
                format!("Removed customer: {} (ID: {})", e.name, e.customer_id)
            }
        }
    }
}

impl Aggregate for CustomerDirectory {
    type Command = DirectoryCommand;
    type Event = DirectoryEvent;
    type Error = DomainError;

    fn apply(&mut self, event: &Self::Event) {
        match event {
            DirectoryEvent::CustomerRegistered(e) => {
                self.customers.push(e.customer.clone());
                self.customers.sort_by_key(|c| c.id);
            }
            DirectoryEvent::CustomerUpdated(e) => {
                if let Some(c) = self.customers.iter_mut().find(|c| c.id == e.customer_id) {
                    c.name = e.name.clone();
                    c.contact = e.contact.clone();
                    c.notes = e.notes.clone();
                }
            }
            DirectoryEvent::CustomerRemoved(e) => {
                self.customers.retain(|c| c.id != e.customer_id);
            }
        }

        self.version += 1;
    }

    fn handle(&self, command: &Self::Command) -> Result<Vec<Self::Event>, Self::Error> {
        match command {
            DirectoryCommand::RegisterCustomer(cmd) => self.handle_register(cmd),
            DirectoryCommand::UpdateCustomer(cmd) => self.handle_update(cmd),
            DirectoryCommand::RemoveCustomer(cmd) => self.handle_remove(cmd),
        }
    }
}

impl CustomerDirectory {
    fn require(&self, id: CustomerId) -> Result<&Customer, DomainError> {
        self.get(id)
            .ok_or_else(|| DomainError::not_found(format!("customer {id}")))
    }

    fn ensure_unique_name(&self, name: &str, except: Option<CustomerId>) -> Result<(), DomainError> {
        if self
            .customers
            .iter()
            .any(|c| Some(c.id) != except && same_name(&c.name, name))
        {
            return Err(DomainError::conflict(format!(
                "customer '{name}' is already registered"
            )));
        }
        Ok(())
    }

    fn handle_register(&self, cmd: &RegisterCustomer) -> Result<Vec<DirectoryEvent>, DomainError> {
        let name = cmd.name.trim();
        if name.is_empty() {
            return Err(DomainError::validation("name cannot be empty"));
        }
        self.ensure_unique_name(name, None)?;

        let contact = cmd.contact.clone().unwrap_or_default().normalized()?;

        Ok(vec![DirectoryEvent::CustomerRegistered(CustomerRegistered {
            customer: Customer {
                id: self.next_id()?,
                name: name.to_string(),
                contact,
                notes: non_blank(cmd.notes.clone()),
                registered_on: cmd.occurred_at.date(),
            },
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_update(&self, cmd: &UpdateCustomer) -> Result<Vec<DirectoryEvent>, DomainError> {
        let current = self.require(cmd.customer_id)?;

        let name = match &cmd.name {
            Some(name) => {
                let name = name.trim();
                if name.is_empty() {
                    return Err(DomainError::validation("name cannot be empty"));
                }
                self.ensure_unique_name(name, Some(current.id))?;
                name.to_string()
            }
            None => current.name.clone(),
        };

        let contact = match &cmd.contact {
            Some(contact) => contact.clone().normalized()?,
            None => current.contact.clone(),
        };

        let notes = match &cmd.notes {
            Some(notes) => non_blank(Some(notes.clone())),
            None => current.notes.clone(),
        };

        Ok(vec![DirectoryEvent::CustomerUpdated(CustomerUpdated {
            customer_id: current.id,
            name,
            contact,
            notes,
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_remove(&self, cmd: &RemoveCustomer) -> Result<Vec<DirectoryEvent>, DomainError> {
        let current = self.require(cmd.customer_id)?;

        Ok(vec![DirectoryEvent::CustomerRemoved(CustomerRemoved {
            customer_id: current.id,
            name: current.name.clone(),
            occurred_at: cmd.occurred_at,
        })])
    }
}
