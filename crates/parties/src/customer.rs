use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use counterpos_core::{DomainError, Entity, record_id};

record_id!(
    /// Customer identifier (sequential, as shown in the customer sheet).
    CustomerId,
    "CustomerId"
);

/// Contact information for a customer.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ContactInfo {
    pub phone: Option<String>,
    pub email: Option<String>,
}

impl ContactInfo {
    /// Trim fields, drop blank ones and check the email shape.
    pub fn normalized(self) -> Result<Self, DomainError> {
        let phone = non_blank(self.phone);
        let email = non_blank(self.email);

        if let Some(email) = &email {
            let valid = email
                .split_once('@')
                .is_some_and(|(local, domain)| !local.is_empty() && domain.contains('.'));
            if !valid {
                return Err(DomainError::validation(format!("invalid email address '{email}'")));
            }
        }

        Ok(Self { phone, email })
    }
}

/// A customer row of the directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Customer {
    pub id: CustomerId,
    pub name: String,
    pub contact: ContactInfo,
    pub notes: Option<String>,
    pub registered_on: NaiveDate,
}

impl Entity for Customer {
    type Id = CustomerId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

pub(crate) fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
