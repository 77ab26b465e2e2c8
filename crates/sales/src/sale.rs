use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};

use counterpos_core::{DomainError, Entity, Money, record_id};
use counterpos_parties::CustomerId;
use counterpos_products::{ProductId, ProductKind};

record_id!(
    /// Ledger row identifier, unique across the daily ledger and history.
    SaleId,
    "SaleId"
);

record_id!(
    /// Checkout identifier shared by every row of one cart.
    OrderId,
    "OrderId"
);

/// Customer name recorded for anonymous sales.
pub const WALK_IN: &str = "Walk-in";

/// How a sale was (or will be) paid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    Cash,
    Debit,
    Credit,
    Transfer,
    /// Customer tab, settled later.
    OnAccount,
}

impl PaymentMethod {
    /// Methods that mean the money was received.
    pub const PAID: [PaymentMethod; 4] = [
        PaymentMethod::Cash,
        PaymentMethod::Debit,
        PaymentMethod::Credit,
        PaymentMethod::Transfer,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            PaymentMethod::Cash => "cash",
            PaymentMethod::Debit => "debit",
            PaymentMethod::Credit => "credit",
            PaymentMethod::Transfer => "transfer",
            PaymentMethod::OnAccount => "on_account",
        }
    }

    pub fn is_paid(self) -> bool {
        self != PaymentMethod::OnAccount
    }
}

impl core::fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl core::str::FromStr for PaymentMethod {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "cash" => Ok(PaymentMethod::Cash),
            "debit" => Ok(PaymentMethod::Debit),
            "credit" => Ok(PaymentMethod::Credit),
            "transfer" => Ok(PaymentMethod::Transfer),
            "on_account" => Ok(PaymentMethod::OnAccount),
            other => Err(DomainError::validation(format!(
                "payment method must be one of: cash, debit, credit, transfer, on_account (got '{other}')"
            ))),
        }
    }
}

/// Customer snapshot attached to a cart and copied onto ledger rows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomerRef {
    pub id: CustomerId,
    pub name: String,
}

/// One ledger row: a single product line of a checked-out cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaleRecord {
    pub sale_id: SaleId,
    pub order_id: OrderId,
    pub date: NaiveDate,
    pub time: NaiveTime,
    pub customer_id: Option<CustomerId>,
    pub customer_name: String,
    pub product_id: ProductId,
    pub product_name: String,
    pub kind: ProductKind,
    pub quantity: u32,
    pub unit_price: Money,
    pub total: Money,
    pub payment_method: PaymentMethod,
    /// Day the money came in; `None` while the sale sits on a customer's tab.
    pub paid_on: Option<NaiveDate>,
}

impl Entity for SaleRecord {
    type Id = SaleId;

    fn id(&self) -> &Self::Id {
        &self.sale_id
    }
}

impl SaleRecord {
    pub fn is_paid(&self) -> bool {
        self.paid_on.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn payment_methods_parse_and_classify() {
        assert_eq!("CASH".parse::<PaymentMethod>().unwrap(), PaymentMethod::Cash);
        assert_eq!(
            "on_account".parse::<PaymentMethod>().unwrap(),
            PaymentMethod::OnAccount
        );
        assert!(!PaymentMethod::OnAccount.is_paid());
        assert!(PaymentMethod::PAID.iter().all(|m| m.is_paid()));
        assert!("cheque".parse::<PaymentMethod>().is_err());
    }
}
