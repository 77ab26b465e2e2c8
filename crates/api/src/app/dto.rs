use axum::response::Response;
use serde::Deserialize;
use serde_json::{Value, json};

use counterpos_accounting::{CashClosing, ExpenseCategory};
use counterpos_core::Money;
use counterpos_infra::{CashCount, CustomerChanges, NewCustomer, NewExpense, NewProduct, ProductChanges};
use counterpos_products::{Product, ProductKind};
use counterpos_sales::{Cart, MethodTotals, PaymentMethod};

use crate::app::errors;

// -------------------------
// Request DTOs
// -------------------------
//
// Amounts are integer cents. Enumerations travel as strings and are parsed
// with the domain's own `FromStr`, so the error messages match the domain.

#[derive(Debug, Deserialize)]
pub struct CreateProductRequest {
    pub name: String,
    pub kind: String,
    pub price: i64,
    #[serde(default)]
    pub stock: u32,
}

impl CreateProductRequest {
    pub fn into_new(self) -> Result<NewProduct, Response> {
        Ok(NewProduct {
            name: self.name,
            kind: errors::parse::<ProductKind>(&self.kind, "invalid_kind")?,
            price: Money::from_cents(self.price),
            stock: self.stock,
        })
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateProductRequest {
    pub name: Option<String>,
    pub kind: Option<String>,
    pub price: Option<i64>,
}

impl UpdateProductRequest {
    pub fn into_changes(self) -> Result<ProductChanges, Response> {
        Ok(ProductChanges {
            name: self.name,
            kind: errors::parse_opt::<ProductKind>(self.kind.as_deref(), "invalid_kind")?,
            price: self.price.map(Money::from_cents),
        })
    }
}

#[derive(Debug, Deserialize)]
pub struct RestockRequest {
    pub quantity: u32,
}

#[derive(Debug, Deserialize)]
pub struct CreateCustomerRequest {
    pub name: String,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub notes: Option<String>,
}

impl From<CreateCustomerRequest> for NewCustomer {
    fn from(value: CreateCustomerRequest) -> Self {
        NewCustomer {
            name: value.name,
            phone: value.phone,
            email: value.email,
            notes: value.notes,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateCustomerRequest {
    pub name: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub notes: Option<String>,
}

impl From<UpdateCustomerRequest> for CustomerChanges {
    fn from(value: UpdateCustomerRequest) -> Self {
        CustomerChanges {
            name: value.name,
            phone: value.phone,
            email: value.email,
            notes: value.notes,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct AddCartItemRequest {
    pub product_id: u32,
    pub quantity: u32,
}

/// `null` (or a missing field) detaches the customer.
#[derive(Debug, Deserialize)]
pub struct SetCartCustomerRequest {
    pub customer_id: Option<u32>,
}

#[derive(Debug, Deserialize)]
pub struct PaymentRequest {
    pub payment_method: String,
}

impl PaymentRequest {
    pub fn method(&self) -> Result<PaymentMethod, Response> {
        errors::parse(&self.payment_method, "invalid_payment_method")
    }
}

/// Counted amounts per paid method; a missing method counts as zero.
#[derive(Debug, Default, Deserialize)]
pub struct ReportedAmounts {
    #[serde(default)]
    pub cash: i64,
    #[serde(default)]
    pub debit: i64,
    #[serde(default)]
    pub credit: i64,
    #[serde(default)]
    pub transfer: i64,
}

impl From<ReportedAmounts> for MethodTotals {
    fn from(value: ReportedAmounts) -> Self {
        MethodTotals {
            cash: Money::from_cents(value.cash),
            debit: Money::from_cents(value.debit),
            credit: Money::from_cents(value.credit),
            transfer: Money::from_cents(value.transfer),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct CloseCashRequest {
    pub date: Option<String>,
    #[serde(default)]
    pub opening_float: i64,
    #[serde(default)]
    pub reported: ReportedAmounts,
    pub notes: Option<String>,
}

impl CloseCashRequest {
    pub fn into_count(self) -> Result<CashCount, Response> {
        Ok(CashCount {
            date: errors::parse_opt(self.date.as_deref(), "invalid_date")?,
            opening_float: Money::from_cents(self.opening_float),
            reported: self.reported.into(),
            notes: self.notes,
        })
    }
}

#[derive(Debug, Deserialize)]
pub struct CreateExpenseRequest {
    pub date: Option<String>,
    pub category: String,
    pub description: String,
    pub amount: i64,
}

impl CreateExpenseRequest {
    pub fn into_new(self) -> Result<NewExpense, Response> {
        Ok(NewExpense {
            date: errors::parse_opt(self.date.as_deref(), "invalid_date")?,
            category: errors::parse::<ExpenseCategory>(&self.category, "invalid_category")?,
            description: self.description,
            amount: Money::from_cents(self.amount),
        })
    }
}

// -------------------------
// Query DTOs
// -------------------------
//
// Kept as strings so bad values get the JSON error shape instead of axum's
// plain-text rejection.

#[derive(Debug, Default, Deserialize)]
pub struct DateQuery {
    pub date: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct MonthQuery {
    pub month: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ThresholdQuery {
    pub threshold: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct LimitQuery {
    pub limit: Option<String>,
}

// -------------------------
// Response mapping
// -------------------------

pub fn product_to_json(product: &Product) -> Value {
    json!({
        "id": product.id,
        "name": product.name,
        "kind": product.kind,
        "price": product.price,
        "stock": product.stock,
        "stock_label": product.stock_label(),
        "created_on": product.created_on,
    })
}

pub fn cart_to_json(cart: &Cart) -> Value {
    json!({
        "customer": cart.customer(),
        "items": cart.items(),
        "total": cart.total(),
    })
}

pub fn closing_to_json(closing: &CashClosing) -> Value {
    json!({
        "date": closing.date,
        "opening_float": closing.opening_float,
        "expected": closing.expected,
        "reported": closing.reported,
        "difference": closing.difference(),
        "total_difference": closing.total_difference(),
        "status": closing.status(),
        "notes": closing.notes,
        "closed_at": closing.closed_at,
    })
}

pub fn items<T: serde::Serialize>(items: T) -> Value {
    json!({ "items": items })
}
