//! Sheet layouts of the persisted records.

use counterpos_accounting::{CashClosing, ExpenseId, ExpenseRecord, Month, MonthlyReport};
use counterpos_parties::{ContactInfo, Customer, CustomerId};
use counterpos_products::{Product, ProductId};
use counterpos_sales::{MethodTotals, OrderId, SaleId, SaleRecord};

use super::{Cell, RowReader, SheetRow};

impl SheetRow for Product {
    const HEADERS: &'static [&'static str] = &["id", "name", "type", "price", "stock", "created_on"];

    fn to_cells(&self) -> Vec<Cell> {
        vec![
            self.id.get().into(),
            self.name.as_str().into(),
            self.kind.as_str().into(),
            self.price.into(),
            self.stock.into(),
            self.created_on.into(),
        ]
    }

    fn from_row(row: &RowReader<'_>) -> Result<Self, String> {
        Ok(Product {
            id: ProductId::new(row.count("id")?),
            name: row.text("name")?,
            kind: row.parse("type")?,
            price: row.money("price")?,
            stock: row.count("stock")?,
            created_on: row.date("created_on")?,
        })
    }
}

impl SheetRow for Customer {
    const HEADERS: &'static [&'static str] =
        &["id", "name", "phone", "email", "notes", "registered_on"];

    fn to_cells(&self) -> Vec<Cell> {
        vec![
            self.id.get().into(),
            self.name.as_str().into(),
            self.contact.phone.as_deref().into(),
            self.contact.email.as_deref().into(),
            self.notes.as_deref().into(),
            self.registered_on.into(),
        ]
    }

    fn from_row(row: &RowReader<'_>) -> Result<Self, String> {
        Ok(Customer {
            id: CustomerId::new(row.count("id")?),
            name: row.text("name")?,
            contact: ContactInfo {
                phone: row.opt_text("phone")?,
                email: row.opt_text("email")?,
            },
            notes: row.opt_text("notes")?,
            registered_on: row.date("registered_on")?,
        })
    }
}

impl SheetRow for SaleRecord {
    const HEADERS: &'static [&'static str] = &[
        "sale_id",
        "order_id",
        "date",
        "time",
        "customer_id",
        "customer",
        "product_id",
        "product",
        "type",
        "quantity",
        "unit_price",
        "total",
        "payment_method",
        "paid_on",
    ];

    fn to_cells(&self) -> Vec<Cell> {
        vec![
            self.sale_id.get().into(),
            self.order_id.get().into(),
            self.date.into(),
            self.time.into(),
            self.customer_id.map(CustomerId::get).into(),
            self.customer_name.as_str().into(),
            self.product_id.get().into(),
            self.product_name.as_str().into(),
            self.kind.as_str().into(),
            self.quantity.into(),
            self.unit_price.into(),
            self.total.into(),
            self.payment_method.as_str().into(),
            self.paid_on.into(),
        ]
    }

    fn from_row(row: &RowReader<'_>) -> Result<Self, String> {
        Ok(SaleRecord {
            sale_id: SaleId::new(row.count("sale_id")?),
            order_id: OrderId::new(row.count("order_id")?),
            date: row.date("date")?,
            time: row.time("time")?,
            customer_id: row.opt_count("customer_id")?.map(CustomerId::new),
            customer_name: row.text("customer")?,
            product_id: ProductId::new(row.count("product_id")?),
            product_name: row.text("product")?,
            kind: row.parse("type")?,
            quantity: row.count("quantity")?,
            unit_price: row.money("unit_price")?,
            total: row.money("total")?,
            payment_method: row.parse("payment_method")?,
            paid_on: row.opt_date("paid_on")?,
        })
    }
}

impl SheetRow for ExpenseRecord {
    const HEADERS: &'static [&'static str] = &["id", "date", "category", "description", "amount"];

    fn to_cells(&self) -> Vec<Cell> {
        vec![
            self.id.get().into(),
            self.date.into(),
            self.category.as_str().into(),
            self.description.as_str().into(),
            self.amount.into(),
        ]
    }

    fn from_row(row: &RowReader<'_>) -> Result<Self, String> {
        Ok(ExpenseRecord {
            id: ExpenseId::new(row.count("id")?),
            date: row.date("date")?,
            category: row.parse("category")?,
            description: row.text("description")?,
            amount: row.money("amount")?,
        })
    }
}

fn read_totals(row: &RowReader<'_>, prefix: &str) -> Result<MethodTotals, String> {
    Ok(MethodTotals {
        cash: row.money(&format!("{prefix}_cash"))?,
        debit: row.money(&format!("{prefix}_debit"))?,
        credit: row.money(&format!("{prefix}_credit"))?,
        transfer: row.money(&format!("{prefix}_transfer"))?,
    })
}

fn totals_cells(totals: &MethodTotals) -> [Cell; 4] {
    [
        totals.cash.into(),
        totals.debit.into(),
        totals.credit.into(),
        totals.transfer.into(),
    ]
}

impl SheetRow for CashClosing {
    /// `difference` and `status` are derived; they are written for the
    /// reader of the sheet and ignored on load.
    const HEADERS: &'static [&'static str] = &[
        "date",
        "opening_float",
        "expected_cash",
        "expected_debit",
        "expected_credit",
        "expected_transfer",
        "reported_cash",
        "reported_debit",
        "reported_credit",
        "reported_transfer",
        "difference",
        "status",
        "notes",
        "closed_at",
    ];

    fn to_cells(&self) -> Vec<Cell> {
        let mut cells = vec![self.date.into(), self.opening_float.into()];
        cells.extend(totals_cells(&self.expected));
        cells.extend(totals_cells(&self.reported));
        cells.extend([
            self.total_difference().into(),
            self.status().as_str().into(),
            self.notes.as_deref().into(),
            self.closed_at.into(),
        ]);
        cells
    }

    fn from_row(row: &RowReader<'_>) -> Result<Self, String> {
        Ok(CashClosing {
            date: row.date("date")?,
            opening_float: row.money("opening_float")?,
            expected: read_totals(row, "expected")?,
            reported: read_totals(row, "reported")?,
            notes: row.opt_text("notes")?,
            closed_at: row.datetime("closed_at")?,
        })
    }
}

impl SheetRow for MonthlyReport {
    const HEADERS: &'static [&'static str] = &[
        "month",
        "sales",
        "orders",
        "gross",
        "received_cash",
        "received_debit",
        "received_credit",
        "received_transfer",
        "pending",
        "unit_total",
        "weight_total",
        "lot_total",
        "top_product",
        "fixed_expenses",
        "variable_expenses",
        "total_expenses",
        "net",
        "closings",
        "closing_difference",
        "exported_at",
    ];

    fn to_cells(&self) -> Vec<Cell> {
        let mut cells = vec![
            self.month.to_string().into(),
            self.sales.into(),
            self.orders.into(),
            self.gross.into(),
        ];
        cells.extend(totals_cells(&self.received));
        cells.extend([
            self.pending.into(),
            self.unit_total.into(),
            self.weight_total.into(),
            self.lot_total.into(),
            self.top_product.as_deref().into(),
            self.fixed_expenses.into(),
            self.variable_expenses.into(),
            self.total_expenses().into(),
            self.net.into(),
            self.closings.into(),
            self.closing_difference.into(),
            self.exported_at.into(),
        ]);
        cells
    }

    fn from_row(row: &RowReader<'_>) -> Result<Self, String> {
        Ok(MonthlyReport {
            month: row.parse::<Month>("month")?,
            sales: row.count("sales")? as usize,
            orders: row.count("orders")? as usize,
            gross: row.money("gross")?,
            received: read_totals(row, "received")?,
            pending: row.money("pending")?,
            unit_total: row.money("unit_total")?,
            weight_total: row.money("weight_total")?,
            lot_total: row.money("lot_total")?,
            top_product: row.opt_text("top_product")?,
            fixed_expenses: row.money("fixed_expenses")?,
            variable_expenses: row.money("variable_expenses")?,
            net: row.money("net")?,
            closings: row.count("closings")? as usize,
            closing_difference: row.money("closing_difference")?,
            exported_at: row.datetime("exported_at")?,
        })
    }
}
