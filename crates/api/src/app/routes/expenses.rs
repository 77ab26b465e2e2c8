use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Extension, Path, Query, rejection::JsonRejection},
    http::StatusCode,
    response::IntoResponse,
    routing::{delete, post},
};

use counterpos_accounting::{ExpenseId, Month};

use crate::app::services::{self, AppServices};
use crate::app::{dto, errors};

pub fn router() -> Router {
    Router::new()
        .route("/", post(record_expense).get(list_expenses))
        .route("/:id", delete(remove_expense))
}

pub async fn record_expense(
    Extension(services): Extension<Arc<AppServices>>,
    payload: Result<Json<dto::CreateExpenseRequest>, JsonRejection>,
) -> axum::response::Response {
    let new = match errors::body(payload).and_then(|body| body.into_new()) {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    match services::blocking(&services, move |pos| pos.record_expense(new)).await {
        Ok(expense) => (StatusCode::CREATED, Json(expense)).into_response(),
        Err(resp) => resp,
    }
}

/// All expenses, or those of `?month=YYYY-MM`.
pub async fn list_expenses(
    Extension(services): Extension<Arc<AppServices>>,
    Query(query): Query<dto::MonthQuery>,
) -> axum::response::Response {
    let month = match errors::parse_opt::<Month>(query.month.as_deref(), "invalid_month") {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    match services::blocking(&services, move |pos| pos.expenses(month)).await {
        Ok(expenses) => (StatusCode::OK, Json(dto::items(expenses))).into_response(),
        Err(resp) => resp,
    }
}

pub async fn remove_expense(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id: ExpenseId = match errors::parse(&id, "invalid_id") {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    match services::blocking(&services, move |pos| pos.remove_expense(id)).await {
        Ok(_) => StatusCode::NO_CONTENT.into_response(),
        Err(resp) => resp,
    }
}
