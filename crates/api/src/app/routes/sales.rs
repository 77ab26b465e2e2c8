use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Extension, Path, Query, rejection::JsonRejection},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use chrono::NaiveDate;

use counterpos_sales::SaleId;

use crate::app::services::{self, AppServices};
use crate::app::{dto, errors};

pub fn router() -> Router {
    Router::new()
        .route("/today", get(sales_today))
        .route("/history", get(sales_history))
        .route("/summary", get(daily_summary))
        .route("/:id/settle", post(settle_sale))
}

pub async fn sales_today(
    Extension(services): Extension<Arc<AppServices>>,
) -> axum::response::Response {
    match services::blocking(&services, |pos| pos.sales_today()).await {
        Ok(rows) => (StatusCode::OK, Json(dto::items(rows))).into_response(),
        Err(resp) => resp,
    }
}

/// Rows of one date, from the ledger or the history. `date` is required.
pub async fn sales_history(
    Extension(services): Extension<Arc<AppServices>>,
    Query(query): Query<dto::DateQuery>,
) -> axum::response::Response {
    let date = match errors::parse_opt::<NaiveDate>(query.date.as_deref(), "invalid_date") {
        Ok(Some(v)) => v,
        Ok(None) => return errors::bad_request("date is required (YYYY-MM-DD)"),
        Err(resp) => return resp,
    };

    match services::blocking(&services, move |pos| pos.sales_on(date)).await {
        Ok(rows) => (StatusCode::OK, Json(dto::items(rows))).into_response(),
        Err(resp) => resp,
    }
}

pub async fn daily_summary(
    Extension(services): Extension<Arc<AppServices>>,
    Query(query): Query<dto::DateQuery>,
) -> axum::response::Response {
    let date = match errors::parse_opt::<NaiveDate>(query.date.as_deref(), "invalid_date") {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    match services::blocking(&services, move |pos| pos.daily_summary(date)).await {
        Ok(summary) => (StatusCode::OK, Json(summary)).into_response(),
        Err(resp) => resp,
    }
}

pub async fn settle_sale(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
    payload: Result<Json<dto::PaymentRequest>, JsonRejection>,
) -> axum::response::Response {
    let sale_id: SaleId = match errors::parse(&id, "invalid_id") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let method = match errors::body(payload).and_then(|body| body.method()) {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    match services::blocking(&services, move |pos| pos.settle_sale(sale_id, method)).await {
        Ok(row) => (StatusCode::OK, Json(row)).into_response(),
        Err(resp) => resp,
    }
}
