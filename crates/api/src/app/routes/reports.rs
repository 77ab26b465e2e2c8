use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Extension, Query},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};

use counterpos_accounting::Month;

use crate::app::services::{self, AppServices};
use crate::app::{dto, errors};

pub fn router() -> Router {
    Router::new()
        .route("/monthly", get(monthly_rollup))
        .route("/monthly/export", post(export_monthly))
        .route("/exports", get(exported_reports))
}

fn month(query: &dto::MonthQuery) -> Result<Option<Month>, axum::response::Response> {
    errors::parse_opt(query.month.as_deref(), "invalid_month")
}

/// Rollup of `?month=` (default: the current month), computed on the fly.
pub async fn monthly_rollup(
    Extension(services): Extension<Arc<AppServices>>,
    Query(query): Query<dto::MonthQuery>,
) -> axum::response::Response {
    let month = match month(&query) {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    match services::blocking(&services, move |pos| pos.monthly_rollup(month)).await {
        Ok(rollup) => (StatusCode::OK, Json(rollup)).into_response(),
        Err(resp) => resp,
    }
}

/// Archive the rollup in the reports workbook, replacing an earlier export.
pub async fn export_monthly(
    Extension(services): Extension<Arc<AppServices>>,
    Query(query): Query<dto::MonthQuery>,
) -> axum::response::Response {
    let month = match month(&query) {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    match services::blocking(&services, move |pos| pos.export_monthly(month)).await {
        Ok(report) => (StatusCode::CREATED, Json(report)).into_response(),
        Err(resp) => resp,
    }
}

pub async fn exported_reports(
    Extension(services): Extension<Arc<AppServices>>,
) -> axum::response::Response {
    match services::blocking(&services, |pos| pos.exported_reports()).await {
        Ok(reports) => (StatusCode::OK, Json(dto::items(reports))).into_response(),
        Err(resp) => resp,
    }
}
