use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Extension, Path, rejection::JsonRejection},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use chrono::NaiveDate;

use crate::app::services::{self, AppServices};
use crate::app::{dto, errors};

pub fn router() -> Router {
    Router::new()
        .route("/closings", post(close_cash).get(list_closings))
        .route("/closings/:date", get(get_closing))
}

pub async fn close_cash(
    Extension(services): Extension<Arc<AppServices>>,
    payload: Result<Json<dto::CloseCashRequest>, JsonRejection>,
) -> axum::response::Response {
    let count = match errors::body(payload).and_then(|body| body.into_count()) {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    match services::blocking(&services, move |pos| pos.close_cash(count)).await {
        Ok(closing) => (StatusCode::CREATED, Json(dto::closing_to_json(&closing))).into_response(),
        Err(resp) => resp,
    }
}

pub async fn list_closings(
    Extension(services): Extension<Arc<AppServices>>,
) -> axum::response::Response {
    match services::blocking(&services, |pos| pos.closings()).await {
        Ok(closings) => {
            let items: Vec<_> = closings.iter().map(dto::closing_to_json).collect();
            (StatusCode::OK, Json(dto::items(items))).into_response()
        }
        Err(resp) => resp,
    }
}

pub async fn get_closing(
    Extension(services): Extension<Arc<AppServices>>,
    Path(date): Path<String>,
) -> axum::response::Response {
    let date: NaiveDate = match errors::parse(&date, "invalid_date") {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    match services::blocking(&services, move |pos| pos.closing(date)).await {
        Ok(closing) => (StatusCode::OK, Json(dto::closing_to_json(&closing))).into_response(),
        Err(resp) => resp,
    }
}
