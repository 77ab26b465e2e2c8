use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Extension, Query},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
};

use crate::app::services::{self, AppServices};
use crate::app::{dto, errors};

pub fn router() -> Router {
    Router::new()
        .route("/performance", get(performance))
        .route("/shelves", get(shelves))
        .route("/tags", get(tags))
        .route("/low-stock", get(low_stock))
}

pub async fn performance(
    Extension(services): Extension<Arc<AppServices>>,
) -> axum::response::Response {
    match services::blocking(&services, |pos| pos.performance()).await {
        Ok(rows) => (StatusCode::OK, Json(dto::items(rows))).into_response(),
        Err(resp) => resp,
    }
}

/// Aisles of shelves; each inner list is one aisle.
pub async fn shelves(
    Extension(services): Extension<Arc<AppServices>>,
) -> axum::response::Response {
    match services::blocking(&services, |pos| pos.shelves()).await {
        Ok(aisles) => (StatusCode::OK, Json(serde_json::json!({ "aisles": aisles }))).into_response(),
        Err(resp) => resp,
    }
}

pub async fn tags(
    Extension(services): Extension<Arc<AppServices>>,
) -> axum::response::Response {
    match services::blocking(&services, |pos| pos.tags()).await {
        Ok(tags) => (StatusCode::OK, Json(dto::items(tags))).into_response(),
        Err(resp) => resp,
    }
}

pub async fn low_stock(
    Extension(services): Extension<Arc<AppServices>>,
    Query(query): Query<dto::ThresholdQuery>,
) -> axum::response::Response {
    let threshold = match errors::parse_opt::<u32>(query.threshold.as_deref(), "invalid_threshold") {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    match services::blocking(&services, move |pos| pos.low_stock(threshold)).await {
        Ok(rows) => (StatusCode::OK, Json(dto::items(rows))).into_response(),
        Err(resp) => resp,
    }
}
