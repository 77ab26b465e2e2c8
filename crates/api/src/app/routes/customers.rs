use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Extension, Path, rejection::JsonRejection},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};

use counterpos_parties::CustomerId;

use crate::app::services::{self, AppServices};
use crate::app::{dto, errors};

pub fn router() -> Router {
    Router::new()
        .route("/", post(register_customer).get(list_customers))
        .route(
            "/:id",
            get(get_customer).patch(update_customer).delete(remove_customer),
        )
}

pub async fn register_customer(
    Extension(services): Extension<Arc<AppServices>>,
    payload: Result<Json<dto::CreateCustomerRequest>, JsonRejection>,
) -> axum::response::Response {
    let body = match errors::body(payload) {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    match services::blocking(&services, move |pos| pos.register_customer(body.into())).await {
        Ok(customer) => (StatusCode::CREATED, Json(customer)).into_response(),
        Err(resp) => resp,
    }
}

pub async fn list_customers(
    Extension(services): Extension<Arc<AppServices>>,
) -> axum::response::Response {
    match services::blocking(&services, |pos| pos.customers()).await {
        Ok(customers) => (StatusCode::OK, Json(dto::items(customers))).into_response(),
        Err(resp) => resp,
    }
}

pub async fn get_customer(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id: CustomerId = match errors::parse(&id, "invalid_id") {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    match services::blocking(&services, move |pos| pos.customer(id)).await {
        Ok(customer) => (StatusCode::OK, Json(customer)).into_response(),
        Err(resp) => resp,
    }
}

/// Omitted fields keep their value; phone and email are merged separately.
pub async fn update_customer(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
    payload: Result<Json<dto::UpdateCustomerRequest>, JsonRejection>,
) -> axum::response::Response {
    let id: CustomerId = match errors::parse(&id, "invalid_id") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let body = match errors::body(payload) {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    match services::blocking(&services, move |pos| pos.update_customer(id, body.into())).await {
        Ok(customer) => (StatusCode::OK, Json(customer)).into_response(),
        Err(resp) => resp,
    }
}

pub async fn remove_customer(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id: CustomerId = match errors::parse(&id, "invalid_id") {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    match services::blocking(&services, move |pos| pos.remove_customer(id)).await {
        Ok(_) => StatusCode::NO_CONTENT.into_response(),
        Err(resp) => resp,
    }
}
