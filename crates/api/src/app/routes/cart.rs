use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Extension, Path, rejection::JsonRejection},
    http::StatusCode,
    response::IntoResponse,
    routing::{delete, get, post, put},
};

use counterpos_parties::CustomerId;
use counterpos_products::ProductId;

use crate::app::services::{self, AppServices};
use crate::app::{dto, errors};
use crate::context::SessionContext;

pub fn router() -> Router {
    Router::new()
        .route("/", get(get_cart).delete(clear_cart))
        .route("/customer", put(set_customer))
        .route("/items", post(add_item))
        .route("/items/:product_id", delete(remove_item))
        .route("/checkout", post(checkout))
}

pub async fn get_cart(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(session): Extension<SessionContext>,
) -> axum::response::Response {
    let session = session.session_id();
    match services::blocking(&services, move |pos| pos.cart(session)).await {
        Ok(cart) => (StatusCode::OK, Json(dto::cart_to_json(&cart))).into_response(),
        Err(resp) => resp,
    }
}

pub async fn clear_cart(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(session): Extension<SessionContext>,
) -> axum::response::Response {
    let session = session.session_id();
    match services::blocking(&services, move |pos| pos.clear_cart(session)).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(resp) => resp,
    }
}

pub async fn set_customer(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(session): Extension<SessionContext>,
    payload: Result<Json<dto::SetCartCustomerRequest>, JsonRejection>,
) -> axum::response::Response {
    let body = match errors::body(payload) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let session = session.session_id();
    let customer = body.customer_id.map(CustomerId::new);

    match services::blocking(&services, move |pos| pos.set_cart_customer(session, customer)).await {
        Ok(cart) => (StatusCode::OK, Json(dto::cart_to_json(&cart))).into_response(),
        Err(resp) => resp,
    }
}

pub async fn add_item(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(session): Extension<SessionContext>,
    payload: Result<Json<dto::AddCartItemRequest>, JsonRejection>,
) -> axum::response::Response {
    let body = match errors::body(payload) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let session = session.session_id();
    let product = ProductId::new(body.product_id);

    match services::blocking(&services, move |pos| {
        pos.add_to_cart(session, product, body.quantity)
    })
    .await
    {
        Ok(cart) => (StatusCode::OK, Json(dto::cart_to_json(&cart))).into_response(),
        Err(resp) => resp,
    }
}

pub async fn remove_item(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(session): Extension<SessionContext>,
    Path(product_id): Path<String>,
) -> axum::response::Response {
    let product: ProductId = match errors::parse(&product_id, "invalid_id") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let session = session.session_id();

    match services::blocking(&services, move |pos| pos.remove_from_cart(session, product)).await {
        Ok(cart) => (StatusCode::OK, Json(dto::cart_to_json(&cart))).into_response(),
        Err(resp) => resp,
    }
}

pub async fn checkout(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(session): Extension<SessionContext>,
    payload: Result<Json<dto::PaymentRequest>, JsonRejection>,
) -> axum::response::Response {
    let method = match errors::body(payload).and_then(|body| body.method()) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let session = session.session_id();

    match services::blocking(&services, move |pos| pos.checkout(session, method)).await {
        Ok(receipt) => (StatusCode::CREATED, Json(receipt)).into_response(),
        Err(resp) => resp,
    }
}
