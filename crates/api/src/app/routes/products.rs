use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Extension, Path, rejection::JsonRejection},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};

use counterpos_products::ProductId;

use crate::app::services::{self, AppServices};
use crate::app::{dto, errors};

pub fn router() -> Router {
    Router::new()
        .route("/", post(create_product).get(list_products))
        .route(
            "/:id",
            get(get_product).patch(update_product).delete(remove_product),
        )
        .route("/:id/restock", post(restock_product))
}

fn product_id(raw: &str) -> Result<ProductId, axum::response::Response> {
    errors::parse(raw, "invalid_id")
}

pub async fn create_product(
    Extension(services): Extension<Arc<AppServices>>,
    payload: Result<Json<dto::CreateProductRequest>, JsonRejection>,
) -> axum::response::Response {
    let new = match errors::body(payload).and_then(|body| body.into_new()) {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    match services::blocking(&services, move |pos| pos.register_product(new)).await {
        Ok(product) => (StatusCode::CREATED, Json(dto::product_to_json(&product))).into_response(),
        Err(resp) => resp,
    }
}

pub async fn list_products(
    Extension(services): Extension<Arc<AppServices>>,
) -> axum::response::Response {
    match services::blocking(&services, |pos| pos.products()).await {
        Ok(products) => {
            let items: Vec<_> = products.iter().map(dto::product_to_json).collect();
            (StatusCode::OK, Json(dto::items(items))).into_response()
        }
        Err(resp) => resp,
    }
}

pub async fn get_product(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id = match product_id(&id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    match services::blocking(&services, move |pos| pos.product(id)).await {
        Ok(product) => (StatusCode::OK, Json(dto::product_to_json(&product))).into_response(),
        Err(resp) => resp,
    }
}

pub async fn update_product(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
    payload: Result<Json<dto::UpdateProductRequest>, JsonRejection>,
) -> axum::response::Response {
    let id = match product_id(&id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let changes = match errors::body(payload).and_then(|body| body.into_changes()) {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    match services::blocking(&services, move |pos| pos.update_product(id, changes)).await {
        Ok(product) => (StatusCode::OK, Json(dto::product_to_json(&product))).into_response(),
        Err(resp) => resp,
    }
}

pub async fn restock_product(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
    payload: Result<Json<dto::RestockRequest>, JsonRejection>,
) -> axum::response::Response {
    let id = match product_id(&id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let body = match errors::body(payload) {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    match services::blocking(&services, move |pos| pos.restock_product(id, body.quantity)).await {
        Ok(product) => (StatusCode::OK, Json(dto::product_to_json(&product))).into_response(),
        Err(resp) => resp,
    }
}

pub async fn remove_product(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id = match product_id(&id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    match services::blocking(&services, move |pos| pos.remove_product(id)).await {
        Ok(_) => StatusCode::NO_CONTENT.into_response(),
        Err(resp) => resp,
    }
}
