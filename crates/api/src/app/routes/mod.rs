use axum::{Router, routing::get};

pub mod cart;
pub mod cash;
pub mod customers;
pub mod expenses;
pub mod inventory;
pub mod products;
pub mod reports;
pub mod sales;
pub mod system;

/// Router for every session-scoped endpoint.
pub fn router() -> Router {
    Router::new()
        .route("/activity", get(system::activity))
        .nest("/products", products::router())
        .nest("/customers", customers::router())
        .nest("/cart", cart::router())
        .nest("/sales", sales::router())
        .nest("/cash", cash::router())
        .nest("/expenses", expenses::router())
        .nest("/reports", reports::router())
        .nest("/inventory", inventory::router())
}
