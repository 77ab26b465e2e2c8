//! HTTP API: server wiring, session handling and JSON routes.

pub mod app;
pub mod context;
pub mod middleware;
