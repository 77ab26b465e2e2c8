use std::sync::Arc;

use axum::{
    Json,
    extract::{Extension, Query},
    http::StatusCode,
    response::IntoResponse,
};

use crate::app::{dto, errors, services::AppServices};

const DEFAULT_ACTIVITY_LINES: usize = 50;

pub async fn health() -> StatusCode {
    StatusCode::OK
}

/// Latest activity-log lines, oldest first.
pub async fn activity(
    Extension(services): Extension<Arc<AppServices>>,
    Query(query): Query<dto::LimitQuery>,
) -> axum::response::Response {
    let limit = match errors::parse_opt::<usize>(query.limit.as_deref(), "invalid_limit") {
        Ok(v) => v.unwrap_or(DEFAULT_ACTIVITY_LINES),
        Err(resp) => return resp,
    };

    let services = Arc::clone(&services);
    let lines = tokio::task::spawn_blocking(move || services.activity().tail(limit)).await;
    match lines {
        Ok(Ok(lines)) => (StatusCode::OK, Json(dto::items(lines))).into_response(),
        Ok(Err(e)) => {
            tracing::error!(error = %e, "failed to read activity log");
            errors::internal("failed to read activity log")
        }
        Err(e) => {
            tracing::error!(error = %e, "activity read panicked");
            errors::internal("failed to read activity log")
        }
    }
}
