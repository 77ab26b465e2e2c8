use axum::{
    http::{HeaderMap, HeaderValue, header},
    middleware::Next,
    response::Response,
};

use counterpos_core::SessionId;

use crate::context::SessionContext;

pub const SESSION_HEADER: &str = "x-pos-session";
pub const SESSION_COOKIE: &str = "pos_session";

/// Identify the cart owner.
///
/// The session comes from the `x-pos-session` header, else the `pos_session`
/// cookie. A missing or unreadable id gets a fresh session, returned to the
/// client as a cookie and echoed in the header.
pub async fn session_middleware(
    mut req: axum::http::Request<axum::body::Body>,
    next: Next,
) -> Response {
    let context = match extract_session(req.headers()) {
        Some(id) => SessionContext::existing(id),
        None => SessionContext::minted(),
    };
    req.extensions_mut().insert(context);

    let mut response = next.run(req).await;

    if context.is_minted() {
        let id = context.session_id().to_string();
        let cookie = format!("{SESSION_COOKIE}={id}; Path=/; HttpOnly; SameSite=Lax");
        let headers = response.headers_mut();
        if let Ok(value) = HeaderValue::from_str(&cookie) {
            headers.append(header::SET_COOKIE, value);
        }
        if let Ok(value) = HeaderValue::from_str(&id) {
            headers.insert(SESSION_HEADER, value);
        }
        tracing::debug!(session = %id, "minted session");
    }

    response
}

fn extract_session(headers: &HeaderMap) -> Option<SessionId> {
    if let Some(value) = headers.get(SESSION_HEADER) {
        return value.to_str().ok()?.parse().ok();
    }

    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == SESSION_COOKIE)
        .and_then(|(_, value)| value.trim().parse().ok())
}
