use axum::{
    body::Body,
    http::{HeaderValue, Request},
    middleware::Next,
    response::Response,
};
use nanoid::nanoid;

use crate::state::RequestId;

pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Tags every request with an id, reusing one set by the fronting proxy when
/// it looks sane, and echoes it on the response.
pub async fn request_id(mut req: Request<Body>, next: Next) -> Response {
    let request_id = req
        .headers()
        .get(REQUEST_ID_HEADER)
        .and_then(accept_upstream_id)
        .unwrap_or_else(|| format!("req_{}", nanoid!(16)));

    req.extensions_mut().insert(RequestId(request_id.clone()));
    let mut resp = next.run(req).await;
    if let Ok(value) = HeaderValue::from_str(&request_id) {
        resp.headers_mut().insert(REQUEST_ID_HEADER, value);
    }
    resp
}

fn accept_upstream_id(value: &HeaderValue) -> Option<String> {
    let value = value.to_str().ok()?.trim();
    let well_formed = !value.is_empty()
        && value.len() <= 64
        && value
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    well_formed.then(|| value.to_string())
}
