pub mod channels;
pub mod health;
pub mod message_events;
pub mod upload;
pub mod users;

use axum::{middleware::from_fn, Extension, Router};
use tower_http::{services::ServeDir, trace::TraceLayer};

use crate::error::{not_found, ApiError, AppError};
use crate::middleware::request_id::request_id;
use crate::state::{AppState, RequestId};

pub fn api_router(state: AppState) -> Router {
    Router::new()
        .merge(users::router(state.clone()))
        .merge(channels::router(state.clone()))
        .merge(message_events::router(state.clone()))
        .merge(upload::router(state))
}

pub fn health_router(state: AppState) -> Router {
    health::router(state)
}

/// The full application: JSON routes, health, and uploaded media served from
/// the upload directory.
pub fn app(state: AppState) -> Router {
    let media = ServeDir::new(&state.settings.upload_dir);
    let media_prefix = state.settings.upload_url_prefix.clone();

    Router::new()
        .merge(health_router(state.clone()))
        .merge(api_router(state))
        .nest_service(&media_prefix, media)
        .fallback(unknown_route)
        .method_not_allowed_fallback(wrong_method)
        .layer(TraceLayer::new_for_http())
        .layer(from_fn(request_id))
}

async fn unknown_route(Extension(request_id): Extension<RequestId>) -> ApiError {
    not_found("Not found", &request_id)
}

async fn wrong_method(Extension(request_id): Extension<RequestId>) -> ApiError {
    AppError::MethodNotAllowed.with_request_id(&request_id.0)
}
