use axum::{
    extract::{rejection::JsonRejection, Path, State},
    routing::{get, post},
    Extension, Json, Router,
};
use parley_core::types::{RegisterUserRequest, UpdateUserRequest, UserResponse};

use crate::{
    error::{bad_body, not_found, require_key, store_error, ApiResult},
    state::{AppState, RequestId},
};

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/users", post(register_user))
        .route("/users/{user_id}", get(get_user).put(update_user))
        .with_state(state)
}

async fn register_user(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    payload: Result<Json<RegisterUserRequest>, JsonRejection>,
) -> ApiResult<Json<UserResponse>> {
    let Json(payload) = payload.map_err(|rejection| bad_body(rejection, &request_id))?;
    require_key(&payload.user_id, "user_id", &request_id)?;

    let user = parley_db::queries::users::register_or_update(
        &state.db,
        &payload.user_id,
        &payload.nickname,
        &payload.profile_url,
    )
    .await
    .map_err(store_error(&request_id, "Failed to create/update user"))?;

    Ok(Json(UserResponse {
        success: true,
        user: user.into(),
    }))
}

async fn get_user(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    Path(user_id): Path<String>,
) -> ApiResult<Json<UserResponse>> {
    let user = parley_db::queries::users::get(&state.db, &user_id)
        .await
        .map_err(store_error(&request_id, "Failed to fetch user"))?
        .ok_or_else(|| not_found("User not found", &request_id))?;

    Ok(Json(UserResponse {
        success: true,
        user: user.into(),
    }))
}

async fn update_user(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    Path(user_id): Path<String>,
    payload: Result<Json<UpdateUserRequest>, JsonRejection>,
) -> ApiResult<Json<UserResponse>> {
    let Json(payload) = payload.map_err(|rejection| bad_body(rejection, &request_id))?;

    let user = parley_db::queries::users::update(
        &state.db,
        &user_id,
        &payload.nickname,
        &payload.profile_url,
    )
    .await
    .map_err(store_error(&request_id, "Failed to update user"))?
    .ok_or_else(|| not_found("User not found", &request_id))?;

    Ok(Json(UserResponse {
        success: true,
        user: user.into(),
    }))
}
