use axum::{
    extract::{rejection::JsonRejection, Path, State},
    routing::{get, post, put},
    Extension, Json, Router,
};
use parley_core::types::{
    ChannelDetailResponse, ChannelListResponse, ChannelResponse, CreateChannelRequest,
    MessageCountRequest,
};

use crate::{
    error::{bad_body, not_found, require_key, store_error, ApiResult, AppError},
    state::{AppState, RequestId},
};

pub fn router(state: AppState) -> Router {
    // The static `message-count` segment takes precedence over `{channel_url}`.
    Router::new()
        .route("/channels", post(create_channel).get(list_channels))
        .route("/channels/message-count", put(bump_message_count))
        .route(
            "/channels/{channel_url}",
            get(get_channel).delete(delete_channel),
        )
        .route(
            "/channels/{channel_url}/increment-message",
            post(increment_message),
        )
        .with_state(state)
}

async fn create_channel(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    payload: Result<Json<CreateChannelRequest>, JsonRejection>,
) -> ApiResult<Json<ChannelResponse>> {
    let Json(payload) = payload.map_err(|rejection| bad_body(rejection, &request_id))?;
    require_key(&payload.channel_url, "channel_url", &request_id)?;
    require_key(&payload.created_by, "created_by", &request_id)?;

    if payload.message_count < 0 {
        return Err(
            AppError::BadRequest("message_count must not be negative".to_string())
                .with_request_id(&request_id.0),
        );
    }

    let channel = parley_db::queries::channels::create_or_touch(
        &state.db,
        &payload.channel_url,
        &payload.created_by,
        payload.chatmate_id.as_deref(),
        payload.message_count,
    )
    .await
    .map_err(store_error(&request_id, "Failed to create channel"))?;

    Ok(Json(ChannelResponse {
        success: true,
        channel: channel.into(),
    }))
}

async fn list_channels(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
) -> ApiResult<Json<ChannelListResponse>> {
    let channels = parley_db::queries::channels::list(&state.db)
        .await
        .map_err(store_error(&request_id, "Failed to fetch channels"))?;

    Ok(Json(ChannelListResponse {
        success: true,
        channels: channels.into_iter().map(Into::into).collect(),
    }))
}

async fn get_channel(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    Path(channel_url): Path<String>,
) -> ApiResult<Json<ChannelDetailResponse>> {
    let channel = parley_db::queries::channels::get(&state.db, &channel_url)
        .await
        .map_err(store_error(&request_id, "Failed to fetch channel"))?
        .ok_or_else(|| not_found("Channel not found", &request_id))?;

    Ok(Json(ChannelDetailResponse {
        success: true,
        channel: channel.into(),
    }))
}

async fn delete_channel(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    Path(channel_url): Path<String>,
) -> ApiResult<Json<ChannelResponse>> {
    let channel = parley_db::queries::channels::soft_delete(&state.db, &channel_url)
        .await
        .map_err(store_error(&request_id, "Failed to delete channel"))?
        .ok_or_else(|| not_found("Channel not found", &request_id))?;

    Ok(Json(ChannelResponse {
        success: true,
        channel: channel.into(),
    }))
}

async fn increment_message(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    Path(channel_url): Path<String>,
) -> ApiResult<Json<ChannelResponse>> {
    let channel = parley_db::queries::channels::increment_message_count(&state.db, &channel_url)
        .await
        .map_err(store_error(&request_id, "Failed to increment message count"))?
        .ok_or_else(|| not_found("Channel not found", &request_id))?;

    Ok(Json(ChannelResponse {
        success: true,
        channel: channel.into(),
    }))
}

async fn bump_message_count(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    payload: Result<Json<MessageCountRequest>, JsonRejection>,
) -> ApiResult<Json<ChannelResponse>> {
    let Json(payload) = payload.map_err(|rejection| bad_body(rejection, &request_id))?;
    require_key(&payload.channel_url, "channel_url", &request_id)?;

    let channel =
        parley_db::queries::channels::increment_message_count(&state.db, &payload.channel_url)
            .await
            .map_err(store_error(&request_id, "Failed to update message count"))?
            .ok_or_else(|| not_found("Channel not found", &request_id))?;

    Ok(Json(ChannelResponse {
        success: true,
        channel: channel.into(),
    }))
}
