use axum::{
    extract::{rejection::JsonRejection, State},
    routing::post,
    Extension, Json, Router,
};
use parley_core::types::{
    MessageEventListResponse, MessageEventResponse, RecordMessageEventRequest,
};

use crate::{
    error::{bad_body, require_key, store_error, ApiResult},
    state::{AppState, RequestId},
};

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/message-events", post(record_event).get(list_events))
        .with_state(state)
}

async fn record_event(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    payload: Result<Json<RecordMessageEventRequest>, JsonRejection>,
) -> ApiResult<Json<MessageEventResponse>> {
    let Json(payload) = payload.map_err(|rejection| bad_body(rejection, &request_id))?;
    require_key(&payload.channel_url, "channel_url", &request_id)?;
    require_key(&payload.user_id, "user_id", &request_id)?;

    let event = parley_db::queries::message_events::record(
        &state.db,
        &payload.channel_url,
        &payload.user_id,
        &payload.message_type,
    )
    .await
    .map_err(store_error(&request_id, "Failed to create message event"))?;

    Ok(Json(MessageEventResponse {
        success: true,
        event: event.into(),
    }))
}

async fn list_events(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
) -> ApiResult<Json<MessageEventListResponse>> {
    let events = parley_db::queries::message_events::list_recent(&state.db)
        .await
        .map_err(store_error(&request_id, "Failed to fetch message events"))?;

    Ok(Json(MessageEventListResponse {
        success: true,
        events: events.into_iter().map(Into::into).collect(),
    }))
}
