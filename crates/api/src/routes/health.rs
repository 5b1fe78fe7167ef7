use axum::{extract::State, routing::get, Json, Router};
use serde::Serialize;
use tracing::warn;

use crate::state::AppState;

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    database: &'static str,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .with_state(state)
}

async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    let database = match parley_db::ping(&state.db).await {
        Ok(()) => "up",
        Err(err) => {
            warn!(error = %err, "database ping failed");
            "down"
        }
    };
    Json(HealthResponse {
        status: "ok",
        database,
    })
}
