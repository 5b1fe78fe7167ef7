use parley_core::config::Settings;
use sqlx::PgPool;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    pub settings: Arc<Settings>,
}

#[derive(Debug, Clone)]
pub struct RequestId(pub String);
