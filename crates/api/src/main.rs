use parley_core::config::Settings;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{info, warn};

mod error;
mod middleware;
mod routes;
mod state;
mod upload;

use crate::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .json()
        .init();

    let settings = Settings::from_env()?;

    let db = parley_db::connect(&settings.database_url, settings.db_max_connections).await?;
    if settings.run_migrations {
        parley_db::migrate(&db).await?;
    }

    let addr: SocketAddr = settings.api_bind.parse()?;
    let state = AppState {
        db,
        settings: Arc::new(settings),
    };

    info!(
        %addr,
        env = %state.settings.parley_env,
        upload_dir = %state.settings.upload_dir.display(),
        "starting api"
    );

    let app = routes::app(state);
    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("shutdown requested"),
        Err(err) => {
            warn!(error = %err, "cannot listen for ctrl-c, running until killed");
            std::future::pending::<()>().await;
        }
    }
}
