use anyhow::Context;
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

use natours_core::TourStore;
use natours_service::{build_router, AppState, Config};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Structured logging
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt().with_env_filter(filter).json().init();

    let cfg = Config::from_env();
    let store = TourStore::open(&cfg.db_path, &cfg.db_open).context("open tour store")?;
    let state = AppState::new(store, cfg.environment);
    let app = build_router(state);

    let addr = cfg.addr()?;
    info!(core_version=%natours_core::version(), addr=%addr, environment=?cfg.environment, "starting natours-service");
    let listener = tokio::net::TcpListener::bind(addr).await.context("bind failed")?;
    axum::serve(listener, app).await.context("server error")?;
    Ok(())
}
