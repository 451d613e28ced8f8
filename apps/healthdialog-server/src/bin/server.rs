//! HealthDialog HTTP API.
//!
//! Configuration comes from `config.toml`, `config.<RUST_ENV>.toml` and
//! `APP_*` environment variables; see `healthdialog_core::config`.

use anyhow::Context;
use healthdialog_core::config::Config;
use healthdialog_server::{from_settings, init_tracing, router, AppState};
use tracing::{info, warn};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let config = Config::load()?;
    let settings = config.settings()?;
    let assembler = from_settings(&settings)?;
    let app = router(AppState::new(assembler), &settings.server);

    let addr = format!("{}:{}", settings.server.host, settings.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await.with_context(|| format!("binding {addr}"))?;
    info!(%addr, "HealthDialog API listening");
    axum::serve(listener, app).with_graceful_shutdown(shutdown_signal()).await?;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "failed to listen for ctrl-c");
        std::future::pending::<()>().await;
    }
    info!("shutting down");
}
