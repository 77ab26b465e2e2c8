use std::sync::Arc;

use anyhow::Context;

use counterpos_api::app::{self, services::AppServices};
use counterpos_infra::{Config, SystemClock};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env().context("invalid configuration")?;
    counterpos_observability::init(config.log_format);

    let services = Arc::new(
        AppServices::build(&config, Arc::new(SystemClock)).context("failed to start services")?,
    );
    let app = app::build_app(Arc::clone(&services));

    let listener = tokio::net::TcpListener::bind(config.bind)
        .await
        .with_context(|| format!("failed to bind {}", config.bind))?;

    tracing::info!(
        addr = %listener.local_addr()?,
        data_dir = %config.data_dir.display(),
        "listening"
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    services.shutdown();
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "failed to listen for ctrl-c");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutting down");
}
