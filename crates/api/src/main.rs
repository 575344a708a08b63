use std::sync::Arc;

use anyhow::Context;
use finpay_api::config::ApiConfig;
use finpay_infra::SweepScheduler;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = ApiConfig::from_env().context("invalid configuration")?;
    finpay_observability::init(config.log_format);

    let services = Arc::new(finpay_api::app::build_services(&config).await?);

    let scheduler = if config.sweep_enabled {
        Some(SweepScheduler::at(config.sweep_at).spawn(services.sweep.clone()))
    } else {
        tracing::warn!("SWEEP_ENABLED=false; overdue sweep will only run on demand");
        None
    };

    let app = finpay_api::app::build_app(services);

    let listener = tokio::net::TcpListener::bind(config.bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.bind_addr))?;

    tracing::info!("listening on {}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    if let Some(handle) = scheduler {
        handle.shutdown().await;
    }
    tracing::info!("shut down");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
}
