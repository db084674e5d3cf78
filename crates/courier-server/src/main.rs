mod api;
mod middleware;

use std::sync::Arc;

use courier_fees::{FeeCalculator, RouteClient};
use courier_geocode::{GeocodingConfig, GeocodingService};
use tracing_subscriber::EnvFilter;

use crate::api::{build_app, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = courier_core::load_app_config()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let geocoder = Arc::new(GeocodingService::new(GeocodingConfig::from_app_config(
        &config,
    ))?);
    let router = match &config.routing_api_key {
        Some(key) => RouteClient::new(key, config.request_timeout_secs)?,
        None => {
            tracing::warn!("COURIER_ROUTING_API_KEY not set; delivery-fee estimates will fail");
            RouteClient::new("", config.request_timeout_secs)?
        }
    };
    let fees = Arc::new(FeeCalculator::new(Arc::clone(&geocoder), router));

    let app = build_app(AppState { geocoder, fees });

    tracing::info!(addr = %config.bind_addr, "starting server");
    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to listen for ctrl-c");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("received shutdown signal, starting graceful shutdown");
}
