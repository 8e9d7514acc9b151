use std::sync::Arc;

use tokio::sync::broadcast;

use polytracker::api::router::create_router;
use polytracker::api::ws_types::WsMessage;
use polytracker::config::{AppConfig, LogFormat};
use polytracker::polymarket::{DataClient, GammaClient};
use polytracker::services::feed_poller::FeedController;
use polytracker::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let config = AppConfig::from_env()?;
    init_tracing(config.log_format);

    let metrics_handle = polytracker::metrics::init_metrics();
    let addr = format!("{}:{}", config.host, config.port);

    let http = config.http_client()?;
    let data_client = DataClient::with_base_url(http.clone(), config.data_api_url.clone());
    let gamma = GammaClient::with_base_url(http.clone(), config.gamma_api_url.clone());

    // --- Broadcast channel for feed push to dashboard clients ---
    let (ws_tx, _) = broadcast::channel::<WsMessage>(256);

    // --- Trade feed: polling session over the Data API ---
    let feed = Arc::new(FeedController::new(
        data_client,
        config.feed_settings(),
        ws_tx.clone(),
    ));
    feed.reset(config.default_filter.clone()).await;

    tracing::info!(
        data_api = %config.data_api_url,
        gamma_api = %config.gamma_api_url,
        interval_secs = config.poll_interval_secs,
        page_limit = config.trade_page_limit,
        buffer_cap = config.buffer_cap,
        missing_hash = ?config.missing_hash,
        auth = config.api_token.is_some(),
        "Trade feed configured"
    );

    let state = AppState {
        config,
        feed: feed.clone(),
        gamma,
        http,
        ws_tx,
        metrics_handle,
    };
    let router = create_router(state);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on {addr}");
    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    feed.shutdown().await;
    tracing::info!("Shutdown complete");

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}

fn init_tracing(format: LogFormat) {
    use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("polytracker=info,tower_http=info"));

    let registry = tracing_subscriber::registry().with(filter);
    match format {
        LogFormat::Json => registry.with(fmt::layer().json()).init(),
        LogFormat::Pretty => registry.with(fmt::layer()).init(),
    }
}
