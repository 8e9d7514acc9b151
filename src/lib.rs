pub mod api;
pub mod config;
pub mod errors;
pub mod feed;
pub mod format;
pub mod metrics;
pub mod models;
pub mod polymarket;
pub mod services;

use std::sync::Arc;
use tokio::sync::broadcast;

use crate::api::ws_types::WsMessage;
use crate::config::AppConfig;
use crate::polymarket::{DataClient, GammaClient};
use crate::services::feed_poller::FeedController;

#[derive(Clone)]
pub struct AppState {
    pub config: AppConfig,
    pub feed: Arc<FeedController<DataClient>>,
    pub gamma: GammaClient,
    /// Client used by the pass-through proxy.
    pub http: reqwest::Client,
    pub ws_tx: broadcast::Sender<WsMessage>,
    pub metrics_handle: metrics_exporter_prometheus::PrometheusHandle,
}
