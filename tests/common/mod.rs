use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use axum::extract::{Query, State};
use axum::http::{StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use rust_decimal::Decimal;
use serde_json::json;
use tokio::sync::broadcast;

use polytracker::api::router::create_router;
use polytracker::api::ws_types::WsMessage;
use polytracker::config::AppConfig;
use polytracker::feed::FeedStatus;
use polytracker::models::{Side, TradeFilter, TradeRecord};
use polytracker::polymarket::{DataClient, GammaClient};
use polytracker::services::feed_poller::{FeedController, TradeSource};
use polytracker::AppState;

/// Build a trade record with only the fields the feed cares about.
#[allow(dead_code)]
pub fn trade(hash: &str, size: i64, price: Decimal, timestamp: i64) -> TradeRecord {
    TradeRecord {
        transaction_hash: Some(hash.into()),
        timestamp,
        side: Side::Buy,
        size: Decimal::from(size),
        price,
        outcome: Some("Yes".into()),
        title: Some("Test market".into()),
        event_slug: Some("test-market".into()),
        condition_id: None,
        proxy_wallet: None,
        name: None,
        pseudonym: Some("Tester".into()),
        profile_image: None,
        icon: None,
    }
}

#[allow(dead_code)]
pub fn hashes(trades: &[TradeRecord]) -> Vec<String> {
    trades
        .iter()
        .map(|t| t.transaction_hash.clone().unwrap_or_default())
        .collect()
}

/// Poll until the feed has completed a successful refresh in its current
/// session. Panics after five seconds.
#[allow(dead_code)]
pub async fn wait_until_ready<S: TradeSource>(feed: &FeedController<S>) {
    tokio::time::timeout(Duration::from_secs(5), async {
        loop {
            let snapshot = feed.snapshot().await;
            if snapshot.status == FeedStatus::Ready && snapshot.last_success.is_some() {
                return;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .expect("feed never became ready");
}

// ---------------------------------------------------------------------------
// Fake upstream (Data API + Gamma API on one listener)
// ---------------------------------------------------------------------------

#[allow(dead_code)]
pub struct Upstream {
    pub addr: SocketAddr,
    /// When set, every endpoint answers 503.
    pub fail: Arc<AtomicBool>,
}

#[allow(dead_code)]
impl Upstream {
    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub fn set_failing(&self, failing: bool) {
        self.fail.store(failing, Ordering::SeqCst);
    }
}

pub fn upstream_trades() -> serde_json::Value {
    json!([
        {
            "transactionHash": "0xwhale",
            "side": "BUY",
            "size": 20000,
            "price": 0.5,
            "timestamp": 1_700_000_000,
            "title": "Fed decision in March?",
            "eventSlug": "fed-decision",
            "outcome": "Yes",
            "name": "bigfish",
            "pseudonym": "Big-Fish"
        },
        {
            "transactionHash": "0xshrimp",
            "side": "SELL",
            "size": 10,
            "price": 0.9,
            "timestamp": 1_700_000_005,
            "title": "Fed decision in March?",
            "eventSlug": "fed-decision",
            "outcome": "No",
            "name": "",
            "pseudonym": "Small-Fry"
        },
        {
            "transactionHash": "0xwhale",
            "side": "BUY",
            "size": 20000,
            "price": 0.5,
            "timestamp": 1_700_000_000,
            "title": "Fed decision in March?",
            "eventSlug": "fed-decision",
            "outcome": "Yes",
            "pseudonym": "Big-Fish"
        }
    ])
}

fn upstream_events() -> serde_json::Value {
    json!([
        {
            "id": "100",
            "slug": "fed-decision",
            "title": "Fed decision in March?",
            "active": true,
            "closed": false,
            "volumeNum": 2500000,
            "endDate": "2025-03-19T18:00:00Z",
            "markets": [
                {
                    "id": "m1",
                    "question": "Will the Fed cut?",
                    "groupItemTitle": "Cut",
                    "outcomes": "[\"Yes\",\"No\"]",
                    "outcomePrices": "[\"0.655\",\"0.345\"]",
                    "volumeNum": 2000000,
                    "closed": false
                },
                {
                    "id": "m2",
                    "question": "Will the Fed hike?",
                    "outcomes": ["Yes", "No"],
                    "outcomePrices": ["0.02", "0.98"],
                    "volumeNum": 500000,
                    "closed": false
                }
            ]
        }
    ])
}

async fn upstream_trades_handler(
    State(fail): State<Arc<AtomicBool>>,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    if fail.load(Ordering::SeqCst) {
        return (StatusCode::SERVICE_UNAVAILABLE, "down").into_response();
    }
    let mut trades = upstream_trades();
    if params.contains_key("filterAmount") {
        if let Some(list) = trades.as_array_mut() {
            list.retain(|t| t["transactionHash"] == "0xwhale");
        }
    }
    Json(trades).into_response()
}

async fn upstream_events_handler(
    State(fail): State<Arc<AtomicBool>>,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    if fail.load(Ordering::SeqCst) {
        return (StatusCode::SERVICE_UNAVAILABLE, "down").into_response();
    }
    if params.get("closed").map(String::as_str) == Some("true") {
        return Json(json!([])).into_response();
    }
    Json(upstream_events()).into_response()
}

/// Reports back the query string the upstream received.
async fn upstream_echo_handler(uri: Uri) -> Json<serde_json::Value> {
    Json(json!({ "query": uri.query() }))
}

#[allow(dead_code)]
pub async fn spawn_upstream() -> Upstream {
    let fail = Arc::new(AtomicBool::new(false));
    let app = Router::new()
        .route("/trades", get(upstream_trades_handler))
        .route("/events", get(upstream_events_handler))
        .route("/echo", get(upstream_echo_handler))
        .with_state(fail.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind fake upstream");
    let addr = listener.local_addr().expect("fake upstream has no address");

    tokio::spawn(async move {
        axum::serve(listener, app).await.ok();
    });

    Upstream { addr, fail }
}

// ---------------------------------------------------------------------------
// App under test
// ---------------------------------------------------------------------------

#[allow(dead_code)]
pub struct TestApp {
    pub router: Router,
    pub feed: Arc<FeedController<DataClient>>,
    pub upstream: Upstream,
    pub ws_tx: broadcast::Sender<WsMessage>,
}

/// App wired to a fake upstream, with one completed refresh in the buffer.
/// The poll interval is long so only explicit refreshes happen afterwards.
#[allow(dead_code)]
pub async fn build_test_app(api_token: Option<&str>) -> TestApp {
    let upstream = spawn_upstream().await;
    let (ws_tx, _) = broadcast::channel::<WsMessage>(16);
    let metrics_handle = polytracker::metrics::init_metrics();

    let config = AppConfig {
        host: "127.0.0.1".into(),
        port: 0,
        data_api_url: upstream.url(),
        gamma_api_url: upstream.url(),
        poll_interval_secs: 3_600,
        api_token: api_token.map(String::from),
        ..AppConfig::default()
    };

    let http = reqwest::Client::new();
    let feed = Arc::new(FeedController::new(
        DataClient::with_base_url(http.clone(), upstream.url()),
        config.feed_settings(),
        ws_tx.clone(),
    ));
    feed.reset(TradeFilter::all()).await;
    wait_until_ready(&feed).await;

    let state = AppState {
        config,
        feed: feed.clone(),
        gamma: GammaClient::with_base_url(http.clone(), upstream.url()),
        http,
        ws_tx: ws_tx.clone(),
        metrics_handle,
    };

    TestApp {
        router: create_router(state),
        feed,
        upstream,
        ws_tx,
    }
}
