use axum::extract::{Query, State};
use axum::Json;
use chrono::Utc;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::ApiResponse;
use crate::errors::AppError;
use crate::feed::{FeedStatus, SortDirection, SortKey, TradePredicate};
use crate::format::{event_url, format_percent, format_time_ago, format_usd};
use crate::models::{Side, TradeRecord};
use crate::AppState;

/// `GET /api/trades` query string. Everything is optional; the default is
/// the buffer in recency order.
#[derive(Debug, Default, Deserialize)]
pub struct TradeQuery {
    pub sort: Option<String>,
    pub dir: Option<String>,
    pub min_value: Option<Decimal>,
    pub min_size: Option<Decimal>,
    pub side: Option<String>,
    pub limit: Option<usize>,
}

impl TradeQuery {
    fn parse(&self) -> Result<(SortKey, SortDirection, TradePredicate), AppError> {
        let key: SortKey = match self.sort.as_deref() {
            Some(s) => s.parse().map_err(AppError::BadRequest)?,
            None => SortKey::default(),
        };
        let direction: SortDirection = match self.dir.as_deref() {
            Some(s) => s.parse().map_err(AppError::BadRequest)?,
            None => SortDirection::default(),
        };
        let side = match self.side.as_deref() {
            Some(s) => Some(
                Side::from_api_str(s)
                    .ok_or_else(|| AppError::BadRequest(format!("unknown side: {s}")))?,
            ),
            None => None,
        };

        Ok((
            key,
            direction,
            TradePredicate {
                min_value: self.min_value,
                min_size: self.min_size,
                side,
            },
        ))
    }
}

#[derive(Debug, Serialize)]
pub struct TradeDisplay {
    pub user: String,
    pub action: &'static str,
    pub value: String,
    pub price: String,
    pub age: String,
    pub event_url: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct TradeView {
    #[serde(flatten)]
    pub trade: TradeRecord,
    pub notional: Decimal,
    pub display: TradeDisplay,
}

impl TradeView {
    pub fn new(trade: TradeRecord, now: i64) -> Self {
        let display = TradeDisplay {
            user: trade.display_name().to_string(),
            action: trade.side.past_tense(),
            value: format_usd(trade.notional()),
            price: format_percent(trade.price),
            age: format_time_ago(trade.timestamp, now),
            event_url: trade.event_slug.as_deref().map(event_url),
        };
        Self {
            notional: trade.notional(),
            trade,
            display,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct TradeList {
    pub status: FeedStatus,
    pub label: String,
    /// Records in the buffer before filtering.
    pub total: usize,
    pub count: usize,
    pub last_error: Option<String>,
    pub trades: Vec<TradeView>,
}

pub async fn list(
    State(state): State<AppState>,
    Query(query): Query<TradeQuery>,
) -> Result<Json<ApiResponse<TradeList>>, AppError> {
    let (key, direction, predicate) = query.parse()?;

    let snapshot = state.feed.snapshot().await;
    let mut trades = state.feed.project(key, direction, &predicate).await;
    if let Some(limit) = query.limit {
        trades.truncate(limit);
    }

    let now = Utc::now().timestamp();
    let trades: Vec<TradeView> = trades.into_iter().map(|t| TradeView::new(t, now)).collect();

    Ok(ApiResponse::ok(TradeList {
        status: snapshot.status,
        label: snapshot.label,
        total: snapshot.buffer_len,
        count: trades.len(),
        last_error: snapshot.last_error,
        trades,
    }))
}
