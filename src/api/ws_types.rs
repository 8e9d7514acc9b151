use serde::Serialize;
use uuid::Uuid;

use crate::models::{TradeFilter, TradeRecord};
use crate::services::feed_poller::FeedSnapshot;

/// Messages broadcast to all connected WebSocket clients.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", content = "data")]
pub enum WsMessage {
    /// Sent once to each client right after it connects.
    #[serde(rename = "feed_status")]
    FeedStatus(FeedSnapshot),

    #[serde(rename = "feed_update")]
    FeedUpdate(FeedUpdate),

    #[serde(rename = "feed_error")]
    FeedError(FeedErrorNotice),

    #[serde(rename = "feed_reset")]
    FeedReset(FeedResetNotice),
}

/// Newly merged trades, newest batch first.
#[derive(Debug, Clone, Serialize)]
pub struct FeedUpdate {
    pub session_id: Uuid,
    pub new_trades: usize,
    pub buffer_len: usize,
    pub trades: Vec<TradeRecord>,
}

#[derive(Debug, Clone, Serialize)]
pub struct FeedErrorNotice {
    pub session_id: Uuid,
    pub error: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct FeedResetNotice {
    pub session_id: Uuid,
    pub label: String,
    pub filter: TradeFilter,
}
