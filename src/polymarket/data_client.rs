use reqwest::{Client, StatusCode};
use thiserror::Error;

use super::types::ApiTrade;
use crate::feed::FeedError;
use crate::models::{TradeFilter, TradeRecord};
use crate::services::feed_poller::TradeSource;

pub const DATA_API_BASE: &str = "https://data-api.polymarket.com";

#[derive(Debug, Error)]
pub enum DataClientError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error: {0}")]
    Status(StatusCode),

    #[error("malformed response body: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("unexpected response: {0}")]
    Unexpected(String),
}

impl From<DataClientError> for FeedError {
    fn from(e: DataClientError) -> Self {
        match e {
            DataClientError::Http(e) if e.is_decode() => FeedError::Parse(e.to_string()),
            DataClientError::Http(e) => FeedError::Transport(e.to_string()),
            DataClientError::Status(status) => FeedError::Transport(status.as_u16().to_string()),
            DataClientError::Decode(e) => FeedError::Parse(e.to_string()),
            DataClientError::Unexpected(msg) => FeedError::Parse(msg),
        }
    }
}

#[derive(Debug, Clone)]
pub struct DataClient {
    http: Client,
    base_url: String,
}

impl DataClient {
    pub fn with_base_url(http: Client, base_url: impl Into<String>) -> Self {
        Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    /// Fetch the most recent page of trades matching `filter`.
    ///
    /// The whole page is rejected if any record fails to normalize, so a
    /// malformed batch is never partially applied.
    pub async fn get_trades(
        &self,
        filter: &TradeFilter,
        limit: u32,
    ) -> Result<Vec<TradeRecord>, DataClientError> {
        let url = format!("{}/trades", self.base_url);
        let resp = self
            .http
            .get(&url)
            .query(&filter.query_pairs(limit))
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            return Err(DataClientError::Status(status));
        }

        let body = resp.bytes().await?;
        let raw: Vec<ApiTrade> = serde_json::from_slice(&body)?;

        raw.into_iter()
            .map(TradeRecord::try_from)
            .collect::<Result<Vec<_>, _>>()
            .map_err(DataClientError::Unexpected)
    }
}

impl TradeSource for DataClient {
    async fn fetch_trades(
        &self,
        filter: &TradeFilter,
        limit: u32,
    ) -> Result<Vec<TradeRecord>, FeedError> {
        self.get_trades(filter, limit).await.map_err(FeedError::from)
    }
}
