use reqwest::{Client, StatusCode};
use thiserror::Error;

use crate::models::{Event, EventStatusFilter};

pub const GAMMA_API_BASE: &str = "https://gamma-api.polymarket.com";

#[derive(Debug, Error)]
pub enum GammaClientError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error: {0}")]
    Status(StatusCode),

    #[error("malformed response body: {0}")]
    Decode(#[from] serde_json::Error),
}

/// Parameters for `GET /events`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventQuery {
    pub status: EventStatusFilter,
    pub limit: u32,
    pub offset: u32,
    /// Batch lookup by slug. Sent as repeated `slug=` parameters.
    pub slugs: Vec<String>,
}

impl Default for EventQuery {
    fn default() -> Self {
        Self {
            status: EventStatusFilter::Active,
            limit: 50,
            offset: 0,
            slugs: Vec::new(),
        }
    }
}

impl EventQuery {
    /// Newest first by start date.
    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = vec![("limit", self.limit.to_string())];
        if self.offset > 0 {
            pairs.push(("offset", self.offset.to_string()));
        }
        pairs.extend(self.status.query_pairs());
        pairs.push(("order", "startDate".into()));
        pairs.push(("ascending", "false".into()));
        for slug in &self.slugs {
            pairs.push(("slug", slug.clone()));
        }
        pairs
    }
}

#[derive(Debug, Clone)]
pub struct GammaClient {
    http: Client,
    base_url: String,
}

impl GammaClient {
    pub fn with_base_url(http: Client, base_url: impl Into<String>) -> Self {
        Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    /// Fetch events with their nested markets.
    pub async fn get_events(&self, query: &EventQuery) -> Result<Vec<Event>, GammaClientError> {
        let url = format!("{}/events", self.base_url);
        let resp = self
            .http
            .get(&url)
            .query(&query.query_pairs())
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            return Err(GammaClientError::Status(status));
        }

        let body = resp.bytes().await?;
        let events: Vec<Event> = serde_json::from_slice(&body)?;
        Ok(events)
    }
}
