use axum::extract::{Query, State};
use axum::Json;
use chrono::{DateTime, NaiveDate};
use serde::{Deserialize, Serialize};

use super::ApiResponse;
use crate::errors::AppError;
use crate::format::{event_url, format_percent, format_volume};
use crate::models::{Event, EventStatusFilter};
use crate::polymarket::EventQuery;
use crate::AppState;

const MAX_EVENTS_PAGE: u32 = 500;
const MARKETS_PER_CARD: usize = 4;

#[derive(Debug, Default, Deserialize)]
pub struct EventsQuery {
    /// `active` (default), `closed` or `all`.
    pub filter: Option<String>,
    pub limit: Option<u32>,
    pub offset: Option<u32>,
    /// Comma-separated slugs for a batch lookup.
    pub slug: Option<String>,
}

impl EventsQuery {
    fn into_query(self) -> Result<EventQuery, AppError> {
        let status: EventStatusFilter = match self.filter.as_deref() {
            Some(s) => s.parse().map_err(AppError::BadRequest)?,
            None => EventStatusFilter::default(),
        };
        let defaults = EventQuery::default();

        Ok(EventQuery {
            status,
            limit: self.limit.unwrap_or(defaults.limit).clamp(1, MAX_EVENTS_PAGE),
            offset: self.offset.unwrap_or(0),
            slugs: self
                .slug
                .map(|s| {
                    s.split(',')
                        .map(|s| s.trim().to_string())
                        .filter(|s| !s.is_empty())
                        .collect()
                })
                .unwrap_or_default(),
        })
    }
}

#[derive(Debug, Serialize)]
pub struct MarketLine {
    pub id: String,
    pub label: String,
    /// Whole-percent price of the first outcome, a dash when unknown.
    pub yes_price: String,
}

#[derive(Debug, Serialize)]
pub struct EventDisplay {
    pub volume: String,
    pub liquidity: String,
    pub ends: Option<String>,
    pub url: String,
    pub markets: Vec<MarketLine>,
}

#[derive(Debug, Serialize)]
pub struct EventView {
    #[serde(flatten)]
    pub event: Event,
    pub display: EventDisplay,
}

impl From<Event> for EventView {
    fn from(event: Event) -> Self {
        let markets = event
            .active_markets(MARKETS_PER_CARD)
            .map(|m| MarketLine {
                id: m.id.clone(),
                label: m.label().to_string(),
                yes_price: m.yes_price().map(format_percent).unwrap_or_else(|| "—".into()),
            })
            .collect();

        let display = EventDisplay {
            volume: format_volume(Some(event.total_volume())),
            liquidity: format_volume(Some(event.total_liquidity())),
            ends: event.end_date.as_deref().and_then(format_end_date),
            url: event_url(&event.slug),
            markets,
        };

        Self { event, display }
    }
}

fn format_end_date(raw: &str) -> Option<String> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.date_naive())
        .or_else(|_| NaiveDate::parse_from_str(raw, "%Y-%m-%d"))
        .ok()
        .map(|d| d.format("%Y-%m-%d").to_string())
}

pub async fn list(
    State(state): State<AppState>,
    Query(query): Query<EventsQuery>,
) -> Result<Json<ApiResponse<Vec<EventView>>>, AppError> {
    let query = query.into_query()?;
    let events = state.gamma.get_events(&query).await?;

    tracing::debug!(
        count = events.len(),
        status = ?query.status,
        "Fetched events"
    );

    Ok(ApiResponse::ok(events.into_iter().map(EventView::from).collect()))
}
