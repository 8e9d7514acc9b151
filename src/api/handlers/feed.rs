use axum::extract::State;
use axum::Json;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::ApiResponse;
use crate::errors::AppError;
use crate::feed::FeedStatus;
use crate::models::{Side, TradeFilter};
use crate::services::feed_poller::{FeedSnapshot, RefreshOutcome};
use crate::AppState;

pub async fn status(State(state): State<AppState>) -> Json<ApiResponse<FeedSnapshot>> {
    ApiResponse::ok(state.feed.snapshot().await)
}

/// Body of `POST /api/feed/filter`: either a named preset or explicit fields.
#[derive(Debug, Default, Deserialize)]
pub struct FilterRequest {
    pub preset: Option<String>,
    pub min_cash: Option<Decimal>,
    pub side: Option<String>,
    pub user: Option<String>,
}

impl FilterRequest {
    pub fn into_filter(self) -> Result<TradeFilter, AppError> {
        if let Some(preset) = self.preset {
            return TradeFilter::from_preset(&preset)
                .ok_or_else(|| AppError::BadRequest(format!("unknown filter preset: {preset}")));
        }

        if let Some(amount) = self.min_cash {
            if amount.is_sign_negative() {
                return Err(AppError::BadRequest("min_cash must not be negative".into()));
            }
        }

        let side = match self.side.as_deref() {
            Some(s) => Some(
                Side::from_api_str(s)
                    .ok_or_else(|| AppError::BadRequest(format!("unknown side: {s}")))?,
            ),
            None => None,
        };

        Ok(TradeFilter {
            min_cash: self.min_cash.filter(|a| !a.is_zero()),
            side,
            user: self.user.map(|u| u.trim().to_string()).filter(|u| !u.is_empty()),
        })
    }
}

/// Switch the feed to a new filter. The buffer restarts empty.
pub async fn set_filter(
    State(state): State<AppState>,
    Json(req): Json<FilterRequest>,
) -> Result<Json<ApiResponse<FeedSnapshot>>, AppError> {
    let filter = req.into_filter()?;
    state.feed.reset(filter).await;
    Ok(ApiResponse::ok(state.feed.snapshot().await))
}

#[derive(Debug, Serialize)]
pub struct RetryResult {
    pub status: FeedStatus,
    pub fetched: usize,
    pub new_trades: usize,
    pub error: Option<String>,
}

/// Manual retry: one immediate refresh in the current session.
pub async fn retry(State(state): State<AppState>) -> Json<ApiResponse<RetryResult>> {
    let outcome = state.feed.refresh_now().await;
    let status = state.feed.status().await;

    let result = match outcome {
        RefreshOutcome::Merged { fetched, added } => RetryResult {
            status,
            fetched,
            new_trades: added,
            error: None,
        },
        RefreshOutcome::Failed(e) => RetryResult {
            status,
            fetched: 0,
            new_trades: 0,
            error: Some(e.to_string()),
        },
        RefreshOutcome::Superseded => RetryResult {
            status,
            fetched: 0,
            new_trades: 0,
            error: None,
        },
    };

    ApiResponse::ok(result)
}
