pub mod buffer;
pub mod projection;

pub use buffer::{MissingHashPolicy, TradeBuffer, DEFAULT_BUFFER_CAP};
pub use projection::{project, SortDirection, SortKey, TradePredicate};

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Why a refresh produced no batch. Either way the buffer is left untouched.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FeedError {
    /// Network failure or non-2xx response.
    #[error("API error: {0}")]
    Transport(String),

    /// Response body was not a list of trades.
    #[error("unexpected response: {0}")]
    Parse(String),
}

/// Lifecycle of one polling session.
///
/// `Idle → Loading → {Ready, Failed}`; every scheduled refresh re-enters
/// `Loading`. There is no terminal state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeedStatus {
    #[default]
    Idle,
    Loading,
    Ready,
    Failed,
}

impl fmt::Display for FeedStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            FeedStatus::Idle => "idle",
            FeedStatus::Loading => "loading",
            FeedStatus::Ready => "ready",
            FeedStatus::Failed => "failed",
        };
        f.write_str(s)
    }
}
