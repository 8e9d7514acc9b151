use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::polymarket::types::{lenient_decimal, string_list};

/// A Gamma event with its nested markets.
///
/// `outcomes` / `outcome_prices` are normalized on the way in, so nothing
/// downstream has to care whether upstream sent strings or arrays.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all(deserialize = "camelCase"))]
pub struct Event {
    pub id: String,
    #[serde(default)]
    pub ticker: Option<String>,
    pub slug: String,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub start_date: Option<String>,
    #[serde(default)]
    pub end_date: Option<String>,
    #[serde(default)]
    pub active: bool,
    #[serde(default)]
    pub closed: bool,
    #[serde(default)]
    pub archived: bool,
    #[serde(default, deserialize_with = "lenient_decimal")]
    pub volume: Option<Decimal>,
    #[serde(default, deserialize_with = "lenient_decimal")]
    pub volume_num: Option<Decimal>,
    #[serde(default, deserialize_with = "lenient_decimal")]
    pub liquidity: Option<Decimal>,
    #[serde(default, deserialize_with = "lenient_decimal")]
    pub liquidity_num: Option<Decimal>,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub markets: Vec<EventMarket>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all(deserialize = "camelCase"))]
pub struct EventMarket {
    pub id: String,
    #[serde(default)]
    pub question: String,
    #[serde(default)]
    pub slug: Option<String>,
    #[serde(default)]
    pub condition_id: Option<String>,
    #[serde(default, deserialize_with = "string_list")]
    pub outcomes: Vec<String>,
    #[serde(default, deserialize_with = "string_list")]
    pub outcome_prices: Vec<String>,
    #[serde(default, deserialize_with = "lenient_decimal")]
    pub volume_num: Option<Decimal>,
    #[serde(default, deserialize_with = "lenient_decimal")]
    pub liquidity_num: Option<Decimal>,
    #[serde(default)]
    pub active: bool,
    #[serde(default)]
    pub closed: bool,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub icon: Option<String>,
    #[serde(default)]
    pub end_date: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub one_day_price_change: Option<f64>,
    #[serde(default)]
    pub group_item_title: Option<String>,
}

impl Event {
    /// Event-level volume if reported, else the sum over markets.
    pub fn total_volume(&self) -> Decimal {
        self.volume_num
            .or(self.volume)
            .unwrap_or_else(|| self.markets.iter().filter_map(|m| m.volume_num).sum())
    }

    /// Event-level liquidity if reported, else the sum over markets.
    pub fn total_liquidity(&self) -> Decimal {
        self.liquidity_num
            .or(self.liquidity)
            .unwrap_or_else(|| self.markets.iter().filter_map(|m| m.liquidity_num).sum())
    }

    /// First `limit` markets that are still open.
    pub fn active_markets(&self, limit: usize) -> impl Iterator<Item = &EventMarket> {
        self.markets.iter().filter(|m| !m.closed).take(limit)
    }
}

impl EventMarket {
    /// Price of the first outcome ("Yes" on binary markets).
    pub fn yes_price(&self) -> Option<Decimal> {
        self.outcome_prices
            .first()
            .and_then(|p| p.trim().parse::<Decimal>().ok())
    }

    /// Short label used on event cards.
    pub fn label(&self) -> &str {
        self.group_item_title
            .as_deref()
            .filter(|t| !t.is_empty())
            .unwrap_or(&self.question)
    }
}
