use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::str::FromStr;

use crate::models::{Side, TradeRecord};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortKey {
    /// Buffer order, newest fetch batch first.
    #[default]
    Recency,
    /// Notional value, `size * price`.
    Value,
    Price,
    Timestamp,
}

impl FromStr for SortKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "recency" | "recent" => Ok(SortKey::Recency),
            "value" | "notional" => Ok(SortKey::Value),
            "price" => Ok(SortKey::Price),
            "timestamp" | "time" => Ok(SortKey::Timestamp),
            other => Err(format!("unknown sort key: {other}")),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    Asc,
    #[default]
    Desc,
}

impl FromStr for SortDirection {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "asc" | "ascending" => Ok(SortDirection::Asc),
            "desc" | "descending" => Ok(SortDirection::Desc),
            other => Err(format!("unknown sort direction: {other}")),
        }
    }
}

/// Display-side filter. All set conditions must hold.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TradePredicate {
    pub min_value: Option<Decimal>,
    pub min_size: Option<Decimal>,
    pub side: Option<Side>,
}

impl TradePredicate {
    pub fn matches(&self, trade: &TradeRecord) -> bool {
        self.min_value.map_or(true, |min| trade.notional() >= min)
            && self.min_size.map_or(true, |min| trade.size >= min)
            && self.side.map_or(true, |side| trade.side == side)
    }
}

fn compare(key: SortKey, a: &TradeRecord, b: &TradeRecord) -> Ordering {
    match key {
        SortKey::Recency => Ordering::Equal,
        SortKey::Value => a.notional().cmp(&b.notional()),
        SortKey::Price => a.price.cmp(&b.price),
        SortKey::Timestamp => a.timestamp.cmp(&b.timestamp),
    }
}

/// Filter then sort a buffer snapshot. Never touches the input.
///
/// The sort is stable in both directions: records with equal keys keep their
/// buffer order.
pub fn project(
    trades: &[TradeRecord],
    key: SortKey,
    direction: SortDirection,
    predicate: &TradePredicate,
) -> Vec<TradeRecord> {
    let mut out: Vec<TradeRecord> = trades
        .iter()
        .filter(|t| predicate.matches(t))
        .cloned()
        .collect();

    match direction {
        SortDirection::Asc => out.sort_by(|a, b| compare(key, a, b)),
        SortDirection::Desc => out.sort_by(|a, b| compare(key, b, a)),
    }
    out
}
