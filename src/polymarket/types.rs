use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};
use std::str::FromStr;

use crate::models::{Side, TradeRecord};

// ---------------------------------------------------------------------------
// Trade (Data API, REST)
// ---------------------------------------------------------------------------

/// Raw trade as returned by `GET /trades`. Converted to [`TradeRecord`]
/// before it reaches the feed.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiTrade {
    #[serde(default)]
    pub proxy_wallet: Option<String>,
    pub side: String,
    #[serde(default)]
    pub asset: Option<String>,
    #[serde(default)]
    pub condition_id: Option<String>,
    pub size: Decimal,
    pub price: Decimal,
    pub timestamp: serde_json::Value,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub slug: Option<String>,
    #[serde(default)]
    pub icon: Option<String>,
    #[serde(default)]
    pub event_slug: Option<String>,
    #[serde(default)]
    pub outcome: Option<String>,
    #[serde(default)]
    pub outcome_index: Option<i64>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub pseudonym: Option<String>,
    #[serde(default)]
    pub profile_image: Option<String>,
    #[serde(default)]
    pub transaction_hash: Option<String>,
}

impl TryFrom<ApiTrade> for TradeRecord {
    type Error = String;

    fn try_from(trade: ApiTrade) -> Result<Self, Self::Error> {
        let side = Side::from_api_str(&trade.side)
            .ok_or_else(|| format!("unknown trade side: {}", trade.side))?;
        let timestamp = parse_trade_timestamp(&trade.timestamp)
            .ok_or_else(|| format!("invalid trade timestamp: {}", trade.timestamp))?;

        Ok(TradeRecord {
            transaction_hash: non_empty(trade.transaction_hash),
            timestamp,
            side,
            size: trade.size,
            price: trade.price,
            outcome: trade.outcome,
            title: trade.title,
            event_slug: trade.event_slug.or(trade.slug),
            condition_id: trade.condition_id,
            proxy_wallet: trade.proxy_wallet,
            name: non_empty(trade.name),
            pseudonym: trade.pseudonym,
            profile_image: non_empty(trade.profile_image),
            icon: non_empty(trade.icon),
        })
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

/// Accepts seconds or milliseconds, as a number or numeric string, or an
/// RFC 3339 timestamp. Returns seconds since epoch.
pub fn parse_trade_timestamp(ts: &serde_json::Value) -> Option<i64> {
    fn from_epoch(value: i64) -> i64 {
        // >1e12 is milliseconds
        if value > 1_000_000_000_000 {
            value / 1000
        } else {
            value
        }
    }

    match ts {
        serde_json::Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().map(|f| f as i64))
            .map(from_epoch),
        serde_json::Value::String(s) => {
            if let Ok(value) = s.parse::<i64>() {
                return Some(from_epoch(value));
            }
            chrono::DateTime::parse_from_rfc3339(s)
                .ok()
                .map(|dt| dt.timestamp())
        }
        _ => None,
    }
}

// ---------------------------------------------------------------------------
// Union-typed Gamma fields
// ---------------------------------------------------------------------------

/// Gamma sends `outcomes` / `outcomePrices` either as a JSON-encoded string
/// (`"[\"Yes\",\"No\"]"`) or as a native array. Both decode to `Vec<String>`.
pub fn string_list<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Encoded(String),
        List(Vec<serde_json::Value>),
        Null(Option<()>),
    }

    let items = match Raw::deserialize(deserializer)? {
        Raw::Null(_) => return Ok(Vec::new()),
        Raw::Encoded(s) if s.trim().is_empty() => return Ok(Vec::new()),
        Raw::Encoded(s) => serde_json::from_str::<Vec<serde_json::Value>>(&s)
            .map_err(serde::de::Error::custom)?,
        Raw::List(items) => items,
    };

    items
        .into_iter()
        .map(|item| match item {
            serde_json::Value::String(s) => Ok(s),
            serde_json::Value::Number(n) => Ok(n.to_string()),
            other => Err(serde::de::Error::custom(format!(
                "expected string or number in list, got {other}"
            ))),
        })
        .collect()
}

/// Decimal that may arrive as a number, a numeric string, `""` or `null`.
/// Anything unparseable becomes `None`.
pub fn lenient_decimal<'de, D>(deserializer: D) -> Result<Option<Decimal>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(serde_json::Value::Number(n)) => Decimal::from_str(&n.to_string())
            .or_else(|_| Decimal::from_scientific(&n.to_string()))
            .ok(),
        Some(serde_json::Value::String(s)) => Decimal::from_str(s.trim()).ok(),
        _ => None,
    })
}
