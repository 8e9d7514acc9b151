use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::Side;

/// Named presets exposed by the dashboard routes (`/`, `/whale-1k`, ...).
pub const TRADE_PRESETS: &[(&str, i64)] = &[
    ("whale-1k", 1_000),
    ("whale-5k", 5_000),
    ("whale-10k", 10_000),
];

/// Query parameters of one polling session.
///
/// Changing any of these resets the feed buffer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TradeFilter {
    /// Minimum cash value per trade, sent as `filterType=CASH&filterAmount=N`.
    #[serde(default)]
    pub min_cash: Option<Decimal>,
    #[serde(default)]
    pub side: Option<Side>,
    /// Restrict to one wallet (proxy address).
    #[serde(default)]
    pub user: Option<String>,
}

impl TradeFilter {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn min_cash(amount: Decimal) -> Self {
        Self {
            min_cash: Some(amount),
            ..Self::default()
        }
    }

    /// Resolve a route slug. `"all"` and `""` map to the unfiltered feed;
    /// unknown slugs return `None`.
    pub fn from_preset(slug: &str) -> Option<Self> {
        let slug = slug.trim();
        if slug.is_empty() || slug.eq_ignore_ascii_case("all") {
            return Some(Self::all());
        }
        TRADE_PRESETS
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(slug))
            .map(|(_, amount)| Self::min_cash(Decimal::from(*amount)))
    }

    /// Short label such as `All`, `$5K+` or `$250+`.
    pub fn label(&self) -> String {
        let base = match self.min_cash {
            None => "All".to_string(),
            Some(amount) => {
                let thousand = Decimal::from(1_000);
                if amount >= thousand && (amount % thousand).is_zero() {
                    format!("${}K+", (amount / thousand).normalize())
                } else {
                    format!("${}+", amount.normalize())
                }
            }
        };
        match (&self.side, &self.user) {
            (None, None) => base,
            (Some(side), None) => format!("{base} {side}"),
            (None, Some(user)) => format!("{base} @{user}"),
            (Some(side), Some(user)) => format!("{base} {side} @{user}"),
        }
    }

    /// Data API query pairs for `GET /trades`.
    pub fn query_pairs(&self, limit: u32) -> Vec<(&'static str, String)> {
        let mut pairs = vec![("limit", limit.to_string())];
        if let Some(amount) = self.min_cash {
            pairs.push(("filterType", "CASH".into()));
            pairs.push(("filterAmount", amount.normalize().to_string()));
        }
        if let Some(side) = self.side {
            pairs.push(("side", side.to_string()));
        }
        if let Some(user) = &self.user {
            pairs.push(("user", user.clone()));
        }
        pairs
    }
}

impl fmt::Display for TradeFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label())
    }
}

// ---------------------------------------------------------------------------
// Event listing filter
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventStatusFilter {
    #[default]
    Active,
    Closed,
    All,
}

impl EventStatusFilter {
    /// `active` is omitted entirely for `All`; `closed` is always sent.
    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        match self {
            EventStatusFilter::Active => {
                vec![("active", "true".into()), ("closed", "false".into())]
            }
            EventStatusFilter::Closed => {
                vec![("active", "false".into()), ("closed", "true".into())]
            }
            EventStatusFilter::All => vec![("closed", "false".into())],
        }
    }
}

impl FromStr for EventStatusFilter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "active" => Ok(EventStatusFilter::Active),
            "closed" => Ok(EventStatusFilter::Closed),
            "all" => Ok(EventStatusFilter::All),
            other => Err(format!("unknown event filter: {other}")),
        }
    }
}
