use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::Side;

/// A single fill as reported by the Data API, normalized at the boundary.
///
/// Only `transaction_hash`, `timestamp`, `size`, `price` and `side` carry
/// meaning for the feed; the remaining fields are passed through for display.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeRecord {
    /// De-duplication key. `None` when upstream omitted it or sent "".
    pub transaction_hash: Option<String>,
    /// Seconds since epoch.
    pub timestamp: i64,
    pub side: Side,
    pub size: Decimal,
    pub price: Decimal,
    #[serde(default)]
    pub outcome: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub event_slug: Option<String>,
    #[serde(default)]
    pub condition_id: Option<String>,
    #[serde(default)]
    pub proxy_wallet: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub pseudonym: Option<String>,
    #[serde(default)]
    pub profile_image: Option<String>,
    #[serde(default)]
    pub icon: Option<String>,
}

impl TradeRecord {
    /// Traded dollar value, `size * price`.
    pub fn notional(&self) -> Decimal {
        self.size * self.price
    }

    /// Display name, falling back to the pseudonym.
    pub fn display_name(&self) -> &str {
        self.name
            .as_deref()
            .filter(|n| !n.is_empty())
            .or(self.pseudonym.as_deref())
            .unwrap_or("")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(hash: &str, name: Option<&str>) -> TradeRecord {
        TradeRecord {
            transaction_hash: Some(hash.into()),
            timestamp: 1,
            side: Side::Sell,
            size: Decimal::from(4),
            price: Decimal::new(25, 2),
            outcome: None,
            title: None,
            event_slug: None,
            condition_id: None,
            proxy_wallet: None,
            name: name.map(String::from),
            pseudonym: Some("Quiet-Owl".into()),
            profile_image: None,
            icon: None,
        }
    }

    #[test]
    fn test_notional_and_display_name() {
        let trade = record("0xabc", Some(""));
        assert_eq!(trade.notional(), Decimal::ONE);
        assert_eq!(trade.display_name(), "Quiet-Owl");
        assert_eq!(record("0xabc", Some("owl")).display_name(), "owl");
    }

    #[test]
    fn test_opaque_hash_serializes_intact() {
        let trade = record("ハッシュ-ünïcode-0123456789", None);
        let json = serde_json::to_value(&trade).unwrap();
        assert_eq!(json["transaction_hash"], "ハッシュ-ünïcode-0123456789");
    }
}
