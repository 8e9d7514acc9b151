use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::str::FromStr;

use crate::models::TradeRecord;

pub const DEFAULT_BUFFER_CAP: usize = 1000;

/// What to do with records that arrive without a transaction hash.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MissingHashPolicy {
    /// Always retain them. They can never be de-duplicated, so a repeated
    /// hashless record is stored once per fetch that returns it.
    #[default]
    Keep,
    /// Discard them at merge time.
    Drop,
}

impl FromStr for MissingHashPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "keep" => Ok(MissingHashPolicy::Keep),
            "drop" => Ok(MissingHashPolicy::Drop),
            other => Err(format!("unknown missing-hash policy: {other}")),
        }
    }
}

/// Bounded, de-duplicated trade buffer ordered by fetch-batch recency.
///
/// Invariants:
/// - no two records share a transaction hash
/// - `len() <= cap()`
#[derive(Debug, Clone)]
pub struct TradeBuffer {
    trades: Vec<TradeRecord>,
    cap: usize,
    missing_hash: MissingHashPolicy,
}

impl Default for TradeBuffer {
    fn default() -> Self {
        Self::new(DEFAULT_BUFFER_CAP, MissingHashPolicy::default())
    }
}

impl TradeBuffer {
    pub fn new(cap: usize, missing_hash: MissingHashPolicy) -> Self {
        Self {
            trades: Vec::new(),
            cap,
            missing_hash,
        }
    }

    /// Merge a freshly fetched page.
    ///
    /// Records whose hash is already buffered (or repeated earlier in the same
    /// batch) are skipped. Survivors are prepended in batch order, then the
    /// tail is dropped down to `cap`. Returns how many new records are
    /// buffered after truncation.
    pub fn merge(&mut self, batch: Vec<TradeRecord>) -> usize {
        let mut seen: HashSet<String> = self
            .trades
            .iter()
            .filter_map(|t| t.transaction_hash.clone())
            .collect();

        let mut merged = Vec::with_capacity(batch.len() + self.trades.len());
        for trade in batch {
            let keep = match trade.transaction_hash.as_deref() {
                Some(hash) => seen.insert(hash.to_owned()),
                None => self.missing_hash == MissingHashPolicy::Keep,
            };
            if keep {
                merged.push(trade);
            }
        }

        let added = merged.len();
        if added == 0 {
            return 0;
        }

        merged.append(&mut self.trades);
        merged.truncate(self.cap);
        self.trades = merged;

        added.min(self.cap)
    }

    pub fn clear(&mut self) {
        self.trades.clear();
    }

    pub fn trades(&self) -> &[TradeRecord] {
        &self.trades
    }

    /// The `n` most recently merged records.
    pub fn newest(&self, n: usize) -> &[TradeRecord] {
        &self.trades[..n.min(self.trades.len())]
    }

    pub fn len(&self) -> usize {
        self.trades.len()
    }

    pub fn is_empty(&self) -> bool {
        self.trades.is_empty()
    }

    pub fn cap(&self) -> usize {
        self.cap
    }

    pub fn missing_hash_policy(&self) -> MissingHashPolicy {
        self.missing_hash
    }
}
