use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::record::PriceRecord;

/// Where a board snapshot came from.
///
/// `Fallback` marks degraded mode: the upstream feed failed and the static
/// dataset was substituted. Callers can tell the two apart instead of
/// receiving silently swapped data.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeedOrigin {
    Upstream,
    Fallback,
}

/// A full board snapshot. Built fresh on every load and replaced wholesale
/// on reload; individual records are never mutated in place.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PriceBoard {
    pub records: Vec<PriceRecord>,
    pub origin: FeedOrigin,
    pub degraded_reason: Option<String>,
    pub loaded_at: DateTime<Utc>,
}

impl PriceBoard {
    pub fn upstream(records: Vec<PriceRecord>) -> Self {
        Self { records, origin: FeedOrigin::Upstream, degraded_reason: None, loaded_at: Utc::now() }
    }

    pub fn fallback(records: Vec<PriceRecord>, reason: impl Into<String>) -> Self {
        Self {
            records,
            origin: FeedOrigin::Fallback,
            degraded_reason: Some(reason.into()),
            loaded_at: Utc::now(),
        }
    }

    pub fn is_degraded(&self) -> bool {
        self.origin == FeedOrigin::Fallback
    }

    /// Case-insensitive substring filter on product name, the board search
    /// semantics.
    pub fn filter(&self, term: &str) -> Vec<&PriceRecord> {
        let needle = term.trim().to_lowercase();
        if needle.is_empty() {
            return self.records.iter().collect();
        }
        self.records
            .iter()
            .filter(|record| record.product.to_lowercase().contains(&needle))
            .collect()
    }

    pub fn find(&self, product: &str) -> Option<&PriceRecord> {
        self.records.iter().find(|record| record.product == product)
    }
}
