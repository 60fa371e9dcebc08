//! Feed client: upstream fetch with typed fallback.
//!
//! Resource A is a JSON array of price rows; Resource B is a JSON object
//! mapping product name to a price array. Fetches are single-shot: no
//! retries, no cancellation. A failed list fetch never surfaces as an error
//! to callers — [`load_board`] substitutes the static dataset and marks the
//! snapshot as degraded instead.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use rust_decimal::Decimal;
use serde::Deserialize;
use tracing::{info, warn};

use gpuwatch_core::config::FeedConfig;
use gpuwatch_core::{PriceBoard, PriceHistory, PriceRecord};

use crate::fallback::fallback_records;

#[derive(Debug, thiserror::Error)]
pub enum FeedError {
    #[error("feed transport failure: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("feed returned status {status}")]
    Status { status: u16 },
    #[error("feed payload could not be decoded: {0}")]
    Decode(String),
}

/// Seam between the board and its data. Implemented over HTTP for the real
/// feed and in memory for tests and generated demo data.
#[async_trait]
pub trait PriceSource: Send + Sync {
    async fn latest_prices(&self) -> Result<Vec<PriceRecord>, FeedError>;

    /// Full history series for one product. A missing key is an empty
    /// sequence, not an error.
    async fn history_for(&self, product: &str) -> Result<Vec<Decimal>, FeedError>;
}

/// Wire shape of a Resource A row. Field names match the upstream feed;
/// `change` is recomputed when the feed omits it.
#[derive(Debug, Deserialize)]
struct PriceRow {
    product: String,
    price: Decimal,
    base_price: Decimal,
    #[serde(default)]
    change: Option<Decimal>,
    #[serde(default)]
    history: Vec<Decimal>,
}

impl PriceRow {
    fn into_record(self) -> PriceRecord {
        let percent_change =
            self.change.unwrap_or_else(|| percent_change(self.price, self.base_price));
        PriceRecord {
            product: self.product,
            current_price: self.price,
            base_price: self.base_price,
            percent_change,
            history: PriceHistory::new(self.history),
        }
    }
}

/// Signed percent change of `current` against `base`, rounded to 2dp.
/// A zero baseline yields zero rather than dividing by it.
pub fn percent_change(current: Decimal, base: Decimal) -> Decimal {
    if base.is_zero() {
        return Decimal::ZERO;
    }
    ((current - base) / base * Decimal::ONE_HUNDRED).round_dp(2)
}

pub struct HttpPriceSource {
    client: Client,
    prices_url: String,
    history_url: String,
}

impl HttpPriceSource {
    pub fn from_config(config: &FeedConfig) -> Result<Self, FeedError> {
        let client =
            Client::builder().timeout(Duration::from_secs(config.timeout_secs)).build()?;
        Ok(Self {
            client,
            prices_url: config.prices_url.clone(),
            history_url: config.history_url.clone(),
        })
    }
}

#[async_trait]
impl PriceSource for HttpPriceSource {
    async fn latest_prices(&self) -> Result<Vec<PriceRecord>, FeedError> {
        let response = self.client.get(&self.prices_url).send().await?;
        if !response.status().is_success() {
            return Err(FeedError::Status { status: response.status().as_u16() });
        }

        let rows: Vec<PriceRow> =
            response.json().await.map_err(|error| FeedError::Decode(error.to_string()))?;
        Ok(rows.into_iter().map(PriceRow::into_record).collect())
    }

    async fn history_for(&self, product: &str) -> Result<Vec<Decimal>, FeedError> {
        let response = self.client.get(&self.history_url).send().await?;
        if !response.status().is_success() {
            return Err(FeedError::Status { status: response.status().as_u16() });
        }

        let mut series: HashMap<String, Vec<Decimal>> =
            response.json().await.map_err(|error| FeedError::Decode(error.to_string()))?;
        Ok(series.remove(product).unwrap_or_default())
    }
}

/// In-memory source over a fixed record set.
#[derive(Clone, Debug, Default)]
pub struct StaticPriceSource {
    records: Vec<PriceRecord>,
    histories: HashMap<String, Vec<Decimal>>,
}

impl StaticPriceSource {
    pub fn new(records: Vec<PriceRecord>) -> Self {
        Self { records, histories: HashMap::new() }
    }

    pub fn with_history(mut self, product: &str, series: Vec<Decimal>) -> Self {
        self.histories.insert(product.to_string(), series);
        self
    }
}

#[async_trait]
impl PriceSource for StaticPriceSource {
    async fn latest_prices(&self) -> Result<Vec<PriceRecord>, FeedError> {
        Ok(self.records.clone())
    }

    async fn history_for(&self, product: &str) -> Result<Vec<Decimal>, FeedError> {
        Ok(self.histories.get(product).cloned().unwrap_or_default())
    }
}

/// Load a full board snapshot. Infallible: on any feed error the static
/// dataset is substituted wholesale and the snapshot is typed as degraded.
pub async fn load_board<S: PriceSource + ?Sized>(source: &S) -> PriceBoard {
    match source.latest_prices().await {
        Ok(records) => {
            info!(
                event_name = "feed.load.upstream",
                record_count = records.len(),
                "loaded price list from upstream feed"
            );
            PriceBoard::upstream(records)
        }
        Err(error) => {
            let records = fallback_records();
            warn!(
                event_name = "feed.load.fallback",
                error = %error,
                record_count = records.len(),
                "upstream feed failed; serving static fallback dataset"
            );
            PriceBoard::fallback(records, error.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use rust_decimal::Decimal;

    use gpuwatch_core::{FeedOrigin, PriceHistory, PriceRecord};

    use super::{load_board, percent_change, FeedError, PriceSource, StaticPriceSource};

    struct FailingSource;

    #[async_trait]
    impl PriceSource for FailingSource {
        async fn latest_prices(&self) -> Result<Vec<PriceRecord>, FeedError> {
            Err(FeedError::Status { status: 502 })
        }

        async fn history_for(&self, _product: &str) -> Result<Vec<Decimal>, FeedError> {
            Err(FeedError::Status { status: 502 })
        }
    }

    fn record(product: &str, price: i64) -> PriceRecord {
        PriceRecord {
            product: product.to_string(),
            current_price: Decimal::from(price),
            base_price: Decimal::from(price),
            percent_change: Decimal::ZERO,
            history: PriceHistory::default(),
        }
    }

    #[tokio::test]
    async fn healthy_source_yields_an_upstream_board() {
        let source = StaticPriceSource::new(vec![record("RTX 4090", 15_999)]);

        let board = load_board(&source).await;

        assert_eq!(board.origin, FeedOrigin::Upstream);
        assert_eq!(board.records.len(), 1);
        assert!(!board.is_degraded());
    }

    #[tokio::test]
    async fn failing_source_substitutes_the_fallback_dataset() {
        let board = load_board(&FailingSource).await;

        assert_eq!(board.origin, FeedOrigin::Fallback);
        assert_eq!(board.records.len(), 5);
        assert!(board.degraded_reason.as_deref().unwrap_or_default().contains("502"));
    }

    #[tokio::test]
    async fn missing_history_key_is_an_empty_sequence() {
        let source = StaticPriceSource::new(Vec::new())
            .with_history("RTX 4090", vec![Decimal::from(15_999)]);

        let known = source.history_for("RTX 4090").await.expect("history");
        let unknown = source.history_for("RTX 9090").await.expect("history");

        assert_eq!(known.len(), 1);
        assert!(unknown.is_empty());
    }

    #[test]
    fn percent_change_is_signed_and_rounded() {
        assert_eq!(
            percent_change(Decimal::from(15_999), Decimal::from(12_999)),
            Decimal::new(2308, 2)
        );
        assert_eq!(
            percent_change(Decimal::from(7_399), Decimal::from(7_499)),
            Decimal::new(-133, 2)
        );
        assert_eq!(percent_change(Decimal::from(100), Decimal::from(100)), Decimal::ZERO);
    }

    #[test]
    fn percent_change_guards_a_zero_baseline() {
        assert_eq!(percent_change(Decimal::from(100), Decimal::ZERO), Decimal::ZERO);
    }

    #[test]
    fn wire_rows_recompute_change_when_absent() {
        let raw = r#"[
            {"product": "RTX 4090", "price": 15999, "base_price": 12999,
             "history": [13999, 14499]},
            {"product": "RX 7900 XT", "price": 7399, "base_price": 7499, "change": -1.3}
        ]"#;

        let rows: Vec<super::PriceRow> = serde_json::from_str(raw).expect("rows decode");
        let records: Vec<PriceRecord> =
            rows.into_iter().map(super::PriceRow::into_record).collect();

        assert_eq!(records[0].percent_change, Decimal::new(2308, 2));
        assert_eq!(records[0].history.len(), 2);
        assert_eq!(records[1].percent_change, Decimal::new(-13, 1));
        assert!(records[1].history.is_empty());
    }
}
