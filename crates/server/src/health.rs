use std::sync::Arc;

use axum::{extract::State, http::StatusCode, routing::get, Json, Router};
use chrono::Utc;
use gpuwatch_feed::PriceSource;
use serde::Serialize;

#[derive(Clone)]
pub struct HealthState {
    source: Arc<dyn PriceSource>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct HealthCheck {
    pub status: &'static str,
    pub detail: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub service: HealthCheck,
    pub feed: HealthCheck,
    pub checked_at: String,
}

pub fn router(source: Arc<dyn PriceSource>) -> Router {
    Router::new().route("/health", get(health)).with_state(HealthState { source })
}

/// The service stays ready when the upstream feed is down; the static
/// fallback keeps the board functional, so feed trouble is reported as a
/// degraded check rather than an unhealthy service.
pub async fn health(State(state): State<HealthState>) -> (StatusCode, Json<HealthResponse>) {
    let feed = feed_check(state.source.as_ref()).await;

    let payload = HealthResponse {
        status: "ready",
        service: HealthCheck {
            status: "ready",
            detail: "gpuwatch-server runtime initialized".to_string(),
        },
        feed,
        checked_at: Utc::now().to_rfc3339(),
    };

    (StatusCode::OK, Json(payload))
}

async fn feed_check(source: &dyn PriceSource) -> HealthCheck {
    match source.latest_prices().await {
        Ok(records) => HealthCheck {
            status: "ready",
            detail: format!("upstream feed returned {} records", records.len()),
        },
        Err(error) => HealthCheck {
            status: "degraded",
            detail: format!("upstream feed failed: {error}; serving static fallback"),
        },
    }
}

#[cfg(test)]
mod tests {
    use axum::extract::State;
    use gpuwatch_core::{PriceHistory, PriceRecord};
    use gpuwatch_feed::{FeedError, StaticPriceSource};
    use rust_decimal::Decimal;

    use super::*;

    struct FailingSource;

    #[async_trait::async_trait]
    impl PriceSource for FailingSource {
        async fn latest_prices(&self) -> Result<Vec<PriceRecord>, FeedError> {
            Err(FeedError::Status { status: 503 })
        }

        async fn history_for(&self, _product: &str) -> Result<Vec<Decimal>, FeedError> {
            Ok(Vec::new())
        }
    }

    #[tokio::test]
    async fn health_is_ready_when_feed_responds() {
        let record = PriceRecord {
            product: "NVIDIA RTX 4090".to_string(),
            current_price: Decimal::from(9_000),
            base_price: Decimal::from(10_000),
            percent_change: Decimal::from(-10),
            history: PriceHistory::new(vec![Decimal::from(10_000), Decimal::from(9_000)]),
        };
        let state = HealthState { source: Arc::new(StaticPriceSource::new(vec![record])) };

        let (status, Json(payload)) = health(State(state)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(payload.status, "ready");
        assert_eq!(payload.feed.status, "ready");
        assert_eq!(payload.feed.detail, "upstream feed returned 1 records");
    }

    #[tokio::test]
    async fn feed_outage_degrades_the_check_but_not_the_service() {
        let state = HealthState { source: Arc::new(FailingSource) };

        let (status, Json(payload)) = health(State(state)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(payload.status, "ready");
        assert_eq!(payload.feed.status, "degraded");
        assert!(payload.feed.detail.contains("503"));
    }
}
