//! Price board routes.
//!
//! HTML Endpoints:
//! - `GET  /`                                  — comparison board page (HTML)
//!
//! JSON API Endpoints:
//! - `GET  /api/v1/prices?search=`             — current board snapshot
//! - `POST /api/v1/refresh`                    — reload from the upstream feed
//! - `GET  /api/v1/prices/{product}/history`   — chart series for one product

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Html,
    routing::{get, post},
    Json, Router,
};
use chrono::{Duration, Utc};
use gpuwatch_core::{
    errors::{ApplicationError, DomainError, InterfaceError},
    AdviceLabel, FeedOrigin, PriceBoard, PriceHistory, PriceRecord, TrendAnalyzer, HISTORY_WINDOW,
};
use gpuwatch_feed::synth::pad_history;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tera::{Context, Tera};
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::state::AppState;

// ---------------------------------------------------------------------------
// Request / Response types
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize, Default)]
pub struct BoardQuery {
    pub search: Option<String>,
}

#[derive(Clone, Debug, Serialize)]
pub struct AdviceView {
    pub label: AdviceLabel,
    pub text: &'static str,
    pub css_class: &'static str,
}

#[derive(Clone, Debug, Serialize)]
pub struct PriceRowView {
    pub product: String,
    pub current_price: Decimal,
    pub base_price: Decimal,
    pub percent_change: Decimal,
    pub change_class: &'static str,
    pub advice: AdviceView,
    pub trend: Option<&'static str>,
}

#[derive(Debug, Serialize)]
pub struct BoardResponse {
    pub origin: FeedOrigin,
    pub degraded: bool,
    pub degraded_reason: Option<String>,
    pub loaded_at: String,
    pub records: Vec<PriceRowView>,
}

#[derive(Debug, Serialize)]
pub struct RefreshResponse {
    pub origin: FeedOrigin,
    pub degraded: bool,
    pub record_count: usize,
    pub loaded_at: String,
}

#[derive(Debug, Serialize)]
pub struct HistoryResponse {
    pub product: String,
    pub labels: Vec<String>,
    pub prices: Vec<Decimal>,
    pub advice: AdviceView,
    pub trend: Option<&'static str>,
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
    pub correlation_id: String,
}

// ---------------------------------------------------------------------------
// Router
// ---------------------------------------------------------------------------

/// Initialize Tera with the board templates, falling back to the embedded
/// copy when the filesystem set is unavailable.
fn init_templates() -> Arc<Tera> {
    let mut tera = match Tera::new("templates/board/**/*") {
        Ok(t) => t,
        Err(e) => {
            warn!(error = %e, "failed to load board templates from filesystem, using empty Tera instance");
            Tera::default()
        }
    };

    tera.add_raw_template("index.html", include_str!("../../../templates/board/index.html")).ok();

    Arc::new(tera)
}

#[derive(Clone)]
struct BoardState {
    app: AppState,
    templates: Arc<Tera>,
}

pub fn router(app: AppState) -> Router {
    let templates = init_templates();

    Router::new()
        .route("/", get(board_page))
        .route("/api/v1/prices", get(list_prices))
        .route("/api/v1/refresh", post(refresh_board))
        .route("/api/v1/prices/{product}/history", get(product_history))
        .with_state(BoardState { app, templates })
}

// ---------------------------------------------------------------------------
// View assembly
// ---------------------------------------------------------------------------

fn advice_view(state: &AppState, record: &PriceRecord) -> AdviceView {
    let advice = state.engine.classify_record(record);
    AdviceView {
        label: advice.label,
        text: advice.label.text(),
        css_class: advice.category.css_class(),
    }
}

fn row_view(state: &AppState, record: &PriceRecord) -> PriceRowView {
    let change_class = if record.percent_change > Decimal::ZERO {
        "price-up"
    } else if record.percent_change < Decimal::ZERO {
        "price-down"
    } else {
        "price-same"
    };
    let trend = TrendAnalyzer::default()
        .analyze(record.history.as_slice())
        .map(|analysis| analysis.direction.as_str());

    PriceRowView {
        product: record.product.clone(),
        current_price: record.current_price,
        base_price: record.base_price,
        percent_change: record.percent_change,
        change_class,
        advice: advice_view(state, record),
        trend,
    }
}

fn board_response(state: &AppState, board: &PriceBoard, search: Option<&str>) -> BoardResponse {
    let records = board
        .filter(search.unwrap_or(""))
        .into_iter()
        .map(|record| row_view(state, record))
        .collect();

    BoardResponse {
        origin: board.origin,
        degraded: board.is_degraded(),
        degraded_reason: board.degraded_reason.clone(),
        loaded_at: board.loaded_at.to_rfc3339(),
        records,
    }
}

/// Calendar labels for the trailing `len` days, today last.
fn day_labels(len: usize) -> Vec<String> {
    let today = Utc::now().date_naive();
    (0..len)
        .map(|offset| {
            let day = today - Duration::days((len - 1 - offset) as i64);
            day.format("%b %d").to_string()
        })
        .collect()
}

fn error_response(error: ApplicationError) -> (StatusCode, Json<ErrorBody>) {
    let interface = error.into_interface(Uuid::new_v4().to_string());
    let status = match &interface {
        InterfaceError::BadRequest { .. } => StatusCode::BAD_REQUEST,
        InterfaceError::NotFound { .. } => StatusCode::NOT_FOUND,
        InterfaceError::ServiceUnavailable { .. } => StatusCode::SERVICE_UNAVAILABLE,
        InterfaceError::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
    };
    error!(
        event_name = "board.request.failed",
        correlation_id = %interface.correlation_id(),
        error = %interface,
        "board request failed"
    );
    let body = ErrorBody {
        error: interface.user_message().to_string(),
        correlation_id: interface.correlation_id().to_string(),
    };
    (status, Json(body))
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// Render the comparison board page over a fresh feed load.
async fn board_page(
    State(state): State<BoardState>,
) -> Result<Html<String>, (StatusCode, Json<ErrorBody>)> {
    let board = state.app.refresh().await;
    let response = board_response(&state.app, &board, None);

    let mut context = Context::new();
    context.insert("records", &response.records);
    context.insert("degraded", &response.degraded);
    context.insert("degraded_reason", &response.degraded_reason);
    context.insert("loaded_at", &board.loaded_at.format("%Y-%m-%d %H:%M UTC").to_string());

    match state.templates.render("index.html", &context) {
        Ok(html) => Ok(Html(html)),
        Err(render_error) => {
            warn!(error = %render_error, "board template rendering failed");
            Err(error_response(ApplicationError::Configuration(
                "board template rendering failed".to_string(),
            )))
        }
    }
}

async fn list_prices(
    Query(query): Query<BoardQuery>,
    State(state): State<BoardState>,
) -> Json<BoardResponse> {
    let board = state.app.snapshot().await;
    Json(board_response(&state.app, &board, query.search.as_deref()))
}

async fn refresh_board(State(state): State<BoardState>) -> Json<RefreshResponse> {
    let board = state.app.refresh().await;
    info!(
        event_name = "board.refresh",
        origin = ?board.origin,
        record_count = board.records.len(),
        "board refreshed on demand"
    );
    Json(RefreshResponse {
        origin: board.origin,
        degraded: board.is_degraded(),
        record_count: board.records.len(),
        loaded_at: board.loaded_at.to_rfc3339(),
    })
}

/// Chart series for one product. The product must be on the current board;
/// a missing or failing history resource degrades to an empty series, which
/// the advice engine reports as insufficient data.
async fn product_history(
    Path(product): Path<String>,
    State(state): State<BoardState>,
) -> Result<Json<HistoryResponse>, (StatusCode, Json<ErrorBody>)> {
    let board = state.app.snapshot().await;
    let Some(record) = board.find(&product) else {
        return Err(error_response(DomainError::UnknownProduct { product }.into()));
    };

    let series = match state.app.source.history_for(&record.product).await {
        Ok(series) => series,
        Err(fetch_error) => {
            warn!(
                event_name = "board.history.degraded",
                product = %record.product,
                error = %fetch_error,
                "history fetch failed; charting without recorded history"
            );
            Vec::new()
        }
    };

    let advice = state.engine_advice(record, &series);
    let trend =
        TrendAnalyzer::default().analyze(&series).map(|analysis| analysis.direction.as_str());

    let mut rng = rand::thread_rng();
    let prices = pad_history(&series, record.base_price, &mut rng);
    debug_assert_eq!(prices.len(), HISTORY_WINDOW);

    Ok(Json(HistoryResponse {
        product: record.product.clone(),
        labels: day_labels(prices.len()),
        prices,
        advice,
        trend,
    }))
}

impl BoardState {
    /// Advice computed over the fetched series rather than the board's
    /// embedded history, so a thin history resource shows up honestly.
    fn engine_advice(&self, record: &PriceRecord, series: &[Decimal]) -> AdviceView {
        let advice = self.app.engine.classify(
            record.current_price,
            record.base_price,
            &PriceHistory::new(series.to_vec()),
        );
        AdviceView {
            label: advice.label,
            text: advice.label.text(),
            css_class: advice.category.css_class(),
        }
    }
}
