use gpuwatch_core::config::{AppConfig, LoadOptions};
use gpuwatch_core::trend::{default_outliers, describe, TrendAnalyzer};
use gpuwatch_core::{AdviceEngine, PriceHistory, PriceRecord};
use gpuwatch_feed::{load_board, HttpPriceSource, PriceSource};
use rust_decimal::Decimal;
use serde::Serialize;

use super::{block_on, CommandResult};

#[derive(Debug, Serialize)]
struct HistoryReport {
    command: &'static str,
    product: String,
    prices: Vec<Decimal>,
    advice: String,
    trend: Option<String>,
    outliers: Vec<usize>,
}

pub fn run(product: &str, json_output: bool) -> CommandResult {
    let config = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => config,
        Err(error) => {
            return CommandResult::failure("history", "config_validation", error.to_string(), 2)
        }
    };

    let source = match HttpPriceSource::from_config(&config.feed) {
        Ok(source) => source,
        Err(error) => {
            return CommandResult::failure("history", "feed_client", error.to_string(), 3)
        }
    };

    let fetched = block_on(async {
        let board = load_board(&source).await;
        let record = board.find(product).cloned();
        // A failing history resource degrades to an empty series; only an
        // unknown product is an error.
        let series = source.history_for(product).await.unwrap_or_default();
        (record, series)
    });
    let (record, series) = match fetched {
        Ok(pair) => pair,
        Err(error) => return CommandResult::failure("history", "runtime", error, 3),
    };

    let Some(record) = record else {
        return CommandResult::failure(
            "history",
            "unknown_product",
            format!("product `{product}` is not on the board"),
            4,
        );
    };

    let report = build_report(&record, series);

    if json_output {
        let output = serde_json::to_string_pretty(&report)
            .unwrap_or_else(|error| format!("{{\"error\":\"{error}\"}}"));
        return CommandResult { exit_code: 0, output };
    }

    CommandResult { exit_code: 0, output: render_human(&report) }
}

fn build_report(record: &PriceRecord, series: Vec<Decimal>) -> HistoryReport {
    let advice = AdviceEngine::default().classify(
        record.current_price,
        record.base_price,
        &PriceHistory::new(series.clone()),
    );
    let trend = TrendAnalyzer::default().analyze(&series).map(|analysis| describe(&analysis));
    let outliers = default_outliers(&series);

    HistoryReport {
        command: "history",
        product: record.product.clone(),
        prices: series,
        advice: advice.label.text().to_string(),
        trend,
        outliers,
    }
}

fn render_human(report: &HistoryReport) -> String {
    let mut lines = vec![format!("{}: {} recorded points", report.product, report.prices.len())];
    for price in &report.prices {
        lines.push(format!("  ¥{price}"));
    }
    if let Some(trend) = &report.trend {
        lines.push(format!("trend: {trend}"));
    }
    if !report.outliers.is_empty() {
        let marks: Vec<String> = report.outliers.iter().map(ToString::to_string).collect();
        lines.push(format!("outlier points at index: {}", marks.join(", ")));
    }
    lines.push(format!("advice: {}", report.advice));
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;

    use super::*;

    fn record() -> PriceRecord {
        PriceRecord {
            product: "NVIDIA RTX 4090".to_string(),
            current_price: Decimal::from(9_000),
            base_price: Decimal::from(10_000),
            percent_change: Decimal::from(-10),
            history: PriceHistory::new(vec![Decimal::from(10_000)]),
        }
    }

    #[test]
    fn empty_series_reports_insufficient_data() {
        let report = build_report(&record(), Vec::new());
        assert_eq!(report.advice, "Not enough data");
        assert_eq!(report.trend, None);
        assert!(render_human(&report).contains("0 recorded points"));
    }

    #[test]
    fn full_series_reports_advice_and_trend() {
        let series: Vec<Decimal> =
            [10_000, 9_900, 9_700, 9_500, 9_200, 9_100, 9_000].map(Decimal::from).to_vec();
        let report = build_report(&record(), series);
        assert_eq!(report.advice, "Strong buy");
        assert!(report.trend.is_some());
        assert!(report.outliers.is_empty(), "a steady decline has no outliers");
    }
}
