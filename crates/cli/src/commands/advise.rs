use gpuwatch_core::config::{AppConfig, LoadOptions};
use gpuwatch_core::{AdviceEngine, FeedOrigin, PriceBoard};
use gpuwatch_feed::{load_board, HttpPriceSource};
use rust_decimal::Decimal;
use serde::Serialize;

use super::{block_on, CommandResult};

#[derive(Debug, Serialize)]
struct AdviseRow {
    product: String,
    current_price: Decimal,
    base_price: Decimal,
    percent_change: Decimal,
    advice: String,
}

#[derive(Debug, Serialize)]
struct AdviseReport {
    command: &'static str,
    origin: FeedOrigin,
    degraded_reason: Option<String>,
    records: Vec<AdviseRow>,
}

pub fn run(search: Option<&str>, json_output: bool) -> CommandResult {
    let config = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => config,
        Err(error) => {
            return CommandResult::failure("advise", "config_validation", error.to_string(), 2)
        }
    };

    let source = match HttpPriceSource::from_config(&config.feed) {
        Ok(source) => source,
        Err(error) => return CommandResult::failure("advise", "feed_client", error.to_string(), 3),
    };

    let board = match block_on(load_board(&source)) {
        Ok(board) => board,
        Err(error) => return CommandResult::failure("advise", "runtime", error, 3),
    };

    let report = build_report(&board, search);

    if json_output {
        let output = serde_json::to_string_pretty(&report)
            .unwrap_or_else(|error| format!("{{\"error\":\"{error}\"}}"));
        return CommandResult { exit_code: 0, output };
    }

    CommandResult { exit_code: 0, output: render_human(&report) }
}

fn build_report(board: &PriceBoard, search: Option<&str>) -> AdviseReport {
    let engine = AdviceEngine::default();
    let records = board
        .filter(search.unwrap_or(""))
        .into_iter()
        .map(|record| AdviseRow {
            product: record.product.clone(),
            current_price: record.current_price,
            base_price: record.base_price,
            percent_change: record.percent_change,
            advice: engine.classify_record(record).label.text().to_string(),
        })
        .collect();

    AdviseReport {
        command: "advise",
        origin: board.origin,
        degraded_reason: board.degraded_reason.clone(),
        records,
    }
}

fn render_human(report: &AdviseReport) -> String {
    let mut lines = Vec::new();
    match &report.degraded_reason {
        Some(reason) => lines.push(format!("price board (fallback dataset: {reason})")),
        None => lines.push("price board (live feed)".to_string()),
    }

    if report.records.is_empty() {
        lines.push("  no products matched".to_string());
    }
    for row in &report.records {
        lines.push(format!(
            "  {}: ¥{} (baseline ¥{}, {}%) -> {}",
            row.product, row.current_price, row.base_price, row.percent_change, row.advice
        ));
    }

    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use gpuwatch_core::{PriceHistory, PriceRecord};
    use rust_decimal::Decimal;

    use super::*;

    fn board() -> PriceBoard {
        PriceBoard::upstream(vec![PriceRecord {
            product: "NVIDIA RTX 4090".to_string(),
            current_price: Decimal::from(9_000),
            base_price: Decimal::from(10_000),
            percent_change: Decimal::from(-10),
            history: PriceHistory::new(vec![Decimal::from(10_000), Decimal::from(9_500)]),
        }])
    }

    #[test]
    fn report_carries_advice_per_row() {
        let report = build_report(&board(), None);
        assert_eq!(report.records.len(), 1);
        assert_eq!(report.records[0].advice, "Strong buy");
    }

    #[test]
    fn search_narrows_the_report() {
        let report = build_report(&board(), Some("radeon"));
        assert!(report.records.is_empty());

        let human = render_human(&report);
        assert!(human.contains("no products matched"));
    }

    #[test]
    fn fallback_reason_is_surfaced_in_human_output() {
        let degraded = PriceBoard::fallback(Vec::new(), "connection refused");
        let human = render_human(&build_report(&degraded, None));
        assert!(human.contains("fallback dataset: connection refused"));
    }
}
