use std::collections::HashSet;

use gpuwatch_core::config::{AppConfig, LoadOptions};
use gpuwatch_core::{AdviceEngine, AdviceLabel, HISTORY_WINDOW};
use gpuwatch_feed::{fallback_records, HttpPriceSource, PriceSource};
use serde::Serialize;

use super::block_on;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
enum CheckStatus {
    Pass,
    Fail,
    Skipped,
}

#[derive(Debug, Serialize)]
struct DoctorCheck {
    name: &'static str,
    status: CheckStatus,
    details: String,
}

#[derive(Debug, Serialize)]
struct DoctorReport {
    overall_status: CheckStatus,
    summary: String,
    checks: Vec<DoctorCheck>,
}

pub fn run(json_output: bool) -> String {
    let report = build_report();

    if json_output {
        return serde_json::to_string_pretty(&report).unwrap_or_else(|error| {
            format!(
                "{{\"overall_status\":\"fail\",\"summary\":\"doctor serialization failed\",\"error\":\"{}\"}}",
                error.to_string().replace('"', "\\\"")
            )
        });
    }

    render_human(&report)
}

fn build_report() -> DoctorReport {
    let mut checks = Vec::new();

    match AppConfig::load(LoadOptions::default()) {
        Ok(config) => {
            checks.push(DoctorCheck {
                name: "config_validation",
                status: CheckStatus::Pass,
                details: "configuration loaded and validated".to_string(),
            });
            let (prices, history) = check_feed(&config);
            checks.push(prices);
            checks.push(history);
        }
        Err(error) => {
            checks.push(DoctorCheck {
                name: "config_validation",
                status: CheckStatus::Fail,
                details: error.to_string(),
            });
            checks.push(DoctorCheck {
                name: "prices_feed_reachability",
                status: CheckStatus::Skipped,
                details: "skipped because configuration did not load".to_string(),
            });
            checks.push(DoctorCheck {
                name: "history_feed_reachability",
                status: CheckStatus::Skipped,
                details: "skipped because configuration did not load".to_string(),
            });
        }
    }

    // Independent of config and network. If this fails, degraded mode has
    // nothing to serve.
    checks.push(check_fallback_dataset());

    let all_pass = checks.iter().all(|check| check.status == CheckStatus::Pass);
    let overall_status = if all_pass { CheckStatus::Pass } else { CheckStatus::Fail };
    let summary = if all_pass {
        "doctor: all readiness checks passed".to_string()
    } else {
        "doctor: one or more readiness checks failed".to_string()
    };

    DoctorReport { overall_status, summary, checks }
}

fn check_feed(config: &AppConfig) -> (DoctorCheck, DoctorCheck) {
    let source = match HttpPriceSource::from_config(&config.feed) {
        Ok(source) => source,
        Err(error) => {
            let details = format!("feed client construction failed: {error}");
            return (
                DoctorCheck {
                    name: "prices_feed_reachability",
                    status: CheckStatus::Fail,
                    details: details.clone(),
                },
                DoctorCheck {
                    name: "history_feed_reachability",
                    status: CheckStatus::Fail,
                    details,
                },
            );
        }
    };

    let probe_product =
        fallback_records().first().map(|record| record.product.clone()).unwrap_or_default();

    let result = block_on(async {
        let prices = source.latest_prices().await.map(|records| records.len());
        let history = source.history_for(&probe_product).await.map(|series| series.len());
        (prices, history)
    });
    let (prices, history) = match result {
        Ok(pair) => pair,
        Err(error) => {
            return (
                DoctorCheck {
                    name: "prices_feed_reachability",
                    status: CheckStatus::Fail,
                    details: error.clone(),
                },
                DoctorCheck {
                    name: "history_feed_reachability",
                    status: CheckStatus::Fail,
                    details: error,
                },
            );
        }
    };

    let prices_check = match prices {
        Ok(count) => DoctorCheck {
            name: "prices_feed_reachability",
            status: CheckStatus::Pass,
            details: format!("fetched {count} price rows from `{}`", config.feed.prices_url),
        },
        Err(error) => DoctorCheck {
            name: "prices_feed_reachability",
            status: CheckStatus::Fail,
            details: format!("{error} (the board will serve the static fallback)"),
        },
    };

    let history_check = match history {
        Ok(count) => DoctorCheck {
            name: "history_feed_reachability",
            status: CheckStatus::Pass,
            details: format!("fetched {count} history points for `{probe_product}`"),
        },
        Err(error) => DoctorCheck {
            name: "history_feed_reachability",
            status: CheckStatus::Fail,
            details: format!("{error} (charts will pad from the baseline)"),
        },
    };

    (prices_check, history_check)
}

fn check_fallback_dataset() -> DoctorCheck {
    let records = fallback_records();
    let engine = AdviceEngine::default();

    let unique: HashSet<&str> = records.iter().map(|record| record.product.as_str()).collect();
    if unique.len() != records.len() {
        return DoctorCheck {
            name: "fallback_dataset_integrity",
            status: CheckStatus::Fail,
            details: "fallback dataset contains duplicate product names".to_string(),
        };
    }

    for record in &records {
        if record.history.len() != HISTORY_WINDOW {
            return DoctorCheck {
                name: "fallback_dataset_integrity",
                status: CheckStatus::Fail,
                details: format!("`{}` carries a short history window", record.product),
            };
        }
        if engine.classify_record(record).label == AdviceLabel::InsufficientData {
            return DoctorCheck {
                name: "fallback_dataset_integrity",
                status: CheckStatus::Fail,
                details: format!("`{}` is not classifiable", record.product),
            };
        }
    }

    DoctorCheck {
        name: "fallback_dataset_integrity",
        status: CheckStatus::Pass,
        details: format!("{} products with full history windows", records.len()),
    }
}

fn render_human(report: &DoctorReport) -> String {
    let mut lines = Vec::new();
    lines.push(report.summary.clone());

    for check in &report.checks {
        let marker = match check.status {
            CheckStatus::Pass => "ok",
            CheckStatus::Fail => "fail",
            CheckStatus::Skipped => "skip",
        };
        lines.push(format!("[{marker}] {}: {}", check.name, check.details));
    }

    lines.join("\n")
}
