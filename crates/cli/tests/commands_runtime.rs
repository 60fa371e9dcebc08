use std::env;
use std::sync::{Mutex, OnceLock};

use gpuwatch_cli::commands::{advise, config, doctor, history};
use serde_json::Value;

// Port 9 (discard) refuses connections immediately, so feed probes fail
// fast and deterministically.
const UNREACHABLE_PRICES: &str = "http://127.0.0.1:9/gpu_prices.json";
const UNREACHABLE_HISTORY: &str = "http://127.0.0.1:9/price_history.json";

#[test]
fn advise_serves_the_fallback_board_when_the_feed_is_down() {
    with_env(
        &[
            ("GPUWATCH_FEED_PRICES_URL", UNREACHABLE_PRICES),
            ("GPUWATCH_FEED_HISTORY_URL", UNREACHABLE_HISTORY),
        ],
        || {
            let result = advise::run(None, true);
            assert_eq!(result.exit_code, 0, "fallback substitution is not an error");

            let payload = parse_payload(&result.output);
            assert_eq!(payload["command"], "advise");
            assert_eq!(payload["origin"], "fallback");
            assert_eq!(payload["records"].as_array().unwrap().len(), 5);
        },
    );
}

#[test]
fn advise_rejects_an_invalid_feed_url_before_any_network_work() {
    with_env(&[("GPUWATCH_FEED_PRICES_URL", "ftp://example.com/prices")], || {
        let result = advise::run(None, false);
        assert_eq!(result.exit_code, 2, "expected config validation failure code");

        let payload = parse_payload(&result.output);
        assert_eq!(payload["command"], "advise");
        assert_eq!(payload["status"], "error");
        assert_eq!(payload["error_class"], "config_validation");
    });
}

#[test]
fn history_reports_unknown_products_distinctly() {
    with_env(
        &[
            ("GPUWATCH_FEED_PRICES_URL", UNREACHABLE_PRICES),
            ("GPUWATCH_FEED_HISTORY_URL", UNREACHABLE_HISTORY),
        ],
        || {
            let result = history::run("Voodoo 2", false);
            assert_eq!(result.exit_code, 4);

            let payload = parse_payload(&result.output);
            assert_eq!(payload["command"], "history");
            assert_eq!(payload["error_class"], "unknown_product");
        },
    );
}

#[test]
fn history_degrades_to_insufficient_data_when_the_series_is_unavailable() {
    with_env(
        &[
            ("GPUWATCH_FEED_PRICES_URL", UNREACHABLE_PRICES),
            ("GPUWATCH_FEED_HISTORY_URL", UNREACHABLE_HISTORY),
        ],
        || {
            // The fallback board carries this product, but the history
            // resource is unreachable.
            let result = history::run("NVIDIA RTX 4090", true);
            assert_eq!(result.exit_code, 0);

            let payload = parse_payload(&result.output);
            assert_eq!(payload["product"], "NVIDIA RTX 4090");
            assert_eq!(payload["prices"].as_array().unwrap().len(), 0);
            assert_eq!(payload["advice"], "Not enough data");
        },
    );
}

#[test]
fn doctor_flags_feed_outage_but_passes_fallback_integrity() {
    with_env(
        &[
            ("GPUWATCH_FEED_PRICES_URL", UNREACHABLE_PRICES),
            ("GPUWATCH_FEED_HISTORY_URL", UNREACHABLE_HISTORY),
        ],
        || {
            let report = parse_payload(&doctor::run(true));
            assert_eq!(report["overall_status"], "fail");

            let checks = report["checks"].as_array().unwrap();
            let status_of = |name: &str| {
                checks
                    .iter()
                    .find(|check| check["name"] == name)
                    .map(|check| check["status"].clone())
                    .unwrap_or(Value::Null)
            };
            assert_eq!(status_of("config_validation"), "pass");
            assert_eq!(status_of("prices_feed_reachability"), "fail");
            assert_eq!(status_of("history_feed_reachability"), "fail");
            assert_eq!(status_of("fallback_dataset_integrity"), "pass");
        },
    );
}

#[test]
fn config_attributes_env_overrides_to_their_variable() {
    with_env(&[("GPUWATCH_FEED_PRICES_URL", "https://mirror.example/prices.json")], || {
        let output = config::run();
        assert!(output.contains("source precedence: env > file > default"));
        assert!(output
            .contains("feed.prices_url = https://mirror.example/prices.json (source: env (GPUWATCH_FEED_PRICES_URL))"));
        assert!(output.contains("server.port = 8080 (source: default)"));
    });
}

fn parse_payload(output: &str) -> Value {
    serde_json::from_str(output).expect("command output should be valid JSON")
}

fn with_env(vars: &[(&str, &str)], test_fn: impl FnOnce()) {
    static ENV_LOCK: OnceLock<Mutex<()>> = OnceLock::new();
    let _guard =
        ENV_LOCK.get_or_init(|| Mutex::new(())).lock().expect("env mutex should not be poisoned");

    let keys = [
        "GPUWATCH_FEED_PRICES_URL",
        "GPUWATCH_FEED_HISTORY_URL",
        "GPUWATCH_FEED_TIMEOUT_SECS",
        "GPUWATCH_SERVER_BIND_ADDRESS",
        "GPUWATCH_SERVER_PORT",
        "GPUWATCH_SERVER_GRACEFUL_SHUTDOWN_SECS",
        "GPUWATCH_LOGGING_LEVEL",
        "GPUWATCH_LOGGING_FORMAT",
        "GPUWATCH_LOG_LEVEL",
        "GPUWATCH_LOG_FORMAT",
    ];

    let previous_values: Vec<(&str, Option<String>)> =
        keys.iter().map(|key| (*key, env::var(key).ok())).collect();

    for key in &keys {
        env::remove_var(key);
    }
    for (key, value) in vars {
        env::set_var(key, value);
    }

    test_fn();

    for (key, value) in previous_values {
        if let Some(value) = value {
            env::set_var(key, value);
        } else {
            env::remove_var(key);
        }
    }
}
