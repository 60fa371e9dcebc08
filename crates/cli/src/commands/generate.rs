use std::fs;
use std::path::Path;

use gpuwatch_feed::synth::synthesize_week;
use gpuwatch_feed::{fallback_records, percent_change};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde_json::json;

use super::CommandResult;

/// Write `gpu_prices.json` and `price_history.json` demo feed files to the
/// output directory, synthesized from the fallback catalog. The same seed
/// reproduces the same week.
pub fn run(out_dir: &Path, seed: Option<u64>) -> CommandResult {
    let mut rng = match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };

    let mut rows = Vec::new();
    let mut histories = serde_json::Map::new();

    for record in fallback_records() {
        let floor = record.history.as_slice().iter().copied().min();
        let series = synthesize_week(record.base_price, floor, &mut rng);
        let current = series.last().copied().unwrap_or(record.base_price);
        let change = percent_change(current, record.base_price);

        rows.push(json!({
            "product": record.product,
            "price": current,
            "base_price": record.base_price,
            "change": change,
            "history": series,
        }));
        histories.insert(record.product.clone(), json!(series));
    }

    if let Err(error) = fs::create_dir_all(out_dir) {
        return CommandResult::failure(
            "generate",
            "io",
            format!("could not create `{}`: {error}", out_dir.display()),
            5,
        );
    }

    let files =
        [("gpu_prices.json", json!(rows)), ("price_history.json", serde_json::Value::Object(histories))];
    for (name, payload) in files {
        let path = out_dir.join(name);
        let rendered = match serde_json::to_string_pretty(&payload) {
            Ok(rendered) => rendered,
            Err(error) => {
                return CommandResult::failure("generate", "serialization", error.to_string(), 5)
            }
        };
        if let Err(error) = fs::write(&path, rendered) {
            return CommandResult::failure(
                "generate",
                "io",
                format!("could not write `{}`: {error}", path.display()),
                5,
            );
        }
    }

    CommandResult::success(
        "generate",
        format!("wrote {} products to `{}`", rows.len(), out_dir.display()),
    )
}

#[cfg(test)]
mod tests {
    use std::fs;

    use serde_json::Value;

    use super::run;

    #[test]
    fn writes_both_feed_files() {
        let dir = tempfile::tempdir().unwrap();
        let result = run(dir.path(), Some(7));
        assert_eq!(result.exit_code, 0);

        let prices: Value =
            serde_json::from_str(&fs::read_to_string(dir.path().join("gpu_prices.json")).unwrap())
                .unwrap();
        let rows = prices.as_array().unwrap();
        assert_eq!(rows.len(), 5);
        assert_eq!(rows[0]["history"].as_array().unwrap().len(), 7);

        let histories: Value = serde_json::from_str(
            &fs::read_to_string(dir.path().join("price_history.json")).unwrap(),
        )
        .unwrap();
        assert_eq!(histories.as_object().unwrap().len(), 5);
    }

    #[test]
    fn identical_seeds_reproduce_identical_feeds() {
        let first = tempfile::tempdir().unwrap();
        let second = tempfile::tempdir().unwrap();
        run(first.path(), Some(42));
        run(second.path(), Some(42));

        let left = fs::read_to_string(first.path().join("gpu_prices.json")).unwrap();
        let right = fs::read_to_string(second.path().join("gpu_prices.json")).unwrap();
        assert_eq!(left, right);
    }

    #[test]
    fn generated_rows_decode_as_feed_input() {
        let dir = tempfile::tempdir().unwrap();
        run(dir.path(), Some(3));

        let raw = fs::read_to_string(dir.path().join("gpu_prices.json")).unwrap();
        let rows: Vec<Value> = serde_json::from_str(&raw).unwrap();
        for row in rows {
            assert!(row["product"].is_string());
            assert!(row["price"].is_string() || row["price"].is_number());
            assert!(row["base_price"].is_string() || row["base_price"].is_number());
        }
    }
}
