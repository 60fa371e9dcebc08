//! Static fallback dataset served when the upstream feed is unreachable.

use rust_decimal::Decimal;

use gpuwatch_core::{PriceHistory, PriceRecord};

fn record(
    product: &str,
    price: i64,
    base_price: i64,
    change: Decimal,
    history: &[i64],
) -> PriceRecord {
    PriceRecord {
        product: product.to_string(),
        current_price: Decimal::from(price),
        base_price: Decimal::from(base_price),
        percent_change: change,
        history: PriceHistory::new(history.iter().map(|value| Decimal::from(*value)).collect()),
    }
}

/// The built-in five-card dataset, one week of history each.
pub fn fallback_records() -> Vec<PriceRecord> {
    vec![
        record(
            "NVIDIA RTX 4090",
            15_999,
            12_999,
            Decimal::new(231, 1),
            &[13_999, 14_499, 14_999, 15_499, 15_799, 15_999, 15_999],
        ),
        record(
            "NVIDIA RTX 4080",
            8_499,
            7_999,
            Decimal::new(63, 1),
            &[7_999, 7_999, 8_099, 8_199, 8_299, 8_399, 8_499],
        ),
        record(
            "NVIDIA RTX 4070 Ti",
            6_499,
            6_499,
            Decimal::ZERO,
            &[6_499, 6_499, 6_499, 6_499, 6_499, 6_499, 6_499],
        ),
        record(
            "AMD RX 7900 XTX",
            7_999,
            7_999,
            Decimal::ZERO,
            &[7_999, 7_999, 7_999, 7_999, 7_999, 7_999, 7_999],
        ),
        record(
            "AMD RX 7900 XT",
            7_399,
            7_499,
            Decimal::new(-13, 1),
            &[7_499, 7_499, 7_499, 7_499, 7_499, 7_499, 7_399],
        ),
    ]
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use gpuwatch_core::{AdviceEngine, AdviceLabel, HISTORY_WINDOW};

    use super::fallback_records;

    #[test]
    fn dataset_has_five_unique_products() {
        let records = fallback_records();
        let names: HashSet<_> = records.iter().map(|record| record.product.as_str()).collect();

        assert_eq!(records.len(), 5);
        assert_eq!(names.len(), 5);
    }

    #[test]
    fn every_history_fills_the_window() {
        for record in fallback_records() {
            assert_eq!(record.history.len(), HISTORY_WINDOW, "{}", record.product);
        }
    }

    #[test]
    fn every_record_is_classifiable() {
        let engine = AdviceEngine::default();
        for record in fallback_records() {
            let advice = engine.classify_record(&record);
            assert_ne!(advice.label, AdviceLabel::InsufficientData, "{}", record.product);
        }
    }

    #[test]
    fn flat_priced_cards_read_as_buy() {
        // Current price equals baseline and the recent mean for the 4070 Ti
        // and the 7900 XTX; both land inside the buy band.
        let records = fallback_records();
        let engine = AdviceEngine::default();

        for product in ["NVIDIA RTX 4070 Ti", "AMD RX 7900 XTX"] {
            let record =
                records.iter().find(|record| record.product == product).expect("record");
            assert_eq!(engine.classify_record(record).label, AdviceLabel::Buy, "{product}");
        }
    }
}
