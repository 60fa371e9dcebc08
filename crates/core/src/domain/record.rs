use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Maximum number of historical price points kept per product.
pub const HISTORY_WINDOW: usize = 7;

/// Ordered price history, oldest first, capped at [`HISTORY_WINDOW`] entries.
///
/// Construction keeps only the most recent window, so the 0..=7 length
/// invariant holds for every value of this type. No consistency is enforced
/// between a record's current price and the last history entry.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PriceHistory(Vec<Decimal>);

impl PriceHistory {
    pub fn new(mut prices: Vec<Decimal>) -> Self {
        if prices.len() > HISTORY_WINDOW {
            prices.drain(..prices.len() - HISTORY_WINDOW);
        }
        Self(prices)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Most recent recorded price, if any.
    pub fn latest(&self) -> Option<Decimal> {
        self.0.last().copied()
    }

    pub fn as_slice(&self) -> &[Decimal] {
        &self.0
    }
}

impl From<Vec<Decimal>> for PriceHistory {
    fn from(prices: Vec<Decimal>) -> Self {
        Self::new(prices)
    }
}

/// One product row on the price board.
///
/// `product` is unique within a board snapshot. Prices are taken as-is from
/// the feed; negative or zero baselines are not rejected here.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceRecord {
    pub product: String,
    pub current_price: Decimal,
    pub base_price: Decimal,
    pub percent_change: Decimal,
    pub history: PriceHistory,
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;

    use super::{PriceHistory, HISTORY_WINDOW};

    fn prices(values: &[i64]) -> Vec<Decimal> {
        values.iter().map(|value| Decimal::from(*value)).collect()
    }

    #[test]
    fn history_keeps_at_most_the_last_seven_points() {
        let history = PriceHistory::new(prices(&[1, 2, 3, 4, 5, 6, 7, 8, 9]));

        assert_eq!(history.len(), HISTORY_WINDOW);
        assert_eq!(history.as_slice()[0], Decimal::from(3));
        assert_eq!(history.latest(), Some(Decimal::from(9)));
    }

    #[test]
    fn short_history_is_kept_unchanged() {
        let history = PriceHistory::new(prices(&[100, 101]));

        assert_eq!(history.len(), 2);
        assert_eq!(history.as_slice(), prices(&[100, 101]).as_slice());
    }

    #[test]
    fn empty_history_is_valid() {
        let history = PriceHistory::default();

        assert!(history.is_empty());
        assert_eq!(history.latest(), None);
    }
}
