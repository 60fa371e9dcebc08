//! Buying-advice classification.
//!
//! Classifies a product's current price against its baseline and the mean of
//! its most recent history points. Ordered rules, first match wins; the
//! classifier is total over its numeric domain and never errors. A zero or
//! negative baseline is not rejected: no division by the baseline happens
//! here, so the result stays deterministic (everything compares below a
//! non-positive threshold, which lands on Avoid for any positive price).

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::record::{PriceHistory, PriceRecord};

/// Recommendation label shown in the advice column.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdviceLabel {
    StrongBuy,
    Buy,
    Wait,
    Avoid,
    InsufficientData,
}

impl AdviceLabel {
    pub fn text(&self) -> &'static str {
        match self {
            Self::StrongBuy => "Strong buy",
            Self::Buy => "Buy",
            Self::Wait => "Hold off",
            Self::Avoid => "Avoid",
            Self::InsufficientData => "Not enough data",
        }
    }
}

/// Display category driving the row styling.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdviceCategory {
    Buy,
    Wait,
    Avoid,
}

impl AdviceCategory {
    pub fn css_class(&self) -> &'static str {
        match self {
            Self::Buy => "advice-buy",
            Self::Wait => "advice-wait",
            Self::Avoid => "advice-avoid",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuyingAdvice {
    pub label: AdviceLabel,
    pub category: AdviceCategory,
}

/// Thresholds for the discount/momentum rules.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdviceThresholds {
    /// Baseline multiplier below which the price is a strong buy (default 0.95).
    pub strong_buy_discount: Decimal,
    /// Baseline multiplier bounding the "tracking near baseline" band (default 1.05).
    pub buy_band: Decimal,
    /// Baseline multiplier above which the price should be avoided (default 1.10).
    pub avoid_premium: Decimal,
    /// Number of trailing history points averaged into the recent trend (default 3).
    pub recent_window: usize,
}

impl Default for AdviceThresholds {
    fn default() -> Self {
        Self {
            strong_buy_discount: Decimal::new(95, 2),
            buy_band: Decimal::new(105, 2),
            avoid_premium: Decimal::new(110, 2),
            recent_window: 3,
        }
    }
}

#[derive(Clone, Copy, Debug, Default)]
pub struct AdviceEngine {
    thresholds: AdviceThresholds,
}

impl AdviceEngine {
    pub fn new(thresholds: AdviceThresholds) -> Self {
        Self { thresholds }
    }

    pub fn thresholds(&self) -> &AdviceThresholds {
        &self.thresholds
    }

    /// Classify a current price against its baseline and recent history.
    ///
    /// Fewer than two history points short-circuits to `InsufficientData`;
    /// afterwards the ordered rules apply, first match wins. Thresholds are
    /// inclusive on the buy side and exclusive on the avoid side.
    pub fn classify(
        &self,
        current_price: Decimal,
        base_price: Decimal,
        history: &PriceHistory,
    ) -> BuyingAdvice {
        if history.len() < 2 {
            return BuyingAdvice {
                label: AdviceLabel::InsufficientData,
                category: AdviceCategory::Wait,
            };
        }

        let recent_average = recent_average(history.as_slice(), self.thresholds.recent_window);

        if current_price <= base_price * self.thresholds.strong_buy_discount {
            BuyingAdvice { label: AdviceLabel::StrongBuy, category: AdviceCategory::Buy }
        } else if current_price <= base_price * self.thresholds.buy_band
            && current_price <= recent_average
        {
            BuyingAdvice { label: AdviceLabel::Buy, category: AdviceCategory::Buy }
        } else if current_price > base_price * self.thresholds.avoid_premium {
            BuyingAdvice { label: AdviceLabel::Avoid, category: AdviceCategory::Avoid }
        } else {
            BuyingAdvice { label: AdviceLabel::Wait, category: AdviceCategory::Wait }
        }
    }

    pub fn classify_record(&self, record: &PriceRecord) -> BuyingAdvice {
        self.classify(record.current_price, record.base_price, &record.history)
    }
}

/// Arithmetic mean of the trailing `window` entries. The caller guarantees a
/// non-empty slice.
fn recent_average(prices: &[Decimal], window: usize) -> Decimal {
    let tail_start = prices.len().saturating_sub(window);
    let tail = &prices[tail_start..];
    let sum: Decimal = tail.iter().copied().sum();
    sum / Decimal::from(tail.len() as u64)
}
