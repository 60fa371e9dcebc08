//! Price trend analysis and statistical outlier detection.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Default moving-average window.
const DEFAULT_WINDOW: usize = 5;

/// z-score above which a price point counts as an outlier.
const DEFAULT_OUTLIER_THRESHOLD: f64 = 2.0;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrendDirection {
    Rising,
    Falling,
    Stable,
}

impl TrendDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Rising => "rising",
            Self::Falling => "falling",
            Self::Stable => "stable",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct TrendAnalysis {
    pub direction: TrendDirection,
    /// Confidence in [0.0, 0.9]; 0.5 for a stable reading.
    pub confidence: f64,
    /// Moving average over the trailing window.
    pub moving_average: f64,
    pub last_price: f64,
}

#[derive(Clone, Copy, Debug)]
pub struct TrendAnalyzer {
    window: usize,
}

impl Default for TrendAnalyzer {
    fn default() -> Self {
        Self { window: DEFAULT_WINDOW }
    }
}

impl TrendAnalyzer {
    pub fn new(window: usize) -> Self {
        Self { window: window.max(1) }
    }

    /// Analyze a price series, oldest first. Returns `None` for fewer than
    /// two points.
    ///
    /// Direction compares the last point against the one before it: more
    /// than 5% above is rising, more than 5% below is falling, anything in
    /// between is stable. Confidence scales with the size of the move,
    /// capped at 0.9.
    pub fn analyze(&self, prices: &[Decimal]) -> Option<TrendAnalysis> {
        if prices.len() < 2 {
            return None;
        }

        let series: Vec<f64> = prices.iter().map(decimal_to_f64).collect();
        let window = self.window.min(series.len());
        let moving_average =
            series[series.len() - window..].iter().sum::<f64>() / window as f64;

        let last = series[series.len() - 1];
        let previous = series[series.len() - 2];

        let (direction, confidence) = if last > previous * 1.05 {
            (TrendDirection::Rising, (last / previous - 1.0) * 10.0)
        } else if last < previous * 0.95 {
            (TrendDirection::Falling, (1.0 - last / previous) * 10.0)
        } else {
            (TrendDirection::Stable, 0.5)
        };

        Some(TrendAnalysis {
            direction,
            confidence: confidence.min(0.9),
            moving_average,
            last_price: last,
        })
    }
}

/// Human-readable summary of an analysis result.
pub fn describe(analysis: &TrendAnalysis) -> String {
    let hint = match analysis.direction {
        TrendDirection::Rising => "prices are climbing; watch closely before committing",
        TrendDirection::Falling => "prices are dropping; this may be a good entry point",
        TrendDirection::Stable => "prices look steady",
    };
    format!(
        "Last price {:.2}, {} trend at {:.0}% confidence ({} day avg {:.2}); {hint}.",
        analysis.last_price,
        analysis.direction.as_str(),
        analysis.confidence * 100.0,
        DEFAULT_WINDOW,
        analysis.moving_average,
    )
}

/// Indices of prices more than `threshold` standard deviations from the
/// series mean. Fewer than three points, or a flat series, yields nothing.
pub fn price_outliers(prices: &[Decimal], threshold: f64) -> Vec<usize> {
    if prices.len() < 3 {
        return Vec::new();
    }

    let series: Vec<f64> = prices.iter().map(decimal_to_f64).collect();
    let mean = series.iter().sum::<f64>() / series.len() as f64;
    let variance =
        series.iter().map(|price| (price - mean).powi(2)).sum::<f64>() / series.len() as f64;
    let std_dev = variance.sqrt();

    if std_dev <= f64::EPSILON {
        return Vec::new();
    }

    series
        .iter()
        .enumerate()
        .filter(|(_, price)| ((*price - mean) / std_dev).abs() > threshold)
        .map(|(index, _)| index)
        .collect()
}

/// [`price_outliers`] at the default 2.0σ threshold.
pub fn default_outliers(prices: &[Decimal]) -> Vec<usize> {
    price_outliers(prices, DEFAULT_OUTLIER_THRESHOLD)
}

fn decimal_to_f64(value: &Decimal) -> f64 {
    value.to_f64().unwrap_or(0.0)
}
