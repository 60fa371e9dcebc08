pub mod advice;
pub mod config;
pub mod domain;
pub mod errors;
pub mod trend;

pub use advice::{AdviceCategory, AdviceEngine, AdviceLabel, AdviceThresholds, BuyingAdvice};
pub use domain::board::{FeedOrigin, PriceBoard};
pub use domain::record::{PriceHistory, PriceRecord, HISTORY_WINDOW};
pub use errors::{ApplicationError, DomainError, InterfaceError};
pub use trend::{TrendAnalysis, TrendAnalyzer, TrendDirection};
