pub mod client;
pub mod fallback;
pub mod synth;

pub use client::{
    load_board, percent_change, FeedError, HttpPriceSource, PriceSource, StaticPriceSource,
};
pub use fallback::fallback_records;
