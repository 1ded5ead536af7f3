// src/aggregate/mod.rs
//! Windowed word-frequency aggregation: counting state, tumbling windows and
//! Top-K ranking.

pub mod counts;
pub mod topk;
pub mod window;

pub use counts::{WordCountAccumulator, WordCounts};
pub use topk::{extract, extract_for, RankedWord, TopK, DEFAULT_TOP_K};
pub use window::{ClosedWindow, Offer, WindowAggregator, WindowKey, WindowSpec, DEFAULT_WINDOW};
