// src/lib.rs
// Public library surface for the binary and integration tests.

pub mod aggregate;
pub mod api;
pub mod clock;
pub mod config;
pub mod ingest;
pub mod metrics;
pub mod normalize;
pub mod pipeline;
pub mod sentiment;
pub mod sink;
pub mod tokenize;

// ---- Re-exports for stable public API ----
pub use crate::aggregate::{TopK, WindowAggregator, WindowKey, WordCounts};
pub use crate::config::PipelineConfig;
pub use crate::pipeline::{Pipeline, PipelineSettings, RunStats};
pub use crate::sentiment::{PolarityScorer, Sentiment};
pub use crate::sink::{Sink, WriteMode};
pub use crate::tokenize::{StopWords, Token, Tokenizer};
