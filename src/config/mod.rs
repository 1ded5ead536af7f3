// src/config/mod.rs
pub mod pipeline;
pub mod stopwords;

pub use pipeline::{PipelineConfig, SinkConfig, SourceConfig};
pub use stopwords::{load_stopwords, load_stopwords_from};
