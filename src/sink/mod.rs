// src/sink/mod.rs
//! Output side of the pipeline: one `publish` per closed window and sentiment.

pub mod file;
pub mod log;
pub mod memory;
pub mod webhook;

use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::aggregate::TopK;
use crate::sentiment::Sentiment;

pub use file::FileSink;
pub use log::LogSink;
pub use memory::{LatestSink, MemorySink};
pub use webhook::WebhookSink;

/// How a destination treats consecutive windows of the same sentiment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WriteMode {
    /// Replace prior content; only the latest window survives.
    #[default]
    Overwrite,
    /// Keep every window, each introduced by a header line.
    Append,
}

#[async_trait::async_trait]
pub trait Sink: Send + Sync {
    /// Called once per closed window that produced at least one entry.
    /// Failures are reported, never retried by the caller.
    async fn publish(&self, sentiment: Sentiment, top: &TopK) -> Result<()>;
    fn name(&self) -> &'static str;
}

#[async_trait::async_trait]
impl<S: Sink + ?Sized> Sink for Arc<S> {
    async fn publish(&self, sentiment: Sentiment, top: &TopK) -> Result<()> {
        (**self).publish(sentiment, top).await
    }

    fn name(&self) -> &'static str {
        (**self).name()
    }
}

/// Header line used by append-mode destinations.
pub fn window_header(top: &TopK) -> String {
    format!(
        "# {} {} .. {}",
        top.window.sentiment,
        top.window.start.to_rfc3339(),
        top.window.end.to_rfc3339()
    )
}

/// Fan-out to several sinks. Every sink is attempted; failures are collected.
#[derive(Default)]
pub struct SinkMux {
    sinks: Vec<Arc<dyn Sink>>,
}

impl SinkMux {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, sink: Arc<dyn Sink>) -> Self {
        self.sinks.push(sink);
        self
    }

    pub fn len(&self) -> usize {
        self.sinks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sinks.is_empty()
    }
}

#[async_trait::async_trait]
impl Sink for SinkMux {
    async fn publish(&self, sentiment: Sentiment, top: &TopK) -> Result<()> {
        let mut failed = Vec::new();
        for s in &self.sinks {
            if let Err(e) = s.publish(sentiment, top).await {
                tracing::warn!(target: "sink", sink = s.name(), %sentiment, error = %format!("{e:#}"), "sink publish failed");
                failed.push(s.name());
            }
        }
        if failed.is_empty() {
            Ok(())
        } else {
            Err(anyhow!("publish failed for: {}", failed.join(", ")))
        }
    }

    fn name(&self) -> &'static str {
        "mux"
    }
}
