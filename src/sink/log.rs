// src/sink/log.rs
use anyhow::Result;
use async_trait::async_trait;

use super::Sink;
use crate::aggregate::TopK;
use crate::sentiment::Sentiment;

/// Emits each window as one `info` event; useful when running without storage.
#[derive(Debug, Clone, Default)]
pub struct LogSink;

#[async_trait]
impl Sink for LogSink {
    async fn publish(&self, sentiment: Sentiment, top: &TopK) -> Result<()> {
        tracing::info!(
            target: "sink",
            %sentiment,
            window_start = %top.window.start.to_rfc3339(),
            window_end = %top.window.end.to_rfc3339(),
            top = %top.lines().join(" / "),
            "top words"
        );
        Ok(())
    }

    fn name(&self) -> &'static str {
        "log"
    }
}
