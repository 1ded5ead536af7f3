// src/sink/webhook.rs
use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;

use super::Sink;
use crate::aggregate::TopK;
use crate::sentiment::Sentiment;

/// Posts a Slack-compatible `{"text": ...}` message per window.
#[derive(Clone)]
pub struct WebhookSink {
    url: String,
    client: Client,
    timeout: Duration,
}

impl WebhookSink {
    pub fn new(url: String) -> Self {
        Self {
            url,
            client: Client::new(),
            timeout: Duration::from_secs(5),
        }
    }

    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout = Duration::from_secs(secs);
        self
    }
}

pub fn message_text(sentiment: Sentiment, top: &TopK) -> String {
    format!(
        "*Top {} words* ({} .. {})\n{}",
        sentiment,
        top.window.start.format("%H:%M:%S"),
        top.window.end.format("%H:%M:%S"),
        top.lines().join("\n")
    )
}

#[async_trait]
impl Sink for WebhookSink {
    async fn publish(&self, sentiment: Sentiment, top: &TopK) -> Result<()> {
        let body = serde_json::json!({ "text": message_text(sentiment, top) });

        self.client
            .post(&self.url)
            .timeout(self.timeout)
            .json(&body)
            .send()
            .await
            .context("webhook post")?
            .error_for_status()
            .context("webhook non-2xx")?;
        Ok(())
    }

    fn name(&self) -> &'static str {
        "webhook"
    }
}
