// src/ingest/providers/memory.rs
use anyhow::{anyhow, Result};
use async_trait::async_trait;
use std::collections::VecDeque;

use crate::ingest::types::{Record, RecordSource};
use crate::ingest::Sequencer;

/// Fixed list of texts, optionally ending in an error instead of end-of-stream.
pub struct VecSource {
    items: VecDeque<String>,
    seq: Sequencer,
    fail_with: Option<String>,
}

impl VecSource {
    pub fn new<I, S>(texts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            items: texts.into_iter().map(Into::into).collect(),
            seq: Sequencer::default(),
            fail_with: None,
        }
    }

    /// After the texts are exhausted, report `msg` as a stream error.
    pub fn failing_with(mut self, msg: impl Into<String>) -> Self {
        self.fail_with = Some(msg.into());
        self
    }
}

/// Texts pushed through a channel; closing every sender ends the stream.
pub struct ChannelSource {
    rx: tokio::sync::mpsc::Receiver<String>,
    seq: Sequencer,
}

impl ChannelSource {
    pub fn new(rx: tokio::sync::mpsc::Receiver<String>) -> Self {
        Self {
            rx,
            seq: Sequencer::default(),
        }
    }
}

#[async_trait]
impl RecordSource for ChannelSource {
    async fn next(&mut self) -> Result<Option<Record>> {
        Ok(self.rx.recv().await.map(|text| self.seq.record(text)))
    }

    fn name(&self) -> &'static str {
        "channel"
    }
}

#[async_trait]
impl RecordSource for VecSource {
    async fn next(&mut self) -> Result<Option<Record>> {
        match self.items.pop_front() {
            Some(text) => Ok(Some(self.seq.record(text))),
            None => match self.fail_with.take() {
                Some(msg) => Err(anyhow!(msg)),
                None => Ok(None),
            },
        }
    }

    fn name(&self) -> &'static str {
        "memory"
    }
}
