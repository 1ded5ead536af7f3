// src/sink/memory.rs
use anyhow::Result;
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::{Mutex, RwLock};

use super::Sink;
use crate::aggregate::TopK;
use crate::sentiment::Sentiment;

/// Records every publish call in order. Test helper and offline runs.
#[derive(Debug, Default)]
pub struct MemorySink {
    calls: Mutex<Vec<(Sentiment, TopK)>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> Vec<(Sentiment, TopK)> {
        self.calls.lock().expect("memory sink mutex poisoned").clone()
    }

    pub fn calls_for(&self, sentiment: Sentiment) -> Vec<TopK> {
        self.calls()
            .into_iter()
            .filter(|(s, _)| *s == sentiment)
            .map(|(_, t)| t)
            .collect()
    }
}

#[async_trait]
impl Sink for MemorySink {
    async fn publish(&self, sentiment: Sentiment, top: &TopK) -> Result<()> {
        self.calls
            .lock()
            .expect("memory sink mutex poisoned")
            .push((sentiment, top.clone()));
        Ok(())
    }

    fn name(&self) -> &'static str {
        "memory"
    }
}

/// Keeps only the most recent window per sentiment (overwrite semantics);
/// backs the `/top` routes.
#[derive(Debug, Default)]
pub struct LatestSink {
    inner: RwLock<BTreeMap<Sentiment, TopK>>,
}

impl LatestSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, sentiment: Sentiment) -> Option<TopK> {
        self.inner
            .read()
            .expect("latest sink lock poisoned")
            .get(&sentiment)
            .cloned()
    }

    pub fn snapshot(&self) -> BTreeMap<Sentiment, TopK> {
        self.inner.read().expect("latest sink lock poisoned").clone()
    }
}

#[async_trait]
impl Sink for LatestSink {
    async fn publish(&self, sentiment: Sentiment, top: &TopK) -> Result<()> {
        self.inner
            .write()
            .expect("latest sink lock poisoned")
            .insert(sentiment, top.clone());
        Ok(())
    }

    fn name(&self) -> &'static str {
        "latest"
    }
}
