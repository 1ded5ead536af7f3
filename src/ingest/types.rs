// src/ingest/types.rs
use anyhow::Result;

/// Raw input unit. `sequence_id` counts per source from 1 and restarts with the process.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize, PartialEq, Eq)]
pub struct Record {
    pub sequence_id: u64,
    pub text: String,
}

/// Blocking pull interface over an unbounded record stream.
///
/// `Ok(None)` is end-of-stream; `Err` is fatal to the pipeline.
#[async_trait::async_trait]
pub trait RecordSource: Send {
    async fn next(&mut self) -> Result<Option<Record>>;
    fn name(&self) -> &'static str;
}
