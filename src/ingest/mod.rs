// src/ingest/mod.rs
pub mod providers;
pub mod types;

use anyhow::{bail, Context, Result};
use serde::Deserialize;

pub use providers::lines::LineSource;
pub use providers::memory::{ChannelSource, VecSource};
pub use providers::twitter::{TwitterConfig, TwitterStream};
pub use types::{Record, RecordSource};

#[derive(Deserialize)]
struct StreamEnvelope {
    data: StreamData,
}

#[derive(Deserialize)]
struct StreamData {
    text: String,
}

#[derive(Deserialize)]
struct StreamErrors {
    errors: Vec<StreamError>,
}

#[derive(Deserialize)]
struct StreamError {
    #[serde(default)]
    title: String,
    #[serde(default)]
    detail: String,
}

/// Extract record text from one line of a stream.
///
/// Blank lines (keep-alives) yield `None`. A JSON object carrying `data.text`
/// is unwrapped; any other line is taken verbatim.
pub fn parse_stream_line(line: &str) -> Option<String> {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return None;
    }
    if trimmed.starts_with('{') {
        if let Ok(env) = serde_json::from_str::<StreamEnvelope>(trimmed) {
            return Some(env.data.text);
        }
    }
    Some(trimmed.to_string())
}

/// Strict variant for the filtered stream: every non-blank line must be a
/// tweet envelope. In-band `errors` payloads and anything else are errors.
pub fn parse_tweet_line(line: &str) -> Result<Option<String>> {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    if let Ok(env) = serde_json::from_str::<StreamEnvelope>(trimmed) {
        return Ok(Some(env.data.text));
    }
    if let Ok(e) = serde_json::from_str::<StreamErrors>(trimmed) {
        let msgs: Vec<String> = e
            .errors
            .iter()
            .map(|e| format!("{}: {}", e.title, e.detail))
            .collect();
        bail!("stream reported errors: {}", msgs.join("; "));
    }
    serde_json::from_str::<serde_json::Value>(trimmed).context("malformed stream line")?;
    bail!("stream line without data.text: {trimmed}")
}

/// Per-source sequence numbering starting at 1.
#[derive(Debug, Default)]
pub(crate) struct Sequencer {
    last: u64,
}

impl Sequencer {
    pub(crate) fn record(&mut self, text: String) -> Record {
        self.last += 1;
        Record {
            sequence_id: self.last,
            text,
        }
    }
}
