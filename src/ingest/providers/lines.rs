// src/ingest/providers/lines.rs
use anyhow::{Context, Result};
use async_trait::async_trait;
use std::path::Path;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader, Lines};

use crate::ingest::types::{Record, RecordSource};
use crate::ingest::{parse_stream_line, Sequencer};

/// One record per non-empty line of any async reader (stdin, a file, a pipe).
pub struct LineSource<R> {
    lines: Lines<BufReader<R>>,
    seq: Sequencer,
    name: &'static str,
}

impl<R: AsyncRead + Unpin + Send> LineSource<R> {
    pub fn new(reader: R, name: &'static str) -> Self {
        Self {
            lines: BufReader::new(reader).lines(),
            seq: Sequencer::default(),
            name,
        }
    }
}

impl LineSource<tokio::io::Stdin> {
    pub fn stdin() -> Self {
        Self::new(tokio::io::stdin(), "stdin")
    }
}

impl LineSource<tokio::fs::File> {
    pub async fn open(path: &Path) -> Result<Self> {
        let f = tokio::fs::File::open(path)
            .await
            .with_context(|| format!("opening record file {}", path.display()))?;
        Ok(Self::new(f, "file"))
    }
}

#[async_trait]
impl<R: AsyncRead + Unpin + Send> RecordSource for LineSource<R> {
    async fn next(&mut self) -> Result<Option<Record>> {
        loop {
            let Some(line) = self
                .lines
                .next_line()
                .await
                .with_context(|| format!("reading {}", self.name))?
            else {
                return Ok(None);
            };
            if let Some(text) = parse_stream_line(&line) {
                return Ok(Some(self.seq.record(text)));
            }
        }
    }

    fn name(&self) -> &'static str {
        self.name
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn skips_blank_lines_and_numbers_records() {
        let input: &[u8] = b"first\n\n{\"data\":{\"text\":\"second\"}}\n   \nthird";
        let mut src = LineSource::new(input, "bytes");
        let mut got = Vec::new();
        while let Some(r) = src.next().await.unwrap() {
            got.push((r.sequence_id, r.text));
        }
        assert_eq!(
            got,
            vec![
                (1, "first".to_string()),
                (2, "second".to_string()),
                (3, "third".to_string())
            ]
        );
    }
}
