// src/sink/file.rs
use anyhow::{Context, Result};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;

use super::{window_header, Sink, WriteMode};
use crate::aggregate::TopK;
use crate::sentiment::Sentiment;

/// One text file per sentiment (`{dir}/{sentiment}.txt`), lines `"{word}, {count}"`.
#[derive(Debug, Clone)]
pub struct FileSink {
    dir: PathBuf,
    mode: WriteMode,
}

impl FileSink {
    pub fn new(dir: impl Into<PathBuf>, mode: WriteMode) -> Self {
        Self {
            dir: dir.into(),
            mode,
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path_for(&self, sentiment: Sentiment) -> PathBuf {
        self.dir.join(format!("{}.txt", sentiment.as_str()))
    }
}

fn render(top: &TopK, mode: WriteMode) -> String {
    let mut out = String::new();
    if mode == WriteMode::Append {
        out.push_str(&window_header(top));
        out.push('\n');
    }
    for line in top.lines() {
        out.push_str(&line);
        out.push('\n');
    }
    out
}

#[async_trait]
impl Sink for FileSink {
    async fn publish(&self, sentiment: Sentiment, top: &TopK) -> Result<()> {
        fs::create_dir_all(&self.dir)
            .await
            .with_context(|| format!("creating sink dir {}", self.dir.display()))?;
        let path = self.path_for(sentiment);
        let body = render(top, self.mode);

        match self.mode {
            WriteMode::Overwrite => {
                // write + rename so readers never observe a half-written file
                let tmp = path.with_extension("txt.tmp");
                fs::write(&tmp, body.as_bytes())
                    .await
                    .with_context(|| format!("writing {}", tmp.display()))?;
                fs::rename(&tmp, &path)
                    .await
                    .with_context(|| format!("replacing {}", path.display()))?;
            }
            WriteMode::Append => {
                let mut f = fs::OpenOptions::new()
                    .create(true)
                    .append(true)
                    .open(&path)
                    .await
                    .with_context(|| format!("opening {}", path.display()))?;
                f.write_all(body.as_bytes())
                    .await
                    .with_context(|| format!("appending {}", path.display()))?;
                f.flush().await?;
            }
        }

        tracing::debug!(
            target: "sink",
            path = %path.display(),
            entries = top.entries.len(),
            "window written"
        );
        Ok(())
    }

    fn name(&self) -> &'static str {
        "file"
    }
}
