// src/ingest/providers/twitter.rs
//! Twitter v2 filtered-stream source.
//!
//! Startup replaces every existing stream rule with one rule per search term,
//! then the long-lived stream is read line by line. Blank lines are
//! keep-alives. Any non-success status is an error carrying status and body.

use anyhow::{anyhow, bail, Context, Result};
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::path::Path;

use crate::ingest::types::{Record, RecordSource};
use crate::ingest::{parse_tweet_line, Sequencer};

pub const DEFAULT_STREAM_URL: &str = "https://api.twitter.com/2/tweets/search/stream";
/// Original English posts from established accounts only.
pub const DEFAULT_RULE_SUFFIX: &str =
    "followers_count:150 -is:retweet -is:reply is:verified -is:nullcast lang:en";
const USER_AGENT: &str = "v2FilteredStreamRust";

const ENV_BEARER: &str = "TWITTER_BEARER_TOKEN";
const ENV_STREAM_URL: &str = "TWITTER_STREAM_URL";

#[derive(Debug, Clone)]
pub struct TwitterConfig {
    pub bearer_token: String,
    pub stream_url: String,
    pub rule_suffix: String,
    pub search_terms: Vec<String>,
}

impl TwitterConfig {
    /// Bearer token from `$TWITTER_BEARER_TOKEN`; stream URL overridable via `$TWITTER_STREAM_URL`.
    pub fn from_env(search_terms: Vec<String>) -> Result<Self> {
        let bearer_token =
            std::env::var(ENV_BEARER).map_err(|_| anyhow!("Missing {ENV_BEARER} env var"))?;
        Ok(Self {
            bearer_token,
            stream_url: std::env::var(ENV_STREAM_URL)
                .unwrap_or_else(|_| DEFAULT_STREAM_URL.to_string()),
            rule_suffix: DEFAULT_RULE_SUFFIX.to_string(),
            search_terms,
        })
    }

    fn rules_url(&self) -> String {
        format!("{}/rules", self.stream_url.trim_end_matches('/'))
    }
}

/// One search term per line; blank lines ignored.
pub fn load_search_terms(path: &Path) -> Result<Vec<String>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("reading search terms from {}", path.display()))?;
    Ok(content
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(str::to_string)
        .collect())
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StreamRule {
    #[serde(default)]
    pub id: String,
    pub value: String,
}

#[derive(Debug, Deserialize)]
struct RulesResponse {
    #[serde(default)]
    data: Vec<StreamRule>,
}

pub struct TwitterStream {
    client: Client,
    cfg: TwitterConfig,
    resp: Option<Response>,
    buf: Vec<u8>,
    ready: VecDeque<String>,
    seq: Sequencer,
    ended: bool,
}

impl TwitterStream {
    pub fn new(cfg: TwitterConfig) -> Self {
        Self {
            client: Client::new(),
            cfg,
            resp: None,
            buf: Vec::new(),
            ready: VecDeque::new(),
            seq: Sequencer::default(),
            ended: false,
        }
    }

    fn authed(&self, req: RequestBuilder) -> RequestBuilder {
        req.bearer_auth(&self.cfg.bearer_token)
            .header(reqwest::header::USER_AGENT, USER_AGENT)
    }

    pub async fn get_rules(&self) -> Result<Vec<StreamRule>> {
        let resp = self
            .authed(self.client.get(self.cfg.rules_url()))
            .send()
            .await
            .context("get stream rules")?;
        let resp = expect_status(resp, StatusCode::OK, "get rules").await?;
        let rules: RulesResponse = resp.json().await.context("parse stream rules")?;
        Ok(rules.data)
    }

    pub async fn delete_rules(&self, ids: &[String]) -> Result<()> {
        if ids.is_empty() {
            return Ok(());
        }
        let body = serde_json::json!({ "delete": { "ids": ids } });
        let resp = self
            .authed(self.client.post(self.cfg.rules_url()))
            .json(&body)
            .send()
            .await
            .context("delete stream rules")?;
        expect_status(resp, StatusCode::OK, "delete rules").await?;
        Ok(())
    }

    pub async fn add_rules(&self) -> Result<()> {
        let rules: Vec<_> = self
            .cfg
            .search_terms
            .iter()
            .map(|t| serde_json::json!({ "value": format!("{} {}", t, self.cfg.rule_suffix) }))
            .collect();
        if rules.is_empty() {
            bail!("no search terms configured for the stream");
        }
        let body = serde_json::json!({ "add": rules });
        let resp = self
            .authed(self.client.post(self.cfg.rules_url()))
            .json(&body)
            .send()
            .await
            .context("add stream rules")?;
        expect_status(resp, StatusCode::CREATED, "add rules").await?;
        Ok(())
    }

    /// Drop all current rules and install the configured search terms.
    pub async fn reset_rules(&self) -> Result<()> {
        let existing = self.get_rules().await?;
        let ids: Vec<String> = existing.into_iter().map(|r| r.id).collect();
        tracing::info!(target: "ingest", deleted = ids.len(), "resetting stream rules");
        self.delete_rules(&ids).await?;
        self.add_rules().await?;
        tracing::info!(
            target: "ingest",
            added = self.cfg.search_terms.len(),
            "stream rules installed"
        );
        Ok(())
    }

    pub async fn connect(&mut self) -> Result<()> {
        let resp = self
            .authed(self.client.get(&self.cfg.stream_url))
            .send()
            .await
            .context("connect stream")?;
        let resp = expect_status(resp, StatusCode::OK, "get stream").await?;
        tracing::info!(target: "ingest", status = %resp.status(), "stream connected");
        self.resp = Some(resp);
        Ok(())
    }

    /// Move complete lines from `buf` into `ready`.
    fn split_lines(&mut self) -> Result<()> {
        while let Some(pos) = self.buf.iter().position(|b| *b == b'\n') {
            let line: Vec<u8> = self.buf.drain(..=pos).collect();
            if let Some(text) = parse_tweet_line(&String::from_utf8_lossy(&line))? {
                self.ready.push_back(text);
            }
        }
        Ok(())
    }
}

async fn expect_status(resp: Response, expected: StatusCode, what: &str) -> Result<Response> {
    let status = resp.status();
    if status != expected {
        let body = resp.text().await.unwrap_or_default();
        bail!("Cannot {what} (HTTP {status}): {body}");
    }
    Ok(resp)
}

#[async_trait]
impl RecordSource for TwitterStream {
    async fn next(&mut self) -> Result<Option<Record>> {
        if self.resp.is_none() && !self.ended {
            self.connect().await?;
        }
        loop {
            if let Some(text) = self.ready.pop_front() {
                return Ok(Some(self.seq.record(text)));
            }
            if self.ended {
                return Ok(None);
            }
            let Some(resp) = self.resp.as_mut() else {
                return Ok(None);
            };
            match resp.chunk().await.context("reading stream")? {
                Some(bytes) => {
                    self.buf.extend_from_slice(&bytes);
                    self.split_lines()?;
                }
                None => {
                    // flush an unterminated last line
                    self.buf.push(b'\n');
                    self.split_lines()?;
                    self.ended = true;
                    self.resp = None;
                    tracing::info!(target: "ingest", "stream closed by server");
                }
            }
        }
    }

    fn name(&self) -> &'static str {
        "twitter"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cfg() -> TwitterConfig {
        TwitterConfig {
            bearer_token: "t".into(),
            stream_url: "http://localhost:9/stream/".into(),
            rule_suffix: DEFAULT_RULE_SUFFIX.into(),
            search_terms: vec!["rust".into()],
        }
    }

    #[test]
    fn rules_url_is_derived_from_stream_url() {
        assert_eq!(cfg().rules_url(), "http://localhost:9/stream/rules");
    }

    #[test]
    fn split_lines_handles_partial_chunks() {
        let mut s = TwitterStream::new(cfg());
        s.buf.extend_from_slice(b"{\"data\":{\"text\":\"one\"}}\r\n\r\n{\"data\":{\"te");
        s.split_lines().unwrap();
        assert_eq!(s.ready.pop_front().as_deref(), Some("one"));
        assert!(s.ready.is_empty());
        s.buf.extend_from_slice(b"xt\":\"two\"}}\n");
        s.split_lines().unwrap();
        assert_eq!(s.ready.pop_front().as_deref(), Some("two"));
        assert!(s.buf.is_empty());
    }

    #[test]
    fn in_band_stream_error_fails_the_source() {
        let mut s = TwitterStream::new(cfg());
        s.buf.extend_from_slice(
            b"{\"data\":{\"text\":\"ok\"}}\n{\"errors\":[{\"title\":\"operational-disconnect\",\"detail\":\"gone\"}]}\n",
        );
        let err = s.split_lines().unwrap_err();
        assert!(format!("{err:#}").contains("operational-disconnect"));
        assert!(!s.ready.iter().any(|t| t.contains("errors")));
    }

    #[test]
    fn search_terms_file_skips_blanks() {
        let dir = tempfile::tempdir().unwrap();
        let p = dir.path().join("search_terms.txt");
        std::fs::write(&p, "rust\n\n  tokio  \n").unwrap();
        assert_eq!(load_search_terms(&p).unwrap(), vec!["rust", "tokio"]);
    }
}
