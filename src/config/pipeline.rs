// src/config/pipeline.rs
use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use crate::sink::WriteMode;

pub const ENV_CONFIG_PATH: &str = "PIPELINE_CONFIG_PATH";

fn default_output_dir() -> PathBuf {
    PathBuf::from("output")
}

fn default_search_terms_path() -> PathBuf {
    PathBuf::from("search_terms.txt")
}

/// Where records come from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum SourceConfig {
    #[default]
    Stdin,
    File {
        path: PathBuf,
    },
    Twitter {
        #[serde(default = "default_search_terms_path")]
        search_terms_path: PathBuf,
    },
}

/// Where ranked windows go.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum SinkConfig {
    File {
        #[serde(default = "default_output_dir")]
        dir: PathBuf,
        #[serde(default)]
        mode: WriteMode,
    },
    Log,
    Webhook {
        url: String,
    },
}

impl Default for SinkConfig {
    fn default() -> Self {
        SinkConfig::File {
            dir: default_output_dir(),
            mode: WriteMode::Overwrite,
        }
    }
}

/// Process-wide settings; read once at startup and shared read-only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Tumbling window length in seconds.
    pub window_secs: u64,
    pub top_k: usize,
    /// Normalize/classify/tokenize workers.
    pub workers: usize,
    /// Period of the window-closing tick.
    pub tick_millis: u64,
    pub channel_capacity: usize,
    pub drop_numeric: bool,
    /// Close and publish open windows when the input ends.
    pub flush_on_shutdown: bool,
    pub stopwords_path: Option<PathBuf>,
    pub source: SourceConfig,
    pub sink: SinkConfig,
    /// Serve `/health`, `/metrics` and `/top` when set.
    pub http_addr: Option<String>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            window_secs: 60,
            top_k: 10,
            workers: 4,
            tick_millis: 1_000,
            channel_capacity: 1_024,
            drop_numeric: true,
            flush_on_shutdown: false,
            stopwords_path: None,
            source: SourceConfig::default(),
            sink: SinkConfig::default(),
            http_addr: None,
        }
    }
}

impl PipelineConfig {
    pub fn window(&self) -> Duration {
        Duration::from_secs(self.window_secs)
    }

    pub fn tick(&self) -> Duration {
        Duration::from_millis(self.tick_millis)
    }

    /// Load from an explicit TOML or JSON file (by extension; TOML when unknown).
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("reading pipeline config from {}", path.display()))?;
        let ext = path
            .extension()
            .and_then(|s| s.to_str())
            .unwrap_or_default()
            .to_ascii_lowercase();
        let cfg: Self = if ext == "json" {
            serde_json::from_str(&content).context("parsing JSON pipeline config")?
        } else {
            toml::from_str(&content).context("parsing TOML pipeline config")?
        };
        Ok(cfg.sanitized())
    }

    /// Resolve config file + env overrides:
    /// 1) $PIPELINE_CONFIG_PATH
    /// 2) config/pipeline.toml
    /// 3) config/pipeline.json
    /// 4) defaults
    pub fn load_default() -> Result<Self> {
        let base = if let Ok(p) = std::env::var(ENV_CONFIG_PATH) {
            let pb = PathBuf::from(p);
            if !pb.exists() {
                return Err(anyhow!("{ENV_CONFIG_PATH} points to non-existent path"));
            }
            Self::load_from(&pb)?
        } else if Path::new("config/pipeline.toml").exists() {
            Self::load_from(Path::new("config/pipeline.toml"))?
        } else if Path::new("config/pipeline.json").exists() {
            Self::load_from(Path::new("config/pipeline.json"))?
        } else {
            Self::default()
        };
        Ok(base.with_env_overrides().sanitized())
    }

    /// `WINDOW_SECS`, `TOP_K`, `WORKERS`, `TICK_MILLIS`, `FLUSH_ON_SHUTDOWN`, `HTTP_ADDR`.
    /// Unparsable values are ignored.
    pub fn with_env_overrides(mut self) -> Self {
        if let Some(v) = env_parse("WINDOW_SECS") {
            self.window_secs = v;
        }
        if let Some(v) = env_parse("TOP_K") {
            self.top_k = v;
        }
        if let Some(v) = env_parse("WORKERS") {
            self.workers = v;
        }
        if let Some(v) = env_parse("TICK_MILLIS") {
            self.tick_millis = v;
        }
        if let Ok(v) = std::env::var("FLUSH_ON_SHUTDOWN") {
            self.flush_on_shutdown = matches!(v.trim(), "1" | "true" | "yes");
        }
        if let Ok(v) = std::env::var("HTTP_ADDR") {
            let v = v.trim();
            self.http_addr = (!v.is_empty()).then(|| v.to_string());
        }
        self
    }

    /// Clamp numeric settings to their minimum of 1.
    pub fn sanitized(mut self) -> Self {
        self.window_secs = self.window_secs.max(1);
        self.top_k = self.top_k.max(1);
        self.workers = self.workers.max(1);
        self.tick_millis = self.tick_millis.max(1);
        self.channel_capacity = self.channel_capacity.max(1);
        self
    }
}

fn env_parse<T: FromStr>(name: &str) -> Option<T> {
    std::env::var(name).ok().and_then(|v| v.trim().parse().ok())
}
