// src/config/stopwords.rs
use anyhow::{anyhow, Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

use crate::tokenize::{parse_plain_list, StopWords};

pub const ENV_STOPWORDS_PATH: &str = "STOPWORDS_PATH";

/// Load a stopword list from an explicit path. Supports TOML (`words = [...]`),
/// a JSON array, or plain text with one word per line.
pub fn load_stopwords_from(path: &Path) -> Result<StopWords> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("reading stopwords from {}", path.display()))?;
    let ext = path
        .extension()
        .and_then(|s| s.to_str())
        .unwrap_or_default()
        .to_ascii_lowercase();
    parse_stopwords(&content, ext.as_str())
}

/// Resolution order:
/// 1) `explicit` (from the pipeline config)
/// 2) $STOPWORDS_PATH
/// 3) built-in English list
pub fn load_stopwords(explicit: Option<&Path>) -> Result<StopWords> {
    if let Some(p) = explicit {
        return load_stopwords_from(p);
    }
    if let Ok(p) = std::env::var(ENV_STOPWORDS_PATH) {
        let pb = PathBuf::from(p);
        if !pb.exists() {
            return Err(anyhow!("{ENV_STOPWORDS_PATH} points to non-existent path"));
        }
        return load_stopwords_from(&pb);
    }
    Ok(StopWords::english())
}

fn parse_stopwords(s: &str, hint_ext: &str) -> Result<StopWords> {
    match hint_ext {
        "toml" => parse_toml(s),
        "json" => parse_json(s),
        _ => {
            // Unknown extension: structured formats first, plain text as fallback.
            if let Ok(v) = parse_json(s) {
                return Ok(v);
            }
            if s.contains("words") {
                if let Ok(v) = parse_toml(s) {
                    return Ok(v);
                }
            }
            Ok(StopWords::new(parse_plain_list(s)))
        }
    }
}

fn parse_toml(s: &str) -> Result<StopWords> {
    #[derive(serde::Deserialize)]
    struct TomlList {
        words: Vec<String>,
    }
    let v: TomlList = toml::from_str(s).context("parsing TOML stopword list")?;
    Ok(StopWords::new(v.words))
}

fn parse_json(s: &str) -> Result<StopWords> {
    let v: Vec<String> = serde_json::from_str(s).context("parsing JSON stopword list")?;
    Ok(StopWords::new(v))
}
