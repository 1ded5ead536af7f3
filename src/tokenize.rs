//! # Tokenizer / Filter
//! Classified text → `(sentiment, word)` tokens.
//!
//! Words are maximal runs of word characters (letters, digits, `_`),
//! lowercased, with stopwords removed. Digit-only runs are dropped unless the
//! tokenizer is built with `keep_numeric(true)`.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::Arc;

use crate::sentiment::{ClassifiedRecord, Sentiment};

static RE_WORD: Lazy<Regex> = Lazy::new(|| Regex::new(r"\w+").expect("word regex"));

/// Built-in English list used when no external list is configured.
const DEFAULT_STOPWORDS: &str = include_str!("../stopwords_en.txt");

/// One word attributed to one sentiment.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Token {
    pub sentiment: Sentiment,
    pub word: String,
}

/// Read-only stopword set shared by all workers.
#[derive(Debug, Clone, Default)]
pub struct StopWords {
    words: Arc<HashSet<String>>,
}

impl StopWords {
    /// Build from raw entries: trimmed, lowercased, empties dropped.
    pub fn new<I, S>(items: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let words = items
            .into_iter()
            .map(|s| s.as_ref().trim().to_lowercase())
            .filter(|s| !s.is_empty())
            .collect::<HashSet<_>>();
        Self {
            words: Arc::new(words),
        }
    }

    pub fn english() -> Self {
        Self::new(parse_plain_list(DEFAULT_STOPWORDS))
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn contains(&self, word: &str) -> bool {
        self.words.contains(word)
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }
}

/// Plain text list: one entry per line, `#` starts a comment.
pub(crate) fn parse_plain_list(s: &str) -> Vec<String> {
    s.lines()
        .map(|l| l.split('#').next().unwrap_or_default().trim())
        .filter(|l| !l.is_empty())
        .map(str::to_string)
        .collect()
}

#[derive(Debug, Clone)]
pub struct Tokenizer {
    stopwords: StopWords,
    keep_numeric: bool,
}

impl Tokenizer {
    pub fn new(stopwords: StopWords) -> Self {
        Self {
            stopwords,
            keep_numeric: false,
        }
    }

    pub fn keep_numeric(mut self, keep: bool) -> Self {
        self.keep_numeric = keep;
        self
    }

    pub fn stopwords(&self) -> &StopWords {
        &self.stopwords
    }

    /// Lowercased, filtered words of `text`, left to right.
    pub fn words<'a>(&'a self, text: &'a str) -> impl Iterator<Item = String> + 'a {
        RE_WORD
            .find_iter(text)
            .map(|m| m.as_str().to_lowercase())
            .filter(move |w| self.keep_numeric || !w.chars().all(|c| c.is_ascii_digit()))
            .filter(move |w| !self.stopwords.contains(w))
    }

    pub fn tokenize(&self, sentiment: Sentiment, text: &str) -> Vec<Token> {
        self.words(text)
            .map(|word| Token { sentiment, word })
            .collect()
    }

    pub fn tokenize_record(&self, record: &ClassifiedRecord) -> Vec<Token> {
        self.tokenize(record.sentiment, &record.text)
    }
}
