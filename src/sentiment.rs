//! # Sentiment
//! Three-way sentiment classification on top of a pluggable polarity scorer.
//!
//! The pipeline only relies on [`PolarityScorer::score`] returning a signed
//! number; [`Sentiment::from_polarity`] maps it to a category
//! (`> 0` positive, `== 0` neutral, `< 0` negative). A small lexicon scorer is
//! bundled so the binary runs without an external model.

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

static LEXICON: Lazy<HashMap<String, i32>> = Lazy::new(|| {
    let raw = include_str!("../sentiment_lexicon.json");
    serde_json::from_str::<HashMap<String, i32>>(raw).expect("valid sentiment lexicon")
});

/// Sentiment category and partition key of the aggregation stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sentiment {
    Positive,
    Neutral,
    Negative,
}

impl Sentiment {
    pub const ALL: [Sentiment; 3] = [Sentiment::Positive, Sentiment::Neutral, Sentiment::Negative];

    /// `> 0` positive, `== 0` neutral, `< 0` negative.
    /// A NaN polarity counts as unscoreable and maps to neutral.
    pub fn from_polarity(polarity: f64) -> Self {
        if polarity > 0.0 {
            Sentiment::Positive
        } else if polarity == 0.0 || polarity.is_nan() {
            Sentiment::Neutral
        } else {
            Sentiment::Negative
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Sentiment::Positive => "positive",
            Sentiment::Neutral => "neutral",
            Sentiment::Negative => "negative",
        }
    }

    /// Stable partition index (0..3).
    pub fn index(&self) -> usize {
        match self {
            Sentiment::Positive => 0,
            Sentiment::Neutral => 1,
            Sentiment::Negative => 2,
        }
    }
}

impl fmt::Display for Sentiment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Sentiment {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "positive" | "pos" => Ok(Sentiment::Positive),
            "neutral" => Ok(Sentiment::Neutral),
            "negative" | "neg" => Ok(Sentiment::Negative),
            other => anyhow::bail!("unknown sentiment '{other}'"),
        }
    }
}

/// External scoring capability: text → signed polarity.
/// Implementations must be total; the pipeline never recovers from a scorer.
pub trait PolarityScorer: Send + Sync {
    fn score(&self, text: &str) -> f64;
}

impl<F> PolarityScorer for F
where
    F: Fn(&str) -> f64 + Send + Sync,
{
    fn score(&self, text: &str) -> f64 {
        self(text)
    }
}

/// Output of the classifier stage: one per record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassifiedRecord {
    pub sentiment: Sentiment,
    pub text: String,
}

/// Classify already-normalized text.
pub fn classify(scorer: &dyn PolarityScorer, text: &str) -> ClassifiedRecord {
    let polarity = scorer.score(text);
    ClassifiedRecord {
        sentiment: Sentiment::from_polarity(polarity),
        text: text.to_string(),
    }
}

/// Lexicon-based scorer with short-range negation.
#[derive(Debug, Clone, Default)]
pub struct LexiconScorer;

impl LexiconScorer {
    pub fn new() -> Self {
        Self
    }

    /// Lexicon score for a lowercase word (0 when unknown).
    #[inline]
    fn word_score(&self, w: &str) -> i32 {
        *LEXICON.get(w).unwrap_or(&0)
    }

    /// Returns `(raw score, token count)`.
    /// A negator within the previous 1..=3 tokens flips the sign of a word's score.
    pub fn score_text(&self, text: &str) -> (i32, usize) {
        let tokens: Vec<String> = lexicon_tokens(text).collect();
        let mut score: i32 = 0;

        for i in 0..tokens.len() {
            let base = self.word_score(tokens[i].as_str());
            if base == 0 {
                continue;
            }
            let negated = (1..=3).any(|k| i >= k && is_negator(tokens[i - k].as_str()));
            score += if negated { -base } else { base };
        }

        (score, tokens.len())
    }
}

impl PolarityScorer for LexiconScorer {
    /// Raw score averaged over the token count; 0.0 for empty text.
    fn score(&self, text: &str) -> f64 {
        let (score, n) = self.score_text(text);
        if n == 0 {
            return 0.0;
        }
        score as f64 / n as f64
    }
}

fn lexicon_tokens(s: &str) -> impl Iterator<Item = String> + '_ {
    s.split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(|t| t.to_ascii_lowercase())
}

// Apostrophes are stripped by the normalizer, so contracted forms appear glued.
fn is_negator(tok: &str) -> bool {
    matches!(
        tok,
        "not"
            | "no"
            | "never"
            | "isnt"
            | "wasnt"
            | "arent"
            | "wont"
            | "cant"
            | "cannot"
            | "dont"
            | "doesnt"
            | "didnt"
            | "without"
    )
}
