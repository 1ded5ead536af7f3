//! # Top-K Extractor
//! Ranks a frozen `WordCounts` snapshot: count descending, then word ascending
//! so equal counts always come out in the same order.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

use crate::aggregate::counts::WordCounts;
use crate::aggregate::window::WindowKey;

pub const DEFAULT_TOP_K: usize = 10;

/// One ranked `(word, count)` pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RankedWord {
    pub word: String,
    pub count: u64,
}

impl RankedWord {
    /// Sink line format: `"{word}, {count}"`.
    pub fn line(&self) -> String {
        format!("{}, {}", self.word, self.count)
    }
}

/// Ranked result of one closed window; immutable once built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopK {
    pub window: WindowKey,
    pub entries: Vec<RankedWord>,
}

impl TopK {
    pub fn lines(&self) -> Vec<String> {
        self.entries.iter().map(RankedWord::line).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn rank(a: &(&str, u64), b: &(&str, u64)) -> Ordering {
    b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0))
}

/// Up to `limit` highest counts; a `limit` of 0 yields nothing.
pub fn extract(counts: &WordCounts, limit: usize) -> Vec<RankedWord> {
    let mut all: Vec<(&str, u64)> = counts.iter().collect();
    if limit < all.len() {
        // Partition first so only the head needs a full sort.
        all.select_nth_unstable_by(limit, rank);
        all.truncate(limit);
    }
    all.sort_unstable_by(rank);
    all.into_iter()
        .map(|(w, c)| RankedWord {
            word: w.to_string(),
            count: c,
        })
        .collect()
}

/// `extract` bound to the window the counts belong to.
pub fn extract_for(window: WindowKey, counts: &WordCounts, limit: usize) -> TopK {
    TopK {
        window,
        entries: extract(counts, limit),
    }
}
