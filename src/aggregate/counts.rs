//! Per-window word counting state.
//!
//! `WordCountAccumulator` is the explicit lifecycle object behind one open
//! window: `init()` on the first token, `update()` per token, `finalize()`
//! exactly once when the window closes.

use std::collections::HashMap;

/// Frozen `word → count` mapping of one closed window.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WordCounts {
    counts: HashMap<String, u64>,
}

impl WordCounts {
    pub fn get(&self, word: &str) -> u64 {
        self.counts.get(word).copied().unwrap_or(0)
    }

    /// Sum of all counts, i.e. number of tokens applied.
    pub fn total(&self) -> u64 {
        self.counts.values().sum()
    }

    /// Number of distinct words.
    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, u64)> {
        self.counts.iter().map(|(w, c)| (w.as_str(), *c))
    }
}

impl FromIterator<(String, u64)> for WordCounts {
    fn from_iter<T: IntoIterator<Item = (String, u64)>>(iter: T) -> Self {
        let mut counts = HashMap::new();
        for (w, c) in iter {
            *counts.entry(w).or_insert(0) += c;
        }
        Self { counts }
    }
}

/// Mutable counting state of one open window.
#[derive(Debug, Default)]
pub struct WordCountAccumulator {
    counts: HashMap<String, u64>,
    applied: u64,
}

impl WordCountAccumulator {
    pub fn init() -> Self {
        Self::default()
    }

    /// Create-or-increment.
    pub fn update(&mut self, word: &str) {
        match self.counts.get_mut(word) {
            Some(c) => *c += 1,
            None => {
                self.counts.insert(word.to_string(), 1);
            }
        }
        self.applied += 1;
    }

    /// Tokens applied so far.
    pub fn applied(&self) -> u64 {
        self.applied
    }

    pub fn finalize(self) -> WordCounts {
        WordCounts {
            counts: self.counts,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lifecycle_counts_every_update() {
        let mut acc = WordCountAccumulator::init();
        for w in ["love", "sunny", "love", "days", "love"] {
            acc.update(w);
        }
        assert_eq!(acc.applied(), 5);
        let counts = acc.finalize();
        assert_eq!(counts.get("love"), 3);
        assert_eq!(counts.get("sunny"), 1);
        assert_eq!(counts.get("missing"), 0);
        assert_eq!(counts.total(), 5);
        assert_eq!(counts.len(), 3);
    }

    #[test]
    fn empty_accumulator_finalizes_empty() {
        let counts = WordCountAccumulator::init().finalize();
        assert!(counts.is_empty());
        assert_eq!(counts.total(), 0);
    }
}
