//! # Tumbling windows
//! Processing-time window assignment and the per-key `absent → open → closed`
//! state machine.
//!
//! A token is assigned to `floor(observed_at / len) * len`. For every sentiment
//! at most one window is open. A token for a later window first closes the open
//! one; a token for a window that is already closed (or older than the open
//! one) is late and dropped. `tick(now)` closes every window whose end has
//! passed so quiet partitions still flush on schedule.

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;

use crate::aggregate::counts::{WordCountAccumulator, WordCounts};
use crate::sentiment::Sentiment;
use crate::tokenize::Token;

pub const DEFAULT_WINDOW: Duration = Duration::from_secs(60);

/// Identity of one window of one sentiment. `end` is exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct WindowKey {
    pub sentiment: Sentiment,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl WindowKey {
    pub fn contains(&self, at: DateTime<Utc>) -> bool {
        self.start <= at && at < self.end
    }
}

/// Window grid of a fixed length, aligned to the UNIX epoch.
#[derive(Debug, Clone, Copy)]
pub struct WindowSpec {
    len_ms: i64,
}

impl WindowSpec {
    /// Lengths below one millisecond are raised to one millisecond.
    pub fn new(len: Duration) -> Self {
        let ms = i64::try_from(len.as_millis()).unwrap_or(i64::MAX);
        Self { len_ms: ms.max(1) }
    }

    pub fn length(&self) -> Duration {
        Duration::from_millis(self.len_ms as u64)
    }

    pub fn assign(&self, sentiment: Sentiment, at: DateTime<Utc>) -> WindowKey {
        let start_ms = at.timestamp_millis().div_euclid(self.len_ms) * self.len_ms;
        WindowKey {
            sentiment,
            start: ms_to_utc(start_ms),
            end: ms_to_utc(start_ms.saturating_add(self.len_ms)),
        }
    }

    /// The window immediately after `key` on the same grid.
    pub fn next(&self, key: &WindowKey) -> WindowKey {
        self.assign(key.sentiment, key.end)
    }
}

impl Default for WindowSpec {
    fn default() -> Self {
        Self::new(DEFAULT_WINDOW)
    }
}

fn ms_to_utc(ms: i64) -> DateTime<Utc> {
    Utc.timestamp_millis_opt(ms)
        .single()
        .unwrap_or(DateTime::<Utc>::MAX_UTC)
}

/// Frozen counts handed over when a window closes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClosedWindow {
    pub key: WindowKey,
    pub counts: WordCounts,
}

/// What happened to an offered token.
#[derive(Debug, PartialEq, Eq)]
pub enum Offer {
    /// Applied to the currently open window (opened it if absent).
    Applied,
    /// The previously open window had to close first; the token went into the new one.
    Rolled(ClosedWindow),
    /// Its window is already closed; the token was dropped.
    Late,
}

#[derive(Debug)]
struct OpenWindow {
    key: WindowKey,
    acc: WordCountAccumulator,
}

#[derive(Debug, Default)]
struct Partition {
    open: Option<OpenWindow>,
    /// Earliest window start still accepted.
    floor: Option<DateTime<Utc>>,
}

impl Partition {
    fn close(&mut self) -> Option<ClosedWindow> {
        let open = self.open.take()?;
        self.floor = Some(open.key.end);
        Some(ClosedWindow {
            key: open.key,
            counts: open.acc.finalize(),
        })
    }
}

/// Window state for one or more sentiment partitions.
///
/// The pipeline gives each partition its own aggregator so that a single task
/// owns every mutation; nothing here is shared or locked.
#[derive(Debug)]
pub struct WindowAggregator {
    spec: WindowSpec,
    partitions: BTreeMap<Sentiment, Partition>,
}

impl WindowAggregator {
    pub fn new(spec: WindowSpec) -> Self {
        Self {
            spec,
            partitions: BTreeMap::new(),
        }
    }

    pub fn spec(&self) -> WindowSpec {
        self.spec
    }

    /// Apply `token` as observed at `at`.
    pub fn offer(&mut self, token: &Token, at: DateTime<Utc>) -> Offer {
        let key = self.spec.assign(token.sentiment, at);
        let part = self.partitions.entry(token.sentiment).or_default();

        if part.floor.is_some_and(|floor| key.start < floor) {
            return Offer::Late;
        }

        // floor == open.start, so a different key here is always a later one
        let rolled = match part.open.as_ref().map(|o| o.key == key) {
            Some(false) => part.close(),
            _ => None,
        };

        let open = part.open.get_or_insert_with(|| OpenWindow {
            key,
            acc: WordCountAccumulator::init(),
        });
        part.floor = Some(open.key.start);
        open.acc.update(&token.word);

        match rolled {
            Some(closed) => Offer::Rolled(closed),
            None => Offer::Applied,
        }
    }

    /// Close every open window with `end <= now`, oldest sentiment first.
    pub fn tick(&mut self, now: DateTime<Utc>) -> Vec<ClosedWindow> {
        self.partitions
            .values_mut()
            .filter(|p| p.open.as_ref().is_some_and(|o| o.key.end <= now))
            .filter_map(Partition::close)
            .collect()
    }

    /// Close everything still open regardless of time.
    pub fn drain(&mut self) -> Vec<ClosedWindow> {
        self.partitions
            .values_mut()
            .filter_map(Partition::close)
            .collect()
    }

    /// Keys of currently open windows.
    pub fn open_windows(&self) -> Vec<WindowKey> {
        self.partitions
            .values()
            .filter_map(|p| p.open.as_ref().map(|o| o.key))
            .collect()
    }

    /// Tokens applied to the open window of `sentiment`, if any.
    pub fn pending(&self, sentiment: Sentiment) -> Option<u64> {
        self.partitions
            .get(&sentiment)
            .and_then(|p| p.open.as_ref())
            .map(|o| o.acc.applied())
    }
}
