//! # Pipeline
//! Source → workers (normalize, classify, tokenize) → sentiment partitions
//! (windowing, Top-K, sink).
//!
//! Workers are stateless and share one record queue. Every token is routed by
//! sentiment to exactly one partition task, which alone owns that sentiment's
//! window state, so no locking is involved in counting. A token is stamped with
//! the clock when its partition applies it; that processing time decides its
//! window, so a partition sees non-decreasing times however the workers
//! interleave. Each partition runs its own tick so windows close on schedule
//! even when no tokens arrive.

use anyhow::Result;
use metrics::{counter, gauge, histogram};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinSet;
use tokio::time::MissedTickBehavior;

use crate::aggregate::{extract_for, ClosedWindow, Offer, WindowAggregator, WindowSpec};
use crate::clock::{Clock, SystemClock};
use crate::config::PipelineConfig;
use crate::ingest::{Record, RecordSource};
use crate::metrics::ensure_metrics_described;
use crate::normalize::normalize;
use crate::sentiment::{classify, PolarityScorer, Sentiment};
use crate::sink::Sink;
use crate::tokenize::{Token, Tokenizer};

/// Runtime knobs taken from `PipelineConfig`.
#[derive(Debug, Clone)]
pub struct PipelineSettings {
    pub window: Duration,
    pub top_k: usize,
    pub workers: usize,
    pub tick: Duration,
    pub channel_capacity: usize,
    pub flush_on_shutdown: bool,
}

impl From<&PipelineConfig> for PipelineSettings {
    fn from(cfg: &PipelineConfig) -> Self {
        Self {
            window: cfg.window(),
            top_k: cfg.top_k,
            workers: cfg.workers.max(1),
            tick: cfg.tick().max(Duration::from_millis(1)),
            channel_capacity: cfg.channel_capacity.max(1),
            flush_on_shutdown: cfg.flush_on_shutdown,
        }
    }
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self::from(&PipelineConfig::default())
    }
}

/// Counters reported when `run` returns.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunStats {
    pub records: u64,
    pub empty_records: u64,
    pub tokens: u64,
    pub late_tokens: u64,
    pub windows_closed: u64,
    pub windows_published: u64,
    pub publish_failures: u64,
    /// Open windows dropped at shutdown without publishing.
    pub windows_discarded: u64,
}

impl RunStats {
    fn absorb(&mut self, other: RunStats) {
        self.records += other.records;
        self.empty_records += other.empty_records;
        self.tokens += other.tokens;
        self.late_tokens += other.late_tokens;
        self.windows_closed += other.windows_closed;
        self.windows_published += other.windows_published;
        self.publish_failures += other.publish_failures;
        self.windows_discarded += other.windows_discarded;
    }
}

/// Normalize → classify → tokenize for one record. Pure.
pub fn process_record(text: &str, scorer: &dyn PolarityScorer, tokenizer: &Tokenizer) -> Vec<Token> {
    let clean = normalize(text);
    let classified = classify(scorer, &clean);
    tokenizer.tokenize_record(&classified)
}

pub struct Pipeline {
    settings: PipelineSettings,
    scorer: Arc<dyn PolarityScorer>,
    tokenizer: Arc<Tokenizer>,
    sink: Arc<dyn Sink>,
    clock: Arc<dyn Clock>,
}

impl Pipeline {
    pub fn new(
        settings: PipelineSettings,
        tokenizer: Tokenizer,
        scorer: Arc<dyn PolarityScorer>,
        sink: Arc<dyn Sink>,
    ) -> Self {
        Self {
            settings,
            scorer,
            tokenizer: Arc::new(tokenizer),
            sink,
            clock: Arc::new(SystemClock),
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn settings(&self) -> &PipelineSettings {
        &self.settings
    }

    /// Consume `source` until end-of-stream or error.
    ///
    /// Dropping the returned future aborts all spawned tasks; open windows are
    /// lost. A source error is returned after workers and partitions stopped.
    pub async fn run<S>(&self, source: &mut S) -> Result<RunStats>
    where
        S: RecordSource + ?Sized,
    {
        ensure_metrics_described();
        let cap = self.settings.channel_capacity;

        // partitions
        let mut shard_txs = Vec::with_capacity(Sentiment::ALL.len());
        let mut shards = JoinSet::new();
        for sentiment in Sentiment::ALL {
            let (tx, rx) = mpsc::channel::<Token>(cap);
            shard_txs.push(tx);
            let shard = Shard {
                sentiment,
                agg: WindowAggregator::new(WindowSpec::new(self.settings.window)),
                sink: self.sink.clone(),
                clock: self.clock.clone(),
                top_k: self.settings.top_k,
                stats: RunStats::default(),
            };
            shards.spawn(shard.run(rx, self.settings.tick, self.settings.flush_on_shutdown));
        }
        let shard_txs = Arc::new(shard_txs);

        // workers
        let (rec_tx, rec_rx) = mpsc::channel::<Record>(cap);
        let rec_rx = Arc::new(Mutex::new(rec_rx));
        let mut workers = JoinSet::new();
        for id in 0..self.settings.workers {
            workers.spawn(worker(
                id,
                rec_rx.clone(),
                shard_txs.clone(),
                self.scorer.clone(),
                self.tokenizer.clone(),
            ));
        }
        // only workers may keep partitions alive from here on
        drop(shard_txs);

        tracing::info!(
            target: "pipeline",
            source = source.name(),
            sink = self.sink.name(),
            workers = self.settings.workers,
            window_secs = self.settings.window.as_secs_f64(),
            top_k = self.settings.top_k,
            "pipeline started"
        );

        // reader
        let mut stats = RunStats::default();
        let mut failure = None;
        loop {
            match source.next().await {
                Ok(Some(record)) => {
                    stats.records += 1;
                    counter!("records_ingested_total").increment(1);
                    if rec_tx.send(record).await.is_err() {
                        break;
                    }
                }
                Ok(None) => {
                    tracing::info!(target: "pipeline", records = stats.records, "source ended");
                    break;
                }
                Err(e) => {
                    tracing::warn!(target: "pipeline", error = %format!("{e:#}"), "source failed");
                    failure = Some(e);
                    break;
                }
            }
        }
        drop(rec_tx);

        while let Some(res) = workers.join_next().await {
            match res {
                Ok(empty) => stats.empty_records += empty,
                Err(e) => tracing::warn!(target: "pipeline", error = %e, "worker task failed"),
            }
        }
        while let Some(res) = shards.join_next().await {
            match res {
                Ok(s) => stats.absorb(s),
                Err(e) => tracing::warn!(target: "pipeline", error = %e, "partition task failed"),
            }
        }

        tracing::info!(target: "pipeline", ?stats, "pipeline stopped");
        match failure {
            Some(e) => Err(e.context(format!("source '{}' failed", source.name()))),
            None => Ok(stats),
        }
    }
}

/// Pull records until the queue closes; returns how many produced no tokens.
async fn worker(
    id: usize,
    records: Arc<Mutex<mpsc::Receiver<Record>>>,
    shards: Arc<Vec<mpsc::Sender<Token>>>,
    scorer: Arc<dyn PolarityScorer>,
    tokenizer: Arc<Tokenizer>,
) -> u64 {
    let mut empty = 0u64;
    loop {
        let next = records.lock().await.recv().await;
        let Some(record) = next else {
            break;
        };

        let tokens = process_record(&record.text, scorer.as_ref(), &tokenizer);
        tracing::trace!(
            target: "pipeline",
            worker = id,
            seq = record.sequence_id,
            tokens = tokens.len(),
            "record processed"
        );
        if tokens.is_empty() {
            empty += 1;
            counter!("records_empty_total").increment(1);
            continue;
        }

        for token in tokens {
            let sentiment = token.sentiment;
            counter!("tokens_emitted_total", "sentiment" => sentiment.as_str()).increment(1);
            if shards[sentiment.index()]
                .send(token)
                .await
                .is_err()
            {
                tracing::warn!(target: "pipeline", worker = id, %sentiment, "partition gone");
                return empty;
            }
        }
    }
    empty
}

/// Single owner of one sentiment's window state.
struct Shard {
    sentiment: Sentiment,
    agg: WindowAggregator,
    sink: Arc<dyn Sink>,
    clock: Arc<dyn Clock>,
    top_k: usize,
    stats: RunStats,
}

impl Shard {
    async fn run(mut self, mut rx: mpsc::Receiver<Token>, tick: Duration, flush_on_shutdown: bool) -> RunStats {
        let mut ticker = tokio::time::interval(tick);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                // tick first: it fires at most once per period, so tokens cannot starve it
                biased;
                _ = ticker.tick() => {
                    let now = self.clock.now();
                    for closed in self.agg.tick(now) {
                        self.flush(closed).await;
                    }
                }
                msg = rx.recv() => match msg {
                    Some(token) => self.apply(token).await,
                    None => break,
                },
            }
        }

        if flush_on_shutdown {
            for closed in self.agg.drain() {
                self.flush(closed).await;
            }
        } else {
            let open = self.agg.open_windows();
            self.stats.windows_discarded += open.len() as u64;
            for key in open {
                tracing::debug!(
                    target: "window",
                    sentiment = %key.sentiment,
                    start = %key.start.to_rfc3339(),
                    pending = self.agg.pending(key.sentiment).unwrap_or(0),
                    "open window discarded at shutdown"
                );
            }
        }
        gauge!("open_windows", "sentiment" => self.sentiment.as_str()).set(0.0);
        self.stats
    }

    async fn apply(&mut self, token: Token) {
        let at = self.clock.now();
        match self.agg.offer(&token, at) {
            Offer::Applied => {
                self.stats.tokens += 1;
            }
            Offer::Rolled(closed) => {
                self.stats.tokens += 1;
                self.flush(closed).await;
            }
            Offer::Late => {
                self.stats.late_tokens += 1;
                counter!("tokens_late_total", "sentiment" => self.sentiment.as_str()).increment(1);
                tracing::debug!(
                    target: "window",
                    sentiment = %self.sentiment,
                    at = %at.to_rfc3339(),
                    "late token dropped"
                );
            }
        }
        let open = self.agg.open_windows().len();
        gauge!("open_windows", "sentiment" => self.sentiment.as_str()).set(open as f64);
    }

    /// Rank and publish one closed window. The window state is already gone.
    async fn flush(&mut self, closed: ClosedWindow) {
        self.stats.windows_closed += 1;
        counter!("windows_closed_total", "sentiment" => self.sentiment.as_str()).increment(1);
        histogram!("window_distinct_words").record(closed.counts.len() as f64);

        let top = extract_for(closed.key, &closed.counts, self.top_k);
        if top.is_empty() {
            return;
        }
        tracing::debug!(
            target: "window",
            sentiment = %self.sentiment,
            start = %closed.key.start.to_rfc3339(),
            tokens = closed.counts.total(),
            distinct = closed.counts.len(),
            "window closed"
        );

        match self.sink.publish(self.sentiment, &top).await {
            Ok(()) => {
                self.stats.windows_published += 1;
                counter!("windows_published_total", "sentiment" => self.sentiment.as_str())
                    .increment(1);
            }
            Err(e) => {
                self.stats.publish_failures += 1;
                counter!("sink_publish_errors_total", "sentiment" => self.sentiment.as_str())
                    .increment(1);
                tracing::warn!(
                    target: "sink",
                    sink = self.sink.name(),
                    sentiment = %self.sentiment,
                    error = %format!("{e:#}"),
                    "publish failed; window dropped"
                );
            }
        }
    }
}
