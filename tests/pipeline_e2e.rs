// tests/pipeline_e2e.rs
//
// End-to-end runs of the pipeline with in-memory sources/sinks and a manual clock.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, Result};
use chrono::{DateTime, TimeZone, Utc};
use sentiment_topwords::clock::{Clock, ManualClock};
use sentiment_topwords::ingest::{ChannelSource, VecSource};
use sentiment_topwords::sentiment::LexiconScorer;
use sentiment_topwords::sink::MemorySink;
use sentiment_topwords::{
    Pipeline, PipelineSettings, PolarityScorer, Sentiment, Sink, StopWords, Tokenizer, TopK,
};

fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 9, 6, 9, 0, 10).unwrap()
}

fn settings(flush_on_shutdown: bool) -> PipelineSettings {
    PipelineSettings {
        window: Duration::from_secs(60),
        top_k: 10,
        workers: 3,
        tick: Duration::from_millis(10),
        channel_capacity: 16,
        flush_on_shutdown,
    }
}

fn pipeline(flush: bool, sink: Arc<dyn Sink>, clock: Arc<ManualClock>) -> Pipeline {
    Pipeline::new(
        settings(flush),
        Tokenizer::new(StopWords::english()),
        Arc::new(LexiconScorer::new()),
        sink,
    )
    .with_clock(clock as Arc<dyn Clock>)
}

#[tokio::test]
async fn identical_records_tie_and_rank_by_word() {
    let sink = Arc::new(MemorySink::new());
    let clock = Arc::new(ManualClock::new(t0()));
    let p = pipeline(true, sink.clone(), clock);

    let mut src = VecSource::new(["I love sunny days", "I love sunny days"]);
    let stats = p.run(&mut src).await.expect("run ok");

    assert_eq!(stats.records, 2);
    assert_eq!(stats.tokens, 6);
    assert_eq!(stats.windows_published, 1);

    let calls = sink.calls();
    assert_eq!(calls.len(), 1, "only the positive partition had tokens");
    let (sentiment, top) = &calls[0];
    assert_eq!(*sentiment, Sentiment::Positive);
    assert_eq!(top.lines(), vec!["days, 2", "love, 2", "sunny, 2"]);
    assert!(top.window.contains(t0()));
}

#[tokio::test]
async fn silent_sentiments_are_never_published() {
    let sink = Arc::new(MemorySink::new());
    let clock = Arc::new(ManualClock::new(t0()));
    let p = pipeline(true, sink.clone(), clock);

    let mut src = VecSource::new(["terrible awful rain", "@bob !!! 😀", "the and of"]);
    let stats = p.run(&mut src).await.expect("run ok");

    assert_eq!(stats.empty_records, 2);
    assert_eq!(sink.calls_for(Sentiment::Negative).len(), 1);
    assert!(sink.calls_for(Sentiment::Positive).is_empty());
    assert!(sink.calls_for(Sentiment::Neutral).is_empty());
}

#[tokio::test]
async fn open_windows_are_discarded_without_flush() {
    let sink = Arc::new(MemorySink::new());
    let clock = Arc::new(ManualClock::new(t0()));
    let p = pipeline(false, sink.clone(), clock);

    let mut src = VecSource::new(["I love sunny days", "blue chair"]);
    let stats = p.run(&mut src).await.expect("run ok");

    assert!(sink.calls().is_empty());
    assert_eq!(stats.windows_discarded, 2);
    assert_eq!(stats.windows_published, 0);
}

#[tokio::test]
async fn source_error_stops_the_pipeline() {
    let sink = Arc::new(MemorySink::new());
    let clock = Arc::new(ManualClock::new(t0()));
    let p = pipeline(true, sink.clone(), clock);

    let mut src = VecSource::new(["I love rust"]).failing_with("connection reset");
    let err = p.run(&mut src).await.unwrap_err();
    assert!(format!("{err:#}").contains("connection reset"));
}

struct RejectNegative(MemorySink);

#[async_trait::async_trait]
impl Sink for RejectNegative {
    async fn publish(&self, sentiment: Sentiment, top: &TopK) -> Result<()> {
        if sentiment == Sentiment::Negative {
            return Err(anyhow!("disk full"));
        }
        self.0.publish(sentiment, top).await
    }
    fn name(&self) -> &'static str {
        "reject-negative"
    }
}

#[tokio::test]
async fn failed_publish_does_not_block_other_windows() {
    let sink = Arc::new(RejectNegative(MemorySink::new()));
    let clock = Arc::new(ManualClock::new(t0()));
    let p = pipeline(true, sink.clone(), clock);

    let mut src = VecSource::new(["awful weather", "great weather"]);
    let stats = p.run(&mut src).await.expect("sink errors are not fatal");

    assert_eq!(stats.publish_failures, 1);
    assert_eq!(stats.windows_published, 1);
    assert_eq!(sink.0.calls_for(Sentiment::Positive).len(), 1);
}

async fn wait_for_calls(sink: &MemorySink, n: usize) -> bool {
    for _ in 0..200 {
        if sink.calls().len() >= n {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    false
}

#[tokio::test]
async fn tick_closes_windows_while_input_is_quiet() {
    let sink = Arc::new(MemorySink::new());
    let clock = Arc::new(ManualClock::new(t0()));
    let p = pipeline(false, sink.clone(), clock.clone());

    let (tx, rx) = tokio::sync::mpsc::channel(8);
    let mut src = ChannelSource::new(rx);

    let driver = async {
        tx.send("I love sunny days".to_string()).await.unwrap();
        // let the record get stamped inside the first window
        tokio::time::sleep(Duration::from_millis(200)).await;
        assert!(sink.calls().is_empty(), "window must stay open before its end");

        clock.advance(chrono::Duration::seconds(60));
        assert!(wait_for_calls(&sink, 1).await, "tick should close the window");

        // next window receives new data but is never closed
        tx.send("great news".to_string()).await.unwrap();
        tokio::time::sleep(Duration::from_millis(100)).await;
        drop(tx);
    };

    let (stats, ()) = tokio::join!(p.run(&mut src), driver);
    let stats = stats.expect("run ok");

    let calls = sink.calls_for(Sentiment::Positive);
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].lines(), vec!["days, 1", "love, 1", "sunny, 1"]);
    assert_eq!(stats.windows_published, 1);
    assert_eq!(stats.windows_discarded, 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn slow_record_crossing_a_boundary_is_still_counted() {
    let sink = Arc::new(MemorySink::new());
    let clock = Arc::new(ManualClock::new(t0()));
    let scorer = |text: &str| {
        if text.contains("slow") {
            std::thread::sleep(Duration::from_millis(300));
        }
        1.0
    };
    let p = Pipeline::new(
        PipelineSettings {
            workers: 2,
            ..settings(true)
        },
        Tokenizer::new(StopWords::empty()),
        Arc::new(scorer) as Arc<dyn PolarityScorer>,
        sink.clone(),
    )
    .with_clock(clock.clone() as Arc<dyn Clock>);

    let (tx, rx) = tokio::sync::mpsc::channel(8);
    let mut src = ChannelSource::new(rx);

    let driver = async {
        tx.send("slow sunny".to_string()).await.unwrap();
        // a worker is now busy scoring the slow record
        tokio::time::sleep(Duration::from_millis(50)).await;
        clock.advance(chrono::Duration::seconds(60));
        tx.send("fast rain".to_string()).await.unwrap();
        drop(tx);
    };

    let (stats, ()) = tokio::join!(p.run(&mut src), driver);
    let stats = stats.expect("run ok");

    assert_eq!(stats.late_tokens, 0);
    assert_eq!(stats.tokens, 4);
    let published: u64 = sink
        .calls_for(Sentiment::Positive)
        .iter()
        .flat_map(|top| top.entries.iter().map(|e| e.count))
        .sum();
    assert_eq!(published, 4, "every token lands in some published window");
}
