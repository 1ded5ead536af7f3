//! Sentiment top-words service: binary entrypoint.
//! Reads records from the configured source, runs the windowed pipeline and
//! publishes the top words per sentiment to the configured sink.

use std::sync::Arc;

use anyhow::Context;
use sentiment_topwords::{
    api::{self, AppState},
    config::{load_stopwords, PipelineConfig, SinkConfig, SourceConfig},
    ingest::{providers::twitter::load_search_terms, LineSource, RecordSource, TwitterConfig, TwitterStream},
    metrics::Metrics,
    sentiment::LexiconScorer,
    sink::{FileSink, LatestSink, LogSink, Sink, SinkMux, WebhookSink},
    Pipeline, PipelineSettings, Tokenizer,
};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Compact logs by default; `LOG_FORMAT=json` switches to JSON lines.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("sentiment_topwords=info,warn"));
    let json = std::env::var("LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry.with(fmt::layer().json()).init();
    } else {
        registry.with(fmt::layer().compact()).init();
    }
}

fn build_sink(cfg: &SinkConfig) -> Arc<dyn Sink> {
    match cfg {
        SinkConfig::File { dir, mode } => Arc::new(FileSink::new(dir.clone(), *mode)),
        SinkConfig::Log => Arc::new(LogSink),
        SinkConfig::Webhook { url } => Arc::new(WebhookSink::new(url.clone())),
    }
}

async fn build_source(cfg: &SourceConfig) -> anyhow::Result<Box<dyn RecordSource>> {
    Ok(match cfg {
        SourceConfig::Stdin => Box::new(LineSource::stdin()),
        SourceConfig::File { path } => Box::new(LineSource::open(path).await?),
        SourceConfig::Twitter { search_terms_path } => {
            let terms = load_search_terms(search_terms_path)?;
            tracing::info!(target: "ingest", terms = ?terms, "search terms loaded");
            let mut stream = TwitterStream::new(TwitterConfig::from_env(terms)?);
            stream.reset_rules().await?;
            stream.connect().await?;
            Box::new(stream)
        }
    })
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env in local/dev; no-op when absent.
    let _ = dotenvy::dotenv();
    init_tracing();

    let cfg = PipelineConfig::load_default().context("loading pipeline config")?;
    let stopwords = load_stopwords(cfg.stopwords_path.as_deref()).context("loading stopwords")?;
    tracing::info!(target: "pipeline", stopwords = stopwords.len(), ?cfg, "configuration loaded");

    let tokenizer = Tokenizer::new(stopwords).keep_numeric(!cfg.drop_numeric);
    let latest = Arc::new(LatestSink::new());
    let sink = SinkMux::new()
        .with(build_sink(&cfg.sink))
        .with(latest.clone() as Arc<dyn Sink>);

    // Optional read-only HTTP surface
    let server = match cfg.http_addr.clone() {
        Some(addr) => {
            let metrics = Metrics::init()?;
            let app = api::router(AppState { latest }, Some(&metrics));
            Some(tokio::spawn(async move {
                if let Err(e) = api::serve(&addr, app).await {
                    tracing::warn!(target: "api", error = %format!("{e:#}"), "http surface stopped");
                }
            }))
        }
        None => None,
    };

    let mut source = build_source(&cfg.source).await?;
    let pipeline = Pipeline::new(
        PipelineSettings::from(&cfg),
        tokenizer,
        Arc::new(LexiconScorer::new()),
        Arc::new(sink),
    );

    let result = tokio::select! {
        res = pipeline.run(source.as_mut()) => res.map(Some),
        _ = tokio::signal::ctrl_c() => {
            tracing::info!(target: "pipeline", "interrupted; open windows are discarded");
            Ok(None)
        }
    };

    if let Some(h) = server {
        h.abort();
    }

    if let Some(stats) = result? {
        println!(
            "done: {} records, {} tokens, {} windows published",
            stats.records, stats.tokens, stats.windows_published
        );
    }
    Ok(())
}
