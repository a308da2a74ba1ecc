//! Analysis server
//!
//! Serves engine analysis and the bundled web client over HTTP until Ctrl-C.
//! `--analyze <FEN> [--limit N]` runs a single analysis and prints the JSON.

use analysis_engine::analysis::DEFAULT_LIMIT;
use analysis_server::{AnalysisPlugin, Config, LogSink};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

/// Parse `--analyze <FEN> [--limit N]` from CLI args
fn parse_analyze_args() -> Option<(String, i64)> {
    let args: Vec<String> = std::env::args().collect();
    let mut fen = None;
    let mut limit = DEFAULT_LIMIT as i64;
    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--analyze" => {
                fen = args.get(i + 1).cloned();
                i += 1;
            }
            "--limit" => {
                if let Some(n) = args.get(i + 1).and_then(|v| v.parse().ok()) {
                    limit = n;
                }
                i += 1;
            }
            _ => {}
        }
        i += 1;
    }
    fen.map(|fen| (fen, limit))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present
    dotenvy::dotenv().ok();

    let config = Config::from_env();
    let log = LogSink::open(&config.engine.private_dir());

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with(fmt::layer())
        .with(fmt::layer().with_ansi(false).with_writer(log.writer()))
        .init();

    let plugin = AnalysisPlugin::new(config, log);

    if let Some((fen, limit)) = parse_analyze_args() {
        let result = plugin.analyze(&fen, limit).await?;
        println!("{}", serde_json::to_string_pretty(&result)?);
        return Ok(());
    }

    plugin.initialize().await?;
    if let Some((primary, mirror)) = plugin.local_addrs().await {
        tracing::info!(%primary, %mirror, "Analysis server ready");
    }

    tokio::signal::ctrl_c().await?;
    tracing::info!("Shutting down");
    plugin.stop().await;

    Ok(())
}
