//! Traffic analyzer - adaptive windowing evaluation driver
//!
//! Streams simulated traffic through the dual-pipeline engine and
//! writes the step log as JSON lines on stdout. Logs go to stderr as
//! structured JSON; a Prometheus text exposition is dumped at shutdown.

use analyzer_lib::{
    spawn_source, EngineConfig, EvaluationLoop, RecordWriter, SimulatedSource,
};
use anyhow::Result;
use prometheus::Encoder;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod config;

const ANALYZER_VERSION: &str = env!("CARGO_PKG_VERSION");

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing with JSON output and env filter; logs must not
    // interleave with the JSON-lines record stream on stdout
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(fmt::layer().json().with_writer(std::io::stderr))
        .init();

    info!(version = ANALYZER_VERSION, "Starting traffic-analyzer");

    let config = config::AnalyzerConfig::load()?;
    let engine_config = EngineConfig {
        fixed_window_length: config.fixed_window_length,
        initial_dynamic_window_length: config.initial_dynamic_window_length,
        policy: config.sizing_policy()?,
        volume_signal: config.volume_signal()?,
        detection_threshold: config.detection_threshold,
        max_dynamic_window_length: config.max_dynamic_window_length,
    };
    let mut engine = EvaluationLoop::new(engine_config)?;

    let mut source = SimulatedSource::new(config.num_packets);
    if let Some(seed) = config.seed {
        source = source.with_seed(seed);
    }
    if let (Some(start), Some(duration)) = (config.attack_start, config.attack_duration) {
        info!(start, duration, amplitude = config.attack_amplitude, "Injecting attack burst");
        source = source.with_burst(start, duration, config.attack_amplitude);
    }

    let (observations, source_handle) = spawn_source(source, 1024);

    // Clean shutdown on Ctrl-C; records admitted before the signal are kept
    let (shutdown_tx, shutdown_rx) = tokio::sync::broadcast::channel(1);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            let _ = shutdown_tx.send(());
        }
    });

    engine.run(observations, shutdown_rx).await;
    source_handle.abort();

    let stdout = std::io::stdout();
    let mut writer = RecordWriter::new(stdout.lock());
    for record in engine.records() {
        writer.write(record)?;
    }
    writer.flush()?;

    // Final metrics exposition on stderr; the engine has no HTTP surface
    let mut buffer = Vec::new();
    let encoder = prometheus::TextEncoder::new();
    encoder.encode(&prometheus::gather(), &mut buffer)?;
    eprintln!("{}", String::from_utf8_lossy(&buffer));

    info!(steps = engine.records().len(), "Run complete");
    Ok(())
}
