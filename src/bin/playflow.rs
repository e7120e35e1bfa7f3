//! Playflow runtime - simulated streaming analytics run
//!
//! Orchestrates:
//! - Seeded event producer feeding three waves of plays
//! - Single-writer ingestion task over the shared AggregationEngine
//! - Console report and JSON snapshot export
//!
//! Usage:
//!   cargo run --release --bin playflow
//!
//! Environment variables:
//!   WINDOW_HORIZON_SECS - Throughput window (default: 60)
//!   CHANNEL_BUFFER - Ingestion channel size (default: 10000)
//!   PRODUCER_SEED - Producer seed (default: 7)
//!   EXPORT_PATH - Snapshot file (default: playflow_snapshot.json)
//!   EXPORT_LABEL - Snapshot/report label (default: Julia Wolf)
//!   CATALOG_PATH - JSON catalog file (default: built-in catalog)
//!   APPROX_DISTINCT_PRECISION - Enable HyperLogLog with this precision
//!   SPIKE_FACTOR - Spike threshold multiple (default: 3.0)
//!   REPORT_INTERVAL_MS - Throughput sampling interval (default: 1000)
//!   RUST_LOG - Logging level (optional, default: info)

use dotenv::dotenv;
use log::info;
use playflow::export::{JsonFileWriter, Snapshot, SnapshotWriter};
use playflow::pipeline::{
    anomaly::{SpikeDetector, DEFAULT_HISTORY_LEN},
    config::PipelineConfig,
    engine::AggregationEngine,
    ingestion::{start_ingestion, IngestMessage},
    types::Domains,
};
use playflow::report::{render_report, with_thousands};
use playflow::simulation::{weights_for, EventProducer};
use std::sync::{Arc, Mutex};
use tokio::sync::{mpsc, oneshot};
use tokio::time::{sleep, Duration};

/// Events per `IngestMessage::Batch`
const SEND_CHUNK: usize = 250;

const WAVES: [(&str, usize); 3] = [
    ("🚀 Wave 1: release spike", 1_200),
    ("📈 Wave 2: weekend surge", 2_500),
    ("📊 Wave 3: steady baseline", 800),
];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv().ok();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .target(env_logger::Target::Stderr)
        .init();

    let config = PipelineConfig::from_env()?;

    info!("🚀 Starting playflow analytics pipeline");
    info!("   ├─ Window horizon: {}s", config.window_horizon_secs);
    info!("   ├─ Channel buffer: {} events", config.channel_buffer);
    info!("   ├─ Producer seed: {}", config.producer_seed);
    info!(
        "   ├─ Approx. distinct: {}",
        config
            .approx_distinct_precision
            .map(|p| format!("HyperLogLog p={}", p))
            .unwrap_or_else(|| "disabled".to_string())
    );
    info!("   └─ Export: {}", config.export_path);

    let catalog = config.load_catalog()?;
    let weights = weights_for(&catalog);
    info!("✅ Catalog loaded ({} items)", catalog.len());

    let engine = Arc::new(Mutex::new(AggregationEngine::new(
        catalog.clone(),
        config.engine_config(),
    )));
    let mut producer = EventProducer::new(catalog, &weights, Domains::default(), config.producer_seed)?;

    let (tx, rx) = mpsc::channel::<IngestMessage>(config.channel_buffer);
    let ingestion = tokio::spawn(start_ingestion(
        rx,
        engine.clone(),
        SpikeDetector::new(config.spike_factor, DEFAULT_HISTORY_LEN),
        config.report_interval_ms,
    ));

    println!("\nSimulating event ingestion in {} waves\n", WAVES.len());

    for (label, count) in WAVES {
        let events = producer.batch(count);
        let mut events = events.into_iter().peekable();
        while events.peek().is_some() {
            let chunk: Vec<_> = events.by_ref().take(SEND_CHUNK).collect();
            tx.send(IngestMessage::Batch(chunk)).await?;
        }

        let (reply_tx, reply_rx) = oneshot::channel();
        tx.send(IngestMessage::Sync(reply_tx)).await?;
        let running_total = reply_rx.await?;

        println!(
            "  {}  ({} events)... done  |  running total: {}",
            label,
            with_thousands(count as u64),
            with_thousands(running_total)
        );
        sleep(Duration::from_millis(50)).await;
    }

    tx.send(IngestMessage::Shutdown).await?;
    let ingestion_report = ingestion.await?;

    let (report, snapshot) = {
        let engine = engine.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        (
            render_report(&engine, &config.export_label, &ingestion_report.anomalies),
            Snapshot::capture(&engine, &config.export_label),
        )
    };
    print!("{}", report);

    let mut writer = JsonFileWriter::new(&config.export_path);
    info!("📊 Export backend: {}", writer.backend_type());
    writer.write_snapshot(&snapshot).await?;
    println!("  📁 JSON snapshot exported → {}\n", config.export_path);

    Ok(())
}
