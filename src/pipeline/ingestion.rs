//! Pipeline ingestion - async channel processor for play events
//!
//! The ingestion task is the single writer of the shared engine. Producers
//! send `IngestMessage`s over an mpsc channel; messages are applied in
//! receive order, each under one lock acquisition.

use super::anomaly::{SpikeDetector, ThroughputSpike};
use super::engine::AggregationEngine;
use super::types::PlayEvent;
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::{mpsc, oneshot};
use tokio::time::{interval, Duration, MissedTickBehavior};

/// Message sent from producers to the ingestion task
#[derive(Debug)]
pub enum IngestMessage {
    Play(PlayEvent),
    /// Applied with `process_batch` under a single lock
    Batch(Vec<PlayEvent>),
    /// Replies with `total_processed` once every earlier message is applied
    Sync(oneshot::Sender<u64>),
    Shutdown,
}

/// What the ingestion task observed over its lifetime
#[derive(Debug, Clone, Default)]
pub struct IngestionReport {
    /// Events received, including ones later dropped as unknown
    pub events_received: u64,
    pub anomalies: Vec<ThroughputSpike>,
}

fn lock_engine(engine: &Mutex<AggregationEngine>) -> MutexGuard<'_, AggregationEngine> {
    engine.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Start pipeline ingestion from the event channel
///
/// Main loop:
/// 1. Receives messages via mpsc channel
/// 2. Applies events to the shared engine
/// 3. Every `report_interval_ms`, samples throughput, feeds the spike
///    detector and logs the ingestion rate
///
/// Runs until the channel closes or `Shutdown` arrives.
pub async fn start_ingestion(
    mut rx: mpsc::Receiver<IngestMessage>,
    engine: Arc<Mutex<AggregationEngine>>,
    mut detector: SpikeDetector,
    report_interval_ms: u64,
) -> IngestionReport {
    log::info!("🚀 Starting play ingestion");
    log::info!("   └─ Report interval: {}ms", report_interval_ms);

    let mut report_timer = interval(Duration::from_millis(report_interval_ms.max(1)));
    report_timer.set_missed_tick_behavior(MissedTickBehavior::Delay);
    report_timer.tick().await; // Skip first immediate tick

    let mut report = IngestionReport::default();
    let mut since_last_log = 0u64;
    let mut last_log_time = std::time::Instant::now();

    loop {
        tokio::select! {
            message = rx.recv() => {
                match message {
                    Some(IngestMessage::Play(event)) => {
                        lock_engine(&engine).process(&event);
                        report.events_received += 1;
                        since_last_log += 1;
                    }
                    Some(IngestMessage::Batch(events)) => {
                        lock_engine(&engine).process_batch(&events);
                        report.events_received += events.len() as u64;
                        since_last_log += events.len() as u64;
                    }
                    Some(IngestMessage::Sync(reply)) => {
                        let total = lock_engine(&engine).total_processed();
                        if reply.send(total).is_err() {
                            log::debug!("Sync requester went away before reply");
                        }
                    }
                    Some(IngestMessage::Shutdown) => {
                        log::info!("Ingestion received shutdown signal");
                        break;
                    }
                    None => {
                        log::info!("Ingestion channel closed");
                        break;
                    }
                }
            }

            _ = report_timer.tick() => {
                let throughput = lock_engine(&engine).throughput();

                if let Some(spike) = detector.observe(throughput) {
                    log::warn!(
                        "⚠️  Throughput spike: {:.2} events/sec (baseline {:.2})",
                        spike.observed,
                        spike.baseline
                    );
                    report.anomalies.push(spike);
                }

                let elapsed = last_log_time.elapsed().as_secs_f64();
                if elapsed > 0.0 {
                    log::info!(
                        "📊 Ingestion rate: {:.1} events/sec (window: {:.2} events/sec, total: {})",
                        since_last_log as f64 / elapsed,
                        throughput,
                        report.events_received
                    );
                }
                since_last_log = 0;
                last_log_time = std::time::Instant::now();
            }
        }
    }

    log::info!(
        "Ingestion stopped after {} events ({} spikes)",
        report.events_received,
        report.anomalies.len()
    );
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::config::EngineConfig;
    use crate::pipeline::types::{Catalog, CatalogEntry};

    fn make_event(item_id: &str, actor: &str) -> PlayEvent {
        PlayEvent {
            id: format!("{}-{}", item_id, actor),
            item_id: item_id.to_string(),
            actor_id: actor.to_string(),
            platform: "Tidal".to_string(),
            region: "APAC".to_string(),
            device: "Web".to_string(),
            arrival_time: 0.0,
            engaged_seconds: 30,
            completed: false,
        }
    }

    fn shared_engine() -> Arc<Mutex<AggregationEngine>> {
        let catalog = Catalog::new(vec![
            CatalogEntry::new("a", "A", 100),
            CatalogEntry::new("b", "B", 100),
        ])
        .unwrap();
        Arc::new(Mutex::new(AggregationEngine::new(catalog, EngineConfig::default())))
    }

    #[tokio::test]
    async fn test_ingestion_processes_events() {
        let engine = shared_engine();
        let (tx, rx) = mpsc::channel(100);

        let handle = tokio::spawn(start_ingestion(
            rx,
            engine.clone(),
            SpikeDetector::with_defaults(),
            1_000,
        ));

        tx.send(IngestMessage::Play(make_event("a", "u1"))).await.unwrap();
        tx.send(IngestMessage::Play(make_event("zzz", "u2"))).await.unwrap();
        tx.send(IngestMessage::Batch(vec![
            make_event("b", "u3"),
            make_event("b", "u4"),
        ]))
        .await
        .unwrap();

        let (reply_tx, reply_rx) = oneshot::channel();
        tx.send(IngestMessage::Sync(reply_tx)).await.unwrap();
        assert_eq!(reply_rx.await.unwrap(), 3);

        drop(tx);
        let report = handle.await.unwrap();

        assert_eq!(report.events_received, 4);
        let engine = engine.lock().unwrap();
        assert_eq!(engine.total_processed(), 3);
        assert_eq!(engine.dropped_events(), 1);
        assert_eq!(engine.aggregate("b").unwrap().total_count(), 2);
    }

    #[tokio::test]
    async fn test_shutdown_message_stops_ingestion() {
        let engine = shared_engine();
        let (tx, rx) = mpsc::channel(10);

        let handle = tokio::spawn(start_ingestion(
            rx,
            engine.clone(),
            SpikeDetector::with_defaults(),
            1_000,
        ));

        tx.send(IngestMessage::Play(make_event("a", "u1"))).await.unwrap();
        tx.send(IngestMessage::Shutdown).await.unwrap();

        let report = handle.await.unwrap();
        assert_eq!(report.events_received, 1);
        assert!(report.anomalies.is_empty());
    }
}
