//! Integration tests: producer → channel → ingestion → engine → export
//!
//! Key integration points tested:
//! - Multiple producers sharing a single ingestion channel
//! - Count conservation across items, window and summary
//! - Leaderboard consistency with per-item aggregates
//! - Snapshot export of the final state

#[cfg(test)]
mod pipeline_integration_tests {
    use playflow::export::{JsonFileWriter, Snapshot, SnapshotWriter};
    use playflow::pipeline::{
        start_ingestion, AggregationEngine, Catalog, CatalogEntry, Domains, EngineConfig,
        IngestMessage, PlayEvent, SpikeDetector,
    };
    use playflow::simulation::{demo_catalog, demo_weights, EventProducer};
    use std::sync::{Arc, Mutex};
    use tokio::sync::{mpsc, oneshot};

    fn shared_engine(catalog: Catalog) -> Arc<Mutex<AggregationEngine>> {
        Arc::new(Mutex::new(AggregationEngine::new(
            catalog,
            EngineConfig::default(),
        )))
    }

    async fn sync(tx: &mpsc::Sender<IngestMessage>) -> u64 {
        let (reply_tx, reply_rx) = oneshot::channel();
        tx.send(IngestMessage::Sync(reply_tx)).await.unwrap();
        reply_rx.await.unwrap()
    }

    #[tokio::test]
    async fn test_waves_conserve_counts() {
        let catalog = demo_catalog().unwrap();
        let engine = shared_engine(catalog.clone());
        let (tx, rx) = mpsc::channel(64);
        let handle = tokio::spawn(start_ingestion(
            rx,
            engine.clone(),
            SpikeDetector::with_defaults(),
            1_000,
        ));

        let mut producer =
            EventProducer::new(catalog, &demo_weights(), Domains::default(), 7).unwrap();

        let mut expected = 0u64;
        for wave in [120usize, 250, 80] {
            for chunk in producer.batch(wave).chunks(50) {
                tx.send(IngestMessage::Batch(chunk.to_vec())).await.unwrap();
            }
            expected += wave as u64;
            assert_eq!(sync(&tx).await, expected);
        }

        tx.send(IngestMessage::Shutdown).await.unwrap();
        let report = handle.await.unwrap();
        assert_eq!(report.events_received, 450);

        let engine = engine.lock().unwrap();
        let summary = engine.summary();

        assert_eq!(summary.total_processed, 450);
        assert_eq!(summary.dropped_events, 0);
        assert_eq!(engine.window_len(), 450);

        let item_total: u64 = engine.aggregates().iter().map(|a| a.total_count()).sum();
        assert_eq!(item_total, 450);

        let ranked = engine.top_items(10);
        assert_eq!(ranked.len(), 10);
        for pair in ranked.windows(2) {
            assert!(pair[0].total_count() >= pair[1].total_count());
        }
        assert_eq!(summary.top_3_by_count.len(), 3);
        assert_eq!(summary.top_3_by_count[0].item_id, ranked[0].item_id());
        assert_eq!(summary.top_3_by_count[0].total_count, ranked[0].total_count());

        for agg in engine.aggregates() {
            assert!(agg.distinct_actors() <= agg.total_count());
            assert!((0.0..=100.0).contains(&agg.completion_rate()));
            if agg.total_count() > 0 {
                assert!(agg.avg_engagement() > 0.0);
                assert!(!agg.top_platform().is_empty());
                assert!(!agg.top_region().is_empty());
            }
        }
    }

    #[tokio::test]
    async fn test_multiple_producers_single_channel() {
        let catalog = Catalog::new(vec![
            CatalogEntry::new("a", "Alpha", 120),
            CatalogEntry::new("b", "Beta", 120),
        ])
        .unwrap();
        let engine = shared_engine(catalog);
        let (tx, rx) = mpsc::channel(16);
        let handle = tokio::spawn(start_ingestion(
            rx,
            engine.clone(),
            SpikeDetector::with_defaults(),
            1_000,
        ));

        let mut producers = Vec::new();
        for (p, item) in ["a", "b", "missing"].into_iter().enumerate() {
            let tx = tx.clone();
            producers.push(tokio::spawn(async move {
                for i in 0..20 {
                    let event = PlayEvent {
                        id: format!("{}-{}", p, i),
                        item_id: item.to_string(),
                        actor_id: format!("user_{}", i % 5),
                        platform: "Spotify".to_string(),
                        region: "US-East".to_string(),
                        device: "iPhone".to_string(),
                        arrival_time: i as f64,
                        engaged_seconds: 100,
                        completed: i % 2 == 0,
                    };
                    if tx.send(IngestMessage::Play(event)).await.is_err() {
                        break;
                    }
                }
            }));
        }
        for producer in producers {
            producer.await.unwrap();
        }
        drop(tx);

        let report = handle.await.unwrap();
        assert_eq!(report.events_received, 60);

        let engine = engine.lock().unwrap();
        assert_eq!(engine.total_processed(), 40);
        assert_eq!(engine.dropped_events(), 20);

        let alpha = engine.aggregate("a").unwrap();
        assert_eq!(alpha.total_count(), 20);
        assert_eq!(alpha.distinct_actors(), 5);
        assert_eq!(alpha.completion_rate(), 50.0);
        assert_eq!(alpha.avg_engagement(), 100.0);
    }

    #[tokio::test]
    async fn test_export_after_ingestion() {
        let catalog = demo_catalog().unwrap();
        let engine = shared_engine(catalog.clone());
        let (tx, rx) = mpsc::channel(8);
        let handle = tokio::spawn(start_ingestion(
            rx,
            engine.clone(),
            SpikeDetector::with_defaults(),
            1_000,
        ));

        let mut producer =
            EventProducer::new(catalog, &demo_weights(), Domains::default(), 3).unwrap();
        tx.send(IngestMessage::Batch(producer.batch(200))).await.unwrap();
        tx.send(IngestMessage::Shutdown).await.unwrap();
        handle.await.unwrap();

        let snapshot = {
            let engine = engine.lock().unwrap();
            Snapshot::capture(&engine, "Integration")
        };

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("snapshot.json");
        let mut writer = JsonFileWriter::new(&path);
        writer.write_snapshot(&snapshot).await.unwrap();

        let written: Snapshot =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(written.label, "Integration");
        assert_eq!(written.summary.total_processed, 200);
        assert_eq!(written.items.len(), 10);
        assert_eq!(
            written.items.iter().map(|i| i.total_count).sum::<u64>(),
            200
        );
        assert_eq!(written.summary.top_3_by_count[0].item_id, written.items[0].item_id);
    }
}
