//! Human-readable console report
//!
//! Reads the engine through its public accessors only. Rendering returns a
//! `String` so the caller decides where it goes.

use crate::pipeline::anomaly::ThroughputSpike;
use crate::pipeline::engine::AggregationEngine;
use crossterm::style::Stylize;
use std::fmt::Write;

const RULE_WIDTH: usize = 62;
const BAR_WIDTH: usize = 30;

/// Proportional bar of `width` cells
pub fn bar(value: u64, max_value: u64, width: usize) -> String {
    let filled = if max_value == 0 {
        0
    } else {
        ((value as f64 / max_value as f64 * width as f64).round() as usize).min(width)
    };
    format!("{}{}", "█".repeat(filled), "░".repeat(width - filled))
}

/// `1234567` -> `"1,234,567"`
pub fn with_thousands(value: u64) -> String {
    let digits = value.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

fn rank_label(rank: usize) -> String {
    match rank {
        1 => "🥇".to_string(),
        2 => "🥈".to_string(),
        3 => "🥉".to_string(),
        n => format!("{:>2}.", n),
    }
}

/// Render the full analytics report
pub fn render_report(
    engine: &AggregationEngine,
    label: &str,
    anomalies: &[ThroughputSpike],
) -> String {
    let mut out = String::new();
    // Writing to a String cannot fail
    let _ = write_report(&mut out, engine, label, anomalies);
    out
}

fn write_report(
    out: &mut String,
    engine: &AggregationEngine,
    label: &str,
    anomalies: &[ThroughputSpike],
) -> std::fmt::Result {
    let rule = "─".repeat(RULE_WIDTH);
    let summary = engine.summary();

    writeln!(out)?;
    writeln!(out, "{}", rule.as_str().cyan().bold())?;
    writeln!(
        out,
        "{}",
        format!("  🎵  {} · Streaming Analytics Report", label).cyan().bold()
    )?;
    writeln!(out, "{}", rule.as_str().cyan().bold())?;

    writeln!(out)?;
    writeln!(out, "{}", "Pipeline Stats".bold())?;
    writeln!(
        out,
        "  Total events processed : {}",
        with_thousands(summary.total_processed).green()
    )?;
    writeln!(
        out,
        "  Unique items streamed  : {}",
        summary.distinct_items_with_traffic
    )?;
    writeln!(
        out,
        "  Dropped events         : {}",
        with_thousands(summary.dropped_events)
    )?;
    writeln!(
        out,
        "  Throughput (last {}s)  : {}",
        engine.window_horizon().as_secs(),
        format!("{} events/sec", summary.throughput).yellow()
    )?;

    let ranked = engine.top_items(engine.aggregates().len());
    let max_count = ranked.first().map(|agg| agg.total_count()).unwrap_or(0);

    writeln!(out)?;
    writeln!(out, "{}", "Leaderboard  (all time)".bold())?;
    for (i, agg) in ranked.iter().enumerate() {
        writeln!(
            out,
            "  {} {:<26} {} {:>5} plays  complete:{}  top:{}",
            rank_label(i + 1),
            agg.title(),
            bar(agg.total_count(), max_count, BAR_WIDTH).blue(),
            agg.total_count(),
            format!("{:5.1}%", agg.completion_rate()).green(),
            agg.top_platform()
        )?;
    }

    if let Some(top) = ranked.first().filter(|agg| agg.total_count() > 0) {
        let duration = engine
            .catalog()
            .get(top.item_id())
            .map(|entry| entry.duration_secs)
            .unwrap_or(0);

        writeln!(out)?;
        writeln!(out, "{}", format!("Top Item Deep-Dive  →  {}", top.title()).bold())?;
        writeln!(
            out,
            "  Unique listeners  : {}",
            with_thousands(top.distinct_actors())
        )?;
        if let Some(estimate) = top.approx_distinct_actors() {
            writeln!(out, "  Approx. listeners : ~{}", with_thousands(estimate))?;
        }
        writeln!(
            out,
            "  Avg listen time   : {:.1}s / {}s total",
            top.avg_engagement(),
            duration
        )?;
        writeln!(out, "  Completion rate   : {}%", top.completion_rate())?;
        writeln!(out, "  Top platform      : {}", top.top_platform())?;
        writeln!(out, "  Top region        : {}", top.top_region())?;
    } else {
        writeln!(out)?;
        writeln!(out, "  No plays recorded")?;
    }

    if !anomalies.is_empty() {
        writeln!(out)?;
        writeln!(out, "{}", "Throughput Spikes".bold())?;
        for spike in anomalies {
            writeln!(
                out,
                "  {:.2} events/sec vs baseline {:.2}",
                spike.observed, spike.baseline
            )?;
        }
    }

    writeln!(out)?;
    writeln!(out, "{}", rule.as_str().cyan())?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::config::EngineConfig;
    use crate::pipeline::types::{Catalog, CatalogEntry, PlayEvent};

    fn make_event(item_id: &str, actor: &str, completed: bool) -> PlayEvent {
        PlayEvent {
            id: actor.to_string(),
            item_id: item_id.to_string(),
            actor_id: actor.to_string(),
            platform: "Spotify".to_string(),
            region: "EU-West".to_string(),
            device: "Mac".to_string(),
            arrival_time: 0.0,
            engaged_seconds: 120,
            completed,
        }
    }

    fn make_engine() -> AggregationEngine {
        let catalog = Catalog::new(vec![
            CatalogEntry::new("a", "Opening Song", 150),
            CatalogEntry::new("b", "Closing Song", 200),
        ])
        .unwrap();
        AggregationEngine::new(catalog, EngineConfig::default())
    }

    #[test]
    fn test_bar() {
        assert_eq!(bar(5, 10, 10), "█████░░░░░");
        assert_eq!(bar(10, 10, 4), "████");
        assert_eq!(bar(0, 0, 3), "░░░");
    }

    #[test]
    fn test_with_thousands() {
        assert_eq!(with_thousands(0), "0");
        assert_eq!(with_thousands(999), "999");
        assert_eq!(with_thousands(4_500), "4,500");
        assert_eq!(with_thousands(1_234_567), "1,234,567");
    }

    #[test]
    fn test_report_contains_leaderboard_and_deep_dive() {
        let mut engine = make_engine();
        engine.process(&make_event("b", "u1", true));
        engine.process(&make_event("b", "u2", false));
        engine.process(&make_event("a", "u3", false));

        let report = render_report(&engine, "Test Artist", &[]);

        assert!(report.contains("Test Artist"));
        assert!(report.contains("Top Item Deep-Dive  →  Closing Song"));
        assert!(report.contains("Avg listen time   : 120.0s / 200s total"));
        assert!(report.contains("Completion rate   : 50%"));
        assert!(report.contains("Top region        : EU-West"));

        let closing = report.find("Closing Song").unwrap();
        let opening = report.find("Opening Song").unwrap();
        assert!(closing < opening);
    }

    #[test]
    fn test_report_without_traffic() {
        let engine = make_engine();
        let report = render_report(&engine, "Quiet", &[]);

        assert!(report.contains("No plays recorded"));
        assert!(!report.contains("Deep-Dive"));
    }

    #[test]
    fn test_report_lists_spikes() {
        let engine = make_engine();
        let spikes = vec![ThroughputSpike {
            observed: 9.0,
            baseline: 2.0,
        }];

        let report = render_report(&engine, "Spiky", &spikes);
        assert!(report.contains("9.00 events/sec vs baseline 2.00"));
    }
}
