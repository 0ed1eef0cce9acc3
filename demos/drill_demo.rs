//! Demonstration of the drill sensor pipeline without a model service.
//!
//! This example shows how to:
//! 1. Generate samples from a degrading drill
//! 2. Keep them in a bounded feed and follow its updates
//! 3. Build the feature window the models expect
//! 4. Summarize the window per channel
//! 5. Evaluate windows with predictions disabled
//!
//! Run with: cargo run --example drill_demo

use std::time::Duration;

use drill_sensor_agent::{
    core::{create_shared_feed, FeatureWindow, WindowSummary},
    monitor::{DrillMonitor, DEFAULT_WINDOW_SIZE},
    predictor::{RulRequest, TemperatureRequest},
    sensor::SignalGenerator,
    stats::create_shared_log,
    DisabledPredictor, SIMULATION_NOTICE,
};

fn main() {
    println!("Drill Sensor Agent - Pipeline Demo");
    println!("==================================");
    println!();
    println!("{SIMULATION_NOTICE}");
    println!();

    let log = create_shared_log();
    let feed = create_shared_feed(50);
    let monitor = DrillMonitor::new(DEFAULT_WINDOW_SIZE, log.clone());
    let updates = feed.subscribe();
    let mut generator = SignalGenerator::with_seed(42);

    println!("Drill ID: {}", monitor.drill_id());
    println!();
    println!("Generating 25 samples...");

    for _ in 0..25 {
        let sample = generator.generate();
        log.record_sample_generated();
        if let Err(e) = feed.append(sample) {
            eprintln!("Feed rejected sample: {e}");
            log.record_append_failure();
            continue;
        }

        let Ok(update) = updates.recv_timeout(Duration::from_millis(100)) else {
            continue;
        };
        let newest = update.samples.last().map(|s| (s.temperature, s.rpm));
        if let Some((temperature, rpm)) = newest {
            println!(
                "  #{:>2}  temperature {:>6.2}  rpm {:>4}",
                update.sequence, temperature, rpm
            );
        }

        if let Some(report) = monitor.handle_update(&update, &DisabledPredictor) {
            println!(
                "       window of {} evaluated: rul {}, temperature {}",
                report.window_len, report.rul, report.temperature
            );
        }
    }
    println!();

    let samples = feed.window(DEFAULT_WINDOW_SIZE);
    let window = FeatureWindow::from_samples(&samples);

    println!("=== Feature Window ===");
    println!("  Rows: {}", window.len());
    if let Some(first) = window.rows.first() {
        println!("  First row: {:?}", first.to_array());
    }
    if let Some(last) = window.rows.last() {
        println!("  Last row:  {:?}", last.to_array());
    }
    println!();

    let rul_request = RulRequest::from_window(&window);
    let temperature_request = TemperatureRequest::from_window(&window);
    println!("=== Request Shapes ===");
    println!(
        "  RUL:         [{}][{}][7]",
        rul_request.sequence.len(),
        rul_request.sequence.first().map_or(0, Vec::len)
    );
    println!(
        "  Temperature: [{}][{}]",
        temperature_request.sequence.len(),
        temperature_request.sequence.first().map_or(0, Vec::len)
    );
    println!();

    if let Some(summary) = WindowSummary::from_samples(&samples) {
        println!("=== Window Summary ===");
        let channels = [
            ("temperature", summary.temperature),
            ("rpm", summary.rpm),
            ("load", summary.load),
            ("vibration", summary.vibration),
            ("depth", summary.depth),
        ];
        for (name, stats) in channels {
            println!(
                "  {name:<12} latest {:>8.2}  mean {:>8.2}  std {:>6.3}  range [{:.2}, {:.2}]",
                stats.latest, stats.mean, stats.std_dev, stats.min, stats.max
            );
        }
        println!();
    }

    println!("=== Run Statistics ===");
    println!("{}", log.summary());
}
