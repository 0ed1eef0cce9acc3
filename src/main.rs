//! Drill Sensor Agent CLI
//!
//! Simulated drill monitoring with predictive feature windows.

use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use crossbeam_channel::{Receiver, RecvTimeoutError};
use drill_sensor_agent::{
    config::Config,
    core::{create_shared_feed, FeatureWindow, FeedUpdate},
    monitor::DrillMonitor,
    predictor::{DisabledPredictor, Predictor, PredictorConfig, RulRequest, TemperatureRequest},
    sensor::{GeneratorState, PartialSample, SampleTimer, SignalGenerator},
    stats::{create_shared_log_with_persistence, PersistedStats},
    SIMULATION_NOTICE, VERSION,
};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

#[cfg(feature = "predictor")]
use drill_sensor_agent::BlockingPredictionClient;

#[derive(Parser)]
#[command(name = "drill-sensor")]
#[command(version = VERSION)]
#[command(about = "Simulated drill sensor agent with predictive feature windows", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the simulated drill
    Run {
        /// Seconds between generated samples
        #[arg(long)]
        interval: Option<u64>,

        /// Seed for a reproducible run
        #[arg(long)]
        seed: Option<u64>,

        /// Request predictions for every full window
        #[arg(long)]
        predict: bool,

        /// Base URL of the prediction service
        #[arg(long)]
        predictor_url: Option<String>,

        /// Serve the dashboard API (requires server feature)
        #[arg(long)]
        serve: bool,

        /// Dashboard API port
        #[arg(long)]
        port: Option<u16>,
    },

    /// Print generated samples as JSON lines without running the timer
    Simulate {
        /// Number of samples to generate
        #[arg(long, short, default_value = "20")]
        count: usize,

        /// Seed for reproducible output
        #[arg(long)]
        seed: Option<u64>,

        /// Cycle to resume the wear model from
        #[arg(long, default_value = "0")]
        start_cycle: u64,
    },

    /// Build prediction inputs from a JSON array of samples (oldest first)
    Features {
        /// File containing the samples
        #[arg(long, short)]
        input: PathBuf,

        /// Window length (defaults to the configured window size)
        #[arg(long)]
        window: Option<usize>,
    },

    /// Show configuration and cumulative run statistics
    Status,

    /// Show configuration
    Config,

    /// Display the simulation notice
    Notice,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_target(false)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            interval,
            seed,
            predict,
            predictor_url,
            serve,
            port,
        } => {
            cmd_run(interval, seed, predict, predictor_url, serve, port).await;
        }
        Commands::Simulate {
            count,
            seed,
            start_cycle,
        } => {
            cmd_simulate(count, seed, start_cycle);
        }
        Commands::Features { input, window } => {
            cmd_features(&input, window);
        }
        Commands::Status => {
            cmd_status();
        }
        Commands::Config => {
            cmd_config();
        }
        Commands::Notice => {
            cmd_notice();
        }
    }
}

fn load_config() -> Config {
    match Config::load() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Warning: Could not load configuration ({e}), using defaults");
            Config::default()
        }
    }
}

async fn cmd_run(
    interval: Option<u64>,
    seed: Option<u64>,
    predict: bool,
    predictor_url: Option<String>,
    serve: bool,
    port: Option<u16>,
) {
    println!("Drill Sensor Agent v{VERSION}");
    println!();

    let mut config = load_config();
    if let Some(secs) = interval {
        config.sample_interval = Duration::from_secs(secs);
    }
    if seed.is_some() {
        config.seed = seed;
    }
    if let Some(url) = predictor_url {
        config.predictor.base_url = url;
        config.predictor.enabled = true;
    }
    if predict {
        config.predictor.enabled = true;
    }
    if let Some(p) = port {
        config.server_port = p;
    }

    if let Err(e) = config.validate() {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
    if let Err(e) = config.ensure_directories() {
        eprintln!("Warning: Could not create directories: {e}");
    }
    let timezone = config.timezone().unwrap_or(chrono_tz::Tz::UTC);

    let run_log = create_shared_log_with_persistence(config.stats_path());
    let feed = create_shared_feed(config.feed_capacity);
    let monitor = DrillMonitor::new(config.window_size, run_log.clone());
    let drill_id = monitor.drill_id().to_string();
    let report = monitor.shared_report();

    println!("Starting simulated drill...");
    println!("  Drill ID: {drill_id}");
    println!("  Sample interval: {}s", config.sample_interval.as_secs());
    println!("  Feed capacity: {} samples", config.feed_capacity);
    println!("  Prediction window: {} samples", config.window_size);
    println!("  RPM floor: {}", config.rpm_floor);
    if config.predictor.enabled {
        println!("  Predictions: enabled ({})", config.predictor.base_url);
    } else {
        println!("  Predictions: disabled");
    }

    let generator = match config.seed {
        Some(seed) => {
            println!("  Seed: {seed}");
            SignalGenerator::with_seed(seed)
        }
        None => SignalGenerator::new(),
    }
    .with_rpm_floor(config.rpm_floor);
    let generator = Arc::new(Mutex::new(generator));

    // Monitor runs on its own thread with a blocking predictor client
    let running = Arc::new(AtomicBool::new(true));
    let receiver = feed.subscribe();
    let monitor_thread = {
        let running = running.clone();
        let predictor_config = config.predictor.clone();
        thread::spawn(move || monitor_loop(monitor, receiver, predictor_config, running))
    };

    #[cfg(feature = "server")]
    let server_shutdown = if serve {
        let server_config = drill_sensor_agent::server::ServerConfig::new(
            config.server_port,
            config.window_size,
            drill_id.clone(),
        );
        match drill_sensor_agent::server::run(server_config, feed.clone(), report, run_log.clone())
            .await
        {
            Ok((addr, shutdown_tx)) => {
                println!("  Dashboard API: http://{addr}");
                Some(shutdown_tx)
            }
            Err(e) => {
                eprintln!("Warning: Dashboard API failed to start: {e}");
                None
            }
        }
    } else {
        None
    };

    #[cfg(not(feature = "server"))]
    {
        let _ = report;
        if serve {
            eprintln!("Warning: --serve flag ignored (server feature not enabled at compile time)");
        }
    }

    println!();
    println!("Press Ctrl+C to stop");
    println!();

    let mut timer = SampleTimer::new(config.sample_interval);
    timer.start({
        let feed = feed.clone();
        let run_log = run_log.clone();
        let generator = generator.clone();
        move || {
            let (sample, cycle) = match generator.lock() {
                Ok(mut generator) => (generator.generate(), generator.cycle()),
                Err(e) => {
                    tracing::error!("Generator lock poisoned: {e}");
                    return;
                }
            };
            run_log.record_sample_generated();

            match feed.append(sample) {
                Ok(stored) => println!(
                    "[{}] #{cycle} temp {:.2}°C | rpm {} | load {:.2}A | vib {:.3}m/s² | depth {:.2}mm",
                    format_time(stored.recorded_at, timezone),
                    stored.temperature,
                    stored.rpm,
                    stored.load,
                    stored.vibration,
                    stored.depth
                ),
                Err(e) => {
                    run_log.record_append_failure();
                    tracing::warn!("Sample not stored: {e}");
                }
            }
        }
    });

    if let Err(e) = tokio::signal::ctrl_c().await {
        eprintln!("Error waiting for Ctrl+C: {e}");
    }

    println!();
    println!("Stopping simulated drill...");
    timer.stop();
    feed.close();
    running.store(false, Ordering::SeqCst);

    #[cfg(feature = "server")]
    if let Some(shutdown_tx) = server_shutdown {
        let _ = shutdown_tx.send(());
    }

    match tokio::task::spawn_blocking(move || monitor_thread.join()).await {
        Ok(Ok(())) => {}
        _ => eprintln!("Warning: Monitor thread did not shut down cleanly"),
    }

    if let Ok(generator) = generator.lock() {
        println!("Final cycle: {}", generator.cycle());
    }

    if let Err(e) = run_log.save() {
        eprintln!("Warning: Could not save run statistics: {e}");
    }

    println!();
    println!("{}", run_log.summary());
}

/// Evaluate feed updates until the feed disconnects or the run stops.
fn monitor_loop(
    monitor: DrillMonitor,
    receiver: Receiver<FeedUpdate>,
    predictor_config: PredictorConfig,
    running: Arc<AtomicBool>,
) {
    let predictor = create_predictor(&predictor_config);

    while running.load(Ordering::SeqCst) {
        match receiver.recv_timeout(Duration::from_millis(100)) {
            Ok(update) => {
                if let Some(report) = monitor.handle_update(&update, predictor.as_ref()) {
                    println!(
                        "[Predict] RUL: {} | Temperature: {}",
                        report.rul, report.temperature
                    );
                }
            }
            Err(RecvTimeoutError::Timeout) => continue,
            Err(RecvTimeoutError::Disconnected) => break,
        }
    }
}

/// Create the predictor for a run, falling back to the disabled one.
fn create_predictor(config: &PredictorConfig) -> Box<dyn Predictor> {
    #[cfg(feature = "predictor")]
    if config.enabled {
        match BlockingPredictionClient::new(config.clone()) {
            Ok(client) => return Box::new(client),
            Err(e) => {
                eprintln!("Warning: Predictor initialization failed: {e}");
                eprintln!("Continuing without predictions.");
            }
        }
    }

    #[cfg(not(feature = "predictor"))]
    if config.enabled {
        eprintln!("Warning: predictions ignored (predictor feature not enabled at compile time)");
    }

    Box::new(DisabledPredictor)
}

fn format_time(time: Option<DateTime<Utc>>, timezone: chrono_tz::Tz) -> String {
    time.map(|t| t.with_timezone(&timezone).format("%H:%M:%S").to_string())
        .unwrap_or_else(|| "--:--:--".to_string())
}

fn cmd_simulate(count: usize, seed: Option<u64>, start_cycle: u64) {
    let config = load_config();
    let seed = seed.or(config.seed);

    let generator = match seed {
        Some(seed) => SignalGenerator::with_seed(seed),
        None => SignalGenerator::new(),
    };
    let mut generator = generator
        .with_rpm_floor(config.rpm_floor)
        .with_state(GeneratorState::at_cycle(start_cycle));

    for _ in 0..count {
        let sample = generator.generate();
        match serde_json::to_string(&sample) {
            Ok(line) => println!("{line}"),
            Err(e) => {
                eprintln!("Error serializing sample: {e}");
                std::process::exit(1);
            }
        }
    }
}

fn cmd_features(input: &Path, window: Option<usize>) {
    let config = load_config();
    let window_size = window.unwrap_or(config.window_size);

    let content = match std::fs::read_to_string(input) {
        Ok(content) => content,
        Err(e) => {
            eprintln!("Error reading {input:?}: {e}");
            std::process::exit(1);
        }
    };
    let samples: Vec<PartialSample> = match serde_json::from_str(&content) {
        Ok(samples) => samples,
        Err(e) => {
            eprintln!("Error parsing samples: {e}");
            std::process::exit(1);
        }
    };

    if samples.len() < window_size {
        eprintln!(
            "Warning: {} samples available, predictors expect {window_size}",
            samples.len()
        );
    }

    let start = samples.len().saturating_sub(window_size);
    let features = FeatureWindow::from_samples(&samples[start..]);
    let output = serde_json::json!({
        "rows": features.len(),
        "rul_request": RulRequest::from_window(&features),
        "temperature_request": TemperatureRequest::from_window(&features),
    });

    match serde_json::to_string_pretty(&output) {
        Ok(json) => println!("{json}"),
        Err(e) => eprintln!("Error serializing features: {e}"),
    }
}

fn cmd_status() {
    let config = load_config();

    println!("Drill Sensor Agent Status");
    println!("=========================");
    println!();

    println!("Configuration:");
    println!("  Sample interval: {}s", config.sample_interval.as_secs());
    println!("  Feed capacity: {}", config.feed_capacity);
    println!("  Prediction window: {}", config.window_size);
    println!("  RPM floor: {}", config.rpm_floor);
    println!(
        "  Predictions: {}",
        if config.predictor.enabled {
            "enabled"
        } else {
            "disabled"
        }
    );
    match config.validate() {
        Ok(()) => println!("  Valid: yes"),
        Err(e) => println!("  Valid: no ({e})"),
    }
    println!();

    let stats_path = config.stats_path();
    let persisted = std::fs::read_to_string(&stats_path)
        .ok()
        .and_then(|content| serde_json::from_str::<PersistedStats>(&content).ok());

    match persisted {
        Some(stats) => {
            let timezone = config.timezone().unwrap_or(chrono_tz::Tz::UTC);
            println!("Cumulative Statistics:");
            println!("  Samples generated: {}", stats.samples_generated);
            println!("  Feed append failures: {}", stats.append_failures);
            println!("  Windows evaluated: {}", stats.windows_evaluated);
            println!("  Predictions succeeded: {}", stats.predictions_succeeded);
            println!("  Predictions unavailable: {}", stats.predictions_failed);
            println!(
                "  Last updated: {}",
                stats
                    .last_updated
                    .with_timezone(&timezone)
                    .format("%Y-%m-%d %H:%M:%S %Z")
            );
        }
        None => println!("No previous run data found."),
    }
}

fn cmd_config() {
    let config = load_config();

    println!("Configuration");
    println!("=============");
    println!();
    println!("Config file: {:?}", Config::config_path());
    println!();
    println!(
        "{}",
        serde_json::to_string_pretty(&config).unwrap_or_else(|_| "Error".to_string())
    );
}

fn cmd_notice() {
    println!("{SIMULATION_NOTICE}");
}
