// Scenario Runner - Load and execute power/distance scenario YAML files
//
// Usage:
//   cargo run --bin scenario_runner scenarios/parf.yaml
//   cargo run --bin scenario_runner scenarios/  (runs all .yaml files in directory)
//   cargo run --bin scenario_runner scenarios/parf.yaml --seed 0x1234...

mod power_distance;

use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use log::LevelFilter;
use pa_rust::{DataRate, EventSink, Vector};
use power_distance::error::ScenarioError;
use power_distance::{
    CsvEventSink, LoggingEventSink, ManagerKind, PowerDistanceConfig, PowerDistanceRunner,
};
use simple_logger::SimpleLogger;

/// Level in force for scenarios that do not set `log_level`
const DEFAULT_LOG_LEVEL: LevelFilter = LevelFilter::Trace;

/// Simplified scenario file format
#[derive(Debug, serde::Deserialize)]
struct ScenarioFile {
    /// Scenario metadata
    #[serde(default)]
    meta: ScenarioMeta,

    /// Configuration overrides
    #[serde(default)]
    config: ScenarioConfig,
}

#[derive(Debug, Default, serde::Deserialize)]
struct ScenarioMeta {
    name: Option<String>,
    description: Option<String>,
    hypothesis: Option<String>,
}

#[derive(Debug, Default, serde::Deserialize)]
struct ScenarioConfig {
    // Experiment settings
    manager: Option<ManagerKind>,
    rts_threshold: Option<u32>,
    output_file_name: Option<String>,
    steps: Option<u32>,
    steps_size: Option<f64>,
    /// Seconds per step
    steps_time: Option<f64>,
    max_power: Option<f64>,
    min_power: Option<f64>,
    power_levels: Option<u32>,

    // Positions
    ap_x: Option<f64>,
    ap_y: Option<f64>,
    sta_x: Option<f64>,
    sta_y: Option<f64>,

    // Output
    log_level: Option<String>,
    event_log: Option<PathBuf>,

    // Traffic, MAC and link overrides (optional)
    #[serde(default)]
    traffic: Option<TrafficOverrides>,

    #[serde(default)]
    mac: Option<MacOverrides>,

    #[serde(default)]
    link: Option<LinkOverrides>,
}

#[derive(Debug, Default, serde::Deserialize)]
struct TrafficOverrides {
    packet_size: Option<u32>,
    data_rate_kbps: Option<u64>,
    /// Seconds
    start: Option<f64>,
}

#[derive(Debug, Default, serde::Deserialize)]
struct MacOverrides {
    queue_limit: Option<usize>,
    retry_limit: Option<u32>,
    beacon_interval_ms: Option<f64>,
    constant_rate_kbps: Option<u64>,
}

#[derive(Debug, Default, serde::Deserialize)]
struct LinkOverrides {
    reference_loss: Option<f64>,
    path_loss_exponent: Option<f64>,
    noise_floor: Option<f64>,
    steepness: Option<f64>,
}

fn main() {
    SimpleLogger::new().with_level(DEFAULT_LOG_LEVEL).init().unwrap();

    let args: Vec<String> = env::args().collect();

    if args.len() < 2 {
        eprintln!("Usage: {} <scenario.yaml | directory/> [--seed SEED_HEX]", args[0]);
        eprintln!("\nExamples:");
        eprintln!("  {} scenarios/parf.yaml", args[0]);
        eprintln!("  {} scenarios/", args[0]);
        eprintln!("  {} scenarios/parf.yaml --seed 0x123456...", args[0]);
        std::process::exit(1);
    }

    let path = Path::new(&args[1]);

    // Parse optional seed
    let seed: Option<[u8; 32]> = if args.len() >= 4 && args[2] == "--seed" {
        Some(parse_seed_hex(&args[3]))
    } else {
        None
    };

    if path.is_file() {
        run_or_exit(path, seed);
    } else if path.is_dir() {
        run_scenario_directory(path, seed);
    } else {
        eprintln!("Error: Path does not exist: {}", path.display());
        std::process::exit(1);
    }
}

fn run_scenario_directory(dir: &Path, seed: Option<[u8; 32]>) {
    let mut scenarios = Vec::new();

    // Find all .yaml files
    if let Ok(entries) = fs::read_dir(dir) {
        for entry in entries.flatten() {
            let path = entry.path();
            let ext = path.extension().and_then(|s| s.to_str());
            if ext == Some("yaml") || ext == Some("yml") {
                scenarios.push(path);
            }
        }
    }

    scenarios.sort();

    if scenarios.is_empty() {
        eprintln!("No .yaml files found in {}", dir.display());
        std::process::exit(1);
    }

    println!("\n╔════════════════════════════════════════════════════════╗");
    println!("║  SCENARIO RUNNER - Multiple Scenarios                 ║");
    println!("╚════════════════════════════════════════════════════════╝\n");
    println!("Found {} scenario(s) to run\n", scenarios.len());

    for (i, scenario_path) in scenarios.iter().enumerate() {
        println!("\n{}/{} Running: {}\n", i + 1, scenarios.len(), scenario_path.display());
        run_or_exit(scenario_path, seed);
    }

    println!("\n╔════════════════════════════════════════════════════════╗");
    println!("║  All scenarios complete!                               ║");
    println!("╚════════════════════════════════════════════════════════╝\n");
}

fn run_or_exit(path: &Path, seed: Option<[u8; 32]>) {
    if let Err(e) = run_scenario_file(path, seed) {
        eprintln!("Scenario {} failed: {}", path.display(), e);
        std::process::exit(1);
    }
}

fn run_scenario_file(path: &Path, seed: Option<[u8; 32]>) -> Result<(), ScenarioError> {
    println!("Loading scenario from: {}", path.display());

    let yaml_content = fs::read_to_string(path)?;
    let scenario: ScenarioFile = serde_yaml::from_str(&yaml_content)?;

    // Print scenario header
    println!("\n╔════════════════════════════════════════════════════════╗");
    if let Some(ref name) = scenario.meta.name {
        println!("║  {}  {}", name, " ".repeat(54_usize.saturating_sub(name.len())));
    } else {
        let stem = path.file_stem().and_then(|s| s.to_str()).unwrap_or("?");
        println!("║  Scenario: {}  ", stem);
    }
    println!("╚════════════════════════════════════════════════════════╝\n");

    if let Some(ref desc) = scenario.meta.description {
        println!("{}\n", desc);
    }

    if let Some(ref hypothesis) = scenario.meta.hypothesis {
        println!("Hypothesis:");
        println!("  {}\n", hypothesis);
    }

    // a directory run must not inherit the previous scenario's level
    log::set_max_level(log_level(scenario.config.log_level.as_deref())?);

    let config = build_config(scenario.config, seed)?;

    if config.steps == 0 {
        println!("Nothing to simulate: steps is 0\n");
        return Ok(());
    }

    println!("Configuration:");
    println!("  Manager: {}", config.manager);
    println!("  AP: {}  STA: {}", config.ap_position, config.sta_position);
    println!(
        "  Steps: {} x {}m every {:.3}s",
        config.steps,
        config.steps_size,
        config.steps_time.as_secs_f64()
    );
    println!(
        "  Power: {} to {} dBm in {} levels",
        config.min_power, config.max_power, config.power_levels
    );
    println!("  Offered load: {}", config.traffic.data_rate);
    println!("\nStarting simulation...\n");

    let sink: Box<dyn EventSink> = match &config.event_log {
        Some(path) => Box::new(CsvEventSink::new(path)?),
        None => Box::new(LoggingEventSink),
    };

    // Run simulation
    let runner = PowerDistanceRunner::new_with_sink(config, sink)?;
    let result = runner.run()?;

    // Print results
    result.print_summary();
    for written in result.write_plots(Path::new("."))? {
        println!("Wrote {}", written.display());
    }

    println!("\n✓ Scenario complete!\n");
    Ok(())
}

fn log_level(level: Option<&str>) -> Result<LevelFilter, ScenarioError> {
    match level {
        Some(level) => LevelFilter::from_str(level)
            .map_err(|_| ScenarioError::Config(format!("unknown log level {}", level))),
        None => Ok(DEFAULT_LOG_LEVEL),
    }
}

/// Seconds from the scenario file; negative, non-finite and oversized values are rejected
fn seconds(field: &str, value: f64) -> Result<Duration, ScenarioError> {
    Duration::try_from_secs_f64(value)
        .map_err(|e| ScenarioError::Config(format!("{} = {}: {}", field, value, e)))
}

fn build_config(
    overrides: ScenarioConfig,
    seed: Option<[u8; 32]>,
) -> Result<PowerDistanceConfig, ScenarioError> {
    let mut config = PowerDistanceConfig {
        seed,
        ..Default::default()
    };

    if let Some(v) = overrides.manager {
        config.manager = v;
        config.output_file_name = v.to_string();
    }
    if let Some(v) = overrides.rts_threshold {
        config.rts_threshold = v;
    }
    if let Some(v) = overrides.output_file_name {
        config.output_file_name = v;
    }
    if let Some(v) = overrides.steps {
        config.steps = v;
    }
    if let Some(v) = overrides.steps_size {
        config.steps_size = v;
    }
    if let Some(v) = overrides.steps_time {
        config.steps_time = seconds("steps_time", v)?;
    }
    if let Some(v) = overrides.max_power {
        config.max_power = v;
    }
    if let Some(v) = overrides.min_power {
        config.min_power = v;
    }
    if let Some(v) = overrides.power_levels {
        config.power_levels = v;
    }

    config.ap_position = Vector::new(
        overrides.ap_x.unwrap_or(config.ap_position.x),
        overrides.ap_y.unwrap_or(config.ap_position.y),
        0.0,
    );
    config.sta_position = Vector::new(
        overrides.sta_x.unwrap_or(config.sta_position.x),
        overrides.sta_y.unwrap_or(config.sta_position.y),
        0.0,
    );
    config.event_log = overrides.event_log;

    // Apply traffic overrides
    if let Some(ref traffic) = overrides.traffic {
        if let Some(v) = traffic.packet_size {
            config.traffic.packet_size = v;
        }
        if let Some(v) = traffic.data_rate_kbps {
            config.traffic.data_rate = DataRate::from_kbps(v);
        }
        if let Some(v) = traffic.start {
            config.traffic.start = seconds("traffic.start", v)?;
        }
    }

    // Apply MAC overrides
    if let Some(ref mac) = overrides.mac {
        if let Some(v) = mac.queue_limit {
            config.mac.queue_limit = v;
        }
        if let Some(v) = mac.retry_limit {
            config.mac.retry_limit = v;
        }
        if let Some(v) = mac.beacon_interval_ms {
            config.mac.beacon_interval = seconds("mac.beacon_interval_ms", v / 1000.0)?;
        }
        if let Some(v) = mac.constant_rate_kbps {
            config.mac.constant_rate = DataRate::from_kbps(v);
        }
    }

    // Apply link overrides
    if let Some(ref link) = overrides.link {
        if let Some(v) = link.reference_loss {
            config.link.reference_loss = v;
        }
        if let Some(v) = link.path_loss_exponent {
            config.link.path_loss_exponent = v;
        }
        if let Some(v) = link.noise_floor {
            config.link.noise_floor = v;
        }
        if let Some(v) = link.steepness {
            config.link.steepness = v;
        }
    }

    Ok(config)
}

fn parse_seed_hex(hex: &str) -> [u8; 32] {
    let hex = hex.strip_prefix("0x").unwrap_or(hex);
    let mut seed = [0u8; 32];

    for (i, chunk) in hex.as_bytes().chunks(2).enumerate() {
        if i >= 32 {
            break;
        }
        let byte = std::str::from_utf8(chunk)
            .ok()
            .and_then(|s| u8::from_str_radix(s, 16).ok());
        seed[i] = byte.unwrap_or_else(|| {
            eprintln!("Invalid hex seed: {}", hex);
            std::process::exit(1);
        });
    }

    seed
}
