//! Power Adaptation Distance Simulation
//!
//! Run with: cargo run --bin power_distance_sim

mod power_distance;

use std::path::Path;

use log::{error, info};
use pa_rust::{EventSink, Vector};
use power_distance::{
    CsvEventSink, LoggingEventSink, ManagerKind, PowerDistanceConfig, PowerDistanceRunner,
};
use simple_logger::SimpleLogger;

fn main() {
    SimpleLogger::new().init().unwrap();

    println!("╔════════════════════════════════════════════════════════╗");
    println!("║        Power Adaptation Distance Simulator             ║");
    println!("╚════════════════════════════════════════════════════════╝\n");

    // Configure simulation
    let config = PowerDistanceConfig {
        manager: ManagerKind::Parf,
        output_file_name: "parf".to_string(),
        ap_position: Vector::new(0.0, 0.0, 0.0),
        sta_position: Vector::new(5.0, 0.0, 0.0),
        steps: 200,
        steps_size: 1.0,
        max_power: 17.0,
        min_power: 0.0,
        power_levels: 18,
        seed: None, // Will be auto-generated
        ..Default::default()
    };

    if config.steps == 0 {
        info!("Nothing to simulate: steps is 0");
        return;
    }

    info!("Configuration:");
    info!("  Manager: {}", config.manager);
    info!("  AP: {}  STA: {}", config.ap_position, config.sta_position);
    info!("  Steps: {} x {}m every {:?}", config.steps, config.steps_size, config.steps_time);
    info!(
        "  Power: {} to {} dBm in {} levels",
        config.min_power, config.max_power, config.power_levels
    );
    info!("  RTS threshold: {}", config.rts_threshold);
    info!("");

    let sink: Box<dyn EventSink> = match &config.event_log {
        Some(path) => match CsvEventSink::new(path) {
            Ok(sink) => Box::new(sink),
            Err(e) => {
                error!("Cannot create {}: {}", path.display(), e);
                std::process::exit(1);
            }
        },
        None => Box::new(LoggingEventSink),
    };

    info!("Starting simulation...");

    let result = PowerDistanceRunner::new_with_sink(config, sink).and_then(|runner| runner.run());
    let result = match result {
        Ok(result) => result,
        Err(e) => {
            error!("Simulation aborted: {}", e);
            std::process::exit(1);
        }
    };

    // Display results
    result.print_summary();

    if let Err(e) = result.write_plots(Path::new(".")) {
        error!("Failed to write plots: {}", e);
        std::process::exit(1);
    }

    info!("✓ Simulation complete!");
}
