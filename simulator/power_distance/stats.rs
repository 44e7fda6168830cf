//! Statistics and results for the power adaptation distance experiment

use std::path::{Path, PathBuf};
use std::time::Duration;

use log::info;
use pa_rust::pa_gnuplot::{Gnuplot, Gnuplot2dDataset};
use pa_rust::Vector;

use super::config::ManagerKind;
use super::error::ScenarioError;

/// Simulation result
#[derive(Debug)]
pub struct SimResult {
    /// Seed used for the simulation
    pub seed_used: [u8; 32],

    pub manager: ManagerKind,

    /// Label the plot files are named after
    pub output_file_name: String,

    /// Windows the statistics closed
    pub windows_completed: u64,

    pub simulated_time: Duration,

    pub final_sta_position: Vector,

    /// Throughput (Mbit/s) against station x
    pub throughput: Gnuplot2dDataset,

    /// Average transmit power (mW) against station x
    pub power: Gnuplot2dDataset,

    pub mac_stats: MacStats,
}

/// Link-layer counters of the AP
#[derive(Debug, Default, Clone)]
pub struct MacStats {
    /// Packets produced by the CBR source
    pub packets_generated: usize,

    /// Packets dropped because the queue was full
    pub queue_drops: usize,

    /// Data transmission attempts, retries included
    pub data_attempts: usize,

    /// Data frames acknowledged
    pub data_delivered: usize,

    /// Data frames given up after the retry limit
    pub retry_drops: usize,

    pub beacons_sent: usize,

    pub rts_sent: usize,

    pub power_changes: usize,

    pub rate_changes: usize,
}

impl SimResult {
    /// Print a summary of the simulation results
    pub fn print_summary(&self) {
        println!("\n╔════════════════════════════════════════════════════════╗");
        println!("║        Power Adaptation Distance Results               ║");
        println!("╚════════════════════════════════════════════════════════╝\n");

        println!("Configuration:");
        println!("  Seed: {:?}", self.seed_used);
        println!("  Manager: {}", self.manager);
        println!("  Simulated time: {:.1}s", self.simulated_time.as_secs_f64());
        println!("  Windows: {}", self.windows_completed);
        println!("  Final STA position: {}\n", self.final_sta_position);

        println!("Throughput:");
        if let Some((x, peak)) = peak(self.throughput.points()) {
            println!("  Peak: {:.2} Mbit/s at {} m", peak, x);
        }
        if let Some((x, _)) = self.throughput.points().iter().find(|(_, y)| *y == 0.0) {
            println!("  First silent window at {} m", x);
        }
        println!();

        println!("Average transmit power:");
        if let Some((x, peak)) = peak(self.power.points()) {
            println!("  Peak: {:.2} mW at {} m", peak, x);
        }
        println!();

        let mac = &self.mac_stats;
        println!("MAC Statistics:");
        println!("  Packets generated: {}", mac.packets_generated);
        println!("  Queue drops: {}", mac.queue_drops);
        println!("  Data attempts: {}", mac.data_attempts);
        println!("  Data delivered: {}", mac.data_delivered);
        println!("  Retry drops: {}", mac.retry_drops);
        println!("  Beacons: {}", mac.beacons_sent);
        println!("  RTS: {}", mac.rts_sent);
        println!("  Power changes: {}", mac.power_changes);
        println!("  Rate changes: {}", mac.rate_changes);
        println!();
    }

    /// Write `throughput-<label>.plt`, plus `power-<label>.plt` when the
    /// manager adapts power. Returns the files written.
    pub fn write_plots(&self, dir: &Path) -> Result<Vec<PathBuf>, ScenarioError> {
        let label = &self.output_file_name;
        let mut written = Vec::new();

        let mut plot = Gnuplot::new(format!("throughput-{}.eps", label), "Throughput");
        plot.set_terminal("post eps color enhanced");
        plot.set_legend("Distance [m]", "Throughput [Mbps]");
        plot.set_title("Throughput (AP to STA) vs time");
        plot.add_dataset(self.throughput.clone());
        let path = dir.join(format!("throughput-{}.plt", label));
        plot.write_to_file(&path)?;
        info!("wrote {}", path.display());
        written.push(path);

        if self.manager.adapts_power() {
            let mut plot = Gnuplot::new(format!("power-{}.eps", label), "Average Transmit Power");
            plot.set_terminal("post eps color enhanced");
            plot.set_legend("Time (seconds)", "Power (mW)");
            plot.set_title("Average transmit power (AP to STA) vs time");
            plot.add_dataset(self.power.clone());
            let path = dir.join(format!("power-{}.plt", label));
            plot.write_to_file(&path)?;
            info!("wrote {}", path.display());
            written.push(path);
        }

        Ok(written)
    }
}

fn peak(points: &[(f64, f64)]) -> Option<(f64, f64)> {
    points
        .iter()
        .copied()
        .fold(None, |best: Option<(f64, f64)>, p| match best {
            Some(b) if b.1 >= p.1 => Some(b),
            _ => Some(p),
        })
}
