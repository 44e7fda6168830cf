//! Configuration for the power adaptation distance experiment

use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use pa_rust::pa_interface::{DataRate, PowerDbm, Vector, REFERENCE_PACKET_SIZE};
use rand::rngs::StdRng;
use rand::SeedableRng;

use super::error::ScenarioError;

/// Remote station manager installed on the AP
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ManagerKind {
    /// Fixed rate, fixed (max) power
    Constant,
    /// Auto rate fallback, fixed (max) power
    Arf,
    /// Power-controlled auto rate fallback
    Parf,
}

impl ManagerKind {
    pub fn adapts_power(&self) -> bool {
        matches!(self, ManagerKind::Parf)
    }

    pub fn adapts_rate(&self) -> bool {
        matches!(self, ManagerKind::Arf | ManagerKind::Parf)
    }
}

impl fmt::Display for ManagerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ManagerKind::Constant => write!(f, "constant"),
            ManagerKind::Arf => write!(f, "arf"),
            ManagerKind::Parf => write!(f, "parf"),
        }
    }
}

/// Main configuration for a power/distance run
#[derive(Debug, Clone)]
pub struct PowerDistanceConfig {
    /// Station manager on the AP
    pub manager: ManagerKind,

    /// Frames above this size are preceded by an RTS
    pub rts_threshold: u32,

    /// Label for the plot files (`throughput-<label>.plt`, `power-<label>.plt`)
    pub output_file_name: String,

    pub ap_position: Vector,

    /// Starting point of the walking station
    pub sta_position: Vector,

    /// Number of distances to try
    pub steps: u32,

    /// Metres between two distances
    pub steps_size: f64,

    /// Time spent on each distance
    pub steps_time: Duration,

    /// Maximum tx power level (dBm)
    pub max_power: PowerDbm,

    /// Minimum tx power level (dBm)
    pub min_power: PowerDbm,

    /// Number of power levels between min and max, both included
    pub power_levels: u32,

    /// Random seed (None = generate random)
    pub seed: Option<[u8; 32]>,

    pub traffic: TrafficConfig,

    pub mac: MacConfig,

    pub link: LinkConfig,

    /// Write adaptation changes and window samples here as CSV
    pub event_log: Option<PathBuf>,
}

impl Default for PowerDistanceConfig {
    fn default() -> Self {
        Self {
            manager: ManagerKind::Parf,
            rts_threshold: 2346,
            output_file_name: "parf".to_string(),
            ap_position: Vector::new(0.0, 0.0, 0.0),
            sta_position: Vector::new(5.0, 0.0, 0.0),
            steps: 260,
            steps_size: 1.0,
            steps_time: Duration::from_secs(1),
            max_power: 20.0,
            min_power: 20.0,
            power_levels: 1,
            seed: None,
            traffic: TrafficConfig::default(),
            mac: MacConfig::default(),
            link: LinkConfig::default(),
            event_log: None,
        }
    }
}

impl PowerDistanceConfig {
    /// Get or generate seed
    pub fn resolve_seed(&self) -> [u8; 32] {
        self.seed.unwrap_or_else(|| {
            let mut temp_rng = StdRng::from_entropy();
            let mut seed = [0u8; 32];
            use rand::RngCore;
            temp_rng.fill_bytes(&mut seed);
            seed
        })
    }

    /// Whole run: the last window closes at `start + steps * steps_time`,
    /// the stop comes half a step later.
    pub fn simulation_time(&self) -> Result<Duration, ScenarioError> {
        self.steps_time
            .checked_mul(self.steps)
            .and_then(|walk| walk.checked_add(self.traffic.start))
            .and_then(|last_tick| last_tick.checked_add(self.steps_time / 2))
            .ok_or_else(|| {
                ScenarioError::Config(format!(
                    "{} steps of {:?} overflow the simulation clock",
                    self.steps, self.steps_time
                ))
            })
    }

    /// Power of every level, lowest first
    pub fn power_table(&self) -> Vec<PowerDbm> {
        if self.power_levels <= 1 {
            return vec![self.max_power];
        }
        let step = (self.max_power - self.min_power) / (self.power_levels - 1) as f64;
        (0..self.power_levels)
            .map(|level| self.min_power + step * level as f64)
            .collect()
    }

    pub fn validate(&self) -> Result<(), ScenarioError> {
        if self.steps_time.is_zero() {
            return Err(ScenarioError::Config("steps_time must be positive".into()));
        }
        if self.power_levels == 0 {
            return Err(ScenarioError::Config("power_levels must be at least 1".into()));
        }
        if self.min_power > self.max_power {
            return Err(ScenarioError::Config(format!(
                "min_power {} above max_power {}",
                self.min_power, self.max_power
            )));
        }
        if self.traffic.packet_size == 0 || self.traffic.data_rate.bps() == 0 {
            return Err(ScenarioError::Config(
                "traffic needs a packet size and a data rate".into(),
            ));
        }
        if self.mac.queue_limit == 0 {
            return Err(ScenarioError::Config("queue_limit must be at least 1".into()));
        }
        if self.output_file_name.is_empty() {
            return Err(ScenarioError::Config("output_file_name is empty".into()));
        }
        self.simulation_time()?;
        Ok(())
    }
}

/// Constant bit rate source on the AP
#[derive(Debug, Clone)]
pub struct TrafficConfig {
    /// Application payload per packet (bytes)
    pub packet_size: u32,

    /// Offered load
    pub data_rate: DataRate,

    /// Source and sink start time
    pub start: Duration,
}

impl Default for TrafficConfig {
    fn default() -> Self {
        Self {
            packet_size: REFERENCE_PACKET_SIZE,
            data_rate: DataRate::from_mbps(54),
            start: Duration::from_millis(500),
        }
    }
}

impl TrafficConfig {
    /// Gap between two packets of the source
    pub fn interval(&self) -> Duration {
        self.data_rate.transmit_time(self.packet_size)
    }
}

/// Link-layer behaviour of the AP
#[derive(Debug, Clone)]
pub struct MacConfig {
    /// Frames waiting for the medium before new ones are dropped
    pub queue_limit: usize,

    /// Retransmissions before a data frame is given up
    pub retry_limit: u32,

    pub beacon_interval: Duration,

    /// Rate used by the constant manager
    pub constant_rate: DataRate,
}

impl Default for MacConfig {
    fn default() -> Self {
        Self {
            queue_limit: 500,
            retry_limit: 7,
            beacon_interval: Duration::from_micros(102_400),
            constant_rate: DataRate::from_mbps(6),
        }
    }
}

/// Synthetic delivery model. Log-distance attenuation against a fixed noise
/// floor; only used to decide whether an attempt got through.
#[derive(Debug, Clone)]
pub struct LinkConfig {
    /// Loss at one metre (dB)
    pub reference_loss: f64,

    pub path_loss_exponent: f64,

    /// Thermal noise plus receiver noise figure (dBm)
    pub noise_floor: f64,

    /// Slope of the success curve around each mode's SNR threshold
    pub steepness: f64,
}

impl Default for LinkConfig {
    fn default() -> Self {
        Self {
            reference_loss: 46.6777,
            path_loss_exponent: 3.0,
            noise_floor: -94.0,
            steepness: 1.5,
        }
    }
}
