//! Window sampling and station stepping.

use std::time::Duration;

use log::info;

use crate::pa_accumulator::{WindowAccumulator, WindowSample};
use crate::pa_error::StatsError;
use crate::pa_interface::Mobility;

/// Traffic starts this long after the experiment begins; the first window
/// closes one window length later
pub const DEFAULT_INITIAL_OFFSET: Duration = Duration::from_millis(500);

/// Append-only (x, value) series
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SampleSeries {
    points: Vec<(f64, f64)>,
}

impl SampleSeries {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, x: f64, value: f64) {
        self.points.push((x, value));
    }

    pub fn points(&self) -> &[(f64, f64)] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

#[derive(Debug, Clone)]
pub struct SamplingConfig {
    /// Window length (and tick period)
    pub window: Duration,

    /// Metres the tracked node moves along x after every window
    pub step_size: f64,

    /// Delay before the first window starts
    pub initial_offset: Duration,
}

impl Default for SamplingConfig {
    fn default() -> Self {
        Self {
            window: Duration::from_secs(1),
            step_size: 1.0,
            initial_offset: DEFAULT_INITIAL_OFFSET,
        }
    }
}

impl SamplingConfig {
    pub fn validate(&self) -> Result<(), StatsError> {
        if self.window.is_zero() {
            return Err(StatsError::InvalidConfig(
                "sampling window must be positive".to_string(),
            ));
        }
        if !self.step_size.is_finite() || self.step_size < 0.0 {
            return Err(StatsError::InvalidConfig(format!(
                "step size must be a finite non-negative distance, got {}",
                self.step_size
            )));
        }
        Ok(())
    }

    /// When the first window closes, relative to experiment start
    pub fn first_tick(&self) -> Duration {
        self.initial_offset + self.window
    }
}

/// Snapshots the accumulator once per window, then moves the tracked node
pub struct SamplingController {
    config: SamplingConfig,
    throughput: SampleSeries,
    power: SampleSeries,
    windows_completed: u64,
}

impl SamplingController {
    pub fn new(config: SamplingConfig) -> Result<Self, StatsError> {
        config.validate()?;
        Ok(Self {
            config,
            throughput: SampleSeries::new(),
            power: SampleSeries::new(),
            windows_completed: 0,
        })
    }

    /// Close the current window at simulation time `now`.
    ///
    /// The sample is recorded at the node's position during the window, the
    /// accumulator starts over and the node steps forward.
    pub fn sample(
        &mut self,
        now: Duration,
        accumulator: &mut WindowAccumulator,
        node: &mut dyn Mobility,
    ) -> (f64, WindowSample) {
        let mut position = node.position();
        let sample = accumulator.drain(self.config.window);
        self.throughput.push(position.x, sample.throughput_mbps);
        self.power.push(position.x, sample.average_power_mw);
        let x = position.x;

        position.x += self.config.step_size;
        node.set_position(position);
        self.windows_completed += 1;

        info!(
            "At time {} sec; setting new position to {}",
            now.as_secs_f64(),
            position
        );
        (x, sample)
    }

    pub fn config(&self) -> &SamplingConfig {
        &self.config
    }

    pub fn windows_completed(&self) -> u64 {
        self.windows_completed
    }

    pub fn throughput(&self) -> &SampleSeries {
        &self.throughput
    }

    pub fn power(&self) -> &SampleSeries {
        &self.power
    }
}
