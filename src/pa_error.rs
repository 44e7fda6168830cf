use thiserror::Error;

use crate::pa_interface::{DataRate, MacAddress};

/// Structural faults of the statistics setup. None of these are transient:
/// each one means the experiment was wired inconsistently and the run aborts.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum StatsError {
    /// A rate was used that the transmission-mode list never offered
    #[error("data rate {0} is not in the timing table")]
    UnknownRate(DataRate),

    /// A non-broadcast destination the adaptation tracker never observed
    #[error("destination {0} has no adaptation state")]
    UnknownDestination(MacAddress),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}
