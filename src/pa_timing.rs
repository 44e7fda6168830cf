//! Airtime lookup per data rate.

use std::time::Duration;

use indexmap::IndexMap;
use log::debug;

use crate::pa_error::StatsError;
use crate::pa_interface::{ChannelWidth, DataRate, TransmissionMode};

/// Duration of a reference-sized frame for every rate the PHY supports.
///
/// Built once from the mode list and never modified afterwards. Entries keep
/// the order of the mode list; when two modes share a rate the first one wins.
#[derive(Debug, Clone)]
pub struct TimingTable {
    entries: IndexMap<DataRate, Duration>,
    packet_size: u32,
}

impl TimingTable {
    pub fn build<M: TransmissionMode>(
        modes: &[M],
        packet_size: u32,
        channel_width: ChannelWidth,
    ) -> Result<Self, StatsError> {
        if modes.is_empty() {
            return Err(StatsError::InvalidConfig(
                "transmission mode list is empty".to_string(),
            ));
        }

        let mut entries = IndexMap::with_capacity(modes.len());
        for mode in modes {
            let rate = mode.data_rate(channel_width);
            let duration = mode.tx_duration(packet_size, channel_width);
            debug!("{} {} {}", mode.name(), duration.as_secs_f64(), rate);
            entries.entry(rate).or_insert(duration);
        }

        Ok(Self {
            entries,
            packet_size,
        })
    }

    /// Airtime for `rate`. A miss means the adaptation layer picked a rate
    /// the mode list never offered.
    pub fn lookup(&self, rate: DataRate) -> Result<Duration, StatsError> {
        self.entries
            .get(&rate)
            .copied()
            .ok_or(StatsError::UnknownRate(rate))
    }

    pub fn packet_size(&self) -> u32 {
        self.packet_size
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (DataRate, Duration)> + '_ {
        self.entries.iter().map(|(rate, duration)| (*rate, *duration))
    }
}
