//! Per-window byte and energy counters.

use std::time::Duration;

use crate::pa_adaptation::AdaptationState;
use crate::pa_error::StatsError;
use crate::pa_interface::{FrameKind, TxFrame};
use crate::pa_timing::TimingTable;

/// Counters for the current sampling window. Receive-side bytes and
/// transmit-side energy are counted independently and are not expected to
/// reconcile (losses, retries and control traffic).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WindowAccumulator {
    bytes_total: u64,
    /// Linear-domain energy in mW·s
    total_energy: f64,
    /// Data airtime in seconds
    total_time: f64,
}

/// Snapshot of one finished window
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WindowSample {
    pub throughput_mbps: f64,
    pub average_power_mw: f64,
    pub airtime: f64,
}

/// dBm to mW
pub fn dbm_to_mw(dbm: f64) -> f64 {
    10f64.powf(dbm / 10.0)
}

impl WindowAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Account one PHY transmission. Only data frames count; the rate and
    /// power in force for the frame's destination decide its energy.
    ///
    /// Returns whether the frame was counted.
    pub fn record_tx(
        &mut self,
        frame: &TxFrame,
        state: &AdaptationState,
        timing: &TimingTable,
    ) -> Result<bool, StatsError> {
        if frame.kind != FrameKind::Data {
            return Ok(false);
        }

        let rate = state.rate(&frame.dest)?;
        let power = state.power(&frame.dest)?;
        let duration = timing.lookup(rate)?.as_secs_f64();

        self.total_energy += dbm_to_mw(power) * duration;
        self.total_time += duration;
        Ok(true)
    }

    pub fn record_rx(&mut self, size: u32) {
        self.bytes_total += size as u64;
    }

    /// Compute the window's throughput and average power, then start a new window
    pub fn drain(&mut self, window: Duration) -> WindowSample {
        let seconds = window.as_secs_f64();
        let sample = WindowSample {
            throughput_mbps: (self.bytes_total as f64 * 8.0) / (1_000_000.0 * seconds),
            average_power_mw: self.total_energy / seconds,
            airtime: self.total_time,
        };
        self.reset();
        sample
    }

    pub fn reset(&mut self) {
        self.bytes_total = 0;
        self.total_energy = 0.0;
        self.total_time = 0.0;
    }

    pub fn bytes_total(&self) -> u64 {
        self.bytes_total
    }

    pub fn total_energy(&self) -> f64 {
        self.total_energy
    }

    pub fn total_time(&self) -> f64 {
        self.total_time
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pa_interface::{DataRate, MacAddress};
    use crate::pa_timing::tests::FixedMode;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    fn station() -> MacAddress {
        MacAddress::from_index(1)
    }

    fn one_ms_table() -> TimingTable {
        // 1500 bytes at 12 Mb/s with no overhead = 1 ms
        let modes = vec![FixedMode {
            name: "Rate12",
            rate: DataRate::from_mbps(12),
            overhead: Duration::ZERO,
        }];
        TimingTable::build(&modes, 1500, 20).unwrap()
    }

    fn data_to(dest: MacAddress) -> TxFrame {
        TxFrame {
            dest,
            kind: FrameKind::Data,
            size: 1500,
        }
    }

    #[test]
    fn test_energy_two_transmissions_at_20dbm() {
        let timing = one_ms_table();
        let state = AdaptationState::new(&[station()], 20.0, DataRate::from_mbps(12));
        let mut acc = WindowAccumulator::new();

        assert!(acc.record_tx(&data_to(station()), &state, &timing).unwrap());
        assert!(acc.record_tx(&data_to(station()), &state, &timing).unwrap());

        // 100 mW * 1 ms * 2
        assert!(approx(acc.total_energy(), 0.2));
        assert!(approx(acc.total_time(), 0.002));

        let sample = acc.drain(Duration::from_secs(1));
        assert!(approx(sample.average_power_mw, 0.2));
        assert!(approx(sample.airtime, 0.002));
    }

    #[test]
    fn test_throughput_example() {
        let mut acc = WindowAccumulator::new();
        acc.record_rx(187_000);
        acc.record_rx(500);

        let sample = acc.drain(Duration::from_secs(1));
        assert!(approx(sample.throughput_mbps, 1.5));
    }

    #[test]
    fn test_throughput_scales_with_window() {
        let mut acc = WindowAccumulator::new();
        acc.record_rx(250_000);

        let sample = acc.drain(Duration::from_secs(2));
        assert!(approx(sample.throughput_mbps, 1.0));
    }

    #[test]
    fn test_empty_window_is_zero() {
        let mut acc = WindowAccumulator::new();
        let sample = acc.drain(Duration::from_secs(1));
        assert_eq!(sample.throughput_mbps, 0.0);
        assert_eq!(sample.average_power_mw, 0.0);
    }

    #[test]
    fn test_drain_resets() {
        let timing = one_ms_table();
        let state = AdaptationState::new(&[station()], 0.0, DataRate::from_mbps(12));
        let mut acc = WindowAccumulator::new();
        acc.record_rx(1000);
        acc.record_tx(&data_to(station()), &state, &timing).unwrap();

        acc.drain(Duration::from_secs(1));
        assert_eq!(acc, WindowAccumulator::default());
    }

    #[test]
    fn test_control_and_management_ignored() {
        let timing = one_ms_table();
        let state = AdaptationState::new(&[station()], 20.0, DataRate::from_mbps(12));
        let mut acc = WindowAccumulator::new();

        for kind in [FrameKind::Control, FrameKind::Management] {
            let frame = TxFrame {
                dest: station(),
                kind,
                size: 14,
            };
            assert!(!acc.record_tx(&frame, &state, &timing).unwrap());
        }
        assert_eq!(acc.total_energy(), 0.0);

        // ignored even when the destination is unknown
        let frame = TxFrame {
            dest: MacAddress::from_index(42),
            kind: FrameKind::Management,
            size: 14,
        };
        assert!(!acc.record_tx(&frame, &state, &timing).unwrap());
    }

    #[test]
    fn test_broadcast_uses_defaults() {
        let timing = one_ms_table();
        let state = AdaptationState::new(&[], 10.0, DataRate::from_mbps(12));
        let mut acc = WindowAccumulator::new();

        acc.record_tx(&data_to(MacAddress::BROADCAST), &state, &timing)
            .unwrap();
        // 10 mW * 1 ms
        assert!(approx(acc.total_energy(), 0.01));
    }

    #[test]
    fn test_unknown_destination_aborts() {
        let timing = one_ms_table();
        let state = AdaptationState::new(&[station()], 20.0, DataRate::from_mbps(12));
        let mut acc = WindowAccumulator::new();
        let stranger = MacAddress::from_index(9);

        let result = acc.record_tx(&data_to(stranger), &state, &timing);
        assert_eq!(result, Err(StatsError::UnknownDestination(stranger)));
        assert_eq!(acc.total_energy(), 0.0);
    }

    #[test]
    fn test_unknown_rate_aborts() {
        let timing = one_ms_table();
        let mut state = AdaptationState::new(&[station()], 20.0, DataRate::from_mbps(12));
        state.set_rate(station(), DataRate::from_mbps(54));
        let mut acc = WindowAccumulator::new();

        let result = acc.record_tx(&data_to(station()), &state, &timing);
        assert_eq!(result, Err(StatsError::UnknownRate(DataRate::from_mbps(54))));
    }

    #[test]
    fn test_dbm_conversion() {
        assert!(approx(dbm_to_mw(0.0), 1.0));
        assert!(approx(dbm_to_mw(20.0), 100.0));
        assert!(approx(dbm_to_mw(-10.0), 0.1));
    }
}
