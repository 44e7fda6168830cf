//! Remote station manager for the AP
//!
//! Chooses rate and tx power per destination and reports every change as a
//! `StatsEvent`, the way a station manager's change notifications feed the
//! statistics. One implementation covers the three managers: PARF adapts
//! both, ARF only the rate, constant neither.

use hashbrown::HashMap;
use log::debug;

use pa_rust::pa_interface::{DataRate, MacAddress, PowerDbm, StatsEvent};

use super::config::ManagerKind;

/// Consecutive successes before trying a faster rate or a lower power
pub const SUCCESS_THRESHOLD: u32 = 10;
/// Attempts before trying a faster rate or a lower power regardless of failures
pub const ATTEMPT_THRESHOLD: u32 = 15;
/// Consecutive failures before raising power or falling back a rate
pub const FAILURE_THRESHOLD: u32 = 2;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TxVector {
    pub rate_index: usize,
    pub rate: DataRate,
    pub power: PowerDbm,
}

#[derive(Debug, Clone, Default)]
struct StationState {
    rate_index: usize,
    power_level: usize,
    successes: u32,
    failures: u32,
    attempts: u32,
    recovering_rate: bool,
    recovering_power: bool,
}

pub struct StationManager {
    kind: ManagerKind,
    /// Ascending
    rates: Vec<DataRate>,
    /// Ascending, last is max power
    power_levels: Vec<PowerDbm>,
    constant_index: usize,
    stations: HashMap<MacAddress, StationState>,
}

impl StationManager {
    pub fn new(
        kind: ManagerKind,
        rates: Vec<DataRate>,
        power_levels: Vec<PowerDbm>,
        constant_index: usize,
    ) -> Self {
        Self {
            kind,
            rates,
            power_levels,
            constant_index,
            stations: HashMap::new(),
        }
    }

    pub fn kind(&self) -> ManagerKind {
        self.kind
    }

    /// Start tracking `dest`. Stations start at the lowest rate and the highest
    /// power; if the manager starts elsewhere the returned changes say so.
    pub fn associate(&mut self, dest: MacAddress) -> Vec<StatsEvent> {
        let initial = StationState {
            rate_index: 0,
            power_level: self.max_level(),
            ..Default::default()
        };
        let before = self.vector_of(&initial);

        let mut state = initial;
        if self.kind == ManagerKind::Constant {
            state.rate_index = self.constant_index.min(self.rates.len() - 1);
        }
        let after = self.vector_of(&state);
        self.stations.insert(dest, state);
        changes(dest, &before, &after)
    }

    pub fn tx_vector(&self, dest: &MacAddress) -> Option<TxVector> {
        self.stations.get(dest).map(|state| self.vector_of(state))
    }

    pub fn report_data_ok(&mut self, dest: MacAddress) -> Vec<StatsEvent> {
        let kind = self.kind;
        let max_rate = self.rates.len() - 1;
        let Some(before) = self.tx_vector(&dest) else {
            return Vec::new();
        };
        let Some(state) = self.stations.get_mut(&dest) else {
            return Vec::new();
        };

        state.attempts += 1;
        state.successes += 1;
        state.failures = 0;
        state.recovering_rate = false;
        state.recovering_power = false;

        let threshold = state.successes >= SUCCESS_THRESHOLD || state.attempts >= ATTEMPT_THRESHOLD;
        if threshold && kind.adapts_rate() && state.rate_index < max_rate {
            state.rate_index += 1;
            state.recovering_rate = true;
            state.successes = 0;
            state.attempts = 0;
        } else if threshold && kind.adapts_power() && state.power_level > 0 {
            state.power_level -= 1;
            state.recovering_power = true;
            state.successes = 0;
            state.attempts = 0;
        }

        let after = self.vector_of(&self.stations[&dest]);
        changes(dest, &before, &after)
    }

    pub fn report_data_failed(&mut self, dest: MacAddress) -> Vec<StatsEvent> {
        let kind = self.kind;
        let max_level = self.max_level();
        let Some(before) = self.tx_vector(&dest) else {
            return Vec::new();
        };
        let Some(state) = self.stations.get_mut(&dest) else {
            return Vec::new();
        };

        state.attempts += 1;
        state.failures += 1;
        state.successes = 0;

        if state.recovering_rate {
            // the probe at the faster rate failed straight away: go back
            state.rate_index -= 1;
            state.recovering_rate = false;
            state.failures = 0;
        } else if state.recovering_power {
            state.power_level += 1;
            state.recovering_power = false;
            state.failures = 0;
        } else if state.failures >= FAILURE_THRESHOLD {
            if kind.adapts_power() && state.power_level < max_level {
                state.power_level += 1;
            } else if kind.adapts_rate() && state.rate_index > 0 {
                state.rate_index -= 1;
            }
            state.failures = 0;
        }

        let after = self.vector_of(&self.stations[&dest]);
        changes(dest, &before, &after)
    }

    /// Frame given up after the retry limit
    pub fn report_final_failed(&mut self, dest: MacAddress) {
        if let Some(state) = self.stations.get_mut(&dest) {
            debug!("{} dropped a frame at rate index {}", dest, state.rate_index);
            state.attempts = 0;
            state.successes = 0;
        }
    }

    fn max_level(&self) -> usize {
        self.power_levels.len() - 1
    }

    fn vector_of(&self, state: &StationState) -> TxVector {
        TxVector {
            rate_index: state.rate_index,
            rate: self.rates[state.rate_index],
            power: self.power_levels[state.power_level],
        }
    }
}

fn changes(dest: MacAddress, before: &TxVector, after: &TxVector) -> Vec<StatsEvent> {
    let mut out = Vec::new();
    if before.power != after.power {
        out.push(StatsEvent::PowerChange {
            dest,
            old_power: before.power,
            new_power: after.power,
        });
    }
    if before.rate != after.rate {
        out.push(StatsEvent::RateChange {
            dest,
            old_rate: before.rate,
            new_rate: after.rate,
        });
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sta() -> MacAddress {
        MacAddress::from_index(2)
    }

    fn rates() -> Vec<DataRate> {
        vec![
            DataRate::from_mbps(1),
            DataRate::from_mbps(6),
            DataRate::from_mbps(54),
        ]
    }

    fn manager(kind: ManagerKind) -> StationManager {
        StationManager::new(kind, rates(), vec![0.0, 10.0, 17.0], 1)
    }

    #[test]
    fn test_adaptive_starts_at_defaults() {
        let mut parf = manager(ManagerKind::Parf);
        assert!(parf.associate(sta()).is_empty());
        let vector = parf.tx_vector(&sta()).unwrap();
        assert_eq!(vector.rate, DataRate::from_mbps(1));
        assert_eq!(vector.power, 17.0);
    }

    #[test]
    fn test_constant_announces_its_rate() {
        let mut constant = manager(ManagerKind::Constant);
        let events = constant.associate(sta());
        assert_eq!(
            events,
            vec![StatsEvent::RateChange {
                dest: sta(),
                old_rate: DataRate::from_mbps(1),
                new_rate: DataRate::from_mbps(6),
            }]
        );

        for _ in 0..50 {
            assert!(constant.report_data_ok(sta()).is_empty());
        }
        for _ in 0..50 {
            assert!(constant.report_data_failed(sta()).is_empty());
        }
    }

    #[test]
    fn test_parf_raises_rate_then_lowers_power() {
        let mut parf = manager(ManagerKind::Parf);
        parf.associate(sta());

        let mut events = Vec::new();
        for _ in 0..(SUCCESS_THRESHOLD * 4) {
            events.extend(parf.report_data_ok(sta()));
        }

        assert_eq!(
            events,
            vec![
                StatsEvent::RateChange {
                    dest: sta(),
                    old_rate: DataRate::from_mbps(1),
                    new_rate: DataRate::from_mbps(6),
                },
                StatsEvent::RateChange {
                    dest: sta(),
                    old_rate: DataRate::from_mbps(6),
                    new_rate: DataRate::from_mbps(54),
                },
                StatsEvent::PowerChange {
                    dest: sta(),
                    old_power: 17.0,
                    new_power: 10.0,
                },
                StatsEvent::PowerChange {
                    dest: sta(),
                    old_power: 10.0,
                    new_power: 0.0,
                },
            ]
        );
    }

    #[test]
    fn test_failed_probe_reverts() {
        let mut arf = manager(ManagerKind::Arf);
        arf.associate(sta());
        for _ in 0..SUCCESS_THRESHOLD {
            arf.report_data_ok(sta());
        }
        assert_eq!(arf.tx_vector(&sta()).unwrap().rate, DataRate::from_mbps(6));

        let events = arf.report_data_failed(sta());
        assert_eq!(
            events,
            vec![StatsEvent::RateChange {
                dest: sta(),
                old_rate: DataRate::from_mbps(6),
                new_rate: DataRate::from_mbps(1),
            }]
        );
    }

    #[test]
    fn test_parf_failures_raise_power_first() {
        let mut parf = manager(ManagerKind::Parf);
        parf.associate(sta());
        // climb to 54 Mb/s and down to the lowest power
        for _ in 0..(SUCCESS_THRESHOLD * 4) {
            parf.report_data_ok(sta());
        }
        assert_eq!(parf.tx_vector(&sta()).unwrap().power, 0.0);

        // the failure right after the power step undoes it
        parf.report_data_failed(sta());
        assert_eq!(parf.tx_vector(&sta()).unwrap().power, 10.0);

        // then every second failure: power up, then rate down
        parf.report_data_failed(sta());
        let events = parf.report_data_failed(sta());
        assert_eq!(events.len(), 1);
        assert_eq!(parf.tx_vector(&sta()).unwrap().power, 17.0);

        parf.report_data_failed(sta());
        parf.report_data_failed(sta());
        assert_eq!(parf.tx_vector(&sta()).unwrap().rate, DataRate::from_mbps(6));
    }

    #[test]
    fn test_unknown_station_ignored() {
        let mut parf = manager(ManagerKind::Parf);
        assert!(parf.tx_vector(&sta()).is_none());
        assert!(parf.report_data_ok(sta()).is_empty());
        assert!(parf.report_data_failed(sta()).is_empty());
    }
}
