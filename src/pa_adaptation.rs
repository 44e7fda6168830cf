// current tx power and data rate per destination

use hashbrown::HashMap;
use log::trace;

use crate::pa_error::StatsError;
use crate::pa_interface::{DataRate, MacAddress, PowerDbm};

pub struct AdaptationState {
    power: HashMap<MacAddress, PowerDbm>,
    rate: HashMap<MacAddress, DataRate>,
}

impl AdaptationState {
    /// Seed every known station and the broadcast address with the PHY defaults
    pub fn new(stations: &[MacAddress], max_power: PowerDbm, default_rate: DataRate) -> Self {
        let mut power = HashMap::with_capacity(stations.len() + 1);
        let mut rate = HashMap::with_capacity(stations.len() + 1);
        for station in stations {
            power.insert(*station, max_power);
            rate.insert(*station, default_rate);
        }
        power.insert(MacAddress::BROADCAST, max_power);
        rate.insert(MacAddress::BROADCAST, default_rate);

        Self { power, rate }
    }

    pub fn set_power(&mut self, dest: MacAddress, new_power: PowerDbm) {
        trace!("{} power -> {} dBm", dest, new_power);
        self.power.insert(dest, new_power);
    }

    pub fn set_rate(&mut self, dest: MacAddress, new_rate: DataRate) {
        trace!("{} rate -> {}", dest, new_rate);
        self.rate.insert(dest, new_rate);
    }

    pub fn power(&self, dest: &MacAddress) -> Result<PowerDbm, StatsError> {
        Self::resolve(&self.power, dest)
    }

    pub fn rate(&self, dest: &MacAddress) -> Result<DataRate, StatsError> {
        Self::resolve(&self.rate, dest)
    }

    pub fn num_destinations(&self) -> usize {
        self.rate.len()
    }

    // broadcast is always present: it is seeded in new() and never removed
    fn resolve<V: Copy>(table: &HashMap<MacAddress, V>, dest: &MacAddress) -> Result<V, StatsError> {
        table
            .get(dest)
            .copied()
            .ok_or(StatsError::UnknownDestination(*dest))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn station() -> MacAddress {
        MacAddress::from_index(1)
    }

    #[test]
    fn test_initial_values() {
        let state = AdaptationState::new(&[station()], 20.0, DataRate::from_mbps(1));

        assert_eq!(state.power(&station()).unwrap(), 20.0);
        assert_eq!(state.rate(&station()).unwrap(), DataRate::from_mbps(1));
        assert_eq!(state.power(&MacAddress::BROADCAST).unwrap(), 20.0);
        assert_eq!(state.rate(&MacAddress::BROADCAST).unwrap(), DataRate::from_mbps(1));
        assert_eq!(state.num_destinations(), 2);
    }

    #[test]
    fn test_last_write_wins() {
        let mut state = AdaptationState::new(&[station()], 20.0, DataRate::from_mbps(1));

        state.set_power(station(), 17.0);
        state.set_power(station(), 11.0);
        state.set_rate(station(), DataRate::from_mbps(24));
        state.set_rate(station(), DataRate::from_mbps(54));

        assert_eq!(state.power(&station()).unwrap(), 11.0);
        assert_eq!(state.rate(&station()).unwrap(), DataRate::from_mbps(54));

        // other destinations untouched
        assert_eq!(state.power(&MacAddress::BROADCAST).unwrap(), 20.0);
    }

    #[test]
    fn test_unknown_destination_is_fault() {
        let state = AdaptationState::new(&[station()], 20.0, DataRate::from_mbps(1));
        let stranger = MacAddress::from_index(99);

        assert_eq!(
            state.power(&stranger),
            Err(StatsError::UnknownDestination(stranger))
        );
        assert_eq!(
            state.rate(&stranger),
            Err(StatsError::UnknownDestination(stranger))
        );
    }

    #[test]
    fn test_notification_makes_destination_known() {
        let mut state = AdaptationState::new(&[], 20.0, DataRate::from_mbps(1));
        let late = MacAddress::from_index(7);

        state.set_rate(late, DataRate::from_mbps(6));
        assert_eq!(state.rate(&late).unwrap(), DataRate::from_mbps(6));
        // power was never reported for it
        assert!(state.power(&late).is_err());
    }
}
