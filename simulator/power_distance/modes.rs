//! 802.11g transmission modes

use std::time::Duration;

use pa_rust::pa_interface::{ChannelWidth, DataRate, TransmissionMode, DEFAULT_CHANNEL_WIDTH};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModulationClass {
    Dsss,
    HrDsss,
    ErpOfdm,
}

// long preamble + PLCP header
const DSSS_PREAMBLE_US: u64 = 192;
const OFDM_PREAMBLE_US: u64 = 16;
const OFDM_SIGNAL_US: u64 = 4;
const OFDM_SYMBOL_US: u64 = 4;
const ERP_SIGNAL_EXTENSION_US: u64 = 6;
// SERVICE field + tail bits
const OFDM_SERVICE_TAIL_BITS: u64 = 16 + 6;

#[derive(Debug, Clone)]
pub struct WifiMode {
    pub name: &'static str,
    pub class: ModulationClass,
    /// Rate on a 20 MHz channel
    pub rate: DataRate,
    /// SNR (dB) at which half the frames of this mode get through
    pub min_snr: f64,
}

impl WifiMode {
    const fn new(name: &'static str, class: ModulationClass, bps: u64, min_snr: f64) -> Self {
        Self {
            name,
            class,
            rate: DataRate(bps),
            min_snr,
        }
    }

    fn width_factor(channel_width: ChannelWidth) -> u64 {
        (channel_width.max(5) / 5) as u64
    }
}

impl TransmissionMode for WifiMode {
    fn name(&self) -> &str {
        self.name
    }

    fn data_rate(&self, channel_width: ChannelWidth) -> DataRate {
        match self.class {
            ModulationClass::Dsss | ModulationClass::HrDsss => self.rate,
            // OFDM rates scale with the channel width (5/10/20 MHz)
            ModulationClass::ErpOfdm => {
                DataRate(self.rate.bps() * Self::width_factor(channel_width) / 4)
            }
        }
    }

    fn tx_duration(&self, packet_size: u32, channel_width: ChannelWidth) -> Duration {
        let bits = packet_size as u64 * 8;
        match self.class {
            ModulationClass::Dsss | ModulationClass::HrDsss => {
                let payload_us = (bits * 1_000_000).div_ceil(self.rate.bps());
                Duration::from_micros(DSSS_PREAMBLE_US + payload_us)
            }
            ModulationClass::ErpOfdm => {
                // narrower channels stretch every OFDM duration
                let stretch = 4 / Self::width_factor(channel_width).min(4);
                let bits_per_symbol = self.rate.bps() * OFDM_SYMBOL_US / 1_000_000;
                let symbols = (OFDM_SERVICE_TAIL_BITS + bits).div_ceil(bits_per_symbol);
                let us = (OFDM_PREAMBLE_US + OFDM_SIGNAL_US + symbols * OFDM_SYMBOL_US) * stretch
                    + ERP_SIGNAL_EXTENSION_US;
                Duration::from_micros(us)
            }
        }
    }
}

/// Modes an 802.11g PHY offers, slowest first. The first one is the PHY default.
pub fn erp_mode_list() -> Vec<WifiMode> {
    use ModulationClass::*;
    vec![
        WifiMode::new("DsssRate1Mbps", Dsss, 1_000_000, -1.0),
        WifiMode::new("DsssRate2Mbps", Dsss, 2_000_000, 2.0),
        WifiMode::new("DsssRate5_5Mbps", HrDsss, 5_500_000, 5.0),
        WifiMode::new("ErpOfdmRate6Mbps", ErpOfdm, 6_000_000, 5.5),
        WifiMode::new("ErpOfdmRate9Mbps", ErpOfdm, 9_000_000, 7.0),
        WifiMode::new("DsssRate11Mbps", HrDsss, 11_000_000, 8.0),
        WifiMode::new("ErpOfdmRate12Mbps", ErpOfdm, 12_000_000, 9.0),
        WifiMode::new("ErpOfdmRate18Mbps", ErpOfdm, 18_000_000, 11.0),
        WifiMode::new("ErpOfdmRate24Mbps", ErpOfdm, 24_000_000, 14.0),
        WifiMode::new("ErpOfdmRate36Mbps", ErpOfdm, 36_000_000, 18.0),
        WifiMode::new("ErpOfdmRate48Mbps", ErpOfdm, 48_000_000, 22.0),
        WifiMode::new("ErpOfdmRate54Mbps", ErpOfdm, 54_000_000, 24.0),
    ]
}

/// Index of the mode carrying `rate` on the default channel width
pub fn mode_index(modes: &[WifiMode], rate: DataRate) -> Option<usize> {
    modes
        .iter()
        .position(|mode| mode.data_rate(DEFAULT_CHANNEL_WIDTH) == rate)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mode(name: &str) -> WifiMode {
        erp_mode_list()
            .into_iter()
            .find(|m| m.name == name)
            .unwrap()
    }

    #[test]
    fn test_list_sorted_by_rate() {
        let modes = erp_mode_list();
        assert_eq!(modes.len(), 12);
        let rates: Vec<_> = modes.iter().map(|m| m.data_rate(20)).collect();
        assert!(rates.windows(2).all(|w| w[0] < w[1]));
        assert_eq!(modes[0].name, "DsssRate1Mbps");
    }

    #[test]
    fn test_dsss_duration() {
        // 192 us + 1500 * 8 us
        let duration = mode("DsssRate1Mbps").tx_duration(1500, 20);
        assert_eq!(duration, Duration::from_micros(12_192));

        // 12000 bits / 5.5 Mb/s = 2181.8 us, rounded up
        let duration = mode("DsssRate5_5Mbps").tx_duration(1500, 20);
        assert_eq!(duration, Duration::from_micros(192 + 2182));
    }

    #[test]
    fn test_ofdm_duration() {
        // 54 Mb/s: 216 bits per symbol, ceil(12022 / 216) = 56 symbols
        let duration = mode("ErpOfdmRate54Mbps").tx_duration(1500, 20);
        assert_eq!(duration, Duration::from_micros(16 + 4 + 56 * 4 + 6));

        // 6 Mb/s: 24 bits per symbol, ceil(12022 / 24) = 501 symbols
        let duration = mode("ErpOfdmRate6Mbps").tx_duration(1500, 20);
        assert_eq!(duration, Duration::from_micros(16 + 4 + 501 * 4 + 6));
    }

    #[test]
    fn test_channel_width_scaling() {
        let ofdm = mode("ErpOfdmRate54Mbps");
        assert_eq!(ofdm.data_rate(10), DataRate::from_mbps(27));
        assert!(ofdm.tx_duration(1500, 10) > ofdm.tx_duration(1500, 20));

        let dsss = mode("DsssRate11Mbps");
        assert_eq!(dsss.data_rate(10), DataRate::from_mbps(11));
    }

    #[test]
    fn test_mode_index() {
        let modes = erp_mode_list();
        assert_eq!(mode_index(&modes, DataRate::from_mbps(1)), Some(0));
        assert_eq!(mode_index(&modes, DataRate::from_mbps(54)), Some(11));
        assert_eq!(mode_index(&modes, DataRate::from_mbps(7)), None);
    }
}
