use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use crate::pa_error::StatsError;

/// Channel width in MHz
pub type ChannelWidth = u16;

/// Transmit power in dBm
pub type PowerDbm = f64;

/// Reference packet size used to build the timing table (bytes)
pub const REFERENCE_PACKET_SIZE: u32 = 1500;

pub const DEFAULT_CHANNEL_WIDTH: ChannelWidth = 20;

// ============================================================================
// Link-layer addressing
// ============================================================================

/// 48-bit link-layer address of a peer station
#[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct MacAddress(pub [u8; 6]);

impl MacAddress {
    pub const BROADCAST: MacAddress = MacAddress([0xff; 6]);

    /// Address with the last two bytes taken from `index`, handy for numbering stations
    pub fn from_index(index: u16) -> Self {
        let [hi, lo] = index.to_be_bytes();
        MacAddress([0x00, 0x00, 0x00, 0x00, hi, lo])
    }

    pub fn is_broadcast(&self) -> bool {
        *self == Self::BROADCAST
    }
}

impl fmt::Display for MacAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let b = self.0;
        write!(
            f,
            "{:02x}:{:02x}:{:02x}:{:02x}:{:02x}:{:02x}",
            b[0], b[1], b[2], b[3], b[4], b[5]
        )
    }
}

impl fmt::Debug for MacAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "MacAddress({})", self)
    }
}

impl FromStr for MacAddress {
    type Err = StatsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut bytes = [0u8; 6];
        let mut parts = s.split(':');
        for byte in bytes.iter_mut() {
            let part = parts
                .next()
                .ok_or_else(|| StatsError::InvalidConfig(format!("short mac address '{}'", s)))?;
            *byte = u8::from_str_radix(part, 16)
                .map_err(|_| StatsError::InvalidConfig(format!("bad mac address '{}'", s)))?;
        }
        if parts.next().is_some() {
            return Err(StatsError::InvalidConfig(format!(
                "long mac address '{}'",
                s
            )));
        }
        Ok(MacAddress(bytes))
    }
}

// ============================================================================
// Data rates
// ============================================================================

/// Bitrate in bits per second.
///
/// Kept as an integer so that rates reported by the adaptation layer compare
/// exactly against the rates the timing table was built from.
#[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Debug, Default)]
pub struct DataRate(pub u64);

impl DataRate {
    pub fn from_kbps(kbps: u64) -> Self {
        DataRate(kbps * 1_000)
    }

    pub fn from_mbps(mbps: u64) -> Self {
        DataRate(mbps * 1_000_000)
    }

    pub fn bps(&self) -> u64 {
        self.0
    }

    /// Time needed to clock `bytes` out at this rate
    pub fn transmit_time(&self, bytes: u32) -> Duration {
        if self.0 == 0 {
            return Duration::ZERO;
        }
        let nanos = (bytes as u128 * 8 * 1_000_000_000) / self.0 as u128;
        Duration::from_nanos(nanos as u64)
    }
}

impl fmt::Display for DataRate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0 % 1_000_000 == 0 {
            write!(f, "{}Mbps", self.0 / 1_000_000)
        } else if self.0 % 1_000 == 0 {
            write!(f, "{}kbps", self.0 / 1_000)
        } else {
            write!(f, "{}bps", self.0)
        }
    }
}

// ============================================================================
// Host platform contracts
// ============================================================================

/// A PHY configuration with a bitrate and timing characteristics
pub trait TransmissionMode {
    fn name(&self) -> &str;

    fn data_rate(&self, channel_width: ChannelWidth) -> DataRate;

    /// Airtime of a `packet_size` byte frame sent in this mode
    fn tx_duration(&self, packet_size: u32, channel_width: ChannelWidth) -> Duration;
}

/// Per-node position capability
pub trait Mobility {
    fn position(&self) -> Vector;

    fn set_position(&mut self, position: Vector);
}

#[derive(Copy, Clone, PartialEq, Debug, Default)]
pub struct Vector {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Vector {
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    pub fn distance(&self, other: &Vector) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        let dz = self.z - other.z;
        (dx * dx + dy * dy + dz * dz).sqrt()
    }
}

impl fmt::Display for Vector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.x, self.y, self.z)
    }
}

// ============================================================================
// Frames and notifications
// ============================================================================

#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum FrameKind {
    Data,
    Control,
    Management,
}

/// What the statistics need to know about a frame handed to the PHY
#[derive(Copy, Clone, PartialEq, Debug)]
pub struct TxFrame {
    pub dest: MacAddress,
    pub kind: FrameKind,
    pub size: u32,
}

/// Notifications delivered to the statistics component through the event queue
#[derive(Clone, Debug, PartialEq)]
pub enum StatsEvent {
    /// Remote station manager changed the tx power towards `dest`
    PowerChange {
        dest: MacAddress,
        old_power: PowerDbm,
        new_power: PowerDbm,
    },
    /// Remote station manager changed the data rate towards `dest`
    RateChange {
        dest: MacAddress,
        old_rate: DataRate,
        new_rate: DataRate,
    },
    /// PHY started transmitting a frame
    PhyTxBegin { frame: TxFrame, power_w: f64 },
    /// Packet sink received an application payload
    SinkRx { size: u32, from: MacAddress },
    /// End of a sampling window
    SampleWindow,
}

// ============================================================================
// Event Logging System
// ============================================================================

/// Events emitted by the statistics component for debugging and analysis
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    PowerChanged {
        dest: MacAddress,
        from: PowerDbm,
        to: PowerDbm,
    },
    RateChanged {
        dest: MacAddress,
        from: DataRate,
        to: DataRate,
    },
    WindowSampled {
        x: f64,
        throughput_mbps: f64,
        average_power_mw: f64,
    },
}

/// Trait for consuming events from the statistics component
pub trait EventSink {
    fn log(&mut self, time: Duration, event: Event);
}

/// No-op event sink (zero overhead)
pub struct NoOpSink;

impl EventSink for NoOpSink {
    #[inline(always)]
    fn log(&mut self, _time: Duration, _event: Event) {}
}
