//! # paRust - Wifi Power Adaptation Statistics
//!
//! Statistics engine for wifi power/rate adaptation experiments run on a
//! discrete-event simulator. An access point streams traffic to a station
//! that walks away from it one step per sampling window; the engine watches
//! link-layer transmissions and adaptation decisions and produces two series:
//! throughput vs. distance and average transmit power vs. distance.
//!
//! ## Core Components
//!
//! - **TimingTable**: airtime of a reference frame for every supported rate
//! - **AdaptationState**: current tx power and data rate per destination
//! - **WindowAccumulator**: bytes received, energy and airtime of the current window
//! - **SamplingController**: closes windows into the output series and moves the station
//! - **NodeStatistics**: the owning component, fed with `StatsEvent` messages
//!
//! ## Host Primitives
//!
//! - **Scheduler**: timestamp-ordered event queue with recurring timers and a stop time
//! - **Mobility**: get/set position of a node
//! - **Gnuplot**: `.plt` exporter for the output series
//!
//! ## Usage
//!
//! ```no_run
//! use pa_rust::{NodeStatistics, PhyProfile, SamplingConfig, Scheduler, StatsEvent};
//! use pa_rust::pa_mobility::ConstantPositionMobility;
//! # use pa_rust::{ChannelWidth, DataRate, MacAddress, TransmissionMode, Vector};
//! # use std::time::Duration;
//! # struct Mode;
//! # impl TransmissionMode for Mode {
//! #     fn name(&self) -> &str { "OfdmRate6Mbps" }
//! #     fn data_rate(&self, _: ChannelWidth) -> DataRate { DataRate::from_mbps(6) }
//! #     fn tx_duration(&self, size: u32, _: ChannelWidth) -> Duration {
//! #         DataRate::from_mbps(6).transmit_time(size)
//! #     }
//! # }
//! # let modes = vec![Mode];
//! # let station = MacAddress::from_index(1);
//!
//! let sampling = SamplingConfig::default();
//! let mut stats = NodeStatistics::new(
//!     &modes, &modes[0], &PhyProfile::default(), &[station], sampling.clone(),
//! ).unwrap();
//! let mut sta = ConstantPositionMobility::new(Vector::new(5.0, 0.0, 0.0));
//!
//! let mut scheduler = Scheduler::new();
//! scheduler.start_timer(sampling.first_tick(), sampling.window, StatsEvent::SampleWindow).unwrap();
//! scheduler.stop(Duration::from_secs(10));
//!
//! // PHY, sink and station-manager notifications are scheduled as StatsEvent
//! // messages by the host; the loop hands each one to the statistics.
//! while let Some((now, event)) = scheduler.next_event() {
//!     stats.handle(now, event, &mut sta).unwrap();
//! }
//!
//! let throughput = stats.throughput_dataset();
//! ```

pub mod pa_accumulator;
pub mod pa_adaptation;
pub mod pa_error;
pub mod pa_gnuplot;
pub mod pa_interface;
pub mod pa_mobility;
pub mod pa_sampler;
pub mod pa_scheduler;
pub mod pa_statistics;
pub mod pa_timing;

// Re-export commonly used types
pub use pa_error::StatsError;
pub use pa_interface::{
    ChannelWidth, DataRate, Event, EventSink, FrameKind, MacAddress, Mobility, NoOpSink,
    PowerDbm, StatsEvent, TransmissionMode, TxFrame, Vector,
};
pub use pa_sampler::{SampleSeries, SamplingConfig};
pub use pa_scheduler::{Scheduler, TimerId};
pub use pa_statistics::{NodeStatistics, PhyProfile};
pub use pa_timing::TimingTable;
