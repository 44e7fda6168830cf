//! Per-experiment statistics component
//!
//! `NodeStatistics` is the single owner of the adaptation tables, the window
//! accumulator and the output series. Every notification reaches it as a
//! [`StatsEvent`] popped from the event queue; nothing else mutates its state.

use std::time::Duration;

use log::debug;

use crate::pa_accumulator::WindowAccumulator;
use crate::pa_adaptation::AdaptationState;
use crate::pa_error::StatsError;
use crate::pa_gnuplot::Gnuplot2dDataset;
use crate::pa_interface::{
    ChannelWidth, DataRate, Event, EventSink, MacAddress, Mobility, NoOpSink, PowerDbm,
    StatsEvent, TransmissionMode, DEFAULT_CHANNEL_WIDTH, REFERENCE_PACKET_SIZE,
};
use crate::pa_sampler::{SampleSeries, SamplingConfig, SamplingController};
use crate::pa_timing::TimingTable;

pub const THROUGHPUT_TITLE: &str = "Throughput Mbits/s";
pub const POWER_TITLE: &str = "Average Transmit Power";

/// What the statistics need to know about the transmitting PHY
#[derive(Debug, Clone)]
pub struct PhyProfile {
    pub channel_width: ChannelWidth,
    /// Frame size the timing table is computed for
    pub packet_size: u32,
    /// Highest tx power level, used until the first power change
    pub max_power: PowerDbm,
}

impl Default for PhyProfile {
    fn default() -> Self {
        Self {
            channel_width: DEFAULT_CHANNEL_WIDTH,
            packet_size: REFERENCE_PACKET_SIZE,
            max_power: 20.0,
        }
    }
}

pub struct NodeStatistics {
    timing: TimingTable,
    adaptation: AdaptationState,
    accumulator: WindowAccumulator,
    sampler: SamplingController,
    data_frames: u64,
    event_sink: Box<dyn EventSink>,
}

impl NodeStatistics {
    /// Build the statistics for an AP whose PHY offers `modes`, talking to `stations`
    pub fn new<M: TransmissionMode>(
        modes: &[M],
        default_mode: &M,
        phy: &PhyProfile,
        stations: &[MacAddress],
        sampling: SamplingConfig,
    ) -> Result<Self, StatsError> {
        Self::new_with_sink(modes, default_mode, phy, stations, sampling, Box::new(NoOpSink))
    }

    pub fn new_with_sink<M: TransmissionMode>(
        modes: &[M],
        default_mode: &M,
        phy: &PhyProfile,
        stations: &[MacAddress],
        sampling: SamplingConfig,
        event_sink: Box<dyn EventSink>,
    ) -> Result<Self, StatsError> {
        let timing = TimingTable::build(modes, phy.packet_size, phy.channel_width)?;
        let default_rate = default_mode.data_rate(phy.channel_width);
        // the default rate has to be resolvable before any rate change arrives
        timing.lookup(default_rate)?;

        Ok(Self {
            timing,
            adaptation: AdaptationState::new(stations, phy.max_power, default_rate),
            accumulator: WindowAccumulator::new(),
            sampler: SamplingController::new(sampling)?,
            data_frames: 0,
            event_sink,
        })
    }

    /// Process one notification. `node` is the station whose position the
    /// sampling window advances.
    pub fn handle(
        &mut self,
        now: Duration,
        event: StatsEvent,
        node: &mut dyn Mobility,
    ) -> Result<(), StatsError> {
        match event {
            StatsEvent::PowerChange {
                dest,
                old_power,
                new_power,
            } => {
                self.adaptation.set_power(dest, new_power);
                self.event_sink.log(
                    now,
                    Event::PowerChanged {
                        dest,
                        from: old_power,
                        to: new_power,
                    },
                );
            }
            StatsEvent::RateChange {
                dest,
                old_rate,
                new_rate,
            } => {
                self.adaptation.set_rate(dest, new_rate);
                self.event_sink.log(
                    now,
                    Event::RateChanged {
                        dest,
                        from: old_rate,
                        to: new_rate,
                    },
                );
            }
            StatsEvent::PhyTxBegin { frame, .. } => {
                if self
                    .accumulator
                    .record_tx(&frame, &self.adaptation, &self.timing)?
                {
                    self.data_frames += 1;
                }
            }
            StatsEvent::SinkRx { size, .. } => {
                self.accumulator.record_rx(size);
            }
            StatsEvent::SampleWindow => {
                let (x, sample) = self.sampler.sample(now, &mut self.accumulator, node);
                debug!(
                    "window {} at x={}: {:.3} Mbit/s, {:.3} mW, airtime {:.4}s",
                    self.sampler.windows_completed(),
                    x,
                    sample.throughput_mbps,
                    sample.average_power_mw,
                    sample.airtime
                );
                self.event_sink.log(
                    now,
                    Event::WindowSampled {
                        x,
                        throughput_mbps: sample.throughput_mbps,
                        average_power_mw: sample.average_power_mw,
                    },
                );
            }
        }
        Ok(())
    }

    pub fn sampling(&self) -> &SamplingConfig {
        self.sampler.config()
    }

    pub fn timing(&self) -> &TimingTable {
        &self.timing
    }

    pub fn adaptation(&self) -> &AdaptationState {
        &self.adaptation
    }

    pub fn accumulator(&self) -> &WindowAccumulator {
        &self.accumulator
    }

    pub fn current_rate(&self, dest: &MacAddress) -> Result<DataRate, StatsError> {
        self.adaptation.rate(dest)
    }

    pub fn windows_completed(&self) -> u64 {
        self.sampler.windows_completed()
    }

    /// Data frames counted towards energy over the whole run
    pub fn data_frames(&self) -> u64 {
        self.data_frames
    }

    pub fn throughput_series(&self) -> &SampleSeries {
        self.sampler.throughput()
    }

    pub fn power_series(&self) -> &SampleSeries {
        self.sampler.power()
    }

    pub fn throughput_dataset(&self) -> Gnuplot2dDataset {
        Gnuplot2dDataset::from_series(THROUGHPUT_TITLE, self.sampler.throughput())
    }

    pub fn power_dataset(&self) -> Gnuplot2dDataset {
        Gnuplot2dDataset::from_series(POWER_TITLE, self.sampler.power())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    use crate::pa_interface::{FrameKind, TxFrame, Vector};
    use crate::pa_mobility::ConstantPositionMobility;
    use crate::pa_scheduler::Scheduler;
    use crate::pa_timing::tests::{modes, FixedMode};

    struct Recorder(Rc<RefCell<Vec<Event>>>);

    impl EventSink for Recorder {
        fn log(&mut self, _time: Duration, event: Event) {
            self.0.borrow_mut().push(event);
        }
    }

    fn sta() -> MacAddress {
        MacAddress::from_index(2)
    }

    fn data(dest: MacAddress) -> StatsEvent {
        StatsEvent::PhyTxBegin {
            frame: TxFrame {
                dest,
                kind: FrameKind::Data,
                size: 1500,
            },
            power_w: 0.1,
        }
    }

    fn zero_overhead_modes() -> Vec<FixedMode> {
        modes()
            .into_iter()
            .map(|mut m| {
                m.overhead = Duration::ZERO;
                m
            })
            .collect()
    }

    fn stats() -> NodeStatistics {
        let modes = zero_overhead_modes();
        NodeStatistics::new(
            &modes,
            &modes[1],
            &PhyProfile::default(),
            &[sta()],
            SamplingConfig::default(),
        )
        .unwrap()
    }

    #[test]
    fn test_default_rate_must_be_in_table() {
        let modes = zero_overhead_modes();
        let stray = FixedMode {
            name: "Rate54",
            rate: DataRate::from_mbps(54),
            overhead: Duration::ZERO,
        };
        let result = NodeStatistics::new(
            &modes,
            &stray,
            &PhyProfile::default(),
            &[sta()],
            SamplingConfig::default(),
        );
        assert!(matches!(result, Err(StatsError::UnknownRate(_))));
    }

    #[test]
    fn test_power_change_affects_energy() {
        let mut stats = stats();
        let mut node = ConstantPositionMobility::new(Vector::new(5.0, 0.0, 0.0));
        let t = Duration::from_secs(1);

        // default 12 Mb/s => 1 ms per frame, 20 dBm => 100 mW
        stats.handle(t, data(sta()), &mut node).unwrap();
        assert!((stats.accumulator().total_energy() - 0.1).abs() < 1e-9);

        stats
            .handle(
                t,
                StatsEvent::PowerChange {
                    dest: sta(),
                    old_power: 20.0,
                    new_power: 10.0,
                },
                &mut node,
            )
            .unwrap();
        stats.handle(t, data(sta()), &mut node).unwrap();
        assert!((stats.accumulator().total_energy() - 0.11).abs() < 1e-9);
        assert_eq!(stats.data_frames(), 2);
    }

    #[test]
    fn test_rate_change_affects_duration() {
        let mut stats = stats();
        let mut node = ConstantPositionMobility::new(Vector::default());
        let t = Duration::from_secs(1);

        stats
            .handle(
                t,
                StatsEvent::RateChange {
                    dest: sta(),
                    old_rate: DataRate::from_mbps(12),
                    new_rate: DataRate::from_mbps(24),
                },
                &mut node,
            )
            .unwrap();
        assert_eq!(stats.current_rate(&sta()).unwrap(), DataRate::from_mbps(24));

        stats.handle(t, data(sta()), &mut node).unwrap();
        assert!((stats.accumulator().total_time() - 0.0005).abs() < 1e-12);
    }

    #[test]
    fn test_unknown_station_aborts() {
        let mut stats = stats();
        let mut node = ConstantPositionMobility::new(Vector::default());
        let stranger = MacAddress::from_index(77);

        let result = stats.handle(Duration::ZERO, data(stranger), &mut node);
        assert_eq!(result, Err(StatsError::UnknownDestination(stranger)));
    }

    #[test]
    fn test_events_reach_sink() {
        let modes = zero_overhead_modes();
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut stats = NodeStatistics::new_with_sink(
            &modes,
            &modes[0],
            &PhyProfile::default(),
            &[sta()],
            SamplingConfig::default(),
            Box::new(Recorder(log.clone())),
        )
        .unwrap();
        let mut node = ConstantPositionMobility::new(Vector::new(3.0, 0.0, 0.0));

        stats
            .handle(
                Duration::ZERO,
                StatsEvent::RateChange {
                    dest: sta(),
                    old_rate: DataRate::from_mbps(6),
                    new_rate: DataRate::from_mbps(12),
                },
                &mut node,
            )
            .unwrap();
        stats
            .handle(Duration::from_secs(1), StatsEvent::SampleWindow, &mut node)
            .unwrap();

        let events = log.borrow();
        assert_eq!(events.len(), 2);
        assert!(matches!(events[0], Event::RateChanged { .. }));
        assert!(matches!(events[1], Event::WindowSampled { x, .. } if x == 3.0));
    }

    #[test]
    fn test_driven_by_scheduler() {
        // Two windows of traffic delivered through the event queue
        let mut stats = stats();
        let mut node = ConstantPositionMobility::new(Vector::new(5.0, 0.0, 0.0));
        let mut scheduler = Scheduler::new();

        let sampling = stats.sampling().clone();
        let timer = scheduler
            .start_timer(sampling.first_tick(), sampling.window, StatsEvent::SampleWindow)
            .unwrap();

        // window one: 187500 bytes received, two data frames sent
        for i in 0..125u64 {
            scheduler.schedule(
                Duration::from_millis(600 + i),
                StatsEvent::SinkRx {
                    size: 1500,
                    from: MacAddress::from_index(1),
                },
            );
        }
        scheduler.schedule(Duration::from_millis(700), data(sta()));
        scheduler.schedule(Duration::from_millis(800), data(sta()));
        // management traffic never counts
        scheduler.schedule(
            Duration::from_millis(900),
            StatsEvent::PhyTxBegin {
                frame: TxFrame {
                    dest: MacAddress::BROADCAST,
                    kind: FrameKind::Management,
                    size: 80,
                },
                power_w: 0.1,
            },
        );
        // window two is empty
        scheduler.stop(Duration::from_millis(3000));

        while let Some((now, event)) = scheduler.next_event() {
            stats.handle(now, event, &mut node).unwrap();
        }

        assert!(!scheduler.is_timer_active(timer));
        assert_eq!(stats.windows_completed(), 2);
        assert_eq!(node.position().x, 7.0);

        let throughput = stats.throughput_series().points();
        assert_eq!(throughput.len(), 2);
        assert_eq!(throughput[0].0, 5.0);
        assert!((throughput[0].1 - 1.5).abs() < 1e-9);
        assert_eq!(throughput[1], (6.0, 0.0));

        let power = stats.power_series().points();
        assert!((power[0].1 - 0.2).abs() < 1e-9);
        assert_eq!(power[1], (6.0, 0.0));

        let dataset = stats.throughput_dataset();
        assert_eq!(dataset.title(), THROUGHPUT_TITLE);
        assert_eq!(dataset.points().len(), 2);
    }
}
