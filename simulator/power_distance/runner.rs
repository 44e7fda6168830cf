//! Power adaptation distance simulation runner
//!
//! One AP sends CBR traffic to one station that walks away from it. The AP's
//! station manager picks rate and power per frame; every PHY transmission,
//! every delivery and every adaptation change reaches the statistics as a
//! `StatsEvent` through the same event queue.

use std::collections::VecDeque;
use std::time::Duration;

use log::{debug, info, trace};
use pa_rust::pa_accumulator::dbm_to_mw;
use pa_rust::pa_interface::{
    FrameKind, MacAddress, Mobility, PowerDbm, StatsEvent, TransmissionMode, TxFrame,
    DEFAULT_CHANNEL_WIDTH,
};
use pa_rust::pa_mobility::ConstantPositionMobility;
use pa_rust::{EventSink, NoOpSink, NodeStatistics, PhyProfile, SamplingConfig, Scheduler};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::config::PowerDistanceConfig;
use super::error::ScenarioError;
use super::link::LinkModel;
use super::manager::StationManager;
use super::modes::{erp_mode_list, mode_index, WifiMode};
use super::stats::{MacStats, SimResult};

// 802.11 timing, long slot (ERP with DSSS stations around)
const SLOT: Duration = Duration::from_micros(20);
const SIFS: Duration = Duration::from_micros(10);
const CW_MIN: u32 = 15;
const CW_MAX: u32 = 1023;

/// 24 byte header, 8 byte LLC/SNAP, 4 byte FCS
pub const MAC_OVERHEAD: u32 = 36;
pub const BEACON_SIZE: u32 = 80;
const ACK_SIZE: u32 = 14;
const RTS_SIZE: u32 = 20;
const CTS_SIZE: u32 = 14;

#[derive(Debug, Clone)]
enum SimEvent {
    Stats(StatsEvent),
    TrafficArrival,
    Beacon,
    TxEnd(TxOutcome),
}

#[derive(Debug, Clone, Copy)]
enum TxOutcome {
    Beacon,
    Data { delivered: bool },
}

/// Power adaptation distance simulation runner
pub struct PowerDistanceRunner {
    config: PowerDistanceConfig,
    seed: [u8; 32],
    rng: StdRng,
    scheduler: Scheduler<SimEvent>,
    stats: NodeStatistics,
    manager: StationManager,
    link: LinkModel,
    modes: Vec<WifiMode>,

    ap: ConstantPositionMobility,
    sta: ConstantPositionMobility,
    ap_address: MacAddress,
    sta_address: MacAddress,

    // MAC state
    data_queue: VecDeque<u32>,
    beacon_pending: bool,
    busy: bool,
    retries: u32,
    mac_stats: MacStats,
}

impl PowerDistanceRunner {
    pub fn new(config: PowerDistanceConfig) -> Result<Self, ScenarioError> {
        Self::new_with_sink(config, Box::new(NoOpSink))
    }

    pub fn new_with_sink(
        config: PowerDistanceConfig,
        event_sink: Box<dyn EventSink>,
    ) -> Result<Self, ScenarioError> {
        config.validate()?;

        let seed = config.resolve_seed();
        let rng = StdRng::from_seed(seed);

        let modes = erp_mode_list();
        let ap_address = MacAddress::from_index(1);
        let sta_address = MacAddress::from_index(2);

        let phy = PhyProfile {
            channel_width: DEFAULT_CHANNEL_WIDTH,
            packet_size: config.traffic.packet_size,
            max_power: config.max_power,
        };
        let sampling = SamplingConfig {
            window: config.steps_time,
            step_size: config.steps_size,
            initial_offset: config.traffic.start,
        };
        let stats = NodeStatistics::new_with_sink(
            &modes,
            &modes[0],
            &phy,
            &[sta_address],
            sampling,
            event_sink,
        )?;

        let constant_index = mode_index(&modes, config.mac.constant_rate).ok_or_else(|| {
            ScenarioError::Config(format!(
                "constant rate {} is not an 802.11g rate",
                config.mac.constant_rate
            ))
        })?;
        let rates = modes
            .iter()
            .map(|mode| mode.data_rate(DEFAULT_CHANNEL_WIDTH))
            .collect();
        let manager = StationManager::new(
            config.manager,
            rates,
            config.power_table(),
            constant_index,
        );

        Ok(Self {
            link: LinkModel::new(config.link.clone()),
            ap: ConstantPositionMobility::new(config.ap_position),
            sta: ConstantPositionMobility::new(config.sta_position),
            config,
            seed,
            rng,
            scheduler: Scheduler::new(),
            stats,
            manager,
            modes,
            ap_address,
            sta_address,
            data_queue: VecDeque::new(),
            beacon_pending: false,
            busy: false,
            retries: 0,
            mac_stats: MacStats::default(),
        })
    }

    /// Run the simulation to the stop time
    pub fn run(mut self) -> Result<SimResult, ScenarioError> {
        info!(
            "{} manager, {} steps of {}m every {:?}",
            self.config.manager, self.config.steps, self.config.steps_size, self.config.steps_time
        );

        self.schedule_start()?;

        while let Some((now, event)) = self.scheduler.next_event() {
            self.process(now, event)?;
        }

        Ok(self.finish())
    }

    fn schedule_start(&mut self) -> Result<(), ScenarioError> {
        let changes = self.manager.associate(self.sta_address);
        self.push_changes(changes);

        let sampling = self.stats.sampling().clone();
        self.scheduler.start_timer(
            sampling.first_tick(),
            sampling.window,
            SimEvent::Stats(StatsEvent::SampleWindow),
        )?;
        self.scheduler.start_timer(
            self.config.traffic.start,
            self.config.traffic.interval(),
            SimEvent::TrafficArrival,
        )?;
        self.scheduler.start_timer(
            Duration::ZERO,
            self.config.mac.beacon_interval,
            SimEvent::Beacon,
        )?;

        self.scheduler.stop(self.config.simulation_time()?);
        Ok(())
    }

    fn process(&mut self, now: Duration, event: SimEvent) -> Result<(), ScenarioError> {
        match event {
            SimEvent::Stats(event) => {
                self.stats.handle(now, event, &mut self.sta)?;
            }
            SimEvent::TrafficArrival => {
                self.mac_stats.packets_generated += 1;
                if self.data_queue.len() >= self.config.mac.queue_limit {
                    self.mac_stats.queue_drops += 1;
                } else {
                    self.data_queue.push_back(self.config.traffic.packet_size);
                }
                self.try_transmit();
            }
            SimEvent::Beacon => {
                self.beacon_pending = true;
                self.try_transmit();
            }
            SimEvent::TxEnd(outcome) => {
                self.busy = false;
                self.complete(now, outcome);
                self.try_transmit();
            }
        }
        Ok(())
    }

    /// Start the next frame if the medium is free. Beacons go first.
    fn try_transmit(&mut self) {
        if self.busy {
            return;
        }

        if self.beacon_pending {
            self.beacon_pending = false;
            self.transmit_beacon();
        } else if let Some(&payload) = self.data_queue.front() {
            self.transmit_data(payload);
        }
    }

    fn transmit_beacon(&mut self) {
        let power = self.config.max_power;
        self.phy_tx(MacAddress::BROADCAST, FrameKind::Management, BEACON_SIZE, power);
        self.mac_stats.beacons_sent += 1;

        let airtime = self.control_mode().tx_duration(BEACON_SIZE, DEFAULT_CHANNEL_WIDTH);
        let busy_for = airtime + self.contention(0);
        self.busy = true;
        self.scheduler.schedule(busy_for, SimEvent::TxEnd(TxOutcome::Beacon));
    }

    fn transmit_data(&mut self, payload: u32) {
        let Some(vector) = self.manager.tx_vector(&self.sta_address) else {
            return;
        };
        let size = payload + MAC_OVERHEAD;
        let control = self.control_mode();

        let mut busy_for = Duration::ZERO;
        if size > self.config.rts_threshold {
            self.phy_tx(self.sta_address, FrameKind::Control, RTS_SIZE, vector.power);
            self.mac_stats.rts_sent += 1;
            busy_for += control.tx_duration(RTS_SIZE, DEFAULT_CHANNEL_WIDTH)
                + SIFS
                + control.tx_duration(CTS_SIZE, DEFAULT_CHANNEL_WIDTH)
                + SIFS;
        }

        self.phy_tx(self.sta_address, FrameKind::Data, size, vector.power);
        self.mac_stats.data_attempts += 1;

        let mode = &self.modes[vector.rate_index];
        let airtime = mode.tx_duration(size, DEFAULT_CHANNEL_WIDTH);
        let probability = self
            .link
            .success_probability(mode, vector.power, &self.ap.position(), &self.sta.position())
            .clamp(0.0, 1.0);
        let delivered = self.rng.gen_bool(probability);
        trace!(
            "data at {} / {} dBm, p={:.3}, delivered={}",
            vector.rate,
            vector.power,
            probability,
            delivered
        );

        busy_for += airtime
            + SIFS
            + control.tx_duration(ACK_SIZE, DEFAULT_CHANNEL_WIDTH)
            + self.contention(self.retries);
        self.busy = true;
        self.scheduler
            .schedule(busy_for, SimEvent::TxEnd(TxOutcome::Data { delivered }));
    }

    fn complete(&mut self, now: Duration, outcome: TxOutcome) {
        let TxOutcome::Data { delivered } = outcome else {
            return;
        };

        if delivered {
            self.mac_stats.data_delivered += 1;
            self.retries = 0;
            let payload = self.data_queue.pop_front().unwrap_or_default();
            let changes = self.manager.report_data_ok(self.sta_address);
            self.push_changes(changes);
            self.scheduler.schedule_now(SimEvent::Stats(StatsEvent::SinkRx {
                size: payload,
                from: self.ap_address,
            }));
            return;
        }

        let changes = self.manager.report_data_failed(self.sta_address);
        self.push_changes(changes);
        self.retries += 1;
        if self.retries > self.config.mac.retry_limit {
            debug!(
                "{:?}: frame to {} dropped after {} attempts",
                now, self.sta_address, self.retries
            );
            self.manager.report_final_failed(self.sta_address);
            self.data_queue.pop_front();
            self.mac_stats.retry_drops += 1;
            self.retries = 0;
        }
    }

    fn push_changes(&mut self, changes: Vec<StatsEvent>) {
        for change in changes {
            match change {
                StatsEvent::PowerChange { .. } => self.mac_stats.power_changes += 1,
                StatsEvent::RateChange { .. } => self.mac_stats.rate_changes += 1,
                _ => {}
            }
            self.scheduler.schedule_now(SimEvent::Stats(change));
        }
    }

    fn phy_tx(&mut self, dest: MacAddress, kind: FrameKind, size: u32, power: PowerDbm) {
        self.scheduler.schedule_now(SimEvent::Stats(StatsEvent::PhyTxBegin {
            frame: TxFrame { dest, kind, size },
            power_w: dbm_to_mw(power) / 1000.0,
        }));
    }

    /// DIFS plus a random backoff; the window doubles with every retry
    fn contention(&mut self, retries: u32) -> Duration {
        let cw = ((CW_MIN + 1) << retries.min(6)).saturating_sub(1).min(CW_MAX);
        let slots = self.rng.gen_range(0..=cw);
        SIFS + SLOT * 2 + SLOT * slots
    }

    /// Control responses and beacons go out at the lowest rate
    fn control_mode(&self) -> WifiMode {
        self.modes[0].clone()
    }

    fn finish(self) -> SimResult {
        info!(
            "done: {} windows, {} of {} data attempts delivered",
            self.stats.windows_completed(),
            self.mac_stats.data_delivered,
            self.mac_stats.data_attempts
        );

        SimResult {
            seed_used: self.seed,
            manager: self.config.manager,
            output_file_name: self.config.output_file_name.clone(),
            windows_completed: self.stats.windows_completed(),
            simulated_time: self.scheduler.now(),
            final_sta_position: self.sta.position(),
            throughput: self.stats.throughput_dataset(),
            power: self.stats.power_dataset(),
            mac_stats: self.mac_stats,
        }
    }
}
