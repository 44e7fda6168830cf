//! Power adaptation distance simulator module
//!
//! Reproduces the classic "power adaptation vs distance" experiment:
//! - One AP streaming CBR traffic to one station
//! - The station stepping away from the AP at a fixed pace
//! - A constant, ARF or PARF station manager on the AP
//! - Throughput and average transmit power sampled once per step

pub mod config;
pub mod error;
pub mod event_sinks;
pub mod link;
pub mod manager;
pub mod modes;
pub mod runner;
pub mod stats;

pub use config::{ManagerKind, PowerDistanceConfig};
pub use event_sinks::{CsvEventSink, LoggingEventSink};
pub use runner::PowerDistanceRunner;
