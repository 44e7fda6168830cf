//! Various event sinks for different use cases

use std::cell::RefCell;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use std::rc::Rc;
use std::time::Duration;

use log::{info, warn};
use pa_rust::{Event, EventSink};

// ============================================================================
// Logging Sink
// ============================================================================

/// Reports every power and rate change through the logger
pub struct LoggingEventSink;

impl EventSink for LoggingEventSink {
    fn log(&mut self, time: Duration, event: Event) {
        match event {
            Event::PowerChanged { dest, from, to } => {
                info!(
                    "{} {} Old power={} New power={}",
                    time.as_secs_f64(),
                    dest,
                    from,
                    to
                );
            }
            Event::RateChanged { dest, from, to } => {
                info!(
                    "{} {} Old rate={} New rate={}",
                    time.as_secs_f64(),
                    dest,
                    from,
                    to
                );
            }
            Event::WindowSampled { .. } => {}
        }
    }
}

// ============================================================================
// CSV Event Sink
// ============================================================================

/// CSV event sink for structured data export
pub struct CsvEventSink {
    writer: BufWriter<File>,
}

impl CsvEventSink {
    pub fn new<P: AsRef<Path>>(path: P) -> std::io::Result<Self> {
        let file = File::create(path)?;
        let mut writer = BufWriter::new(file);

        writeln!(writer, "time,event_type,dest,value1,value2,value3")?;

        Ok(Self { writer })
    }

    pub fn flush(&mut self) -> std::io::Result<()> {
        self.writer.flush()
    }
}

impl EventSink for CsvEventSink {
    fn log(&mut self, time: Duration, event: Event) {
        let t = time.as_secs_f64();
        let result = match event {
            Event::PowerChanged { dest, from, to } => {
                writeln!(self.writer, "{},PowerChanged,{},{},{},", t, dest, from, to)
            }
            Event::RateChanged { dest, from, to } => writeln!(
                self.writer,
                "{},RateChanged,{},{},{},",
                t,
                dest,
                from.bps(),
                to.bps()
            ),
            Event::WindowSampled {
                x,
                throughput_mbps,
                average_power_mw,
            } => writeln!(
                self.writer,
                "{},WindowSampled,,{},{},{}",
                t, x, throughput_mbps, average_power_mw
            ),
        };

        if let Err(e) = result {
            warn!("Error writing to CSV: {}", e);
        }
    }
}

impl Drop for CsvEventSink {
    fn drop(&mut self) {
        let _ = self.writer.flush();
    }
}

// ============================================================================
// Collector Event Sink (In-Memory)
// ============================================================================

#[derive(Debug, Clone)]
pub struct EventRecord {
    pub time: Duration,
    pub event: Event,
}

/// Collects events in memory for programmatic analysis. Clones share the
/// same record list, so keep one clone after boxing the other into a runner.
#[derive(Clone, Default)]
pub struct CollectorEventSink {
    events: Rc<RefCell<Vec<EventRecord>>>,
}

impl CollectorEventSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<EventRecord> {
        self.events.borrow().clone()
    }

    pub fn count_where<F: Fn(&Event) -> bool>(&self, predicate: F) -> usize {
        self.events
            .borrow()
            .iter()
            .filter(|record| predicate(&record.event))
            .count()
    }
}

impl EventSink for CollectorEventSink {
    fn log(&mut self, time: Duration, event: Event) {
        self.events.borrow_mut().push(EventRecord { time, event });
    }
}
