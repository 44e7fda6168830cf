//! Discrete-event queue
//!
//! Single-threaded event queue ordered by timestamp. Events that share a
//! timestamp are delivered in the order they were scheduled. Periodic work is
//! expressed as a [`TimerId`] owned by whoever armed it: the queue re-arms a
//! timer each time it fires until the owner cancels it or the stop time is
//! reached.
//!
//! # Example
//! ```
//! use std::time::Duration;
//! use pa_rust::pa_scheduler::Scheduler;
//!
//! let mut scheduler = Scheduler::new();
//! scheduler.schedule(Duration::from_millis(10), "once");
//! scheduler
//!     .start_timer(Duration::from_millis(5), Duration::from_millis(5), "tick")
//!     .unwrap();
//! scheduler.stop(Duration::from_millis(12));
//!
//! let mut seen = Vec::new();
//! while let Some((_, event)) = scheduler.next_event() {
//!     seen.push(event);
//! }
//! assert_eq!(seen, vec!["tick", "once", "tick"]);
//! ```

use std::cmp::Ordering;
use std::collections::BinaryHeap;
use std::time::Duration;

use hashbrown::HashMap;
use log::debug;

use crate::pa_error::StatsError;

#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
pub struct TimerId(u64);

struct RecurringTimer<E> {
    period: Duration,
    event: E,
}

enum Payload<E> {
    Once(E),
    Timer(TimerId),
}

struct Pending<E> {
    time: Duration,
    seq: u64,
    payload: Payload<E>,
}

impl<E> PartialEq for Pending<E> {
    fn eq(&self, other: &Self) -> bool {
        self.time == other.time && self.seq == other.seq
    }
}

impl<E> Eq for Pending<E> {}

impl<E> PartialOrd for Pending<E> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<E> Ord for Pending<E> {
    fn cmp(&self, other: &Self) -> Ordering {
        // reversed: BinaryHeap is a max-heap, we want earliest (time, seq) first
        other
            .time
            .cmp(&self.time)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

pub struct Scheduler<E> {
    now: Duration,
    next_seq: u64,
    next_timer: u64,
    queue: BinaryHeap<Pending<E>>,
    timers: HashMap<TimerId, RecurringTimer<E>>,
    stop_time: Option<Duration>,
}

impl<E> Default for Scheduler<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E> Scheduler<E> {
    pub fn new() -> Self {
        Self {
            now: Duration::ZERO,
            next_seq: 0,
            next_timer: 0,
            queue: BinaryHeap::new(),
            timers: HashMap::new(),
            stop_time: None,
        }
    }

    pub fn now(&self) -> Duration {
        self.now
    }

    /// Deliver `event` once, `delay` after now
    pub fn schedule(&mut self, delay: Duration, event: E) {
        let time = self.now + delay;
        self.push(time, Payload::Once(event));
    }

    /// Deliver `event` at the current time, after everything already queued for now
    pub fn schedule_now(&mut self, event: E) {
        self.schedule(Duration::ZERO, event);
    }

    /// Deliver `event` after `first_delay` and then every `period` until cancelled
    pub fn start_timer(
        &mut self,
        first_delay: Duration,
        period: Duration,
        event: E,
    ) -> Result<TimerId, StatsError> {
        if period.is_zero() {
            return Err(StatsError::InvalidConfig(
                "recurring timer period must be positive".to_string(),
            ));
        }

        let id = TimerId(self.next_timer);
        self.next_timer += 1;
        self.timers.insert(id, RecurringTimer { period, event });

        let time = self.now + first_delay;
        self.push(time, Payload::Timer(id));
        Ok(id)
    }

    /// Stop a recurring timer. Returns false when it was not running.
    pub fn cancel_timer(&mut self, id: TimerId) -> bool {
        self.timers.remove(&id).is_some()
    }

    pub fn is_timer_active(&self, id: TimerId) -> bool {
        self.timers.contains_key(&id)
    }

    /// Halt the run `after` from now; anything due at or past that time is dropped
    pub fn stop(&mut self, after: Duration) {
        self.stop_time = Some(self.now + after);
    }

    pub fn stop_time(&self) -> Option<Duration> {
        self.stop_time
    }

    /// Number of queued deliveries, including armed timers
    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    fn push(&mut self, time: Duration, payload: Payload<E>) {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.queue.push(Pending { time, seq, payload });
    }

    fn past_stop(&self, time: Duration) -> bool {
        matches!(self.stop_time, Some(stop) if time >= stop)
    }
}

impl<E: Clone> Scheduler<E> {
    /// Pop the next event and advance the clock to its timestamp.
    ///
    /// Returns None once the queue is empty or the stop time is reached; in
    /// the latter case the remaining events are discarded.
    pub fn next_event(&mut self) -> Option<(Duration, E)> {
        while let Some(pending) = self.queue.pop() {
            if self.past_stop(pending.time) {
                debug!(
                    "stop time reached at {:?}, discarding {} pending events",
                    pending.time,
                    self.queue.len() + 1
                );
                self.queue.clear();
                self.timers.clear();
                return None;
            }

            self.now = pending.time;
            match pending.payload {
                Payload::Once(event) => return Some((self.now, event)),
                Payload::Timer(id) => {
                    // cancelled timers leave a stale entry behind, skip it
                    let Some(timer) = self.timers.get(&id) else {
                        continue;
                    };
                    let event = timer.event.clone();
                    let next = self.now + timer.period;
                    self.push(next, Payload::Timer(id));
                    return Some((self.now, event));
                }
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(v: u64) -> Duration {
        Duration::from_millis(v)
    }

    fn drain(scheduler: &mut Scheduler<&'static str>) -> Vec<(Duration, &'static str)> {
        let mut out = Vec::new();
        while let Some(entry) = scheduler.next_event() {
            out.push(entry);
        }
        out
    }

    #[test]
    fn test_time_order() {
        let mut scheduler = Scheduler::new();
        scheduler.schedule(ms(30), "c");
        scheduler.schedule(ms(10), "a");
        scheduler.schedule(ms(20), "b");

        let events = drain(&mut scheduler);
        assert_eq!(events, vec![(ms(10), "a"), (ms(20), "b"), (ms(30), "c")]);
        assert_eq!(scheduler.now(), ms(30));
    }

    #[test]
    fn test_same_time_is_fifo() {
        let mut scheduler = Scheduler::new();
        scheduler.schedule(ms(5), "first");
        scheduler.schedule(ms(5), "second");
        scheduler.schedule(ms(5), "third");

        let names: Vec<_> = drain(&mut scheduler).into_iter().map(|(_, e)| e).collect();
        assert_eq!(names, vec!["first", "second", "third"]);
    }

    #[test]
    fn test_schedule_now_runs_after_already_due() {
        let mut scheduler = Scheduler::new();
        scheduler.schedule(ms(1), "due");
        scheduler.schedule(ms(1), "also-due");

        let (t, first) = scheduler.next_event().unwrap();
        assert_eq!((t, first), (ms(1), "due"));

        scheduler.schedule_now("follow-up");
        let names: Vec<_> = drain(&mut scheduler).into_iter().map(|(_, e)| e).collect();
        assert_eq!(names, vec!["also-due", "follow-up"]);
    }

    #[test]
    fn test_recurring_timer_fires_every_period() {
        let mut scheduler = Scheduler::new();
        scheduler.start_timer(ms(15), ms(10), "tick").unwrap();
        scheduler.stop(ms(50));

        let times: Vec<_> = drain(&mut scheduler).into_iter().map(|(t, _)| t).collect();
        assert_eq!(times, vec![ms(15), ms(25), ms(35), ms(45)]);
    }

    #[test]
    fn test_cancelled_timer_stops() {
        let mut scheduler = Scheduler::new();
        let id = scheduler.start_timer(ms(10), ms(10), "tick").unwrap();
        scheduler.schedule(ms(100), "end");

        assert_eq!(scheduler.next_event(), Some((ms(10), "tick")));
        assert_eq!(scheduler.next_event(), Some((ms(20), "tick")));
        assert!(scheduler.cancel_timer(id));
        assert!(!scheduler.is_timer_active(id));
        assert!(!scheduler.cancel_timer(id));

        assert_eq!(drain(&mut scheduler), vec![(ms(100), "end")]);
    }

    #[test]
    fn test_stop_discards_pending() {
        let mut scheduler = Scheduler::new();
        scheduler.schedule(ms(10), "kept");
        scheduler.schedule(ms(20), "at-stop");
        scheduler.schedule(ms(30), "late");
        scheduler.stop(ms(20));

        assert_eq!(drain(&mut scheduler), vec![(ms(10), "kept")]);
        assert_eq!(scheduler.pending(), 0);
        // nothing comes back after the stop
        assert_eq!(scheduler.next_event(), None);
    }

    #[test]
    fn test_zero_period_rejected() {
        let mut scheduler: Scheduler<&str> = Scheduler::new();
        assert!(scheduler.start_timer(ms(1), Duration::ZERO, "tick").is_err());
    }

    #[test]
    fn test_delay_is_relative_to_now() {
        let mut scheduler = Scheduler::new();
        scheduler.schedule(ms(10), "a");
        scheduler.next_event();
        scheduler.schedule(ms(10), "b");

        assert_eq!(scheduler.next_event(), Some((ms(20), "b")));
    }
}
