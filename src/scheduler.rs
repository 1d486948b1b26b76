use std::{
    thread,
    time::{Duration, Instant},
};

/// Decides when the next tick runs.
pub trait Scheduler {
    /// Blocks until the next tick is due. `false` ends the loop.
    fn next_tick(&mut self) -> bool;
}

/// Fixed-rate ticks. A tick that overruns its slot is followed immediately by
/// the next one; missed slots are not replayed.
#[derive(Debug)]
pub struct IntervalScheduler {
    interval: Duration,
    next_due: Option<Instant>,
}

impl IntervalScheduler {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            next_due: None,
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }
}

impl Scheduler for IntervalScheduler {
    fn next_tick(&mut self) -> bool {
        let now = Instant::now();
        let due = self.next_due.unwrap_or(now);
        if due > now {
            thread::sleep(due - now);
        }
        let fired = Instant::now();
        let next = due + self.interval;
        self.next_due = Some(next.max(fired));
        true
    }
}

/// Runs a fixed number of ticks back to back, without any clock.
#[derive(Debug, Clone, Copy)]
pub struct ManualScheduler {
    remaining: usize,
    fired: usize,
}

impl ManualScheduler {
    pub fn new(ticks: usize) -> Self {
        Self {
            remaining: ticks,
            fired: 0,
        }
    }

    pub fn fired(&self) -> usize {
        self.fired
    }
}

impl Scheduler for ManualScheduler {
    fn next_tick(&mut self) -> bool {
        if self.remaining == 0 {
            return false;
        }
        self.remaining -= 1;
        self.fired += 1;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn manual_counts_down() {
        let mut scheduler = ManualScheduler::new(2);
        assert!(scheduler.next_tick());
        assert!(scheduler.next_tick());
        assert!(!scheduler.next_tick());
        assert_eq!(scheduler.fired(), 2);
    }

    #[test]
    fn interval_spaces_ticks() {
        let mut scheduler = IntervalScheduler::new(Duration::from_millis(5));
        let start = Instant::now();
        for _ in 0..3 {
            assert!(scheduler.next_tick());
        }
        assert!(start.elapsed() >= scheduler.interval() * 2);
    }
}
