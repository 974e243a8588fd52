//! Fixed-rate wake-ups
//!
//! Deadlines advance by whole periods from the start instant, so a slow
//! iteration does not shift the cadence of the ones after it.

use std::time::{Duration, Instant};

#[derive(Debug)]
pub struct Ticker {
    period: Duration,
    next: Instant,
    overruns: u64,
}

impl Ticker {
    /// First deadline is one period from now
    pub fn new(period: Duration) -> Self {
        Self::starting_at(Instant::now() + period, period)
    }

    /// First deadline at `first`, then every `period`
    pub fn starting_at(first: Instant, period: Duration) -> Self {
        Self {
            period,
            next: first,
            overruns: 0,
        }
    }

    /// Sleep until the next deadline
    ///
    /// Returns immediately if the deadline already passed.
    pub fn wait(&mut self) {
        let now = Instant::now();
        if self.next > now {
            std::thread::sleep(self.next - now);
        } else {
            self.overruns += 1;
        }
        self.next += self.period;
    }

    /// Deadlines that had already passed when `wait` was called
    pub fn overruns(&self) -> u64 {
        self.overruns
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keeps_cadence() {
        let period = Duration::from_millis(5);
        let start = Instant::now();
        let mut ticker = Ticker::new(period);
        for _ in 0..4 {
            ticker.wait();
        }
        assert!(start.elapsed() >= period * 4);
    }

    #[test]
    fn test_late_wait_does_not_sleep() {
        let mut ticker = Ticker::new(Duration::from_millis(100));
        std::thread::sleep(Duration::from_millis(150));

        let before = Instant::now();
        ticker.wait();
        assert!(before.elapsed() < Duration::from_millis(50));
        assert_eq!(ticker.overruns(), 1);
    }
}
