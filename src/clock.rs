use std::cell::Cell;
use std::rc::Rc;
use std::time::{Duration, Instant};

/// Monotonic elapsed time since the scene was activated.
pub trait Clock {
    fn now(&self) -> Duration;

    fn now_secs(&self) -> f32 {
        self.now().as_secs_f32()
    }
}

pub struct SystemClock {
    start_time: Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        Self {
            start_time: Instant::now(),
        }
    }

    /// Restarts the elapsed time from zero. Called when a scene is (re)mounted.
    pub fn restart(&mut self) {
        self.start_time = Instant::now();
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now(&self) -> Duration {
        self.start_time.elapsed()
    }
}

/// A clock that only moves when told to. Clones share the same time.
#[derive(Clone, Default)]
pub struct ManualClock {
    now: Rc<Cell<Duration>>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn advance(&self, delta: Duration) {
        self.now.set(self.now.get() + delta);
    }

    pub fn advance_millis(&self, millis: u64) {
        self.advance(Duration::from_millis(millis));
    }

    /// Moves the clock to `time`. Going backwards is ignored.
    pub fn set(&self, time: Duration) {
        if time >= self.now.get() {
            self.now.set(time);
        }
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Duration {
        self.now.get()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn manual_clock_clones_share_time() {
        let clock = ManualClock::new();
        let other = clock.clone();

        clock.advance_millis(250);
        assert_eq!(other.now(), Duration::from_millis(250));
        assert!((other.now_secs() - 0.25).abs() < 1e-6);
    }

    #[test]
    fn manual_clock_is_monotonic() {
        let clock = ManualClock::new();
        clock.set(Duration::from_secs(2));
        clock.set(Duration::from_secs(1));
        assert_eq!(clock.now(), Duration::from_secs(2));
    }

    #[test]
    fn system_clock_starts_near_zero() {
        let clock = SystemClock::new();
        assert!(clock.now() < Duration::from_secs(1));
    }
}
