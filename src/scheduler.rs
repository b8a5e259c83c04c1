use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimerId(u64);

struct Timer<E> {
    id: TimerId,
    due: Duration,
    event: E,
}

/// Owns every pending timed event of one component.
///
/// Nothing fires on its own; the owner polls with the current time from the
/// frame loop and receives the due events in due order (ties keep insertion
/// order). Cancelling is the only way to drop an event without it firing.
pub struct Scheduler<E> {
    timers: Vec<Timer<E>>,
    next_id: u64,
}

impl<E> Scheduler<E> {
    pub fn new() -> Self {
        Self {
            timers: Vec::new(),
            next_id: 0,
        }
    }

    pub fn schedule_at(&mut self, due: Duration, event: E) -> TimerId {
        let id = TimerId(self.next_id);
        self.next_id += 1;
        self.timers.push(Timer { id, due, event });
        id
    }

    pub fn schedule_after(&mut self, now: Duration, delay: Duration, event: E) -> TimerId {
        self.schedule_at(now + delay, event)
    }

    /// Returns true if the timer was still pending.
    pub fn cancel(&mut self, id: TimerId) -> bool {
        let before = self.timers.len();
        self.timers.retain(|timer| timer.id != id);
        self.timers.len() != before
    }

    pub fn cancel_all(&mut self) {
        self.timers.clear();
    }

    pub fn is_idle(&self) -> bool {
        self.timers.is_empty()
    }

    pub fn pending(&self) -> usize {
        self.timers.len()
    }

    pub fn next_due(&self) -> Option<Duration> {
        self.timers.iter().map(|timer| timer.due).min()
    }

    /// Removes and returns every event due at or before `now`.
    pub fn poll(&mut self, now: Duration) -> Vec<E> {
        if self.timers.iter().all(|timer| timer.due > now) {
            return Vec::new();
        }

        let (mut due, pending): (Vec<_>, Vec<_>) =
            self.timers.drain(..).partition(|timer| timer.due <= now);
        self.timers = pending;

        due.sort_by(|a, b| a.due.cmp(&b.due).then(a.id.0.cmp(&b.id.0)));
        due.into_iter().map(|timer| timer.event).collect()
    }
}

impl<E> Default for Scheduler<E> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(millis: u64) -> Duration {
        Duration::from_millis(millis)
    }

    #[test]
    fn poll_returns_due_events_in_order() {
        let mut scheduler = Scheduler::new();
        scheduler.schedule_at(ms(300), "c");
        scheduler.schedule_at(ms(100), "a");
        scheduler.schedule_at(ms(100), "b");
        scheduler.schedule_at(ms(900), "late");

        assert!(scheduler.poll(ms(50)).is_empty());
        assert_eq!(scheduler.poll(ms(300)), vec!["a", "b", "c"]);
        assert_eq!(scheduler.pending(), 1);
        assert_eq!(scheduler.next_due(), Some(ms(900)));
    }

    #[test]
    fn cancelled_timers_never_fire() {
        let mut scheduler = Scheduler::new();
        let first = scheduler.schedule_after(ms(0), ms(10), 1);
        scheduler.schedule_after(ms(0), ms(20), 2);

        assert!(scheduler.cancel(first));
        assert!(!scheduler.cancel(first));
        assert_eq!(scheduler.poll(ms(100)), vec![2]);

        scheduler.schedule_at(ms(200), 3);
        scheduler.cancel_all();
        assert!(scheduler.is_idle());
        assert!(scheduler.poll(ms(1000)).is_empty());
    }
}
