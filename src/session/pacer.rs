use std::time::{Duration, Instant};

/// Source of time for pacing, swappable in tests.
pub trait Clock {
    fn now(&self) -> Instant;
    fn sleep(&self, duration: Duration);
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }

    fn sleep(&self, duration: Duration) {
        std::thread::sleep(duration);
    }
}

/// Maps match-time offsets onto wall-clock deadlines.
///
/// An event at `offset` seconds is due at `start + offset / speed`. When
/// pacing is off every event is due immediately.
#[derive(Debug, Clone, Copy)]
pub struct Pacer {
    start: Instant,
    speed: f64,
    realtime: bool,
}

impl Pacer {
    pub fn start(clock: &dyn Clock, speed: f64, realtime: bool) -> Self {
        let speed = if speed.is_finite() && speed > 0.0 {
            speed
        } else {
            1.0
        };
        Self {
            start: clock.now(),
            speed,
            realtime,
        }
    }

    /// `None` when the deadline lies beyond what `Instant` can represent.
    pub fn deadline(&self, offset_secs: u64) -> Option<Instant> {
        if !self.realtime {
            return Some(self.start);
        }
        let offset = Duration::try_from_secs_f64(offset_secs as f64 / self.speed).ok()?;
        self.start.checked_add(offset)
    }

    /// Sleeps until the event's deadline. Returns how long it waited; zero
    /// when the deadline has already passed or cannot be represented.
    pub fn wait_for(&self, clock: &dyn Clock, offset_secs: u64) -> Duration {
        let Some(deadline) = self.deadline(offset_secs) else {
            tracing::warn!(offset_secs, speed = self.speed, "event offset out of range; not waiting");
            return Duration::ZERO;
        };
        let remaining = deadline.saturating_duration_since(clock.now());
        if !remaining.is_zero() {
            clock.sleep(remaining);
        }
        remaining
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use std::cell::{Cell, RefCell};

    /// Clock that advances only when slept on or told to.
    pub struct ManualClock {
        now: Cell<Instant>,
        pub sleeps: RefCell<Vec<Duration>>,
    }

    impl ManualClock {
        pub fn new() -> Self {
            Self {
                now: Cell::new(Instant::now()),
                sleeps: RefCell::new(Vec::new()),
            }
        }

        pub fn advance(&self, by: Duration) {
            self.now.set(self.now.get() + by);
        }

        pub fn total_slept(&self) -> Duration {
            self.sleeps.borrow().iter().sum()
        }
    }

    impl Clock for ManualClock {
        fn now(&self) -> Instant {
            self.now.get()
        }

        fn sleep(&self, duration: Duration) {
            self.sleeps.borrow_mut().push(duration);
            self.advance(duration);
        }
    }
}
