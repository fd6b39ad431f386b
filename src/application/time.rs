//! Frame timing. The engine measures elapsed time through a swappable
//! `TimeSource`, so tests and replays can drive the clock by hand.

use std::cell::Cell;
use std::rc::Rc;
use std::thread;
use std::time::{Duration, Instant};

use super::settings::TimeParams;

/// A monotonic clock the engine samples once per frame.
pub trait TimeSource {
    /// Time elapsed since some fixed epoch.
    fn elapsed(&self) -> Duration;
}

impl<T: TimeSource + ?Sized> TimeSource for Rc<T> {
    fn elapsed(&self) -> Duration {
        (**self).elapsed()
    }
}

/// The default source, anchored at its own creation.
pub struct WallClock {
    epoch: Instant,
}

impl WallClock {
    pub fn new() -> Self {
        WallClock {
            epoch: Instant::now(),
        }
    }
}

impl Default for WallClock {
    fn default() -> Self {
        WallClock::new()
    }
}

impl TimeSource for WallClock {
    fn elapsed(&self) -> Duration {
        self.epoch.elapsed()
    }
}

/// A clock that only moves when told to. Combine with `max_fps = 0`, or the
/// frame pacer will sleep forever waiting for it.
#[derive(Default)]
pub struct ManualClock {
    now: Cell<Duration>,
}

impl ManualClock {
    pub fn new() -> Self {
        ManualClock::default()
    }

    pub fn advance(&self, dt: Duration) {
        self.now.set(self.now.get() + dt);
    }

    pub fn advance_millis(&self, millis: u64) {
        self.advance(Duration::from_millis(millis));
    }
}

impl TimeSource for ManualClock {
    fn elapsed(&self) -> Duration {
        self.now.get()
    }
}

/// One frame's timing, handed to the active state every update.
#[derive(Debug, Clone, Copy)]
pub struct TimeStep {
    /// Seconds since the previous frame, before any state's time scale.
    pub unscaled_dt: f32,
    /// Seconds accumulated over the engine's whole run.
    pub total: f64,
}

/// Samples the time source once per frame and turns the delta into a
/// `TimeStep`, enforcing the configured frame-rate bounds.
pub struct TimeSystem {
    source: Box<dyn TimeSource>,
    params: TimeParams,
    last: Option<Duration>,
    total: f64,
}

impl TimeSystem {
    pub fn new(source: Box<dyn TimeSource>, params: TimeParams) -> Self {
        TimeSystem {
            source,
            params,
            last: None,
            total: 0.0,
        }
    }

    /// Closes the current frame. The very first call yields a zero-length
    /// step, since there is no previous frame to measure against.
    pub fn advance(&mut self) -> TimeStep {
        let mut now = self.source.elapsed();
        let last = self.last.unwrap_or(now);
        let mut frame = now.checked_sub(last).unwrap_or_default();

        if self.params.max_fps > 0 {
            let span = Duration::from_micros(1_000_000 / u64::from(self.params.max_fps));
            if frame < span {
                thread::sleep(span - frame);
                now = self.source.elapsed();
                frame = now.checked_sub(last).unwrap_or_default();
            }
        }

        self.last = Some(now);

        let mut dt = duration_as_secs(frame);
        if self.params.min_fps > 0 {
            let ceiling = 1.0 / self.params.min_fps as f32;
            if dt > ceiling {
                dt = ceiling;
            }
        }

        self.total += f64::from(dt);

        TimeStep {
            unscaled_dt: dt,
            total: self.total,
        }
    }
}

fn duration_as_secs(duration: Duration) -> f32 {
    duration.as_secs() as f32 + duration.subsec_nanos() as f32 / 1_000_000_000.0
}
