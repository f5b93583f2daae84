use std::time::Duration;

use web_time::{SystemTime, UNIX_EPOCH};

use crate::error::Result;

/// Period of the recurring countdown tick.
pub const TICK_PERIOD: Duration = Duration::from_secs(1);

/// Source of wall-clock time in milliseconds since the Unix epoch.
pub trait Clock {
    fn now_ms(&self) -> u64;
}

/// Reads the system clock; backed by `Date.now()` in the browser.
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_ms(&self) -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or(0)
    }
}

/// Identifies one recurring tick source.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Hash)]
pub struct TickHandle(pub i32);

/// Starts and cancels the recurring tick that drives the controller.
///
/// The scheduler only delivers ticks; the host calls
/// [`TimerController::tick`](crate::controller::TimerController::tick) each
/// time one fires. Cancelling an unknown or already cancelled handle is a
/// no-op.
pub trait TickScheduler {
    fn schedule(&mut self, period: Duration) -> Result<TickHandle>;
    fn cancel(&mut self, handle: TickHandle);
}
