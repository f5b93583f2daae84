//! In-memory capability implementations.
//!
//! These let the controller and painter run on the host without a page:
//! time is stepped by hand, ticks are delivered by the caller, and every
//! display update and draw call is recorded for inspection.

use std::cell::Cell;
use std::rc::Rc;
use std::time::Duration;

use crate::clock::{Clock, TickHandle, TickScheduler};
use crate::error::{Error, Result};
use crate::pomodoro::Mode;
use crate::ui::{DisplaySink, DrawSurface};

/// Clock that only moves when told to. Clones share the same time.
#[derive(Clone, Debug, Default)]
pub struct ManualClock {
    now: Rc<Cell<u64>>,
}

impl ManualClock {
    pub fn starting_at(now_ms: u64) -> Self {
        Self {
            now: Rc::new(Cell::new(now_ms)),
        }
    }

    pub fn advance(&self, by: Duration) {
        self.now.set(self.now.get() + by.as_millis() as u64);
    }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> u64 {
        self.now.get()
    }
}

/// Scheduler that hands out handles without firing anything.
#[derive(Debug, Default)]
pub struct ManualPump {
    active: Vec<TickHandle>,
    next_id: i32,
    pub scheduled: u32,
    pub cancelled: u32,
    pub last_period: Option<Duration>,
    pub fail_next: bool,
}

impl ManualPump {
    pub fn active_count(&self) -> usize {
        self.active.len()
    }

    pub fn is_active(&self) -> bool {
        !self.active.is_empty()
    }
}

impl TickScheduler for ManualPump {
    fn schedule(&mut self, period: Duration) -> Result<TickHandle> {
        if self.fail_next {
            self.fail_next = false;
            return Err(Error::Scheduler("pump unavailable".to_string()));
        }
        self.next_id += 1;
        let handle = TickHandle(self.next_id);
        self.active.push(handle);
        self.scheduled += 1;
        self.last_period = Some(period);
        Ok(handle)
    }

    fn cancel(&mut self, handle: TickHandle) {
        if let Some(pos) = self.active.iter().position(|h| *h == handle) {
            self.active.remove(pos);
            self.cancelled += 1;
        }
    }
}

#[derive(Debug, Default)]
pub struct RecordingDisplay {
    pub times: Vec<(String, String)>,
    pub modes: Vec<Mode>,
    pub running: Vec<bool>,
}

impl RecordingDisplay {
    pub fn time(&self) -> Option<(&str, &str)> {
        self.times.last().map(|(m, s)| (m.as_str(), s.as_str()))
    }

    pub fn mode(&self) -> Option<Mode> {
        self.modes.last().copied()
    }

    pub fn is_running(&self) -> Option<bool> {
        self.running.last().copied()
    }
}

impl DisplaySink for RecordingDisplay {
    fn show_time(&mut self, minutes: &str, seconds: &str) {
        self.times.push((minutes.to_string(), seconds.to_string()));
    }

    fn show_mode(&mut self, mode: Mode) {
        self.modes.push(mode);
    }

    fn show_running(&mut self, running: bool) {
        self.running.push(running);
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum DrawCall {
    Clear,
    Save,
    Restore,
    BeginPath,
    Translate(f64, f64),
    Rotate(f64),
    Arc {
        radius: f64,
        start: f64,
        end: f64,
        anticlockwise: bool,
    },
    LineTo(f64, f64),
    SetFill(String),
    Fill,
}

#[derive(Debug)]
pub struct RecordingSurface {
    width: f64,
    height: f64,
    pub calls: Vec<DrawCall>,
    pub fail_transforms: bool,
}

impl RecordingSurface {
    pub fn new(width: f64, height: f64) -> Self {
        Self {
            width,
            height,
            calls: Vec::new(),
            fail_transforms: false,
        }
    }

    pub fn last_fill(&self) -> Option<&str> {
        self.calls.iter().rev().find_map(|call| match call {
            DrawCall::SetFill(color) => Some(color.as_str()),
            _ => None,
        })
    }

    /// Sweep angle of the most recent arc.
    pub fn last_sweep(&self) -> Option<f64> {
        self.calls.iter().rev().find_map(|call| match call {
            DrawCall::Arc { start, end, .. } => Some(end - start),
            _ => None,
        })
    }

    pub fn clear_count(&self) -> usize {
        self.calls.iter().filter(|c| **c == DrawCall::Clear).count()
    }
}

impl DrawSurface for RecordingSurface {
    fn size(&self) -> (f64, f64) {
        (self.width, self.height)
    }

    fn clear(&mut self) {
        self.calls.push(DrawCall::Clear);
    }

    fn save(&mut self) {
        self.calls.push(DrawCall::Save);
    }

    fn restore(&mut self) {
        self.calls.push(DrawCall::Restore);
    }

    fn begin_path(&mut self) {
        self.calls.push(DrawCall::BeginPath);
    }

    fn translate(&mut self, x: f64, y: f64) -> Result<()> {
        if self.fail_transforms {
            return Err(Error::Surface("translate rejected".to_string()));
        }
        self.calls.push(DrawCall::Translate(x, y));
        Ok(())
    }

    fn rotate(&mut self, angle: f64) -> Result<()> {
        if self.fail_transforms {
            return Err(Error::Surface("rotate rejected".to_string()));
        }
        self.calls.push(DrawCall::Rotate(angle));
        Ok(())
    }

    fn arc(
        &mut self,
        _x: f64,
        _y: f64,
        radius: f64,
        start: f64,
        end: f64,
        anticlockwise: bool,
    ) -> Result<()> {
        self.calls.push(DrawCall::Arc {
            radius,
            start,
            end,
            anticlockwise,
        });
        Ok(())
    }

    fn line_to(&mut self, x: f64, y: f64) {
        self.calls.push(DrawCall::LineTo(x, y));
    }

    fn set_fill(&mut self, color: &str) {
        self.calls.push(DrawCall::SetFill(color.to_string()));
    }

    fn fill(&mut self) {
        self.calls.push(DrawCall::Fill);
    }
}
