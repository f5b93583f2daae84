//! Pure countdown and dial geometry logic with no platform dependencies.
//! Testable on host, usable from the browser binding.

use std::f64::consts::PI;

/// Multiplier applied to the canvas width to get the dial diameter.
/// Oversized so the sector still reaches the corners of the canvas.
pub const DIAL_OVERSIZE: f64 = 1.5;

/// Rotation that moves angle zero from 3 o'clock to 12 o'clock.
pub const TWELVE_O_CLOCK_DEG: f64 = -90.0;

/// Time left in a countdown, split for a `MM:SS` display.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub struct Remaining {
    pub total: u64,
    pub minutes: u64,
    pub seconds: u64,
    pub elapsed: u64,
}

impl Remaining {
    /// A fresh countdown of `minutes` with nothing elapsed.
    pub fn full(minutes: u64) -> Self {
        Self {
            total: minutes * 60,
            minutes,
            seconds: 0,
            elapsed: 0,
        }
    }

    /// `(minutes, seconds)` zero-padded to two digits each.
    pub fn display_parts(&self) -> (String, String) {
        (pad2(self.minutes), pad2(self.seconds))
    }
}

/// Compute the time left until `end_ms` as seen at `now_ms`.
///
/// Whole seconds are truncated toward zero, never rounded, and the total is
/// clamped at zero once `now_ms` reaches `end_ms`.
pub fn compute_remaining(end_ms: u64, now_ms: u64, whole_secs: u64) -> Remaining {
    let diff_ms = end_ms as i128 - now_ms as i128;
    let total = (diff_ms / 1000).max(0) as u64;
    Remaining {
        total,
        minutes: (total / 60) % 60,
        seconds: total % 60,
        elapsed: whole_secs.saturating_sub(total),
    }
}

/// Fraction of `whole_secs` already elapsed, clamped to `[0, 1]`.
pub fn elapsed_fraction(elapsed_secs: u64, whole_secs: u64) -> f64 {
    if whole_secs == 0 {
        return 1.0;
    }
    let frac = elapsed_secs as f64 / whole_secs as f64;
    frac.clamp(0.0, 1.0)
}

pub fn to_radians(degrees: f64) -> f64 {
    degrees * PI / 180.0
}

/// Sweep in degrees for an elapsed fraction; one full cycle is 360.
pub fn sweep_degrees(fraction: f64) -> f64 {
    fraction.clamp(0.0, 1.0) * 360.0
}

/// Filled circular sector describing elapsed time on the dial.
///
/// Angles are in radians, measured in the rotated frame (after `rotation`
/// is applied around `center`), sweeping clockwise from `start_angle`.
#[derive(Clone, Copy, PartialEq, Debug)]
pub struct Sector {
    pub center: (f64, f64),
    pub radius: f64,
    pub rotation: f64,
    pub start_angle: f64,
    pub end_angle: f64,
}

impl Sector {
    pub fn sweep(&self) -> f64 {
        self.end_angle - self.start_angle
    }
}

/// Sector for a `width` x `height` canvas at `fraction` elapsed.
pub fn dial_sector(width: f64, height: f64, fraction: f64) -> Sector {
    Sector {
        center: (width / 2.0, height / 2.0),
        radius: width * DIAL_OVERSIZE / 2.0,
        rotation: to_radians(TWELVE_O_CLOCK_DEG),
        start_angle: 0.0,
        end_angle: to_radians(sweep_degrees(fraction)),
    }
}

fn pad2(value: u64) -> String {
    format!("{:02}", value)
}

/// Format whole seconds as "MM:SS"
pub fn format_mmss(total_secs: u64) -> String {
    format!("{:02}:{:02}", total_secs / 60, total_secs % 60)
}
