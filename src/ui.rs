use timer_core::{dial_sector, Remaining, Sector};

use crate::config::DialPalette;
use crate::error::Result;
use crate::pomodoro::Mode;

/// Text and control state shown next to the dial.
pub trait DisplaySink {
    /// Both values arrive zero-padded to two digits.
    fn show_time(&mut self, minutes: &str, seconds: &str);
    /// Mark `mode` as the active selector.
    fn show_mode(&mut self, mode: Mode);
    /// Reflect whether the countdown runs on the start/stop control.
    fn show_running(&mut self, running: bool);
}

/// Minimal 2D path API of a canvas context.
///
/// Angles are radians; positive sweeps run clockwise because y grows
/// downward.
pub trait DrawSurface {
    fn size(&self) -> (f64, f64);
    fn clear(&mut self);
    fn save(&mut self);
    fn restore(&mut self);
    fn begin_path(&mut self);
    fn translate(&mut self, x: f64, y: f64) -> Result<()>;
    fn rotate(&mut self, angle: f64) -> Result<()>;
    fn arc(
        &mut self,
        x: f64,
        y: f64,
        radius: f64,
        start: f64,
        end: f64,
        anticlockwise: bool,
    ) -> Result<()>;
    fn line_to(&mut self, x: f64, y: f64);
    fn set_fill(&mut self, color: &str);
    fn fill(&mut self);
}

pub fn update_clock<D: DisplaySink>(display: &mut D, remaining: &Remaining) {
    let (minutes, seconds) = remaining.display_parts();
    display.show_time(&minutes, &seconds);
}

/// Paint the elapsed sector for `mode`, starting at 12 o'clock and sweeping
/// clockwise by `fraction` of a full turn.
pub fn draw_dial<P: DrawSurface>(
    surface: &mut P,
    palette: &DialPalette,
    mode: Mode,
    fraction: f64,
) -> Result<Sector> {
    surface.clear();
    let (width, height) = surface.size();
    let sector = dial_sector(width, height, fraction);

    surface.save();
    let painted = paint_sector(surface, &sector, palette.fill_for(mode));
    surface.restore();
    painted.map(|()| sector)
}

fn paint_sector<P: DrawSurface>(surface: &mut P, sector: &Sector, color: &str) -> Result<()> {
    surface.begin_path();
    surface.translate(sector.center.0, sector.center.1)?;
    surface.rotate(sector.rotation)?;
    surface.set_fill(color);
    surface.arc(
        0.0,
        0.0,
        sector.radius,
        sector.start_angle,
        sector.end_angle,
        false,
    )?;
    surface.line_to(0.0, 0.0);
    surface.fill();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::testing::{DrawCall, RecordingDisplay, RecordingSurface};
    use pretty_assertions::assert_eq;
    use std::f64::consts::PI;
    use timer_core::to_radians;

    #[test]
    fn clock_is_zero_padded() {
        let mut display = RecordingDisplay::default();
        update_clock(&mut display, &Remaining::full(5));
        assert_eq!(display.time(), Some(("05", "00")));
    }

    #[test]
    fn half_dial_draw_sequence() {
        let mut surface = RecordingSurface::new(375.0, 375.0);
        let palette = DialPalette::default();
        let sector = draw_dial(&mut surface, &palette, Mode::Pomodoro, 0.5).unwrap();

        assert!((sector.sweep() - PI).abs() < 1e-12);
        assert_eq!(
            surface.calls,
            vec![
                DrawCall::Clear,
                DrawCall::Save,
                DrawCall::BeginPath,
                DrawCall::Translate(187.5, 187.5),
                DrawCall::Rotate(to_radians(-90.0)),
                DrawCall::SetFill("rgba(0, 220, 0, 0.5)".to_string()),
                DrawCall::Arc {
                    radius: 281.25,
                    start: 0.0,
                    end: to_radians(180.0),
                    anticlockwise: false,
                },
                DrawCall::LineTo(0.0, 0.0),
                DrawCall::Fill,
                DrawCall::Restore,
            ]
        );
    }

    #[test]
    fn color_follows_mode() {
        let mut surface = RecordingSurface::new(375.0, 375.0);
        let palette = DialPalette::default();
        draw_dial(&mut surface, &palette, Mode::LongBreak, 0.1).unwrap();
        assert_eq!(surface.last_fill(), Some("rgba(0, 0, 220, 0.5)"));
    }

    #[test]
    fn missing_color_uses_fallback() {
        let mut surface = RecordingSurface::new(375.0, 375.0);
        let mut palette = DialPalette::default();
        palette.colors.clear();
        palette.fallback = "black".to_string();
        draw_dial(&mut surface, &palette, Mode::ShortBreak, 0.3).unwrap();
        assert_eq!(surface.last_fill(), Some("black"));
    }

    #[test]
    fn failed_transform_still_restores() {
        let mut surface = RecordingSurface::new(375.0, 375.0);
        surface.fail_transforms = true;
        let err = draw_dial(&mut surface, &DialPalette::default(), Mode::Pomodoro, 0.2)
            .unwrap_err();
        assert!(matches!(err, Error::Surface(_)));
        assert_eq!(surface.calls.last(), Some(&DrawCall::Restore));
    }
}
