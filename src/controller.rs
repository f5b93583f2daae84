use std::mem;

use timer_core::{format_mmss, Remaining};

use crate::clock::{Clock, TickHandle, TickScheduler, TICK_PERIOD};
use crate::config::WidgetConfig;
use crate::error::Result;
use crate::pomodoro::{Mode, TimerState};
use crate::ui::{draw_dial, update_clock, DisplaySink, DrawSurface};

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum RunState {
    Idle,
    Running { ends_at_ms: u64, tick: TickHandle },
}

/// What a single tick did.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum TickOutcome {
    /// No countdown was running; nothing happened.
    Idle,
    Counting(Remaining),
    /// The countdown ran out and the next mode started counting.
    Chained { finished: Mode, next: Mode },
}

/// Owns the timer state and the single recurring tick that drives it.
pub struct TimerController<C, S, D, P>
where
    C: Clock,
    S: TickScheduler,
    D: DisplaySink,
    P: DrawSurface,
{
    config: WidgetConfig,
    clock: C,
    pump: S,
    display: D,
    surface: P,
    state: TimerState,
    run: RunState,
}

impl<C, S, D, P> TimerController<C, S, D, P>
where
    C: Clock,
    S: TickScheduler,
    D: DisplaySink,
    P: DrawSurface,
{
    /// Validate `config` and switch into pomodoro mode, idle.
    pub fn new(config: WidgetConfig, clock: C, pump: S, display: D, surface: P) -> Result<Self> {
        config.validate()?;
        let state = TimerState::new(&config.timer);
        let mut controller = Self {
            config,
            clock,
            pump,
            display,
            surface,
            state,
            run: RunState::Idle,
        };
        controller.display.show_running(false);
        controller.show_switched()?;
        Ok(controller)
    }

    pub fn state(&self) -> &TimerState {
        &self.state
    }

    pub fn run_state(&self) -> RunState {
        self.run
    }

    pub fn is_running(&self) -> bool {
        matches!(self.run, RunState::Running { .. })
    }

    pub fn config(&self) -> &WidgetConfig {
        &self.config
    }

    #[cfg(any(test, feature = "testing"))]
    pub fn pump(&self) -> &S {
        &self.pump
    }

    #[cfg(any(test, feature = "testing"))]
    pub fn display(&self) -> &D {
        &self.display
    }

    #[cfg(any(test, feature = "testing"))]
    pub fn surface(&self) -> &P {
        &self.surface
    }

    /// Begin counting down what is left of the current mode.
    ///
    /// Starting a pomodoro counts it as a session right away. Does nothing
    /// while already running.
    pub fn start(&mut self) -> Result<()> {
        if self.is_running() {
            log::debug!("start ignored, {} already running", self.state.mode);
            return Ok(());
        }
        self.begin_countdown()
    }

    /// Cancel the tick and keep the remaining time where it is.
    pub fn stop(&mut self) {
        self.stop_pump();
        self.display.show_running(false);
    }

    /// Start/stop button.
    pub fn toggle(&mut self) -> Result<()> {
        if self.is_running() {
            self.stop();
            Ok(())
        } else {
            self.start()
        }
    }

    /// Mode selector by markup name. Unknown names leave everything as is.
    pub fn select_mode(&mut self, name: &str) -> Result<()> {
        let mode = name.parse::<Mode>().inspect_err(|e| log::warn!("{}", e))?;
        self.select(mode)
    }

    /// Switch to `mode` and wait, idle, for an explicit start.
    pub fn select(&mut self, mode: Mode) -> Result<()> {
        self.stop();
        self.state.switch_mode(mode, &self.config.timer);
        log::debug!("switched to {}", mode);
        self.show_switched()
    }

    /// Apply new settings. The countdown stops and the current mode restarts
    /// with its new duration.
    pub fn reconfigure(&mut self, config: WidgetConfig) -> Result<()> {
        config.validate()?;
        self.stop();
        self.config = config;
        let mode = self.state.mode;
        self.state.switch_mode(mode, &self.config.timer);
        self.show_switched()
    }

    /// Handle one firing of the recurring tick.
    pub fn tick(&mut self) -> Result<TickOutcome> {
        let ends_at_ms = match self.run {
            RunState::Running { ends_at_ms, .. } => ends_at_ms,
            RunState::Idle => return Ok(TickOutcome::Idle),
        };

        let remaining = self.state.update_from(ends_at_ms, self.clock.now_ms());
        let painted = self.repaint();

        if !self.state.is_finished() {
            painted?;
            return Ok(TickOutcome::Counting(remaining));
        }

        let finished = self.state.mode;
        self.stop_pump();
        let next = self.state.next_mode(&self.config.timer);
        self.state.switch_mode(next, &self.config.timer);
        log::info!(
            "{} finished after {} sessions, starting {}",
            finished,
            self.state.session_count,
            next
        );
        let switched = self.show_switched();
        self.begin_countdown()?;
        painted.and(switched)?;
        Ok(TickOutcome::Chained { finished, next })
    }

    fn begin_countdown(&mut self) -> Result<()> {
        self.stop_pump();
        let tick = self.pump.schedule(TICK_PERIOD)?;
        self.state.count_session_start();
        let ends_at_ms = self.clock.now_ms() + self.state.remaining.total * 1000;
        self.run = RunState::Running { ends_at_ms, tick };
        self.display.show_running(true);
        log::debug!(
            "counting down {} ({} left, session {})",
            self.state.mode,
            format_mmss(self.state.remaining.total),
            self.state.session_count
        );
        Ok(())
    }

    fn stop_pump(&mut self) {
        if let RunState::Running { tick, .. } = mem::replace(&mut self.run, RunState::Idle) {
            self.pump.cancel(tick);
        }
    }

    fn show_switched(&mut self) -> Result<()> {
        self.display.show_mode(self.state.mode);
        self.repaint()
    }

    fn repaint(&mut self) -> Result<()> {
        update_clock(&mut self.display, &self.state.remaining);
        draw_dial(
            &mut self.surface,
            &self.config.palette,
            self.state.mode,
            self.state.elapsed_fraction(),
        )?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::testing::{ManualClock, ManualPump, RecordingDisplay, RecordingSurface};
    use std::time::Duration;

    type TestController =
        TimerController<ManualClock, ManualPump, RecordingDisplay, RecordingSurface>;

    fn controller() -> (ManualClock, TestController) {
        let clock = ManualClock::starting_at(1_000_000);
        let controller = TimerController::new(
            WidgetConfig::default(),
            clock.clone(),
            ManualPump::default(),
            RecordingDisplay::default(),
            RecordingSurface::new(375.0, 375.0),
        )
        .unwrap();
        (clock, controller)
    }

    fn secs(n: u64) -> Duration {
        Duration::from_secs(n)
    }

    #[test]
    fn starts_idle_in_pomodoro() {
        let (_, ctl) = controller();
        assert_eq!(ctl.run_state(), RunState::Idle);
        assert_eq!(ctl.state().mode, Mode::Pomodoro);
        assert_eq!(ctl.state().remaining.total, 1500);
        assert_eq!(ctl.state().session_count, 0);
        assert_eq!(ctl.display().time(), Some(("25", "00")));
        assert_eq!(ctl.display().mode(), Some(Mode::Pomodoro));
        assert_eq!(ctl.display().is_running(), Some(false));
        assert!(!ctl.pump().is_active());
    }

    #[test]
    fn rejects_invalid_config() {
        let mut config = WidgetConfig::default();
        config.timer.pomodoro = 0;
        let result = TimerController::new(
            config,
            ManualClock::default(),
            ManualPump::default(),
            RecordingDisplay::default(),
            RecordingSurface::new(375.0, 375.0),
        );
        assert!(matches!(result, Err(Error::Configuration(_))));
    }

    #[test]
    fn start_counts_pomodoro_and_sets_end() {
        let (clock, mut ctl) = controller();
        ctl.start().unwrap();
        assert_eq!(ctl.state().session_count, 1);
        assert_eq!(
            ctl.run_state(),
            RunState::Running {
                ends_at_ms: clock.now_ms() + 1_500_000,
                tick: TickHandle(1),
            }
        );
        assert_eq!(ctl.pump().last_period, Some(TICK_PERIOD));
        assert_eq!(ctl.display().is_running(), Some(true));
    }

    #[test]
    fn start_while_running_is_noop() {
        let (_, mut ctl) = controller();
        ctl.start().unwrap();
        ctl.start().unwrap();
        assert_eq!(ctl.state().session_count, 1);
        assert_eq!(ctl.pump().scheduled, 1);
        assert_eq!(ctl.pump().active_count(), 1);
    }

    #[test]
    fn starting_a_break_does_not_count() {
        let (_, mut ctl) = controller();
        ctl.select(Mode::ShortBreak).unwrap();
        ctl.start().unwrap();
        assert_eq!(ctl.state().session_count, 0);
    }

    #[test]
    fn tick_updates_display_and_dial() {
        let (clock, mut ctl) = controller();
        ctl.start().unwrap();
        clock.advance(secs(750));
        let outcome = ctl.tick().unwrap();

        match outcome {
            TickOutcome::Counting(r) => {
                assert_eq!(r.total, 750);
                assert_eq!(r.elapsed, 750);
            }
            other => panic!("unexpected {other:?}"),
        }
        assert_eq!(ctl.display().time(), Some(("12", "30")));
        let sweep = ctl.surface().last_sweep().unwrap();
        assert!((sweep - std::f64::consts::PI).abs() < 1e-9);
    }

    #[test]
    fn tick_while_idle_does_nothing() {
        let (clock, mut ctl) = controller();
        let draws = ctl.surface().clear_count();
        clock.advance(secs(5));
        assert_eq!(ctl.tick().unwrap(), TickOutcome::Idle);
        assert_eq!(ctl.surface().clear_count(), draws);
        assert_eq!(ctl.state().remaining.total, 1500);
    }

    #[test]
    fn stop_keeps_remaining_time() {
        let (clock, mut ctl) = controller();
        ctl.start().unwrap();
        clock.advance(secs(10));
        ctl.tick().unwrap();
        ctl.stop();

        assert_eq!(ctl.run_state(), RunState::Idle);
        assert_eq!(ctl.state().remaining.total, 1490);
        assert!(!ctl.pump().is_active());

        clock.advance(secs(100));
        ctl.start().unwrap();
        match ctl.run_state() {
            RunState::Running { ends_at_ms, .. } => {
                assert_eq!(ends_at_ms, clock.now_ms() + 1_490_000)
            }
            RunState::Idle => panic!("expected running"),
        }
    }

    #[test]
    fn stop_twice_is_harmless() {
        let (_, mut ctl) = controller();
        ctl.start().unwrap();
        ctl.stop();
        ctl.stop();
        assert_eq!(ctl.run_state(), RunState::Idle);
        assert_eq!(ctl.pump().cancelled, 1);
        assert_eq!(ctl.display().is_running(), Some(false));
    }

    #[test]
    fn toggle_flips_run_state() {
        let (_, mut ctl) = controller();
        ctl.toggle().unwrap();
        assert!(ctl.is_running());
        ctl.toggle().unwrap();
        assert!(!ctl.is_running());
    }

    #[test]
    fn finishing_chains_into_next_mode_within_tick() {
        let (clock, mut ctl) = controller();
        ctl.start().unwrap();
        clock.advance(secs(1500));

        let outcome = ctl.tick().unwrap();
        assert_eq!(
            outcome,
            TickOutcome::Chained {
                finished: Mode::Pomodoro,
                next: Mode::ShortBreak,
            }
        );
        assert_eq!(ctl.state().mode, Mode::ShortBreak);
        assert_eq!(ctl.state().remaining.total, 300);
        assert_eq!(
            ctl.run_state(),
            RunState::Running {
                ends_at_ms: clock.now_ms() + 300_000,
                tick: TickHandle(2),
            }
        );
        assert_eq!(ctl.pump().active_count(), 1);
        assert_eq!(ctl.pump().cancelled, 1);
        assert_eq!(ctl.display().mode(), Some(Mode::ShortBreak));
        assert_eq!(ctl.display().time(), Some(("05", "00")));
    }

    #[test]
    fn failed_repaint_still_chains() {
        let (clock, mut ctl) = controller();
        ctl.start().unwrap();
        clock.advance(secs(1500));
        ctl.surface.fail_transforms = true;

        assert!(matches!(ctl.tick(), Err(Error::Surface(_))));
        assert_eq!(ctl.state().mode, Mode::ShortBreak);
        assert!(ctl.is_running());
        assert!(ctl.pump().is_active());
        assert_eq!(ctl.display().is_running(), Some(true));
        assert_eq!(ctl.display().time(), Some(("05", "00")));
    }

    #[test]
    fn late_tick_never_shows_negative_time() {
        let (clock, mut ctl) = controller();
        ctl.select(Mode::ShortBreak).unwrap();
        ctl.start().unwrap();
        clock.advance(secs(400));
        ctl.tick().unwrap();
        assert!(ctl.display().times.iter().all(|(m, s)| !m.starts_with('-') && !s.starts_with('-')));
        assert_eq!(ctl.state().mode, Mode::Pomodoro);
        assert_eq!(ctl.state().session_count, 1);
    }

    #[test]
    fn select_while_running_goes_idle() {
        let (clock, mut ctl) = controller();
        ctl.start().unwrap();
        clock.advance(secs(30));
        ctl.tick().unwrap();

        ctl.select_mode("longBreak").unwrap();
        assert_eq!(ctl.run_state(), RunState::Idle);
        assert!(!ctl.pump().is_active());
        assert_eq!(ctl.state().mode, Mode::LongBreak);
        assert_eq!(ctl.state().whole_secs, 900);
        assert_eq!(ctl.state().remaining.total, 900);
        assert_eq!(ctl.display().time(), Some(("15", "00")));
        assert_eq!(ctl.display().is_running(), Some(false));
    }

    #[test]
    fn invalid_mode_leaves_state_alone() {
        let (clock, mut ctl) = controller();
        ctl.start().unwrap();
        clock.advance(secs(3));
        ctl.tick().unwrap();
        let before = ctl.state().clone();
        let run_before = ctl.run_state();

        let err = ctl.select_mode("siesta").unwrap_err();
        assert!(matches!(err, Error::InvalidMode(ref name) if name == "siesta"));
        assert_eq!(ctl.state(), &before);
        assert_eq!(ctl.run_state(), run_before);
        assert!(ctl.pump().is_active());
    }

    #[test]
    fn scheduler_failure_stays_idle() {
        let (_, mut ctl) = controller();
        let mut pump = ManualPump::default();
        pump.fail_next = true;
        ctl.pump = pump;

        assert!(matches!(ctl.start(), Err(Error::Scheduler(_))));
        assert_eq!(ctl.run_state(), RunState::Idle);
        assert_eq!(ctl.state().session_count, 0);
    }

    #[test]
    fn reconfigure_applies_new_durations() {
        let (_, mut ctl) = controller();
        ctl.start().unwrap();
        let mut config = WidgetConfig::default();
        config.timer.pomodoro = 50;
        ctl.reconfigure(config).unwrap();
        assert!(!ctl.is_running());
        assert_eq!(ctl.state().whole_secs, 3000);

        let mut bad = WidgetConfig::default();
        bad.timer.long_break_interval = 0;
        assert!(matches!(ctl.reconfigure(bad), Err(Error::Configuration(_))));
        assert_eq!(ctl.config().timer.pomodoro, 50);
    }
}
