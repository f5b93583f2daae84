use std::fmt;
use std::str::FromStr;

use timer_core::{compute_remaining, elapsed_fraction, Remaining};

use crate::config::TimerConfig;
use crate::error::Error;

#[derive(Clone, Copy, PartialEq, Eq, Debug, Hash)]
pub enum Mode {
    Pomodoro,
    ShortBreak,
    LongBreak,
}

impl Mode {
    pub const ALL: [Mode; 3] = [Mode::Pomodoro, Mode::ShortBreak, Mode::LongBreak];

    /// Name used in markup (`data-mode`), stored settings and CSS variables.
    pub fn as_str(&self) -> &'static str {
        match self {
            Mode::Pomodoro => "pomodoro",
            Mode::ShortBreak => "shortBreak",
            Mode::LongBreak => "longBreak",
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Mode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Mode::ALL
            .into_iter()
            .find(|mode| mode.as_str() == s)
            .ok_or_else(|| Error::InvalidMode(s.to_string()))
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct TimerState {
    pub mode: Mode,
    pub whole_secs: u64,
    pub remaining: Remaining,
    pub session_count: u32,
}

impl TimerState {
    /// State after the initial switch into `Pomodoro`.
    pub fn new(config: &TimerConfig) -> Self {
        let mut state = Self {
            mode: Mode::Pomodoro,
            whole_secs: 0,
            remaining: Remaining::default(),
            session_count: 0,
        };
        state.switch_mode(Mode::Pomodoro, config);
        state
    }

    pub fn switch_mode(&mut self, mode: Mode, config: &TimerConfig) {
        let minutes = u64::from(config.minutes_for(mode));
        self.mode = mode;
        self.whole_secs = minutes * 60;
        self.remaining = Remaining::full(minutes);
    }

    /// Recompute the remaining time toward `end_ms` as seen at `now_ms`.
    pub fn update_from(&mut self, end_ms: u64, now_ms: u64) -> Remaining {
        self.remaining = compute_remaining(end_ms, now_ms, self.whole_secs);
        self.remaining
    }

    /// Count a pomodoro as it starts. Breaks are not counted.
    pub fn count_session_start(&mut self) {
        if self.mode == Mode::Pomodoro {
            self.session_count += 1;
        }
    }

    /// Mode that follows the current one once it runs out.
    pub fn next_mode(&self, config: &TimerConfig) -> Mode {
        match self.mode {
            Mode::Pomodoro => {
                if self.session_count % config.long_break_interval == 0 {
                    Mode::LongBreak
                } else {
                    Mode::ShortBreak
                }
            }
            Mode::ShortBreak | Mode::LongBreak => Mode::Pomodoro,
        }
    }

    pub fn is_finished(&self) -> bool {
        self.remaining.total == 0
    }

    pub fn elapsed_fraction(&self) -> f64 {
        elapsed_fraction(self.remaining.elapsed, self.whole_secs)
    }
}
