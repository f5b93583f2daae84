use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::pomodoro::Mode;
use crate::storage::PersistentStore;

const KEY_SETTINGS: &str = "pomodoro_settings";

// Two-digit minute display cannot show an hour or more.
const MAX_MODE_MINUTES: u32 = 59;

pub const DEFAULT_FILL: &str = "rgba(0, 220, 0, 0.5)";

/// Mode durations in minutes and the long break cadence.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TimerConfig {
    pub pomodoro: u32,
    pub short_break: u32,
    pub long_break: u32,
    pub long_break_interval: u32,
}

impl Default for TimerConfig {
    fn default() -> Self {
        Self {
            pomodoro: 25,
            short_break: 5,
            long_break: 15,
            long_break_interval: 4,
        }
    }
}

impl TimerConfig {
    pub fn minutes_for(&self, mode: Mode) -> u32 {
        match mode {
            Mode::Pomodoro => self.pomodoro,
            Mode::ShortBreak => self.short_break,
            Mode::LongBreak => self.long_break,
        }
    }

    pub fn whole_secs(&self, mode: Mode) -> u64 {
        u64::from(self.minutes_for(mode)) * 60
    }

    pub fn validate(&self) -> Result<()> {
        for mode in Mode::ALL {
            let minutes = self.minutes_for(mode);
            if minutes == 0 {
                return Err(Error::Configuration(format!(
                    "{} duration must be at least one minute",
                    mode.as_str()
                )));
            }
            if minutes > MAX_MODE_MINUTES {
                return Err(Error::Configuration(format!(
                    "{} duration of {} minutes exceeds {} minutes",
                    mode.as_str(),
                    minutes,
                    MAX_MODE_MINUTES
                )));
            }
        }
        if self.long_break_interval == 0 {
            return Err(Error::Configuration(
                "longBreakInterval must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// Pixel size of the dial canvas.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CanvasConfig {
    pub width: u32,
    pub height: u32,
}

impl Default for CanvasConfig {
    fn default() -> Self {
        Self {
            width: 375,
            height: 375,
        }
    }
}

/// Dial fill colors keyed by mode name.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DialPalette {
    pub colors: BTreeMap<String, String>,
    pub fallback: String,
}

impl Default for DialPalette {
    fn default() -> Self {
        let colors = [
            (Mode::Pomodoro, "rgba(0, 220, 0, 0.5)"),
            (Mode::ShortBreak, "rgba(0, 220, 220, 0.5)"),
            (Mode::LongBreak, "rgba(0, 0, 220, 0.5)"),
        ]
        .into_iter()
        .map(|(mode, color)| (mode.as_str().to_string(), color.to_string()))
        .collect();
        Self {
            colors,
            fallback: DEFAULT_FILL.to_string(),
        }
    }
}

impl DialPalette {
    pub fn fill_for(&self, mode: Mode) -> &str {
        match self.colors.get(mode.as_str()) {
            Some(color) => color,
            None => {
                log::warn!(
                    "no dial color for mode {}, using {}",
                    mode.as_str(),
                    self.fallback
                );
                &self.fallback
            }
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WidgetConfig {
    pub timer: TimerConfig,
    pub canvas: CanvasConfig,
    pub palette: DialPalette,
}

impl WidgetConfig {
    pub fn validate(&self) -> Result<()> {
        self.timer.validate()?;
        if self.canvas.width == 0 || self.canvas.height == 0 {
            return Err(Error::Configuration(format!(
                "canvas must not be empty, got {}x{}",
                self.canvas.width, self.canvas.height
            )));
        }
        Ok(())
    }

    /// Parse and validate settings. Missing fields take their defaults.
    pub fn from_json(raw: &str) -> Result<Self> {
        let config = serde_json::from_str::<WidgetConfig>(raw)
            .map_err(|e| Error::Configuration(format!("unreadable settings: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Load settings from `store`, falling back to defaults when none are saved.
    pub fn load<S: PersistentStore>(store: &S) -> Result<Self> {
        match store.get(KEY_SETTINGS)? {
            Some(raw) => Self::from_json(&raw),
            None => Ok(WidgetConfig::default()),
        }
    }

    pub fn save<S: PersistentStore>(&self, store: &mut S) -> Result<()> {
        self.validate()?;
        let raw = serde_json::to_string(self)?;
        store.set(KEY_SETTINGS, &raw)
    }
}
