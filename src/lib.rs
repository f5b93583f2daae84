#![forbid(unsafe_code)]

//! Pomodoro timer drawn as a filling canvas dial, next to a to-do list kept
//! in local storage.
//!
//! The timer logic runs against small capability traits ([`Clock`],
//! [`TickScheduler`], [`DisplaySink`], [`DrawSurface`], [`PersistentStore`])
//! so it can be stepped on the host. The `wasm32` build binds those traits to
//! the page in the `web` module.

pub mod clock;
pub mod config;
pub mod controller;
pub mod error;
pub mod pomodoro;
pub mod storage;
pub mod todo;
pub mod ui;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

#[cfg(target_arch = "wasm32")]
pub mod web;

pub use clock::{Clock, SystemClock, TickHandle, TickScheduler, TICK_PERIOD};
pub use config::{CanvasConfig, DialPalette, TimerConfig, WidgetConfig};
pub use controller::{RunState, TickOutcome, TimerController};
pub use error::{Error, Result};
pub use pomodoro::{Mode, TimerState};
pub use storage::{MemoryStore, PersistentStore};
pub use timer_core::{Remaining, Sector};
pub use todo::{TodoItem, TodoList};
pub use ui::{DisplaySink, DrawSurface};
