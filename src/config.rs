//! Application-level configuration constants.

use crate::timer::{EndAction, Timer};

// Ticking
pub const TICK_MS: u32 = 1_000;
/// A countdown below this many milliseconds counts as expired.
pub const EXPIRY_THRESHOLD_MS: u64 = 1_000;
pub const RESTART_GRACE_MS: u32 = 3_000;

// Storage keys
pub const USER_TIMERS_KEY: &str = "dashboard.timers";
pub const DEFAULT_TIMERS_KEY: &str = "dashboard.defaultTimers";

// New timer defaults
pub const DEFAULT_TIMER_TITLE: &str = "Timer";
pub const DEFAULT_SOUND: &str = "bell";
pub const SOUNDS: [&str; 4] = ["bell", "chime", "kettle", "beep"];

// Input limits
pub const MAX_DURATION_MS: u64 = 100 * 3_600_000;

/// Canonical preset timers, in display order.
pub fn default_presets() -> Vec<Timer> {
    vec![
        Timer::countdown("default-pomodoro", "Pomodoro", 25 * 60_000, EndAction::Stop, "bell"),
        Timer::countdown("default-short-break", "Short break", 5 * 60_000, EndAction::Stop, "chime"),
        Timer::countdown("default-long-break", "Long break", 15 * 60_000, EndAction::Stop, "chime"),
        Timer::countdown("default-tea", "Tea", 3 * 60_000, EndAction::Stop, "kettle"),
        Timer::countdown("default-plank", "Plank", 60_000, EndAction::Restart, "beep"),
    ]
}

/// Runtime settings for a [`crate::TimerController`]. `Default` reads the
/// constants above; tests shorten or rename them as needed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControllerConfig {
    pub tick_ms: u32,
    pub restart_grace_ms: u32,
    pub user_key: String,
    pub default_key: String,
    pub presets: Vec<Timer>,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        ControllerConfig {
            tick_ms: TICK_MS,
            restart_grace_ms: RESTART_GRACE_MS,
            user_key: USER_TIMERS_KEY.to_string(),
            default_key: DEFAULT_TIMERS_KEY.to_string(),
            presets: default_presets(),
        }
    }
}

impl ControllerConfig {
    pub fn with_presets(mut self, presets: Vec<Timer>) -> Self {
        self.presets = presets;
        self
    }
}
