//! Timer/alarm engine for the dashboard.
//!
//! The crate keeps two ordered collections of timers (user-created and the
//! preset defaults), drives their countdown ticks through a pluggable
//! [`scheduler::Scheduler`], persists both collections to a key-value
//! [`storage::KeyValueStore`] and rebuilds elapsed time after a reload.
//! Exactly one timer is pinned at any time; its remaining time feeds the
//! primary display of the front end.

use std::fmt;

pub mod clock;
pub mod config;
pub mod controller;
pub mod persistence;
pub mod scheduler;
pub mod storage;
pub mod store;
pub mod timer;
pub mod utils;

pub use clock::{Clock, ManualClock, SystemClock};
pub use config::ControllerConfig;
pub use controller::{TimerAction, TimerController, TimerEvent};
pub use persistence::Persistence;
pub use scheduler::{BrowserScheduler, ManualScheduler, Scheduler, Wakeup};
pub use storage::{BrowserStorage, KeyValueStore, MemoryStorage, StorageError};
pub use store::{Collection, TimerStore};
pub use timer::{DraftKind, EndAction, Timer, TimerDraft, TimerKind};

/// Errors returned by controller operations addressing a specific timer.
///
/// State preconditions (starting a running timer, pausing a paused one) are
/// not errors; those calls return `Ok(false)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TimerError {
    UnknownTimer(String),
    /// Preset timers can be edited and reset but never removed.
    NotDeletable(String),
    InvalidDuration,
    TargetInPast {
        target: u64,
        now: u64,
    },
}

impl fmt::Display for TimerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TimerError::UnknownTimer(id) => write!(f, "No timer with id '{}'", id),
            TimerError::NotDeletable(id) => {
                write!(f, "Timer '{}' is a preset and cannot be deleted", id)
            }
            TimerError::InvalidDuration => write!(f, "Timer duration must be greater than zero"),
            TimerError::TargetInPast { target, now } => write!(
                f,
                "Target date {} is not in the future (now is {})",
                target, now
            ),
        }
    }
}

impl std::error::Error for TimerError {}

/// Format a remaining time as `HH:MM:SS`, or `MM:SS` below one hour.
///
/// Partial seconds are truncated, so anything under a second shows `00:00`.
pub fn format_remaining(ms: u64) -> String {
    let total_seconds = ms / 1000;
    let hours = total_seconds / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let seconds = total_seconds % 60;
    if hours > 0 {
        format!("{:02}:{:02}:{:02}", hours, minutes, seconds)
    } else {
        format!("{:02}:{:02}", minutes, seconds)
    }
}
