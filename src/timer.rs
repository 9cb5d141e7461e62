//! Timer entity and the drafts used to create or edit one.
//!
//! The stored layout is a flat JSON object with camelCase keys; fields that
//! only apply to one kind of timer are optional and omitted when absent.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimerKind {
    Countdown,
    CountToDate,
}

/// What a countdown does when it reaches zero.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EndAction {
    #[default]
    Stop,
    Restart,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Timer {
    pub id: String,
    pub title: String,
    #[serde(rename = "type")]
    pub kind: TimerKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub initial_duration: Option<u64>,
    #[serde(default)]
    pub remaining: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_date: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_action: Option<EndAction>,
    #[serde(default)]
    pub sound: String,
    #[serde(default)]
    pub is_running: bool,
    #[serde(default)]
    pub is_pinned: bool,
    #[serde(default)]
    pub is_finished: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_save_time: Option<u64>,
}

impl Timer {
    pub fn countdown(
        id: impl Into<String>,
        title: impl Into<String>,
        duration_ms: u64,
        end_action: EndAction,
        sound: impl Into<String>,
    ) -> Self {
        Timer {
            id: id.into(),
            title: title.into(),
            kind: TimerKind::Countdown,
            initial_duration: Some(duration_ms),
            remaining: duration_ms,
            target_date: None,
            end_action: Some(end_action),
            sound: sound.into(),
            is_running: false,
            is_pinned: false,
            is_finished: false,
            last_save_time: None,
        }
    }

    pub fn count_to_date(
        id: impl Into<String>,
        title: impl Into<String>,
        target_date: u64,
        sound: impl Into<String>,
        now: u64,
    ) -> Self {
        Timer {
            id: id.into(),
            title: title.into(),
            kind: TimerKind::CountToDate,
            initial_duration: None,
            remaining: target_date.saturating_sub(now),
            target_date: Some(target_date),
            end_action: None,
            sound: sound.into(),
            is_running: false,
            is_pinned: false,
            is_finished: false,
            last_save_time: None,
        }
    }

    pub fn is_countdown(&self) -> bool {
        self.kind == TimerKind::Countdown
    }

    /// End action of a countdown; count-to-date timers always stop.
    pub fn end_action(&self) -> EndAction {
        match self.kind {
            TimerKind::Countdown => self.end_action.unwrap_or_default(),
            TimerKind::CountToDate => EndAction::Stop,
        }
    }

    /// Milliseconds left until the target date, clamped at zero.
    pub fn remaining_until_target(&self, now: u64) -> u64 {
        self.target_date
            .map(|target| target.saturating_sub(now))
            .unwrap_or(0)
    }

    /// Whether `start` would have any effect at `now`.
    pub fn can_start(&self, now: u64) -> bool {
        if self.is_running {
            return false;
        }
        match self.kind {
            TimerKind::Countdown => self.remaining > 0,
            TimerKind::CountToDate => self.target_date.is_some_and(|target| target > now),
        }
    }

    /// Put a countdown back to its full duration. Count-to-date timers have
    /// no duration to return to and are left untouched.
    pub fn restore_duration(&mut self) {
        if let (TimerKind::Countdown, Some(initial)) = (self.kind, self.initial_duration) {
            self.remaining = initial;
            self.is_finished = false;
        }
    }

    /// Overwrite the user-editable fields from `draft`. Runtime state is
    /// cleared: the timer ends up paused with a fresh remaining time.
    pub fn apply_draft(&mut self, draft: &TimerDraft, now: u64) {
        self.title = draft.title.clone();
        self.sound = draft.sound.clone();
        self.is_running = false;
        self.is_finished = false;
        match draft.kind {
            DraftKind::Countdown {
                duration_ms,
                end_action,
            } => {
                self.kind = TimerKind::Countdown;
                self.initial_duration = Some(duration_ms);
                self.remaining = duration_ms;
                self.target_date = None;
                self.end_action = Some(end_action);
            }
            DraftKind::CountToDate { target_date } => {
                self.kind = TimerKind::CountToDate;
                self.initial_duration = None;
                self.target_date = Some(target_date);
                self.remaining = target_date.saturating_sub(now);
                self.end_action = None;
            }
        }
    }
}

/// User input for `add` and `edit`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimerDraft {
    pub title: String,
    pub sound: String,
    pub kind: DraftKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DraftKind {
    Countdown { duration_ms: u64, end_action: EndAction },
    CountToDate { target_date: u64 },
}

impl TimerDraft {
    pub fn countdown(title: impl Into<String>, duration_ms: u64, end_action: EndAction) -> Self {
        TimerDraft {
            title: title.into(),
            sound: crate::config::DEFAULT_SOUND.to_string(),
            kind: DraftKind::Countdown {
                duration_ms,
                end_action,
            },
        }
    }

    pub fn count_to_date(title: impl Into<String>, target_date: u64) -> Self {
        TimerDraft {
            title: title.into(),
            sound: crate::config::DEFAULT_SOUND.to_string(),
            kind: DraftKind::CountToDate { target_date },
        }
    }

    pub fn with_sound(mut self, sound: impl Into<String>) -> Self {
        self.sound = sound.into();
        self
    }
}
