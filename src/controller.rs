//! Timer lifecycle: start, pause, reset, pin, dismiss, edit, delete.
//!
//! The controller owns the [`TimerStore`] and the tick/restart handles of
//! every timer. Each mutation is written back to storage straight away and
//! recorded as a [`TimerEvent`] for the presentation layer to drain with
//! [`TimerController::take_events`].

use std::collections::HashMap;

use log::{debug, info, warn};

use crate::clock::Clock;
use crate::config::{ControllerConfig, DEFAULT_TIMER_TITLE, EXPIRY_THRESHOLD_MS};
use crate::persistence::Persistence;
use crate::scheduler::{Scheduler, Wakeup};
use crate::storage::KeyValueStore;
use crate::store::{Collection, TimerStore};
use crate::timer::{DraftKind, EndAction, Timer, TimerDraft, TimerKind};
use crate::TimerError;

/// What changed, for whoever renders the timers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TimerEvent {
    /// Remaining time, running, pinned or finished state of `id` changed.
    Changed(String),
    /// `id` ran out; the front end should play `sound`.
    Expired { id: String, sound: String },
    Removed(String),
    PinMoved(Option<String>),
}

/// UI actions that address a single timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerAction {
    Start,
    Pause,
    Reset,
    Pin,
    Dismiss,
    Delete,
}

pub struct TimerController<S, C, Sch: Scheduler> {
    config: ControllerConfig,
    store: TimerStore,
    persistence: Persistence<S>,
    clock: C,
    scheduler: Sch,
    ticks: HashMap<String, Sch::Handle>,
    restarts: HashMap<String, Sch::Handle>,
    events: Vec<TimerEvent>,
}

impl<S, C, Sch> TimerController<S, C, Sch>
where
    S: KeyValueStore,
    C: Clock,
    Sch: Scheduler,
{
    /// Load saved timers and restore the pin invariant.
    ///
    /// Ticks are not armed here; call [`Self::resume_running`] once the
    /// scheduler's dispatch can reach the controller.
    pub fn load(config: ControllerConfig, storage: S, clock: C, scheduler: Sch) -> Self {
        let now = clock.now_ms();
        let mut persistence = Persistence::new(storage, &config);
        let mut store = persistence.load(&config.presets, now);
        if store.ensure_pinned() {
            persistence.save_all(&store, now);
        }
        TimerController {
            config,
            store,
            persistence,
            clock,
            scheduler,
            ticks: HashMap::new(),
            restarts: HashMap::new(),
            events: Vec::new(),
        }
    }

    pub fn store(&self) -> &TimerStore {
        &self.store
    }

    pub fn find_by_id(&self, id: &str) -> Option<&Timer> {
        self.store.find_by_id(id)
    }

    pub fn pinned(&self) -> Option<&Timer> {
        self.store.pinned()
    }

    pub fn storage(&self) -> &S {
        self.persistence.storage()
    }

    pub fn is_ticking(&self, id: &str) -> bool {
        self.ticks.contains_key(id)
    }

    pub fn restart_pending(&self, id: &str) -> bool {
        self.restarts.contains_key(id)
    }

    /// Events recorded since the last call, oldest first.
    pub fn take_events(&mut self) -> Vec<TimerEvent> {
        std::mem::take(&mut self.events)
    }

    /// Arm ticks for timers that were still running at load time, and the
    /// grace restart of auto-restarting countdowns saved while finished.
    pub fn resume_running(&mut self) {
        for id in self.store.running_ids() {
            if !self.ticks.contains_key(&id) {
                debug!("Resuming tick for '{}'", id);
                self.arm_tick(&id);
            }
        }

        let awaiting_restart: Vec<String> = self
            .store
            .iter()
            .filter(|timer| {
                timer.is_finished
                    && timer.is_countdown()
                    && timer.end_action() == EndAction::Restart
            })
            .filter(|timer| !self.restarts.contains_key(&timer.id))
            .map(|timer| timer.id.clone())
            .collect();
        for id in awaiting_restart {
            debug!("Re-arming restart for '{}'", id);
            let handle = self
                .scheduler
                .once(Wakeup::Restart(id.clone()), self.config.restart_grace_ms);
            self.restarts.insert(id, handle);
        }
    }

    pub fn apply(&mut self, id: &str, action: TimerAction) -> Result<bool, TimerError> {
        match action {
            TimerAction::Start => self.start(id),
            TimerAction::Pause => self.pause(id),
            TimerAction::Reset => self.reset(id),
            TimerAction::Pin => self.pin(id),
            TimerAction::Dismiss => self.dismiss(id),
            TimerAction::Delete => self.delete(id).map(|_| true),
        }
    }

    /// Route a scheduler wakeup to the matching handler.
    pub fn handle(&mut self, wakeup: Wakeup) {
        match wakeup {
            Wakeup::Tick(id) => self.tick(&id),
            Wakeup::Restart(id) => self.restart_after_grace(&id),
        }
    }

    pub fn start(&mut self, id: &str) -> Result<bool, TimerError> {
        let now = self.clock.now_ms();
        let timer = self.timer_mut(id)?;
        if timer.is_running {
            return Ok(false);
        }
        if !timer.can_start(now) {
            debug!("Not starting '{}': nothing left to count", id);
            return Ok(false);
        }
        if timer.kind == TimerKind::CountToDate {
            timer.remaining = timer.remaining_until_target(now);
        }
        timer.is_running = true;
        timer.is_finished = false;

        self.restarts.remove(id);
        self.arm_tick(id);
        self.commit(id);
        Ok(true)
    }

    pub fn pause(&mut self, id: &str) -> Result<bool, TimerError> {
        let timer = self.timer_mut(id)?;
        if !timer.is_running {
            return Ok(false);
        }
        timer.is_running = false;
        self.ticks.remove(id);
        self.commit(id);
        Ok(true)
    }

    /// Stop the timer and put a countdown back to its full duration.
    /// Count-to-date timers are only stopped.
    pub fn reset(&mut self, id: &str) -> Result<bool, TimerError> {
        let timer = self.timer_mut(id)?;
        let before = timer.clone();
        timer.is_running = false;
        timer.restore_duration();
        let changed = *timer != before || self.has_handles(id);

        self.cancel_handles(id);
        if changed {
            self.commit(id);
        }
        Ok(changed)
    }

    pub fn pin(&mut self, id: &str) -> Result<bool, TimerError> {
        let previous = self.store.pinned().map(|timer| timer.id.clone());
        if previous.as_deref() == Some(id) {
            return Ok(false);
        }
        if !self.store.set_pinned(id) {
            return Err(TimerError::UnknownTimer(id.to_string()));
        }
        self.persistence.save_all(&self.store, self.clock.now_ms());
        if let Some(previous) = previous {
            self.events.push(TimerEvent::Changed(previous));
        }
        self.events.push(TimerEvent::Changed(id.to_string()));
        self.events.push(TimerEvent::PinMoved(Some(id.to_string())));
        Ok(true)
    }

    /// Acknowledge a finished timer: cancel a pending auto-restart and put
    /// it back to its starting state.
    pub fn dismiss(&mut self, id: &str) -> Result<bool, TimerError> {
        let pending = self.restarts.contains_key(id);
        let timer = self.timer_mut(id)?;
        if !timer.is_finished && !pending {
            return Ok(false);
        }
        timer.is_finished = false;
        timer.restore_duration();

        self.restarts.remove(id);
        self.commit(id);
        Ok(true)
    }

    /// Remove a user timer. Presets cannot be deleted.
    pub fn delete(&mut self, id: &str) -> Result<Timer, TimerError> {
        match self.store.collection_of(id) {
            None => return Err(TimerError::UnknownTimer(id.to_string())),
            Some(Collection::Default) => return Err(TimerError::NotDeletable(id.to_string())),
            Some(Collection::User) => {}
        }
        self.cancel_handles(id);
        let removed = self
            .store
            .remove_user(id)
            .ok_or_else(|| TimerError::UnknownTimer(id.to_string()))?;

        self.events.push(TimerEvent::Removed(id.to_string()));
        if removed.is_pinned {
            self.store.ensure_pinned();
            let pinned = self.store.pinned().map(|timer| timer.id.clone());
            if let Some(pinned) = &pinned {
                self.events.push(TimerEvent::Changed(pinned.clone()));
            }
            self.events.push(TimerEvent::PinMoved(pinned));
        }
        self.persistence.save_all(&self.store, self.clock.now_ms());
        info!("Deleted timer '{}'", removed.title);
        Ok(removed)
    }

    /// Create a user timer from `draft` and return its id. Count-to-date
    /// timers start counting right away.
    pub fn add(&mut self, draft: TimerDraft) -> Result<String, TimerError> {
        let now = self.clock.now_ms();
        let draft = validate_draft(draft, now)?;
        let id = self.fresh_id(now);

        let mut timer = Timer::countdown(id.clone(), "", 0, EndAction::Stop, "");
        timer.apply_draft(&draft, now);
        self.store.push_user(timer);
        info!("Added timer '{}' ({})", draft.title, id);

        if self.store.ensure_pinned() {
            let pinned = self.store.pinned().map(|timer| timer.id.clone());
            self.events.push(TimerEvent::PinMoved(pinned));
            self.persistence.save(&self.store, Collection::Default, now);
        }
        self.commit(&id);

        if let DraftKind::CountToDate { .. } = draft.kind {
            self.start(&id)?;
        }
        Ok(id)
    }

    /// Replace a timer's settings. Any active tick is cancelled; countdowns
    /// stay paused at their new duration while count-to-date timers start
    /// over against the new target.
    pub fn edit(&mut self, id: &str, draft: TimerDraft) -> Result<(), TimerError> {
        let now = self.clock.now_ms();
        let draft = validate_draft(draft, now)?;
        self.timer_mut(id)?.apply_draft(&draft, now);
        self.cancel_handles(id);
        self.commit(id);

        if let DraftKind::CountToDate { .. } = draft.kind {
            self.start(id)?;
        }
        Ok(())
    }

    /// Reorder user timers to follow `ids`.
    pub fn reorder(&mut self, ids: &[String]) -> bool {
        if !self.store.reorder_user(ids) {
            return false;
        }
        self.persistence
            .save(&self.store, Collection::User, self.clock.now_ms());
        true
    }

    fn tick(&mut self, id: &str) {
        let now = self.clock.now_ms();
        let tick_ms = u64::from(self.config.tick_ms);
        let Some(timer) = self.store.find_by_id_mut(id) else {
            self.ticks.remove(id);
            return;
        };
        if !timer.is_running {
            self.ticks.remove(id);
            return;
        }
        timer.remaining = match timer.kind {
            TimerKind::Countdown => timer.remaining.saturating_sub(tick_ms),
            TimerKind::CountToDate => timer.remaining_until_target(now),
        };
        if timer.remaining < EXPIRY_THRESHOLD_MS {
            self.finish(id);
        } else {
            self.commit(id);
        }
    }

    fn finish(&mut self, id: &str) {
        self.ticks.remove(id);
        let Some(timer) = self.store.find_by_id_mut(id) else {
            return;
        };
        timer.remaining = 0;
        timer.is_running = false;
        timer.is_finished = true;
        let end_action = timer.end_action();
        info!("Timer '{}' finished ({:?})", timer.title, end_action);
        self.events.push(TimerEvent::Expired {
            id: id.to_string(),
            sound: timer.sound.clone(),
        });

        if end_action == EndAction::Restart {
            let handle = self
                .scheduler
                .once(Wakeup::Restart(id.to_string()), self.config.restart_grace_ms);
            self.restarts.insert(id.to_string(), handle);
        }
        self.commit(id);
    }

    fn restart_after_grace(&mut self, id: &str) {
        if self.restarts.remove(id).is_none() {
            return;
        }
        let Some(timer) = self.store.find_by_id_mut(id) else {
            return;
        };
        timer.restore_duration();
        if let Err(err) = self.start(id) {
            warn!("Auto-restart of '{}' failed: {}", id, err);
        }
    }

    fn arm_tick(&mut self, id: &str) {
        let handle = self
            .scheduler
            .repeat(Wakeup::Tick(id.to_string()), self.config.tick_ms);
        self.ticks.insert(id.to_string(), handle);
    }

    fn has_handles(&self, id: &str) -> bool {
        self.ticks.contains_key(id) || self.restarts.contains_key(id)
    }

    fn cancel_handles(&mut self, id: &str) {
        self.ticks.remove(id);
        self.restarts.remove(id);
    }

    fn timer_mut(&mut self, id: &str) -> Result<&mut Timer, TimerError> {
        self.store
            .find_by_id_mut(id)
            .ok_or_else(|| TimerError::UnknownTimer(id.to_string()))
    }

    /// Persist the collection holding `id` and record the change.
    fn commit(&mut self, id: &str) {
        if let Some(collection) = self.store.collection_of(id) {
            self.persistence
                .save(&self.store, collection, self.clock.now_ms());
        }
        self.events.push(TimerEvent::Changed(id.to_string()));
    }

    fn fresh_id(&self, now: u64) -> String {
        loop {
            let id = format!("timer-{}-{:08x}", now, rand::random::<u32>());
            if !self.store.contains(&id) {
                return id;
            }
        }
    }
}

fn validate_draft(mut draft: TimerDraft, now: u64) -> Result<TimerDraft, TimerError> {
    match draft.kind {
        DraftKind::Countdown { duration_ms, .. } if duration_ms == 0 => {
            return Err(TimerError::InvalidDuration)
        }
        DraftKind::CountToDate { target_date } if target_date <= now => {
            return Err(TimerError::TargetInPast {
                target: target_date,
                now,
            })
        }
        _ => {}
    }
    let title = draft.title.trim();
    draft.title = if title.is_empty() {
        DEFAULT_TIMER_TITLE.to_string()
    } else {
        title.to_string()
    };
    Ok(draft)
}
