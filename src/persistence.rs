//! Loading and saving the two timer collections.
//!
//! Each collection is a JSON array under its own key. Loading merges saved
//! preset state with the canonical preset list and rebuilds the remaining
//! time of timers that were running when the page went away.

use log::{debug, info, warn};

use crate::config::ControllerConfig;
use crate::storage::KeyValueStore;
use crate::store::{Collection, TimerStore};
use crate::timer::{Timer, TimerKind};

pub struct Persistence<S> {
    storage: S,
    user_key: String,
    default_key: String,
}

impl<S: KeyValueStore> Persistence<S> {
    pub fn new(storage: S, config: &ControllerConfig) -> Self {
        Persistence {
            storage,
            user_key: config.user_key.clone(),
            default_key: config.default_key.clone(),
        }
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    fn key(&self, collection: Collection) -> &str {
        match collection {
            Collection::User => &self.user_key,
            Collection::Default => &self.default_key,
        }
    }

    /// Read both collections and reconcile them against `now`.
    pub fn load(&self, presets: &[Timer], now: u64) -> TimerStore {
        let mut user = self.read_collection(Collection::User);
        let saved_defaults = self.read_collection(Collection::Default);
        let mut defaults = merge_presets(saved_defaults, presets);

        let mut clamped = 0usize;
        for timer in user.iter_mut().chain(defaults.iter_mut()) {
            if reconcile(timer, now) {
                clamped += 1;
            }
        }
        info!(
            "Loaded {} user timers and {} presets ({} expired while away)",
            user.len(),
            defaults.len(),
            clamped
        );
        TimerStore::new(user, defaults)
    }

    fn read_collection(&self, collection: Collection) -> Vec<Timer> {
        let key = self.key(collection);
        let Some(raw) = self.storage.get(key) else {
            debug!("No saved timers under '{}'", key);
            return Vec::new();
        };
        match serde_json::from_str::<Vec<Timer>>(&raw) {
            Ok(timers) => timers,
            Err(err) => {
                warn!("Ignoring malformed timers under '{}': {}", key, err);
                Vec::new()
            }
        }
    }

    /// Write one collection back, stamping `lastSaveTime` on running timers.
    /// Failures are logged and otherwise ignored.
    pub fn save(&mut self, store: &TimerStore, collection: Collection, now: u64) {
        let stamped: Vec<Timer> = store
            .timers(collection)
            .iter()
            .map(|timer| {
                let mut timer = timer.clone();
                if timer.is_running {
                    timer.last_save_time = Some(now);
                }
                timer
            })
            .collect();

        let key = self.key(collection).to_string();
        let json = match serde_json::to_string(&stamped) {
            Ok(json) => json,
            Err(err) => {
                warn!("Could not serialize timers for '{}': {}", key, err);
                return;
            }
        };
        if let Err(err) = self.storage.set(&key, &json) {
            warn!("{}", err);
        }
    }

    pub fn save_all(&mut self, store: &TimerStore, now: u64) {
        self.save(store, Collection::User, now);
        self.save(store, Collection::Default, now);
    }
}

/// Saved preset state in saved order, followed by any preset the save did
/// not know about. Saved entries whose id is no longer a preset are dropped.
pub fn merge_presets(saved: Vec<Timer>, presets: &[Timer]) -> Vec<Timer> {
    let mut merged: Vec<Timer> = Vec::with_capacity(presets.len());
    for timer in saved {
        let is_preset = presets.iter().any(|preset| preset.id == timer.id);
        let is_duplicate = merged.iter().any(|kept| kept.id == timer.id);
        if is_preset && !is_duplicate {
            merged.push(timer);
        } else {
            debug!("Dropping saved preset state for '{}'", timer.id);
        }
    }
    for preset in presets {
        if !merged.iter().any(|kept| kept.id == preset.id) {
            merged.push(preset.clone());
        }
    }
    merged
}

/// Catch a timer up with time that passed since it was saved.
///
/// Running countdowns lose `now - lastSaveTime`; count-to-date timers are
/// recomputed from their target. A timer that runs out this way is stopped
/// at zero without its end action. Returns true in that case.
pub fn reconcile(timer: &mut Timer, now: u64) -> bool {
    match timer.kind {
        TimerKind::Countdown => {
            if !timer.is_running {
                return false;
            }
            let saved_at = timer.last_save_time.unwrap_or(now);
            timer.remaining = timer.remaining.saturating_sub(now.saturating_sub(saved_at));
        }
        TimerKind::CountToDate => {
            timer.remaining = timer.remaining_until_target(now);
        }
    }
    if timer.remaining == 0 && timer.is_running {
        timer.is_running = false;
        return true;
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStorage;
    use crate::timer::EndAction;

    fn preset(id: &str, minutes: u64) -> Timer {
        Timer::countdown(id, id, minutes * 60_000, EndAction::Stop, "bell")
    }

    fn running_countdown(remaining: u64, saved_at: u64) -> Timer {
        let mut timer = Timer::countdown("t", "t", 60_000, EndAction::Stop, "bell");
        timer.remaining = remaining;
        timer.is_running = true;
        timer.last_save_time = Some(saved_at);
        timer
    }

    #[test]
    fn merge_keeps_saved_state_and_appends_missing_presets() {
        let presets = vec![preset("a", 1), preset("b", 2), preset("c", 3)];
        let mut saved_b = preset("b", 2);
        saved_b.remaining = 42;
        let stale = preset("retired", 9);

        let merged = merge_presets(vec![saved_b, stale], &presets);
        let ids: Vec<&str> = merged.iter().map(|t| t.id.as_str()).collect();

        assert_eq!(ids, ["b", "a", "c"]);
        assert_eq!(merged[0].remaining, 42);
    }

    #[test]
    fn running_countdown_loses_elapsed_time() {
        let mut timer = running_countdown(10_000, 1_000);
        assert!(!reconcile(&mut timer, 4_000));
        assert_eq!(timer.remaining, 7_000);
        assert!(timer.is_running);
    }

    #[test]
    fn running_countdown_clamps_at_zero() {
        let mut timer = running_countdown(2_000, 1_000);
        assert!(reconcile(&mut timer, 60_000));
        assert_eq!(timer.remaining, 0);
        assert!(!timer.is_running);
        assert!(!timer.is_finished);
    }

    #[test]
    fn paused_countdown_is_untouched() {
        let mut timer = running_countdown(2_000, 1_000);
        timer.is_running = false;
        assert!(!reconcile(&mut timer, 60_000));
        assert_eq!(timer.remaining, 2_000);
    }

    #[test]
    fn malformed_collection_loads_as_empty() {
        let config = ControllerConfig::default().with_presets(vec![preset("a", 1)]);
        let storage = MemoryStorage::with_entry(&config.user_key, "{not json");
        storage.insert(&config.default_key, "[1, 2, 3]");

        let store = Persistence::new(storage, &config).load(&config.presets, 0);
        assert!(store.user_timers().is_empty());
        assert_eq!(store.default_timers().len(), 1);
    }

    #[test]
    fn save_stamps_running_timers_only() {
        let config = ControllerConfig::default();
        let storage = MemoryStorage::new();
        let mut persistence = Persistence::new(storage.clone(), &config);
        let mut idle = preset("idle", 1);
        idle.last_save_time = None;
        let store = TimerStore::new(vec![running_countdown(5_000, 1), idle], vec![]);

        persistence.save(&store, Collection::User, 777);

        let raw = storage.get(&config.user_key).unwrap();
        let saved: Vec<Timer> = serde_json::from_str(&raw).unwrap();
        assert_eq!(saved[0].last_save_time, Some(777));
        assert_eq!(saved[1].last_save_time, None);
        assert!(storage.get(&config.default_key).is_none());
    }
}
