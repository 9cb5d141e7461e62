//! In-memory timer collections and the pin invariant.

use crate::timer::Timer;

/// Which of the two persisted collections a timer lives in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Collection {
    User,
    Default,
}

/// User timers followed by preset timers.
///
/// Every path that can leave the collections without a pin goes through
/// [`TimerStore::ensure_pinned`], and pin changes go through
/// [`TimerStore::set_pinned`], so at most one timer is ever pinned.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TimerStore {
    user: Vec<Timer>,
    defaults: Vec<Timer>,
}

impl TimerStore {
    pub fn new(user: Vec<Timer>, defaults: Vec<Timer>) -> Self {
        TimerStore { user, defaults }
    }

    pub fn user_timers(&self) -> &[Timer] {
        &self.user
    }

    pub fn default_timers(&self) -> &[Timer] {
        &self.defaults
    }

    pub fn timers(&self, collection: Collection) -> &[Timer] {
        match collection {
            Collection::User => &self.user,
            Collection::Default => &self.defaults,
        }
    }

    /// Combined `user ++ default` sequence.
    pub fn iter(&self) -> impl Iterator<Item = &Timer> {
        self.user.iter().chain(self.defaults.iter())
    }

    fn iter_mut(&mut self) -> impl Iterator<Item = &mut Timer> {
        self.user.iter_mut().chain(self.defaults.iter_mut())
    }

    pub fn len(&self) -> usize {
        self.user.len() + self.defaults.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn find_by_id(&self, id: &str) -> Option<&Timer> {
        self.iter().find(|timer| timer.id == id)
    }

    pub fn find_by_id_mut(&mut self, id: &str) -> Option<&mut Timer> {
        self.iter_mut().find(|timer| timer.id == id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.find_by_id(id).is_some()
    }

    pub fn collection_of(&self, id: &str) -> Option<Collection> {
        if self.user.iter().any(|timer| timer.id == id) {
            Some(Collection::User)
        } else if self.defaults.iter().any(|timer| timer.id == id) {
            Some(Collection::Default)
        } else {
            None
        }
    }

    pub fn pinned(&self) -> Option<&Timer> {
        self.iter().find(|timer| timer.is_pinned)
    }

    pub fn running_ids(&self) -> Vec<String> {
        self.iter()
            .filter(|timer| timer.is_running)
            .map(|timer| timer.id.clone())
            .collect()
    }

    /// Clear every pin, then pin `id`. Returns false, touching nothing, when
    /// `id` is unknown.
    pub fn set_pinned(&mut self, id: &str) -> bool {
        if !self.contains(id) {
            return false;
        }
        for timer in self.iter_mut() {
            timer.is_pinned = timer.id == id;
        }
        true
    }

    /// Restore the pin invariant: keep the first pinned timer if there is
    /// one, otherwise pin the first timer of the combined sequence.
    ///
    /// Returns true when any pin flag changed.
    pub fn ensure_pinned(&mut self) -> bool {
        let pinned: Vec<String> = self
            .iter()
            .filter(|timer| timer.is_pinned)
            .map(|timer| timer.id.clone())
            .collect();
        match pinned.as_slice() {
            [_] => false,
            [keep, ..] => {
                let keep = keep.clone();
                self.set_pinned(&keep)
            }
            [] => {
                let first = self.iter().next().map(|timer| timer.id.clone());
                match first {
                    Some(first) => self.set_pinned(&first),
                    None => false,
                }
            }
        }
    }

    pub fn push_user(&mut self, timer: Timer) {
        self.user.push(timer);
    }

    /// Remove a user timer. Presets are never removed here.
    pub fn remove_user(&mut self, id: &str) -> Option<Timer> {
        let index = self.user.iter().position(|timer| timer.id == id)?;
        Some(self.user.remove(index))
    }

    /// Reorder user timers to follow `ids`. Timers not named keep their
    /// relative order after the named ones; unknown ids are ignored.
    pub fn reorder_user(&mut self, ids: &[String]) -> bool {
        let before: Vec<String> = self.user.iter().map(|t| t.id.clone()).collect();
        let mut remaining = std::mem::take(&mut self.user);
        let mut ordered = Vec::with_capacity(remaining.len());
        for id in ids {
            if let Some(index) = remaining.iter().position(|timer| &timer.id == id) {
                ordered.push(remaining.remove(index));
            }
        }
        ordered.extend(remaining);
        self.user = ordered;
        self.user.iter().map(|t| &t.id).ne(before.iter())
    }
}
