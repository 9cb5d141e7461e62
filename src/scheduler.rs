//! Cancellable wakeups for ticking and delayed restarts.
//!
//! A scheduler hands out one opaque handle per wakeup. The controller keeps
//! handles in maps keyed by timer id; dropping a handle cancels the wakeup,
//! so removing a map entry is all it takes to stop a timer.

use std::cell::RefCell;
use std::rc::Rc;

use gloo_timers::callback::{Interval, Timeout};

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Wakeup {
    /// Repeating one-second tick of a running timer.
    Tick(String),
    /// End of the grace period before an auto-restarting timer starts again.
    Restart(String),
}

pub trait Scheduler {
    type Handle;

    fn repeat(&self, wakeup: Wakeup, period_ms: u32) -> Self::Handle;
    fn once(&self, wakeup: Wakeup, delay_ms: u32) -> Self::Handle;
}

/// Browser event-loop scheduler backed by `setInterval`/`setTimeout`.
///
/// Every wakeup is forwarded to `dispatch`, which runs in its own callback
/// turn and is free to borrow the controller mutably.
#[derive(Clone)]
pub struct BrowserScheduler {
    dispatch: Rc<dyn Fn(Wakeup)>,
}

impl BrowserScheduler {
    pub fn new(dispatch: impl Fn(Wakeup) + 'static) -> Self {
        BrowserScheduler {
            dispatch: Rc::new(dispatch),
        }
    }
}

/// Dropping the handle clears the browser timer; the inner value is only
/// held for that.
#[allow(dead_code)]
pub enum BrowserHandle {
    Interval(Interval),
    Timeout(Timeout),
}

impl Scheduler for BrowserScheduler {
    type Handle = BrowserHandle;

    fn repeat(&self, wakeup: Wakeup, period_ms: u32) -> BrowserHandle {
        let dispatch = self.dispatch.clone();
        BrowserHandle::Interval(Interval::new(period_ms, move || dispatch(wakeup.clone())))
    }

    fn once(&self, wakeup: Wakeup, delay_ms: u32) -> BrowserHandle {
        let dispatch = self.dispatch.clone();
        BrowserHandle::Timeout(Timeout::new(delay_ms, move || dispatch(wakeup)))
    }
}

#[derive(Debug, Default)]
struct Armed {
    next_id: u64,
    active: Vec<(u64, Wakeup)>,
    cancelled: Vec<Wakeup>,
}

/// Scheduler that never fires on its own. It records which wakeups are armed
/// so a host loop or a test can fire them by hand.
#[derive(Debug, Clone, Default)]
pub struct ManualScheduler {
    armed: Rc<RefCell<Armed>>,
}

/// Handle from [`ManualScheduler`]; dropping it disarms the wakeup.
#[derive(Debug)]
pub struct ManualHandle {
    id: u64,
    armed: Rc<RefCell<Armed>>,
}

impl Drop for ManualHandle {
    fn drop(&mut self) {
        let mut armed = self.armed.borrow_mut();
        if let Some(index) = armed.active.iter().position(|(id, _)| *id == self.id) {
            let (_, wakeup) = armed.active.remove(index);
            armed.cancelled.push(wakeup);
        }
    }
}

impl ManualScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    fn arm(&self, wakeup: Wakeup) -> ManualHandle {
        let mut armed = self.armed.borrow_mut();
        let id = armed.next_id;
        armed.next_id += 1;
        armed.active.push((id, wakeup));
        ManualHandle {
            id,
            armed: self.armed.clone(),
        }
    }

    pub fn is_armed(&self, wakeup: &Wakeup) -> bool {
        self.armed.borrow().active.iter().any(|(_, w)| w == wakeup)
    }

    pub fn active(&self) -> Vec<Wakeup> {
        self.armed
            .borrow()
            .active
            .iter()
            .map(|(_, wakeup)| wakeup.clone())
            .collect()
    }

    /// Wakeups cancelled so far, oldest first.
    pub fn cancelled(&self) -> Vec<Wakeup> {
        self.armed.borrow().cancelled.clone()
    }
}

impl Scheduler for ManualScheduler {
    type Handle = ManualHandle;

    fn repeat(&self, wakeup: Wakeup, _period_ms: u32) -> ManualHandle {
        self.arm(wakeup)
    }

    fn once(&self, wakeup: Wakeup, _delay_ms: u32) -> ManualHandle {
        self.arm(wakeup)
    }
}
