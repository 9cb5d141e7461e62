use dash_timers::{
    config::ControllerConfig, EndAction, KeyValueStore, ManualClock, ManualScheduler,
    MemoryStorage, Timer, TimerController, TimerDraft, TimerEvent, Wakeup,
};

type Controller = TimerController<MemoryStorage, ManualClock, ManualScheduler>;

const T0: u64 = 1_700_000_000_000;

fn presets() -> Vec<Timer> {
    vec![
        Timer::countdown("preset-a", "Preset A", 60_000, EndAction::Stop, "bell"),
        Timer::countdown("preset-b", "Preset B", 120_000, EndAction::Restart, "chime"),
    ]
}

fn config(presets: Vec<Timer>) -> ControllerConfig {
    ControllerConfig::default().with_presets(presets)
}

fn load(storage: &MemoryStorage, clock: &ManualClock, presets: Vec<Timer>) -> (Controller, ManualScheduler) {
    let scheduler = ManualScheduler::new();
    let ctrl = TimerController::load(config(presets), storage.clone(), clock.clone(), scheduler.clone());
    (ctrl, scheduler)
}

fn pinned_count(ctrl: &Controller) -> usize {
    ctrl.store().iter().filter(|t| t.is_pinned).count()
}

fn expired_count(events: &[TimerEvent]) -> usize {
    events
        .iter()
        .filter(|e| matches!(e, TimerEvent::Expired { .. }))
        .count()
}

#[test]
fn at_most_one_timer_is_pinned_through_any_sequence() {
    let storage = MemoryStorage::new();
    let clock = ManualClock::new(T0);
    let (mut ctrl, _) = load(&storage, &clock, presets());
    assert_eq!(pinned_count(&ctrl), 1);

    let a = ctrl.add(TimerDraft::countdown("a", 10_000, EndAction::Stop)).unwrap();
    assert_eq!(pinned_count(&ctrl), 1);
    let b = ctrl.add(TimerDraft::countdown("b", 10_000, EndAction::Stop)).unwrap();
    ctrl.pin(&b).unwrap();
    assert_eq!(pinned_count(&ctrl), 1);
    ctrl.pin("preset-b").unwrap();
    assert_eq!(pinned_count(&ctrl), 1);
    ctrl.start(&a).unwrap();
    ctrl.delete(&b).unwrap();
    assert_eq!(pinned_count(&ctrl), 1);
    assert_eq!(ctrl.pinned().map(|t| t.id.as_str()), Some("preset-b"));
}

#[test]
fn starting_a_running_timer_changes_nothing() {
    let storage = MemoryStorage::new();
    let clock = ManualClock::new(T0);
    let (mut ctrl, scheduler) = load(&storage, &clock, presets());
    let id = ctrl.add(TimerDraft::countdown("Eggs", 5_000, EndAction::Stop)).unwrap();
    ctrl.start(&id).unwrap();
    ctrl.take_events();
    let before = ctrl.find_by_id(&id).cloned();

    assert_eq!(ctrl.start(&id), Ok(false));
    assert_eq!(ctrl.find_by_id(&id).cloned(), before);
    assert!(ctrl.take_events().is_empty());
    let ticks = scheduler
        .active()
        .into_iter()
        .filter(|w| *w == Wakeup::Tick(id.clone()))
        .count();
    assert_eq!(ticks, 1);
}

#[test]
fn reset_restores_full_duration_and_stops() {
    let storage = MemoryStorage::new();
    let clock = ManualClock::new(T0);
    let (mut ctrl, scheduler) = load(&storage, &clock, presets());
    let id = ctrl.add(TimerDraft::countdown("Eggs", 5_000, EndAction::Stop)).unwrap();
    ctrl.start(&id).unwrap();
    ctrl.handle(Wakeup::Tick(id.clone()));
    ctrl.handle(Wakeup::Tick(id.clone()));

    ctrl.reset(&id).unwrap();
    let timer = ctrl.find_by_id(&id).unwrap();
    assert_eq!(timer.remaining, 5_000);
    assert_eq!(timer.initial_duration, Some(5_000));
    assert!(!timer.is_running);
    assert!(!scheduler.is_armed(&Wakeup::Tick(id)));
}

#[test]
fn five_ticks_expire_a_five_second_countdown_once() {
    let storage = MemoryStorage::new();
    let clock = ManualClock::new(T0);
    let (mut ctrl, scheduler) = load(&storage, &clock, presets());
    let id = ctrl.add(TimerDraft::countdown("Five", 5_000, EndAction::Stop)).unwrap();
    ctrl.start(&id).unwrap();
    ctrl.take_events();

    for tick in 1..=4 {
        clock.advance(1_000);
        ctrl.handle(Wakeup::Tick(id.clone()));
        assert_eq!(expired_count(&ctrl.take_events()), 0, "tick {}", tick);
    }
    clock.advance(1_000);
    ctrl.handle(Wakeup::Tick(id.clone()));
    let events = ctrl.take_events();
    assert_eq!(expired_count(&events), 1);
    assert!(events.contains(&TimerEvent::Expired {
        id: id.clone(),
        sound: "bell".into()
    }));

    // A late wakeup after expiry must not fire again.
    ctrl.handle(Wakeup::Tick(id.clone()));
    assert_eq!(expired_count(&ctrl.take_events()), 0);

    let timer = ctrl.find_by_id(&id).unwrap();
    assert!(timer.is_finished);
    assert!(!timer.is_running);
    assert_eq!(timer.remaining, 0);
    assert!(!scheduler.is_armed(&Wakeup::Tick(id.clone())));

    assert_eq!(ctrl.dismiss(&id), Ok(true));
    let timer = ctrl.find_by_id(&id).unwrap();
    assert_eq!(timer.remaining, 5_000);
    assert!(!timer.is_finished);
}

#[test]
fn reload_subtracts_time_spent_away() {
    let storage = MemoryStorage::new();
    let clock = ManualClock::new(T0);
    let (mut ctrl, _) = load(&storage, &clock, presets());
    let id = ctrl.add(TimerDraft::countdown("Bake", 60_000, EndAction::Stop)).unwrap();
    ctrl.start(&id).unwrap();
    drop(ctrl);

    clock.advance(25_000);
    let (mut ctrl, scheduler) = load(&storage, &clock, presets());
    let timer = ctrl.find_by_id(&id).unwrap();
    assert_eq!(timer.remaining, 35_000);
    assert!(timer.is_running);

    ctrl.resume_running();
    assert!(scheduler.is_armed(&Wakeup::Tick(id)));
}

#[test]
fn reload_uses_saved_timestamp() {
    let cfg = config(vec![]);
    let (r, t1) = (8_000u64, T0 + 3_000);
    let saved = format!(
        r#"[{{"id":"x","title":"X","type":"countdown","initialDuration":10000,
            "remaining":{},"endAction":"stop","sound":"bell",
            "isRunning":true,"isPinned":true,"lastSaveTime":{}}}]"#,
        r, T0
    );
    let storage = MemoryStorage::with_entry(&cfg.user_key, &saved);
    let clock = ManualClock::new(t1);
    let (ctrl, _) = load(&storage, &clock, vec![]);

    assert_eq!(ctrl.find_by_id("x").unwrap().remaining, r - (t1 - T0));
}

#[test]
fn countdown_that_ran_out_while_away_stops_without_firing() {
    let storage = MemoryStorage::new();
    let clock = ManualClock::new(T0);
    let (mut ctrl, _) = load(&storage, &clock, presets());
    let id = ctrl.add(TimerDraft::countdown("Short", 2_000, EndAction::Restart)).unwrap();
    ctrl.start(&id).unwrap();
    drop(ctrl);

    clock.advance(3_600_000);
    let (mut ctrl, scheduler) = load(&storage, &clock, presets());
    ctrl.resume_running();
    let timer = ctrl.find_by_id(&id).unwrap();

    assert_eq!(timer.remaining, 0);
    assert!(!timer.is_running);
    assert!(!timer.is_finished);
    assert_eq!(expired_count(&ctrl.take_events()), 0);
    assert!(scheduler.active().is_empty());
}

#[test]
fn count_to_date_with_past_target_loads_stopped_at_zero() {
    let cfg = config(vec![]);
    let saved = format!(
        r#"[{{"id":"launch","title":"Launch","type":"count_to_date",
            "remaining":50000,"targetDate":{},"sound":"bell",
            "isRunning":true,"isPinned":false,"lastSaveTime":{}}}]"#,
        T0 + 10_000,
        T0
    );
    let storage = MemoryStorage::with_entry(&cfg.user_key, &saved);
    let clock = ManualClock::new(T0 + 60_000);
    let (mut ctrl, scheduler) = load(&storage, &clock, vec![]);
    ctrl.resume_running();

    let timer = ctrl.find_by_id("launch").unwrap();
    assert_eq!(timer.remaining, 0);
    assert!(!timer.is_running);
    assert!(!timer.is_finished);
    assert!(timer.is_pinned);
    assert_eq!(expired_count(&ctrl.take_events()), 0);
    assert!(scheduler.active().is_empty());
    assert_eq!(ctrl.start("launch"), Ok(false));
}

#[test]
fn deleting_the_pinned_timer_moves_the_pin() {
    let storage = MemoryStorage::new();
    let clock = ManualClock::new(T0);
    let (mut ctrl, _) = load(&storage, &clock, presets());
    let a = ctrl.add(TimerDraft::countdown("a", 10_000, EndAction::Stop)).unwrap();
    let b = ctrl.add(TimerDraft::countdown("b", 10_000, EndAction::Stop)).unwrap();
    ctrl.pin(&b).unwrap();
    ctrl.take_events();

    ctrl.delete(&b).unwrap();
    assert_eq!(ctrl.pinned().map(|t| t.id.clone()), Some(a.clone()));
    assert!(ctrl
        .take_events()
        .contains(&TimerEvent::PinMoved(Some(a.clone()))));
}

#[test]
fn deleting_the_last_timer_leaves_nothing_pinned() {
    let storage = MemoryStorage::new();
    let clock = ManualClock::new(T0);
    let (mut ctrl, scheduler) = load(&storage, &clock, vec![]);
    let only = ctrl.add(TimerDraft::countdown("only", 10_000, EndAction::Stop)).unwrap();
    ctrl.start(&only).unwrap();

    ctrl.delete(&only).unwrap();
    assert!(ctrl.pinned().is_none());
    assert!(ctrl.store().is_empty());
    assert!(scheduler.cancelled().contains(&Wakeup::Tick(only)));
}

#[test]
fn corrupt_storage_falls_back_to_presets() {
    let cfg = config(presets());
    let storage = MemoryStorage::with_entry(&cfg.user_key, "definitely not json");
    storage.insert(&cfg.default_key, r#"{"id": 3}"#);
    let clock = ManualClock::new(T0);
    let (ctrl, _) = load(&storage, &clock, presets());

    assert!(ctrl.store().user_timers().is_empty());
    assert_eq!(ctrl.store().default_timers().len(), 2);
    assert_eq!(ctrl.pinned().map(|t| t.id.as_str()), Some("preset-a"));
    // The repaired state was written back.
    assert!(storage.get(&cfg.default_key).unwrap().starts_with('['));
}

#[test]
fn preset_runtime_state_survives_reload() {
    let storage = MemoryStorage::new();
    let clock = ManualClock::new(T0);
    let (mut ctrl, _) = load(&storage, &clock, presets());
    ctrl.start("preset-a").unwrap();
    ctrl.handle(Wakeup::Tick("preset-a".into()));
    ctrl.pause("preset-a").unwrap();
    drop(ctrl);

    clock.advance(10_000);
    let (ctrl, _) = load(&storage, &clock, presets());
    let preset = ctrl.find_by_id("preset-a").unwrap();
    assert_eq!(preset.remaining, 59_000);
    assert!(!preset.is_running);
}

#[test]
fn reload_during_restart_grace_still_restarts() {
    let storage = MemoryStorage::new();
    let clock = ManualClock::new(T0);
    let (mut ctrl, _) = load(&storage, &clock, presets());
    let id = ctrl.add(TimerDraft::countdown("Plank", 1_000, EndAction::Restart)).unwrap();
    ctrl.start(&id).unwrap();
    clock.advance(1_000);
    ctrl.handle(Wakeup::Tick(id.clone()));
    assert!(ctrl.restart_pending(&id));
    drop(ctrl);

    clock.advance(500);
    let (mut ctrl, scheduler) = load(&storage, &clock, presets());
    ctrl.resume_running();
    assert!(ctrl.restart_pending(&id));
    assert!(scheduler.is_armed(&Wakeup::Restart(id.clone())));

    ctrl.handle(Wakeup::Restart(id.clone()));
    let timer = ctrl.find_by_id(&id).unwrap();
    assert!(timer.is_running);
    assert!(!timer.is_finished);
    assert_eq!(timer.remaining, 1_000);
    assert!(scheduler.is_armed(&Wakeup::Tick(id)));
}

#[test]
fn dismissed_restart_timer_is_not_rearmed_on_reload() {
    let storage = MemoryStorage::new();
    let clock = ManualClock::new(T0);
    let (mut ctrl, _) = load(&storage, &clock, presets());
    let id = ctrl.add(TimerDraft::countdown("Plank", 1_000, EndAction::Restart)).unwrap();
    ctrl.start(&id).unwrap();
    ctrl.handle(Wakeup::Tick(id.clone()));
    ctrl.dismiss(&id).unwrap();
    drop(ctrl);

    let (mut ctrl, scheduler) = load(&storage, &clock, presets());
    ctrl.resume_running();
    assert!(!ctrl.restart_pending(&id));
    assert!(scheduler.active().is_empty());
}

#[test]
fn reset_on_count_to_date_stops_and_keeps_remaining() {
    let storage = MemoryStorage::new();
    let clock = ManualClock::new(T0);
    let (mut ctrl, scheduler) = load(&storage, &clock, presets());
    let id = ctrl.add(TimerDraft::count_to_date("Launch", T0 + 2_500)).unwrap();
    clock.advance(1_000);
    ctrl.handle(Wakeup::Tick(id.clone()));
    assert_eq!(ctrl.find_by_id(&id).unwrap().remaining, 1_500);

    assert_eq!(ctrl.reset(&id), Ok(true));
    let timer = ctrl.find_by_id(&id).unwrap();
    assert!(!timer.is_running);
    assert!(!timer.is_finished);
    assert_eq!(timer.remaining, 1_500);
    assert_eq!(timer.target_date, Some(T0 + 2_500));
    assert!(!scheduler.is_armed(&Wakeup::Tick(id.clone())));
    assert_eq!(ctrl.reset(&id), Ok(false));
}
