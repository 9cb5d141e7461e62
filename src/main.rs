//! Main module for the dashboard timers front end using Yew.
//! Loads the controller, routes its wakeups through the browser event loop
//! and renders the timer cards.

use dash_timers::{
    config::SOUNDS, format_remaining, utils::parse_duration_ms, BrowserScheduler, BrowserStorage,
    ControllerConfig, EndAction, SystemClock, TimerAction, TimerController, TimerDraft,
    TimerEvent, TimerKind, Wakeup,
};
use log::{info, warn};
use std::cell::RefCell;
use std::rc::{Rc, Weak};
use wasm_bindgen::JsValue;
use web_sys::{HtmlInputElement, HtmlSelectElement};
use yew::prelude::*;

mod components;
mod hooks;

use components::{render_primary_display, render_timer_card};
use hooks::use_validated_field;

// ──────────────────────────────────────────────────────────────────────────────
// Type aliases for better readability
type BrowserController = TimerController<BrowserStorage, SystemClock, BrowserScheduler>;
type SharedController = Rc<RefCell<BrowserController>>;

const DEFAULT_DURATION_TEXT: &str = "5";

// ──────────────────────────────────────────────────────────────────────────────
// Helper functions

/// Handle controller events that need more than a re-render.
fn announce(events: &[TimerEvent]) {
    for event in events {
        if let TimerEvent::Expired { id, sound } = event {
            // Playback itself belongs to the page's audio layer.
            info!("Timer '{}' expired, cue '{}'", id, sound);
        }
    }
}

/// Build the controller with a scheduler whose wakeups call back into it.
///
/// Each wakeup runs in its own event-loop turn, takes the mutable borrow,
/// drains the resulting events and only then asks Yew to re-render.
fn mount_controller(refresh: Callback<()>) -> SharedController {
    let shared = Rc::new_cyclic(|weak: &Weak<RefCell<BrowserController>>| {
        let weak = weak.clone();
        let scheduler = BrowserScheduler::new(move |wakeup: Wakeup| {
            let Some(shared) = weak.upgrade() else {
                return;
            };
            let events = {
                let mut controller = shared.borrow_mut();
                controller.handle(wakeup);
                controller.take_events()
            };
            announce(&events);
            refresh.emit(());
        });
        RefCell::new(TimerController::load(
            ControllerConfig::default(),
            BrowserStorage,
            SystemClock,
            scheduler,
        ))
    });
    {
        let mut controller = shared.borrow_mut();
        controller.resume_running();
        controller.take_events();
    }
    shared
}

/// Parse a `datetime-local` input value as local time.
fn parse_local_datetime(value: &str) -> Result<u64, String> {
    let ms = js_sys::Date::parse(value);
    if value.trim().is_empty() || ms.is_nan() || ms < 0.0 {
        return Err("Pick a date and time".to_string());
    }
    Ok(ms as u64)
}

/// Format a timestamp for a `datetime-local` input.
fn to_local_datetime(ms: u64) -> String {
    let date = js_sys::Date::new(&JsValue::from_f64(ms as f64));
    format!(
        "{:04}-{:02}-{:02}T{:02}:{:02}",
        date.get_full_year(),
        date.get_month() + 1,
        date.get_date(),
        date.get_hours(),
        date.get_minutes()
    )
}

/// Snapshot of the add/edit form.
struct DraftForm {
    title: String,
    kind: TimerKind,
    duration_text: String,
    end_action: EndAction,
    target_text: String,
    sound: String,
}

fn build_draft(form: &DraftForm) -> Result<TimerDraft, String> {
    let draft = match form.kind {
        TimerKind::Countdown => {
            let duration_ms = parse_duration_ms(&form.duration_text).map_err(|e| e.to_string())?;
            TimerDraft::countdown(form.title.clone(), duration_ms, form.end_action)
        }
        TimerKind::CountToDate => {
            let target = parse_local_datetime(&form.target_text)?;
            TimerDraft::count_to_date(form.title.clone(), target)
        }
    };
    Ok(draft.with_sound(form.sound.clone()))
}

// ──────────────────────────────────────────────────────────────────────────────

/// Primary application component wiring the controller, the form and cards.
#[function_component(App)]
fn app() -> Html {
    let trigger = use_force_update();
    let controller = use_mut_ref(|| None::<SharedController>);

    let editing = use_state(|| None::<String>);
    let form_error = use_state(|| None::<String>);
    let title = use_state(String::new);
    let kind = use_state(|| TimerKind::Countdown);
    let end_action = use_state(EndAction::default);
    let sound = use_state(|| SOUNDS[0].to_string());
    let target_text = use_state(String::new);
    let duration = use_validated_field(
        DEFAULT_DURATION_TEXT,
        Rc::new(|text: &str| parse_duration_ms(text).map_err(|e| e.to_string())),
    );

    // Load timers once on mount
    {
        let controller = controller.clone();
        let trigger = trigger.clone();
        use_effect_with((), move |_| {
            let refresh = Callback::from(move |_: ()| trigger.force_update());
            *controller.borrow_mut() = Some(mount_controller(refresh.clone()));
            refresh.emit(());
        });
    }

    let on_action = {
        let controller = controller.clone();
        let trigger = trigger.clone();
        let editing = editing.clone();
        Callback::from(move |(id, action): (String, TimerAction)| {
            let Some(shared) = controller.borrow().clone() else {
                return;
            };
            let result = shared.borrow_mut().apply(&id, action);
            if let Err(err) = result {
                warn!("{:?} on '{}' failed: {}", action, id, err);
            }
            if action == TimerAction::Delete && editing.as_deref() == Some(id.as_str()) {
                editing.set(None);
            }
            announce(&shared.borrow_mut().take_events());
            trigger.force_update();
        })
    };

    let on_edit = {
        let controller = controller.clone();
        let editing = editing.clone();
        let title = title.clone();
        let kind = kind.clone();
        let end_action = end_action.clone();
        let sound = sound.clone();
        let target_text = target_text.clone();
        let set_duration = duration.set_text.clone();
        let form_error = form_error.clone();
        Callback::from(move |id: String| {
            let Some(shared) = controller.borrow().clone() else {
                return;
            };
            let Some(timer) = shared.borrow().find_by_id(&id).cloned() else {
                return;
            };
            title.set(timer.title.clone());
            kind.set(timer.kind);
            sound.set(timer.sound.clone());
            end_action.set(timer.end_action());
            if let Some(initial) = timer.initial_duration {
                set_duration.emit(format_remaining(initial));
            }
            if let Some(target) = timer.target_date {
                target_text.set(to_local_datetime(target));
            }
            form_error.set(None);
            editing.set(Some(id));
        })
    };

    let on_cancel_edit = {
        let editing = editing.clone();
        let title = title.clone();
        let clear_duration = duration.clear.clone();
        Callback::from(move |_: MouseEvent| {
            editing.set(None);
            title.set(String::new());
            clear_duration.emit(());
        })
    };

    let on_submit = {
        let controller = controller.clone();
        let trigger = trigger.clone();
        let editing = editing.clone();
        let form_error = form_error.clone();
        let title = title.clone();
        let clear_duration = duration.clear.clone();
        let form = DraftForm {
            title: (*title).clone(),
            kind: *kind,
            duration_text: duration.text.clone(),
            end_action: *end_action,
            target_text: (*target_text).clone(),
            sound: (*sound).clone(),
        };
        Callback::from(move |e: SubmitEvent| {
            e.prevent_default();
            let Some(shared) = controller.borrow().clone() else {
                return;
            };
            let draft = match build_draft(&form) {
                Ok(draft) => draft,
                Err(message) => {
                    form_error.set(Some(message));
                    return;
                }
            };
            let result = match (*editing).clone() {
                Some(id) => shared.borrow_mut().edit(&id, draft).map(|_| id),
                None => shared.borrow_mut().add(draft),
            };
            match result {
                Ok(id) => {
                    info!("Saved timer '{}'", id);
                    form_error.set(None);
                    editing.set(None);
                    title.set(String::new());
                    clear_duration.emit(());
                }
                Err(err) => form_error.set(Some(err.to_string())),
            }
            announce(&shared.borrow_mut().take_events());
            trigger.force_update();
        })
    };

    let on_title_input = {
        let title = title.clone();
        Callback::from(move |e: InputEvent| {
            let input: HtmlInputElement = e.target_unchecked_into();
            title.set(input.value());
        })
    };
    let on_target_input = {
        let target_text = target_text.clone();
        Callback::from(move |e: InputEvent| {
            let input: HtmlInputElement = e.target_unchecked_into();
            target_text.set(input.value());
        })
    };
    let on_kind_change = {
        let kind = kind.clone();
        Callback::from(move |e: Event| {
            let select: HtmlSelectElement = e.target_unchecked_into();
            kind.set(match select.value().as_str() {
                "count_to_date" => TimerKind::CountToDate,
                _ => TimerKind::Countdown,
            });
        })
    };
    let on_end_action_change = {
        let end_action = end_action.clone();
        Callback::from(move |e: Event| {
            let select: HtmlSelectElement = e.target_unchecked_into();
            end_action.set(match select.value().as_str() {
                "restart" => EndAction::Restart,
                _ => EndAction::Stop,
            });
        })
    };
    let on_sound_change = {
        let sound = sound.clone();
        Callback::from(move |e: Event| {
            let select: HtmlSelectElement = e.target_unchecked_into();
            sound.set(select.value());
        })
    };
    let on_duration_commit = duration.on_commit.reform(|_: Event| ());

    let (primary, user_cards, default_cards) = match controller.borrow().as_ref() {
        Some(shared) => {
            let controller = shared.borrow();
            let store = controller.store();
            let primary = render_primary_display(controller.pinned());
            let user_cards: Html = store
                .user_timers()
                .iter()
                .map(|timer| render_timer_card(timer, true, &on_action, &on_edit))
                .collect();
            let default_cards: Html = store
                .default_timers()
                .iter()
                .map(|timer| render_timer_card(timer, false, &on_action, &on_edit))
                .collect();
            (primary, user_cards, default_cards)
        }
        None => (render_primary_display(None), Html::default(), Html::default()),
    };

    html! {
        <div class="container">
            { primary }
            <form class="timer-form" onsubmit={on_submit}>
                <input type="text" placeholder="Title" value={(*title).clone()} oninput={on_title_input} />
                <select onchange={on_kind_change}>
                    <option value="countdown" selected={*kind == TimerKind::Countdown}>{ "Countdown" }</option>
                    <option value="count_to_date" selected={*kind == TimerKind::CountToDate}>{ "Count to date" }</option>
                </select>
                if *kind == TimerKind::Countdown {
                    <input
                        type="text"
                        placeholder="25, 2:30, 1h 5m"
                        value={duration.text.clone()}
                        oninput={duration.on_input.clone()}
                        onchange={on_duration_commit}
                    />
                    if let Some(ms) = duration.value {
                        <span class="duration-preview">{ format_remaining(ms) }</span>
                    }
                    <select onchange={on_end_action_change}>
                        <option value="stop" selected={*end_action == EndAction::Stop}>{ "Stop at zero" }</option>
                        <option value="restart" selected={*end_action == EndAction::Restart}>{ "Restart" }</option>
                    </select>
                } else {
                    <input type="datetime-local" value={(*target_text).clone()} oninput={on_target_input} />
                }
                <select onchange={on_sound_change}>
                    { for SOUNDS.iter().map(|name| html! {
                        <option value={*name} selected={*sound == *name}>{ *name }</option>
                    }) }
                </select>
                if let Some(message) = duration.error.as_ref() {
                    <p class="error-message">{ message.clone() }</p>
                }
                if let Some(message) = (*form_error).as_ref() {
                    <p class="error-message">{ message.clone() }</p>
                }
                <button type="submit">{ if editing.is_some() { "Save" } else { "Add timer" } }</button>
                if editing.is_some() {
                    <button type="button" onclick={on_cancel_edit}>{ "Cancel" }</button>
                }
            </form>
            <h3>{ "My timers" }</h3>
            <div class="timer-list">{ user_cards }</div>
            <h3>{ "Presets" }</h3>
            <div class="timer-list">{ default_cards }</div>
        </div>
    }
}

fn main() {
    // Set the panic hook to log detailed errors to the console
    console_error_panic_hook::set_once();
    yew::Renderer::<App>::new().render();
}
