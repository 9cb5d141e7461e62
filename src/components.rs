//! Pure Yew view functions for timer cards and the primary display.
//!
//! Nothing here touches the controller; every button emits a
//! `(timer id, TimerAction)` pair for the caller to apply.

use dash_timers::{format_remaining, Timer, TimerAction, TimerKind};
use wasm_bindgen::JsValue;
use yew::prelude::*;

fn action_button(
    label: &'static str,
    id: &str,
    action: TimerAction,
    enabled: bool,
    on_action: &Callback<(String, TimerAction)>,
) -> Html {
    let onclick = {
        let id = id.to_string();
        on_action.reform(move |_: MouseEvent| (id.clone(), action))
    };
    html! {
        <button class="timer-button" disabled={!enabled} {onclick}>{ label }</button>
    }
}

/// Secondary line of a card: the full duration or the target moment.
fn card_subtitle(timer: &Timer) -> String {
    match timer.kind {
        TimerKind::Countdown => timer
            .initial_duration
            .map(|ms| format!("of {}", format_remaining(ms)))
            .unwrap_or_default(),
        TimerKind::CountToDate => timer
            .target_date
            .map(|target| {
                let date = js_sys::Date::new(&JsValue::from_f64(target as f64));
                let local = date.to_locale_string("default", &JsValue::UNDEFINED);
                format!("until {}", String::from(local))
            })
            .unwrap_or_default(),
    }
}

/// Renders one timer card with its controls.
///
/// Start is disabled while running or when nothing is left to count, pause
/// only while running, and dismiss only for a finished timer.
pub fn render_timer_card(
    timer: &Timer,
    deletable: bool,
    on_action: &Callback<(String, TimerAction)>,
    on_edit: &Callback<String>,
) -> Html {
    let classes = classes!(
        "timer-card",
        timer.is_running.then_some("running"),
        timer.is_pinned.then_some("pinned"),
        timer.is_finished.then_some("finished"),
    );
    let can_start = !timer.is_running && timer.remaining > 0;
    let edit = {
        let id = timer.id.clone();
        on_edit.reform(move |_: MouseEvent| id.clone())
    };

    html! {
        <div class={classes} key={timer.id.clone()}>
            <div class="timer-header">
                <span class="timer-title">{ timer.title.clone() }</span>
                { action_button("📌", &timer.id, TimerAction::Pin, !timer.is_pinned, on_action) }
            </div>
            <div class="timer-remaining">{ format_remaining(timer.remaining) }</div>
            <div class="timer-subtitle">{ card_subtitle(timer) }</div>
            if timer.is_finished {
                <div class="timer-finished">
                    <span>{ "Time's up" }</span>
                    { action_button("Dismiss", &timer.id, TimerAction::Dismiss, true, on_action) }
                </div>
            }
            <div class="timer-controls">
                { action_button("Start", &timer.id, TimerAction::Start, can_start, on_action) }
                { action_button("Pause", &timer.id, TimerAction::Pause, timer.is_running, on_action) }
                if timer.is_countdown() {
                    { action_button("Reset", &timer.id, TimerAction::Reset, true, on_action) }
                }
                <button class="timer-button" onclick={edit}>{ "Edit" }</button>
                if deletable {
                    { action_button("Delete", &timer.id, TimerAction::Delete, true, on_action) }
                }
            </div>
        </div>
    }
}

/// The large summary display fed by the pinned timer.
pub fn render_primary_display(pinned: Option<&Timer>) -> Html {
    match pinned {
        Some(timer) => html! {
            <div class="primary-display">
                <div class="primary-title">{ timer.title.clone() }</div>
                <div class="primary-remaining">{ format_remaining(timer.remaining) }</div>
            </div>
        },
        None => html! {
            <div class="primary-display empty">
                <p>{ "No timers yet" }</p>
            </div>
        },
    }
}
